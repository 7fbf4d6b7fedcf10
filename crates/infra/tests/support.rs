use std::fmt;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use campus_common::{Breaker, CircuitBreaker, CircuitBreakerConfig, MockClock};
use campus_domain::ApiConfig;
use campus_infra::api::{ApiClient, AuthStore, Navigator};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// Config with fast backoff and redirect for tests
pub fn test_config(base_url: &str) -> ApiConfig {
    let mut config = ApiConfig::with_base_url(base_url);
    config.request_timeout_secs = 5;
    config.retry.initial_backoff_ms = 10;
    config.retry.max_backoff_ms = 20;
    config.auth.redirect_delay_ms = 10;
    config
}

/// Base URL of a port that refuses connections
pub fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}")
}

/// Auth store that records every clear request
#[derive(Debug, Default)]
pub struct RecordingAuthStore {
    cleared: Mutex<Vec<Option<String>>>,
    sign_in_url: String,
}

impl RecordingAuthStore {
    pub fn new(sign_in_url: &str) -> Self {
        Self { cleared: Mutex::new(Vec::new()), sign_in_url: sign_in_url.to_string() }
    }

    pub fn cleared(&self) -> Vec<Option<String>> {
        self.cleared.lock().expect("cleared lock").clone()
    }
}

#[async_trait]
impl AuthStore for RecordingAuthStore {
    async fn clear_auth(&self, reason: Option<&str>) {
        self.cleared.lock().expect("cleared lock").push(reason.map(str::to_string));
    }

    fn sign_in_url(&self) -> String {
        self.sign_in_url.clone()
    }
}

/// Navigator that records redirect targets
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    redirects: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn redirects(&self) -> Vec<String> {
        self.redirects.lock().expect("redirects lock").clone()
    }

    /// Poll until a redirect is recorded or `timeout` passes
    pub async fn wait_for_redirect(&self, timeout: Duration) -> Option<String> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(url) = self.redirects().first() {
                return Some(url.clone());
            }
            if tokio::time::Instant::now() >= deadline {
                return None;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, url: &str) {
        self.redirects.lock().expect("redirects lock").push(url.to_string());
    }
}

/// Client wired to recording collaborators and a mock-clock breaker
pub struct Harness {
    pub client: ApiClient,
    pub breaker: CircuitBreaker<MockClock>,
    pub clock: MockClock,
    pub auth_store: Arc<RecordingAuthStore>,
    pub navigator: Arc<RecordingNavigator>,
}

impl Harness {
    pub fn new(config: ApiConfig) -> Self {
        let clock = MockClock::new();
        let breaker_config = CircuitBreakerConfig::builder()
            .failure_threshold(config.circuit_breaker.failure_threshold)
            .timeout(config.circuit_breaker.open_timeout())
            .build()
            .expect("breaker config");
        let breaker =
            CircuitBreaker::with_clock(breaker_config, clock.clone()).expect("breaker");

        let auth_store = Arc::new(RecordingAuthStore::new("/sign-in?expired=1"));
        let navigator = Arc::new(RecordingNavigator::default());

        let shared: Arc<dyn Breaker> = Arc::new(breaker.clone());
        let client = ApiClient::builder()
            .config(config)
            .breaker(shared)
            .auth_store(auth_store.clone())
            .navigator(navigator.clone())
            .build()
            .expect("client");

        Self { client, breaker, clock, auth_store, navigator }
    }
}

/// Captured `(level, message)` pairs
#[derive(Clone, Default)]
pub struct EventCapture {
    events: Arc<Mutex<Vec<(Level, String)>>>,
}

impl EventCapture {
    pub fn events(&self) -> Vec<(Level, String)> {
        self.events.lock().expect("events lock").clone()
    }

    pub fn count_at(&self, level: Level) -> usize {
        self.events().iter().filter(|(l, _)| *l == level).count()
    }
}

struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

impl<S: Subscriber> Layer<S> for EventCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        self.events.lock().expect("events lock").push((*event.metadata().level(), visitor.0));
    }
}
