//! HTTP transport shared by the API client and its side channels

pub mod client;

pub use client::{HttpClient, HttpClientBuilder};
