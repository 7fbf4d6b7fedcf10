//! Conversions from external infrastructure errors into domain errors.

use campus_domain::CampusError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub CampusError);

impl From<InfraError> for CampusError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<CampusError> for InfraError {
    fn from(value: CampusError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoCampusError {
    fn into_campus(self) -> CampusError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → CampusError */
/* -------------------------------------------------------------------------- */

impl IntoCampusError for HttpError {
    fn into_campus(self) -> CampusError {
        if self.is_timeout() {
            return CampusError::Network("HTTP request timed out".into());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return CampusError::Network("HTTP connection failure".into());
        }

        if self.is_builder() {
            return CampusError::InvalidInput(format!("invalid HTTP request: {self}"));
        }

        if self.is_body() || self.is_decode() {
            return CampusError::Network(format!("failed to read HTTP body: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => CampusError::Auth(message),
                404 => CampusError::NotFound(message),
                400..=499 => CampusError::InvalidInput(message),
                _ => CampusError::Network(message),
            };
        }

        CampusError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_campus())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → CampusError */
/* -------------------------------------------------------------------------- */

impl IntoCampusError for std::io::Error {
    fn into_campus(self) -> CampusError {
        match self.kind() {
            std::io::ErrorKind::NotFound => CampusError::NotFound(self.to_string()),
            std::io::ErrorKind::PermissionDenied => {
                CampusError::Auth(format!("permission denied: {self}"))
            }
            _ => CampusError::Internal(format!("I/O error: {self}")),
        }
    }
}

impl From<std::io::Error> for InfraError {
    fn from(value: std::io::Error) -> Self {
        InfraError(value.into_campus())
    }
}

/* -------------------------------------------------------------------------- */
/* config format errors → CampusError */
/* -------------------------------------------------------------------------- */

impl From<toml::de::Error> for InfraError {
    fn from(value: toml::de::Error) -> Self {
        InfraError(CampusError::Config(format!("Invalid TOML format: {value}")))
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(CampusError::Config(format!("Invalid JSON format: {value}")))
    }
}
