// Client-side error taxonomy shared by the auth client, the plan client and the views
use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Shown when a login fails without a server-provided message
pub const LOGIN_FAILED_MESSAGE: &str = "Giriş zamanı gözlənilməz xəta baş verdi";

/// Shown when any other request fails without a server-provided message
pub const REQUEST_FAILED_MESSAGE: &str = "Sorğu zamanı gözlənilməz xəta baş verdi";

/// Field name → inline message, ordered so output is stable
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<&'static str, &'static str>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: &'static str) {
        self.fields.insert(field, message);
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn get(&self, field: &str) -> Option<&'static str> {
        self.fields.get(field).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.fields.iter().map(|(k, v)| (*k, *v))
    }

    /// `Ok(())` when nothing was recorded, otherwise the collected errors
    pub fn into_result(self) -> Result<(), ClientError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ClientError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(field, msg)| format!("{field}: {msg}")).collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Failure of any auth or resource operation.
///
/// `Clone` because every waiter on a coalesced request receives the same outcome.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// Caught before submission; never reaches the network
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// Caller misuse such as page 0 or an empty patch
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Connection refused, DNS, timeout
    #[error("transport error: {0}")]
    Transport(String),

    /// 401 or 403: the stored token is missing, expired or rejected
    #[error("unauthorized ({status}): {}", message.as_deref().unwrap_or("no message"))]
    Unauthorized { status: u16, message: Option<String> },

    /// Any other non-2xx answer
    #[error("server rejected request with status {status}: {}", message.as_deref().unwrap_or("no message"))]
    Rejected { status: u16, message: Option<String> },

    /// 2xx body that does not match the contract
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl ClientError {
    pub fn transport(message: impl Into<String>) -> Self {
        ClientError::Transport(message.into())
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        ClientError::InvalidRequest(message.into())
    }

    pub fn decode(message: impl Into<String>) -> Self {
        ClientError::Decode(message.into())
    }

    /// Build the error for a non-success status, pulling `{message}` out of the body when present
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = extract_message(body);
        match status {
            401 | 403 => ClientError::Unauthorized { status, message },
            _ => ClientError::Rejected { status, message },
        }
    }

    /// HTTP status when the server answered, `None` for client-side failures
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::Unauthorized { status, .. } | ClientError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ClientError::Validation(_) => "VALIDATION_ERROR",
            ClientError::InvalidRequest(_) => "INVALID_REQUEST",
            ClientError::Transport(_) => "TRANSPORT_ERROR",
            ClientError::Unauthorized { .. } => "UNAUTHORIZED",
            ClientError::Rejected { .. } => "REJECTED",
            ClientError::Decode(_) => "DECODE_ERROR",
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized { .. })
    }

    /// Text for a transient notification, falling back to the generic request message
    pub fn user_message(&self) -> String {
        self.user_message_or(REQUEST_FAILED_MESSAGE)
    }

    /// Server-provided message when there is one, otherwise `fallback`
    pub fn user_message_or(&self, fallback: &str) -> String {
        match self {
            ClientError::Unauthorized { message: Some(m), .. } | ClientError::Rejected { message: Some(m), .. } => {
                m.clone()
            }
            ClientError::Validation(errors) => errors.to_string(),
            ClientError::InvalidRequest(m) => m.clone(),
            _ => fallback.to_string(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(|m| m.as_str())
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}
