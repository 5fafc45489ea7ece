use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

use crate::config::AppConfig;
use crate::error::{ClientError, ValidationErrors, LOGIN_FAILED_MESSAGE};
use crate::session::{Route, Session, TokenPair};

pub const LOGIN_PATH: &str = "Account/Login";
pub const LOGGED_OUT_MESSAGE: &str = "Çıxış edildi";
pub const USERNAME_REQUIRED: &str = "İstifadəçi adını daxil edin";
pub const PASSWORD_REQUIRED: &str = "Şifrəni daxil edin";

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    access_token: String,
    refresh_token: String,
}

/// Issues login requests against the account service
pub struct AuthClient {
    client: Client,
    login_url: Url,
}

impl AuthClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let base = Url::parse(base_url)
            .map_err(|e| ClientError::invalid_request(format!("invalid auth base url '{base_url}': {e}")))?;
        let mut login_url = base;
        if let Ok(mut segments) = login_url.path_segments_mut() {
            segments.pop_if_empty().extend(LOGIN_PATH.split('/'));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, login_url })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ClientError> {
        Self::new(
            &config.api.auth_base_url,
            Duration::from_secs(config.api.request_timeout_secs),
        )
    }

    pub fn login_url(&self) -> &Url {
        &self.login_url
    }

    /// Exchange credentials for a token pair. Persisting it is the caller's job.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, ClientError> {
        let response = self
            .client
            .post(self.login_url.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "text/plain")
            .json(&LoginRequest { username, password })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = ClientError::from_status(status.as_u16(), &body);
            warn!(username, status = status.as_u16(), "login rejected");
            return Err(err);
        }

        let body: LoginResponse = response.json().await?;
        info!(username, "login succeeded");
        Ok(TokenPair::new(body.access_token, body.refresh_token))
    }
}

/// Login screen state: credentials, inline field errors and the alert message
#[derive(Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    field_errors: ValidationErrors,
    error_message: Option<String>,
}

impl LoginForm {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if self.username.trim().is_empty() {
            errors.add("username", USERNAME_REQUIRED);
        }
        if self.password.is_empty() {
            errors.add("password", PASSWORD_REQUIRED);
        }
        errors
    }

    pub fn field_errors(&self) -> &ValidationErrors {
        &self.field_errors
    }

    /// Alert text from the last failed submission
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Validate, log in and store the tokens.
    ///
    /// Returns the route to navigate to. On any failure nothing is stored and
    /// the route stays `/login`.
    pub async fn submit(&mut self, auth: &AuthClient, session: &Session) -> Route {
        self.error_message = None;
        self.field_errors = self.validate();
        if !self.field_errors.is_empty() {
            return Route::Login;
        }

        let tokens = match auth.login(self.username.trim(), &self.password).await {
            Ok(tokens) => tokens,
            Err(err) => {
                self.error_message = Some(err.user_message_or(LOGIN_FAILED_MESSAGE));
                return Route::Login;
            }
        };

        if let Err(err) = session.set_tokens(tokens) {
            warn!("failed to persist session: {}", err);
            self.error_message = Some(LOGIN_FAILED_MESSAGE.to_string());
            return Route::Login;
        }

        self.password.clear();
        Route::DEFAULT_PROTECTED
    }
}

/// Clear both stored tokens. Returns the notice to show and where to go next.
pub fn logout(session: &Session) -> (&'static str, Route) {
    if let Err(err) = session.clear() {
        warn!("failed to clear session: {}", err);
    }
    info!("logged out");
    (LOGGED_OUT_MESSAGE, Route::Login)
}
