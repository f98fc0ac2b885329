//! Login and session restore

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};
use crate::session::{ApiRequest, SessionGateway};

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: Option<String>,
    message: Option<String>,
}

/// State of the stored session after a restore attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Token present and accepted by the API
    Authenticated,
    /// No token stored
    Anonymous,
    /// A token was stored but rejected or unverifiable; it has been removed
    Cleared,
}

#[derive(Clone)]
pub struct Auth {
    gateway: SessionGateway,
}

impl Auth {
    pub fn new(gateway: SessionGateway) -> Self {
        Self { gateway }
    }

    /// Exchange credentials for a token and store it.
    ///
    /// The request carries no stored token, and a rejection leaves any
    /// existing session in place.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<()> {
        let request = ApiRequest::post("/users/login").json(&LoginRequest { email, password })?;
        let response = self.gateway.send_anonymous(request).await?;

        // The API reports failures as `{message}`, sometimes with a 2xx status
        let body: LoginResponse = match response.json() {
            Ok(body) => body,
            Err(_) if !response.is_success() => {
                return Err(ClientError::from_response(&response))
            }
            Err(e) => return Err(e.into()),
        };

        match body.token.filter(|t| !t.is_empty()) {
            Some(token) => {
                self.gateway.session().store().set_token(&token)?;
                tracing::info!(email, "Logged in");
                Ok(())
            }
            None => Err(ClientError::Rejected {
                status: response.status,
                message: Some(body.message.unwrap_or_else(|| "Unknown error".to_string())),
            }),
        }
    }

    /// Verify a stored token against `GET /users`
    pub async fn restore(&self) -> ClientResult<SessionStatus> {
        let store = self.gateway.session().store();
        if store.token()?.is_none() {
            return Ok(SessionStatus::Anonymous);
        }

        let ok = match self.gateway.send(ApiRequest::get("/users")).await {
            Ok(response) => response.is_success(),
            Err(e) => {
                tracing::warn!("Could not verify session: {}", e);
                false
            }
        };

        if ok {
            Ok(SessionStatus::Authenticated)
        } else {
            store.clear_token()?;
            Ok(SessionStatus::Cleared)
        }
    }

    /// Forget the stored token. Returns whether one was present.
    pub fn logout(&self) -> ClientResult<bool> {
        let had = self.gateway.session().store().clear_token()?;
        if had {
            tracing::info!("Logged out");
        }
        Ok(had)
    }
}
