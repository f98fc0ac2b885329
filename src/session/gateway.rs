//! Session gateway
//!
//! Every network-calling unit receives a [`SessionGateway`]. It attaches the
//! stored bearer token, makes exactly one attempt through the transport, and
//! on any 401 tears the session down: the token is removed and the session's
//! teardown hook runs. The original response is still handed back so the
//! caller can inspect the status itself.

use std::sync::Arc;

use super::transport::{ApiRequest, ApiResponse, Transport, TransportError};
use crate::store::{LocalStore, StoreResult};

/// Callback invoked after a 401 has cleared the session
pub type TeardownHook = Arc<dyn Fn() + Send + Sync>;

/// Explicit session context: token storage plus the teardown hook
#[derive(Clone)]
pub struct Session {
    store: LocalStore,
    on_expired: TeardownHook,
}

impl Session {
    /// Session whose teardown only logs
    pub fn new(store: LocalStore) -> Self {
        Self::with_teardown(
            store,
            Arc::new(|| tracing::warn!("Session expired, login required")),
        )
    }

    pub fn with_teardown(store: LocalStore, on_expired: TeardownHook) -> Self {
        Self { store, on_expired }
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    pub fn token(&self) -> StoreResult<Option<String>> {
        self.store.token()
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self.store.token(), Ok(Some(_)))
    }

    /// Clear the token and run the teardown hook
    pub fn teardown(&self) {
        if let Err(e) = self.store.clear_token() {
            tracing::error!("Failed to clear session token: {}", e);
        }
        (self.on_expired)();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

/// Authenticated request wrapper. Cheap to clone.
#[derive(Clone)]
pub struct SessionGateway {
    transport: Arc<dyn Transport>,
    session: Session,
}

impl SessionGateway {
    pub fn new(transport: Arc<dyn Transport>, session: Session) -> Self {
        Self { transport, session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Send a request with the session's token attached, if any.
    ///
    /// A 401 clears the session before the response is returned. Transport
    /// failures propagate unchanged.
    pub async fn send(&self, mut request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let request_id = uuid::Uuid::new_v4();

        request.bearer_token = match self.session.token() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(%request_id, "Could not read session token: {}", e);
                None
            }
        };

        let method = request.method;
        let path = request.path.clone();
        let response = self.dispatch(request_id, request).await?;

        if response.is_unauthorized() {
            tracing::warn!(%request_id, %method, %path, "Unauthorized, ending session");
            self.session.teardown();
        }

        Ok(response)
    }

    /// Send without the stored token. A 401 leaves the session alone.
    ///
    /// Used for credential exchange, where a 401 means bad credentials and
    /// says nothing about the stored session.
    pub async fn send_anonymous(
        &self,
        mut request: ApiRequest,
    ) -> Result<ApiResponse, TransportError> {
        request.bearer_token = None;
        self.dispatch(uuid::Uuid::new_v4(), request).await
    }

    async fn dispatch(
        &self,
        request_id: uuid::Uuid,
        request: ApiRequest,
    ) -> Result<ApiResponse, TransportError> {
        let method = request.method;
        let path = request.path.clone();
        let authenticated = request.bearer_token.is_some();

        tracing::debug!(%request_id, %method, %path, authenticated, "Sending request");

        let response = match self.transport.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(%request_id, %method, %path, "Request failed: {}", e);
                return Err(e);
            }
        };

        tracing::debug!(%request_id, status = response.status, "Response received");
        Ok(response)
    }
}
