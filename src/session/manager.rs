use super::credentials::Credentials;
use super::field_errors::FieldErrors;
use super::state::{token_from_payload, Identity, Role, SessionState};
use crate::config::Endpoints;
use crate::net::{AcceptKind, Fetcher, HeaderSet, RequestResult};
use crate::notify::Notifier;
use crate::router::{names, Location, Navigator};
use crate::storage::ClientState;
use http::Method;
use std::sync::{Arc, RwLock};

const SIGNED_IN: &str = "Signed in";
const SIGNED_OUT: &str = "Signed out";
const SIGN_OUT_FAILED: &str = "Sign-out failed";
const REQUEST_FAILED: &str = "Request failed";

/// Result of a login, registration or password recovery attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthOutcome {
    Succeeded,
    /// 422: field-level validation errors to show next to the form fields.
    Invalid(FieldErrors),
    /// Any other non-2xx status, or a call that never got a usable response.
    Failed { status: u16, message: Option<String> },
}

impl AuthOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AuthOutcome::Succeeded)
    }
}

/// Owns "who is the current user and are they an admin".
///
/// The persisted token is read fresh for every operation. The in-memory
/// [`SessionState`] only mirrors what the server last confirmed.
pub struct SessionManager {
    fetcher: Arc<Fetcher>,
    client: ClientState,
    state: RwLock<SessionState>,
    errors: RwLock<FieldErrors>,
    notifier: Notifier,
    navigator: Arc<Navigator>,
    endpoints: Endpoints,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &self.state())
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    pub fn new(
        fetcher: Arc<Fetcher>,
        client: ClientState,
        notifier: Notifier,
        navigator: Arc<Navigator>,
        endpoints: Endpoints,
    ) -> Self {
        Self {
            fetcher,
            client,
            state: RwLock::new(SessionState::Anonymous),
            errors: RwLock::new(FieldErrors::new()),
            notifier,
            navigator,
            endpoints,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn role(&self) -> Role {
        self.state.read().unwrap_or_else(|e| e.into_inner()).role()
    }

    /// Display name of the signed-in user, empty when anonymous.
    pub fn name(&self) -> String {
        self.state()
            .identity()
            .map(|id| id.name.clone())
            .unwrap_or_default()
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Role::Admin
    }

    pub fn token(&self) -> Option<String> {
        self.client.token()
    }

    pub fn field_errors(&self) -> FieldErrors {
        self.errors.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn reset_errors(&self) {
        self.errors.write().unwrap_or_else(|e| e.into_inner()).clear();
    }

    pub fn client_state(&self) -> &ClientState {
        &self.client
    }

    pub fn navigator(&self) -> &Arc<Navigator> {
        &self.navigator
    }

    pub fn fetcher(&self) -> &Arc<Fetcher> {
        &self.fetcher
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Navigates through the guard on behalf of this session.
    pub async fn navigate(&self, target: &str) -> Location {
        self.navigator.navigate(self, target).await
    }

    /// Headers for an authenticated call, or `None` when no token is held.
    pub fn authorized_headers(&self, accept: AcceptKind) -> Option<HeaderSet> {
        self.authorize(HeaderSet::for_accept(accept))
    }

    /// Adds the bearer token to `headers`, or `None` when no token is held.
    pub fn authorize(&self, headers: HeaderSet) -> Option<HeaderSet> {
        self.client.token().map(|token| headers.with_bearer(&token))
    }

    /// Tears the session down if `result` says the token is no longer valid.
    /// Returns true when it did.
    pub fn observe(&self, result: &RequestResult) -> bool {
        if result.is_unauthorized() {
            log::info!("server rejected the token, signing out");
            self.teardown();
            return true;
        }
        false
    }

    /// Signs in. On success the token is persisted before navigating to the
    /// role's landing route (`admin` or `home`).
    pub async fn login(&self, credentials: &Credentials) -> AuthOutcome {
        let uri = self.endpoints.login.clone();
        let result = match self.submit(&uri, credentials).await {
            Ok(result) => result,
            Err(outcome) => return outcome,
        };

        let Some(token) = result.json().and_then(token_from_payload) else {
            log::warn!("login response carried no token");
            self.notifier.error(REQUEST_FAILED);
            return AuthOutcome::Failed {
                status: result.status,
                message: None,
            };
        };
        if let Err(e) = self.client.replace_token(&token) {
            log::error!("could not persist token: {e}");
            self.notifier.error(REQUEST_FAILED);
            return AuthOutcome::Failed {
                status: result.status,
                message: Some(e.to_string()),
            };
        }

        let identity = result.json().and_then(Identity::from_payload).unwrap_or_default();
        log::info!("signed in as {:?} (admin: {})", identity.name, identity.is_admin);
        let landing = if identity.is_admin { names::ADMIN } else { names::HOME };
        self.set_state(SessionState::Authenticated(identity));
        self.notifier
            .session_success(result.message().unwrap_or(SIGNED_IN));

        self.navigate(landing).await;
        AuthOutcome::Succeeded
    }

    /// Creates an account. Success leads to the login page; no token is stored.
    pub async fn register(&self, credentials: &Credentials) -> AuthOutcome {
        let uri = self.endpoints.register.clone();
        match self.submit(&uri, credentials).await {
            Ok(result) => {
                self.notifier
                    .session_success(result.message().unwrap_or("Account created"));
                self.navigate(names::LOGIN).await;
                AuthOutcome::Succeeded
            }
            Err(outcome) => outcome,
        }
    }

    /// Requests a password reset.
    pub async fn forgot_password(&self, credentials: &Credentials) -> AuthOutcome {
        let uri = self.endpoints.forgot_password.clone();
        match self.submit(&uri, credentials).await {
            Ok(result) => {
                self.notifier
                    .success(result.message().unwrap_or("Password reset requested"));
                AuthOutcome::Succeeded
            }
            Err(outcome) => outcome,
        }
    }

    /// Re-validates the persisted token against the server.
    ///
    /// A 401 always ends the session. Other failures keep whatever state the
    /// session was in.
    pub async fn check_session(&self) -> Role {
        let Some(headers) = self.authorized_headers(AcceptKind::Json) else {
            self.set_state(SessionState::Anonymous);
            return Role::Anonymous;
        };

        let result = self.fetcher.get(&self.endpoints.whoami, &headers).await;
        if self.observe(&result) {
            return Role::Anonymous;
        }
        if !result.is_success() {
            log::warn!("session check failed with status {}, keeping current state", result.status);
            return self.role();
        }

        let current = self.state().identity().cloned().unwrap_or_default();
        let identity = match result.json() {
            Some(payload) => current.refreshed(payload),
            None => current,
        };
        self.set_state(SessionState::Authenticated(identity));
        self.role()
    }

    /// Signs out.
    ///
    /// Without a persisted token there is nothing to revoke. No call is made,
    /// but the persisted session data is still cleared before the login page
    /// is shown.
    pub async fn logout(&self) -> AuthOutcome {
        let Some(headers) = self.authorized_headers(AcceptKind::Json) else {
            log::debug!("logout without a token");
            self.teardown();
            self.navigate(names::LOGIN).await;
            return AuthOutcome::Succeeded;
        };

        let result = self.fetcher.delete(&self.endpoints.logout, &headers).await;
        if result.is_success() || result.is_unauthorized() {
            self.teardown();
            self.notifier.session_success(SIGNED_OUT);
            self.navigate(names::LOGIN).await;
            return AuthOutcome::Succeeded;
        }

        log::warn!("logout failed with status {}", result.status);
        self.notifier.error(SIGN_OUT_FAILED);
        AuthOutcome::Failed {
            status: result.status,
            message: result.message().map(str::to_string),
        }
    }

    /// POSTs a credentials form and applies the shared error policy.
    /// `Ok` carries a 2xx result.
    async fn submit(&self, uri: &str, credentials: &Credentials) -> Result<RequestResult, AuthOutcome> {
        self.reset_errors();
        let result = self
            .fetcher
            .post_or_patch(Method::POST, uri, credentials, &HeaderSet::json())
            .await;
        if result.is_success() {
            return Ok(result);
        }

        let message = result.message().map(str::to_string);
        self.notifier
            .error(message.clone().unwrap_or_else(|| REQUEST_FAILED.to_string()));

        if result.is_unprocessable() {
            let errors = result.field_errors().unwrap_or_default();
            *self.errors.write().unwrap_or_else(|e| e.into_inner()) = errors.clone();
            return Err(AuthOutcome::Invalid(errors));
        }
        Err(AuthOutcome::Failed {
            status: result.status,
            message,
        })
    }

    fn set_state(&self, state: SessionState) {
        let mut current = self.state.write().unwrap_or_else(|e| e.into_inner());
        if *current != state {
            log::debug!("session: {:?} -> {:?}", current.role(), state.role());
        }
        *current = state;
    }

    /// Drops the token and the session's persisted data, then goes Anonymous.
    fn teardown(&self) {
        if let Err(e) = self.client.clear_session_data() {
            log::error!("could not clear persisted session data: {e}");
        }
        self.set_state(SessionState::Anonymous);
    }
}
