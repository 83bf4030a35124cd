//! Application context.
//!
//! [`AppContext`] owns one instance of every service (transport, persisted
//! state, notifications, navigation, session, cart) and is passed to whatever
//! needs them. There are no process-wide singletons.
use crate::cart::Cart;
use crate::config::ClientConfig;
use crate::errors::ContextError;
use crate::net::{Fetcher, HttpBackend, ReqwestBackend};
use crate::notify::Notifier;
use crate::resources::{Resource, ResourceStore};
use crate::router::{Location, Navigator, RouteTable};
use crate::session::{AuthOutcome, Credentials, Role, SessionManager};
use crate::storage::{ClientState, InMemoryArea, StorageArea, StorageService};
use std::sync::Arc;

pub struct AppContext {
    config: ClientConfig,
    storage: Arc<StorageService>,
    notifier: Notifier,
    session: Arc<SessionManager>,
    cart: Cart,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("base_url", &self.config.base_url.as_str())
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl AppContext {
    /// Wires every service from `config`, talking to the network through
    /// `backend` and persisting into `area`.
    pub fn new(config: ClientConfig, backend: Arc<dyn HttpBackend>, area: Arc<dyn StorageArea>) -> Self {
        Self::assemble(config, backend, area, RouteTable::storefront())
    }

    pub fn builder() -> AppContextBuilder {
        AppContextBuilder::default()
    }

    fn assemble(
        config: ClientConfig,
        backend: Arc<dyn HttpBackend>,
        area: Arc<dyn StorageArea>,
        routes: RouteTable,
    ) -> Self {
        let origin = config.base_url.origin();
        let storage = Arc::new(StorageService::new(area, &origin));
        let client_state = ClientState::with_keys(storage.area(), &config.token_key, &config.cart_key);

        let fetcher = Arc::new(
            Fetcher::new(backend, config.base_url.clone()).with_failure_status(config.failure_status),
        );
        let notifier = Notifier::new(config.notification_life);
        let navigator = Arc::new(Navigator::new(routes));
        let session = Arc::new(SessionManager::new(
            fetcher,
            client_state.clone(),
            notifier.clone(),
            navigator,
            config.endpoints.clone(),
        ));
        let cart = Cart::new(client_state, notifier.clone());

        log::debug!("application context ready for {}", config.base_url);
        Self {
            config,
            storage,
            notifier,
            session,
            cart,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The change-notifying storage the client state lives in.
    pub fn storage(&self) -> &Arc<StorageService> {
        &self.storage
    }

    pub fn client_state(&self) -> &ClientState {
        self.session.client_state()
    }

    pub fn fetcher(&self) -> &Arc<Fetcher> {
        self.session.fetcher()
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn navigator(&self) -> &Arc<Navigator> {
        self.session.navigator()
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// A fresh store for the admin collection of `R`. Each store keeps its
    /// own listing and field errors.
    pub fn resource<R: Resource>(&self) -> ResourceStore<R> {
        ResourceStore::new(
            self.session.clone(),
            &self.config.endpoints.admin_base,
            &self.config.default_export_filename,
        )
    }

    pub async fn login(&self, credentials: &Credentials) -> AuthOutcome {
        self.session.login(credentials).await
    }

    pub async fn logout(&self) -> AuthOutcome {
        self.session.logout().await
    }

    pub async fn check_session(&self) -> Role {
        self.session.check_session().await
    }

    pub async fn navigate(&self, target: &str) -> Location {
        self.session.navigate(target).await
    }

    pub fn current_location(&self) -> Option<Location> {
        self.navigator().current()
    }
}

/// Builder for [`AppContext`]. Anything left unset falls back to the
/// defaults: [`ClientConfig::default`], a [`ReqwestBackend`] built from the
/// config, and an in-memory storage area.
#[derive(Default)]
pub struct AppContextBuilder {
    config: Option<ClientConfig>,
    backend: Option<Arc<dyn HttpBackend>>,
    area: Option<Arc<dyn StorageArea>>,
    #[cfg(feature = "sqlite_store")]
    sqlite_path: Option<std::path::PathBuf>,
    routes: Option<RouteTable>,
}

impl AppContextBuilder {
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn backend(mut self, backend: Arc<dyn HttpBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn storage(mut self, area: Arc<dyn StorageArea>) -> Self {
        self.area = Some(area);
        self
    }

    /// Persists into a SQLite database at `path`, in the area of the
    /// configured base URL's origin. Ignored when an area was given.
    #[cfg(feature = "sqlite_store")]
    pub fn sqlite(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.sqlite_path = Some(path.into());
        self
    }

    pub fn routes(mut self, routes: RouteTable) -> Self {
        self.routes = Some(routes);
        self
    }

    pub fn build(self) -> Result<AppContext, ContextError> {
        let config = self.config.unwrap_or_default();

        let backend: Arc<dyn HttpBackend> = match self.backend {
            Some(b) => b,
            None => Arc::new(ReqwestBackend::new(&config.user_agent, config.request_timeout)?),
        };

        let area: Arc<dyn StorageArea> = match self.area {
            Some(a) => a,
            #[cfg(feature = "sqlite_store")]
            None if self.sqlite_path.is_some() => {
                let path = self.sqlite_path.unwrap_or_default();
                let store = crate::storage::SqliteStore::new(&path)?;
                log::info!("persisting client state in {}", path.display());
                store.area(&config.base_url.origin())
            }
            None => Arc::new(InMemoryArea::new()),
        };

        Ok(AppContext::assemble(
            config,
            backend,
            area,
            self.routes.unwrap_or_default(),
        ))
    }
}
