use super::guard::{self, GuardDecision};
use super::route::{path_only, Route, RouteTable};
use crate::session::SessionManager;
use crate::DEFAULT_CHANNEL_CAPACITY;
use std::sync::RwLock;
use tokio::sync::broadcast;

/// Guard redirects never chain further than this. A target still
/// redirecting afterwards ends on `NotFound`.
const MAX_REDIRECTS: usize = 4;

/// Where a navigation ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Route name.
    pub name: String,
    /// Concrete path. For `NotFound` reached directly this is the requested path.
    pub path: String,
    /// The original target when the guard redirected.
    pub redirected_from: Option<String>,
}

impl Location {
    fn for_route(route: &Route, target: &str, redirected_from: Option<String>) -> Self {
        let path = if redirected_from.is_none() && target.starts_with('/') {
            path_only(target).to_string()
        } else {
            route.path.clone()
        };
        Self {
            name: route.name.clone(),
            path,
            redirected_from,
        }
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationEvent {
    pub from: Option<Location>,
    pub to: Location,
}

/// Navigation history, guarded by the session.
pub struct Navigator {
    routes: RouteTable,
    history: RwLock<Vec<Location>>,
    tx: broadcast::Sender<NavigationEvent>,
}

impl std::fmt::Debug for Navigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Navigator")
            .field("current", &self.current())
            .finish_non_exhaustive()
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(RouteTable::storefront())
    }
}

impl Navigator {
    pub fn new(routes: RouteTable) -> Self {
        let (tx, _rx) = broadcast::channel(DEFAULT_CHANNEL_CAPACITY);
        Self {
            routes,
            history: RwLock::new(vec![]),
            tx,
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NavigationEvent> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> Option<Location> {
        self.history
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .cloned()
    }

    pub fn history(&self) -> Vec<Location> {
        self.history.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Navigates to `target` (a path such as `/admin` or a route name such as
    /// `login`).
    ///
    /// The session is re-validated first, then the guard decides whether the
    /// target is allowed or where to go instead. The final location is
    /// committed to the history and broadcast.
    pub async fn navigate(&self, session: &SessionManager, target: &str) -> Location {
        let role = session.check_session().await;

        let mut route = self.routes.resolve(target);
        let mut redirected_from = None;
        let mut hops = 0;
        loop {
            match guard::evaluate(route.meta, role) {
                GuardDecision::Allow => break,
                GuardDecision::Redirect(name) if hops < MAX_REDIRECTS => {
                    log::debug!("guard: {target} -> {name} ({role:?})");
                    redirected_from.get_or_insert_with(|| target.to_string());
                    route = self.routes.by_name(name).unwrap_or(self.routes.not_found());
                    hops += 1;
                }
                GuardDecision::Redirect(_) => {
                    log::warn!("guard: {target} still redirecting after {hops} hops, giving up");
                    redirected_from.get_or_insert_with(|| target.to_string());
                    route = self.routes.not_found();
                    break;
                }
            }
        }

        let location = Location::for_route(route, target, redirected_from);
        self.commit(location.clone());
        location
    }

    fn commit(&self, to: Location) {
        let from = {
            let mut history = self.history.write().unwrap_or_else(|e| e.into_inner());
            let from = history.last().cloned();
            history.push(to.clone());
            from
        };

        log::info!("navigated to {} ({})", to.name, to.path);
        let _ = self.tx.send(NavigationEvent { from, to });
    }
}
