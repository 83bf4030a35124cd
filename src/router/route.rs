use bitflags::bitflags;

/// Names of the built-in routes.
pub mod names {
    pub const HOME: &str = "home";
    pub const LOGIN: &str = "login";
    pub const REGISTER: &str = "register";
    pub const FORGOT_PASSWORD: &str = "forgot-password";
    pub const PROFILE: &str = "profile";
    pub const CART: &str = "cart";
    pub const CHECKOUT: &str = "checkout";
    pub const ADMIN: &str = "admin";
    pub const ADMIN_CATEGORIES: &str = "admin-categories";
    pub const ADMIN_PRODUCTS: &str = "admin-products";
    pub const ADMIN_SUPPLIERS: &str = "admin-suppliers";
    pub const ADMIN_USERS: &str = "admin-users";
    pub const ADMIN_ORDERS: &str = "admin-orders";
    pub const NOT_FOUND: &str = "NotFound";
}

bitflags! {
    /// Access metadata consulted by the route guard.
    pub struct RouteMeta: u8 {
        /// Only signed-in users may enter.
        const REQUIRES_AUTH  = 0b001;
        /// Only admins may enter. Implies `REQUIRES_AUTH`.
        const REQUIRES_ADMIN = 0b010;
        /// Only anonymous visitors may enter (login, register, ...).
        const ANONYMOUS_ONLY = 0b100;
    }
}

impl RouteMeta {
    pub fn public() -> Self {
        RouteMeta::empty()
    }

    pub fn auth() -> Self {
        RouteMeta::REQUIRES_AUTH
    }

    pub fn admin() -> Self {
        RouteMeta::REQUIRES_AUTH | RouteMeta::REQUIRES_ADMIN
    }

    pub fn anonymous() -> Self {
        RouteMeta::ANONYMOUS_ONLY
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub name: String,
    /// Path pattern. Segments starting with `:` match any single segment.
    pub path: String,
    pub aliases: Vec<String>,
    pub meta: RouteMeta,
}

impl Route {
    pub fn new(name: &str, path: &str, meta: RouteMeta) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            aliases: vec![],
            meta,
        }
    }

    pub fn alias(mut self, path: &str) -> Self {
        self.aliases.push(path.to_string());
        self
    }

    pub fn matches(&self, path: &str) -> bool {
        pattern_matches(&self.path, path) || self.aliases.iter().any(|a| pattern_matches(a, path))
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn pattern_matches(pattern: &str, path: &str) -> bool {
    let mut pat = segments(pattern);
    let mut actual = segments(path);
    loop {
        match (pat.next(), actual.next()) {
            (None, None) => return true,
            (Some(p), Some(a)) if p.starts_with(':') || p == a => continue,
            _ => return false,
        }
    }
}

/// Strips query string and fragment from a navigation target.
pub(crate) fn path_only(target: &str) -> &str {
    let end = target.find(['?', '#']).unwrap_or(target.len());
    &target[..end]
}

/// The set of named routes known to the navigator.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
    not_found: Route,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::storefront()
    }
}

impl RouteTable {
    /// An empty table that only knows the `NotFound` fallback.
    pub fn new() -> Self {
        Self {
            routes: vec![],
            not_found: Route::new(names::NOT_FOUND, "/not-found", RouteMeta::public()),
        }
    }

    /// Routes of the storefront and its admin back-office.
    pub fn storefront() -> Self {
        use names::*;

        let mut table = Self::new();
        table
            .add(Route::new(HOME, "/", RouteMeta::public()).alias("/home"))
            .add(Route::new(LOGIN, "/login", RouteMeta::anonymous()))
            .add(Route::new(REGISTER, "/register", RouteMeta::anonymous()))
            .add(Route::new(FORGOT_PASSWORD, "/forgot-password", RouteMeta::anonymous()))
            .add(Route::new(PROFILE, "/profile", RouteMeta::auth()))
            .add(Route::new(CART, "/cart", RouteMeta::auth()))
            .add(Route::new(CHECKOUT, "/checkout", RouteMeta::auth()))
            .add(Route::new(ADMIN, "/admin", RouteMeta::admin()))
            .add(Route::new(ADMIN_CATEGORIES, "/admin/categories", RouteMeta::admin()))
            .add(Route::new(ADMIN_PRODUCTS, "/admin/products", RouteMeta::admin()))
            .add(Route::new(ADMIN_SUPPLIERS, "/admin/suppliers", RouteMeta::admin()))
            .add(Route::new(ADMIN_USERS, "/admin/users", RouteMeta::admin()))
            .add(Route::new(ADMIN_ORDERS, "/admin/orders", RouteMeta::admin()));
        table
    }

    /// Adds `route`, replacing any route with the same name.
    pub fn add(&mut self, route: Route) -> &mut Self {
        if route.name == names::NOT_FOUND {
            self.not_found = route;
            return self;
        }
        self.routes.retain(|r| r.name != route.name);
        self.routes.push(route);
        self
    }

    pub fn by_name(&self, name: &str) -> Option<&Route> {
        if name == names::NOT_FOUND {
            return Some(&self.not_found);
        }
        self.routes.iter().find(|r| r.name == name)
    }

    /// Route matching `path`, or `NotFound`.
    pub fn by_path(&self, path: &str) -> &Route {
        let path = path_only(path);
        self.routes
            .iter()
            .find(|r| r.matches(path))
            .unwrap_or(&self.not_found)
    }

    /// Resolves a navigation target: paths start with `/`, anything else is a
    /// route name. Unknown targets resolve to `NotFound`.
    pub fn resolve(&self, target: &str) -> &Route {
        if target.starts_with('/') {
            self.by_path(target)
        } else {
            self.by_name(target).unwrap_or(&self.not_found)
        }
    }

    pub fn not_found(&self) -> &Route {
        &self.not_found
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter().chain(std::iter::once(&self.not_found))
    }
}
