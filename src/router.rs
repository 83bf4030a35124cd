//! Named routes, the route guard and the navigator.

pub mod guard;
pub mod navigator;
pub mod route;

pub use guard::{evaluate, GuardDecision};
pub use navigator::{Location, NavigationEvent, Navigator};
pub use route::{names, Route, RouteMeta, RouteTable};
