//! Route guard.
//!
//! Evaluated before every navigation, after the session has been
//! re-validated. Rules are checked in order:
//!
//! 1. anonymous-only target while signed in → `home`
//! 2. target needs a sign-in while anonymous → `login`
//! 3. admin target while signed in without admin → `NotFound`
//! 4. otherwise allow
//!
//! Rule 1 comes first so a signed-in user opening `/login` lands on `home`.
//! Non-admins are sent to `NotFound` so admin sections are not revealed.
use super::route::{names, RouteMeta};
use crate::session::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    /// Navigate to the named route instead.
    Redirect(&'static str),
}

pub fn evaluate(meta: RouteMeta, role: Role) -> GuardDecision {
    if meta.contains(RouteMeta::ANONYMOUS_ONLY) && role.is_signed_in() {
        return GuardDecision::Redirect(names::HOME);
    }
    if meta.intersects(RouteMeta::REQUIRES_AUTH | RouteMeta::REQUIRES_ADMIN) && !role.is_signed_in() {
        return GuardDecision::Redirect(names::LOGIN);
    }
    if meta.contains(RouteMeta::REQUIRES_ADMIN) && role != Role::Admin {
        return GuardDecision::Redirect(names::NOT_FOUND);
    }
    GuardDecision::Allow
}
