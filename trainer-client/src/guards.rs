//! Access decisions for views, computed from a session snapshot.
//!
//! Guards never fetch or mutate anything. While a profile fetch is in flight
//! they answer [`GuardOutcome::Loading`] so a half-restored session is never
//! mistaken for a signed-out one.

use crate::{
    auth::Session,
    routes::{Access, Route},
};

/// Navigation instruction produced by a guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    /// Where to go instead.
    pub to: Route,
    /// The location that was refused, for returning there after login.
    pub from: Option<String>,
}

/// What a view should do with the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Show a loading indicator and wait for the session to settle.
    Loading,
    /// Navigate elsewhere instead of rendering.
    Redirect(Redirect),
    /// The session may see the view.
    Render,
}

/// Gate for views that need a signed-in user.
#[must_use]
pub fn protected_route(session: &Session, requested: &Route) -> GuardOutcome {
    if session.loading {
        return GuardOutcome::Loading;
    }
    if session.user.is_none() {
        return GuardOutcome::Redirect(Redirect {
            to: Route::Login,
            from: Some(requested.path()),
        });
    }
    GuardOutcome::Render
}

/// Gate for admin views. Anyone who is not a resolved admin goes back to `/`.
#[must_use]
pub fn admin_route(session: &Session) -> GuardOutcome {
    if session.loading {
        return GuardOutcome::Loading;
    }
    if !session.is_admin() {
        return GuardOutcome::Redirect(Redirect {
            to: Route::Home,
            from: None,
        });
    }
    GuardOutcome::Render
}

/// Applies whichever guard `route` declares.
#[must_use]
pub fn resolve(route: &Route, session: &Session) -> GuardOutcome {
    if let Some(target) = route.forwards_to() {
        return GuardOutcome::Redirect(Redirect {
            to: target,
            from: None,
        });
    }
    match route.access() {
        Access::Public => GuardOutcome::Render,
        Access::Protected => protected_route(session, route),
        Access::Admin => admin_route(session),
    }
}

/// Where to go after a successful login.
///
/// Returns to the refused location when it names a real view, otherwise to
/// the topic list.
#[must_use]
pub fn post_login_destination(from: Option<&str>) -> Route {
    match from.map(Route::parse) {
        Some(Route::Login | Route::Register | Route::NotFound | Route::Home) | None => {
            Route::Topics
        }
        Some(route) => route,
    }
}
