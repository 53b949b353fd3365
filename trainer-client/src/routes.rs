//! Table of application views and the access level each one requires.

use std::fmt;

use strum::{EnumIter, IntoEnumIterator};

/// Who may open a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Anyone, signed in or not.
    Public,
    /// Any signed-in user.
    Protected,
    /// Signed-in users whose admin flag is set.
    Admin,
}

/// The application routes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, EnumIter)]
pub enum Route {
    /// `/`, forwards to [`Route::Topics`].
    #[default]
    Home,
    /// `/login`
    Login,
    /// `/register`
    Register,
    /// `/topics`, the topic list.
    Topics,
    /// `/topics/{id}` with the topic's assignments.
    Topic {
        /// Topic id.
        id: i64,
    },
    /// `/assignments/{id}`, the exercise view.
    Assignment {
        /// Assignment id.
        id: i64,
    },
    /// `/admin/logs`
    AdminLogs,
    /// `/admin/users`
    AdminUsers,
    /// `/admin/topics`
    AdminTopics,
    /// `/admin/assignments`
    AdminAssignments,
    /// Any location that matches nothing else.
    NotFound,
}

impl Route {
    /// Resolves a location such as `/topics/3?tab=all` into a route.
    ///
    /// Query strings, fragments and a trailing slash are ignored. Anything
    /// unrecognised, including a non-numeric id, is [`Route::NotFound`].
    #[must_use]
    pub fn parse(location: &str) -> Route {
        let path = location
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Route::Home,
            ["login"] => Route::Login,
            ["register"] => Route::Register,
            ["topics"] => Route::Topics,
            ["topics", id] => id
                .parse()
                .map_or(Route::NotFound, |id| Route::Topic { id }),
            ["assignments", id] => id
                .parse()
                .map_or(Route::NotFound, |id| Route::Assignment { id }),
            ["admin", "logs"] => Route::AdminLogs,
            ["admin", "users"] => Route::AdminUsers,
            ["admin", "topics"] => Route::AdminTopics,
            ["admin", "assignments"] => Route::AdminAssignments,
            _ => Route::NotFound,
        }
    }

    /// Canonical location of the route.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Login => "/login".to_string(),
            Route::Register => "/register".to_string(),
            Route::Topics => "/topics".to_string(),
            Route::Topic { id } => format!("/topics/{id}"),
            Route::Assignment { id } => format!("/assignments/{id}"),
            Route::AdminLogs => "/admin/logs".to_string(),
            Route::AdminUsers => "/admin/users".to_string(),
            Route::AdminTopics => "/admin/topics".to_string(),
            Route::AdminAssignments => "/admin/assignments".to_string(),
            Route::NotFound => "/404".to_string(),
        }
    }

    /// Access level the route requires.
    #[must_use]
    pub fn access(&self) -> Access {
        match self {
            Route::Home | Route::Login | Route::Register | Route::NotFound => Access::Public,
            Route::Topics | Route::Topic { .. } | Route::Assignment { .. } => Access::Protected,
            Route::AdminLogs | Route::AdminUsers | Route::AdminTopics | Route::AdminAssignments => {
                Access::Admin
            }
        }
    }

    /// Where this route forwards to without rendering anything itself.
    #[must_use]
    pub fn forwards_to(&self) -> Option<Route> {
        match self {
            Route::Home => Some(Route::Topics),
            _ => None,
        }
    }

    /// Admin views, in navigation order.
    #[must_use]
    pub fn admin_routes() -> impl Iterator<Item = Route> {
        Route::iter().filter(|route| route.access() == Access::Admin)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
