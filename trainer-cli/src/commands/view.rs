//! Guards every resource command the way the web views are guarded: restore
//! the session, then ask the route's guard whether it may be shown.

use anyhow::{Error, Result, anyhow, bail};
use client::{AuthPhase, CoreApiError, GuardOutcome, Redirect, Route, guards};
use serde_json::Value;
use tracing::debug;

use crate::app::App;

/// Restores the session and refuses `route` unless its guard renders it.
pub async fn open(app: &App, route: &Route) -> Result<()> {
    app.session.bootstrap().await;
    let session = app.session.settled().await;

    match guards::resolve(route, &session) {
        GuardOutcome::Render => {
            debug!(%route, "view allowed");
            Ok(())
        }
        GuardOutcome::Loading => bail!("session is still being restored; try {route} again"),
        GuardOutcome::Redirect(Redirect {
            to: Route::Login,
            from,
        }) => {
            if session.phase() == AuthPhase::Unverified {
                bail!(
                    "could not verify the stored credential against {}; \
                     retry, or run `trainer session login`",
                    app.config.auth_url
                );
            }
            let from = from.unwrap_or_else(|| route.path());
            bail!("{route} requires signing in. run `trainer session login --from {from}`")
        }
        GuardOutcome::Redirect(Redirect { to, .. }) => {
            bail!("{route} is only available to admins (redirected to {to})")
        }
    }
}

/// Adds a sign-in hint to credential refusals from the core service.
pub fn core_error(err: CoreApiError) -> Error {
    if err.status() == Some(401) {
        return anyhow!("{err}. run `trainer session login` to sign in again");
    }
    err.into()
}

/// Pretty-prints a response body to stdout.
pub fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
