//! Access checks run before every navigation.

use strum::Display;
use tracing::warn;

use crate::{
    routes::{Destination, RouteName},
    session::Session,
};

/// Why a navigation was redirected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum RedirectReason {
    /// The route needs a session and there is none.
    LoginRequired,
    /// The route is admin-only.
    InsufficientPrivileges,
    /// Login and register make no sense while signed in.
    AlreadyAuthenticated,
}

/// Outcome of [`evaluate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Proceed to the destination.
    Allow,
    /// Go somewhere else instead.
    Redirect {
        /// Route to go to.
        to: RouteName,
        /// Location to return to once the redirect has been satisfied.
        resume: Option<String>,
        /// Which check failed.
        reason: RedirectReason,
    },
}

impl Decision {
    /// `true` for [`Decision::Allow`].
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Decides whether `session` may enter `destination`.
///
/// Checks run in order and the first failing one wins: authentication, then
/// admin role, then bouncing signed-in users away from the login and register
/// pages.
#[must_use]
pub fn evaluate(destination: &Destination, session: &Session) -> Decision {
    let authenticated = session.is_authenticated();

    if destination.requires_auth && !authenticated {
        return Decision::Redirect {
            to: RouteName::Login,
            resume: Some(destination.full_path.clone()),
            reason: RedirectReason::LoginRequired,
        };
    }

    if destination.requires_admin && !session.is_admin() {
        warn!(
            path = %destination.full_path,
            username = session.user().map_or("<none>", |user| user.username.as_str()),
            "insufficient privileges"
        );
        return Decision::Redirect {
            to: RouteName::Dashboard,
            resume: None,
            reason: RedirectReason::InsufficientPrivileges,
        };
    }

    if authenticated && matches!(destination.name, RouteName::Login | RouteName::Register) {
        return Decision::Redirect {
            to: RouteName::Dashboard,
            resume: None,
            reason: RedirectReason::AlreadyAuthenticated,
        };
    }

    Decision::Allow
}
