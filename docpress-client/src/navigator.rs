//! Guarded navigation over the route table.
//!
//! The [`Navigator`] records the current location in a `watch` channel so the
//! app shell and its consumers observe the same value.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info};
use url::form_urlencoded;

use crate::{
    guard::{self, Decision, RedirectReason},
    routes::{Destination, RouteName, RouteTable},
    session::Session,
};

/// Redirects followed before navigation gives up.
pub const MAX_REDIRECTS: usize = 8;

const RESUME_PARAM: &str = "redirect";

/// Why a navigation could not settle on a destination.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NavigationError {
    /// The guard kept redirecting.
    #[error("navigation to {path} exceeded {MAX_REDIRECTS} redirects")]
    RedirectLoop {
        /// Location originally requested.
        path: String,
    },

    /// A redirect targeted a route that has only parameterised paths.
    #[error("route table has no static path for {0}")]
    UnknownRoute(RouteName),
}

/// A single redirect taken during navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hop {
    /// Location that was refused.
    pub from: String,
    /// Location redirected to.
    pub to: String,
    /// Why.
    pub reason: RedirectReason,
}

/// Where a navigation ended and how it got there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    /// Final, allowed location.
    pub destination: Destination,
    /// Redirects taken on the way, in order.
    pub redirects: Vec<Hop>,
}

/// Tracks the current location and moves it through the guard.
#[derive(Debug, Clone)]
pub struct Navigator {
    routes: Arc<RouteTable>,
    current: Arc<watch::Sender<Destination>>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(RouteTable::default())
    }
}

impl Navigator {
    /// Creates a navigator positioned at `/`.
    #[must_use]
    pub fn new(routes: RouteTable) -> Self {
        let (current, _) = watch::channel(routes.resolve("/"));
        Self {
            routes: Arc::new(routes),
            current: Arc::new(current),
        }
    }

    /// The table locations are resolved against.
    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Current location.
    #[must_use]
    pub fn current(&self) -> Destination {
        self.current.borrow().clone()
    }

    /// Receiver that observes every location change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Destination> {
        self.current.subscribe()
    }

    /// Navigates to `location`, following guard redirects until one is allowed.
    ///
    /// # Errors
    /// Fails when more than [`MAX_REDIRECTS`] redirects are needed or a
    /// redirect targets a route with no static path. The current location is
    /// left unchanged in either case.
    pub fn navigate(
        &self,
        location: &str,
        session: &Session,
    ) -> Result<Navigation, NavigationError> {
        let mut destination = self.routes.resolve(location);
        let mut redirects = Vec::new();

        while let Decision::Redirect { to, resume, reason } =
            guard::evaluate(&destination, session)
        {
            if redirects.len() >= MAX_REDIRECTS {
                return Err(NavigationError::RedirectLoop {
                    path: location.to_string(),
                });
            }
            let target = self.redirect_target(to, resume.as_deref())?;
            let next = self.routes.resolve(&target);
            debug!(from = %destination.full_path, to = %next.full_path, %reason, "redirecting");
            redirects.push(Hop {
                from: std::mem::replace(&mut destination, next).full_path,
                to: destination.full_path.clone(),
                reason,
            });
        }

        debug!(path = %destination.full_path, route = %destination.name, "navigated");
        self.current.send_replace(destination.clone());
        Ok(Navigation {
            destination,
            redirects,
        })
    }

    /// Moves to `location` without consulting the guard.
    #[must_use]
    pub fn force(&self, location: &str) -> Destination {
        let destination = self.routes.resolve(location);
        info!(path = %destination.full_path, "forced navigation");
        self.current.send_replace(destination.clone());
        destination
    }

    /// Continues to the location saved by a login redirect, or the dashboard.
    ///
    /// Only same-site paths are honoured.
    ///
    /// # Errors
    /// See [`Navigator::navigate`].
    pub fn resume_after_login(&self, session: &Session) -> Result<Navigation, NavigationError> {
        let target = match self.current().query_param(RESUME_PARAM) {
            Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
            _ => self
                .routes
                .path_for(RouteName::Dashboard)
                .ok_or(NavigationError::UnknownRoute(RouteName::Dashboard))?
                .to_string(),
        };
        self.navigate(&target, session)
    }

    fn redirect_target(
        &self,
        to: RouteName,
        resume: Option<&str>,
    ) -> Result<String, NavigationError> {
        let path = self
            .routes
            .path_for(to)
            .ok_or(NavigationError::UnknownRoute(to))?;
        Ok(match resume {
            Some(resume) => {
                let query = form_urlencoded::Serializer::new(String::new())
                    .append_pair(RESUME_PARAM, resume)
                    .finish();
                format!("{path}?{query}")
            }
            None => path.to_string(),
        })
    }
}
