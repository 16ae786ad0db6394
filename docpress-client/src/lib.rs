#![cfg_attr(not(test), forbid(unsafe_code))]
//! Client core for DocPress: session state, route guarding, and the HTTP API.

pub mod api;
pub mod app;
pub mod guard;
pub mod navigator;
pub mod routes;
pub mod session;
pub mod storage;

pub use api::{ApiClient, ApiError, ApiEvent, AuthApi};
pub use app::{App, Started};
pub use guard::{Decision, RedirectReason};
pub use navigator::{Hop, Navigation, NavigationError, Navigator};
pub use routes::{Destination, RouteEntry, RouteName, RouteTable};
pub use session::{Session, SessionError, SessionStore};
pub use storage::{FileStorage, MemoryStorage, StorageError, TOKEN_KEY, TokenStorage};

#[cfg(test)]
mod session_test;
#[cfg(test)]
mod test_support;
