//! Static route table for the DocPress application.
//!
//! Routes are plain data: a path pattern, a name, and the access flags the
//! guard checks. Matching is first-hit in table order, so more specific
//! patterns must precede parameterised ones.

use std::collections::BTreeMap;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use url::form_urlencoded;

/// Names of the application's routes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum RouteName {
    /// `/`
    Home,
    /// `/login`
    Login,
    /// `/register`
    Register,
    /// `/dashboard`
    Dashboard,
    /// `/projects`
    Projects,
    /// `/projects/create`
    ProjectCreate,
    /// `/projects/:id`
    ProjectDetail,
    /// `/admin`
    Admin,
    /// Anything else.
    NotFound,
}

/// One row of the route table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    /// Path with optional `:param` segments, or `/*` for the catch-all.
    pub pattern: &'static str,
    /// Route identity.
    pub name: RouteName,
    /// Only signed-in users may enter.
    pub requires_auth: bool,
    /// Only admins may enter.
    pub requires_admin: bool,
}

impl RouteEntry {
    /// Builds a table row.
    #[must_use]
    pub const fn new(
        pattern: &'static str,
        name: RouteName,
        requires_auth: bool,
        requires_admin: bool,
    ) -> Self {
        Self {
            pattern,
            name,
            requires_auth,
            requires_admin,
        }
    }

    const fn is_catch_all(&self) -> bool {
        matches!(self.pattern.as_bytes(), [b'/', b'*'])
    }

    /// Static routes have neither `:param` segments nor a wildcard.
    fn is_static(&self) -> bool {
        !self.pattern.contains([':', '*'])
    }

    /// Matches `segments` and captures any `:param` values.
    fn capture(&self, segments: &[&str]) -> Option<BTreeMap<String, String>> {
        if self.is_catch_all() {
            return Some(BTreeMap::new());
        }
        let pattern: Vec<&str> = split_segments(self.pattern).collect();
        if pattern.len() != segments.len() {
            return None;
        }
        let mut params = BTreeMap::new();
        for (expected, actual) in pattern.iter().zip(segments) {
            match expected.strip_prefix(':') {
                Some(param) => {
                    params.insert(param.to_string(), (*actual).to_string());
                }
                None if expected == actual => {}
                None => return None,
            }
        }
        Some(params)
    }
}

/// A resolved navigation target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    /// Matched route.
    pub name: RouteName,
    /// Normalised path plus the original query string, if any.
    pub full_path: String,
    /// Captured `:param` values.
    pub params: BTreeMap<String, String>,
    /// Copied from the matched entry.
    pub requires_auth: bool,
    /// Copied from the matched entry.
    pub requires_admin: bool,
}

impl Destination {
    /// The path component of [`Destination::full_path`].
    #[must_use]
    pub fn path(&self) -> &str {
        self.full_path
            .split_once('?')
            .map_or(self.full_path.as_str(), |(path, _)| path)
    }

    /// Raw query string, without the `?`.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.full_path.split_once('?').map(|(_, query)| query)
    }

    /// Value captured for a `:param` segment.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// First decoded value of a query parameter.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<String> {
        form_urlencoded::parse(self.query()?.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }
}

/// Ordered route list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl Default for RouteTable {
    fn default() -> Self {
        use RouteName::{
            Admin, Dashboard, Home, Login, NotFound, ProjectCreate, ProjectDetail, Projects,
            Register,
        };
        Self::new(vec![
            RouteEntry::new("/", Home, false, false),
            RouteEntry::new("/login", Login, false, false),
            RouteEntry::new("/register", Register, false, false),
            RouteEntry::new("/dashboard", Dashboard, true, false),
            RouteEntry::new("/projects", Projects, true, false),
            RouteEntry::new("/projects/create", ProjectCreate, true, false),
            RouteEntry::new("/projects/:id", ProjectDetail, true, false),
            RouteEntry::new("/admin", Admin, true, true),
            RouteEntry::new("/*", NotFound, false, false),
        ])
    }
}

impl RouteTable {
    /// Table matching `entries` in the given order.
    #[must_use]
    pub const fn new(entries: Vec<RouteEntry>) -> Self {
        Self { entries }
    }

    /// Rows in match order.
    #[must_use]
    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    /// Resolves a location to its destination.
    ///
    /// The query string is ignored for matching but kept in `full_path`;
    /// trailing slashes are ignored. A table without a catch-all yields a
    /// `not-found` destination for unmatched paths.
    #[must_use]
    pub fn resolve(&self, location: &str) -> Destination {
        let location = location.split_once('#').map_or(location, |(rest, _)| rest);
        let (raw_path, query) = match location.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (location, None),
        };
        let segments: Vec<&str> = split_segments(raw_path).collect();
        let path = format!("/{}", segments.join("/"));
        let full_path = match query {
            Some(query) if !query.is_empty() => format!("{path}?{query}"),
            _ => path,
        };

        self.entries
            .iter()
            .find_map(|entry| {
                entry.capture(&segments).map(|params| Destination {
                    name: entry.name,
                    full_path: full_path.clone(),
                    params,
                    requires_auth: entry.requires_auth,
                    requires_admin: entry.requires_admin,
                })
            })
            .unwrap_or_else(|| Destination {
                name: RouteName::NotFound,
                full_path,
                params: BTreeMap::new(),
                requires_auth: false,
                requires_admin: false,
            })
    }

    /// Canonical path of a static route.
    #[must_use]
    pub fn path_for(&self, name: RouteName) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|entry| entry.name == name && entry.is_static())
            .map(|entry| entry.pattern)
    }
}

fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}
