//! Path prefix → upstream route table.
//!
//! # Responsibilities
//! - Store compiled routes
//! - Resolve the upstream base URL for an inbound path
//! - Return an explicit no-match instead of a silent default
//!
//! # Design Decisions
//! - Compiled from config at startup and on reload, immutable between
//! - Longest prefix wins; ties resolve in config order
//! - No regex in the hot path, prefix matching only

use crate::config::schema::RouteConfig;

/// A single compiled route.
#[derive(Debug, Clone)]
pub struct Route {
    pub name: String,
    pub path_prefix: String,
    pub upstream: String,
}

/// Immutable table of routes, ordered for longest-prefix matching.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Compile a route table from configuration.
    pub fn compile(routes: &[RouteConfig]) -> Self {
        let mut compiled: Vec<Route> = routes
            .iter()
            .map(|r| Route {
                name: r.name.clone(),
                path_prefix: r.path_prefix.clone(),
                upstream: r.upstream.clone(),
            })
            .collect();

        // Stable sort keeps config order among equal-length prefixes.
        compiled.sort_by(|a, b| b.path_prefix.len().cmp(&a.path_prefix.len()));

        Self { routes: compiled }
    }

    /// Resolve the route for a path, or `None` when nothing matches.
    pub fn resolve(&self, path: &str) -> Option<&Route> {
        self.routes
            .iter()
            .find(|route| path.starts_with(&route.path_prefix))
    }
}
