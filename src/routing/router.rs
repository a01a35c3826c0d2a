//! Route lookup.
//!
//! # Responsibilities
//! - Store compiled routes grouped by method
//! - Look up the endpoint for a (method, path) pair
//! - Return the matched endpoint with its bound path parameters, or nothing
//!
//! # Design Decisions
//! - Immutable after construction (shared across requests without locks)
//! - A duplicate (method, path shape) replaces the earlier registration
//! - O(n) scan per method (acceptable for typical mock configs)
//! - HEAD falls back to the GET route when no HEAD route exists

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::schema::{EndpointSpec, HttpMethod};
use crate::routing::matcher::PathPattern;

/// A compiled endpoint.
#[derive(Debug, Clone)]
pub struct Route {
    pub pattern: PathPattern,
    pub endpoint: Arc<EndpointSpec>,
}

/// Result of a successful lookup.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub endpoint: Arc<EndpointSpec>,
    pub params: HashMap<String, String>,
}

/// The installed, queryable set of endpoints.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<HttpMethod, Vec<Route>>,
}

impl RouteTable {
    /// Compile endpoints in order.
    pub fn build(endpoints: &[EndpointSpec]) -> Self {
        let mut table = Self::default();
        for endpoint in endpoints {
            table.insert(endpoint.clone());
        }
        table
    }

    fn insert(&mut self, endpoint: EndpointSpec) {
        let pattern = PathPattern::parse(&endpoint.path);
        let routes = self.routes.entry(endpoint.method).or_default();
        let route = Route {
            pattern,
            endpoint: Arc::new(endpoint),
        };

        match routes
            .iter_mut()
            .find(|existing| existing.pattern.shape() == route.pattern.shape())
        {
            Some(existing) => {
                tracing::warn!(
                    method = %route.endpoint.method,
                    path = %route.pattern,
                    "Duplicate route registration, later definition wins"
                );
                *existing = route;
            }
            None => routes.push(route),
        }
    }

    /// Find the endpoint serving `method` and `path`.
    pub fn match_route(&self, method: HttpMethod, path: &str) -> Option<RouteMatch> {
        self.find(method, path).or_else(|| match method {
            HttpMethod::Head => self.find(HttpMethod::Get, path),
            _ => None,
        })
    }

    fn find(&self, method: HttpMethod, path: &str) -> Option<RouteMatch> {
        self.routes.get(&method)?.iter().find_map(|route| {
            route.pattern.matches(path).map(|params| RouteMatch {
                endpoint: route.endpoint.clone(),
                params,
            })
        })
    }

    /// All routes, grouped by method in the fixed verb order.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        HttpMethod::ALL
            .iter()
            .filter_map(|m| self.routes.get(m))
            .flatten()
    }

    pub fn len(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ResponseSpec;

    fn endpoint(method: HttpMethod, path: &str, status: u16) -> EndpointSpec {
        EndpointSpec {
            path: path.to_string(),
            method,
            response: ResponseSpec {
                status_code: status,
                headers: None,
                body: None,
                delay_ms: None,
            },
            alternate_responses: None,
        }
    }

    #[test]
    fn test_method_must_match() {
        let table = RouteTable::build(&[endpoint(HttpMethod::Post, "/api/users", 201)]);
        assert!(table.match_route(HttpMethod::Post, "/api/users").is_some());
        assert!(table.match_route(HttpMethod::Get, "/api/users").is_none());
    }

    #[test]
    fn test_params_are_bound() {
        let table = RouteTable::build(&[endpoint(HttpMethod::Get, "/api/users/:id", 200)]);
        let found = table.match_route(HttpMethod::Get, "/api/users/42").unwrap();
        assert_eq!(found.params["id"], "42");
        assert_eq!(found.endpoint.path, "/api/users/:id");
    }

    #[test]
    fn test_duplicate_registration_last_wins() {
        let table = RouteTable::build(&[
            endpoint(HttpMethod::Get, "/thing/:id", 200),
            endpoint(HttpMethod::Get, "/thing/:thingId", 410),
        ]);
        assert_eq!(table.len(), 1);
        let found = table.match_route(HttpMethod::Get, "/thing/7").unwrap();
        assert_eq!(found.endpoint.response.status_code, 410);
        assert_eq!(found.params["thingId"], "7");
    }

    #[test]
    fn test_first_registered_wins_between_overlapping_shapes() {
        let table = RouteTable::build(&[
            endpoint(HttpMethod::Get, "/users/me", 200),
            endpoint(HttpMethod::Get, "/users/:id", 201),
        ]);
        let me = table.match_route(HttpMethod::Get, "/users/me").unwrap();
        assert_eq!(me.endpoint.response.status_code, 200);
        let other = table.match_route(HttpMethod::Get, "/users/9").unwrap();
        assert_eq!(other.endpoint.response.status_code, 201);
    }

    #[test]
    fn test_head_falls_back_to_get() {
        let table = RouteTable::build(&[
            endpoint(HttpMethod::Get, "/a", 200),
            endpoint(HttpMethod::Head, "/b", 204),
        ]);
        let a = table.match_route(HttpMethod::Head, "/a").unwrap();
        assert_eq!(a.endpoint.method, HttpMethod::Get);
        let b = table.match_route(HttpMethod::Head, "/b").unwrap();
        assert_eq!(b.endpoint.response.status_code, 204);
        assert!(table.match_route(HttpMethod::Get, "/b").is_none());
    }

    #[test]
    fn test_empty_table() {
        let table = RouteTable::build(&[]);
        assert!(table.is_empty());
        assert!(table.match_route(HttpMethod::Get, "/").is_none());
    }
}
