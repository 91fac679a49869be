// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Request routing against the command catalog.
//!
//! Patterns are matched segment by segment: literal segments compare exactly,
//! `{variable}` segments bind whatever single segment they face. Entries are
//! probed in catalog order and the first match wins. The table is built once
//! at startup and shared read-only.

use serde_json::{json, Map, Value};

use crate::catalog::{CommandSpec, Method, CATALOG};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(&'static str),
    Variable(&'static str),
}

#[derive(Debug)]
struct Route {
    name: &'static str,
    url_pattern: &'static str,
    segments: Vec<Segment>,
}

impl Route {
    fn new(entry: &CommandSpec) -> Self {
        let segments = entry
            .url_pattern
            .split('/')
            .map(|segment| {
                match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                    Some(name) => Segment::Variable(name),
                    None => Segment::Literal(segment),
                }
            })
            .collect();
        Self {
            name: entry.name,
            url_pattern: entry.url_pattern,
            segments,
        }
    }

    /// Matches `segments` against this route, binding variables in pattern
    /// order. Variable names are surfaced uppercased; an `ID` bound on an
    /// element route is wrapped as a wire element reference so that element
    /// handles reach the agent in the same shape everywhere.
    fn bind(&self, segments: &[&str]) -> Option<Map<String, Value>> {
        if segments.len() != self.segments.len() {
            return None;
        }

        let mut variables = Map::new();
        for (pattern, actual) in self.segments.iter().zip(segments) {
            match pattern {
                Segment::Literal(literal) => {
                    if literal != actual {
                        return None;
                    }
                }
                Segment::Variable(name) => {
                    let decoded = percent_decode(actual);
                    let name = name.to_uppercase();
                    let value = if name == "ID" && self.url_pattern.contains("/element/") {
                        json!({ "ELEMENT": decoded })
                    } else {
                        Value::String(decoded)
                    };
                    variables.insert(name, value);
                }
            }
        }
        Some(variables)
    }
}

/// A successful lookup: the matched command plus its bound path variables.
#[derive(Debug)]
pub struct RouteMatch {
    pub name: &'static str,
    pub url_pattern: &'static str,
    pub variables: Map<String, Value>,
}

/// The dispatch table, partitioned by HTTP method.
pub struct RoutingTable {
    get: Vec<Route>,
    post: Vec<Route>,
    delete: Vec<Route>,
}

impl RoutingTable {
    /// Builds the table from the static catalog.
    pub fn new() -> Self {
        let mut table = Self {
            get: Vec::new(),
            post: Vec::new(),
            delete: Vec::new(),
        };
        for entry in CATALOG {
            table.routes_mut(entry.method).push(Route::new(entry));
        }
        table
    }

    fn routes(&self, method: Method) -> &[Route] {
        match method {
            Method::Get => &self.get,
            Method::Post => &self.post,
            Method::Delete => &self.delete,
        }
    }

    fn routes_mut(&mut self, method: Method) -> &mut Vec<Route> {
        match method {
            Method::Get => &mut self.get,
            Method::Post => &mut self.post,
            Method::Delete => &mut self.delete,
        }
    }

    /// Finds the first catalog entry matching `path` (relative to the base
    /// path, with or without a leading slash) for the given method.
    pub fn lookup(&self, method: Method, path: &str) -> Option<RouteMatch> {
        let trimmed = path.trim_matches('/');
        let segments: Vec<&str> = trimmed.split('/').collect();
        self.routes(method).iter().find_map(|route| {
            route.bind(&segments).map(|variables| RouteMatch {
                name: route.name,
                url_pattern: route.url_pattern,
                variables,
            })
        })
    }

    /// Reverse lookup: the method and URL pattern registered for a command.
    pub fn route_for(&self, name: &str) -> Option<(Method, &'static str)> {
        CATALOG
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| (entry.method, entry.url_pattern))
    }
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Decodes `%xx` escapes. Malformed escapes pass through untouched rather
/// than failing the match.
fn percent_decode(segment: &str) -> String {
    let bytes = segment.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if let (Some(hi), Some(lo)) = (
                bytes.get(i + 1).and_then(|b| (*b as char).to_digit(16)),
                bytes.get(i + 2).and_then(|b| (*b as char).to_digit(16)),
            ) {
                decoded.push((hi * 16 + lo) as u8);
                i += 3;
                continue;
            }
        }
        decoded.push(bytes[i]);
        i += 1;
    }
    String::from_utf8(decoded).unwrap_or_else(|_| segment.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_catalog_entry_matches_its_own_pattern() {
        let table = RoutingTable::new();
        for entry in CATALOG {
            let concrete: String = entry
                .url_pattern
                .split('/')
                .map(|segment| {
                    if segment.starts_with('{') {
                        "xyz"
                    } else {
                        segment
                    }
                })
                .collect::<Vec<_>>()
                .join("/");

            let matched = table
                .lookup(entry.method, &concrete)
                .unwrap_or_else(|| panic!("{} did not match {}", entry.name, concrete));
            assert_eq!(matched.name, entry.name);

            let variable_count =
                entry.url_pattern.split('/').filter(|s| s.starts_with('{')).count();
            assert_eq!(matched.variables.len(), variable_count);
            for value in matched.variables.values() {
                match value {
                    Value::String(s) => assert_eq!(s, "xyz"),
                    Value::Object(o) => assert_eq!(o["ELEMENT"], json!("xyz")),
                    other => panic!("unexpected binding {other:?}"),
                }
            }
        }
    }

    #[test]
    fn binds_session_and_element_variables() {
        let table = RoutingTable::new();
        let matched = table
            .lookup(Method::Post, "/session/s1/element/:el7/click")
            .expect("click route");
        assert_eq!(matched.name, "clickElement");
        assert_eq!(matched.variables["SESSIONID"], json!("s1"));
        assert_eq!(matched.variables["ID"], json!({ "ELEMENT": ":el7" }));
    }

    #[test]
    fn variables_bind_in_pattern_order() {
        let table = RoutingTable::new();
        let matched = table
            .lookup(Method::Get, "session/s1/element/e4/attribute/href")
            .expect("attribute route");
        let keys: Vec<&str> = matched.variables.keys().map(String::as_str).collect();
        assert_eq!(keys, ["SESSIONID", "ID", "NAME"]);
    }

    #[test]
    fn percent_decodes_bound_segments() {
        let table = RoutingTable::new();
        let matched = table
            .lookup(Method::Get, "session/s%201/title")
            .expect("title route");
        assert_eq!(matched.variables["SESSIONID"], json!("s 1"));
    }

    #[test]
    fn method_mismatch_does_not_match() {
        let table = RoutingTable::new();
        assert!(table.lookup(Method::Get, "session").is_none());
        assert!(table.lookup(Method::Post, "session/s1/title").is_none());
    }

    #[test]
    fn unknown_path_does_not_match() {
        let table = RoutingTable::new();
        assert!(table.lookup(Method::Get, "nonexistent").is_none());
        assert!(table.lookup(Method::Get, "session/s1/title/extra").is_none());
    }

    #[test]
    fn active_element_route_wins_over_child_element_routes() {
        // "element/active" and "element/{id}" style routes have different
        // segment counts; make sure the literal route still resolves.
        let table = RoutingTable::new();
        let matched = table
            .lookup(Method::Post, "session/s1/element/active")
            .expect("active element route");
        assert_eq!(matched.name, "getActiveElement");
    }

    #[test]
    fn reverse_lookup_returns_method_and_pattern() {
        let table = RoutingTable::new();
        let (method, pattern) = table.route_for("newSession").expect("newSession");
        assert_eq!(method, Method::Post);
        assert_eq!(pattern, "session");
        assert!(table.route_for("noSuchCommand").is_none());
    }
}
