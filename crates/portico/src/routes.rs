// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declarative path-prefix → routing-key table.
//!
//! Routing-key derivation lives here and nowhere else: the bridge asks this
//! table for the target key and treats an unknown prefix as 404 rather than
//! guessing a mapping.

/// Built-in table used when no `--route` arguments are given.
const DEFAULT_ROUTES: &[(&str, &str)] = &[
    ("/api/auth", "auth.request"),
    ("/api/recipes", "recipe.request"),
    ("/api/account", "account.request"),
];

#[derive(Debug, Clone)]
struct RouteEntry {
    prefix: String,
    routing_key: String,
}

/// Longest-prefix routing table.
#[derive(Debug, Clone)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    /// Build a table from `"/prefix=routing.key"` specs; an empty list falls
    /// back to the built-in table.
    pub fn from_specs(specs: &[String]) -> anyhow::Result<Self> {
        if specs.is_empty() {
            let entries = DEFAULT_ROUTES
                .iter()
                .map(|(prefix, key)| RouteEntry {
                    prefix: (*prefix).to_owned(),
                    routing_key: (*key).to_owned(),
                })
                .collect();
            return Ok(Self::sorted(entries));
        }

        let mut entries = Vec::with_capacity(specs.len());
        for spec in specs {
            let Some((prefix, key)) = spec.split_once('=') else {
                anyhow::bail!("invalid route {spec:?}: expected /prefix=routing.key");
            };
            let prefix = prefix.trim_end_matches('/');
            if !prefix.starts_with('/') || key.is_empty() {
                anyhow::bail!("invalid route {spec:?}: expected /prefix=routing.key");
            }
            entries.push(RouteEntry {
                prefix: prefix.to_owned(),
                routing_key: key.to_owned(),
            });
        }
        Ok(Self::sorted(entries))
    }

    fn sorted(mut entries: Vec<RouteEntry>) -> Self {
        // Longest prefix first so resolve() can take the first hit.
        entries.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));
        Self { entries }
    }

    /// Resolve a request path to its routing key. `None` means 404.
    pub fn resolve(&self, path: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| {
                path == entry.prefix
                    || (path.len() > entry.prefix.len()
                        && path.starts_with(&entry.prefix)
                        && path.as_bytes()[entry.prefix.len()] == b'/')
            })
            .map(|entry| entry.routing_key.as_str())
    }
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
