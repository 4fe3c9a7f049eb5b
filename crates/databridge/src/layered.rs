// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Row-source resolution for layered (composite) tables.
//!
//! A composite table owns no rows; it overlays an ordered list of parent
//! tables where later parents override earlier ones. Writes addressed to a
//! composite must land in the table that actually provides the row.

use std::collections::HashSet;

/// Read-only view of the table graph.
pub trait TableGraph {
    /// Parent table paths if `table` is composite, `None` for a plain table
    /// or an unknown path.
    fn parents(&self, table: &str) -> Option<&[String]>;

    /// Whether the plain table `table` directly owns `row`.
    fn owns_row(&self, table: &str, row: &str) -> bool;

    /// Row names of the plain table `table`, in table order.
    fn row_names(&self, table: &str) -> Vec<String>;
}

/// Find the plain table that provides `row` for the composite `composite`.
///
/// Parents are scanned from last to first. A parent that is itself
/// composite is searched recursively before the next parent is tried; the
/// first owner found wins.
pub fn resolve_row_source(graph: &dyn TableGraph, composite: &str, row: &str) -> Option<String> {
    let mut visited = HashSet::new();
    resolve_inner(graph, composite, row, &mut visited)
}

fn resolve_inner(
    graph: &dyn TableGraph,
    composite: &str,
    row: &str,
    visited: &mut HashSet<String>,
) -> Option<String> {
    if !visited.insert(composite.to_string()) {
        log::debug!("composite cycle through {}", composite);
        return None;
    }
    let parents = graph.parents(composite)?;
    for parent in parents.iter().rev() {
        if graph.parents(parent).is_some() {
            if let Some(source) = resolve_inner(graph, parent, row, visited) {
                return Some(source);
            }
            continue;
        }
        if graph.owns_row(parent, row) {
            return Some(parent.clone());
        }
    }
    None
}

/// Every row name visible through `table`, in first-appearance order.
///
/// For a plain table this is its own row list.
pub fn effective_row_names(graph: &dyn TableGraph, table: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut seen = HashSet::new();
    let mut visited = HashSet::new();
    collect_names(graph, table, &mut names, &mut seen, &mut visited);
    names
}

fn collect_names(
    graph: &dyn TableGraph,
    table: &str,
    names: &mut Vec<String>,
    seen: &mut HashSet<String>,
    visited: &mut HashSet<String>,
) {
    match graph.parents(table) {
        Some(parents) => {
            if !visited.insert(table.to_string()) {
                return;
            }
            for parent in parents {
                collect_names(graph, parent, names, seen, visited);
            }
        }
        None => {
            for name in graph.row_names(table) {
                if seen.insert(name.clone()) {
                    names.push(name);
                }
            }
        }
    }
}
