//! Transitive (`:iterate`) inclusion resolution.
//!
//! Resolution is a bounded breadth-first walk. Each round expands the
//! current wave of resources, marks the wave as visited, records any
//! resource not yet in the result, and moves on to the discovered resources
//! that have not been expanded. The walk stops when a round finds nothing,
//! when the next wave is empty, or after `max_depth` rounds, so cyclic
//! reference graphs terminate.

use std::collections::HashSet;

use crate::error::SearchResult;
use crate::types::{SearchEntry, SearchRequest};

use super::include::InclusionExpander;

/// Per-request traversal state, keyed by resource id.
#[derive(Debug, Default)]
pub struct TraversalState {
    /// Ids already present in the accumulated result.
    seen: HashSet<String>,
    /// Ids whose inclusions have been expanded.
    visited: HashSet<String>,
}

impl TraversalState {
    /// Starts a traversal with the given entries already in the result.
    pub fn new<'e>(found: impl IntoIterator<Item = &'e SearchEntry>) -> Self {
        Self {
            seen: found.into_iter().map(|e| e.id().to_string()).collect(),
            visited: HashSet::new(),
        }
    }

    /// Records an id in the result. Returns false if it was already there.
    pub fn record(&mut self, id: &str) -> bool {
        self.seen.insert(id.to_string())
    }

    /// Marks the entries' inclusions as expanded.
    pub fn mark_visited(&mut self, wave: &[SearchEntry]) {
        self.visited.extend(wave.iter().map(|e| e.id().to_string()));
    }

    /// Returns true if the id is already in the result.
    pub fn is_seen(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    /// Returns true if the id has been expanded.
    pub fn is_visited(&self, id: &str) -> bool {
        self.visited.contains(id)
    }
}

/// Result of an iterative resolution.
#[derive(Debug, Default)]
pub struct IterateOutcome {
    /// Newly included entries in discovery order.
    pub entries: Vec<SearchEntry>,
    /// Number of expansion rounds run.
    pub rounds: usize,
    /// True if the depth limit stopped the walk with resources left to expand.
    pub truncated: bool,
}

/// Resolves `_include:iterate` and `_revinclude:iterate` to a bounded depth.
pub struct IterativeResolver<'a, 'b> {
    expander: &'b InclusionExpander<'a>,
    max_depth: usize,
}

impl<'a, 'b> IterativeResolver<'a, 'b> {
    /// Creates a resolver running at most `max_depth` rounds.
    pub fn new(expander: &'b InclusionExpander<'a>, max_depth: usize) -> Self {
        Self {
            expander,
            max_depth,
        }
    }

    /// Expands `found` transitively.
    ///
    /// Returns no entries, without backend access, if the request carries
    /// no iterate parameters. A resource reached by several paths is kept
    /// once, with the entry from the round that found it first.
    pub async fn resolve(
        &self,
        request: &SearchRequest,
        found: &[SearchEntry],
    ) -> SearchResult<IterateOutcome> {
        let mut outcome = IterateOutcome::default();
        if !request.has_iterate_params() {
            return Ok(outcome);
        }

        let mut state = TraversalState::new(found);
        let mut wave = unique_by_id(found.iter().cloned(), &state);

        for depth in 0..self.max_depth {
            let discovered = self.expander.expand(&wave, request, true).await?;
            state.mark_visited(&wave);
            outcome.rounds = depth + 1;

            if discovered.is_empty() {
                tracing::debug!(round = outcome.rounds, "Iterate round found nothing, stopping");
                break;
            }

            let mut added = 0usize;
            let mut next_wave = Vec::new();
            let mut queued: HashSet<String> = HashSet::new();
            for entry in discovered {
                let id = entry.id().to_string();
                if !state.is_visited(&id) && queued.insert(id.clone()) {
                    next_wave.push(entry.clone());
                }
                if state.record(&id) {
                    outcome.entries.push(entry);
                    added += 1;
                }
            }

            tracing::debug!(
                round = outcome.rounds,
                added,
                next_wave = next_wave.len(),
                "Iterate round complete"
            );

            if next_wave.is_empty() {
                break;
            }
            if depth + 1 == self.max_depth {
                outcome.truncated = true;
                tracing::debug!(
                    max_depth = self.max_depth,
                    pending = next_wave.len(),
                    "Iterate depth limit reached"
                );
                break;
            }
            wave = next_wave;
        }

        Ok(outcome)
    }
}

/// Drops repeated ids from a wave, keeping the first occurrence.
fn unique_by_id(entries: impl Iterator<Item = SearchEntry>, state: &TraversalState) -> Vec<SearchEntry> {
    let mut ids = HashSet::new();
    entries
        .filter(|e| !state.is_visited(e.id()) && ids.insert(e.id().to_string()))
        .collect()
}
