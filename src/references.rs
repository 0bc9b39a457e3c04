// ABOUTME: Reference deduplication for the final response payload
// ABOUTME: Keeps at most one entry per slug, preferring location-typed entries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Veld Explore

//! Reference aggregation.
//!
//! Tool executors append references in execution order; before the payload
//! is built the list is deduplicated by slug. The first entry for a slug
//! wins unless a later entry is `Location`-typed and the kept one is not —
//! the location record is the canonical citation for a slug. The result is
//! capped so a busy conversation cannot inflate the payload.

use std::collections::HashMap;

use crate::constants::conversation::MAX_REFERENCES;
use crate::models::{Reference, ReferenceKind};

/// Deduplicate by slug, prefer `Location` entries, cap the result.
///
/// Idempotent: applying it to its own output returns the same list.
#[must_use]
pub fn dedupe_references(references: &[Reference]) -> Vec<Reference> {
    let mut kept: Vec<Reference> = Vec::new();
    let mut index_by_slug: HashMap<&str, usize> = HashMap::new();

    for reference in references {
        match index_by_slug.get(reference.slug.as_str()) {
            Some(&index) => {
                if reference.kind == ReferenceKind::Location
                    && kept[index].kind != ReferenceKind::Location
                {
                    kept[index] = reference.clone();
                }
            }
            None => {
                kept.push(reference.clone());
                index_by_slug.insert(reference.slug.as_str(), kept.len() - 1);
            }
        }
    }

    kept.truncate(MAX_REFERENCES);
    kept
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn reference(slug: &str, kind: ReferenceKind) -> Reference {
        Reference {
            slug: slug.to_owned(),
            name: slug.to_owned(),
            kind,
        }
    }

    #[test]
    fn keeps_first_entry_per_slug() {
        let input = vec![
            reference("harare", ReferenceKind::Weather),
            reference("harare", ReferenceKind::Activity),
        ];
        let output = dedupe_references(&input);
        assert_eq!(output.len(), 1);
        assert_eq!(output[0].kind, ReferenceKind::Weather);
    }

    #[test]
    fn later_location_replaces_non_location() {
        let input = vec![
            reference("harare", ReferenceKind::Weather),
            reference("harare", ReferenceKind::Location),
        ];
        let output = dedupe_references(&input);
        assert_eq!(output.len(), 1);
        assert_eq!(output[0].kind, ReferenceKind::Location);
    }

    #[test]
    fn location_kept_regardless_of_order() {
        let input = vec![
            reference("harare", ReferenceKind::Location),
            reference("harare", ReferenceKind::Weather),
        ];
        let output = dedupe_references(&input);
        assert_eq!(output[0].kind, ReferenceKind::Location);
    }

    #[test]
    fn idempotent_on_own_output() {
        let input = vec![
            reference("harare", ReferenceKind::Weather),
            reference("harare", ReferenceKind::Location),
            reference("kariba", ReferenceKind::Activity),
        ];
        let once = dedupe_references(&input);
        let twice = dedupe_references(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn never_exceeds_cap() {
        let input: Vec<Reference> = (0..50)
            .map(|i| reference(&format!("slug-{i}"), ReferenceKind::Location))
            .collect();
        let output = dedupe_references(&input);
        assert_eq!(output.len(), MAX_REFERENCES);
    }
}
