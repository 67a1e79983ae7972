//! Enrolled gallery and the ranked nearest-match search engine.
//!
//! The gallery is built exactly once and is immutable afterward, so
//! concurrent `search` calls on a shared reference are safe without any
//! synchronization. Each probe's search is independent; [`Gallery::search_batch`]
//! spreads probes across cores with rayon, which is the dominant batch
//! workload during accuracy evaluation.
//!
//! Search cost is O(N * D) per probe (N entries, D features): every entry
//! is scored with the scheme comparator, then the top L survive. Ties are
//! broken by enrollment insertion order, so results are stable across runs.

use std::cmp::Ordering;
use std::collections::HashMap;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::comparator::Comparator;
use crate::status::{FusionError, Result};
use crate::types::{ensure_finite, is_failed_extraction, Candidate, CandidateList, Template};

#[derive(Debug)]
struct GalleryEntry {
    identity: u32,
    template: Template,
}

/// Identity-to-template mapping searched against during identification.
#[derive(Debug)]
pub struct Gallery {
    // Insertion order is load-bearing: it is the tie-break for search.
    entries: Vec<GalleryEntry>,
    by_identity: HashMap<u32, usize>,
    dimension: usize,
}

impl Gallery {
    /// Build a gallery from parallel template and identity vectors, where
    /// `ids[i]` labels `templates[i]`.
    ///
    /// Duplicate identity policy: last write wins. A repeated identity
    /// replaces the earlier template in place (keeping its original
    /// insertion position) and logs a warning. The reference behavior left
    /// duplicates undefined; this implementation makes the overwrite
    /// explicit and tested.
    ///
    /// # Errors
    ///
    /// - `NonCongruentVectors` when the two vectors differ in length, or a
    ///   template disagrees with the gallery dimensionality
    /// - `VerifTemplate` when a template is a failed-extraction marker
    /// - `TemplateFormat` when a template carries non-finite features
    /// - `Memory` when the gallery structures cannot be allocated
    pub fn build(templates: Vec<Template>, ids: Vec<u32>) -> Result<Self> {
        if templates.len() != ids.len() {
            return Err(FusionError::NonCongruentVectors {
                left: templates.len(),
                right: ids.len(),
            });
        }

        let mut entries: Vec<GalleryEntry> = Vec::new();
        entries
            .try_reserve_exact(templates.len())
            .map_err(|e| FusionError::Memory(format!("gallery of {}: {e}", templates.len())))?;
        let mut by_identity: HashMap<u32, usize> = HashMap::new();
        by_identity
            .try_reserve(templates.len())
            .map_err(|e| FusionError::Memory(format!("gallery index: {e}")))?;

        let mut dimension = 0usize;
        for (template, identity) in templates.into_iter().zip(ids) {
            if is_failed_extraction(&template) {
                return Err(FusionError::VerifTemplate(format!(
                    "enrollment template for identity {identity} is a failed-extraction marker"
                )));
            }
            ensure_finite(&template)?;
            if entries.is_empty() {
                dimension = template.len();
            } else if template.len() != dimension {
                return Err(FusionError::NonCongruentVectors {
                    left: dimension,
                    right: template.len(),
                });
            }

            match by_identity.get(&identity) {
                Some(&slot) => {
                    warn!(identity, "duplicate gallery identity, last write wins");
                    entries[slot].template = template;
                }
                None => {
                    by_identity.insert(identity, entries.len());
                    entries.push(GalleryEntry { identity, template });
                }
            }
        }

        debug!(size = entries.len(), dimension, "gallery created");
        Ok(Self {
            entries,
            by_identity,
            dimension,
        })
    }

    /// Number of enrolled identities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is enrolled.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Feature dimensionality shared by all enrolled templates.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Enrolled template for an identity, if present.
    pub fn get(&self, identity: u32) -> Option<&Template> {
        self.by_identity
            .get(&identity)
            .map(|&slot| &self.entries[slot].template)
    }

    /// Rank the gallery against a probe and return the top `list_size`
    /// candidates, best first.
    ///
    /// Returns all N entries when N < `list_size`; that is a documented
    /// edge case, not an error. Ties keep enrollment order.
    pub fn search(
        &self,
        probe: &Template,
        comparator: Comparator,
        list_size: usize,
    ) -> Result<CandidateList> {
        if is_failed_extraction(probe) {
            return Err(FusionError::VerifTemplate(
                "probe is a failed-extraction marker".to_string(),
            ));
        }
        if probe.len() != self.dimension && !self.is_empty() {
            return Err(FusionError::NonCongruentVectors {
                left: probe.len(),
                right: self.dimension,
            });
        }

        let mut scored: Vec<(usize, f64)> = Vec::with_capacity(self.entries.len());
        for (slot, entry) in self.entries.iter().enumerate() {
            let score = comparator.similarity(probe, &entry.template)?;
            scored.push((slot, score));
        }

        // Descending score; equal scores fall back to enrollment order.
        scored.sort_by(|a, b| match b.1.partial_cmp(&a.1) {
            Some(Ordering::Equal) | None => a.0.cmp(&b.0),
            Some(ordering) => ordering,
        });
        scored.truncate(list_size);

        Ok(scored
            .into_iter()
            .map(|(slot, score)| Candidate::new(self.entries[slot].identity, score))
            .collect())
    }

    /// Search many probes in parallel. Results align with the probe order
    /// and are identical to sequential [`Gallery::search`] per probe.
    pub fn search_batch(
        &self,
        probes: &[Template],
        comparator: Comparator,
        list_size: usize,
    ) -> Vec<Result<CandidateList>> {
        probes
            .par_iter()
            .map(|probe| self.search(probe, comparator, list_size))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_gallery() -> Gallery {
        Gallery::build(
            vec![
                vec![0.0, 0.0],
                vec![1.0, 0.0],
                vec![5.0, 5.0],
                vec![0.5, 0.0],
            ],
            vec![10, 11, 12, 13],
        )
        .unwrap()
    }

    #[test]
    fn search_returns_descending_scores() {
        let gallery = small_gallery();
        let probe = vec![0.0, 0.0];
        let results = gallery.search(&probe, Comparator::L1Inverse, 4).unwrap();

        assert_eq!(results.len(), 4);
        assert_eq!(results[0].identity, 10);
        assert_eq!(results[0].score, 100.0);
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn result_length_is_min_of_list_size_and_gallery_size() {
        let gallery = small_gallery();
        let probe = vec![0.0, 0.0];
        assert_eq!(gallery.search(&probe, Comparator::L1Inverse, 2).unwrap().len(), 2);
        // N < L returns all N, not an error.
        assert_eq!(
            gallery.search(&probe, Comparator::L1Inverse, 100).unwrap().len(),
            4
        );
    }

    #[test]
    fn ties_keep_enrollment_order() {
        let gallery = Gallery::build(
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![-1.0, 0.0]],
            vec![7, 8, 9],
        )
        .unwrap();
        // Probe at the origin is equidistant from all three.
        let results = gallery
            .search(&vec![0.0, 0.0], Comparator::L1Inverse, 3)
            .unwrap();
        let ids: Vec<u32> = results.iter().map(|c| c.identity).collect();
        assert_eq!(ids, vec![7, 8, 9]);
    }

    #[test]
    fn duplicate_identity_last_write_wins() {
        let gallery = Gallery::build(
            vec![vec![9.0, 9.0], vec![1.0, 1.0], vec![0.0, 0.0]],
            vec![5, 6, 5],
        )
        .unwrap();

        assert_eq!(gallery.len(), 2);
        assert_eq!(gallery.get(5), Some(&vec![0.0, 0.0]));
        // Identity 5 keeps its original insertion position for tie-breaks.
        let results = gallery
            .search(&vec![0.5, 0.5], Comparator::L1Inverse, 2)
            .unwrap();
        assert_eq!(results[0].identity, 5);
    }

    #[test]
    fn mismatched_parallel_vectors_rejected() {
        let err = Gallery::build(vec![vec![1.0]], vec![1, 2]).unwrap_err();
        assert!(matches!(
            err,
            FusionError::NonCongruentVectors { left: 1, right: 2 }
        ));
    }

    #[test]
    fn inconsistent_dimensions_rejected() {
        let err = Gallery::build(vec![vec![1.0, 2.0], vec![1.0]], vec![1, 2]).unwrap_err();
        assert!(matches!(err, FusionError::NonCongruentVectors { .. }));
    }

    #[test]
    fn failed_extraction_enrollment_rejected() {
        let err = Gallery::build(vec![vec![]], vec![1]).unwrap_err();
        assert!(matches!(err, FusionError::VerifTemplate(_)));
    }

    #[test]
    fn probe_dimension_must_match() {
        let gallery = small_gallery();
        let err = gallery
            .search(&vec![1.0, 2.0, 3.0], Comparator::L1Inverse, 2)
            .unwrap_err();
        assert!(matches!(err, FusionError::NonCongruentVectors { .. }));
    }

    #[test]
    fn batch_search_matches_sequential() {
        let gallery = small_gallery();
        let probes = vec![vec![0.0, 0.0], vec![5.0, 5.0], vec![1.0, 1.0]];
        let batch = gallery.search_batch(&probes, Comparator::L1Inverse, 3);

        for (probe, batch_result) in probes.iter().zip(batch) {
            let sequential = gallery.search(probe, Comparator::L1Inverse, 3).unwrap();
            assert_eq!(batch_result.unwrap(), sequential);
        }
    }
}
