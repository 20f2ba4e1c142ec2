//! Adaptive refinement of candidate duplicate groups.
//!
//! Candidate groups go through a reviewer (usually a human at a prompt).
//! Groups that are too large to review comfortably, or that the reviewer
//! rejects, are re-partitioned at a stricter overlap threshold; the
//! resulting sub-groups are reviewed depth-first before any remaining
//! top-level work. A branch whose re-partitioning stops shrinking is
//! *stalled*: it is surfaced for manual inspection rather than silently
//! dropped.
//!
//! Each queued branch carries its own threshold, so branches are independent
//! and a confirmation on one branch never affects the tolerance of another;
//! fresh top-level groups always start from the initial threshold.
//!
//! ```rust,no_run
//! use citedupe::refine::{GroupReviewer, Refiner, ReviewDecision};
//! use citedupe::{DuplicateGroup, Result};
//!
//! struct AcceptFirst;
//!
//! impl GroupReviewer for AcceptFirst {
//!     fn review(&mut self, _group: &DuplicateGroup) -> Result<ReviewDecision> {
//!         Ok(ReviewDecision::Confirmed { keep: 0 })
//!     }
//! }
//!
//! # fn demo(groups: Vec<DuplicateGroup>, documents: Vec<std::path::PathBuf>) -> Result<()> {
//! let outcome = Refiner::new().resolve(groups, &documents, &mut AcceptFirst)?;
//! for decision in &outcome.decisions {
//!     println!("unify {} keys under {}", decision.discard.len(), decision.keep);
//! }
//! # Ok(())
//! # }
//! ```

use crate::dedupe::{DEFAULT_MIN_OVERLAP, Deduplicator, DeduplicatorConfig};
use crate::{CitationError, DuplicateGroup, Result, UnificationDecision, tex};
use std::collections::VecDeque;
use std::path::PathBuf;

/// The verdict a reviewer gives on one proposed group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    /// The group is a true duplicate set; keep the key of the member at this
    /// zero-based index.
    Confirmed { keep: usize },
    /// The group mixes distinct publications and should be split further.
    Rejected,
}

/// Adjudicates proposed duplicate groups.
///
/// Implementations must return an in-range `keep` index for
/// [`ReviewDecision::Confirmed`]; interactive implementations re-prompt
/// until the input is valid.
pub trait GroupReviewer {
    fn review(&mut self, group: &DuplicateGroup) -> Result<ReviewDecision>;
}

/// Configuration for the refinement loop.
#[derive(Debug, Clone)]
pub struct RefinerConfig {
    /// Overlap threshold (in words) every top-level group starts at.
    pub initial_min_overlap: usize,
    /// Largest group a reviewer is asked to adjudicate; bigger groups are
    /// split without being proposed.
    pub max_review_size: usize,
}

impl Default for RefinerConfig {
    fn default() -> Self {
        Self {
            initial_min_overlap: DEFAULT_MIN_OVERLAP,
            max_review_size: 5,
        }
    }
}

/// The result of draining the refinement queue.
#[derive(Debug, Clone, Default)]
pub struct RefinementOutcome {
    /// Confirmed unifications, in the order they were confirmed.
    pub decisions: Vec<UnificationDecision>,
    /// Groups whose re-partitioning stopped making progress; left for manual
    /// inspection.
    pub stalled: Vec<DuplicateGroup>,
}

/// Drives candidate groups to confirmed unifications via repeated
/// re-grouping at stricter thresholds.
#[derive(Debug, Default, Clone)]
pub struct Refiner {
    config: RefinerConfig,
}

impl Refiner {
    /// Creates a refiner with the default thresholds (start at 5 shared
    /// words, review groups of up to 5 members).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a refiner with custom configuration.
    #[must_use]
    pub fn with_config(mut self, config: RefinerConfig) -> Self {
        self.config = config;
        self
    }

    /// Processes every candidate group until the work queue is empty.
    ///
    /// Each branch ends either confirmed (producing a
    /// [`UnificationDecision`]) or stalled. `documents` is consulted when a
    /// split re-runs the usage filter over a group's members.
    ///
    /// # Errors
    ///
    /// Propagates reviewer and file-access errors; also fails if a reviewer
    /// returns an out-of-range `keep` index.
    pub fn resolve(
        &self,
        groups: Vec<DuplicateGroup>,
        documents: &[PathBuf],
        reviewer: &mut dyn GroupReviewer,
    ) -> Result<RefinementOutcome> {
        let mut queue: VecDeque<(DuplicateGroup, usize)> = groups
            .into_iter()
            .map(|group| (group, self.config.initial_min_overlap))
            .collect();

        let mut outcome = RefinementOutcome::default();

        while let Some((group, min_overlap)) = queue.pop_front() {
            if group.members.len() <= self.config.max_review_size {
                match reviewer.review(&group)? {
                    ReviewDecision::Confirmed { keep } => {
                        outcome.decisions.push(decision_for(&group, keep)?);
                        continue;
                    }
                    ReviewDecision::Rejected => {}
                }
            }

            // Split: one threshold bump, then re-measure.
            let min_overlap = min_overlap + 1;
            let subgroups = Deduplicator::new()
                .with_config(DeduplicatorConfig { min_overlap })
                .find_potential_duplicates(&group.members);
            let subgroups = tex::filter_cited_groups(subgroups, documents)?;

            let largest = subgroups
                .iter()
                .map(|sub| sub.members.len())
                .max()
                .unwrap_or(0);

            if subgroups.is_empty() || largest >= group.members.len() {
                log::warn!(
                    "group '{}' ({} members) stopped splitting at {} shared words; \
                     leaving it for manual review",
                    group.title,
                    group.members.len(),
                    min_overlap
                );
                outcome.stalled.push(group);
                continue;
            }

            log::debug!(
                "split '{}' into {} sub-group(s) at {} shared words",
                group.title,
                subgroups.len(),
                min_overlap
            );
            // Depth-first: sub-groups go ahead of remaining top-level work.
            for sub in subgroups.into_iter().rev() {
                queue.push_front((sub, min_overlap));
            }
        }

        Ok(outcome)
    }
}

fn decision_for(group: &DuplicateGroup, keep: usize) -> Result<UnificationDecision> {
    let kept = group.members.get(keep).ok_or_else(|| {
        CitationError::InvalidInput(format!(
            "keep index {} out of range for a group of {}",
            keep,
            group.members.len()
        ))
    })?;
    let discard = group
        .members
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != keep)
        .map(|(_, entry)| entry.key.clone())
        .collect();
    Ok(UnificationDecision {
        keep: kept.key.clone(),
        discard,
    })
}
