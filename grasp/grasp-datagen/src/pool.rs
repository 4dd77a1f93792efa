//! Class-balanced collection of labeled grasps for one scene.

use grasp_types::{Grasp, Label};

/// Accumulates labeled grasps for a scene until a quota is met, capping
/// negatives at half the quota (rounded down).
///
/// # Example
///
/// ```
/// use grasp_datagen::CandidatePool;
/// use grasp_types::{Grasp, Label};
///
/// let mut pool = CandidatePool::new(4);
/// assert!(pool.offer(Grasp::default(), Label::Collision));
/// assert!(pool.offer(Grasp::default(), Label::Slipped));
/// // negative cap of 2 reached
/// assert!(!pool.offer(Grasp::default(), Label::NoContact));
/// assert!(pool.offer(Grasp::default(), Label::Success));
/// assert!(pool.offer(Grasp::default(), Label::Success));
/// assert!(pool.is_full());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CandidatePool {
    quota: usize,
    entries: Vec<(Grasp, Label)>,
    negatives: usize,
}

impl CandidatePool {
    /// Creates an empty pool collecting `quota` grasps.
    #[must_use]
    pub fn new(quota: usize) -> Self {
        Self {
            quota,
            entries: Vec::with_capacity(quota),
            negatives: 0,
        }
    }

    /// Maximum number of negatives accepted.
    #[must_use]
    pub const fn negative_cap(&self) -> usize {
        self.quota / 2
    }

    /// Offers a labeled grasp; returns whether it was kept.
    ///
    /// Successes are kept until the pool is full. Any other label is kept
    /// only while fewer than [`negative_cap`](Self::negative_cap) negatives
    /// have been accepted.
    pub fn offer(&mut self, grasp: Grasp, label: Label) -> bool {
        if self.is_full() {
            return false;
        }
        let positive = label.is_success();
        if !positive && self.negatives >= self.negative_cap() {
            return false;
        }
        if !positive {
            self.negatives += 1;
        }
        self.entries.push((grasp, label));
        true
    }

    /// Returns `true` once the quota is met.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.quota
    }

    /// Number of accepted grasps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been accepted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of accepted successes.
    #[must_use]
    pub fn positives(&self) -> usize {
        self.entries.len() - self.negatives
    }

    /// Number of accepted non-successes.
    #[must_use]
    pub const fn negatives(&self) -> usize {
        self.negatives
    }

    /// Accepted grasps in acceptance order.
    #[must_use]
    pub fn entries(&self) -> &[(Grasp, Label)] {
        &self.entries
    }

    /// Consumes the pool, returning its entries.
    #[must_use]
    pub fn into_entries(self) -> Vec<(Grasp, Label)> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn odd_quota_rounds_cap_down() {
        let mut pool = CandidatePool::new(5);
        assert_eq!(pool.negative_cap(), 2);
        assert!(pool.offer(Grasp::default(), Label::Collision));
        assert!(pool.offer(Grasp::default(), Label::Collision));
        assert!(!pool.offer(Grasp::default(), Label::Collision));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn quota_of_one_accepts_only_success() {
        let mut pool = CandidatePool::new(1);
        assert!(!pool.offer(Grasp::default(), Label::Slipped));
        assert!(pool.offer(Grasp::default(), Label::Success));
        assert!(!pool.offer(Grasp::default(), Label::Success));
        assert_eq!(pool.positives(), 1);
    }

    #[test]
    fn full_pool_rejects_everything() {
        let mut pool = CandidatePool::new(2);
        assert!(pool.offer(Grasp::default(), Label::Success));
        assert!(pool.offer(Grasp::default(), Label::NoContact));
        assert!(pool.is_full());
        assert!(!pool.offer(Grasp::default(), Label::Success));
        assert_eq!(pool.into_entries().len(), 2);
    }

    fn any_label() -> impl Strategy<Value = Label> {
        prop::sample::select(Label::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn balance_holds_for_any_stream(
            quota in 1usize..40,
            labels in prop::collection::vec(any_label(), 0..200),
        ) {
            let mut pool = CandidatePool::new(quota);
            for label in labels {
                pool.offer(Grasp::default(), label);
                prop_assert!(pool.len() <= quota);
                prop_assert!(pool.negatives() <= quota / 2);
                prop_assert_eq!(pool.positives() + pool.negatives(), pool.len());
            }
        }
    }
}
