//! Keyed reconciliation between two render passes.

use std::collections::HashSet;
use std::hash::Hash;

/// What to do with each key when moving from one mark set to the next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation<K> {
    /// Keys only in the new set, in new-set order.
    pub create: Vec<K>,
    /// Keys in both sets, in new-set order.
    pub update: Vec<K>,
    /// Keys only in the old set, in old-set order.
    pub remove: Vec<K>,
}

impl<K> Reconciliation<K> {
    pub fn is_noop(&self) -> bool {
        self.create.is_empty() && self.remove.is_empty()
    }
}

pub fn reconcile<K: Eq + Hash + Clone>(previous: &[K], current: &[K]) -> Reconciliation<K> {
    let before: HashSet<&K> = previous.iter().collect();
    let after: HashSet<&K> = current.iter().collect();

    let (update, create): (Vec<K>, Vec<K>) = current
        .iter()
        .cloned()
        .partition(|k| before.contains(k));

    let remove = previous
        .iter()
        .filter(|k| !after.contains(k))
        .cloned()
        .collect();

    Reconciliation {
        create,
        update,
        remove,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_keys_into_three_lists() {
        let r = reconcile(&["a", "b", "c"], &["c", "d", "a"]);
        assert_eq!(r.create, vec!["d"]);
        assert_eq!(r.update, vec!["c", "a"]);
        assert_eq!(r.remove, vec!["b"]);
        assert!(!r.is_noop());
    }

    #[test]
    fn identical_sets_only_update() {
        let r = reconcile(&[1, 2], &[2, 1]);
        assert!(r.is_noop());
        assert_eq!(r.update, vec![2, 1]);
    }

    #[test]
    fn empty_transitions() {
        let r = reconcile::<u8>(&[], &[1, 2]);
        assert_eq!(r.create, vec![1, 2]);
        let r = reconcile::<u8>(&[1, 2], &[]);
        assert_eq!(r.remove, vec![1, 2]);
    }
}
