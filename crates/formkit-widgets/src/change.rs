#![forbid(unsafe_code)]

//! Model change detection.
//!
//! Every add/remove is bracketed by snapshots of the model value. A change
//! event is raised only when membership differs: a different length, or a
//! different set of ids. Reordering alone is not a change.

use formkit_core::{EntityId, HostModel, ModelEvent};

/// Whether `after` differs from `before` in size or membership.
///
/// The intersection is taken over distinct ids of `after` that also occur
/// in `before`.
#[must_use]
pub fn membership_changed(before: &[EntityId], after: &[EntityId]) -> bool {
    let mut common: Vec<&EntityId> = Vec::with_capacity(after.len());
    for id in after {
        if before.contains(id) && !common.contains(&id) {
            common.push(id);
        }
    }
    after.len() != before.len() || common.len() != before.len()
}

/// Raises `change:<field>` on the host model when the selection changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeNotifier {
    field: String,
}

impl ChangeNotifier {
    /// Create a notifier for a model field.
    #[must_use]
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// The event to raise for this pair of snapshots, if any.
    #[must_use]
    pub fn change_event(&self, before: &[EntityId], after: &[EntityId]) -> Option<ModelEvent> {
        if !membership_changed(before, after) {
            return None;
        }
        formkit_core::debug!(
            field = %self.field,
            before = before.len(),
            after = after.len(),
            "model value changed"
        );
        Some(ModelEvent::Change(self.field.clone()))
    }

    /// Compare snapshots and notify. Returns whether the event fired.
    pub fn diff_and_notify<M: HostModel + ?Sized>(
        &self,
        before: &[EntityId],
        after: &[EntityId],
        model: &mut M,
    ) -> bool {
        match self.change_event(before, after) {
            Some(event) => {
                model.trigger(event);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formkit_core::MemoryModel;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn ids(values: &[i64]) -> Vec<EntityId> {
        values.iter().map(|&v| EntityId::from(v)).collect()
    }

    #[test]
    fn reorder_is_not_a_change() {
        assert!(!membership_changed(&ids(&[1, 2, 3]), &ids(&[3, 1, 2])));
    }

    #[test]
    fn same_size_different_members_is_a_change() {
        assert!(membership_changed(&ids(&[1, 2]), &ids(&[1, 3])));
    }

    #[test]
    fn growth_and_shrink_are_changes() {
        assert!(membership_changed(&ids(&[]), &ids(&[1])));
        assert!(membership_changed(&ids(&[1, 2]), &ids(&[2])));
        assert!(!membership_changed(&ids(&[]), &ids(&[])));
    }

    #[test]
    fn notifies_host_only_on_change() {
        let notifier = ChangeNotifier::new("groups");
        let mut model = MemoryModel::new();
        assert!(!notifier.diff_and_notify(&ids(&[1]), &ids(&[1]), &mut model));
        assert!(model.events().is_empty());
        assert!(notifier.diff_and_notify(&ids(&[1]), &ids(&[1, 2]), &mut model));
        assert_eq!(model.events(), [ModelEvent::Change("groups".into())]);
    }

    #[test]
    fn change_event_is_returned_not_raised() {
        let notifier = ChangeNotifier::new("groups");
        assert_eq!(
            notifier.change_event(&ids(&[1]), &ids(&[2])),
            Some(ModelEvent::Change("groups".into()))
        );
        assert_eq!(notifier.change_event(&ids(&[1, 2]), &ids(&[2, 1])), None);
    }

    fn distinct() -> impl Strategy<Value = Vec<i64>> {
        proptest::collection::btree_set(0i64..12, 0..8)
            .prop_map(|set| set.into_iter().collect::<Vec<_>>())
            .prop_shuffle()
    }

    proptest! {
        #[test]
        fn fires_iff_sets_differ(before in distinct(), after in distinct()) {
            let expected = before.iter().collect::<BTreeSet<_>>() != after.iter().collect::<BTreeSet<_>>();
            prop_assert_eq!(membership_changed(&ids(&before), &ids(&after)), expected);
        }
    }
}
