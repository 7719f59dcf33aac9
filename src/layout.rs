//! Argument slot layout.
//!
//! A harness run takes one fixed-width `uint256[N]` vector. Slot 0 is the call value; after it come
//! the constructor arguments, then one window shared by all mutating methods and one shared by all
//! view methods. Each window is as wide as the largest arity in its group, so any method a run
//! selects finds its arguments in the same place.

use serde::Serialize;
use std::ops::Range;

use vyper_interface::{MethodDescriptor, MethodGroups};

/// Largest parameter count in a group, 0 for an empty group.
pub fn max_arity(group: &[MethodDescriptor]) -> usize {
    group.iter().map(MethodDescriptor::arity).max().unwrap_or(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotLayout {
    pub total_slots: usize,
    /// Always 0.
    pub value_slot: usize,
    pub constructor_start: usize,
    pub mutating_start: usize,
    pub view_start: usize,
}

impl SlotLayout {
    pub fn plan(groups: &MethodGroups) -> Self {
        let value_slot = 0;
        let constructor_start = value_slot + 1;
        let mutating_start = constructor_start + groups.constructor_params().len();
        let view_start = mutating_start + max_arity(&groups.mutating);
        let total_slots = view_start + max_arity(&groups.view);
        SlotLayout {
            total_slots,
            value_slot,
            constructor_start,
            mutating_start,
            view_start,
        }
    }

    pub fn constructor_window(&self) -> Range<usize> {
        self.constructor_start..self.mutating_start
    }

    pub fn mutating_window(&self) -> Range<usize> {
        self.mutating_start..self.view_start
    }

    pub fn view_window(&self) -> Range<usize> {
        self.view_start..self.total_slots
    }

    /// Re-derive the layout from `groups` and panic if it disagrees.
    ///
    /// A mismatch means generated code would read slots outside the vector or overlap windows,
    /// which is a bug in this crate rather than bad input.
    pub fn assert_consistent(&self, groups: &MethodGroups) {
        let expected_total = 1
            + groups.constructor_params().len()
            + max_arity(&groups.mutating)
            + max_arity(&groups.view);
        assert_eq!(
            self.total_slots, expected_total,
            "slot layout total does not match method groups"
        );
        assert_eq!(self.value_slot, 0, "value slot must be slot 0");
        assert!(
            self.value_slot < self.constructor_start
                && self.constructor_start <= self.mutating_start
                && self.mutating_start <= self.view_start
                && self.view_start <= self.total_slots,
            "slot layout windows out of order: {:?}",
            self
        );
        assert_eq!(
            *self,
            SlotLayout::plan(groups),
            "slot layout was not planned from these method groups"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vyper_interface::{Mutability, Selector, CONSTRUCTOR_NAME};

    fn method(name: &str, arity: usize, mutability: Mutability) -> MethodDescriptor {
        MethodDescriptor {
            name: name.to_string(),
            param_types: vec!["uint256".to_string(); arity],
            selector: Selector::default(),
            mutability,
        }
    }

    fn groups(ctor: Option<usize>, mutating: &[usize], view: &[usize]) -> MethodGroups {
        let mut methods = Vec::new();
        if let Some(n) = ctor {
            methods.push(method(CONSTRUCTOR_NAME, n, Mutability::External));
        }
        for (i, n) in mutating.iter().enumerate() {
            methods.push(method(&format!("m{}", i), *n, Mutability::External));
        }
        for (i, n) in view.iter().enumerate() {
            methods.push(method(&format!("v{}", i), *n, Mutability::View));
        }
        MethodGroups::partition(methods)
    }

    #[test]
    fn test_single_uint_setter_and_getter() {
        let g = groups(Some(0), &[1], &[0]);
        let layout = SlotLayout::plan(&g);
        assert_eq!(layout.total_slots, 2);
        assert_eq!(layout.mutating_window(), 1..2);
        assert!(layout.view_window().is_empty());
        layout.assert_consistent(&g);
    }

    #[test]
    fn test_windows_sized_by_max_arity() {
        let g = groups(Some(2), &[1, 3, 0], &[2, 1]);
        let layout = SlotLayout::plan(&g);
        assert_eq!(layout.constructor_window(), 1..3);
        assert_eq!(layout.mutating_window(), 3..6);
        assert_eq!(layout.view_window(), 6..8);
        assert_eq!(layout.total_slots, 1 + 2 + 3 + 2);
        layout.assert_consistent(&g);
    }

    #[test]
    fn test_layout_identity_over_group_shapes() {
        let mutating_shapes: [&[usize]; 4] = [&[], &[0], &[2, 1], &[4, 4, 1]];
        let view_shapes: [&[usize]; 3] = [&[], &[1], &[0, 3]];
        for ctor in [None, Some(0), Some(1), Some(3)] {
            for mutating in mutating_shapes {
                for view in view_shapes {
                    let g = groups(ctor, mutating, view);
                    let layout = SlotLayout::plan(&g);
                    assert_eq!(
                        layout.total_slots,
                        1 + ctor.unwrap_or(0) + max_arity(&g.mutating) + max_arity(&g.view)
                    );
                    let ranges = [
                        layout.constructor_window(),
                        layout.mutating_window(),
                        layout.view_window(),
                    ];
                    for pair in ranges.windows(2) {
                        assert!(pair[0].end <= pair[1].start);
                    }
                    assert!(!ranges[0].contains(&layout.value_slot));
                    layout.assert_consistent(&g);
                }
            }
        }
    }

    #[test]
    #[should_panic(expected = "slot layout total does not match")]
    fn test_assert_consistent_panics_on_foreign_layout() {
        let layout = SlotLayout::plan(&groups(None, &[3], &[]));
        layout.assert_consistent(&groups(None, &[1], &[]));
    }
}
