//! Composition of optional predicates over a collection.

use crate::predicate::Predicate;
use std::borrow::Cow;

/// Drop inactive slots, keeping the active predicates in order
pub fn active<P>(filters: impl IntoIterator<Item = Option<P>>) -> Vec<P> {
    filters.into_iter().flatten().collect()
}

/// Keep the items for which every active predicate holds
///
/// `None` slots mark disengaged dimensions and are skipped. With no active
/// predicate the input is handed back borrowed, untouched and uncopied. The
/// input slice is never mutated.
pub fn apply<'a, T, P>(items: &'a [T], filters: impl IntoIterator<Item = Option<P>>) -> Cow<'a, [T]>
where
    T: Clone,
    P: Predicate<T>,
{
    let filters = active(filters);
    if filters.is_empty() {
        return Cow::Borrowed(items);
    }

    Cow::Owned(
        items
            .iter()
            .filter(|item| filters.iter().all(|f| f.test(item)))
            .cloned()
            .collect(),
    )
}
