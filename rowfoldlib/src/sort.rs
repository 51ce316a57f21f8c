//! Stable merge sort over borrowed sequences.
//!
//! The slice passed in is never touched; each call returns a freshly
//! allocated, sorted `Vec`. Elements that compare equal keep their input
//! order, which is what lets a sorted table be flipped to descending order
//! by simply reversing it.

use std::cmp::Ordering;

/// Sort `items` by their natural ordering.
pub fn merge_sort<T: Ord + Clone>(items: &[T]) -> Vec<T> {
    merge_sort_by(items, |a, b| a.cmp(b))
}

/// Sort `items` with a caller-supplied three-way comparator.
///
/// The input is split at `len / 2`, both halves are sorted recursively and
/// then merged, always taking from the left half on ties.
pub fn merge_sort_by<T, F>(items: &[T], compare: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T, &T) -> Ordering,
{
    sort_slice(items, &compare)
}

/// Case-insensitive comparison of display text, as used for table columns.
pub fn compare_text_case_insensitive(left: &str, right: &str) -> Ordering {
    left.to_lowercase().cmp(&right.to_lowercase())
}

fn sort_slice<T, F>(items: &[T], compare: &F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T, &T) -> Ordering,
{
    if items.len() < 2 {
        return items.to_vec();
    }

    let (left, right) = items.split_at(items.len() / 2);
    merge(sort_slice(left, compare), sort_slice(right, compare), compare)
}

fn merge<T, F>(left: Vec<T>, right: Vec<T>, compare: &F) -> Vec<T>
where
    F: Fn(&T, &T) -> Ordering,
{
    let mut result = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();

    loop {
        let take_left = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => compare(l, r) != Ordering::Greater,
            _ => break,
        };
        let next = if take_left { left.next() } else { right.next() };
        result.extend(next);
    }

    // One side is exhausted
    result.extend(left);
    result.extend(right);
    result
}
