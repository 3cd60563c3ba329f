use alloc::vec::Vec;

use veil_objects::side_effect::Ordered;

use crate::errors::SortError;

// SORTED ARRAY
// ================================================================================================

/// A claimed sort of an array by side-effect counter.
///
/// `sorted_indexes[i]` is the position in `sorted` of the `i`-th element of the original array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortedArray<T> {
    pub sorted: Vec<T>,
    pub sorted_indexes: Vec<usize>,
}

impl<T> Default for SortedArray<T> {
    fn default() -> Self {
        Self { sorted: Vec::new(), sorted_indexes: Vec::new() }
    }
}

impl<T: Ordered + Clone> SortedArray<T> {
    /// Sorts `items` by ascending counter.
    pub fn sort(items: &[T]) -> Self {
        let mut order: Vec<usize> = (0..items.len()).collect();
        order.sort_by_key(|&index| items[index].counter());

        let mut sorted_indexes = vec![0; items.len()];
        for (position, &original) in order.iter().enumerate() {
            sorted_indexes[original] = position;
        }

        Self {
            sorted: order.iter().map(|&index| items[index].clone()).collect(),
            sorted_indexes,
        }
    }
}

/// Verifies that `claimed` is the ascending sort by counter of `original`.
///
/// # Errors
/// Returns an error if:
/// - The sorted array or the index mapping differ in length from the original array.
/// - The index mapping is not a bijection.
/// - An element of the original array differs from the sorted element it maps to.
/// - The sorted counters are not strictly ascending.
pub fn verify_sorted<T: Ordered + PartialEq>(
    original: &[T],
    claimed: &SortedArray<T>,
) -> Result<(), SortError> {
    let SortedArray { sorted, sorted_indexes } = claimed;
    if sorted.len() != original.len() {
        return Err(SortError::LengthMismatch { original: original.len(), sorted: sorted.len() });
    }
    if sorted_indexes.len() != original.len() {
        return Err(SortError::LengthMismatch {
            original: original.len(),
            sorted: sorted_indexes.len(),
        });
    }

    // the mapping must be a bijection before any element is compared through it
    let mut used = vec![false; sorted.len()];
    for (position, &index) in sorted_indexes.iter().enumerate() {
        if index >= sorted.len() {
            return Err(SortError::IndexOutOfBounds { position, index });
        }
        if used[index] {
            return Err(SortError::DuplicateIndex(index));
        }
        used[index] = true;
    }

    for (position, (item, &index)) in original.iter().zip(sorted_indexes).enumerate() {
        if sorted[index] != *item {
            return Err(SortError::ValueMismatch { position, index });
        }
    }

    for (index, pair) in sorted.windows(2).enumerate() {
        let (previous, counter) = (pair[0].counter(), pair[1].counter());
        if counter <= previous {
            return Err(SortError::NotAscending { index: index + 1, counter, previous });
        }
    }

    Ok(())
}

// TESTS
// ================================================================================================
