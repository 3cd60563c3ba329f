use alloc::vec::Vec;

use veil_objects::side_effect::{ScopedNoteHash, ScopedNullifier};

use crate::errors::TransientError;

// SQUASHED DATA
// ================================================================================================

/// Note hashes and nullifiers left after removing transient pairs.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SquashedData {
    pub note_hashes: Vec<ScopedNoteHash>,
    pub nullifiers: Vec<ScopedNullifier>,
}

// LINKING
// ================================================================================================

/// Finds, for every nullifier, the note hash it nullifies within the same transaction.
///
/// A nullifier referencing a pending note is linked to the first unlinked note hash with the same
/// value and contract emitted before it. Nullifiers of settled notes, and nullifiers whose note
/// hash cannot be found, stay unlinked.
pub fn find_transient_links(
    note_hashes: &[ScopedNoteHash],
    nullifiers: &[ScopedNullifier],
) -> Vec<Option<usize>> {
    let mut linked = vec![false; note_hashes.len()];
    nullifiers
        .iter()
        .map(|nullifier| {
            if !nullifier.inner.nullifies_pending_note() {
                return None;
            }
            let index = note_hashes.iter().enumerate().position(|(index, note_hash)| {
                !linked[index] && links_to(nullifier, note_hash)
            })?;
            linked[index] = true;
            Some(index)
        })
        .collect()
}

/// Removes the note hashes and nullifiers paired by `links`, without checking the pairs.
pub fn remove_transient_pairs(
    note_hashes: &[ScopedNoteHash],
    nullifiers: &[ScopedNullifier],
    links: &[Option<usize>],
) -> SquashedData {
    let mut squashed_notes = vec![false; note_hashes.len()];
    for &note_hash_index in links.iter().flatten() {
        if let Some(squashed) = squashed_notes.get_mut(note_hash_index) {
            *squashed = true;
        }
    }

    SquashedData {
        note_hashes: note_hashes
            .iter()
            .zip(&squashed_notes)
            .filter(|(_, squashed)| !**squashed)
            .map(|(note_hash, _)| *note_hash)
            .collect(),
        nullifiers: nullifiers
            .iter()
            .zip(links.iter().chain(core::iter::repeat(&None)))
            .filter(|(_, link)| link.is_none())
            .map(|(nullifier, _)| *nullifier)
            .collect(),
    }
}

/// Records on every note hash the counter of the nullifier consuming it in the same transaction.
///
/// Links are recomputed from scratch in counter order, pairing each pending nullifier with the
/// first unlinked matching note hash. This is the pairing [find_transient_links] derives from the
/// sorted arrays.
pub fn link_note_hashes(note_hashes: &mut [ScopedNoteHash], nullifiers: &[ScopedNullifier]) {
    let mut note_order: Vec<usize> = (0..note_hashes.len()).collect();
    note_order.sort_by_key(|&index| note_hashes[index].inner.counter);
    let mut pending: Vec<&ScopedNullifier> =
        nullifiers.iter().filter(|nullifier| nullifier.inner.nullifies_pending_note()).collect();
    pending.sort_by_key(|nullifier| nullifier.inner.counter);

    for note_hash in note_hashes.iter_mut() {
        note_hash.inner.nullifier_counter = 0;
    }
    for nullifier in pending {
        let linked = note_order.iter().copied().find(|&index| {
            let note_hash = &note_hashes[index];
            note_hash.inner.nullifier_counter == 0 && links_to(nullifier, note_hash)
        });
        if let Some(index) = linked {
            note_hashes[index].inner.nullifier_counter = nullifier.inner.counter;
        }
    }
}

// VERIFICATION
// ================================================================================================

/// Verifies the claimed squashing of sorted note hashes and nullifiers.
///
/// `links[i]` names the note hash nullified by the `i`-th nullifier, if the note was created in
/// this transaction. Every linked pair must agree on value and contract, the note hash must
/// precede the nullifier and record the nullifier's counter, and a note hash may be nullified at
/// most once. The claimed squashed
/// arrays must equal the inputs with the linked pairs removed, and nothing in them may still
/// reference a nullifier or pending note.
///
/// # Errors
/// Returns an error if any of the conditions above is violated.
pub fn squash_transient_data(
    note_hashes: &[ScopedNoteHash],
    nullifiers: &[ScopedNullifier],
    links: &[Option<usize>],
    squashed_note_hashes: &[ScopedNoteHash],
    squashed_nullifiers: &[ScopedNullifier],
) -> Result<SquashedData, TransientError> {
    if links.len() != nullifiers.len() {
        return Err(TransientError::HintCountMismatch {
            expected: nullifiers.len(),
            actual: links.len(),
        });
    }

    let mut linked = vec![false; note_hashes.len()];
    for (nullifier_index, (nullifier, link)) in nullifiers.iter().zip(links).enumerate() {
        let note_hash_index = match *link {
            Some(index) => index,
            None if nullifier.inner.nullifies_pending_note() => {
                return Err(TransientError::MissingLink { nullifier_index });
            },
            None => continue,
        };

        let note_hash = note_hashes.get(note_hash_index).ok_or(
            TransientError::LinkOutOfBounds { nullifier_index, note_hash_index },
        )?;
        if !links_to(nullifier, note_hash) {
            return Err(TransientError::LinkMismatch { nullifier_index, note_hash_index });
        }
        if linked[note_hash_index] {
            return Err(TransientError::DoubleNullification(note_hash_index));
        }
        if note_hash.inner.nullifier_counter != nullifier.inner.counter {
            return Err(TransientError::LinkMismatch { nullifier_index, note_hash_index });
        }
        linked[note_hash_index] = true;
    }

    for (index, (note_hash, linked)) in note_hashes.iter().zip(&linked).enumerate() {
        if !linked && note_hash.inner.is_transient() {
            return Err(TransientError::DanglingNoteHash(index));
        }
    }

    let expected = remove_transient_pairs(note_hashes, nullifiers, links);
    if expected.note_hashes != squashed_note_hashes {
        return Err(TransientError::SquashedArrayMismatch("note hashes"));
    }
    if expected.nullifiers != squashed_nullifiers {
        return Err(TransientError::SquashedArrayMismatch("nullifiers"));
    }

    ensure_resolved(&expected)?;
    Ok(expected)
}

/// Checks that no squashed note hash or nullifier refers to a pending counterpart.
fn ensure_resolved(data: &SquashedData) -> Result<(), TransientError> {
    if let Some(index) = data.note_hashes.iter().position(|note_hash| note_hash.inner.is_transient())
    {
        return Err(TransientError::DanglingNoteHash(index));
    }
    if let Some(index) =
        data.nullifiers.iter().position(|nullifier| nullifier.inner.nullifies_pending_note())
    {
        return Err(TransientError::DanglingNullifier(index));
    }
    Ok(())
}

fn links_to(nullifier: &ScopedNullifier, note_hash: &ScopedNoteHash) -> bool {
    nullifier.inner.nullifies_pending_note()
        && note_hash.inner.value == nullifier.inner.note_hash
        && note_hash.contract_address == nullifier.contract_address
        && note_hash.inner.counter < nullifier.inner.counter
}

// TESTS
// ================================================================================================

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use veil_objects::{
        Felt, ZERO,
        side_effect::{NoteHash, Nullifier, Scoped},
        testing::dummy_address,
    };

    use super::*;

    fn note_hash(value: u64, counter: u32) -> ScopedNoteHash {
        Scoped::new(NoteHash::new(Felt::new(value), counter), dummy_address(1))
    }

    fn nullifier(value: u64, note_hash: u64, counter: u32) -> ScopedNullifier {
        let note_hash = if note_hash == 0 { ZERO } else { Felt::new(note_hash) };
        Scoped::new(Nullifier::new(Felt::new(value), note_hash, counter), dummy_address(1))
    }

    /// Links, squashes and verifies sorted arrays the way honest hints do.
    fn squash(
        note_hashes: &[ScopedNoteHash],
        nullifiers: &[ScopedNullifier],
    ) -> Result<SquashedData, TransientError> {
        let mut note_hashes = note_hashes.to_vec();
        link_note_hashes(&mut note_hashes, nullifiers);
        let links = find_transient_links(&note_hashes, nullifiers);
        let claimed = remove_transient_pairs(&note_hashes, nullifiers, &links);
        squash_transient_data(
            &note_hashes,
            nullifiers,
            &links,
            &claimed.note_hashes,
            &claimed.nullifiers,
        )
    }

    #[test]
    fn transient_pair_is_removed() {
        let note_hashes = [note_hash(11, 1), note_hash(22, 2), note_hash(33, 3)];
        let nullifiers = [nullifier(7, 0, 0), nullifier(99, 22, 4)];

        let squashed = squash(&note_hashes, &nullifiers).unwrap();

        assert_eq!(squashed.note_hashes, [note_hashes[0], note_hashes[2]]);
        assert_eq!(squashed.nullifiers, [nullifiers[0]]);
    }

    #[test]
    fn squashing_is_idempotent() {
        let note_hashes = [note_hash(11, 1), note_hash(22, 2), note_hash(33, 3)];
        let nullifiers = [nullifier(7, 0, 0), nullifier(99, 11, 5), nullifier(98, 0, 6)];

        let once = squash(&note_hashes, &nullifiers).unwrap();
        let twice = squash(&once.note_hashes, &once.nullifiers).unwrap();

        assert_eq!(once, twice);
    }

    #[test]
    fn nullifier_preceding_its_note_hash_is_rejected() {
        let note_hashes = [note_hash(22, 5)];
        let nullifiers = [nullifier(99, 22, 4)];
        let links = [Some(0)];

        assert_matches!(
            squash_transient_data(&note_hashes, &nullifiers, &links, &[], &[]),
            Err(TransientError::LinkMismatch { nullifier_index: 0, note_hash_index: 0 })
        );
    }

    #[test]
    fn pending_nullifier_without_link_is_rejected() {
        let note_hashes = [note_hash(22, 2)];
        let nullifiers = [nullifier(99, 22, 4)];

        assert_matches!(
            squash_transient_data(&note_hashes, &nullifiers, &[None], &note_hashes, &nullifiers),
            Err(TransientError::MissingLink { nullifier_index: 0 })
        );
    }

    #[test]
    fn note_hash_nullified_twice_is_rejected() {
        let mut note_hashes = [note_hash(22, 2)];
        note_hashes[0].inner.nullifier_counter = 3;
        let nullifiers = [nullifier(98, 22, 3), nullifier(99, 22, 4)];

        assert_matches!(
            squash_transient_data(&note_hashes, &nullifiers, &[Some(0), Some(0)], &[], &[]),
            Err(TransientError::DoubleNullification(0))
        );
    }

    #[test]
    fn note_hash_with_unmatched_nullifier_counter_is_rejected() {
        let mut dangling = note_hash(22, 2);
        dangling.inner.nullifier_counter = 9;

        assert_matches!(
            squash_transient_data(&[dangling], &[], &[], &[dangling], &[]),
            Err(TransientError::DanglingNoteHash(0))
        );
    }

    #[test]
    fn tampered_squashed_array_is_rejected() {
        let mut note_hashes = [note_hash(11, 1), note_hash(22, 2)];
        let nullifiers = [nullifier(99, 22, 4)];
        link_note_hashes(&mut note_hashes, &nullifiers);

        assert_matches!(
            squash_transient_data(&note_hashes, &nullifiers, &[Some(1)], &note_hashes, &[]),
            Err(TransientError::SquashedArrayMismatch("note hashes"))
        );
    }

    #[test]
    fn links_follow_counter_order() {
        // two notes share a value; the earlier nullifier consumes the earlier note
        let mut note_hashes = [note_hash(22, 6), note_hash(22, 2), note_hash(33, 3)];
        let nullifiers = [nullifier(99, 22, 9), nullifier(98, 22, 7)];

        link_note_hashes(&mut note_hashes, &nullifiers);

        assert_eq!(note_hashes[1].inner.nullifier_counter, 7);
        assert_eq!(note_hashes[0].inner.nullifier_counter, 9);
        assert!(!note_hashes[2].inner.is_transient());
    }

    #[test]
    fn linked_note_hash_must_record_the_nullifier_counter() {
        let mut note_hashes = [note_hash(22, 2)];
        let nullifiers = [nullifier(99, 22, 4)];

        // unlinked note hash
        assert_matches!(
            squash_transient_data(&note_hashes, &nullifiers, &[Some(0)], &[], &[]),
            Err(TransientError::LinkMismatch { nullifier_index: 0, note_hash_index: 0 })
        );

        // note hash recording another nullifier
        note_hashes[0].inner.nullifier_counter = 5;
        assert_matches!(
            squash_transient_data(&note_hashes, &nullifiers, &[Some(0)], &[], &[]),
            Err(TransientError::LinkMismatch { nullifier_index: 0, note_hash_index: 0 })
        );

        note_hashes[0].inner.nullifier_counter = 4;
        assert_eq!(
            squash_transient_data(&note_hashes, &nullifiers, &[Some(0)], &[], &[]),
            Ok(SquashedData::default())
        );
    }
}
