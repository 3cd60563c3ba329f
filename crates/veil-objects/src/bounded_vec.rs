use alloc::vec::Vec;
use core::ops::{Deref, DerefMut};

use crate::{
    CapacityError,
    utils::serde::{ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable},
};

// BOUNDED VEC
// ================================================================================================

/// An append-only sequence which can hold at most `N` elements.
///
/// Pushing beyond the capacity is an error rather than a reallocation; every side-effect sequence
/// of the kernel has a fixed capacity per call and per transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundedVec<T, const N: usize> {
    name: &'static str,
    items: Vec<T>,
}

impl<T, const N: usize> BoundedVec<T, N> {
    /// Returns a new empty [BoundedVec]. The name is used in capacity errors.
    pub fn new(name: &'static str) -> Self {
        Self { name, items: Vec::new() }
    }

    /// Returns a new [BoundedVec] holding the provided items.
    ///
    /// # Errors
    /// Returns an error if more than `N` items are provided.
    pub fn from_vec(name: &'static str, items: Vec<T>) -> Result<Self, CapacityError> {
        if items.len() > N {
            return Err(CapacityError { name, capacity: N });
        }
        Ok(Self { name, items })
    }

    /// Returns the maximum number of elements this sequence can hold.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Returns the name used to identify this sequence in errors.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Appends an element.
    ///
    /// # Errors
    /// Returns an error if the sequence is already full.
    pub fn push(&mut self, item: T) -> Result<(), CapacityError> {
        if self.items.len() == N {
            return Err(CapacityError { name: self.name, capacity: N });
        }
        self.items.push(item);
        Ok(())
    }

    /// Appends all elements of the iterator, failing on the first one which does not fit.
    pub fn extend<I>(&mut self, items: I) -> Result<(), CapacityError>
    where
        I: IntoIterator<Item = T>,
    {
        for item in items {
            self.push(item)?;
        }
        Ok(())
    }

    /// Removes and returns the last element.
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    /// Returns the underlying vector.
    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T, const N: usize> Deref for BoundedVec<T, N> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        &self.items
    }
}

impl<T, const N: usize> DerefMut for BoundedVec<T, N> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.items
    }
}

impl<T: Serializable, const N: usize> Serializable for BoundedVec<T, N> {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        target.write_usize(self.items.len());
        target.write_many(&self.items);
    }
}

impl<T: Deserializable, const N: usize> BoundedVec<T, N> {
    /// Reads a [BoundedVec] written by [Serializable::write_into], rejecting oversized input.
    pub fn read_named<R: ByteReader>(
        name: &'static str,
        source: &mut R,
    ) -> Result<Self, DeserializationError> {
        let len = source.read_usize()?;
        if len > N {
            return Err(DeserializationError::InvalidValue(format!(
                "{name} has {len} elements but holds at most {N}"
            )));
        }
        let items = source.read_many::<T>(len)?;
        Ok(Self { name, items })
    }
}

// TESTS
// ================================================================================================

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::BoundedVec;
    use crate::CapacityError;

    #[test]
    fn push_beyond_capacity_fails() {
        let mut values = BoundedVec::<u32, 2>::new("values");
        values.push(1).unwrap();
        values.push(2).unwrap();

        assert_matches!(
            values.push(3),
            Err(CapacityError { name: "values", capacity: 2 })
        );
        assert_eq!(&*values, &[1, 2]);
    }

    #[test]
    fn from_vec_checks_capacity() {
        assert!(BoundedVec::<u32, 2>::from_vec("values", vec![1, 2]).is_ok());
        assert!(BoundedVec::<u32, 2>::from_vec("values", vec![1, 2, 3]).is_err());
    }
}
