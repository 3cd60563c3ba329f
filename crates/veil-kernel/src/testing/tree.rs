use alloc::vec::Vec;

use veil_objects::{
    Digest,
    crypto::merkle::{MerklePath, MerkleTree, NodeIndex},
};

use crate::hints::MembershipWitness;

/// A small binary merkle tree over a list of leaves.
///
/// Leaves are padded with empty digests up to the next power of two, and the tree always has at
/// least one level above the leaves.
#[derive(Debug, Clone)]
pub struct MockTree(MerkleTree);

impl MockTree {
    pub fn new(leaves: Vec<Digest>) -> Self {
        let width = leaves.len().next_power_of_two().max(2);
        let mut leaves = leaves;
        leaves.resize(width, Digest::default());

        Self(MerkleTree::try_from(leaves.as_slice()).expect("padded leaves form a valid tree"))
    }

    pub fn root(&self) -> Digest {
        self.0.root()
    }

    pub fn depth(&self) -> u8 {
        self.0.depth()
    }

    /// Returns the sibling path of the leaf at `index`, from the leaf level upwards.
    pub fn path(&self, index: usize) -> MerklePath {
        let node = NodeIndex::new(self.depth(), index as u64).expect("leaf index outside of tree");
        self.0.get_path(node).expect("leaf index outside of tree")
    }

    pub fn witness(&self, index: usize) -> MembershipWitness {
        MembershipWitness::new(index as u64, self.path(index))
    }
}

#[cfg(test)]
mod tests {
    use veil_objects::{Felt, ZERO};

    use super::*;
    use crate::host::{MembershipOracle, MerklePathOracle};

    #[test]
    fn every_leaf_proves_membership() {
        let leaves: Vec<_> =
            (1..=5u64).map(|value| Digest::new([Felt::new(value), ZERO, ZERO, ZERO])).collect();
        let tree = MockTree::new(leaves.clone());

        assert_eq!(tree.depth(), 3);
        for (index, leaf) in leaves.into_iter().enumerate() {
            assert!(MerklePathOracle.verify_membership(
                leaf,
                index as u64,
                &tree.path(index),
                tree.root()
            ));
        }
    }

    #[test]
    fn single_leaf_is_padded_to_a_pair() {
        let leaf = Digest::new([Felt::new(9), ZERO, ZERO, ZERO]);
        let tree = MockTree::new(vec![leaf]);

        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.path(0).len(), 1);
        assert!(MerklePathOracle.verify_membership(leaf, 0, &tree.path(0), tree.root()));
    }
}
