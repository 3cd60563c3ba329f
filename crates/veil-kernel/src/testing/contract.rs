use alloc::{sync::Arc, vec::Vec};

use veil_objects::{
    Digest, Felt, Hasher,
    address::{
        ContractAddress, ContractClass, ContractInstance, FunctionSelector, PublicKeysHash,
        compute_function_leaf,
    },
    testing::random_felts,
};

use super::{MockExecutor, MockTree};
use crate::{context::PrivateContext, errors::ContextError, execution::FunctionWitness};

/// The body of a mocked private function.
///
/// It receives the context of the running invocation, the executor for nested calls, and the
/// call arguments.
pub type PrivateFunctionBody = Arc<
    dyn Fn(&mut PrivateContext<'_>, &mut MockExecutor, &[Felt]) -> Result<(), ContextError>
        + Send
        + Sync,
>;

// MOCK FUNCTION
// ================================================================================================

#[derive(Clone)]
pub struct MockFunction {
    pub selector: FunctionSelector,
    pub vk_hash: Digest,
    pub body: PrivateFunctionBody,
}

// MOCK CONTRACT
// ================================================================================================

/// A deployed contract whose private functions are Rust closures.
#[derive(Clone)]
pub struct MockContract {
    instance: ContractInstance,
    functions: Vec<MockFunction>,
    function_tree: MockTree,
    address: ContractAddress,
}

impl MockContract {
    pub fn builder(seed: u64) -> MockContractBuilder {
        MockContractBuilder::new(seed)
    }

    pub fn address(&self) -> ContractAddress {
        self.address
    }

    pub fn instance(&self) -> &ContractInstance {
        &self.instance
    }

    pub fn private_functions_root(&self) -> Digest {
        self.function_tree.root()
    }

    /// Returns the function with `selector` together with its membership witness.
    pub fn function(&self, selector: FunctionSelector) -> Option<(MockFunction, FunctionWitness)> {
        let index = self.functions.iter().position(|function| function.selector == selector)?;
        let function = self.functions[index].clone();
        let witness = FunctionWitness {
            contract_instance: self.instance,
            vk_hash: function.vk_hash,
            function_leaf_index: index as u64,
            function_leaf_path: self.function_tree.path(index),
        };
        Some((function, witness))
    }
}

// MOCK CONTRACT BUILDER
// ================================================================================================

pub struct MockContractBuilder {
    seed: u64,
    instance: ContractInstance,
    functions: Vec<MockFunction>,
}

impl MockContractBuilder {
    fn new(seed: u64) -> Self {
        let [artifact_hash, bytecode_commitment, salt, initialization_hash, keys_hash] =
            <[Felt; 5]>::try_from(random_felts(seed, 5)).unwrap_or([Felt::new(seed); 5]);

        let instance = ContractInstance {
            class: ContractClass {
                artifact_hash,
                public_bytecode_commitment: bytecode_commitment,
            },
            salt,
            initialization_hash,
            deployer: ContractAddress::ZERO,
            public_keys_hash: PublicKeysHash::new(keys_hash),
        };

        Self { seed, instance, functions: Vec::new() }
    }

    /// Adds a private function. Its verification key hash is derived from the contract seed and
    /// the selector.
    pub fn with_function<F>(mut self, selector: FunctionSelector, body: F) -> Self
    where
        F: Fn(&mut PrivateContext<'_>, &mut MockExecutor, &[Felt]) -> Result<(), ContextError>
            + Send
            + Sync
            + 'static,
    {
        let vk_hash = Hasher::hash_elements(&[Felt::new(self.seed), selector.as_felt()]);
        self.functions.push(MockFunction { selector, vk_hash, body: Arc::new(body) });
        self
    }

    pub fn build(self) -> MockContract {
        let leaves = self
            .functions
            .iter()
            .map(|function| compute_function_leaf(function.selector, function.vk_hash))
            .collect();
        let function_tree = MockTree::new(leaves);
        let address = self.instance.address(function_tree.root());

        MockContract {
            instance: self.instance,
            functions: self.functions,
            function_tree,
            address,
        }
    }
}
