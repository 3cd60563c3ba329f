use super::{CallContext, PrivateCircuitPublicInputs};
use crate::{
    DOMAIN_CALL_STACK_ITEM, DOMAIN_PUBLIC_CALL_STACK_ITEM, Felt,
    address::{ContractAddress, FunctionData},
    hash::hash_to_felt,
};

// CALL STACK ITEM
// ================================================================================================

/// A callee's self-declared identity which a caller's [CallRequest](super::CallRequest) commits
/// to.
pub trait CallStackItem {
    /// Returns the hash a matching call request must carry.
    fn hash(&self) -> Felt;

    /// Returns the address of the executed code.
    fn contract_address(&self) -> ContractAddress;

    fn function_data(&self) -> FunctionData;

    fn call_context(&self) -> &CallContext;

    fn start_side_effect_counter(&self) -> u32;

    fn end_side_effect_counter(&self) -> u32;
}

// PRIVATE CALL STACK ITEM
// ================================================================================================

/// A finished private function invocation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PrivateCallStackItem {
    pub contract_address: ContractAddress,
    pub function_data: FunctionData,
    pub public_inputs: PrivateCircuitPublicInputs,
}

impl CallStackItem for PrivateCallStackItem {
    fn hash(&self) -> Felt {
        let [selector, kind] = self.function_data.to_elements();
        hash_to_felt(
            DOMAIN_CALL_STACK_ITEM,
            &[self.contract_address.as_felt(), selector, kind, self.public_inputs.hash()],
        )
    }

    fn contract_address(&self) -> ContractAddress {
        self.contract_address
    }

    fn function_data(&self) -> FunctionData {
        self.function_data
    }

    fn call_context(&self) -> &CallContext {
        &self.public_inputs.call_context
    }

    fn start_side_effect_counter(&self) -> u32 {
        self.public_inputs.start_side_effect_counter
    }

    fn end_side_effect_counter(&self) -> u32 {
        self.public_inputs.end_side_effect_counter
    }
}

// PUBLIC CALL STACK ITEM
// ================================================================================================

/// A public or VM function call enqueued by a private invocation.
///
/// The call executes after the private part of the transaction; its position in the side-effect
/// order is the single counter consumed when it was enqueued.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PublicCallStackItem {
    pub contract_address: ContractAddress,
    pub function_data: FunctionData,
    pub call_context: CallContext,
    pub args_hash: Felt,
    pub counter: u32,
}

impl CallStackItem for PublicCallStackItem {
    fn hash(&self) -> Felt {
        let [selector, kind] = self.function_data.to_elements();
        hash_to_felt(
            DOMAIN_PUBLIC_CALL_STACK_ITEM,
            &[
                self.contract_address.as_felt(),
                selector,
                kind,
                self.call_context.hash(),
                self.args_hash,
                Felt::from(self.counter),
            ],
        )
    }

    fn contract_address(&self) -> ContractAddress {
        self.contract_address
    }

    fn function_data(&self) -> FunctionData {
        self.function_data
    }

    fn call_context(&self) -> &CallContext {
        &self.call_context
    }

    fn start_side_effect_counter(&self) -> u32 {
        self.counter
    }

    fn end_side_effect_counter(&self) -> u32 {
        self.counter
    }
}
