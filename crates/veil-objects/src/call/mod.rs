use alloc::vec::Vec;

use crate::{
    DOMAIN_CALL_CONTEXT, Felt, ONE, ZERO,
    address::{ContractAddress, FunctionSelector},
    hash::hash_to_felt,
    side_effect::{Empty, Ordered},
    utils::serde::{ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable},
};

mod public_inputs;
pub use public_inputs::PrivateCircuitPublicInputs;

mod stack_item;
pub use stack_item::{CallStackItem, PrivateCallStackItem, PublicCallStackItem};

// CALL CONTEXT
// ================================================================================================

/// The identity and call type of a function invocation, as observed by the invocation itself.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub msg_sender: ContractAddress,
    /// The contract whose state the invocation reads and writes. Differs from the address of the
    /// executed code only for delegate calls.
    pub storage_contract_address: ContractAddress,
    pub function_selector: FunctionSelector,
    pub is_static_call: bool,
    pub is_delegate_call: bool,
    pub start_side_effect_counter: u32,
}

impl CallContext {
    pub fn append_elements(&self, target: &mut Vec<Felt>) {
        target.push(self.msg_sender.as_felt());
        target.push(self.storage_contract_address.as_felt());
        target.push(self.function_selector.as_felt());
        target.push(if self.is_static_call { ONE } else { ZERO });
        target.push(if self.is_delegate_call { ONE } else { ZERO });
        target.push(Felt::from(self.start_side_effect_counter));
    }

    /// Returns the commitment to this call context.
    pub fn hash(&self) -> Felt {
        let mut elements = Vec::with_capacity(6);
        self.append_elements(&mut elements);
        hash_to_felt(DOMAIN_CALL_CONTEXT, &elements)
    }
}

// CALLER CONTEXT
// ================================================================================================

/// The context a delegate call inherits from its caller. Empty for ordinary calls.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallerContext {
    pub msg_sender: ContractAddress,
    pub storage_contract_address: ContractAddress,
}

impl CallerContext {
    pub fn empty() -> Self {
        Self::default()
    }
}

impl Empty for CallerContext {
    fn is_empty(&self) -> bool {
        self.msg_sender.is_zero() && self.storage_contract_address.is_zero()
    }
}

// CALL REQUEST
// ================================================================================================

/// A caller's commitment to a nested call.
///
/// `hash` is the hash of the callee's call stack item. The counters delimit the window of
/// side-effect counters consumed by the callee, including the window of its own nested calls.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallRequest {
    pub hash: Felt,
    pub caller_contract_address: ContractAddress,
    pub caller_context: CallerContext,
    pub start_side_effect_counter: u32,
    pub end_side_effect_counter: u32,
}

impl CallRequest {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn append_elements(&self, target: &mut Vec<Felt>) {
        target.push(self.hash);
        target.push(self.caller_contract_address.as_felt());
        target.push(self.caller_context.msg_sender.as_felt());
        target.push(self.caller_context.storage_contract_address.as_felt());
        target.push(Felt::from(self.start_side_effect_counter));
        target.push(Felt::from(self.end_side_effect_counter));
    }
}

impl Empty for CallRequest {
    fn is_empty(&self) -> bool {
        self.hash == ZERO
            && self.caller_contract_address.is_zero()
            && self.caller_context.is_empty()
            && self.start_side_effect_counter == 0
            && self.end_side_effect_counter == 0
    }
}

impl Ordered for CallRequest {
    fn counter(&self) -> u32 {
        self.start_side_effect_counter
    }
}

impl Serializable for CallRequest {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.hash.write_into(target);
        self.caller_contract_address.write_into(target);
        self.caller_context.msg_sender.write_into(target);
        self.caller_context.storage_contract_address.write_into(target);
        target.write_u32(self.start_side_effect_counter);
        target.write_u32(self.end_side_effect_counter);
    }
}

impl Deserializable for CallRequest {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let hash = Felt::read_from(source)?;
        let caller_contract_address = ContractAddress::read_from(source)?;
        let msg_sender = ContractAddress::read_from(source)?;
        let storage_contract_address = ContractAddress::read_from(source)?;
        let start_side_effect_counter = source.read_u32()?;
        let end_side_effect_counter = source.read_u32()?;
        Ok(Self {
            hash,
            caller_contract_address,
            caller_context: CallerContext { msg_sender, storage_contract_address },
            start_side_effect_counter,
            end_side_effect_counter,
        })
    }
}
