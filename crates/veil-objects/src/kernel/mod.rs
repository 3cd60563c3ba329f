mod accumulated;
pub use accumulated::{
    CombinedAccumulatedData, PrivateAccumulatedDataBuilder, PublicAccumulatedData,
    ValidationRequestsBuilder,
};

use crate::{
    address::ContractAddress,
    call::CallRequest,
    transaction::{RollupValidationRequests, TxConstants},
    utils::serde::{ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable},
};

// PRIVATE KERNEL CIRCUIT PUBLIC INPUTS
// ================================================================================================

/// The output of a private kernel iteration, consumed by the next iteration or by the tail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateKernelCircuitPublicInputs {
    pub constants: TxConstants,
    /// Side effects with a counter below this value are non-revertible.
    pub min_revertible_side_effect_counter: u32,
    pub validation_requests: ValidationRequestsBuilder,
    pub end: PrivateAccumulatedDataBuilder,
    pub public_teardown_call_request: CallRequest,
    /// The contract paying the transaction fee, or zero if none was set yet.
    pub fee_payer: ContractAddress,
}

impl PrivateKernelCircuitPublicInputs {
    pub fn new(constants: TxConstants) -> Self {
        Self {
            constants,
            min_revertible_side_effect_counter: 0,
            validation_requests: ValidationRequestsBuilder::default(),
            end: PrivateAccumulatedDataBuilder::default(),
            public_teardown_call_request: CallRequest::empty(),
            fee_payer: ContractAddress::ZERO,
        }
    }
}

// KERNEL CIRCUIT PUBLIC INPUTS
// ================================================================================================

/// The final public inputs of a transaction without a public phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelCircuitPublicInputs {
    pub constants: TxConstants,
    pub rollup_validation_requests: RollupValidationRequests,
    pub end: CombinedAccumulatedData,
    pub fee_payer: ContractAddress,
}

impl Serializable for KernelCircuitPublicInputs {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.constants.write_into(target);
        self.rollup_validation_requests.write_into(target);
        self.end.write_into(target);
        self.fee_payer.write_into(target);
    }
}

impl Deserializable for KernelCircuitPublicInputs {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let constants = TxConstants::read_from(source)?;
        let rollup_validation_requests = RollupValidationRequests::read_from(source)?;
        let end = CombinedAccumulatedData::read_from(source)?;
        let fee_payer = ContractAddress::read_from(source)?;
        Ok(Self {
            constants,
            rollup_validation_requests,
            end,
            fee_payer,
        })
    }
}

// PUBLIC KERNEL CIRCUIT PUBLIC INPUTS
// ================================================================================================

/// The final public inputs of the private part of a transaction whose execution continues with
/// enqueued public calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKernelCircuitPublicInputs {
    pub constants: TxConstants,
    pub rollup_validation_requests: RollupValidationRequests,
    /// Side effects which survive a revert of the public phase.
    pub end_non_revertible: PublicAccumulatedData,
    /// Side effects discarded if the public phase reverts.
    pub end: PublicAccumulatedData,
    pub public_teardown_call_request: CallRequest,
    pub fee_payer: ContractAddress,
}

impl Serializable for PublicKernelCircuitPublicInputs {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.constants.write_into(target);
        self.rollup_validation_requests.write_into(target);
        self.end_non_revertible.write_into(target);
        self.end.write_into(target);
        self.public_teardown_call_request.write_into(target);
        self.fee_payer.write_into(target);
    }
}

impl Deserializable for PublicKernelCircuitPublicInputs {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let constants = TxConstants::read_from(source)?;
        let rollup_validation_requests = RollupValidationRequests::read_from(source)?;
        let end_non_revertible = PublicAccumulatedData::read_from(source)?;
        let end = PublicAccumulatedData::read_from(source)?;
        let public_teardown_call_request = CallRequest::read_from(source)?;
        let fee_payer = ContractAddress::read_from(source)?;
        Ok(Self {
            constants,
            rollup_validation_requests,
            end_non_revertible,
            end,
            public_teardown_call_request,
            fee_payer,
        })
    }
}

// TESTS
// ================================================================================================
