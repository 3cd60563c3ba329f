use thiserror::Error;

use crate::{address::ContractAddress, call::CallContext, transaction::TxContext};

// CAPACITY ERROR
// ================================================================================================

/// Raised when a bounded sequence would grow beyond its fixed capacity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{name} holds at most {capacity} elements")]
pub struct CapacityError {
    pub name: &'static str,
    pub capacity: usize,
}

// TRANSACTION REQUEST ERROR
// ================================================================================================

#[derive(Debug, Error)]
pub enum TransactionRequestError {
    #[error("transaction origin {origin} does not match the first call's contract address {contract_address}")]
    OriginMismatch {
        origin: ContractAddress,
        contract_address: ContractAddress,
    },
    #[error("transaction request targets a non-private function")]
    FirstCallNotPrivate,
    #[error("function data of the first call does not match the transaction request")]
    FunctionDataMismatch,
    #[error("arguments hash of the first call does not match the transaction request")]
    ArgsHashMismatch,
    #[error("transaction context {expected:?} does not match the context {actual:?} seen by the first call")]
    TxContextMismatch { expected: TxContext, actual: TxContext },
    #[error("first call of a transaction must not be a delegate or static call, got {0:?}")]
    InvalidFirstCallContext(CallContext),
}
