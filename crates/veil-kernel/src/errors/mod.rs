use alloc::{boxed::Box, string::String};
use core::error::Error;

use thiserror::Error;
use veil_objects::{
    CapacityError, Felt, TransactionRequestError,
    address::{ContractAddress, FunctionData, FunctionSelector},
    call::CallContext,
    crypto::merkle::MerkleError,
    gas::Gas,
};

// CALL CONTEXT MISMATCH
// ================================================================================================

/// A disagreement between the identity or call type a caller requested and the one a callee
/// declares.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallContextMismatch {
    #[error("callee contract address is {actual} but {expected} was requested")]
    ContractAddress {
        expected: ContractAddress,
        actual: ContractAddress,
    },
    #[error("callee function data is {actual:?} but {expected:?} was requested")]
    FunctionData {
        expected: FunctionData,
        actual: FunctionData,
    },
    #[error("callee received arguments hashing to {actual} but {expected} were passed")]
    ArgsHash { expected: Felt, actual: Felt },
    #[error("callee call context is {actual:?} but {expected:?} was expected")]
    CallContext {
        expected: CallContext,
        actual: CallContext,
    },
    #[error("callee msg_sender is {actual} but must be {expected}")]
    MsgSender {
        expected: ContractAddress,
        actual: ContractAddress,
    },
    #[error("callee storage contract address is {actual} but must be {expected}")]
    StorageContractAddress {
        expected: ContractAddress,
        actual: ContractAddress,
    },
    #[error("call request was issued by {actual} but the calling contract is {expected}")]
    CallerContractAddress {
        expected: ContractAddress,
        actual: ContractAddress,
    },
    #[error("caller context must be set for delegate calls and empty otherwise")]
    CallerContext,
    #[error("delegate call executes code of {0} in its own storage")]
    DelegateCallToSelf(ContractAddress),
    #[error("a call nested in a static call must be static")]
    StaticCallNotPropagated,
    #[error("static call attempted to {0}")]
    StaticCallStateChange(&'static str),
    #[error(
        "callee counter window [{actual_start}, {actual_end}] does not match requested window [{expected_start}, {expected_end}]"
    )]
    CounterWindow {
        expected_start: u32,
        expected_end: u32,
        actual_start: u32,
        actual_end: u32,
    },
}

// CONTEXT ERROR
// ================================================================================================

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("call context mismatch")]
    CallContextMismatch(#[source] CallContextMismatch),
    #[error("capacity exceeded")]
    CapacityExceeded(#[from] CapacityError),
    #[error("function invocation was already finished")]
    ContextFinalized,
    #[error("nested call failed")]
    ExecutorFailed(#[source] ExecutorError),
    #[error("failed to fetch nullifier keys")]
    KeyProviderFailed(#[source] KeyProviderError),
    #[error(
        "nullifier keys of {requested} requested after keys of {cached} in the same invocation"
    )]
    MultipleKeyRequests { cached: Felt, requested: Felt },
    #[error("public teardown function was already set in this invocation")]
    TeardownAlreadySet,
}

impl From<CallContextMismatch> for ContextError {
    fn from(mismatch: CallContextMismatch) -> Self {
        Self::CallContextMismatch(mismatch)
    }
}

// CALL STACK ERROR
// ================================================================================================

/// A violation of the fixed-capacity, zero-padded layout of a declared array.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedArrayError {
    #[error("non-empty value at index {0} follows an empty slot")]
    NonEmptyAfterEmpty(usize),
    #[error("array has {len} slots but its capacity is {capacity}")]
    LengthMismatch { len: usize, capacity: usize },
    #[error("array declares {requests} requests but {items} callee items were provided")]
    ItemCountMismatch { requests: usize, items: usize },
}

#[derive(Debug, Error)]
pub enum CallStackError {
    #[error("malformed {name}")]
    MalformedCallStack {
        name: &'static str,
        #[source]
        source: MalformedArrayError,
    },
    #[error("malformed {name}")]
    MalformedArray {
        name: &'static str,
        #[source]
        source: MalformedArrayError,
    },
    #[error(
        "call request at index {index} commits to {expected} but the callee item hashes to {actual}"
    )]
    CallRequestHashMismatch { index: usize, expected: Felt, actual: Felt },
    #[error("call context mismatch")]
    CallContextMismatch(#[source] CallContextMismatch),
    #[error("side-effect counter window [{start}, {end}] is empty or inverted")]
    InvalidCounterWindow { start: u32, end: u32 },
    #[error("{name} counter {counter} lies outside the invocation window [{start}, {end}]")]
    CounterOutsideWindow {
        name: &'static str,
        counter: u32,
        start: u32,
        end: u32,
    },
    #[error("{name} counter {counter} does not follow previous counter {previous}")]
    CounterNotIncreasing {
        name: &'static str,
        counter: u32,
        previous: u32,
    },
    #[error("counter {counter} is used by {name} and by another side effect")]
    DuplicateCounter { name: &'static str, counter: u32 },
    #[error("{name} counter {counter} lies inside the nested call window [{start}, {end}]")]
    CounterInsideNestedCall {
        name: &'static str,
        counter: u32,
        start: u32,
        end: u32,
    },
    #[error("function {selector} is not private and cannot be proven by the private kernel")]
    NotAPrivateFunction { selector: FunctionSelector },
    #[error("failed to recompute the private function tree root of {selector}")]
    FunctionMembershipFailed {
        selector: FunctionSelector,
        #[source]
        source: MerkleError,
    },
    #[error("contract address recomputes to {computed} but the callee claims {claimed}")]
    IdentityRecomputation {
        claimed: ContractAddress,
        computed: ContractAddress,
    },
}

impl From<CallContextMismatch> for CallStackError {
    fn from(mismatch: CallContextMismatch) -> Self {
        Self::CallContextMismatch(mismatch)
    }
}

// KERNEL ERROR
// ================================================================================================

/// A reason the claimed sorted form of an array does not match the array.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SortError {
    #[error("sorted array has {sorted} elements but the original has {original}")]
    LengthMismatch { original: usize, sorted: usize },
    #[error("sort index {index} of element {position} is out of bounds")]
    IndexOutOfBounds { position: usize, index: usize },
    #[error("sort index {0} is used more than once")]
    DuplicateIndex(usize),
    #[error("element {position} does not match the sorted element at index {index}")]
    ValueMismatch { position: usize, index: usize },
    #[error("sorted element {index} has counter {counter} which does not exceed {previous}")]
    NotAscending { index: usize, counter: u32, previous: u32 },
}

/// A reason transient note hashes and nullifiers could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransientError {
    #[error("expected {expected} squash hints but got {actual}")]
    HintCountMismatch { expected: usize, actual: usize },
    #[error("nullifier {nullifier_index} nullifies a pending note hash but no hint links it")]
    MissingLink { nullifier_index: usize },
    #[error("nullifier {nullifier_index} links to note hash {note_hash_index} which does not exist")]
    LinkOutOfBounds {
        nullifier_index: usize,
        note_hash_index: usize,
    },
    #[error(
        "nullifier {nullifier_index} does not nullify note hash {note_hash_index} (value, contract or order differ)"
    )]
    LinkMismatch {
        nullifier_index: usize,
        note_hash_index: usize,
    },
    #[error("note hash {0} is nullified more than once")]
    DoubleNullification(usize),
    #[error("note hash {0} declares a nullifier counter no nullifier matches")]
    DanglingNoteHash(usize),
    #[error("nullifier {0} still references a note hash after squashing")]
    DanglingNullifier(usize),
    #[error("squashed {0} do not match the unsquashed values with transient pairs removed")]
    SquashedArrayMismatch(&'static str),
}

#[derive(Debug, Error)]
pub enum KernelError {
    #[error("transaction request does not match the first call")]
    InvalidTxRequest(#[source] TransactionRequestError),
    #[error("call stack validation failed")]
    CallStack(#[from] CallStackError),
    #[error("capacity exceeded")]
    CapacityExceeded(#[from] CapacityError),
    #[error("private call stack is empty but another call frame was provided")]
    EmptyPrivateCallStack,
    #[error("call frame was executed against a different block header or transaction context")]
    ConstantsMismatch,
    #[error("transaction trace holds no call frames")]
    EmptyTrace,
    #[error("transaction trace holds {0} call frames which never returned")]
    UnfinishedCallFrames(usize),
    #[error("{0} private calls were requested but never processed")]
    UnprocessedPrivateCalls(usize),
    #[error("the first nullifier of the transaction is zero or missing")]
    ZeroFirstNullifier,
    #[error("min revertible side-effect counter is set by more than one invocation")]
    MinRevertibleCounterAlreadySet,
    #[error("public teardown call is set by more than one invocation")]
    TeardownAlreadySet,
    #[error("fee payer is set by more than one invocation")]
    FeePayerAlreadySet,
    #[error("{name} hints have {actual} entries but {expected} were expected")]
    MalformedHints {
        name: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{name} read request {index} could not be resolved")]
    ReadRequestUnresolved { name: &'static str, index: usize },
    #[error("key validation request {index} is not justified by its hint")]
    KeyValidationFailed { index: usize },
    #[error("claimed sort of {name} is invalid")]
    SortIntegrity {
        name: &'static str,
        #[source]
        source: SortError,
    },
    #[error("transient data could not be resolved")]
    TransientResolution(#[source] TransientError),
    #[error("transaction uses {used} gas which exceeds the limit of {limit}")]
    GasLimitExceeded { used: Gas, limit: Gas },
    #[error("transaction gas overflows the metered range and exceeds the limit of {limit}")]
    GasOverflow { limit: Gas },
    #[error("a private-only tail cannot carry {0} enqueued public calls")]
    PublicCallsInPrivateTail(usize),
    #[error("a private-only tail cannot carry a public teardown call")]
    TeardownInPrivateTail,
    #[error("the public tail requires at least one enqueued public call or a teardown call")]
    NoPublicCalls,
}

// EXECUTOR ERROR
// ================================================================================================

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("contract {0} is not known to the executor")]
    ContractNotFound(ContractAddress),
    #[error("contract {address} has no function with selector {selector}")]
    FunctionNotFound {
        address: ContractAddress,
        selector: FunctionSelector,
    },
    #[error("execution of {selector} on {address} failed")]
    CallFailed {
        address: ContractAddress,
        selector: FunctionSelector,
        source: Box<ContextError>,
    },
    /// Custom error variant for implementors of the
    /// [`CallExecutor`](crate::host::CallExecutor) trait.
    #[error("{error_msg}")]
    Other {
        error_msg: Box<str>,
        // thiserror will return this when calling Error::source on ExecutorError.
        source: Option<Box<dyn Error + Send + Sync + 'static>>,
    },
}

impl ExecutorError {
    /// Creates a custom error using the [`ExecutorError::Other`] variant from an error message.
    pub fn other(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self::Other { error_msg: message.into(), source: None }
    }

    /// Creates a custom error using the [`ExecutorError::Other`] variant from an error message and
    /// a source error.
    pub fn other_with_source(
        message: impl Into<String>,
        source: impl Error + Send + Sync + 'static,
    ) -> Self {
        let message: String = message.into();
        Self::Other {
            error_msg: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

// KEY PROVIDER ERROR
// ================================================================================================

#[derive(Debug, Error)]
pub enum KeyProviderError {
    #[error("no nullifier keys known for public key hash {0}")]
    UnknownAccount(Felt),
    /// Custom error variant for implementors of the
    /// [`SecretKeyProvider`](crate::host::SecretKeyProvider) trait.
    #[error("{error_msg}")]
    Other {
        error_msg: Box<str>,
        source: Option<Box<dyn Error + Send + Sync + 'static>>,
    },
}

impl KeyProviderError {
    /// Creates a custom error using the [`KeyProviderError::Other`] variant from an error message.
    pub fn other(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self::Other { error_msg: message.into(), source: None }
    }
}
