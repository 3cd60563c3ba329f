#![no_std]

#[macro_use]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod context;
pub use context::{PrivateContext, SideEffectCounter};

pub mod host;
pub use host::{CallExecutor, MembershipOracle, MerklePathOracle, NestedCall, SecretKeyProvider};

mod execution;
pub use execution::{FunctionWitness, PrivateCallData, TransactionTrace};

pub mod validator;

pub mod composer;

pub mod hints;
pub use hints::{MembershipWitness, TailHints, TailHintsBuilder, TailWitnesses};

mod kernel;
pub use kernel::PrivateKernel;

mod pipeline;
pub use pipeline::{KernelOutput, KernelPipeline};

mod errors;
pub use errors::{
    CallContextMismatch, CallStackError, ContextError, ExecutorError, KernelError,
    KeyProviderError, MalformedArrayError, SortError, TransientError,
};

#[cfg(any(feature = "testing", test))]
pub mod testing;

#[cfg(test)]
mod tests;

// RE-EXPORTS
// ================================================================================================
pub use veil_objects::utils;
