//! Mocks of the kernel's host interfaces for tests and examples.

mod contract;
pub use contract::{MockContract, MockContractBuilder, MockFunction, PrivateFunctionBody};

mod executor;
pub use executor::MockExecutor;

mod keys;
pub use keys::MockKeyStore;

mod tree;
pub use tree::MockTree;
