// PER-CALL CAPACITIES
// ================================================================================================

/// The maximum number of note hashes a single function invocation can create.
pub const MAX_NOTE_HASHES_PER_CALL: usize = 16;

/// The maximum number of nullifiers a single function invocation can create.
pub const MAX_NULLIFIERS_PER_CALL: usize = 16;

/// The maximum number of nested private calls a single function invocation can request.
pub const MAX_PRIVATE_CALL_STACK_LENGTH_PER_CALL: usize = 4;

/// The maximum number of public (and VM) calls a single function invocation can enqueue.
pub const MAX_PUBLIC_CALL_STACK_LENGTH_PER_CALL: usize = 16;

/// The maximum number of L2-to-L1 messages a single function invocation can emit.
pub const MAX_L2_TO_L1_MSGS_PER_CALL: usize = 2;

/// The maximum number of note hash read requests a single function invocation can make.
pub const MAX_NOTE_HASH_READ_REQUESTS_PER_CALL: usize = 32;

/// The maximum number of nullifier read requests a single function invocation can make.
pub const MAX_NULLIFIER_READ_REQUESTS_PER_CALL: usize = 32;

/// The maximum number of key validation requests a single function invocation can make.
pub const MAX_KEY_VALIDATION_REQUESTS_PER_CALL: usize = 1;

/// The maximum number of encrypted log hashes a single function invocation can emit.
pub const MAX_ENCRYPTED_LOGS_PER_CALL: usize = 4;

/// The maximum number of unencrypted log hashes a single function invocation can emit.
pub const MAX_UNENCRYPTED_LOGS_PER_CALL: usize = 4;

// PER-TRANSACTION CAPACITIES
// ================================================================================================

pub const MAX_NOTE_HASHES_PER_TX: usize = 64;
pub const MAX_NULLIFIERS_PER_TX: usize = 64;
pub const MAX_PRIVATE_CALL_STACK_LENGTH_PER_TX: usize = 8;
pub const MAX_PUBLIC_CALL_STACK_LENGTH_PER_TX: usize = 32;
pub const MAX_L2_TO_L1_MSGS_PER_TX: usize = 8;
pub const MAX_NOTE_HASH_READ_REQUESTS_PER_TX: usize = 128;
pub const MAX_NULLIFIER_READ_REQUESTS_PER_TX: usize = 128;
pub const MAX_KEY_VALIDATION_REQUESTS_PER_TX: usize = 64;
pub const MAX_ENCRYPTED_LOGS_PER_TX: usize = 8;
pub const MAX_UNENCRYPTED_LOGS_PER_TX: usize = 8;

// GAS
// ================================================================================================

/// Number of bytes of data availability consumed by a single field element.
pub const DA_BYTES_PER_FIELD: u32 = 32;

/// Data availability gas charged per published byte.
pub const DA_GAS_PER_BYTE: u32 = 16;

/// Data availability gas charged once per transaction.
pub const FIXED_DA_GAS: u32 = 512;

/// L2 gas charged once per transaction.
pub const FIXED_L2_GAS: u32 = 512;

/// L2 gas charged for every enqueued public call.
pub const FIXED_AVM_STARTUP_L2_GAS: u32 = 1024;

pub const L2_GAS_PER_NOTE_HASH: u32 = 32;
pub const L2_GAS_PER_NULLIFIER: u32 = 64;
pub const L2_GAS_PER_LOG_BYTE: u32 = 4;

// HASH DOMAIN SEPARATORS
// ================================================================================================

pub const DOMAIN_CALL_CONTEXT: u64 = 1;
pub const DOMAIN_CALL_STACK_ITEM: u64 = 2;
pub const DOMAIN_PUBLIC_CALL_STACK_ITEM: u64 = 3;
pub const DOMAIN_FUNCTION_ARGS: u64 = 4;
pub const DOMAIN_FUNCTION_LEAF: u64 = 5;
pub const DOMAIN_CONTRACT_CLASS_ID: u64 = 6;
pub const DOMAIN_PARTIAL_ADDRESS: u64 = 7;
pub const DOMAIN_CONTRACT_ADDRESS: u64 = 8;
pub const DOMAIN_SALTED_INITIALIZATION_HASH: u64 = 9;
pub const DOMAIN_PRIVATE_PUBLIC_INPUTS: u64 = 10;
pub const DOMAIN_TX_REQUEST: u64 = 11;
pub const DOMAIN_SILOED_NOTE_HASH: u64 = 12;
pub const DOMAIN_NOTE_HASH_NONCE: u64 = 13;
pub const DOMAIN_UNIQUE_NOTE_HASH: u64 = 14;
pub const DOMAIN_SILOED_NULLIFIER: u64 = 15;
pub const DOMAIN_SILOED_L2_TO_L1_MSG: u64 = 16;
pub const DOMAIN_SILOED_LOG_HASH: u64 = 17;
pub const DOMAIN_NULLIFIER_PUBLIC_KEY: u64 = 18;
pub const DOMAIN_APP_NULLIFIER_SECRET: u64 = 19;
pub const DOMAIN_NOTE_NULLIFIER: u64 = 20;
pub const DOMAIN_PUBLIC_KEYS: u64 = 21;
