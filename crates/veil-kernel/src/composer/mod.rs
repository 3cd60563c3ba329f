//! Verified transformations which turn the accumulated output of the private kernel into the
//! final public inputs of a transaction.

mod gas;
pub use gas::{GasMeter, check_gas_limit};

mod reset;
pub use reset::{
    ReadRequestHint, note_hash_leaf, nullifier_leaf, verify_key_validation_requests,
    verify_note_hash_read_requests, verify_nullifier_read_requests,
};

mod silo;
pub use silo::{
    SiloedData, silo_l2_to_l1_messages, silo_log_hashes, silo_note_hashes, silo_nullifiers,
};

mod sort;
pub use sort::{SortedArray, verify_sorted};

mod split;
pub use split::{preimages_length, split_by_counter, split_to_public};

mod squash;
pub use squash::{
    SquashedData, find_transient_links, link_note_hashes, remove_transient_pairs,
    squash_transient_data,
};
