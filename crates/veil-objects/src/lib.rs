#![no_std]

#[macro_use]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod address;
pub mod call;
pub mod gas;
pub mod hash;
pub mod kernel;
pub mod side_effect;
pub mod transaction;

#[cfg(any(feature = "testing", test))]
pub mod testing;

mod bounded_vec;
mod constants;
mod errors;

// RE-EXPORTS
// ================================================================================================

pub use bounded_vec::BoundedVec;
pub use constants::*;
pub use errors::{CapacityError, TransactionRequestError};
pub use miden_crypto::{
    EMPTY_WORD, Felt, FieldElement, ONE, StarkField, WORD_SIZE, Word, ZERO,
    hash::rpo::{Rpo256 as Hasher, RpoDigest as Digest},
};

pub mod crypto {
    pub use miden_crypto::{hash, merkle};
}

pub mod utils {
    pub mod serde {
        pub use miden_crypto::utils::{
            ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable,
        };
    }
}
