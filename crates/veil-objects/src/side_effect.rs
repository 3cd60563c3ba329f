//! Side effects emitted by function invocations.
//!
//! Every side effect carries a counter assigned from the transaction-wide side-effect counter.
//! Counters impose a total order over all effects of a transaction and are unique within it.

use crate::{
    Felt, ZERO,
    address::ContractAddress,
    utils::serde::{ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable},
};

// TRAITS
// ================================================================================================

/// A value positioned in the transaction-wide side-effect order.
pub trait Ordered {
    fn counter(&self) -> u32;
}

/// A value which may be a zero placeholder.
pub trait Empty {
    fn is_empty(&self) -> bool;
}

// SIDE EFFECT
// ================================================================================================

/// A field element emitted at a given counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SideEffect {
    pub value: Felt,
    pub counter: u32,
}

/// A claim that a value exists in the note hash or nullifier tree, either settled in a past
/// block or emitted earlier in the same transaction.
pub type ReadRequest = SideEffect;

impl SideEffect {
    pub fn new(value: Felt, counter: u32) -> Self {
        Self { value, counter }
    }
}

impl Default for SideEffect {
    fn default() -> Self {
        Self { value: ZERO, counter: 0 }
    }
}

impl Ordered for SideEffect {
    fn counter(&self) -> u32 {
        self.counter
    }
}

impl Empty for SideEffect {
    fn is_empty(&self) -> bool {
        self.value == ZERO && self.counter == 0
    }
}

impl Serializable for SideEffect {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.value.write_into(target);
        target.write_u32(self.counter);
    }
}

impl Deserializable for SideEffect {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let value = Felt::read_from(source)?;
        let counter = source.read_u32()?;
        Ok(Self { value, counter })
    }
}

// NOTE HASH
// ================================================================================================

/// A note hash together with the counter of the nullifier consuming it.
///
/// `nullifier_counter` is zero unless the note is nullified within the same transaction, in which
/// case the note hash is transient and must be squashed before the transaction is finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteHash {
    pub value: Felt,
    pub counter: u32,
    pub nullifier_counter: u32,
}

impl NoteHash {
    pub fn new(value: Felt, counter: u32) -> Self {
        Self { value, counter, nullifier_counter: 0 }
    }

    pub fn is_transient(&self) -> bool {
        self.nullifier_counter != 0
    }
}

impl Default for NoteHash {
    fn default() -> Self {
        Self::new(ZERO, 0)
    }
}

impl Ordered for NoteHash {
    fn counter(&self) -> u32 {
        self.counter
    }
}

impl Empty for NoteHash {
    fn is_empty(&self) -> bool {
        self.value == ZERO && self.counter == 0 && self.nullifier_counter == 0
    }
}

// NULLIFIER
// ================================================================================================

/// A nullifier with a back-reference to the note hash it consumes.
///
/// `note_hash` is zero when the nullified note was settled in a previous transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nullifier {
    pub value: Felt,
    pub note_hash: Felt,
    pub counter: u32,
}

impl Nullifier {
    pub fn new(value: Felt, note_hash: Felt, counter: u32) -> Self {
        Self { value, note_hash, counter }
    }

    pub fn nullifies_pending_note(&self) -> bool {
        self.note_hash != ZERO
    }
}

impl Default for Nullifier {
    fn default() -> Self {
        Self::new(ZERO, ZERO, 0)
    }
}

impl Ordered for Nullifier {
    fn counter(&self) -> u32 {
        self.counter
    }
}

impl Empty for Nullifier {
    fn is_empty(&self) -> bool {
        self.value == ZERO && self.note_hash == ZERO && self.counter == 0
    }
}

// L2 TO L1 MESSAGE
// ================================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct L2ToL1Message {
    pub recipient: Felt,
    pub content: Felt,
    pub counter: u32,
}

impl L2ToL1Message {
    pub fn new(recipient: Felt, content: Felt, counter: u32) -> Self {
        Self { recipient, content, counter }
    }
}

impl Default for L2ToL1Message {
    fn default() -> Self {
        Self::new(ZERO, ZERO, 0)
    }
}

impl Ordered for L2ToL1Message {
    fn counter(&self) -> u32 {
        self.counter
    }
}

impl Empty for L2ToL1Message {
    fn is_empty(&self) -> bool {
        self.recipient == ZERO && self.content == ZERO && self.counter == 0
    }
}

// LOG HASH
// ================================================================================================

/// The hash of an emitted log and the length in bytes of its preimage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogHash {
    pub value: Felt,
    pub counter: u32,
    pub length: u32,
}

impl LogHash {
    pub fn new(value: Felt, counter: u32, length: u32) -> Self {
        Self { value, counter, length }
    }
}

impl Default for LogHash {
    fn default() -> Self {
        Self::new(ZERO, 0, 0)
    }
}

impl Ordered for LogHash {
    fn counter(&self) -> u32 {
        self.counter
    }
}

impl Empty for LogHash {
    fn is_empty(&self) -> bool {
        self.value == ZERO && self.counter == 0 && self.length == 0
    }
}

impl Serializable for LogHash {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.value.write_into(target);
        target.write_u32(self.counter);
        target.write_u32(self.length);
    }
}

impl Deserializable for LogHash {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let value = Felt::read_from(source)?;
        let counter = source.read_u32()?;
        let length = source.read_u32()?;
        Ok(Self { value, counter, length })
    }
}

// KEY VALIDATION REQUEST
// ================================================================================================

/// A claim that `sk_app` is the app-siloed nullifier secret of the account whose master nullifier
/// public key hashes to `npk_m_hash`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyValidationRequest {
    pub npk_m_hash: Felt,
    pub sk_app: Felt,
}

impl KeyValidationRequest {
    pub fn new(npk_m_hash: Felt, sk_app: Felt) -> Self {
        Self { npk_m_hash, sk_app }
    }
}

impl Default for KeyValidationRequest {
    fn default() -> Self {
        Self::new(ZERO, ZERO)
    }
}

impl Empty for KeyValidationRequest {
    fn is_empty(&self) -> bool {
        self.npk_m_hash == ZERO && self.sk_app == ZERO
    }
}

// SCOPED
// ================================================================================================

/// A side effect tagged with the storage contract which emitted it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Scoped<T> {
    pub inner: T,
    pub contract_address: ContractAddress,
}

impl<T> Scoped<T> {
    pub fn new(inner: T, contract_address: ContractAddress) -> Self {
        Self { inner, contract_address }
    }
}

impl<T: Ordered> Ordered for Scoped<T> {
    fn counter(&self) -> u32 {
        self.inner.counter()
    }
}

impl<T: Empty> Empty for Scoped<T> {
    fn is_empty(&self) -> bool {
        self.inner.is_empty() && self.contract_address.is_zero()
    }
}

pub type ScopedNoteHash = Scoped<NoteHash>;
pub type ScopedNullifier = Scoped<Nullifier>;
pub type ScopedReadRequest = Scoped<ReadRequest>;
pub type ScopedL2ToL1Message = Scoped<L2ToL1Message>;
pub type ScopedLogHash = Scoped<LogHash>;
pub type ScopedKeyValidationRequest = Scoped<KeyValidationRequest>;
