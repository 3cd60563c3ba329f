use alloc::vec::Vec;

use crate::{
    DOMAIN_TX_REQUEST, Digest, Felt,
    address::{ContractAddress, FunctionData},
    gas::GasSettings,
    hash::hash_to_felt,
    utils::serde::{ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable},
};

// TRANSACTION CONTEXT
// ================================================================================================

/// Transaction-wide values every function invocation observes unchanged.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TxContext {
    pub chain_id: Felt,
    pub version: Felt,
    pub gas_settings: GasSettings,
}

impl TxContext {
    pub fn new(chain_id: Felt, version: Felt, gas_settings: GasSettings) -> Self {
        Self { chain_id, version, gas_settings }
    }

    pub fn append_elements(&self, target: &mut Vec<Felt>) {
        target.push(self.chain_id);
        target.push(self.version);
        target.extend_from_slice(&self.gas_settings.to_elements());
    }
}

impl Serializable for TxContext {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.chain_id.write_into(target);
        self.version.write_into(target);
        self.gas_settings.write_into(target);
    }
}

impl Deserializable for TxContext {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let chain_id = Felt::read_from(source)?;
        let version = Felt::read_from(source)?;
        let gas_settings = GasSettings::read_from(source)?;
        Ok(Self { chain_id, version, gas_settings })
    }
}

// HISTORICAL HEADER
// ================================================================================================

/// The subset of the block header a transaction is executed against.
///
/// Settled read requests are proven against the tree roots of this header.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HistoricalHeader {
    pub block_number: u32,
    pub note_hash_tree_root: Digest,
    pub nullifier_tree_root: Digest,
}

impl HistoricalHeader {
    pub fn append_elements(&self, target: &mut Vec<Felt>) {
        target.push(Felt::from(self.block_number));
        target.extend_from_slice(self.note_hash_tree_root.as_elements());
        target.extend_from_slice(self.nullifier_tree_root.as_elements());
    }
}

impl Serializable for HistoricalHeader {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        target.write_u32(self.block_number);
        self.note_hash_tree_root.write_into(target);
        self.nullifier_tree_root.write_into(target);
    }
}

impl Deserializable for HistoricalHeader {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let block_number = source.read_u32()?;
        let note_hash_tree_root = Digest::read_from(source)?;
        let nullifier_tree_root = Digest::read_from(source)?;
        Ok(Self {
            block_number,
            note_hash_tree_root,
            nullifier_tree_root,
        })
    }
}

// TRANSACTION CONSTANTS
// ================================================================================================

/// Values carried unchanged from the first kernel iteration to the final public inputs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TxConstants {
    pub historical_header: HistoricalHeader,
    pub tx_context: TxContext,
}

impl Serializable for TxConstants {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.historical_header.write_into(target);
        self.tx_context.write_into(target);
    }
}

impl Deserializable for TxConstants {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let historical_header = HistoricalHeader::read_from(source)?;
        let tx_context = TxContext::read_from(source)?;
        Ok(Self { historical_header, tx_context })
    }
}

// ROLLUP VALIDATION REQUESTS
// ================================================================================================

/// Conditions the rollup must check before including the transaction in a block.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RollupValidationRequests {
    /// The highest block number the transaction may be included in.
    pub max_block_number: Option<u32>,
}

impl RollupValidationRequests {
    /// Tightens the maximum block number, keeping the lowest value seen.
    pub fn restrict_max_block_number(&mut self, max_block_number: Option<u32>) {
        self.max_block_number = match (self.max_block_number, max_block_number) {
            (Some(current), Some(new)) => Some(current.min(new)),
            (current, new) => current.or(new),
        };
    }
}

impl Serializable for RollupValidationRequests {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        target.write_bool(self.max_block_number.is_some());
        target.write_u32(self.max_block_number.unwrap_or_default());
    }
}

impl Deserializable for RollupValidationRequests {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let is_some = source.read_bool()?;
        let value = source.read_u32()?;
        Ok(Self { max_block_number: is_some.then_some(value) })
    }
}

// TRANSACTION REQUEST
// ================================================================================================

/// The request a user signs to start a transaction: the entrypoint call and its context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxRequest {
    pub origin: ContractAddress,
    pub function_data: FunctionData,
    pub args_hash: Felt,
    pub tx_context: TxContext,
}

impl TxRequest {
    /// Returns the commitment to this request.
    ///
    /// The hash is emitted as the first nullifier of the transaction, which makes every
    /// transaction unique and seeds the note hash nonces.
    pub fn hash(&self) -> Felt {
        let mut elements = Vec::with_capacity(12);
        elements.push(self.origin.as_felt());
        elements.extend_from_slice(&self.function_data.to_elements());
        elements.push(self.args_hash);
        self.tx_context.append_elements(&mut elements);
        hash_to_felt(DOMAIN_TX_REQUEST, &elements)
    }
}

// TESTS
// ================================================================================================
