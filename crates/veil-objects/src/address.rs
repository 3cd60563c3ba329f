//! Contract identity: addresses, class ids and the preimages they are derived from.
//!
//! A contract address is never trusted as supplied. It is re-derived as:
//!
//! > address = hash(public_keys_hash, partial_address)
//! > partial_address = hash(class_id, salted_initialization_hash)
//! > class_id = hash(artifact_hash, private_functions_root, public_bytecode_commitment)
//! > salted_initialization_hash = hash(salt, initialization_hash, deployer)

use core::fmt::{Display, Formatter};

use crate::{
    DOMAIN_CONTRACT_ADDRESS, DOMAIN_CONTRACT_CLASS_ID, DOMAIN_FUNCTION_LEAF,
    DOMAIN_PARTIAL_ADDRESS, DOMAIN_PUBLIC_KEYS, DOMAIN_SALTED_INITIALIZATION_HASH, Digest, Felt,
    Hasher, ZERO,
    hash::{hash_to_felt, hash_with_domain},
    utils::serde::{ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable},
};

// CONTRACT ADDRESS
// ================================================================================================

/// The address of a deployed contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractAddress(Felt);

impl ContractAddress {
    /// The empty address.
    pub const ZERO: Self = Self(ZERO);

    pub const fn new(value: Felt) -> Self {
        Self(value)
    }

    /// Derives a contract address from its public keys and partial address.
    pub fn compute(public_keys_hash: PublicKeysHash, partial_address: PartialAddress) -> Self {
        Self(hash_to_felt(
            DOMAIN_CONTRACT_ADDRESS,
            &[public_keys_hash.as_felt(), partial_address.as_felt()],
        ))
    }

    pub fn as_felt(&self) -> Felt {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == ZERO
    }
}

impl Default for ContractAddress {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Display for ContractAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:#018x}", self.0.as_int())
    }
}

impl Serializable for ContractAddress {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.0.write_into(target);
    }
}

impl Deserializable for ContractAddress {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        Ok(Self(Felt::read_from(source)?))
    }
}

// FUNCTION SELECTOR
// ================================================================================================

/// Identifies a function within a contract.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FunctionSelector(u32);

impl FunctionSelector {
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Derives a selector from a function signature such as `transfer(Field,Field)`.
    pub fn from_signature(signature: &str) -> Self {
        let digest = Hasher::hash(signature.as_bytes());
        Self(digest.as_elements()[0].as_int() as u32)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }

    pub fn as_felt(&self) -> Felt {
        Felt::from(self.0)
    }
}

impl Display for FunctionSelector {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

// FUNCTION DATA
// ================================================================================================

/// The execution environment a function runs in.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    #[default]
    Private,
    /// A public function executed by the sequencer.
    Public,
    /// A public function executed by the public VM.
    Avm,
}

impl FunctionKind {
    pub fn is_private(&self) -> bool {
        matches!(self, Self::Private)
    }

    fn as_u8(&self) -> u8 {
        match self {
            Self::Private => 0,
            Self::Public => 1,
            Self::Avm => 2,
        }
    }
}

impl TryFrom<u8> for FunctionKind {
    type Error = DeserializationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Private),
            1 => Ok(Self::Public),
            2 => Ok(Self::Avm),
            other => {
                Err(DeserializationError::InvalidValue(format!("unknown function kind {other}")))
            },
        }
    }
}

/// The selector and kind of a called function.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FunctionData {
    pub selector: FunctionSelector,
    pub kind: FunctionKind,
}

impl FunctionData {
    pub fn new(selector: FunctionSelector, kind: FunctionKind) -> Self {
        Self { selector, kind }
    }

    pub fn to_elements(&self) -> [Felt; 2] {
        [self.selector.as_felt(), Felt::from(self.kind.as_u8())]
    }
}

impl Serializable for FunctionData {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        target.write_u32(self.selector.as_u32());
        target.write_u8(self.kind.as_u8());
    }
}

impl Deserializable for FunctionData {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let selector = FunctionSelector::new(source.read_u32()?);
        let kind = FunctionKind::try_from(source.read_u8()?)?;
        Ok(Self { selector, kind })
    }
}

/// Returns the leaf of a contract class's private function tree for the given function.
pub fn compute_function_leaf(selector: FunctionSelector, vk_hash: Digest) -> Digest {
    let mut elements = [ZERO; 5];
    elements[0] = selector.as_felt();
    elements[1..].copy_from_slice(vk_hash.as_elements());
    hash_with_domain(DOMAIN_FUNCTION_LEAF, &elements)
}

// CONTRACT CLASS
// ================================================================================================

/// Identifies the code of a contract, independently of any deployment.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ContractClassId(Felt);

impl ContractClassId {
    pub fn compute(
        artifact_hash: Felt,
        private_functions_root: Digest,
        public_bytecode_commitment: Felt,
    ) -> Self {
        let mut elements = [ZERO; 6];
        elements[0] = artifact_hash;
        elements[1..5].copy_from_slice(private_functions_root.as_elements());
        elements[5] = public_bytecode_commitment;
        Self(hash_to_felt(DOMAIN_CONTRACT_CLASS_ID, &elements))
    }

    pub fn as_felt(&self) -> Felt {
        self.0
    }
}

/// The preimage of a [ContractClassId] except for the private function tree root, which the
/// kernel recomputes from a function membership path.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ContractClass {
    pub artifact_hash: Felt,
    pub public_bytecode_commitment: Felt,
}

impl ContractClass {
    /// Returns the class id of this class given the root of its private function tree.
    pub fn id(&self, private_functions_root: Digest) -> ContractClassId {
        ContractClassId::compute(
            self.artifact_hash,
            private_functions_root,
            self.public_bytecode_commitment,
        )
    }
}

// DEPLOYMENT
// ================================================================================================

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SaltedInitializationHash(Felt);

impl SaltedInitializationHash {
    pub fn compute(salt: Felt, initialization_hash: Felt, deployer: ContractAddress) -> Self {
        Self(hash_to_felt(
            DOMAIN_SALTED_INITIALIZATION_HASH,
            &[salt, initialization_hash, deployer.as_felt()],
        ))
    }

    pub fn as_felt(&self) -> Felt {
        self.0
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PartialAddress(Felt);

impl PartialAddress {
    pub fn compute(class_id: ContractClassId, salted: SaltedInitializationHash) -> Self {
        Self(hash_to_felt(DOMAIN_PARTIAL_ADDRESS, &[class_id.as_felt(), salted.as_felt()]))
    }

    pub fn as_felt(&self) -> Felt {
        self.0
    }
}

/// Hashes of the master public keys of an account.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PublicKeys {
    pub npk_m_hash: Felt,
    pub ivpk_m_hash: Felt,
    pub ovpk_m_hash: Felt,
    pub tpk_m_hash: Felt,
}

impl PublicKeys {
    pub fn hash(&self) -> PublicKeysHash {
        PublicKeysHash(hash_to_felt(
            DOMAIN_PUBLIC_KEYS,
            &[self.npk_m_hash, self.ivpk_m_hash, self.ovpk_m_hash, self.tpk_m_hash],
        ))
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PublicKeysHash(Felt);

impl PublicKeysHash {
    pub const fn new(value: Felt) -> Self {
        Self(value)
    }

    pub fn as_felt(&self) -> Felt {
        self.0
    }
}

/// Everything needed to re-derive the address of a deployed contract, given the root of its
/// class's private function tree.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ContractInstance {
    pub class: ContractClass,
    pub salt: Felt,
    pub initialization_hash: Felt,
    pub deployer: ContractAddress,
    pub public_keys_hash: PublicKeysHash,
}

impl ContractInstance {
    /// Derives the address of this instance.
    pub fn address(&self, private_functions_root: Digest) -> ContractAddress {
        let class_id = self.class.id(private_functions_root);
        let salted =
            SaltedInitializationHash::compute(self.salt, self.initialization_hash, self.deployer);
        ContractAddress::compute(self.public_keys_hash, PartialAddress::compute(class_id, salted))
    }
}

// TESTS
// ================================================================================================
