use alloc::vec::Vec;

use veil_objects::{
    Felt,
    address::ContractAddress,
    hash::{compute_app_nullifier_secret_key, compute_npk_m_hash},
    side_effect::KeyValidationRequest,
};

use crate::{errors::KeyProviderError, host::SecretKeyProvider};

/// Holds master nullifier secrets of accounts in memory.
#[derive(Debug, Clone, Default)]
pub struct MockKeyStore {
    master_secrets: Vec<Felt>,
}

impl MockKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an account and returns the hash of its master nullifier public key.
    pub fn add_account(&mut self, sk_m: Felt) -> Felt {
        self.master_secrets.push(sk_m);
        compute_npk_m_hash(sk_m)
    }

    pub fn master_secrets(&self) -> &[Felt] {
        &self.master_secrets
    }
}

impl SecretKeyProvider for MockKeyStore {
    fn get_key_validation_request(
        &self,
        npk_m_hash: Felt,
        app: ContractAddress,
    ) -> Result<KeyValidationRequest, KeyProviderError> {
        let sk_m = self
            .master_secrets
            .iter()
            .copied()
            .find(|&sk_m| compute_npk_m_hash(sk_m) == npk_m_hash)
            .ok_or(KeyProviderError::UnknownAccount(npk_m_hash))?;

        Ok(KeyValidationRequest::new(npk_m_hash, compute_app_nullifier_secret_key(sk_m, app)))
    }
}
