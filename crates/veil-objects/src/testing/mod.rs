use alloc::vec::Vec;

use rand::{Rng, SeedableRng, rngs::SmallRng};

use crate::{
    Felt,
    address::ContractAddress,
    gas::{Gas, GasFees, GasSettings},
    transaction::{HistoricalHeader, TxConstants, TxContext},
};

pub const CHAIN_ID: u64 = 31337;
pub const PROTOCOL_VERSION: u64 = 1;

/// Returns a deterministic non-zero address.
pub fn dummy_address(n: u64) -> ContractAddress {
    ContractAddress::new(Felt::new(0xc0de_0000 + n))
}

/// Returns `n` pseudo-random field elements derived from `seed`.
pub fn random_felts(seed: u64, n: usize) -> Vec<Felt> {
    let mut rng = SmallRng::seed_from_u64(seed);
    (0..n).map(|_| Felt::new(rng.random::<u64>())).collect()
}

/// Gas settings generous enough for any transaction built in tests.
pub fn generous_gas_settings() -> GasSettings {
    GasSettings::new(Gas::new(1_000_000, 1_000_000), Gas::new(1_000, 1_000), GasFees::new(1, 1))
}

pub fn tx_context(gas_settings: GasSettings) -> TxContext {
    TxContext::new(Felt::new(CHAIN_ID), Felt::new(PROTOCOL_VERSION), gas_settings)
}

pub fn tx_constants(gas_settings: GasSettings) -> TxConstants {
    TxConstants {
        historical_header: HistoricalHeader { block_number: 10, ..Default::default() },
        tx_context: tx_context(gas_settings),
    }
}
