use core::{
    fmt::{Display, Formatter},
    ops::{Add, AddAssign},
};

use crate::{
    Felt,
    utils::serde::{ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable},
};

// GAS
// ================================================================================================

/// An amount of gas in both metered dimensions.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Gas {
    pub da_gas: u32,
    pub l2_gas: u32,
}

impl Gas {
    pub const fn new(da_gas: u32, l2_gas: u32) -> Self {
        Self { da_gas, l2_gas }
    }

    pub const fn empty() -> Self {
        Self { da_gas: 0, l2_gas: 0 }
    }

    /// Adds two amounts, returning `None` if either dimension overflows.
    pub fn checked_add(self, other: Self) -> Option<Self> {
        Some(Self {
            da_gas: self.da_gas.checked_add(other.da_gas)?,
            l2_gas: self.l2_gas.checked_add(other.l2_gas)?,
        })
    }

    /// Returns true if neither dimension exceeds the corresponding dimension of `limits`.
    pub fn within(&self, limits: &Gas) -> bool {
        self.da_gas <= limits.da_gas && self.l2_gas <= limits.l2_gas
    }

    pub fn to_elements(&self) -> [Felt; 2] {
        [Felt::from(self.da_gas), Felt::from(self.l2_gas)]
    }
}

impl Add for Gas {
    type Output = Gas;

    /// Saturates on overflow. Use [Gas::checked_add] where overflow must be detected.
    fn add(self, other: Self) -> Self::Output {
        Self {
            da_gas: self.da_gas.saturating_add(other.da_gas),
            l2_gas: self.l2_gas.saturating_add(other.l2_gas),
        }
    }
}

impl AddAssign for Gas {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Display for Gas {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "(da: {}, l2: {})", self.da_gas, self.l2_gas)
    }
}

impl Serializable for Gas {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        target.write_u32(self.da_gas);
        target.write_u32(self.l2_gas);
    }
}

impl Deserializable for Gas {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let da_gas = source.read_u32()?;
        let l2_gas = source.read_u32()?;
        Ok(Self { da_gas, l2_gas })
    }
}

// GAS FEES
// ================================================================================================

/// Fee paid per unit of gas in each dimension.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GasFees {
    pub fee_per_da_gas: u64,
    pub fee_per_l2_gas: u64,
}

impl GasFees {
    pub const fn new(fee_per_da_gas: u64, fee_per_l2_gas: u64) -> Self {
        Self { fee_per_da_gas, fee_per_l2_gas }
    }
}

// GAS SETTINGS
// ================================================================================================

/// Gas configuration chosen by the sender of a transaction.
///
/// `gas_limits` bounds the total gas of the transaction, including the gas reserved for the
/// public teardown phase through `teardown_gas_limits`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GasSettings {
    pub gas_limits: Gas,
    pub teardown_gas_limits: Gas,
    pub max_fees_per_gas: GasFees,
}

impl GasSettings {
    pub fn new(gas_limits: Gas, teardown_gas_limits: Gas, max_fees_per_gas: GasFees) -> Self {
        Self { gas_limits, teardown_gas_limits, max_fees_per_gas }
    }

    pub fn to_elements(&self) -> [Felt; 6] {
        let [limit_da, limit_l2] = self.gas_limits.to_elements();
        let [teardown_da, teardown_l2] = self.teardown_gas_limits.to_elements();
        [
            limit_da,
            limit_l2,
            teardown_da,
            teardown_l2,
            Felt::new(self.max_fees_per_gas.fee_per_da_gas),
            Felt::new(self.max_fees_per_gas.fee_per_l2_gas),
        ]
    }
}

impl Serializable for GasSettings {
    fn write_into<W: ByteWriter>(&self, target: &mut W) {
        self.gas_limits.write_into(target);
        self.teardown_gas_limits.write_into(target);
        target.write_u64(self.max_fees_per_gas.fee_per_da_gas);
        target.write_u64(self.max_fees_per_gas.fee_per_l2_gas);
    }
}

impl Deserializable for GasSettings {
    fn read_from<R: ByteReader>(source: &mut R) -> Result<Self, DeserializationError> {
        let gas_limits = Gas::read_from(source)?;
        let teardown_gas_limits = Gas::read_from(source)?;
        let fee_per_da_gas = source.read_u64()?;
        let fee_per_l2_gas = source.read_u64()?;
        Ok(Self {
            gas_limits,
            teardown_gas_limits,
            max_fees_per_gas: GasFees::new(fee_per_da_gas, fee_per_l2_gas),
        })
    }
}

// TESTS
// ================================================================================================
