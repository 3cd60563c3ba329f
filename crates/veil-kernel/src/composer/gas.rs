use veil_objects::{
    DA_BYTES_PER_FIELD, DA_GAS_PER_BYTE, FIXED_AVM_STARTUP_L2_GAS, FIXED_DA_GAS, FIXED_L2_GAS,
    L2_GAS_PER_LOG_BYTE, L2_GAS_PER_NOTE_HASH, L2_GAS_PER_NULLIFIER,
    gas::Gas,
    kernel::{CombinedAccumulatedData, PublicAccumulatedData},
};

use crate::errors::KernelError;

const DA_GAS_PER_FIELD: u32 = DA_BYTES_PER_FIELD * DA_GAS_PER_BYTE;

// GAS METER
// ================================================================================================

/// Accumulates the gas consumed by the published side effects of a transaction.
///
/// Amounts saturate, and a meter which ever overflowed fails [check_gas_limit] regardless of the
/// limit.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GasMeter {
    used: Gas,
    overflowed: bool,
}

impl GasMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a meter pre-charged with the fixed per-transaction overhead.
    pub fn with_fixed_overhead() -> Self {
        Self {
            used: Gas::new(FIXED_DA_GAS, FIXED_L2_GAS),
            overflowed: false,
        }
    }

    pub fn gas_used(&self) -> Gas {
        self.used
    }

    /// Returns true if any charge exceeded the range of a gas amount.
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    pub fn charge(&mut self, gas: Gas) {
        match self.used.checked_add(gas) {
            Some(used) => self.used = used,
            None => {
                self.used += gas;
                self.overflowed = true;
            },
        }
    }

    /// Charges everything metered by `other`, including its overflow.
    pub fn charge_meter(&mut self, other: &GasMeter) {
        self.charge(other.used);
        self.overflowed |= other.overflowed;
    }

    pub fn charge_note_hashes(&mut self, count: usize) {
        let da_gas = self.per_item(count, DA_GAS_PER_FIELD);
        let l2_gas = self.per_item(count, L2_GAS_PER_NOTE_HASH);
        self.charge(Gas::new(da_gas, l2_gas));
    }

    pub fn charge_nullifiers(&mut self, count: usize) {
        let da_gas = self.per_item(count, DA_GAS_PER_FIELD);
        let l2_gas = self.per_item(count, L2_GAS_PER_NULLIFIER);
        self.charge(Gas::new(da_gas, l2_gas));
    }

    pub fn charge_l2_to_l1_msgs(&mut self, count: usize) {
        let da_gas = self.per_item(count, DA_GAS_PER_FIELD);
        self.charge(Gas::new(da_gas, 0));
    }

    pub fn charge_log_bytes(&mut self, bytes: u32) {
        let da_gas = self.product(bytes, DA_GAS_PER_BYTE);
        let l2_gas = self.product(bytes, L2_GAS_PER_LOG_BYTE);
        self.charge(Gas::new(da_gas, l2_gas));
    }

    pub fn charge_public_calls(&mut self, count: usize) {
        let l2_gas = self.per_item(count, FIXED_AVM_STARTUP_L2_GAS);
        self.charge(Gas::new(0, l2_gas));
    }

    /// Charges every side effect and enqueued call of one half of the public tail output.
    pub fn charge_public_data(&mut self, data: &PublicAccumulatedData) {
        self.charge_note_hashes(data.note_hashes.len());
        self.charge_nullifiers(data.nullifiers.len());
        self.charge_l2_to_l1_msgs(data.l2_to_l1_msgs.len());
        self.charge_log_bytes(data.encrypted_log_preimages_length);
        self.charge_log_bytes(data.unencrypted_log_preimages_length);
        self.charge_public_calls(data.public_call_stack.len());
    }

    /// Charges every side effect of the private tail output.
    pub fn charge_combined_data(&mut self, data: &CombinedAccumulatedData) {
        self.charge_note_hashes(data.note_hashes.len());
        self.charge_nullifiers(data.nullifiers.len());
        self.charge_l2_to_l1_msgs(data.l2_to_l1_msgs.len());
        self.charge_log_bytes(data.encrypted_log_preimages_length);
        self.charge_log_bytes(data.unencrypted_log_preimages_length);
    }

    // HELPERS
    // --------------------------------------------------------------------------------------------

    fn per_item(&mut self, count: usize, cost: u32) -> u32 {
        match u32::try_from(count) {
            Ok(count) => self.product(count, cost),
            Err(_) => {
                self.overflowed = true;
                u32::MAX
            },
        }
    }

    fn product(&mut self, amount: u32, cost: u32) -> u32 {
        amount.checked_mul(cost).unwrap_or_else(|| {
            self.overflowed = true;
            u32::MAX
        })
    }
}

/// Checks that the gas metered by `meter` fits within `limit` in both dimensions.
///
/// # Errors
/// Returns an error if:
/// - Any charge of the meter overflowed.
/// - Either dimension of the metered gas exceeds the limit.
pub fn check_gas_limit(meter: &GasMeter, limit: Gas) -> Result<(), KernelError> {
    if meter.overflowed {
        return Err(KernelError::GasOverflow { limit });
    }
    let used = meter.used;
    if !used.within(&limit) {
        return Err(KernelError::GasLimitExceeded { used, limit });
    }
    Ok(())
}

// TESTS
// ================================================================================================

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn side_effects_are_charged_per_item() {
        let mut meter = GasMeter::with_fixed_overhead();
        meter.charge_note_hashes(3);
        meter.charge_nullifiers(2);
        meter.charge_log_bytes(10);
        meter.charge_public_calls(1);

        assert_eq!(meter.gas_used(), Gas::new(512 + 5 * 512 + 160, 512 + 96 + 128 + 40 + 1024));
        assert!(!meter.overflowed());
    }

    #[test]
    fn more_side_effects_never_cost_less() {
        let mut previous = GasMeter::new().gas_used();
        for count in 1..8 {
            let mut meter = GasMeter::new();
            meter.charge_note_hashes(count);
            meter.charge_nullifiers(count);
            let used = meter.gas_used();
            assert!(previous.within(&used));
            previous = used;
        }
    }

    #[test]
    fn limit_is_inclusive() {
        let mut meter = GasMeter::new();
        meter.charge(Gas::new(3072, 700));

        check_gas_limit(&meter, Gas::new(3072, 700)).unwrap();
        assert_matches!(
            check_gas_limit(&meter, Gas::new(2560, 700)),
            Err(KernelError::GasLimitExceeded { .. })
        );
    }

    #[test]
    fn overflowing_charges_exceed_even_the_largest_limit() {
        let largest = Gas::new(u32::MAX, u32::MAX);

        let mut meter = GasMeter::new();
        meter.charge_log_bytes(u32::MAX);
        meter.charge_log_bytes(u32::MAX);
        assert!(meter.overflowed());
        assert_matches!(check_gas_limit(&meter, largest), Err(KernelError::GasOverflow { .. }));

        // an overflow also carries over when meters are combined
        let mut total = GasMeter::with_fixed_overhead();
        let mut half = GasMeter::new();
        half.charge(Gas::new(u32::MAX, 0));
        half.charge(Gas::new(1, 0));
        total.charge_meter(&half);
        assert_matches!(check_gas_limit(&total, largest), Err(KernelError::GasOverflow { .. }));
    }
}
