use alloc::vec::Vec;

use veil_objects::{
    Felt, ZERO,
    kernel::{
        CombinedAccumulatedData, KernelCircuitPublicInputs, PrivateKernelCircuitPublicInputs,
        PublicKernelCircuitPublicInputs,
    },
    side_effect::{Empty, LogHash, Ordered, ScopedNullifier, SideEffect},
};

use super::PrivateKernel;
use crate::{
    composer::{
        GasMeter, SiloedData, SortedArray, check_gas_limit, preimages_length,
        silo_l2_to_l1_messages, silo_log_hashes, silo_note_hashes, silo_nullifiers,
        split_to_public, squash_transient_data, verify_key_validation_requests,
        verify_note_hash_read_requests, verify_nullifier_read_requests, verify_sorted,
    },
    context::SideEffectCounter,
    errors::KernelError,
    hints::TailHints,
    host::MembershipOracle,
};

impl<M: MembershipOracle> PrivateKernel<M> {
    // TAILS
    // --------------------------------------------------------------------------------------------

    /// Composes the final public inputs of a transaction without a public phase.
    ///
    /// # Errors
    /// Returns an error if:
    /// - Public calls or a public teardown call were enqueued.
    /// - Private calls were requested but never processed.
    /// - Any hint fails verification.
    /// - The first nullifier of the transaction is zero.
    /// - The transaction consumes more gas than its limits allow.
    pub fn tail(
        &self,
        previous: PrivateKernelCircuitPublicInputs,
        hints: &TailHints,
    ) -> Result<KernelCircuitPublicInputs, KernelError> {
        let num_public_calls = previous.end.public_call_stack.len();
        if num_public_calls != 0 {
            return Err(KernelError::PublicCallsInPrivateTail(num_public_calls));
        }
        if !previous.public_teardown_call_request.is_empty() {
            return Err(KernelError::TeardownInPrivateTail);
        }

        let siloed = self.compose(&previous, hints)?;

        let mut end = CombinedAccumulatedData {
            note_hashes: values(&siloed.note_hashes),
            nullifiers: values(&siloed.nullifiers),
            l2_to_l1_msgs: values(&siloed.l2_to_l1_msgs),
            encrypted_log_preimages_length: preimages_length(&siloed.encrypted_logs_hashes),
            unencrypted_log_preimages_length: preimages_length(&siloed.unencrypted_logs_hashes),
            encrypted_logs_hashes: log_values(&siloed.encrypted_logs_hashes),
            unencrypted_logs_hashes: log_values(&siloed.unencrypted_logs_hashes),
            ..Default::default()
        };

        let mut meter = GasMeter::with_fixed_overhead();
        meter.charge_combined_data(&end);
        end.gas_used = meter.gas_used();
        check_gas_limit(&meter, previous.constants.tx_context.gas_settings.gas_limits)?;

        log::debug!(
            "Composed private transaction [note_hashes={}, nullifiers={}, gas_used={}]",
            end.note_hashes.len(),
            end.nullifiers.len(),
            end.gas_used
        );

        Ok(KernelCircuitPublicInputs {
            constants: previous.constants,
            rollup_validation_requests: previous.validation_requests.for_rollup,
            end,
            fee_payer: previous.fee_payer,
        })
    }

    /// Composes the public inputs handed to the public phase of a transaction.
    ///
    /// Side effects and enqueued calls are split at the min revertible counter. The fixed
    /// transaction overhead is charged to the non-revertible half, and the teardown gas limits
    /// are reserved in the revertible half.
    ///
    /// # Errors
    /// Returns an error if:
    /// - Neither public calls nor a public teardown call were enqueued.
    /// - Private calls were requested but never processed.
    /// - Any hint fails verification.
    /// - The first nullifier of the transaction is zero.
    /// - The transaction consumes more gas than its limits allow.
    pub fn tail_to_public(
        &self,
        previous: PrivateKernelCircuitPublicInputs,
        hints: &TailHints,
    ) -> Result<PublicKernelCircuitPublicInputs, KernelError> {
        if previous.end.public_call_stack.is_empty()
            && previous.public_teardown_call_request.is_empty()
        {
            return Err(KernelError::NoPublicCalls);
        }

        let siloed = self.compose(&previous, hints)?;
        verify_sorted_array(
            "public call requests",
            &previous.end.public_call_stack,
            &hints.sorted_public_call_requests,
        )?;

        let threshold = previous.min_revertible_side_effect_counter.max(SideEffectCounter::FIRST);
        let (mut end_non_revertible, mut end) =
            split_to_public(&siloed, &hints.sorted_public_call_requests.sorted, threshold);

        let gas_settings = previous.constants.tx_context.gas_settings;
        let mut non_revertible_meter = GasMeter::with_fixed_overhead();
        non_revertible_meter.charge_public_data(&end_non_revertible);
        end_non_revertible.gas_used = non_revertible_meter.gas_used();

        let mut revertible_meter = GasMeter::new();
        revertible_meter.charge(gas_settings.teardown_gas_limits);
        revertible_meter.charge_public_data(&end);
        end.gas_used = revertible_meter.gas_used();

        let mut total_meter = non_revertible_meter;
        total_meter.charge_meter(&revertible_meter);
        check_gas_limit(&total_meter, gas_settings.gas_limits)?;

        log::debug!(
            "Composed transaction for the public phase [non_revertible_calls={}, revertible_calls={}, gas_used={}]",
            end_non_revertible.public_call_stack.len(),
            end.public_call_stack.len(),
            total_meter.gas_used()
        );

        Ok(PublicKernelCircuitPublicInputs {
            constants: previous.constants,
            rollup_validation_requests: previous.validation_requests.for_rollup,
            end_non_revertible,
            end,
            public_teardown_call_request: previous.public_teardown_call_request,
            fee_payer: previous.fee_payer,
        })
    }

    // COMPOSITION
    // --------------------------------------------------------------------------------------------

    /// Verifies the hints shared by both tails and returns the squashed, siloed side effects in
    /// side-effect order.
    fn compose(
        &self,
        previous: &PrivateKernelCircuitPublicInputs,
        hints: &TailHints,
    ) -> Result<SiloedData, KernelError> {
        let end = &previous.end;
        let pending_calls = end.private_call_stack.len();
        if pending_calls != 0 {
            return Err(KernelError::UnprocessedPrivateCalls(pending_calls));
        }

        let header = &previous.constants.historical_header;
        let requests = &previous.validation_requests;
        verify_note_hash_read_requests(
            &requests.note_hash_read_requests,
            &end.note_hashes,
            &hints.note_hash_read_request_hints,
            header.note_hash_tree_root,
            &self.oracle,
        )?;
        verify_nullifier_read_requests(
            &requests.nullifier_read_requests,
            &end.nullifiers,
            &hints.nullifier_read_request_hints,
            header.nullifier_tree_root,
            &self.oracle,
        )?;
        verify_key_validation_requests(
            &requests.key_validation_requests,
            &hints.key_validation_hints,
        )?;

        verify_sorted_array("note hashes", &end.note_hashes, &hints.sorted_note_hashes)?;
        verify_sorted_array("nullifiers", &end.nullifiers, &hints.sorted_nullifiers)?;
        verify_sorted_array("L2-to-L1 messages", &end.l2_to_l1_msgs, &hints.sorted_l2_to_l1_msgs)?;
        verify_sorted_array(
            "encrypted log hashes",
            &end.encrypted_logs_hashes,
            &hints.sorted_encrypted_logs_hashes,
        )?;
        verify_sorted_array(
            "unencrypted log hashes",
            &end.unencrypted_logs_hashes,
            &hints.sorted_unencrypted_logs_hashes,
        )?;

        let squashed = squash_transient_data(
            &hints.sorted_note_hashes.sorted,
            &hints.sorted_nullifiers.sorted,
            &hints.transient_links,
            &hints.squashed_note_hashes,
            &hints.squashed_nullifiers,
        )
        .map_err(KernelError::TransientResolution)?;

        let first_nullifier = first_nullifier(&squashed.nullifiers)?;

        log::trace!(
            "Squashed transient data [note_hashes={}, nullifiers={}]",
            squashed.note_hashes.len(),
            squashed.nullifiers.len()
        );

        Ok(SiloedData {
            note_hashes: silo_note_hashes(&squashed.note_hashes, first_nullifier),
            nullifiers: silo_nullifiers(&squashed.nullifiers),
            l2_to_l1_msgs: silo_l2_to_l1_messages(&hints.sorted_l2_to_l1_msgs.sorted),
            encrypted_logs_hashes: silo_log_hashes(&hints.sorted_encrypted_logs_hashes.sorted),
            unencrypted_logs_hashes: silo_log_hashes(&hints.sorted_unencrypted_logs_hashes.sorted),
        })
    }
}

// HELPERS
// ================================================================================================

fn verify_sorted_array<T: Ordered + PartialEq>(
    name: &'static str,
    original: &[T],
    claimed: &SortedArray<T>,
) -> Result<(), KernelError> {
    verify_sorted(original, claimed).map_err(|source| KernelError::SortIntegrity { name, source })
}

/// Returns the value of the first nullifier in side-effect order.
fn first_nullifier(nullifiers: &[ScopedNullifier]) -> Result<Felt, KernelError> {
    match nullifiers.first() {
        Some(nullifier) if nullifier.inner.value != ZERO => Ok(nullifier.inner.value),
        _ => Err(KernelError::ZeroFirstNullifier),
    }
}

fn values(side_effects: &[SideEffect]) -> Vec<Felt> {
    side_effects.iter().map(|side_effect| side_effect.value).collect()
}

fn log_values(logs: &[LogHash]) -> Vec<Felt> {
    logs.iter().map(|log| log.value).collect()
}
