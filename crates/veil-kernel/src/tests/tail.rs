use assert_matches::assert_matches;
use veil_objects::{
    Felt, ZERO,
    gas::{Gas, GasFees, GasSettings},
    hash::{compute_note_nullifier, compute_unique_siloed_note_hash, silo_nullifier},
    kernel::PrivateKernelCircuitPublicInputs,
    testing::{dummy_address, generous_gas_settings, tx_context},
    transaction::{HistoricalHeader, TxConstants, TxRequest},
};

use super::{ENTRYPOINT, HELPER, PUBLIC_FN, accumulate, execute, executor, executor_with_gas, kernel};
use crate::{
    TailHints, TailHintsBuilder, TailWitnesses,
    composer::{note_hash_leaf, nullifier_leaf},
    errors::{KernelError, TransientError},
    testing::{MockContract, MockExecutor, MockKeyStore, MockTree},
};

/// Runs every kernel iteration and builds honest tail hints.
fn prepare(
    executor: &mut MockExecutor,
    entry: &MockContract,
    witnesses: &TailWitnesses,
) -> (TxRequest, PrivateKernelCircuitPublicInputs, TailHints) {
    let (tx_request, trace) = execute(executor, entry, &[]);
    let previous = accumulate(&tx_request, &trace).unwrap();
    let hints = TailHintsBuilder::new(witnesses).build(&previous).unwrap();
    (tx_request, previous, hints)
}

/// Creates two notes, nullifies the first one and emits one more nullifier.
fn transient_note_contract() -> MockContract {
    MockContract::builder(1)
        .with_function(ENTRYPOINT, |context, _, _| {
            context.push_note_hash(Felt::new(10))?;
            context.push_note_hash(Felt::new(11))?;
            context.push_nullifier(Felt::new(21), Felt::new(10))?;
            context.push_nullifier(Felt::new(22), ZERO)
        })
        .build()
}

// PRIVATE TAIL
// ================================================================================================

#[test]
fn tail_squashes_and_silos_side_effects() -> anyhow::Result<()> {
    let entry = transient_note_contract();
    let mut executor = executor([entry.clone()]);
    let (tx_request, previous, hints) = prepare(&mut executor, &entry, &TailWitnesses::new());

    let output = kernel().tail(previous, &hints)?;

    let first_nullifier = tx_request.hash();
    let address = entry.address();
    assert_eq!(
        output.end.note_hashes,
        [compute_unique_siloed_note_hash(address, Felt::new(11), first_nullifier, 0)]
    );
    assert_eq!(output.end.nullifiers, [first_nullifier, silo_nullifier(address, Felt::new(22))]);

    // one note hash and two nullifiers on top of the fixed overhead
    assert_eq!(output.end.gas_used, Gas::new(3 * 512 + 512, 32 + 2 * 64 + 512));

    Ok(())
}

#[test]
fn tail_squashes_a_delegated_note_nullified_by_the_caller() -> anyhow::Result<()> {
    let library = MockContract::builder(2)
        .with_function(HELPER, |context, _, _| context.push_note_hash(Felt::new(40)))
        .build();
    let library_address = library.address();
    let entry = MockContract::builder(1)
        .with_function(ENTRYPOINT, move |context, executor, _| {
            context.delegate_call_private_function(executor, library_address, HELPER, &[])?;
            context.push_nullifier(Felt::new(41), Felt::new(40))
        })
        .build();
    let mut executor = executor([entry.clone(), library]);
    let (tx_request, previous, hints) = prepare(&mut executor, &entry, &TailWitnesses::new());

    // the entry frame is processed first, so the link is made once the library frame arrives
    let nullifier_counter = previous.end.nullifiers[1].inner.counter;
    assert_eq!(previous.end.note_hashes[0].inner.nullifier_counter, nullifier_counter);

    let output = kernel().tail(previous, &hints)?;
    assert!(output.end.note_hashes.is_empty());
    assert_eq!(output.end.nullifiers, [tx_request.hash()]);

    Ok(())
}

#[test]
fn tail_rejects_a_note_hash_claiming_an_unknown_nullifier() {
    let entry = transient_note_contract();
    let mut executor = executor([entry.clone()]);
    let (tx_request, trace) = execute(&mut executor, &entry, &[]);
    let mut previous = accumulate(&tx_request, &trace).unwrap();

    // the second note is never nullified
    previous.end.note_hashes[1].inner.nullifier_counter = 99;
    let hints = TailHintsBuilder::new(&TailWitnesses::new()).build(&previous).unwrap();

    assert_matches!(
        kernel().tail(previous, &hints),
        Err(KernelError::TransientResolution(TransientError::DanglingNoteHash(1)))
    );
}

#[test]
fn tail_output_is_ordered_by_counter() -> anyhow::Result<()> {
    let helper = MockContract::builder(2)
        .with_function(HELPER, |context, _, _| context.push_note_hash(Felt::new(20)))
        .build();
    let helper_address = helper.address();
    let entry = MockContract::builder(1)
        .with_function(ENTRYPOINT, move |context, executor, _| {
            context.call_private_function(executor, helper_address, HELPER, &[])?;
            context.push_note_hash(Felt::new(10))?;
            context.emit_encrypted_log_hash(Felt::new(30), 100)?;
            context.emit_unencrypted_log_hash(Felt::new(31), 8)
        })
        .build();
    let mut executor = executor([entry.clone(), helper]);
    let (tx_request, previous, hints) = prepare(&mut executor, &entry, &TailWitnesses::new());

    // the entry frame is processed first but its note hash comes after the helper's
    assert_eq!(previous.end.note_hashes[0].contract_address, entry.address());

    let output = kernel().tail(previous, &hints)?;
    let first_nullifier = tx_request.hash();
    assert_eq!(
        output.end.note_hashes,
        [
            compute_unique_siloed_note_hash(helper_address, Felt::new(20), first_nullifier, 0),
            compute_unique_siloed_note_hash(entry.address(), Felt::new(10), first_nullifier, 1),
        ]
    );
    assert_eq!(output.end.encrypted_log_preimages_length, 100);
    assert_eq!(output.end.unencrypted_log_preimages_length, 8);

    Ok(())
}

#[test]
fn tail_rejects_tampered_sorting() {
    let entry = transient_note_contract();
    let mut executor = executor([entry.clone()]);
    let (_, previous, mut hints) = prepare(&mut executor, &entry, &TailWitnesses::new());

    hints.sorted_note_hashes.sorted.swap(0, 1);
    assert_matches!(
        kernel().tail(previous, &hints),
        Err(KernelError::SortIntegrity { name: "note hashes", .. })
    );
}

#[test]
fn tail_rejects_tampered_transient_hints() {
    let entry = transient_note_contract();
    let mut executor = executor([entry.clone()]);
    let (_, previous, hints) = prepare(&mut executor, &entry, &TailWitnesses::new());

    // sorted nullifiers are [protocol, 21, 22]; 21 nullifies the first note hash
    assert_eq!(hints.transient_links, [None, Some(0), None]);

    let mut unlinked = hints.clone();
    unlinked.transient_links[1] = None;
    assert_matches!(
        kernel().tail(previous.clone(), &unlinked),
        Err(KernelError::TransientResolution(TransientError::MissingLink { nullifier_index: 1 }))
    );

    let mut unsquashed = hints;
    unsquashed.squashed_note_hashes = unsquashed.sorted_note_hashes.sorted.clone();
    assert_matches!(
        kernel().tail(previous, &unsquashed),
        Err(KernelError::TransientResolution(TransientError::SquashedArrayMismatch(
            "note hashes"
        )))
    );
}

#[test]
fn tail_enforces_gas_limits() -> anyhow::Result<()> {
    let entry = MockContract::builder(1)
        .with_function(ENTRYPOINT, |context, _, _| {
            for value in 1..=3 {
                context.push_note_hash(Felt::new(value))?;
            }
            context.push_nullifier(Felt::new(40), ZERO)
        })
        .build();
    // three note hashes and two nullifiers, the protocol one included, on top of the fixed overhead
    let da_gas_used = 512 + 5 * 512;
    let l2_gas_used = 512 + 3 * 32 + 2 * 64;
    let gas_settings = |da_limit| {
        GasSettings::new(Gas::new(da_limit, 1_000_000), Gas::new(0, 0), GasFees::new(1, 1))
    };

    let mut executor = executor_with_gas([entry.clone()], gas_settings(da_gas_used - 512));
    let (_, previous, hints) = prepare(&mut executor, &entry, &TailWitnesses::new());
    assert_matches!(
        kernel().tail(previous, &hints),
        Err(KernelError::GasLimitExceeded { used, .. }) if used.da_gas == da_gas_used
    );

    let mut executor = executor_with_gas([entry.clone()], gas_settings(da_gas_used));
    let (_, previous, hints) = prepare(&mut executor, &entry, &TailWitnesses::new());
    let output = kernel().tail(previous, &hints)?;
    assert_eq!(output.end.gas_used, Gas::new(da_gas_used, l2_gas_used));
    assert_eq!(output.end.nullifiers.len(), 2);

    Ok(())
}

#[test]
fn tail_requires_every_private_call_to_be_processed() -> anyhow::Result<()> {
    let helper = MockContract::builder(2)
        .with_function(HELPER, |context, _, _| context.push_note_hash(Felt::new(20)))
        .build();
    let helper_address = helper.address();
    let entry = MockContract::builder(1)
        .with_function(ENTRYPOINT, move |context, executor, _| {
            context.call_private_function(executor, helper_address, HELPER, &[])?;
            Ok(())
        })
        .build();
    let mut executor = executor([entry.clone(), helper]);
    let (tx_request, trace) = execute(&mut executor, &entry, &[]);

    let previous = kernel().init(&tx_request, trace.kernel_order()[0])?;
    let hints = TailHintsBuilder::new(&TailWitnesses::new()).build(&previous)?;
    assert_matches!(kernel().tail(previous, &hints), Err(KernelError::UnprocessedPrivateCalls(1)));

    Ok(())
}

// READ REQUESTS AND KEYS
// ================================================================================================

#[test]
fn pending_read_requests_are_resolved() -> anyhow::Result<()> {
    let entry = MockContract::builder(1)
        .with_function(ENTRYPOINT, |context, _, _| {
            context.push_note_hash(Felt::new(10))?;
            context.push_note_hash_read_request(Felt::new(10))?;
            context.push_nullifier(Felt::new(21), ZERO)?;
            context.push_nullifier_read_request(Felt::new(21))
        })
        .build();
    let mut executor = executor([entry.clone()]);
    let (_, previous, hints) = prepare(&mut executor, &entry, &TailWitnesses::new());

    kernel().tail(previous, &hints)?;

    Ok(())
}

#[test]
fn reads_of_values_created_later_are_unresolved() {
    let entry = MockContract::builder(1)
        .with_function(ENTRYPOINT, |context, _, _| {
            context.push_note_hash_read_request(Felt::new(10))?;
            context.push_note_hash(Felt::new(10))
        })
        .build();
    let mut executor = executor([entry.clone()]);
    let (tx_request, trace) = execute(&mut executor, &entry, &[]);
    let previous = accumulate(&tx_request, &trace).unwrap();

    assert_matches!(
        TailHintsBuilder::new(&TailWitnesses::new()).build(&previous),
        Err(KernelError::ReadRequestUnresolved { name: "note hash", index: 0 })
    );
}

#[test]
fn settled_read_requests_are_proven_against_the_header() -> anyhow::Result<()> {
    let entry = MockContract::builder(1)
        .with_function(ENTRYPOINT, |context, _, _| {
            context.push_note_hash_read_request(Felt::new(501))?;
            context.push_nullifier_read_request(Felt::new(77))
        })
        .build();

    let note_hash_tree =
        MockTree::new(vec![note_hash_leaf(Felt::new(500)), note_hash_leaf(Felt::new(501))]);
    let nullifier_tree = MockTree::new(vec![nullifier_leaf(entry.address(), Felt::new(77))]);
    let constants = TxConstants {
        historical_header: HistoricalHeader {
            block_number: 10,
            note_hash_tree_root: note_hash_tree.root(),
            nullifier_tree_root: nullifier_tree.root(),
        },
        tx_context: tx_context(generous_gas_settings()),
    };
    let mut executor = MockExecutor::new(constants).with_contract(entry.clone());

    let witnesses = TailWitnesses::new()
        .with_settled_note_hash(Felt::new(501), note_hash_tree.witness(1))
        .with_settled_nullifier(entry.address(), Felt::new(77), nullifier_tree.witness(0));
    let (_, previous, hints) = prepare(&mut executor, &entry, &witnesses);
    kernel().tail(previous, &hints)?;

    // a witness for another leaf does not prove the read
    let witnesses = TailWitnesses::new()
        .with_settled_note_hash(Felt::new(501), note_hash_tree.witness(0))
        .with_settled_nullifier(entry.address(), Felt::new(77), nullifier_tree.witness(0));
    let (_, previous, hints) = prepare(&mut executor, &entry, &witnesses);
    assert_matches!(
        kernel().tail(previous, &hints),
        Err(KernelError::ReadRequestUnresolved { name: "note hash", index: 0 })
    );

    Ok(())
}

#[test]
fn key_validation_requests_are_checked() -> anyhow::Result<()> {
    let sk_m = Felt::new(4242);
    let mut keys = MockKeyStore::new();
    let npk_m_hash = keys.add_account(sk_m);

    let entry = MockContract::builder(1)
        .with_function(ENTRYPOINT, move |context, _, _| {
            let sk_app = context.request_nsk_app(&keys, npk_m_hash)?;
            context.push_nullifier(compute_note_nullifier(Felt::new(9), sk_app), ZERO)
        })
        .build();
    let mut executor = executor([entry.clone()]);

    let witnesses = TailWitnesses::new().with_master_secret(sk_m);
    let (_, previous, hints) = prepare(&mut executor, &entry, &witnesses);
    kernel().tail(previous.clone(), &hints)?;

    let mut forged = hints;
    forged.key_validation_hints[0] = Felt::new(1);
    assert_matches!(
        kernel().tail(previous.clone(), &forged),
        Err(KernelError::KeyValidationFailed { index: 0 })
    );

    assert_matches!(
        TailHintsBuilder::new(&TailWitnesses::new()).build(&previous),
        Err(KernelError::KeyValidationFailed { index: 0 })
    );

    Ok(())
}

// PUBLIC TAIL
// ================================================================================================

#[test]
fn tail_to_public_splits_at_the_end_of_setup() -> anyhow::Result<()> {
    let entry = MockContract::builder(1)
        .with_function(ENTRYPOINT, |context, executor, _| {
            context.push_note_hash(Felt::new(10))?;
            context.call_public_function(executor, dummy_address(50), PUBLIC_FN, &[])?;
            context.end_setup()?;
            context.push_note_hash(Felt::new(11))?;
            context.call_public_function(executor, dummy_address(51), PUBLIC_FN, &[])?;
            context.push_nullifier(Felt::new(22), ZERO)
        })
        .build();
    let mut executor = executor([entry.clone()]);
    let (tx_request, previous, hints) = prepare(&mut executor, &entry, &TailWitnesses::new());
    assert_eq!(previous.min_revertible_side_effect_counter, 4);

    let output = kernel().tail_to_public(previous, &hints)?;
    let non_revertible = &output.end_non_revertible;
    let revertible = &output.end;

    assert_eq!(non_revertible.note_hashes.len(), 1);
    assert_eq!(non_revertible.note_hashes[0].counter, 2);
    assert_eq!(non_revertible.nullifiers[0].value, tx_request.hash());
    assert_eq!(non_revertible.public_call_stack[0].start_side_effect_counter, 3);

    assert_eq!(revertible.note_hashes[0].counter, 4);
    assert_eq!(revertible.public_call_stack[0].start_side_effect_counter, 5);
    assert_eq!(revertible.nullifiers[0].counter, 6);

    // fixed overhead is non-revertible, teardown gas is reserved in the revertible half
    assert_eq!(non_revertible.gas_used, Gas::new(512 + 512 + 512, 512 + 32 + 64 + 1024));
    assert_eq!(revertible.gas_used, Gas::new(1_000 + 512 + 512, 1_000 + 32 + 64 + 1024));

    Ok(())
}

#[test]
fn without_end_of_setup_everything_is_revertible() -> anyhow::Result<()> {
    let entry = MockContract::builder(1)
        .with_function(ENTRYPOINT, |context, executor, _| {
            context.push_note_hash(Felt::new(10))?;
            context.call_public_function(executor, dummy_address(50), PUBLIC_FN, &[])
        })
        .build();
    let mut executor = executor([entry.clone()]);
    let (_, previous, hints) = prepare(&mut executor, &entry, &TailWitnesses::new());

    let output = kernel().tail_to_public(previous, &hints)?;
    assert_eq!(output.end_non_revertible.nullifiers.len(), 1);
    assert!(output.end_non_revertible.note_hashes.is_empty());
    assert!(output.end_non_revertible.public_call_stack.is_empty());
    assert_eq!(output.end.note_hashes.len(), 1);
    assert_eq!(output.end.public_call_stack.len(), 1);

    Ok(())
}

#[test]
fn tails_match_the_shape_of_the_transaction() {
    let private_only = MockContract::builder(1)
        .with_function(ENTRYPOINT, |context, _, _| context.push_note_hash(Felt::new(1)))
        .build();
    let mut private_executor = executor([private_only.clone()]);
    let (_, previous, hints) = prepare(&mut private_executor, &private_only, &TailWitnesses::new());
    assert_matches!(kernel().tail_to_public(previous, &hints), Err(KernelError::NoPublicCalls));

    let with_public_call = MockContract::builder(1)
        .with_function(ENTRYPOINT, |context, executor, _| {
            context.call_public_function(executor, dummy_address(50), PUBLIC_FN, &[])
        })
        .build();
    let mut public_executor = executor([with_public_call.clone()]);
    let (_, previous, hints) = prepare(&mut public_executor, &with_public_call, &TailWitnesses::new());
    assert_matches!(kernel().tail(previous, &hints), Err(KernelError::PublicCallsInPrivateTail(1)));

    let with_teardown = MockContract::builder(1)
        .with_function(ENTRYPOINT, |context, executor, _| {
            context.set_public_teardown_function(executor, dummy_address(50), PUBLIC_FN, &[])
        })
        .build();
    let mut teardown_executor = executor([with_teardown.clone()]);
    let (_, previous, hints) = prepare(&mut teardown_executor, &with_teardown, &TailWitnesses::new());
    assert_matches!(kernel().tail(previous.clone(), &hints), Err(KernelError::TeardownInPrivateTail));

    let output = kernel().tail_to_public(previous, &hints).unwrap();
    assert!(output.end.public_call_stack.is_empty());
    assert_eq!(output.public_teardown_call_request.start_side_effect_counter, 2);
}
