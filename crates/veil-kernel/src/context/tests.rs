use alloc::vec::Vec;

use assert_matches::assert_matches;
use veil_objects::{
    Felt, MAX_NOTE_HASHES_PER_CALL, ZERO,
    address::ContractAddress,
    call::CallContext,
    hash::{compute_app_nullifier_secret_key, hash_args},
    testing::dummy_address,
};

use super::{PrivateContext, SideEffectCounter};
use crate::{
    errors::{CallContextMismatch, ContextError, ExecutorError},
    testing::{MockContract, MockKeyStore},
    tests::{ENTRYPOINT, HELPER, PUBLIC_FN, constants, declared_counters, execute, executor, frames},
};

fn call_context(address: ContractAddress, is_static_call: bool) -> CallContext {
    CallContext {
        msg_sender: dummy_address(99),
        storage_contract_address: address,
        function_selector: ENTRYPOINT,
        is_static_call,
        is_delegate_call: false,
        start_side_effect_counter: 0,
    }
}

fn new_context(counter: &mut SideEffectCounter, call_context: CallContext) -> PrivateContext<'_> {
    let constants = constants();
    PrivateContext::new(
        counter,
        call_context,
        hash_args(&[]),
        constants.historical_header,
        constants.tx_context,
    )
}

fn failed_with<T>(result: Result<T, ExecutorError>) -> ContextError {
    match result {
        Err(ExecutorError::CallFailed { source, .. }) => *source,
        Err(other) => panic!("unexpected executor error: {other}"),
        Ok(_) => panic!("execution succeeded"),
    }
}

// SIDE EFFECTS
// ================================================================================================

#[test]
fn side_effects_consume_consecutive_counters() -> anyhow::Result<()> {
    let mut counter = SideEffectCounter::new();
    let mut context = new_context(&mut counter, call_context(dummy_address(1), false));

    context.push_note_hash(Felt::new(10))?;
    context.push_nullifier(Felt::new(11), ZERO)?;
    context.emit_encrypted_log_hash(Felt::new(12), 40)?;
    context.push_note_hash(Felt::new(13))?;
    let inputs = context.finish()?;

    assert_eq!(inputs.start_side_effect_counter, 1);
    assert_eq!(inputs.note_hashes[0].counter, 2);
    assert_eq!(inputs.nullifiers[0].counter, 3);
    assert_eq!(inputs.encrypted_logs_hashes[0].counter, 4);
    assert_eq!(inputs.note_hashes[1].counter, 5);
    assert_eq!(inputs.end_side_effect_counter, 6);
    assert_eq!(inputs.note_hashes.len(), MAX_NOTE_HASHES_PER_CALL);
    assert_eq!(counter.current(), 7);

    Ok(())
}

#[test]
fn nullifying_a_pending_note_records_the_nullifier_counter() -> anyhow::Result<()> {
    let mut counter = SideEffectCounter::new();
    let mut context = new_context(&mut counter, call_context(dummy_address(1), false));

    context.push_note_hash(Felt::new(10))?;
    context.push_note_hash(Felt::new(10))?;
    context.push_nullifier(Felt::new(21), Felt::new(10))?;
    context.push_nullifier(Felt::new(22), Felt::new(77))?;
    let inputs = context.finish()?;

    // only the first note with the nullified value is consumed
    assert_eq!(inputs.note_hashes[0].nullifier_counter, inputs.nullifiers[0].counter);
    assert_eq!(inputs.nullifiers[0].counter, 4);
    assert!(!inputs.note_hashes[1].is_transient());

    Ok(())
}

#[test]
fn static_context_rejects_state_changes_before_consuming_counters() -> anyhow::Result<()> {
    let mut counter = SideEffectCounter::new();
    let mut context = new_context(&mut counter, call_context(dummy_address(1), true));
    let before = context.side_effect_counter();

    assert_matches!(
        context.push_note_hash(Felt::new(1)),
        Err(ContextError::CallContextMismatch(CallContextMismatch::StaticCallStateChange(_)))
    );
    assert_matches!(
        context.push_nullifier(Felt::new(2), ZERO),
        Err(ContextError::CallContextMismatch(CallContextMismatch::StaticCallStateChange(_)))
    );
    assert_matches!(
        context.emit_unencrypted_log_hash(Felt::new(3), 8),
        Err(ContextError::CallContextMismatch(CallContextMismatch::StaticCallStateChange(_)))
    );
    assert_matches!(
        context.set_as_fee_payer(),
        Err(ContextError::CallContextMismatch(CallContextMismatch::StaticCallStateChange(_)))
    );
    assert_eq!(context.side_effect_counter(), before);

    // reads remain allowed
    context.push_note_hash_read_request(Felt::new(5))?;
    assert_eq!(context.side_effect_counter(), before + 1);

    Ok(())
}

#[test]
fn finished_context_rejects_further_declarations() -> anyhow::Result<()> {
    let mut counter = SideEffectCounter::new();
    let mut context = new_context(&mut counter, call_context(dummy_address(1), false));
    context.finish()?;

    assert_matches!(context.finish(), Err(ContextError::ContextFinalized));
    assert_matches!(context.push_note_hash(Felt::new(1)), Err(ContextError::ContextFinalized));

    Ok(())
}

#[test]
fn note_hashes_are_bounded_per_call() -> anyhow::Result<()> {
    let mut counter = SideEffectCounter::new();
    let mut context = new_context(&mut counter, call_context(dummy_address(1), false));

    for value in 1..=MAX_NOTE_HASHES_PER_CALL as u64 {
        context.push_note_hash(Felt::new(value))?;
    }
    assert_matches!(
        context.push_note_hash(Felt::new(100)),
        Err(ContextError::CapacityExceeded(error)) if error.capacity == MAX_NOTE_HASHES_PER_CALL
    );

    Ok(())
}

#[test]
fn nullifier_keys_are_cached_per_invocation() -> anyhow::Result<()> {
    let mut keys = MockKeyStore::new();
    let alice = keys.add_account(Felt::new(1111));
    let bob = keys.add_account(Felt::new(2222));

    let mut counter = SideEffectCounter::new();
    let mut context = new_context(&mut counter, call_context(dummy_address(1), false));

    let sk_app = context.request_nsk_app(&keys, alice)?;
    assert_eq!(sk_app, compute_app_nullifier_secret_key(Felt::new(1111), dummy_address(1)));
    assert_eq!(context.request_nsk_app(&keys, alice)?, sk_app);
    assert_matches!(
        context.request_nsk_app(&keys, bob),
        Err(ContextError::MultipleKeyRequests { cached, requested }) if cached == alice && requested == bob
    );

    let inputs = context.finish()?;
    assert_eq!(inputs.key_validation_requests[0].sk_app, sk_app);

    Ok(())
}

#[test]
fn unknown_account_keys_are_rejected() {
    let keys = MockKeyStore::new();
    let mut counter = SideEffectCounter::new();
    let mut context = new_context(&mut counter, call_context(dummy_address(1), false));

    assert_matches!(
        context.request_nsk_app(&keys, Felt::new(5)),
        Err(ContextError::KeyProviderFailed(_))
    );
}

// NESTED CALLS
// ================================================================================================

#[test]
fn nested_calls_draw_from_one_counter() {
    let callee = MockContract::builder(2)
        .with_function(HELPER, |context, _, _| {
            context.push_note_hash(Felt::new(20))?;
            context.push_nullifier(Felt::new(21), ZERO)
        })
        .build();
    let callee_address = callee.address();
    let caller = MockContract::builder(1)
        .with_function(ENTRYPOINT, move |context, executor, _| {
            context.push_note_hash(Felt::new(10))?;
            context.call_private_function(executor, callee_address, HELPER, &[Felt::new(7)])?;
            context.push_note_hash(Felt::new(11))?;
            context.call_public_function(executor, dummy_address(50), PUBLIC_FN, &[])
        })
        .build();

    let mut executor = executor([caller.clone(), callee]);
    let (_, trace) = execute(&mut executor, &caller, &[]);
    let frames = frames(&trace);

    let entry = &frames[0].call_stack_item.public_inputs;
    let request = entry.private_call_requests[0];
    assert_eq!(entry.start_side_effect_counter, 1);
    assert_eq!(entry.note_hashes[0].counter, 2);
    assert_eq!((request.start_side_effect_counter, request.end_side_effect_counter), (3, 6));
    assert_eq!(entry.note_hashes[1].counter, 7);
    assert_eq!(entry.public_call_requests[0].start_side_effect_counter, 8);
    assert_eq!(entry.public_call_requests[0].end_side_effect_counter, 8);
    assert_eq!(entry.end_side_effect_counter, 9);

    let mut counters: Vec<u32> = frames.iter().flat_map(declared_counters).collect();
    let total = counters.len();
    counters.sort_unstable();
    counters.dedup();
    assert_eq!(counters.len(), total, "side-effect counters must be unique");
}

#[test]
fn delegate_call_runs_in_caller_storage() {
    let library = MockContract::builder(2)
        .with_function(HELPER, |context, _, _| context.push_note_hash(Felt::new(20)))
        .build();
    let library_address = library.address();
    let caller = MockContract::builder(1)
        .with_function(ENTRYPOINT, move |context, executor, _| {
            context.delegate_call_private_function(executor, library_address, HELPER, &[])?;
            Ok(())
        })
        .build();

    let mut executor = executor([caller.clone(), library]);
    let (_, trace) = execute(&mut executor, &caller, &[]);
    let frames = frames(&trace);

    let delegated = &frames[1].call_stack_item;
    let context = delegated.public_inputs.call_context;
    assert_eq!(delegated.contract_address, library_address);
    assert_eq!(context.storage_contract_address, caller.address());
    assert_eq!(context.msg_sender, ContractAddress::ZERO);
    assert!(context.is_delegate_call);

    let request = frames[0].call_stack_item.public_inputs.private_call_requests[0];
    assert_eq!(request.caller_context.storage_contract_address, caller.address());
}

#[test]
fn static_calls_propagate_to_nested_calls() {
    let leaf = MockContract::builder(3)
        .with_function(HELPER, |context, _, _| context.push_note_hash_read_request(Felt::new(1)))
        .build();
    let leaf_address = leaf.address();
    let middle = MockContract::builder(2)
        .with_function(HELPER, move |context, executor, _| {
            context.call_private_function(executor, leaf_address, HELPER, &[])?;
            Ok(())
        })
        .build();
    let middle_address = middle.address();
    let caller = MockContract::builder(1)
        .with_function(ENTRYPOINT, move |context, executor, _| {
            context.static_call_private_function(executor, middle_address, HELPER, &[])?;
            Ok(())
        })
        .build();

    let mut executor = executor([caller.clone(), middle, leaf]);
    let (_, trace) = execute(&mut executor, &caller, &[]);
    let frames = frames(&trace);

    assert!(!frames[0].call_stack_item.public_inputs.call_context.is_static_call);
    assert!(frames[1].call_stack_item.public_inputs.call_context.is_static_call);
    assert!(frames[2].call_stack_item.public_inputs.call_context.is_static_call);
}

#[test]
fn state_change_under_static_call_fails_the_transaction() {
    let callee = MockContract::builder(2)
        .with_function(HELPER, |context, _, _| context.push_note_hash(Felt::new(1)))
        .build();
    let callee_address = callee.address();
    let caller = MockContract::builder(1)
        .with_function(ENTRYPOINT, move |context, executor, _| {
            context.static_call_private_function(executor, callee_address, HELPER, &[])?;
            Ok(())
        })
        .build();

    let mut executor = executor([caller.clone(), callee]);
    let error = failed_with(executor.execute_transaction(caller.address(), ENTRYPOINT, &[]));

    let ContextError::ExecutorFailed(nested) = error else {
        panic!("expected the nested call to fail");
    };
    assert_matches!(
        failed_with::<()>(Err(nested)),
        ContextError::CallContextMismatch(CallContextMismatch::StaticCallStateChange(_))
    );
}

#[test]
fn forged_callee_context_is_rejected() {
    let callee = MockContract::builder(2)
        .with_function(HELPER, |context, _, _| context.push_note_hash(Felt::new(1)))
        .build();
    let callee_address = callee.address();
    let caller = MockContract::builder(1)
        .with_function(ENTRYPOINT, move |context, executor, _| {
            context.call_private_function(executor, callee_address, HELPER, &[])?;
            Ok(())
        })
        .build();

    let mut executor = executor([caller.clone(), callee]).with_item_tamper(|item| {
        item.public_inputs.call_context.msg_sender = dummy_address(77);
    });

    assert_matches!(
        failed_with(executor.execute_transaction(caller.address(), ENTRYPOINT, &[])),
        ContextError::CallContextMismatch(CallContextMismatch::CallContext { .. })
    );
}

#[test]
fn public_teardown_can_be_set_once() {
    let caller = MockContract::builder(1)
        .with_function(ENTRYPOINT, |context, executor, _| {
            context.set_public_teardown_function(executor, dummy_address(50), PUBLIC_FN, &[])?;
            context.set_public_teardown_function(executor, dummy_address(50), PUBLIC_FN, &[])
        })
        .build();

    let mut executor = executor([caller.clone()]);
    assert_matches!(
        failed_with(executor.execute_transaction(caller.address(), ENTRYPOINT, &[])),
        ContextError::TeardownAlreadySet
    );
}

#[test]
fn unknown_callee_is_reported() {
    let caller = MockContract::builder(1)
        .with_function(ENTRYPOINT, |context, executor, _| {
            context.call_private_function(executor, dummy_address(404), HELPER, &[])?;
            Ok(())
        })
        .build();

    let mut executor = executor([caller.clone()]);
    assert_matches!(
        failed_with(executor.execute_transaction(caller.address(), ENTRYPOINT, &[])),
        ContextError::ExecutorFailed(ExecutorError::ContractNotFound(address)) if address == dummy_address(404)
    );
}
