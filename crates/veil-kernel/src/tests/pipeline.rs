use assert_matches::assert_matches;
use veil_objects::{Felt, ZERO, testing::dummy_address};

use super::{ENTRYPOINT, HELPER, PUBLIC_FN, execute, executor};
use crate::{
    KernelOutput, KernelPipeline, MerklePathOracle, TailWitnesses, TransactionTrace,
    errors::KernelError, testing::MockContract,
};

/// An account entry point which calls a token contract and optionally enqueues a public call.
fn account_and_token(enqueue_public: bool) -> (MockContract, MockContract) {
    let token = MockContract::builder(2)
        .with_function(HELPER, |context, _, args| {
            context.push_nullifier(args[0], ZERO)?;
            context.push_note_hash(args[0] + Felt::new(1))?;
            context.emit_encrypted_log_hash(Felt::new(99), 64)
        })
        .build();
    let token_address = token.address();
    let account = MockContract::builder(1)
        .with_function(ENTRYPOINT, move |context, executor, args| {
            context.set_as_fee_payer()?;
            context.end_setup()?;
            context.call_private_function(executor, token_address, HELPER, args)?;
            if enqueue_public {
                context.call_public_function(executor, dummy_address(50), PUBLIC_FN, &[])?;
            }
            Ok(())
        })
        .build();
    (account, token)
}

#[test]
fn private_transaction_ends_in_the_private_tail() -> anyhow::Result<()> {
    let (account, token) = account_and_token(false);
    let mut executor = executor([account.clone(), token]);
    let (tx_request, trace) = execute(&mut executor, &account, &[Felt::new(7)]);

    let output = KernelPipeline::new(MerklePathOracle).run(
        &tx_request,
        &trace,
        &TailWitnesses::new(),
    )?;

    let KernelOutput::Private(public_inputs) = output else {
        panic!("expected a private-only output");
    };
    assert_eq!(public_inputs.fee_payer, account.address());
    assert_eq!(public_inputs.end.nullifiers.len(), 2);
    assert_eq!(public_inputs.end.nullifiers[0], tx_request.hash());
    assert_eq!(public_inputs.end.note_hashes.len(), 1);
    assert_eq!(public_inputs.end.encrypted_log_preimages_length, 64);

    Ok(())
}

#[test]
fn transaction_with_public_calls_ends_in_the_public_tail() -> anyhow::Result<()> {
    let (account, token) = account_and_token(true);
    let mut executor = executor([account.clone(), token]);
    let (tx_request, trace) = execute(&mut executor, &account, &[Felt::new(7)]);

    let output = KernelPipeline::new(MerklePathOracle).run(
        &tx_request,
        &trace,
        &TailWitnesses::new(),
    )?;

    assert!(output.is_public());
    let KernelOutput::Public(public_inputs) = output else {
        panic!("expected an output for the public phase");
    };
    assert_eq!(public_inputs.fee_payer, account.address());
    // only the protocol nullifier precedes the end of setup
    assert_eq!(public_inputs.end_non_revertible.nullifiers.len(), 1);
    assert_eq!(public_inputs.end.nullifiers.len(), 1);
    assert_eq!(public_inputs.end.note_hashes.len(), 1);
    assert_eq!(public_inputs.end.public_call_stack.len(), 1);

    Ok(())
}

#[test]
fn pipeline_rejects_incomplete_traces() {
    let pipeline = KernelPipeline::new(MerklePathOracle);
    let (account, token) = account_and_token(false);
    let mut complete = executor([account.clone(), token]);
    let (tx_request, _) = execute(&mut complete, &account, &[Felt::new(7)]);

    // without the token contract the entry frame never returns
    let mut failing = executor([account.clone()]);
    assert!(failing.execute_transaction(account.address(), ENTRYPOINT, &[Felt::new(7)]).is_err());
    assert_matches!(
        pipeline.run(&tx_request, failing.trace(), &TailWitnesses::new()),
        Err(KernelError::UnfinishedCallFrames(1))
    );

    assert_matches!(
        pipeline.run(&tx_request, &TransactionTrace::new(), &TailWitnesses::new()),
        Err(KernelError::EmptyTrace)
    );
}
