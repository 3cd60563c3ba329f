use alloc::vec::Vec;

use veil_objects::{
    BoundedVec, Felt, MAX_ENCRYPTED_LOGS_PER_CALL, MAX_KEY_VALIDATION_REQUESTS_PER_CALL,
    MAX_L2_TO_L1_MSGS_PER_CALL, MAX_NOTE_HASH_READ_REQUESTS_PER_CALL, MAX_NOTE_HASHES_PER_CALL,
    MAX_NULLIFIER_READ_REQUESTS_PER_CALL, MAX_NULLIFIERS_PER_CALL,
    MAX_PRIVATE_CALL_STACK_LENGTH_PER_CALL, MAX_PUBLIC_CALL_STACK_LENGTH_PER_CALL,
    MAX_UNENCRYPTED_LOGS_PER_CALL, ZERO,
    address::{ContractAddress, FunctionData, FunctionKind, FunctionSelector},
    call::{CallContext, CallRequest, CallStackItem, CallerContext, PrivateCircuitPublicInputs},
    hash::hash_args,
    side_effect::{
        Empty, KeyValidationRequest, L2ToL1Message, LogHash, NoteHash, Nullifier, ReadRequest,
    },
    transaction::{HistoricalHeader, TxContext},
};

use crate::{
    errors::{CallContextMismatch, ContextError},
    host::{CallExecutor, NestedCall, SecretKeyProvider},
};

mod counter;
pub use counter::SideEffectCounter;

#[cfg(test)]
mod tests;

// CALL FLAGS
// ================================================================================================

#[derive(Debug, Default, Clone, Copy)]
struct CallFlags {
    is_static: bool,
    is_delegate: bool,
}

impl CallFlags {
    const CALL: Self = Self { is_static: false, is_delegate: false };
    const STATIC: Self = Self { is_static: true, is_delegate: false };
    const DELEGATE: Self = Self { is_static: false, is_delegate: true };
}

// PRIVATE CONTEXT
// ================================================================================================

/// Tracks everything a single private function invocation declares.
///
/// The context is the only way function-local code records side effects and issues nested
/// calls. Every state-changing declaration consumes one counter from the transaction-wide
/// [SideEffectCounter]; the invocation's own window starts at the counter consumed on creation
/// and ends at the counter consumed by [PrivateContext::finish].
///
/// Static invocations may read and call but cannot change state: every state-changing declaration
/// is rejected before a counter is consumed.
pub struct PrivateContext<'a> {
    counter: &'a mut SideEffectCounter,
    call_context: CallContext,
    args_hash: Felt,
    returns_hash: Felt,
    min_revertible_side_effect_counter: u32,
    is_fee_payer: bool,
    max_block_number: Option<u32>,

    note_hash_read_requests: BoundedVec<ReadRequest, MAX_NOTE_HASH_READ_REQUESTS_PER_CALL>,
    nullifier_read_requests: BoundedVec<ReadRequest, MAX_NULLIFIER_READ_REQUESTS_PER_CALL>,
    key_validation_requests:
        BoundedVec<KeyValidationRequest, MAX_KEY_VALIDATION_REQUESTS_PER_CALL>,

    note_hashes: BoundedVec<NoteHash, MAX_NOTE_HASHES_PER_CALL>,
    nullifiers: BoundedVec<Nullifier, MAX_NULLIFIERS_PER_CALL>,
    private_call_requests: BoundedVec<CallRequest, MAX_PRIVATE_CALL_STACK_LENGTH_PER_CALL>,
    public_call_requests: BoundedVec<CallRequest, MAX_PUBLIC_CALL_STACK_LENGTH_PER_CALL>,
    public_teardown_call_request: CallRequest,
    l2_to_l1_msgs: BoundedVec<L2ToL1Message, MAX_L2_TO_L1_MSGS_PER_CALL>,
    encrypted_logs_hashes: BoundedVec<LogHash, MAX_ENCRYPTED_LOGS_PER_CALL>,
    unencrypted_logs_hashes: BoundedVec<LogHash, MAX_UNENCRYPTED_LOGS_PER_CALL>,

    historical_header: HistoricalHeader,
    tx_context: TxContext,

    /// Nullifier keys fetched by this invocation; at most one account per invocation.
    key_validation_request: Option<KeyValidationRequest>,
    finished: bool,
}

impl<'a> PrivateContext<'a> {
    // CONSTRUCTOR
    // --------------------------------------------------------------------------------------------

    /// Starts a new invocation, consuming its start counter from `counter`.
    ///
    /// The start counter of `call_context` is overwritten by the consumed counter.
    pub fn new(
        counter: &'a mut SideEffectCounter,
        mut call_context: CallContext,
        args_hash: Felt,
        historical_header: HistoricalHeader,
        tx_context: TxContext,
    ) -> Self {
        call_context.start_side_effect_counter = counter.allocate();

        Self {
            counter,
            call_context,
            args_hash,
            returns_hash: ZERO,
            min_revertible_side_effect_counter: 0,
            is_fee_payer: false,
            max_block_number: None,
            note_hash_read_requests: BoundedVec::new("note hash read requests"),
            nullifier_read_requests: BoundedVec::new("nullifier read requests"),
            key_validation_requests: BoundedVec::new("key validation requests"),
            note_hashes: BoundedVec::new("note hashes"),
            nullifiers: BoundedVec::new("nullifiers"),
            private_call_requests: BoundedVec::new("private call requests"),
            public_call_requests: BoundedVec::new("public call requests"),
            public_teardown_call_request: CallRequest::empty(),
            l2_to_l1_msgs: BoundedVec::new("L2-to-L1 messages"),
            encrypted_logs_hashes: BoundedVec::new("encrypted log hashes"),
            unencrypted_logs_hashes: BoundedVec::new("unencrypted log hashes"),
            historical_header,
            tx_context,
            key_validation_request: None,
            finished: false,
        }
    }

    // PUBLIC ACCESSORS
    // --------------------------------------------------------------------------------------------

    pub fn call_context(&self) -> &CallContext {
        &self.call_context
    }

    /// Returns the address of the contract whose state this invocation reads and writes.
    pub fn this_address(&self) -> ContractAddress {
        self.call_context.storage_contract_address
    }

    pub fn msg_sender(&self) -> ContractAddress {
        self.call_context.msg_sender
    }

    pub fn is_static_call(&self) -> bool {
        self.call_context.is_static_call
    }

    /// Returns the counter the next side effect of this invocation will receive.
    pub fn side_effect_counter(&self) -> u32 {
        self.counter.current()
    }

    pub fn historical_header(&self) -> &HistoricalHeader {
        &self.historical_header
    }

    pub fn tx_context(&self) -> &TxContext {
        &self.tx_context
    }

    // SIDE EFFECTS
    // --------------------------------------------------------------------------------------------

    /// Declares the creation of a note.
    pub fn push_note_hash(&mut self, value: Felt) -> Result<(), ContextError> {
        self.ensure_not_static("push a note hash")?;
        self.note_hashes.push(NoteHash::new(value, self.counter.current()))?;
        self.counter.allocate();
        Ok(())
    }

    /// Declares a nullifier.
    ///
    /// `nullified_note_hash` is the inner note hash of the consumed note if the note was created
    /// earlier in this transaction, and zero otherwise. If this invocation created that note, the
    /// note hash records the counter of the nullifier.
    pub fn push_nullifier(
        &mut self,
        value: Felt,
        nullified_note_hash: Felt,
    ) -> Result<(), ContextError> {
        self.ensure_not_static("push a nullifier")?;
        let counter = self.counter.current();
        self.nullifiers.push(Nullifier::new(value, nullified_note_hash, counter))?;
        self.counter.allocate();

        if nullified_note_hash != ZERO {
            let pending = self.note_hashes.iter_mut().find(|note_hash| {
                note_hash.value == nullified_note_hash && note_hash.nullifier_counter == 0
            });
            if let Some(note_hash) = pending {
                note_hash.nullifier_counter = counter;
            }
        }
        Ok(())
    }

    /// Claims that a note hash exists, either settled or created earlier in this transaction.
    pub fn push_note_hash_read_request(&mut self, value: Felt) -> Result<(), ContextError> {
        self.ensure_active()?;
        self.note_hash_read_requests
            .push(ReadRequest::new(value, self.counter.current()))?;
        self.counter.allocate();
        Ok(())
    }

    /// Claims that a nullifier exists, either settled or emitted earlier in this transaction.
    pub fn push_nullifier_read_request(&mut self, value: Felt) -> Result<(), ContextError> {
        self.ensure_active()?;
        self.nullifier_read_requests
            .push(ReadRequest::new(value, self.counter.current()))?;
        self.counter.allocate();
        Ok(())
    }

    pub fn push_l2_to_l1_message(
        &mut self,
        recipient: Felt,
        content: Felt,
    ) -> Result<(), ContextError> {
        self.ensure_not_static("send an L2-to-L1 message")?;
        self.l2_to_l1_msgs
            .push(L2ToL1Message::new(recipient, content, self.counter.current()))?;
        self.counter.allocate();
        Ok(())
    }

    /// Declares an encrypted log by its hash and preimage length in bytes.
    pub fn emit_encrypted_log_hash(&mut self, value: Felt, length: u32) -> Result<(), ContextError> {
        self.ensure_not_static("emit an encrypted log")?;
        self.encrypted_logs_hashes
            .push(LogHash::new(value, self.counter.current(), length))?;
        self.counter.allocate();
        Ok(())
    }

    /// Declares an unencrypted log by its hash and preimage length in bytes.
    pub fn emit_unencrypted_log_hash(
        &mut self,
        value: Felt,
        length: u32,
    ) -> Result<(), ContextError> {
        self.ensure_not_static("emit an unencrypted log")?;
        self.unencrypted_logs_hashes
            .push(LogHash::new(value, self.counter.current(), length))?;
        self.counter.allocate();
        Ok(())
    }

    // VALIDATION REQUESTS
    // --------------------------------------------------------------------------------------------

    /// Returns the nullifier secret of the account identified by `npk_m_hash`, siloed for the
    /// contract of this invocation.
    ///
    /// The keys are fetched from `provider` once and cached; requesting the keys of the same
    /// account again returns the cached secret.
    ///
    /// # Errors
    /// Returns an error if:
    /// - Keys of a different account were already requested by this invocation.
    /// - The provider does not hold the keys of the account.
    pub fn request_nsk_app<P: SecretKeyProvider + ?Sized>(
        &mut self,
        provider: &P,
        npk_m_hash: Felt,
    ) -> Result<Felt, ContextError> {
        self.ensure_active()?;

        if let Some(cached) = self.key_validation_request {
            if cached.npk_m_hash == npk_m_hash {
                return Ok(cached.sk_app);
            }
            return Err(ContextError::MultipleKeyRequests {
                cached: cached.npk_m_hash,
                requested: npk_m_hash,
            });
        }

        let request = provider
            .get_key_validation_request(npk_m_hash, self.this_address())
            .map_err(ContextError::KeyProviderFailed)?;
        self.key_validation_requests.push(request)?;
        self.key_validation_request = Some(request);

        Ok(request.sk_app)
    }

    /// Restricts the transaction to blocks up to `max_block_number`.
    pub fn set_tx_max_block_number(&mut self, max_block_number: u32) -> Result<(), ContextError> {
        self.ensure_active()?;
        self.max_block_number = Some(match self.max_block_number {
            Some(current) => current.min(max_block_number),
            None => max_block_number,
        });
        Ok(())
    }

    // TRANSACTION PHASES
    // --------------------------------------------------------------------------------------------

    /// Marks the end of the non-revertible setup phase.
    ///
    /// Every side effect declared from here on, in this invocation or any later one, is
    /// discarded if the public part of the transaction reverts.
    pub fn end_setup(&mut self) -> Result<(), ContextError> {
        self.ensure_active()?;
        self.min_revertible_side_effect_counter = self.counter.current();
        Ok(())
    }

    /// Declares the contract of this invocation as the payer of the transaction fee.
    pub fn set_as_fee_payer(&mut self) -> Result<(), ContextError> {
        self.ensure_not_static("set the fee payer")?;
        self.is_fee_payer = true;
        Ok(())
    }

    /// Stores the hash of the values returned by this invocation.
    pub fn set_return_values(&mut self, values: &[Felt]) -> Result<(), ContextError> {
        self.ensure_active()?;
        self.returns_hash = hash_args(values);
        Ok(())
    }

    // PRIVATE CALLS
    // --------------------------------------------------------------------------------------------

    /// Calls a private function and returns the hash of its return values.
    ///
    /// # Errors
    /// Returns an error if the executor fails, or if the returned call stack item does not match
    /// the requested target, function, call type or counter window.
    pub fn call_private_function<E: CallExecutor + ?Sized>(
        &mut self,
        executor: &mut E,
        contract_address: ContractAddress,
        selector: FunctionSelector,
        args: &[Felt],
    ) -> Result<Felt, ContextError> {
        self.call_private(executor, contract_address, selector, args, CallFlags::CALL)
    }

    /// Calls a private function which must not change state.
    pub fn static_call_private_function<E: CallExecutor + ?Sized>(
        &mut self,
        executor: &mut E,
        contract_address: ContractAddress,
        selector: FunctionSelector,
        args: &[Felt],
    ) -> Result<Felt, ContextError> {
        self.call_private(executor, contract_address, selector, args, CallFlags::STATIC)
    }

    /// Executes the code of a private function of `contract_address` against the state of this
    /// invocation's contract, on behalf of this invocation's sender.
    pub fn delegate_call_private_function<E: CallExecutor + ?Sized>(
        &mut self,
        executor: &mut E,
        contract_address: ContractAddress,
        selector: FunctionSelector,
        args: &[Felt],
    ) -> Result<Felt, ContextError> {
        self.call_private(executor, contract_address, selector, args, CallFlags::DELEGATE)
    }

    // PUBLIC CALLS
    // --------------------------------------------------------------------------------------------

    /// Enqueues a call to a public function.
    pub fn call_public_function<E: CallExecutor + ?Sized>(
        &mut self,
        executor: &mut E,
        contract_address: ContractAddress,
        selector: FunctionSelector,
        args: &[Felt],
    ) -> Result<(), ContextError> {
        let function_data = FunctionData::new(selector, FunctionKind::Public);
        self.enqueue_public(executor, contract_address, function_data, args, CallFlags::CALL, false)
    }

    pub fn static_call_public_function<E: CallExecutor + ?Sized>(
        &mut self,
        executor: &mut E,
        contract_address: ContractAddress,
        selector: FunctionSelector,
        args: &[Felt],
    ) -> Result<(), ContextError> {
        let function_data = FunctionData::new(selector, FunctionKind::Public);
        self.enqueue_public(executor, contract_address, function_data, args, CallFlags::STATIC, false)
    }

    pub fn delegate_call_public_function<E: CallExecutor + ?Sized>(
        &mut self,
        executor: &mut E,
        contract_address: ContractAddress,
        selector: FunctionSelector,
        args: &[Felt],
    ) -> Result<(), ContextError> {
        let function_data = FunctionData::new(selector, FunctionKind::Public);
        self.enqueue_public(
            executor,
            contract_address,
            function_data,
            args,
            CallFlags::DELEGATE,
            false,
        )
    }

    /// Enqueues a call to a function executed by the public VM.
    pub fn call_avm_function<E: CallExecutor + ?Sized>(
        &mut self,
        executor: &mut E,
        contract_address: ContractAddress,
        selector: FunctionSelector,
        args: &[Felt],
    ) -> Result<(), ContextError> {
        let function_data = FunctionData::new(selector, FunctionKind::Avm);
        self.enqueue_public(executor, contract_address, function_data, args, CallFlags::CALL, false)
    }

    pub fn static_call_avm_function<E: CallExecutor + ?Sized>(
        &mut self,
        executor: &mut E,
        contract_address: ContractAddress,
        selector: FunctionSelector,
        args: &[Felt],
    ) -> Result<(), ContextError> {
        let function_data = FunctionData::new(selector, FunctionKind::Avm);
        self.enqueue_public(executor, contract_address, function_data, args, CallFlags::STATIC, false)
    }

    pub fn delegate_call_avm_function<E: CallExecutor + ?Sized>(
        &mut self,
        executor: &mut E,
        contract_address: ContractAddress,
        selector: FunctionSelector,
        args: &[Felt],
    ) -> Result<(), ContextError> {
        let function_data = FunctionData::new(selector, FunctionKind::Avm);
        self.enqueue_public(
            executor,
            contract_address,
            function_data,
            args,
            CallFlags::DELEGATE,
            false,
        )
    }

    /// Enqueues the public function which runs after all other public calls of the transaction,
    /// whether or not they revert.
    ///
    /// # Errors
    /// Returns an error if this invocation already set a teardown function or is static.
    pub fn set_public_teardown_function<E: CallExecutor + ?Sized>(
        &mut self,
        executor: &mut E,
        contract_address: ContractAddress,
        selector: FunctionSelector,
        args: &[Felt],
    ) -> Result<(), ContextError> {
        self.ensure_not_static("set the public teardown function")?;
        if !self.public_teardown_call_request.is_empty() {
            return Err(ContextError::TeardownAlreadySet);
        }
        let function_data = FunctionData::new(selector, FunctionKind::Public);
        self.enqueue_public(executor, contract_address, function_data, args, CallFlags::CALL, true)
    }

    // FINALIZATION
    // --------------------------------------------------------------------------------------------

    /// Ends the invocation, consuming its end counter, and returns everything it declared.
    ///
    /// Every sequence of the returned public inputs is padded to its per-call capacity.
    ///
    /// # Errors
    /// Returns an error if the invocation was already finished.
    pub fn finish(&mut self) -> Result<PrivateCircuitPublicInputs, ContextError> {
        self.ensure_active()?;
        self.finished = true;
        let end_side_effect_counter = self.counter.allocate();

        Ok(PrivateCircuitPublicInputs {
            call_context: self.call_context,
            args_hash: self.args_hash,
            returns_hash: self.returns_hash,
            min_revertible_side_effect_counter: self.min_revertible_side_effect_counter,
            is_fee_payer: self.is_fee_payer,
            max_block_number: self.max_block_number,
            note_hash_read_requests: padded(&self.note_hash_read_requests),
            nullifier_read_requests: padded(&self.nullifier_read_requests),
            key_validation_requests: padded(&self.key_validation_requests),
            note_hashes: padded(&self.note_hashes),
            nullifiers: padded(&self.nullifiers),
            private_call_requests: padded(&self.private_call_requests),
            public_call_requests: padded(&self.public_call_requests),
            public_teardown_call_request: self.public_teardown_call_request,
            l2_to_l1_msgs: padded(&self.l2_to_l1_msgs),
            encrypted_logs_hashes: padded(&self.encrypted_logs_hashes),
            unencrypted_logs_hashes: padded(&self.unencrypted_logs_hashes),
            start_side_effect_counter: self.call_context.start_side_effect_counter,
            end_side_effect_counter,
            historical_header: self.historical_header,
            tx_context: self.tx_context,
        })
    }

    // HELPERS
    // --------------------------------------------------------------------------------------------

    fn ensure_active(&self) -> Result<(), ContextError> {
        if self.finished {
            return Err(ContextError::ContextFinalized);
        }
        Ok(())
    }

    fn ensure_not_static(&self, operation: &'static str) -> Result<(), ContextError> {
        self.ensure_active()?;
        if self.call_context.is_static_call {
            return Err(CallContextMismatch::StaticCallStateChange(operation).into());
        }
        Ok(())
    }

    fn call_private<E: CallExecutor + ?Sized>(
        &mut self,
        executor: &mut E,
        contract_address: ContractAddress,
        selector: FunctionSelector,
        args: &[Felt],
        flags: CallFlags,
    ) -> Result<Felt, ContextError> {
        self.ensure_active()?;

        let function_data = FunctionData::new(selector, FunctionKind::Private);
        let call =
            self.nested_call(contract_address, function_data, args, flags, self.counter.current());

        let item = executor
            .execute_private_call(self.counter, &call)
            .map_err(ContextError::ExecutorFailed)?;
        check_callee(&call, &item, item.public_inputs.args_hash)?;

        // the callee must have drawn exactly the counters between its start and end
        let expected_end = self.counter.current().saturating_sub(1);
        if item.end_side_effect_counter() != expected_end
            || item.end_side_effect_counter() <= item.start_side_effect_counter()
        {
            return Err(CallContextMismatch::CounterWindow {
                expected_start: call.call_context.start_side_effect_counter,
                expected_end,
                actual_start: item.start_side_effect_counter(),
                actual_end: item.end_side_effect_counter(),
            }
            .into());
        }

        let request = self.call_request(&item, flags);
        self.private_call_requests.push(request)?;

        Ok(item.public_inputs.returns_hash)
    }

    fn enqueue_public<E: CallExecutor + ?Sized>(
        &mut self,
        executor: &mut E,
        contract_address: ContractAddress,
        function_data: FunctionData,
        args: &[Felt],
        flags: CallFlags,
        is_teardown: bool,
    ) -> Result<(), ContextError> {
        self.ensure_active()?;

        let counter = self.counter.current();
        let call = self.nested_call(contract_address, function_data, args, flags, counter);
        self.counter.allocate();

        let item = if is_teardown {
            executor.enqueue_public_teardown_call(&call)
        } else {
            executor.enqueue_public_call(&call)
        }
        .map_err(ContextError::ExecutorFailed)?;
        check_callee(&call, &item, item.args_hash)?;

        if item.counter != counter {
            return Err(CallContextMismatch::CounterWindow {
                expected_start: counter,
                expected_end: counter,
                actual_start: item.counter,
                actual_end: item.counter,
            }
            .into());
        }

        let request = self.call_request(&item, flags);
        if is_teardown {
            self.public_teardown_call_request = request;
        } else {
            self.public_call_requests.push(request)?;
        }

        Ok(())
    }

    /// Builds the call a callee must observe. Static invocations can only issue static calls.
    fn nested_call(
        &self,
        contract_address: ContractAddress,
        function_data: FunctionData,
        args: &[Felt],
        flags: CallFlags,
        start_side_effect_counter: u32,
    ) -> NestedCall {
        let (msg_sender, storage_contract_address) = if flags.is_delegate {
            (self.call_context.msg_sender, self.call_context.storage_contract_address)
        } else {
            (self.call_context.storage_contract_address, contract_address)
        };

        NestedCall {
            contract_address,
            function_data,
            args: args.to_vec(),
            args_hash: hash_args(args),
            call_context: CallContext {
                msg_sender,
                storage_contract_address,
                function_selector: function_data.selector,
                is_static_call: flags.is_static || self.call_context.is_static_call,
                is_delegate_call: flags.is_delegate,
                start_side_effect_counter,
            },
        }
    }

    fn call_request<I: CallStackItem>(&self, item: &I, flags: CallFlags) -> CallRequest {
        let caller_context = if flags.is_delegate {
            CallerContext {
                msg_sender: self.call_context.msg_sender,
                storage_contract_address: self.call_context.storage_contract_address,
            }
        } else {
            CallerContext::empty()
        };

        CallRequest {
            hash: item.hash(),
            caller_contract_address: self.call_context.storage_contract_address,
            caller_context,
            start_side_effect_counter: item.start_side_effect_counter(),
            end_side_effect_counter: item.end_side_effect_counter(),
        }
    }
}

// HELPER FUNCTIONS
// ================================================================================================

/// Checks that a callee ran as the requested target, function and call type.
fn check_callee<I: CallStackItem>(
    call: &NestedCall,
    item: &I,
    args_hash: Felt,
) -> Result<(), CallContextMismatch> {
    if item.contract_address() != call.contract_address {
        return Err(CallContextMismatch::ContractAddress {
            expected: call.contract_address,
            actual: item.contract_address(),
        });
    }
    if item.function_data() != call.function_data {
        return Err(CallContextMismatch::FunctionData {
            expected: call.function_data,
            actual: item.function_data(),
        });
    }
    if args_hash != call.args_hash {
        return Err(CallContextMismatch::ArgsHash { expected: call.args_hash, actual: args_hash });
    }
    if item.call_context() != &call.call_context {
        return Err(CallContextMismatch::CallContext {
            expected: call.call_context,
            actual: *item.call_context(),
        });
    }
    Ok(())
}

fn padded<T: Copy + Default, const N: usize>(items: &BoundedVec<T, N>) -> Vec<T> {
    let mut padded = items.to_vec();
    padded.resize(N, T::default());
    padded
}
