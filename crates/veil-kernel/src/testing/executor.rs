use alloc::{boxed::Box, sync::Arc, vec::Vec};

use veil_objects::{
    Felt,
    address::{ContractAddress, FunctionData, FunctionKind, FunctionSelector},
    call::{CallContext, PrivateCallStackItem, PublicCallStackItem},
    hash::hash_args,
    transaction::{HistoricalHeader, TxConstants, TxContext, TxRequest},
};

use super::MockContract;
use crate::{
    context::{PrivateContext, SideEffectCounter},
    errors::ExecutorError,
    execution::TransactionTrace,
    host::{CallExecutor, NestedCall},
};

type ItemTamper = Arc<dyn Fn(&mut PrivateCallStackItem) + Send + Sync>;

// MOCK EXECUTOR
// ================================================================================================

/// Executes mocked private functions and records the resulting call tree.
#[derive(Clone)]
pub struct MockExecutor {
    contracts: Vec<MockContract>,
    historical_header: HistoricalHeader,
    tx_context: TxContext,
    trace: TransactionTrace,
    tamper: Option<ItemTamper>,
}

impl MockExecutor {
    pub fn new(constants: TxConstants) -> Self {
        Self {
            contracts: Vec::new(),
            historical_header: constants.historical_header,
            tx_context: constants.tx_context,
            trace: TransactionTrace::new(),
            tamper: None,
        }
    }

    pub fn with_contract(mut self, contract: MockContract) -> Self {
        self.contracts.push(contract);
        self
    }

    pub fn contract(&self, address: ContractAddress) -> Option<&MockContract> {
        self.contracts.iter().find(|contract| contract.address() == address)
    }

    pub fn trace(&self) -> &TransactionTrace {
        &self.trace
    }

    /// Applies `tamper` to every private call stack item returned to a caller, after the item
    /// was recorded in the trace.
    pub fn with_item_tamper(
        mut self,
        tamper: impl Fn(&mut PrivateCallStackItem) + Send + Sync + 'static,
    ) -> Self {
        self.tamper = Some(Arc::new(tamper));
        self
    }

    /// Executes the private entry point of a transaction and returns its request together with
    /// the recorded call tree.
    ///
    /// # Errors
    /// Returns an error if the entry point or any nested call fails.
    pub fn execute_transaction(
        &mut self,
        origin: ContractAddress,
        selector: FunctionSelector,
        args: &[Felt],
    ) -> Result<(TxRequest, TransactionTrace), ExecutorError> {
        self.trace = TransactionTrace::new();

        let function_data = FunctionData::new(selector, FunctionKind::Private);
        let call = NestedCall {
            contract_address: origin,
            function_data,
            args: args.to_vec(),
            args_hash: hash_args(args),
            call_context: CallContext {
                msg_sender: ContractAddress::ZERO,
                storage_contract_address: origin,
                function_selector: selector,
                is_static_call: false,
                is_delegate_call: false,
                start_side_effect_counter: SideEffectCounter::FIRST,
            },
        };

        let mut counter = SideEffectCounter::new();
        self.execute_private_call(&mut counter, &call)?;

        let tx_request = TxRequest {
            origin,
            function_data,
            args_hash: call.args_hash,
            tx_context: self.tx_context,
        };
        Ok((tx_request, core::mem::take(&mut self.trace)))
    }
}

impl CallExecutor for MockExecutor {
    fn execute_private_call(
        &mut self,
        counter: &mut SideEffectCounter,
        call: &NestedCall,
    ) -> Result<PrivateCallStackItem, ExecutorError> {
        let address = call.contract_address;
        let selector = call.function_data.selector;
        let contract = self.contract(address).ok_or(ExecutorError::ContractNotFound(address))?;
        let (function, witness) = contract
            .function(selector)
            .ok_or(ExecutorError::FunctionNotFound { address, selector })?;

        self.trace.enter_frame();
        let mut context = PrivateContext::new(
            counter,
            call.call_context,
            call.args_hash,
            self.historical_header,
            self.tx_context,
        );
        let public_inputs = (function.body)(&mut context, self, &call.args)
            .and_then(|()| context.finish())
            .map_err(|source| ExecutorError::CallFailed {
                address,
                selector,
                source: Box::new(source),
            })?;

        let mut item = PrivateCallStackItem {
            contract_address: address,
            function_data: call.function_data,
            public_inputs,
        };
        self.trace.exit_frame(item.clone(), witness)?;

        if let Some(tamper) = &self.tamper {
            tamper(&mut item);
        }
        Ok(item)
    }

    fn enqueue_public_call(
        &mut self,
        call: &NestedCall,
    ) -> Result<PublicCallStackItem, ExecutorError> {
        let item = public_item(call);
        self.trace.record_public_call(item)?;
        Ok(item)
    }

    fn enqueue_public_teardown_call(
        &mut self,
        call: &NestedCall,
    ) -> Result<PublicCallStackItem, ExecutorError> {
        let item = public_item(call);
        self.trace.record_public_teardown_call(item)?;
        Ok(item)
    }
}

fn public_item(call: &NestedCall) -> PublicCallStackItem {
    PublicCallStackItem {
        contract_address: call.contract_address,
        function_data: call.function_data,
        call_context: call.call_context,
        args_hash: call.args_hash,
        counter: call.call_context.start_side_effect_counter,
    }
}
