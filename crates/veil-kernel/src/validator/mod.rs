//! Validation of a single private call frame and of the calls it requested.
//!
//! A frame is validated once, by the kernel iteration which processes it. The iteration checks
//! the frame's own declarations (array layout, call type, counters, contract identity) and matches
//! every call request of the frame against the call stack item of the callee, so a callee can
//! never run under a different context than the one its caller requested.

use alloc::vec::Vec;

use veil_objects::{
    MAX_ENCRYPTED_LOGS_PER_CALL, MAX_KEY_VALIDATION_REQUESTS_PER_CALL, MAX_L2_TO_L1_MSGS_PER_CALL,
    MAX_NOTE_HASH_READ_REQUESTS_PER_CALL, MAX_NOTE_HASHES_PER_CALL,
    MAX_NULLIFIER_READ_REQUESTS_PER_CALL, MAX_NULLIFIERS_PER_CALL,
    MAX_PRIVATE_CALL_STACK_LENGTH_PER_CALL, MAX_PUBLIC_CALL_STACK_LENGTH_PER_CALL,
    MAX_UNENCRYPTED_LOGS_PER_CALL,
    address::FunctionData,
    call::{CallContext, CallRequest, CallStackItem, CallerContext, PrivateCircuitPublicInputs},
    side_effect::{Empty, Ordered},
};

use crate::{
    errors::{CallContextMismatch, CallStackError, MalformedArrayError},
    execution::PrivateCallData,
    host::MembershipOracle,
};

mod identity;
pub use identity::validate_contract_identity;


// PRIVATE CALL VALIDATION
// ================================================================================================

/// Validates everything a private call frame declares, including the calls it requested.
///
/// # Errors
/// Returns an error if:
/// - The called function is not private.
/// - Any declared array is not a zero-padded sequence of its per-call capacity.
/// - The call type is inconsistent with the contract and storage addresses.
/// - A static call declared state changes.
/// - Counters are not strictly increasing inside the invocation's window.
/// - A call request does not match the corresponding callee.
/// - The contract address does not recompute from the contract instance and function membership.
pub fn validate_private_call<M: MembershipOracle + ?Sized>(
    call: &PrivateCallData,
    oracle: &M,
) -> Result<(), CallStackError> {
    let item = &call.call_stack_item;
    let inputs = &item.public_inputs;

    if !item.function_data.kind.is_private() {
        return Err(CallStackError::NotAPrivateFunction { selector: item.function_data.selector });
    }

    validate_arrays(inputs)?;
    validate_call_type(item)?;
    validate_static_call(inputs)?;
    validate_counters(inputs)?;

    validate_call_stack(
        "private call stack",
        &inputs.private_call_requests,
        MAX_PRIVATE_CALL_STACK_LENGTH_PER_CALL,
        &inputs.call_context,
        &call.private_call_stack,
    )?;
    validate_call_stack(
        "public call stack",
        &inputs.public_call_requests,
        MAX_PUBLIC_CALL_STACK_LENGTH_PER_CALL,
        &inputs.call_context,
        &call.public_call_stack,
    )?;
    validate_teardown_call(inputs, call)?;

    validate_contract_identity(call, oracle)
}

// CALL REQUESTS
// ================================================================================================

/// Validates a declared call stack against the call stack items of the callees, in order.
///
/// `requests` must hold exactly `capacity` slots, non-empty requests first, and there must be
/// exactly one callee per non-empty request.
pub fn validate_call_stack<I: CallStackItem>(
    name: &'static str,
    requests: &[CallRequest],
    capacity: usize,
    caller: &CallContext,
    callees: &[I],
) -> Result<(), CallStackError> {
    let len = validate_array(requests, capacity)
        .map_err(|source| CallStackError::MalformedCallStack { name, source })?;

    if callees.len() != len {
        return Err(CallStackError::MalformedCallStack {
            name,
            source: MalformedArrayError::ItemCountMismatch {
                requests: len,
                items: callees.len(),
            },
        });
    }

    for (index, (request, callee)) in requests.iter().zip(callees).enumerate() {
        validate_call_request(index, request, caller, callee)?;
    }

    Ok(())
}

/// Validates that `callee` ran under exactly the context `caller` requested through `request`.
///
/// # Errors
/// Returns an error if:
/// - The request does not commit to the callee's call stack item.
/// - The request was not issued from the caller's storage contract.
/// - For delegate calls, the caller context is empty or differs from the callee's sender and
///   storage address, or the callee runs its own code.
/// - For ordinary calls, the caller context is not empty, the callee's sender is not the caller,
///   or the callee does not run in its own storage.
/// - The caller is static but the callee is not.
/// - The request's counter window differs from the callee's.
pub fn validate_call_request<I: CallStackItem>(
    index: usize,
    request: &CallRequest,
    caller: &CallContext,
    callee: &I,
) -> Result<(), CallStackError> {
    let hash = callee.hash();
    if request.hash != hash {
        return Err(CallStackError::CallRequestHashMismatch {
            index,
            expected: request.hash,
            actual: hash,
        });
    }

    if request.caller_contract_address != caller.storage_contract_address {
        return Err(CallContextMismatch::CallerContractAddress {
            expected: caller.storage_contract_address,
            actual: request.caller_contract_address,
        }
        .into());
    }

    let context = callee.call_context();
    validate_selector(callee.function_data(), context)?;

    if context.is_delegate_call {
        let caller_context = request.caller_context;
        let expected_caller_context = CallerContext {
            msg_sender: caller.msg_sender,
            storage_contract_address: caller.storage_contract_address,
        };
        if caller_context.is_empty() || caller_context != expected_caller_context {
            return Err(CallContextMismatch::CallerContext.into());
        }
        if context.msg_sender != caller_context.msg_sender {
            return Err(CallContextMismatch::MsgSender {
                expected: caller_context.msg_sender,
                actual: context.msg_sender,
            }
            .into());
        }
        if context.storage_contract_address != caller_context.storage_contract_address {
            return Err(CallContextMismatch::StorageContractAddress {
                expected: caller_context.storage_contract_address,
                actual: context.storage_contract_address,
            }
            .into());
        }
        if callee.contract_address() == context.storage_contract_address {
            return Err(CallContextMismatch::DelegateCallToSelf(callee.contract_address()).into());
        }
    } else {
        if !request.caller_context.is_empty() {
            return Err(CallContextMismatch::CallerContext.into());
        }
        if context.msg_sender != request.caller_contract_address {
            return Err(CallContextMismatch::MsgSender {
                expected: request.caller_contract_address,
                actual: context.msg_sender,
            }
            .into());
        }
        if context.storage_contract_address != callee.contract_address() {
            return Err(CallContextMismatch::StorageContractAddress {
                expected: callee.contract_address(),
                actual: context.storage_contract_address,
            }
            .into());
        }
    }

    if caller.is_static_call && !context.is_static_call {
        return Err(CallContextMismatch::StaticCallNotPropagated.into());
    }

    if request.start_side_effect_counter != callee.start_side_effect_counter()
        || request.end_side_effect_counter != callee.end_side_effect_counter()
    {
        return Err(CallContextMismatch::CounterWindow {
            expected_start: request.start_side_effect_counter,
            expected_end: request.end_side_effect_counter,
            actual_start: callee.start_side_effect_counter(),
            actual_end: callee.end_side_effect_counter(),
        }
        .into());
    }

    Ok(())
}

fn validate_teardown_call(
    inputs: &PrivateCircuitPublicInputs,
    call: &PrivateCallData,
) -> Result<(), CallStackError> {
    let request = &inputs.public_teardown_call_request;
    match (&call.public_teardown_call, request.is_empty()) {
        (None, true) => Ok(()),
        (Some(teardown), false) => validate_call_request(0, request, &inputs.call_context, teardown),
        (teardown, _) => Err(CallStackError::MalformedCallStack {
            name: "public teardown call",
            source: MalformedArrayError::ItemCountMismatch {
                requests: usize::from(!request.is_empty()),
                items: usize::from(teardown.is_some()),
            },
        }),
    }
}

// FRAME VALIDATION
// ================================================================================================

/// Returns the number of non-empty elements of a zero-padded array.
///
/// # Errors
/// Returns an error if the array does not hold exactly `capacity` slots or a non-empty element
/// follows an empty one.
pub fn validate_array<T: Empty>(items: &[T], capacity: usize) -> Result<usize, MalformedArrayError> {
    if items.len() != capacity {
        return Err(MalformedArrayError::LengthMismatch { len: items.len(), capacity });
    }

    let len = items.iter().position(Empty::is_empty).unwrap_or(items.len());
    if let Some(offset) = items[len..].iter().position(|item| !item.is_empty()) {
        return Err(MalformedArrayError::NonEmptyAfterEmpty(len + offset));
    }

    Ok(len)
}

fn validate_arrays(inputs: &PrivateCircuitPublicInputs) -> Result<(), CallStackError> {
    fn check<T: Empty>(
        name: &'static str,
        items: &[T],
        capacity: usize,
    ) -> Result<(), CallStackError> {
        validate_array(items, capacity)
            .map(|_| ())
            .map_err(|source| CallStackError::MalformedArray { name, source })
    }

    check(
        "note hash read requests",
        &inputs.note_hash_read_requests,
        MAX_NOTE_HASH_READ_REQUESTS_PER_CALL,
    )?;
    check(
        "nullifier read requests",
        &inputs.nullifier_read_requests,
        MAX_NULLIFIER_READ_REQUESTS_PER_CALL,
    )?;
    check(
        "key validation requests",
        &inputs.key_validation_requests,
        MAX_KEY_VALIDATION_REQUESTS_PER_CALL,
    )?;
    check("note hashes", &inputs.note_hashes, MAX_NOTE_HASHES_PER_CALL)?;
    check("nullifiers", &inputs.nullifiers, MAX_NULLIFIERS_PER_CALL)?;
    check("L2-to-L1 messages", &inputs.l2_to_l1_msgs, MAX_L2_TO_L1_MSGS_PER_CALL)?;
    check("encrypted log hashes", &inputs.encrypted_logs_hashes, MAX_ENCRYPTED_LOGS_PER_CALL)?;
    check(
        "unencrypted log hashes",
        &inputs.unencrypted_logs_hashes,
        MAX_UNENCRYPTED_LOGS_PER_CALL,
    )
}

/// Checks that a frame's storage address is consistent with its call type.
fn validate_call_type<I: CallStackItem>(item: &I) -> Result<(), CallStackError> {
    let context = item.call_context();
    validate_selector(item.function_data(), context)?;

    if context.is_delegate_call {
        if item.contract_address() == context.storage_contract_address {
            return Err(CallContextMismatch::DelegateCallToSelf(item.contract_address()).into());
        }
    } else if item.contract_address() != context.storage_contract_address {
        return Err(CallContextMismatch::StorageContractAddress {
            expected: item.contract_address(),
            actual: context.storage_contract_address,
        }
        .into());
    }

    Ok(())
}

fn validate_selector(
    function_data: FunctionData,
    context: &CallContext,
) -> Result<(), CallContextMismatch> {
    if context.function_selector != function_data.selector {
        return Err(CallContextMismatch::FunctionData {
            expected: function_data,
            actual: FunctionData::new(context.function_selector, function_data.kind),
        });
    }
    Ok(())
}

fn validate_static_call(inputs: &PrivateCircuitPublicInputs) -> Result<(), CallStackError> {
    if !inputs.call_context.is_static_call {
        return Ok(());
    }

    let violation = if inputs.has_state_changes() {
        Some("change state")
    } else if inputs.is_fee_payer {
        Some("set the fee payer")
    } else if !inputs.public_teardown_call_request.is_empty() {
        Some("set the public teardown function")
    } else {
        None
    };

    match violation {
        Some(operation) => Err(CallContextMismatch::StaticCallStateChange(operation).into()),
        None => Ok(()),
    }
}

/// Checks that every counter declared by the frame lies strictly inside its window and that
/// counters of each sequence are strictly increasing.
///
/// Nested private calls must occupy disjoint windows inside the frame's window. No counter may be
/// used twice across sequences, and none may fall inside the window of a nested private call.
pub fn validate_counters(inputs: &PrivateCircuitPublicInputs) -> Result<(), CallStackError> {
    let start = inputs.start_side_effect_counter;
    let end = inputs.end_side_effect_counter;
    if start >= end {
        return Err(CallStackError::InvalidCounterWindow { start, end });
    }

    let window = CounterWindow { start, end };
    window.check_sequence("note hashes", &inputs.note_hashes)?;
    window.check_sequence("nullifiers", &inputs.nullifiers)?;
    window.check_sequence("note hash read requests", &inputs.note_hash_read_requests)?;
    window.check_sequence("nullifier read requests", &inputs.nullifier_read_requests)?;
    window.check_sequence("L2-to-L1 messages", &inputs.l2_to_l1_msgs)?;
    window.check_sequence("encrypted log hashes", &inputs.encrypted_logs_hashes)?;
    window.check_sequence("unencrypted log hashes", &inputs.unencrypted_logs_hashes)?;
    window.check_sequence("public call requests", &inputs.public_call_requests)?;

    let mut previous_end = start;
    for request in inputs.private_call_requests.iter().filter(|request| !request.is_empty()) {
        let (call_start, call_end) =
            (request.start_side_effect_counter, request.end_side_effect_counter);
        if call_start >= call_end {
            return Err(CallStackError::InvalidCounterWindow { start: call_start, end: call_end });
        }
        if call_start <= previous_end {
            return Err(CallStackError::CounterNotIncreasing {
                name: "private call requests",
                counter: call_start,
                previous: previous_end,
            });
        }
        window.check_inside("private call requests", call_end)?;
        previous_end = call_end;
    }

    let teardown = &inputs.public_teardown_call_request;
    if !teardown.is_empty() {
        window.check_inside("public teardown call request", teardown.counter())?;
    }

    validate_unique_counters(inputs)?;

    let min_revertible = inputs.min_revertible_side_effect_counter;
    if min_revertible != 0 && (min_revertible <= start || min_revertible > end) {
        return Err(CallStackError::CounterOutsideWindow {
            name: "min revertible side effect counter",
            counter: min_revertible,
            start,
            end,
        });
    }

    Ok(())
}

fn validate_unique_counters(inputs: &PrivateCircuitPublicInputs) -> Result<(), CallStackError> {
    let mut counters = Vec::new();
    collect_counters(&mut counters, "note hashes", &inputs.note_hashes);
    collect_counters(&mut counters, "nullifiers", &inputs.nullifiers);
    collect_counters(&mut counters, "note hash read requests", &inputs.note_hash_read_requests);
    collect_counters(&mut counters, "nullifier read requests", &inputs.nullifier_read_requests);
    collect_counters(&mut counters, "L2-to-L1 messages", &inputs.l2_to_l1_msgs);
    collect_counters(&mut counters, "encrypted log hashes", &inputs.encrypted_logs_hashes);
    collect_counters(&mut counters, "unencrypted log hashes", &inputs.unencrypted_logs_hashes);
    collect_counters(&mut counters, "public call requests", &inputs.public_call_requests);
    collect_counters(
        &mut counters,
        "public teardown call request",
        core::slice::from_ref(&inputs.public_teardown_call_request),
    );

    for request in inputs.private_call_requests.iter().filter(|request| !request.is_empty()) {
        let (start, end) = (request.start_side_effect_counter, request.end_side_effect_counter);
        let inside = counters.iter().find(|(_, counter)| (start..=end).contains(counter));
        if let Some(&(name, counter)) = inside {
            return Err(CallStackError::CounterInsideNestedCall { name, counter, start, end });
        }
    }

    counters.sort_unstable_by_key(|&(_, counter)| counter);
    for pair in counters.windows(2) {
        if pair[0].1 == pair[1].1 {
            let (name, counter) = pair[1];
            return Err(CallStackError::DuplicateCounter { name, counter });
        }
    }

    Ok(())
}

fn collect_counters<T: Ordered + Empty>(
    counters: &mut Vec<(&'static str, u32)>,
    name: &'static str,
    items: &[T],
) {
    counters.extend(items.iter().filter(|item| !item.is_empty()).map(|item| (name, item.counter())));
}

#[derive(Debug, Clone, Copy)]
struct CounterWindow {
    start: u32,
    end: u32,
}

impl CounterWindow {
    fn check_inside(&self, name: &'static str, counter: u32) -> Result<(), CallStackError> {
        if counter <= self.start || counter >= self.end {
            return Err(CallStackError::CounterOutsideWindow {
                name,
                counter,
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    fn check_sequence<T: Ordered + Empty>(
        &self,
        name: &'static str,
        items: &[T],
    ) -> Result<(), CallStackError> {
        let mut previous = None;
        for counter in items.iter().filter(|item| !item.is_empty()).map(Ordered::counter) {
            self.check_inside(name, counter)?;
            match previous {
                Some(previous) if counter <= previous => {
                    return Err(CallStackError::CounterNotIncreasing { name, counter, previous });
                },
                _ => {},
            }
            previous = Some(counter);
        }
        Ok(())
    }
}
