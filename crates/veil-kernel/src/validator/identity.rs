use veil_objects::address::compute_function_leaf;

use crate::{errors::CallStackError, execution::PrivateCallData, host::MembershipOracle};

/// Re-derives the address of the contract a private call frame claims to run in.
///
/// The private function tree root is recomputed from the function's leaf and sibling path, so the
/// derived address also proves that the executed function belongs to the contract's class.
///
/// # Errors
/// Returns an error if the sibling path does not fit the leaf index, or if the derived address
/// differs from the frame's contract address.
pub fn validate_contract_identity<M: MembershipOracle + ?Sized>(
    call: &PrivateCallData,
    oracle: &M,
) -> Result<(), CallStackError> {
    let item = &call.call_stack_item;
    let selector = item.function_data.selector;

    let leaf = compute_function_leaf(selector, call.vk_hash);
    let private_functions_root = oracle
        .compute_root(leaf, call.function_leaf_index, &call.function_leaf_path)
        .map_err(|source| CallStackError::FunctionMembershipFailed { selector, source })?;

    let computed = call.contract_instance.address(private_functions_root);
    if computed != item.contract_address {
        return Err(CallStackError::IdentityRecomputation {
            claimed: item.contract_address,
            computed,
        });
    }

    Ok(())
}
