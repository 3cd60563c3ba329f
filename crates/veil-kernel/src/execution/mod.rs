use alloc::vec::Vec;

use veil_objects::{
    Digest,
    address::ContractInstance,
    call::{PrivateCallStackItem, PublicCallStackItem},
    crypto::merkle::MerklePath,
};

use crate::errors::ExecutorError;

// FUNCTION WITNESS
// ================================================================================================

/// Data binding an executed private function to the address of its contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionWitness {
    pub contract_instance: ContractInstance,
    /// Hash of the verification key of the executed function.
    pub vk_hash: Digest,
    /// Position of the function's leaf in the private function tree of the contract class.
    pub function_leaf_index: u64,
    pub function_leaf_path: MerklePath,
}

// PRIVATE CALL DATA
// ================================================================================================

/// Everything a kernel iteration needs to process one private call frame.
///
/// Besides the frame's own call stack item, it carries the call stack items of every call the
/// frame requested, in request order, so the iteration can match each request against its callee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateCallData {
    pub call_stack_item: PrivateCallStackItem,
    pub private_call_stack: Vec<PrivateCallStackItem>,
    pub public_call_stack: Vec<PublicCallStackItem>,
    pub public_teardown_call: Option<PublicCallStackItem>,
    pub contract_instance: ContractInstance,
    pub vk_hash: Digest,
    pub function_leaf_index: u64,
    pub function_leaf_path: MerklePath,
}

// TRANSACTION TRACE
// ================================================================================================

#[derive(Debug, Clone)]
struct CallFrame {
    parent: Option<usize>,
    private_calls: Vec<usize>,
    public_calls: Vec<PublicCallStackItem>,
    public_teardown_call: Option<PublicCallStackItem>,
    data: Option<PrivateCallData>,
}

impl CallFrame {
    fn new(parent: Option<usize>) -> Self {
        Self {
            parent,
            private_calls: Vec::new(),
            public_calls: Vec::new(),
            public_teardown_call: None,
            data: None,
        }
    }
}

/// The call tree of a transaction's private execution.
///
/// Frames live in an arena and refer to each other by index. While the transaction executes, the
/// trace keeps an explicit stack of open frames: a frame is entered when its invocation starts
/// and exited, with its finished call stack item, when the invocation returns. Since callees
/// always finish before their caller, a frame's callee items are known when the frame exits.
#[derive(Debug, Clone, Default)]
pub struct TransactionTrace {
    frames: Vec<CallFrame>,
    open_frames: Vec<usize>,
}

impl TransactionTrace {
    pub fn new() -> Self {
        Self::default()
    }

    // RECORDING
    // --------------------------------------------------------------------------------------------

    /// Opens a frame nested in the currently open frame, if any, and returns its index.
    pub fn enter_frame(&mut self) -> usize {
        let index = self.frames.len();
        let parent = self.open_frames.last().copied();
        self.frames.push(CallFrame::new(parent));
        if let Some(parent) = parent {
            self.frames[parent].private_calls.push(index);
        }
        self.open_frames.push(index);
        index
    }

    /// Records a public call enqueued by the currently open frame.
    pub fn record_public_call(&mut self, item: PublicCallStackItem) -> Result<(), ExecutorError> {
        self.open_frame_mut()?.public_calls.push(item);
        Ok(())
    }

    /// Records the public teardown call set by the currently open frame.
    pub fn record_public_teardown_call(
        &mut self,
        item: PublicCallStackItem,
    ) -> Result<(), ExecutorError> {
        let frame = self.open_frame_mut()?;
        if frame.public_teardown_call.is_some() {
            return Err(ExecutorError::other("public teardown call recorded twice for one frame"));
        }
        frame.public_teardown_call = Some(item);
        Ok(())
    }

    /// Closes the currently open frame with its finished call stack item.
    ///
    /// # Errors
    /// Returns an error if no frame is open or a callee of the frame was never closed.
    pub fn exit_frame(
        &mut self,
        call_stack_item: PrivateCallStackItem,
        witness: FunctionWitness,
    ) -> Result<usize, ExecutorError> {
        let index = self
            .open_frames
            .pop()
            .ok_or_else(|| ExecutorError::other("no open call frame to exit"))?;

        let private_call_stack = self.frames[index]
            .private_calls
            .iter()
            .map(|&callee| {
                self.frames[callee]
                    .data
                    .as_ref()
                    .map(|data| data.call_stack_item.clone())
                    .ok_or_else(|| ExecutorError::other("callee frame exited after its caller"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let frame = &mut self.frames[index];
        frame.data = Some(PrivateCallData {
            call_stack_item,
            private_call_stack,
            public_call_stack: core::mem::take(&mut frame.public_calls),
            public_teardown_call: frame.public_teardown_call.take(),
            contract_instance: witness.contract_instance,
            vk_hash: witness.vk_hash,
            function_leaf_index: witness.function_leaf_index,
            function_leaf_path: witness.function_leaf_path,
        });

        Ok(index)
    }

    // ACCESSORS
    // --------------------------------------------------------------------------------------------

    /// Returns the number of recorded frames.
    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    /// Returns the number of frames which were entered but not yet exited.
    pub fn num_unfinished_frames(&self) -> usize {
        self.frames.iter().filter(|frame| frame.data.is_none()).count()
    }

    pub fn frame(&self, index: usize) -> Option<&PrivateCallData> {
        self.frames.get(index).and_then(|frame| frame.data.as_ref())
    }

    pub fn parent(&self, index: usize) -> Option<usize> {
        self.frames.get(index).and_then(|frame| frame.parent)
    }

    /// Returns the indices of the private callees of a frame, in call order.
    pub fn children(&self, index: usize) -> &[usize] {
        self.frames.get(index).map(|frame| frame.private_calls.as_slice()).unwrap_or(&[])
    }

    /// Returns the finished frames in the order the kernel processes them.
    ///
    /// The kernel pops requests from the accumulated private call stack, to which every frame
    /// pushes its requests in reverse. Frames are therefore processed depth-first, callees in
    /// call order.
    pub fn kernel_order(&self) -> Vec<&PrivateCallData> {
        let mut ordered = Vec::with_capacity(self.frames.len());
        let mut stack: Vec<usize> = self
            .frames
            .iter()
            .enumerate()
            .filter(|(_, frame)| frame.parent.is_none())
            .map(|(index, _)| index)
            .rev()
            .collect();

        while let Some(index) = stack.pop() {
            let frame = &self.frames[index];
            if let Some(data) = frame.data.as_ref() {
                ordered.push(data);
            }
            stack.extend(frame.private_calls.iter().rev());
        }

        ordered
    }

    fn open_frame_mut(&mut self) -> Result<&mut CallFrame, ExecutorError> {
        let index = *self
            .open_frames
            .last()
            .ok_or_else(|| ExecutorError::other("no open call frame"))?;
        Ok(&mut self.frames[index])
    }
}
