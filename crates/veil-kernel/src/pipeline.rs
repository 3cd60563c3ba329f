use veil_objects::{
    kernel::{KernelCircuitPublicInputs, PublicKernelCircuitPublicInputs},
    side_effect::Empty,
    transaction::TxRequest,
};

use crate::{
    errors::KernelError,
    execution::TransactionTrace,
    hints::{TailHintsBuilder, TailWitnesses},
    host::MembershipOracle,
    kernel::PrivateKernel,
};

// KERNEL OUTPUT
// ================================================================================================

/// The final public inputs of the private part of a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelOutput {
    /// The transaction has no public phase.
    Private(KernelCircuitPublicInputs),
    /// The transaction continues with enqueued public calls.
    Public(PublicKernelCircuitPublicInputs),
}

impl KernelOutput {
    pub fn is_public(&self) -> bool {
        matches!(self, Self::Public(_))
    }
}

// KERNEL PIPELINE
// ================================================================================================

/// Runs every kernel stage over the recorded private execution of a transaction.
pub struct KernelPipeline<M> {
    kernel: PrivateKernel<M>,
}

impl<M: MembershipOracle> KernelPipeline<M> {
    pub fn new(oracle: M) -> Self {
        Self { kernel: PrivateKernel::new(oracle) }
    }

    pub fn kernel(&self) -> &PrivateKernel<M> {
        &self.kernel
    }

    /// Folds the frames of `trace` through the kernel iterations and composes the result with the
    /// tail matching the transaction's shape.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The trace is empty or some of its frames never returned.
    /// - Any kernel iteration rejects its frame.
    /// - Tail hints cannot be built from `witnesses`.
    /// - The tail rejects the accumulated output.
    pub fn run(
        &self,
        tx_request: &TxRequest,
        trace: &TransactionTrace,
        witnesses: &TailWitnesses,
    ) -> Result<KernelOutput, KernelError> {
        let unfinished = trace.num_unfinished_frames();
        if unfinished != 0 {
            return Err(KernelError::UnfinishedCallFrames(unfinished));
        }

        let mut frames = trace.kernel_order().into_iter();
        let entry = frames.next().ok_or(KernelError::EmptyTrace)?;

        let mut public_inputs = self.kernel.init(tx_request, entry)?;
        for call in frames {
            public_inputs = self.kernel.inner(public_inputs, call)?;
        }

        let hints = TailHintsBuilder::new(witnesses).build(&public_inputs)?;
        let has_public_phase = !public_inputs.end.public_call_stack.is_empty()
            || !public_inputs.public_teardown_call_request.is_empty();

        log::debug!(
            "Processed all call frames [frames={}, public_phase={}]",
            trace.num_frames(),
            has_public_phase
        );

        if has_public_phase {
            self.kernel.tail_to_public(public_inputs, &hints).map(KernelOutput::Public)
        } else {
            self.kernel.tail(public_inputs, &hints).map(KernelOutput::Private)
        }
    }
}
