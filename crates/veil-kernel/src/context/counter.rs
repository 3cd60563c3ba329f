// SIDE EFFECT COUNTER
// ================================================================================================

/// The transaction-wide source of side-effect counters.
///
/// A single counter is threaded by mutable reference through every invocation of a transaction.
/// Counter zero is reserved for the protocol nullifier, so the first invocation starts at one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideEffectCounter {
    next: u32,
}

impl SideEffectCounter {
    /// The first counter handed out to function invocations.
    pub const FIRST: u32 = 1;

    pub fn new() -> Self {
        Self { next: Self::FIRST }
    }

    /// Returns the next counter and advances past it.
    pub fn allocate(&mut self) -> u32 {
        let counter = self.next;
        self.next += 1;
        counter
    }

    /// Returns the counter the next call to [Self::allocate] will hand out.
    pub fn current(&self) -> u32 {
        self.next
    }
}

impl Default for SideEffectCounter {
    fn default() -> Self {
        Self::new()
    }
}
