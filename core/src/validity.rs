//! Static-combo validity predicates.

/// Answers whether a static combo of one entry is reachable.
///
/// Skipped static combos still occupy command numbers; iteration steps over
/// them. Implementations must be callable from any number of threads.
pub trait ComboValidity: Send + Sync {
    fn is_valid(&self, static_index: u64) -> bool;
}

impl<F> ComboValidity for F
where
    F: Fn(u64) -> bool + Send + Sync,
{
    fn is_valid(&self, static_index: u64) -> bool {
        self(static_index)
    }
}

/// Predicate for entries without skip rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllValid;

impl ComboValidity for AllValid {
    fn is_valid(&self, _static_index: u64) -> bool {
        true
    }
}
