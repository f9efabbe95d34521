// Constants for the bytecode interpreter

/// Default cap on live activation records
pub const DEFAULT_MAX_CALL_DEPTH: usize = 10_000;

/// Bounds on a single run
///
/// Exceeding `max_call_depth` is a stack overflow; exceeding `max_steps`
/// (instructions executed) stops the run so a driver can impose a timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionLimits {
    pub max_call_depth: usize,
    /// `None` runs until the program finishes
    pub max_steps: Option<u64>,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        ExecutionLimits {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            max_steps: None,
        }
    }
}
