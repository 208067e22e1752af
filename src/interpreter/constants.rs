// Default evaluation limits

/// Iterations a single `while`/`for` may run before the pass halts
pub const DEFAULT_MAX_LOOP_ITERATIONS: usize = 10_000;

/// Nested user function calls allowed at once
pub const DEFAULT_MAX_CALL_DEPTH: usize = 128;

/// Node visits allowed in one pass; each visit records two steps
pub const DEFAULT_MAX_STEPS: usize = 500_000;

/// Scope id of the global scope; every other scope gets a larger one
pub const GLOBAL_SCOPE_ID: u64 = 0;
