//! Process exit codes. Scripts depend on these values.

pub const SUCCESS: i32 = 0;
pub const RUN_FAILED: i32 = 1; // Service or judge failure; partial results were printed
pub const CONFIG_ERROR: i32 = 2; // Bad config, dataset, prompts or arguments
pub const CANCELLED: i32 = 130; // Interrupted with Ctrl-C
