//! Fault taxonomy, the pending fault queue and the fail-stop emergency path.

mod exit_handler;
mod fault;

pub use exit_handler::{ExitHook, SafetyHandler};
pub use fault::{FaultKind, FaultRecord, LoopKind, PendingFaults};
