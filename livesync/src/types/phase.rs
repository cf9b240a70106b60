/// Phase reported once a backup or restore finished without errors.
pub const PHASE_COMPLETED: &str = "Completed";

/// Phase reported once a backup or restore failed entirely.
pub const PHASE_FAILED: &str = "Failed";

/// Phase reported once a backup or restore finished with per-item errors.
pub const PHASE_PARTIALLY_FAILED: &str = "PartiallyFailed";

/// Phase reported while a backup or restore is still running.
pub const PHASE_IN_PROGRESS: &str = "InProgress";

/// Phase reported when a storage location stops being reachable.
pub const PHASE_UNAVAILABLE: &str = "Unavailable";

/// Returns whether the phase is the successful terminal phase.
pub fn is_success_terminal(phase: &str) -> bool {
    phase == PHASE_COMPLETED
}

/// Returns whether the phase is a failed or partially failed terminal phase.
pub fn is_failure_terminal(phase: &str) -> bool {
    phase == PHASE_FAILED || phase == PHASE_PARTIALLY_FAILED
}

/// Returns whether the phase is terminal, meaning no further state
/// transition is expected for the resource.
pub fn is_terminal(phase: &str) -> bool {
    is_success_terminal(phase) || is_failure_terminal(phase)
}
