// seatflow/src/flow/control.rs

//! Signals for controlling flow execution and the outcome of a run.

/// Returned by every handler: keep going, or halt the flow right here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepControl {
  Continue,
  /// Stop the current step immediately. No further handlers run, in this step or later ones.
  /// Halting is not an error: the run reports `FlowOutcome::Halted`.
  Halt,
}

/// Outcome of a full flow run that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
  /// Every non-skipped step ran to the end.
  Completed,
  /// A handler returned `StepControl::Halt`.
  Halted,
}
