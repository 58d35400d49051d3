// seatflow/src/flow/execution.rs

use crate::error::FlowError;
use crate::flow::context_data::ContextData;
use crate::flow::control::{FlowOutcome, StepControl};
use crate::flow::definition::Flow;
use crate::flow::step::StepDef;
use tracing::{event, instrument, span, Instrument, Level};

enum Phase {
  Proceed,
  Halted,
}

impl<TData, Err> Flow<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Runs every step in order against `ctx_data`.
  ///
  /// Within a step the `before`, `on` and `after` handlers run in
  /// registration order. A step whose `skip_if` predicate holds is skipped.
  /// A required step with no handlers at all fails with
  /// [`FlowError::HandlerMissing`].
  #[instrument(
    name = "Flow::run",
    skip_all,
    fields(flow = self.name, num_steps = self.steps.len()),
    err(Display)
  )]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<FlowOutcome, Err> {
    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_span = span!(Level::DEBUG, "flow_step", step = step_def.name.as_str(), index = step_idx);
      if let Phase::Halted = self.run_step(step_def, &ctx_data).instrument(step_span).await? {
        return Ok(FlowOutcome::Halted);
      }
    }

    event!(Level::DEBUG, "flow completed");
    Ok(FlowOutcome::Completed)
  }

  async fn run_step(&self, step_def: &StepDef<TData>, ctx_data: &ContextData<TData>) -> Result<Phase, Err> {
    let step_name = step_def.name.as_str();

    if let Some(skip_if) = &step_def.skip_if {
      if skip_if(ctx_data.clone()) {
        event!(Level::DEBUG, "step skipped by condition");
        return Ok(Phase::Proceed);
      }
    }

    let has_handlers = [&self.before, &self.on, &self.after]
      .iter()
      .any(|phase| phase.get(step_name).is_some_and(|v| !v.is_empty()));
    if !has_handlers {
      if step_def.optional {
        event!(Level::DEBUG, "optional step has no handlers");
        return Ok(Phase::Proceed);
      }
      event!(Level::ERROR, "required step has no handlers");
      return Err(Err::from(FlowError::HandlerMissing {
        flow: self.name.to_string(),
        step_name: step_def.name.clone(),
      }));
    }

    for (phase_name, handlers) in [("before", &self.before), ("on", &self.on), ("after", &self.after)] {
      let Some(handlers) = handlers.get(step_name) else {
        continue;
      };
      for handler in handlers {
        match handler(ctx_data.clone()).await {
          Ok(StepControl::Continue) => {}
          Ok(StepControl::Halt) => {
            event!(Level::INFO, step = step_name, phase = phase_name, "flow halted");
            return Ok(Phase::Halted);
          }
          Err(e) => {
            event!(Level::WARN, step = step_name, phase = phase_name, error = %e, "handler failed");
            return Err(e);
          }
        }
      }
    }
    Ok(Phase::Proceed)
  }
}
