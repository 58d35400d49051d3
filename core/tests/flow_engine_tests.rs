// tests/flow_engine_tests.rs
mod common;

use common::*;
use seatflow::{ContextData, Flow, FlowError, FlowOutcome, FlowRegistry, StepControl};
use serial_test::serial;
use std::sync::Arc;

#[tokio::test]
#[serial]
async fn test_flow_runs_steps_in_order() {
  setup_tracing();
  let mut flow =
    Flow::<TestContext, TestError>::new("ordered", &[("step1", false, None), ("step2", false, None), ("step3", false, None)]);

  flow.on("step1", create_simple_handler("step1", " S1"));
  flow.on("step2", create_simple_handler("step2", " S2"));
  flow.on("step3", create_simple_handler("step3", " S3"));

  let ctx = ContextData::new(TestContext::default());
  let result = flow.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), FlowOutcome::Completed);
  let guard = ctx.read();
  assert_eq!(guard.counter, 3);
  assert_eq!(guard.message, " S1 S2 S3");
  assert_eq!(guard.steps_executed, vec!["step1", "step2", "step3"]);
}

#[tokio::test]
#[serial]
async fn test_before_on_after_run_in_phase_order() {
  setup_tracing();
  let mut flow = Flow::<TestContext, TestError>::new("phases", &[("only", false, None)]);

  flow.after("only", create_simple_handler("after", "c"));
  flow.on("only", create_simple_handler("on", "b"));
  flow.before("only", create_simple_handler("before", "a"));

  let ctx = ContextData::new(TestContext::default());
  flow.run(ctx.clone()).await.unwrap();

  assert_eq!(ctx.read().message, "abc");
  assert_eq!(ctx.read().steps_executed, vec!["before", "on", "after"]);
}

#[tokio::test]
#[serial]
async fn test_halt_stops_remaining_handlers_and_steps() {
  setup_tracing();
  let mut flow = Flow::<TestContext, TestError>::new(
    "halting",
    &[("stepA", false, None), ("haltStep", false, None), ("stepC", false, None)],
  );

  flow.on("stepA", create_simple_handler("stepA", "A"));
  flow.on("haltStep", create_simple_handler("haltStep", "H"));
  flow.after("haltStep", create_simple_handler("afterHalt", "X"));
  flow.on("stepC", create_simple_handler("stepC", "C"));

  let ctx = ContextData::new(TestContext {
    halt_at: Some("haltStep".to_string()),
    ..Default::default()
  });
  let result = flow.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), FlowOutcome::Halted);
  let guard = ctx.read();
  assert_eq!(guard.message, "AH");
  assert_eq!(guard.steps_executed, vec!["stepA", "haltStep"]);
}

#[tokio::test]
#[serial]
async fn test_flow_propagates_handler_error() {
  setup_tracing();
  let mut flow = Flow::<TestContext, TestError>::new(
    "failing",
    &[("good_step", false, None), ("bad_step", false, None), ("another_step", false, None)],
  );

  flow.on("good_step", create_simple_handler("good_step", "Good"));
  flow.on("bad_step", create_failing_handler("bad_step", "I am a bad step!"));
  flow.on("another_step", create_simple_handler("another_step", "NeverRun"));

  let ctx = ContextData::new(TestContext::default());
  let result = flow.run(ctx.clone()).await;

  assert_eq!(result.unwrap_err(), TestError::Handler("I am a bad step!".to_string()));
  let guard = ctx.read();
  assert_eq!(guard.message, "Good");
  assert_eq!(guard.steps_executed, vec!["good_step", "bad_step"]);
}

#[tokio::test]
#[serial]
async fn test_flow_skips_step_if_condition_met() {
  setup_tracing();
  let mut flow = Flow::<TestContext, TestError>::new(
    "skipping",
    &[
      ("step1", false, None),
      (
        "step_to_skip",
        false,
        Some(Arc::new(|ctx: ContextData<TestContext>| ctx.read().counter > 0)),
      ),
      ("step3", false, None),
    ],
  );

  flow.on("step1", create_simple_handler("step1", " S1"));
  flow.on("step_to_skip", create_simple_handler("step_to_skip", " SKIPPED"));
  flow.on("step3", create_simple_handler("step3", " S3"));

  let ctx = ContextData::new(TestContext::default());
  assert_eq!(flow.run(ctx.clone()).await.unwrap(), FlowOutcome::Completed);

  let guard = ctx.read();
  assert_eq!(guard.message, " S1 S3");
  assert_eq!(guard.steps_executed, vec!["step1", "step3"]);
}

#[tokio::test]
#[serial]
async fn test_required_step_without_handlers_fails() {
  setup_tracing();
  let mut flow = Flow::<TestContext, TestError>::new("missing", &[("step1", false, None), ("unwired", false, None)]);
  flow.on("step1", create_simple_handler("step1", "1"));

  let ctx = ContextData::new(TestContext::default());
  match flow.run(ctx.clone()).await {
    Err(TestError::Flow(msg)) => assert!(msg.contains("HandlerMissing"), "unexpected message: {msg}"),
    other => panic!("Expected HandlerMissing, got {:?}", other),
  }
  assert_eq!(ctx.read().steps_executed, vec!["step1"]);
}

#[tokio::test]
#[serial]
async fn test_optional_step_without_handlers_is_passed_over() {
  setup_tracing();
  let mut flow = Flow::<TestContext, TestError>::new(
    "optional",
    &[("step1", false, None), ("maybe", true, None), ("step3", false, None)],
  );
  flow.on("step1", create_simple_handler("step1", "1"));
  flow.on("step3", create_simple_handler("step3", "3"));

  let ctx = ContextData::new(TestContext::default());
  assert_eq!(flow.run(ctx.clone()).await.unwrap(), FlowOutcome::Completed);
  assert_eq!(ctx.read().message, "13");
}

#[tokio::test]
#[serial]
async fn test_insert_and_remove_steps() {
  setup_tracing();
  let mut flow = Flow::<TestContext, TestError>::new("mutable", &[("first", false, None), ("last", false, None)]);
  flow.insert_after_step("first", "middle", false, None);
  flow.on("first", create_simple_handler("first", "F"));
  flow.on("middle", create_simple_handler("middle", "M"));
  flow.on("last", create_simple_handler("last", "L"));
  assert_eq!(flow.step_names(), vec!["first", "middle", "last"]);

  let ctx = ContextData::new(TestContext::default());
  flow.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().message, "FML");

  flow.remove_step("middle");
  assert_eq!(flow.step_names(), vec!["first", "last"]);
  let ctx = ContextData::new(TestContext::default());
  flow.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().message, "FL");
}

#[test]
#[should_panic(expected = "has no step named")]
fn test_registering_handler_for_unknown_step_panics() {
  let mut flow = Flow::<TestContext, TestError>::new("typo", &[("real", false, None)]);
  flow.on("reel", create_simple_handler("reel", ""));
}

#[tokio::test]
#[serial]
async fn test_registry_runs_flow_for_context_type() {
  setup_tracing();
  let registry = FlowRegistry::<TestError>::new();

  let mut flow = Flow::<TestContext, TestError>::new("registered", &[("only", false, None)]);
  flow.on("only", create_simple_handler("only", "ran"));
  registry.register(flow);

  let mut other = Flow::<OtherContext, TestError>::new("other", &[("bump", false, None)]);
  other.on("bump", |ctx: ContextData<OtherContext>| async move {
    ctx.write().value += 10;
    Ok::<_, TestError>(StepControl::Continue)
  });
  registry.register(other);

  assert!(registry.is_registered::<TestContext>());
  assert!(registry.is_registered::<OtherContext>());

  let ctx = ContextData::new(TestContext::default());
  assert_eq!(registry.run(ctx.clone()).await.unwrap(), FlowOutcome::Completed);
  assert_eq!(ctx.read().message, "ran");

  let other_ctx = ContextData::new(OtherContext::default());
  registry.run(other_ctx.clone()).await.unwrap();
  assert_eq!(other_ctx.read().value, 10);
}

#[tokio::test]
#[serial]
async fn test_registry_reports_unregistered_context() {
  setup_tracing();
  let registry = FlowRegistry::<TestError>::new();
  let result = registry.run(ContextData::new(OtherContext::default())).await;
  match result {
    Err(TestError::Flow(msg)) => assert!(msg.contains("NotRegistered")),
    other => panic!("Expected NotRegistered, got {:?}", other),
  }
}

#[tokio::test]
#[serial]
async fn test_handler_errors_convert_through_anyhow() {
  setup_tracing();
  let mut flow = Flow::<OtherContext, FlowError>::new("anyhow", &[("fails", false, None)]);
  flow.on("fails", |_ctx: ContextData<OtherContext>| async move {
    Err::<StepControl, _>(anyhow::anyhow!("backend unavailable"))
  });

  let err = flow.run(ContextData::new(OtherContext::default())).await.unwrap_err();
  assert!(matches!(err, FlowError::HandlerError { .. }));
  assert_eq!(err.to_string(), "Handler failed: backend unavailable");
}

#[tokio::test]
#[serial]
async fn test_context_can_be_reclaimed_after_run() {
  setup_tracing();
  let mut flow = Flow::<TestContext, TestError>::new("reclaim", &[("only", false, None)]);
  flow.on("only", create_simple_handler("only", "done"));

  let ctx = ContextData::new(TestContext::default());
  let extra = ctx.clone();
  flow.run(ctx.clone()).await.unwrap();

  let ctx = ctx.try_unwrap().expect_err("another handle is still alive");
  drop(extra);
  let data = ctx.try_unwrap().unwrap();
  assert_eq!(data.message, "done");
}
