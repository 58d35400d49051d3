// seatflow/src/flow/mod.rs

//! A small async step engine.
//!
//! A [`Flow`] is an ordered list of named steps over a shared
//! [`ContextData<TData>`]. Each step can carry `before`, `on` and `after`
//! handlers; any handler may halt the run or fail it with the flow's error
//! type. Flows are registered in a [`FlowRegistry`] keyed by their context
//! type, so callers only need to build a context and call `run`.

pub mod context_data;
pub mod control;
pub mod definition;
pub mod execution;
pub mod registry;
pub mod step;

pub use context_data::ContextData;
pub use control::{FlowOutcome, StepControl};
pub use definition::{Flow, Handler};
pub use registry::FlowRegistry;
pub use step::{SkipCondition, StepDef};
