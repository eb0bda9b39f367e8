pub mod checks;
pub mod context;
pub mod corrections;
pub mod loader;
pub mod pipeline;
pub mod processing;
pub mod progress;
pub mod reduction;
pub mod sequencer;
pub mod serialization;

mod traits;

pub use context::CorrectionContext;
pub use loader::{JsonRunSource, RunSource, load_runs};
pub use pipeline::run_plan;
pub use reduction::{CorrectionExecutor, ReductionInputs, ReductionOutput, SansReduction};
pub use sequencer::{CorrectionStep, plan_for, run_sequence};
pub use traits::StepExecutor;
