pub mod policy;
pub mod run;

pub use policy::print_policy;
pub use run::{RunArgs, RunSummary, run_pipeline};
