//! Scenario text parser.
//!
//! Splits a scenario document into test cases (`## name`), each holding its
//! ordered steps and the free-text comments (`# note`) written around them.

pub mod errors;
pub mod model;
pub mod parser;

pub use errors::ScenarioError;
pub use model::{StepInfo, TestCase};
pub use parser::{ensure_workflow_dir, parse_file, parse_scenario, split_step_line, workflow_for_path};
