//! Assessment runs: question resolution, the run state machine, its countdown,
//! and score derivation.

pub mod countdown;
pub mod result;
pub mod run;
pub mod runner;
pub mod source;

pub use result::{AssessmentResult, DetailedResult};
pub use run::{RunError, RunSnapshot};
pub use runner::{AssessmentRunner, Navigation, Outcome, RunEvent, RunHandle};
pub use source::{FallbackProvider, QuestionSource, SourceError};
