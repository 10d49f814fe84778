//! Exercises, their per-attempt evaluation and the session protocol.
//!
//! An [`Exercise`] bundles author callbacks behind explicit [`Signature`]s.
//! A [`ParametrizedExercise`] evaluates one attempt of it stage by stage;
//! an [`ExerciseRunner`] drives an attempt against a frontend, and the
//! [`ExerciseTestSuite`] checks an exercise definition before it is used.

pub mod callback;
pub mod engine;
pub mod exercise;
pub mod inputs;
pub mod outputs;
pub mod record;
pub mod runner;
pub mod samples;
pub mod testing;

pub use callback::{Args, Callback, Kwargs, Signature};
pub use engine::{Answers, GlobalParameters, Params, ParametrizedExercise, Scores, Summary};
pub use exercise::{Exercise, Metadata, Settings, Weights};
pub use inputs::InputGenerator;
pub use outputs::{FieldScore, Hints, ScoreOutput, SolutionOutput};
pub use record::{AttemptRecord, MemoryStore, ResultStore};
pub use runner::{ExerciseRunner, Message, RunnerError, RunnerState, TemplateKind};
pub use testing::{CheckResult, ExerciseTestSuite, Outcome, TestReport};
