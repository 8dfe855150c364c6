//! Quiz policy engine: which word to ask, how to ask it, and how to grade it.

pub mod grading;
pub mod question;
pub mod selector;

pub use grading::{grade, AnswerResult};
pub use question::build_question;
pub use selector::{PoolSpec, WordSelector};
