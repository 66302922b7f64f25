//! Answer generation: prompt assembly and model invocation

pub mod answer;
pub mod prompt;

pub use answer::{AnswerGenerator, GenerationSettings};
pub use prompt::PromptAssembler;
