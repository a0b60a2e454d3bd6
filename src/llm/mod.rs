//! Generation side of the pipeline: prompts, the completion client and
//! output sanitization.

pub mod client;
pub mod prompts;
pub mod sanitize;

pub use client::{ChatClient, Completion, CompletionError, CompletionRequest, ErrorKind};
pub use prompts::{AnswerStyle, Difficulty, Focus};
