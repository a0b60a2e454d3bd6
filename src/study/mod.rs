//! Feature flows built on the retrieval and generation layers.

pub mod answer;
pub mod condense;
pub mod flashcards;
pub mod mcq;
pub mod summary;

pub use answer::{answer_question, Answer};
pub use flashcards::{generate_flashcards, Flashcard};
pub use mcq::{generate_mcqs, Choice, Mcq};
pub use summary::{summarize, SummaryRecord};
