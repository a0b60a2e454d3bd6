use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

use crate::llm::{AnswerStyle, Difficulty};

pub const DEFAULT_SUMMARY_WORDS: u16 = 200;
pub const DEFAULT_FLASHCARDS: u16 = 5;
pub const DEFAULT_MCQS: u16 = 5;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct OutputArgs {
    /// Also write the results as CSV
    #[clap(long)]
    pub csv: Option<PathBuf>,

    /// Also write a paginated plain-text report
    #[clap(long)]
    pub report: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the passages a document is split into
    Chunks {
        /// A PDF or plain text document
        file: PathBuf,
    },
    /// Answer a question from the document
    Ask {
        file: PathBuf,

        question: String,

        #[clap(short, long, value_enum, default_value_t = AnswerStyle::Direct)]
        style: AnswerStyle,

        /// Passages handed to the model. Defaults to retrieval.top_k
        #[clap(short = 'k', long, value_parser = clap::value_parser!(u16).range(1..))]
        top_k: Option<u16>,

        #[clap(flatten)]
        output: OutputArgs,
    },
    /// Summarize the document
    Summarize {
        file: PathBuf,

        /// Approximate summary length in words
        #[clap(short, long, default_value_t = DEFAULT_SUMMARY_WORDS,
            value_parser = clap::value_parser!(u16).range(50..=1000))]
        words: u16,

        /// Concept to focus on. The whole document when omitted
        #[clap(short, long)]
        focus: Option<String>,

        #[clap(flatten)]
        output: OutputArgs,
    },
    /// Generate study flashcards
    Flashcards {
        file: PathBuf,

        /// Number of cards
        #[clap(short = 'n', long, default_value_t = DEFAULT_FLASHCARDS,
            value_parser = clap::value_parser!(u16).range(3..=20))]
        count: u16,

        #[clap(short, long)]
        focus: Option<String>,

        #[clap(flatten)]
        output: OutputArgs,
    },
    /// Generate multiple-choice questions
    Mcq {
        file: PathBuf,

        /// Number of questions
        #[clap(short = 'n', long, default_value_t = DEFAULT_MCQS,
            value_parser = clap::value_parser!(u16).range(3..=15))]
        count: u16,

        #[clap(short, long, value_enum, default_value_t = Difficulty::Medium)]
        difficulty: Difficulty,

        #[clap(short, long)]
        focus: Option<String>,

        #[clap(flatten)]
        output: OutputArgs,
    },
    /// Interactive study session
    Shell {
        /// Document to start with
        file: Option<PathBuf>,
    },
}
