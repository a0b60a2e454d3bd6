//! Interactive study session on top of one [`Session`].

use std::fmt;
use std::path::PathBuf;

use anyhow::{bail, Result};
use inquire::error::{InquireError, InquireResult};
use inquire::validator::Validation;
use inquire::{CustomType, CustomUserError, Select, Text};

use crate::app::{HistoryKind, Session};
use crate::cli::{DEFAULT_FLASHCARDS, DEFAULT_MCQS, DEFAULT_SUMMARY_WORDS};
use crate::eid::Eid;
use crate::export;
use crate::llm::{AnswerStyle, Difficulty, Focus};
use crate::study::Choice;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Ask(AnswerStyle),
    Summarize,
    Flashcards,
    Mcqs,
    Quiz,
    History,
    Delete,
    Clear,
    ExportCsv,
    ExportReport,
    Load,
    Info,
    Quit,
}

impl Action {
    const ALL: [Action; 15] = [
        Action::Ask(AnswerStyle::Direct),
        Action::Ask(AnswerStyle::Eli5),
        Action::Ask(AnswerStyle::Insights),
        Action::Summarize,
        Action::Flashcards,
        Action::Mcqs,
        Action::Quiz,
        Action::History,
        Action::Delete,
        Action::Clear,
        Action::ExportCsv,
        Action::ExportReport,
        Action::Load,
        Action::Info,
        Action::Quit,
    ];
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Action::Ask(AnswerStyle::Direct) => "Ask a question",
            Action::Ask(AnswerStyle::Eli5) => "Explain like I'm five",
            Action::Ask(AnswerStyle::Insights) => "Get insights",
            Action::Summarize => "Summarize",
            Action::Flashcards => "Generate flashcards",
            Action::Mcqs => "Generate MCQs",
            Action::Quiz => "Take an MCQ quiz",
            Action::History => "Show history",
            Action::Delete => "Delete a history entry",
            Action::Clear => "Clear a history",
            Action::ExportCsv => "Export history as CSV",
            Action::ExportReport => "Export history as report",
            Action::Load => "Load another document",
            Action::Info => "Document info",
            Action::Quit => "Quit",
        };
        f.write_str(label)
    }
}

/// Menu entry pointing at a history item.
struct Pick {
    id: Eid,
    label: String,
}

impl fmt::Display for Pick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// `Ok(None)` when the user backed out with Esc.
fn optional<T>(result: InquireResult<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled) => Ok(None),
        Err(err) => bail!("An error occurred: {}", err),
    }
}

fn in_range(min: u16, max: u16) -> impl Fn(&u16) -> Result<Validation, CustomUserError> + Clone {
    move |value: &u16| {
        Ok(if (min..=max).contains(value) {
            Validation::Valid
        } else {
            Validation::Invalid(format!("between {min} and {max}").into())
        })
    }
}

fn preview(text: &str) -> String {
    const MAX: usize = 60;
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() > MAX {
        format!("{}...", line.chars().take(MAX).collect::<String>())
    } else {
        line.to_string()
    }
}

pub fn run(mut session: Session, initial: Option<PathBuf>) -> Result<()> {
    if let Some(path) = initial {
        load(&mut session, path);
    }

    loop {
        let action = match Select::new("What next?", Action::ALL.to_vec()).prompt() {
            Ok(action) => action,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => return Ok(()),
            Err(err) => bail!("An error occurred: {}", err),
        };

        let outcome = match action {
            Action::Quit => return Ok(()),
            Action::Ask(style) => ask(&mut session, style),
            Action::Summarize => summarize(&mut session),
            Action::Flashcards => flashcards(&mut session),
            Action::Mcqs => mcqs(&mut session),
            Action::Quiz => quiz(&session),
            Action::History => history(&session),
            Action::Delete => delete(&mut session),
            Action::Clear => clear(&mut session),
            Action::ExportCsv => export_history(&session, false),
            Action::ExportReport => export_history(&session, true),
            Action::Load => match optional(Text::new("Document path:").prompt())? {
                Some(path) => {
                    load(&mut session, PathBuf::from(path.trim()));
                    Ok(())
                }
                None => Ok(()),
            },
            Action::Info => {
                match session.document_info() {
                    Some(info) => println!("{}", serde_json::to_string_pretty(&info)?),
                    None => println!("No document loaded."),
                }
                Ok(())
            }
        };

        if let Err(err) = outcome {
            println!("{err}");
        }
    }
}

fn load(session: &mut Session, path: PathBuf) {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let result = std::fs::read(&path)
        .map_err(anyhow::Error::from)
        .and_then(|bytes| Ok(session.load_document(&name, &bytes)?.passages().len()));

    match result {
        Ok(passages) => println!("Loaded {name} ({passages} passages)"),
        Err(err) => println!("Could not load {}: {err}", path.display()),
    }
}

fn ask_focus() -> Result<Option<Focus>> {
    let input = optional(
        Text::new("Focus on:")
            .with_default("Entire document")
            .with_help_message("a concept, or leave as is for the whole document")
            .prompt(),
    )?;
    Ok(input.map(|input| Focus::from_input(&input)))
}

fn ask(session: &mut Session, style: AnswerStyle) -> Result<()> {
    let Some(question) = optional(Text::new("Question:").prompt())? else {
        return Ok(());
    };
    if question.trim().is_empty() {
        return Ok(());
    }

    let entry = session.ask(question.trim(), style)?;
    println!("\n{}\n", entry.item.answer);
    Ok(())
}

fn summarize(session: &mut Session) -> Result<()> {
    let Some(words) = optional(
        CustomType::<u16>::new("Summary length in words:")
            .with_default(DEFAULT_SUMMARY_WORDS)
            .with_validator(in_range(50, 1000))
            .prompt(),
    )?
    else {
        return Ok(());
    };
    let Some(focus) = ask_focus()? else {
        return Ok(());
    };

    let entry = session.summarize(words.into(), &focus)?;
    println!("\n{}\n", entry.item.summary_text);
    Ok(())
}

fn ask_count(message: &str, default: u16, max: u16) -> Result<Option<u16>> {
    optional(
        CustomType::<u16>::new(message)
            .with_default(default)
            .with_validator(in_range(3, max))
            .prompt(),
    )
}

fn flashcards(session: &mut Session) -> Result<()> {
    let Some(count) = ask_count("How many flashcards?", DEFAULT_FLASHCARDS, 20)? else {
        return Ok(());
    };
    let Some(focus) = ask_focus()? else {
        return Ok(());
    };

    let entry = session.flashcards(count.into(), &focus)?;
    for (idx, card) in entry.item.cards.iter().enumerate() {
        println!("\n{}. Q: {}\n   A: {}", idx + 1, card.question, card.answer);
    }
    println!();
    Ok(())
}

fn mcqs(session: &mut Session) -> Result<()> {
    let Some(count) = ask_count("How many questions?", DEFAULT_MCQS, 15)? else {
        return Ok(());
    };
    let difficulty = Select::new(
        "Difficulty:",
        vec![Difficulty::Easy, Difficulty::Medium, Difficulty::Hard],
    )
    .with_starting_cursor(1)
    .prompt();
    let Some(difficulty) = optional(difficulty)? else {
        return Ok(());
    };
    let Some(focus) = ask_focus()? else {
        return Ok(());
    };

    let entry = session.mcqs(count.into(), difficulty, &focus)?;
    println!("Generated {} questions. Take the quiz from the menu.", entry.item.mcqs.len());
    Ok(())
}

fn quiz(session: &Session) -> Result<()> {
    let sets: Vec<Pick> = session
        .histories()
        .mcqs
        .entries()
        .iter()
        .rev()
        .map(|entry| Pick {
            id: entry.id.clone(),
            label: format!(
                "{} ({} questions, {}, focus: {})",
                entry.created_at.format("%H:%M:%S"),
                entry.item.mcqs.len(),
                entry.item.difficulty,
                entry.item.focus
            ),
        })
        .collect();
    if sets.is_empty() {
        println!("Generate MCQs first.");
        return Ok(());
    }

    let Some(pick) = optional(Select::new("Quiz:", sets).prompt())? else {
        return Ok(());
    };
    let Some(entry) = session.histories().mcqs.get(&pick.id) else {
        return Ok(());
    };

    let mut answers = Vec::with_capacity(entry.item.mcqs.len());
    for (idx, mcq) in entry.item.mcqs.iter().enumerate() {
        let options: Vec<String> = mcq.labelled_options().collect();
        let answer = optional(Select::new(&format!("{}. {}", idx + 1, mcq.question), options).raw_prompt())?;
        answers.push(answer.and_then(|option| Choice::ALL.get(option.index).copied()));
    }

    let (correct, total) = session.grade_quiz(&pick.id, &answers)?;
    println!("\nScore: {correct}/{total}");
    for (mcq, answer) in entry.item.mcqs.iter().zip(&answers) {
        if *answer != Some(mcq.correct_answer) {
            println!("- {}\n  Correct Answer: {}) {}", mcq.question, mcq.correct_answer, mcq.correct_option());
        }
    }
    println!();
    Ok(())
}

fn pick_kind(message: &str) -> Result<Option<HistoryKind>> {
    optional(Select::new(message, HistoryKind::ALL.to_vec()).prompt())
}

fn history(session: &Session) -> Result<()> {
    let Some(kind) = pick_kind("History:")? else {
        return Ok(());
    };
    let entries = export::report_entries(session.histories(), kind);
    if entries.is_empty() {
        println!("Nothing here yet.");
    }
    for (idx, entry) in entries.iter().enumerate() {
        println!("{}. {entry}\n", idx + 1);
    }
    Ok(())
}

fn entry_picks(session: &Session, kind: HistoryKind) -> Vec<Pick> {
    let histories = session.histories();
    let label = |created: &chrono::DateTime<chrono::Local>, text: &str| {
        format!("{} {}", created.format("%H:%M:%S"), preview(text))
    };

    match kind {
        HistoryKind::Qa | HistoryKind::Eli5 | HistoryKind::Insights => {
            let style = match kind {
                HistoryKind::Eli5 => AnswerStyle::Eli5,
                HistoryKind::Insights => AnswerStyle::Insights,
                _ => AnswerStyle::Direct,
            };
            histories
                .answers(style)
                .entries()
                .iter()
                .map(|e| Pick {
                    id: e.id.clone(),
                    label: label(&e.created_at, &e.item.question),
                })
                .collect()
        }
        HistoryKind::Summaries => histories
            .summaries
            .entries()
            .iter()
            .map(|e| Pick {
                id: e.id.clone(),
                label: label(&e.created_at, &e.item.summary_text),
            })
            .collect(),
        HistoryKind::Flashcards => histories
            .flashcards
            .entries()
            .iter()
            .map(|e| Pick {
                id: e.id.clone(),
                label: label(&e.created_at, &format!("{} cards, focus: {}", e.item.cards.len(), e.item.focus)),
            })
            .collect(),
        HistoryKind::Mcqs => histories
            .mcqs
            .entries()
            .iter()
            .map(|e| Pick {
                id: e.id.clone(),
                label: label(&e.created_at, &format!("{} questions, focus: {}", e.item.mcqs.len(), e.item.focus)),
            })
            .collect(),
    }
}

fn delete(session: &mut Session) -> Result<()> {
    let Some(kind) = pick_kind("Delete from:")? else {
        return Ok(());
    };
    let picks = entry_picks(session, kind);
    if picks.is_empty() {
        println!("Nothing to delete.");
        return Ok(());
    }

    let Some(pick) = optional(Select::new("Entry:", picks).prompt())? else {
        return Ok(());
    };
    session.delete(kind, &pick.id)?;
    println!("Deleted.");
    Ok(())
}

fn clear(session: &mut Session) -> Result<()> {
    let Some(kind) = pick_kind("Clear:")? else {
        return Ok(());
    };
    let count = session.histories().len(kind);
    if count == 0 {
        return Ok(());
    }

    match inquire::prompt_confirmation(format!("Delete all {count} {kind} entries?")) {
        InquireResult::Ok(true) => {}
        InquireResult::Ok(false) => return Ok(()),
        InquireResult::Err(err) => bail!("An error occurred: {}", err),
    }

    session.clear(kind);
    Ok(())
}

fn export_history(session: &Session, report: bool) -> Result<()> {
    let Some(kind) = pick_kind("Export:")? else {
        return Ok(());
    };
    let default = if report { "history.txt" } else { "history.csv" };
    let Some(path) = optional(Text::new("Output file:").with_default(default).prompt())? else {
        return Ok(());
    };
    let path = PathBuf::from(path.trim());

    if report {
        export::export_report(&path, session.histories(), kind)?;
    } else {
        export::export_csv(&path, session.histories(), kind)?;
    }
    println!("Written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_truncates_first_line() {
        assert_eq!(preview("short\nsecond"), "short");
        let long = "x".repeat(100);
        assert_eq!(preview(&long), format!("{}...", "x".repeat(60)));
    }

    #[test]
    fn test_optional_maps_cancel() {
        assert_eq!(optional(Ok(3)).unwrap(), Some(3));
        assert_eq!(optional::<u8>(Err(InquireError::OperationCanceled)).unwrap(), None);
        assert!(optional::<u8>(Err(InquireError::OperationInterrupted)).is_err());
    }
}
