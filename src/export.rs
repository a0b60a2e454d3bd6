//! CSV and plain-text report export of session histories.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Local};

use crate::app::session::Histories;
use crate::app::{AppError, HistoryKind};
use crate::study::{Answer, Flashcard, Mcq, SummaryRecord};

/// Report text width in columns
pub const REPORT_WIDTH: usize = 80;
/// Body lines per report page, footer excluded
pub const LINES_PER_PAGE: usize = 54;

const PAGE_BREAK: &str = "\u{000C}";

pub fn csv_headers(kind: HistoryKind) -> &'static [&'static str] {
    match kind {
        HistoryKind::Qa | HistoryKind::Eli5 => &["Question Number", "Question", "Answer"],
        HistoryKind::Insights => &["Question Number", "Question", "Insightful Answer"],
        HistoryKind::Summaries => &["Summary #", "Original Length", "Requested Length", "Summary Text"],
        HistoryKind::Flashcards => &["Card Number", "Question", "Answer"],
        HistoryKind::Mcqs => &["Question Number", "Question", "Options", "Correct Answer"],
    }
}

fn answer_rows<'a>(answers: impl Iterator<Item = &'a Answer>) -> Vec<Vec<String>> {
    answers
        .enumerate()
        .map(|(idx, answer)| vec![(idx + 1).to_string(), answer.question.clone(), answer.answer.clone()])
        .collect()
}

fn summary_rows<'a>(summaries: impl Iterator<Item = &'a SummaryRecord>) -> Vec<Vec<String>> {
    summaries
        .enumerate()
        .map(|(idx, summary)| {
            vec![
                (idx + 1).to_string(),
                summary.original_length.to_string(),
                summary.requested_words.to_string(),
                summary.summary_text.clone(),
            ]
        })
        .collect()
}

fn flashcard_rows<'a>(cards: impl Iterator<Item = &'a Flashcard>) -> Vec<Vec<String>> {
    cards
        .enumerate()
        .map(|(idx, card)| vec![(idx + 1).to_string(), card.question.clone(), card.answer.clone()])
        .collect()
}

fn mcq_rows<'a>(mcqs: impl Iterator<Item = &'a Mcq>) -> Vec<Vec<String>> {
    mcqs.enumerate()
        .map(|(idx, mcq)| {
            vec![
                (idx + 1).to_string(),
                mcq.question.clone(),
                mcq.labelled_options().collect::<Vec<_>>().join(" | "),
                format!("{}) {}", mcq.correct_answer, mcq.correct_option()),
            ]
        })
        .collect()
}

/// Rows for one history. Flashcard and MCQ sets are flattened and numbered
/// across generations.
pub fn csv_rows(histories: &Histories, kind: HistoryKind) -> Vec<Vec<String>> {
    match kind {
        HistoryKind::Qa => answer_rows(histories.qa.items()),
        HistoryKind::Eli5 => answer_rows(histories.eli5.items()),
        HistoryKind::Insights => answer_rows(histories.insights.items()),
        HistoryKind::Summaries => summary_rows(histories.summaries.items()),
        HistoryKind::Flashcards => flashcard_rows(histories.flashcards.items().flat_map(|set| set.cards.iter())),
        HistoryKind::Mcqs => mcq_rows(histories.mcqs.items().flat_map(|set| set.mcqs.iter())),
    }
}

pub fn write_csv<W: Write>(writer: W, histories: &Histories, kind: HistoryKind) -> Result<(), AppError> {
    let mut csv_wrt = csv::Writer::from_writer(writer);
    csv_wrt.write_record(csv_headers(kind))?;
    for row in csv_rows(histories, kind) {
        csv_wrt.write_record(&row)?;
    }
    csv_wrt.flush()?;
    Ok(())
}

/// Write through a temp file so a failed export never leaves a partial file.
pub fn export_csv(path: &Path, histories: &Histories, kind: HistoryKind) -> Result<(), AppError> {
    let temp_path = path.with_extension("csv-tmp");
    write_csv(std::fs::File::create(&temp_path)?, histories, kind)?;
    std::fs::rename(&temp_path, path)?;

    log::info!(
        "exported kind={kind} rows={} path={}",
        csv_rows(histories, kind).len(),
        path.display()
    );
    Ok(())
}

fn answer_entries<'a>(answers: impl Iterator<Item = &'a Answer>, label: &str) -> Vec<String> {
    answers
        .map(|answer| format!("Q: {}\n{label}: {}", answer.question, answer.answer))
        .collect()
}

/// One numbered report entry per row of the history.
pub fn report_entries(histories: &Histories, kind: HistoryKind) -> Vec<String> {
    let answer_label = if kind == HistoryKind::Insights { "Insight" } else { "A" };

    match kind {
        HistoryKind::Qa => answer_entries(histories.qa.items(), answer_label),
        HistoryKind::Eli5 => answer_entries(histories.eli5.items(), answer_label),
        HistoryKind::Insights => answer_entries(histories.insights.items(), answer_label),
        HistoryKind::Summaries => histories
            .summaries
            .items()
            .map(|s| {
                format!(
                    "Focus: {} | Requested: {} words | Original: {} words\n{}",
                    s.focus, s.requested_words, s.original_length, s.summary_text
                )
            })
            .collect(),
        HistoryKind::Flashcards => histories
            .flashcards
            .items()
            .flat_map(|set| set.cards.iter())
            .map(|card| format!("Q: {}\nA: {}", card.question, card.answer))
            .collect(),
        HistoryKind::Mcqs => histories
            .mcqs
            .items()
            .flat_map(|set| set.mcqs.iter())
            .map(|mcq| {
                let mut text = mcq.question.clone();
                for option in mcq.labelled_options() {
                    text.push('\n');
                    text.push_str(&option);
                }
                text.push_str(&format!("\nCorrect Answer: {}) {}", mcq.correct_answer, mcq.correct_option()));
                text
            })
            .collect(),
    }
}

/// Greedy word wrap. Existing line breaks are kept and words longer than
/// `width` are split.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        let mut current_len = 0;

        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();

            while word.len() > width {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let rest = word.split_off(width);
                lines.push(word.into_iter().collect());
                word = rest;
            }

            let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };
            if needed > width {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.extend(word.iter());
            current_len += word.len();
        }

        lines.push(current);
    }

    lines
}

/// Lay out numbered entries on fixed-height pages separated by form feeds,
/// each ending with a `Page N` footer.
pub fn render_report(title: &str, generated_at: DateTime<Local>, entries: &[String]) -> String {
    let mut body = vec![
        title.to_string(),
        format!("Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S")),
        String::new(),
    ];

    if entries.is_empty() {
        body.push("No entries.".to_string());
    }
    for (idx, entry) in entries.iter().enumerate() {
        body.extend(wrap(&format!("{}. {entry}", idx + 1), REPORT_WIDTH));
        body.push(String::new());
    }

    body.chunks(LINES_PER_PAGE)
        .enumerate()
        .map(|(idx, page)| {
            let mut out = page.join("\n");
            out.push_str(&format!("\n\nPage {}\n", idx + 1));
            out
        })
        .collect::<Vec<_>>()
        .join(PAGE_BREAK)
}

pub fn export_report(path: &Path, histories: &Histories, kind: HistoryKind) -> Result<(), AppError> {
    let entries = report_entries(histories, kind);
    let report = render_report(&format!("{kind} Report"), Local::now(), &entries);
    std::fs::write(path, report)?;

    log::info!("report written kind={kind} entries={} path={}", entries.len(), path.display());
    Ok(())
}
