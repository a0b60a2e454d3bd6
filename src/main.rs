use std::path::Path;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod app;
mod cli;
mod config;
mod document;
mod eid;
mod export;
mod llm;
mod semantic;
mod shell;
mod study;
#[cfg(test)]
mod tests;

use app::{AppFactory, HistoryKind, Session};
use cli::{Command, OutputArgs};
use config::Config;
use document::{DocumentExtractor, TextExtractor};
use llm::Focus;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docqa=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_file(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("could not read {}", path.display()))
}

fn document_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn open_session(config: &Config, file: &Path) -> anyhow::Result<Session> {
    let mut session = AppFactory::create_session(config)?;
    let bytes = read_file(file)?;
    session.load_document(&document_name(file), &bytes)?;
    Ok(session)
}

fn write_outputs(session: &Session, kind: HistoryKind, output: &OutputArgs) -> anyhow::Result<()> {
    if let Some(path) = &output.csv {
        export::export_csv(path, session.histories(), kind)?;
    }
    if let Some(path) = &output.report {
        export::export_report(path, session.histories(), kind)?;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let args = cli::Args::parse();

    if let Command::Chunks { file } = &args.command {
        let text = DocumentExtractor.extract(&read_file(file)?)?;
        let passages = semantic::split_into_passages(&text);
        println!("{}", serde_json::to_string_pretty(&passages)?);
        return Ok(());
    }

    let config = Config::load()?;

    match args.command {
        Command::Chunks { .. } => Ok(()),

        Command::Ask {
            file,
            question,
            style,
            top_k,
            output,
        } => {
            let mut session = open_session(&config, &file)?;
            if let Some(top_k) = top_k {
                session.set_top_k(top_k.into());
            }

            let entry = session.ask(&question, style)?;
            println!("{}", serde_json::to_string_pretty(&entry.item)?);

            write_outputs(&session, style.into(), &output)
        }

        Command::Summarize {
            file,
            words,
            focus,
            output,
        } => {
            let mut session = open_session(&config, &file)?;
            let focus = focus.map(|f| Focus::from_input(&f)).unwrap_or_default();

            let entry = session.summarize(words.into(), &focus)?;
            println!("{}", serde_json::to_string_pretty(&entry.item)?);

            write_outputs(&session, HistoryKind::Summaries, &output)
        }

        Command::Flashcards {
            file,
            count,
            focus,
            output,
        } => {
            let mut session = open_session(&config, &file)?;
            let focus = focus.map(|f| Focus::from_input(&f)).unwrap_or_default();

            let entry = session.flashcards(count.into(), &focus)?;
            println!("{}", serde_json::to_string_pretty(&entry.item)?);

            write_outputs(&session, HistoryKind::Flashcards, &output)
        }

        Command::Mcq {
            file,
            count,
            difficulty,
            focus,
            output,
        } => {
            let mut session = open_session(&config, &file)?;
            let focus = focus.map(|f| Focus::from_input(&f)).unwrap_or_default();

            let entry = session.mcqs(count.into(), difficulty, &focus)?;
            println!("{}", serde_json::to_string_pretty(&entry.item)?);

            write_outputs(&session, HistoryKind::Mcqs, &output)
        }

        Command::Shell { file } => {
            let session = AppFactory::create_session(&config)?;
            shell::run(session, file)
        }
    }
}
