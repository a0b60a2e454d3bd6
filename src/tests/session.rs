use std::sync::Arc;

use crate::app::{AppError, HistoryKind};
use crate::document::ExtractionError;
use crate::eid::Eid;
use crate::llm::{AnswerStyle, Difficulty, Focus};
use crate::semantic::RetrievalError;
use crate::study::Choice;
use crate::tests::support::{session_with, KeywordEmbedder, ScriptedCompletion, CATS_AND_DOGS};

const TWO_MCQS: &str = "Q: What are cats?\nA) Birds\nB) Mammals\nC) Fish\nD) Insects\nCorrect Answer: B\n\n\
                        Q: What are dogs?\nA) Mammals\nB) Reptiles\nC) Fish\nD) Birds\nCorrect Answer: A";

#[test]
fn test_nothing_works_before_upload() {
    let mut session = session_with(
        Arc::new(ScriptedCompletion::new(vec![])),
        Arc::new(KeywordEmbedder::default()),
    );

    assert!(matches!(
        session.ask("What are cats?", AnswerStyle::Direct),
        Err(AppError::Retrieval(RetrievalError::NoIndex))
    ));
    assert!(matches!(
        session.summarize(200, &Focus::EntireDocument),
        Err(AppError::Retrieval(RetrievalError::NoIndex))
    ));
    assert!(matches!(
        session.flashcards(5, &Focus::EntireDocument),
        Err(AppError::Retrieval(RetrievalError::NoIndex))
    ));
    assert!(session.document_info().is_none());
    assert_eq!(
        RetrievalError::NoIndex.to_string(),
        "No index: upload a document first"
    );
}

#[test]
fn test_load_document_and_ask() {
    let completion = Arc::new(ScriptedCompletion::new(vec![Ok("Cats are mammals.".to_string())]));
    let mut session = session_with(completion.clone(), Arc::new(KeywordEmbedder::default()));

    let kb = session.load_document("pets.txt", CATS_AND_DOGS.as_bytes()).unwrap();
    assert_eq!(kb.passages(), ["Cats are mammals.", "Dogs are mammals too."]);

    let debug = format!("{kb:?}");
    assert!(debug.contains("pets.txt"));
    assert!(debug.contains("passages: 2"));

    let info = session.document_info().unwrap();
    assert_eq!(info.name, "pets.txt");
    assert_eq!(info.words, 7);
    assert_eq!(info.passages, 2);
    assert_eq!(info.embedder, "keyword-test");

    let entry = session.ask("What are cats?", AnswerStyle::Insights).unwrap();
    assert_eq!(entry.item.answer, "Cats are mammals.");
    assert_eq!(entry.item.style, AnswerStyle::Insights);

    assert_eq!(session.histories().insights.len(), 1);
    assert!(session.histories().qa.is_empty());
    assert!(completion.prompts()[0].contains("insight"));
}

#[test]
fn test_failed_upload_keeps_previous_document() {
    let embedder = Arc::new(KeywordEmbedder::default());
    let mut session = session_with(Arc::new(ScriptedCompletion::new(vec![])), embedder.clone());
    session.load_document("pets.txt", CATS_AND_DOGS.as_bytes()).unwrap();

    embedder.break_model();
    let err = session
        .load_document("other.txt", b"Something else entirely.")
        .unwrap_err();
    assert!(matches!(err, AppError::Retrieval(RetrievalError::Embedding(_))));

    let info = session.document_info().unwrap();
    assert_eq!(info.name, "pets.txt");
    assert_eq!(info.passages, 2);
}

#[test]
fn test_passage_without_signal_still_indexed() {
    let completion = Arc::new(ScriptedCompletion::new(vec![Ok("Cats are mammals.".to_string())]));
    let mut session = session_with(completion, Arc::new(KeywordEmbedder::default()));

    let kb = session.load_document("notes.txt", b"Cats are mammals.\n\n---").unwrap();
    assert_eq!(kb.passages(), ["Cats are mammals.", "---"]);

    let entry = session.ask("What are cats?", AnswerStyle::Direct).unwrap();
    let passages = &entry.item.passages;
    assert_eq!(passages[0].text, "Cats are mammals.");
    assert_eq!(passages[1].text, "---");
    assert_eq!(passages[1].score, 0.0);
}

#[test]
fn test_unreadable_uploads_rejected() {
    let mut session = session_with(
        Arc::new(ScriptedCompletion::new(vec![])),
        Arc::new(KeywordEmbedder::default()),
    );

    let err = session.load_document("blank.txt", b"  \n\n \t\n").unwrap_err();
    assert!(matches!(err, AppError::Extraction(ExtractionError::Empty)));

    let err = session.load_document("scan.pdf", b"%PDF-1.4\n...").unwrap_err();
    assert!(matches!(err, AppError::Extraction(ExtractionError::Pdf(_))));

    let err = session.load_document("photo.png", b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR").unwrap_err();
    assert!(matches!(err, AppError::Extraction(ExtractionError::UnsupportedFormat(_))));

    assert!(session.knowledge().is_none());
}

#[test]
fn test_histories_survive_reload_and_support_delete() {
    let completion = Arc::new(ScriptedCompletion::new(vec![
        Ok("first".to_string()),
        Ok("second".to_string()),
        Ok("a summary".to_string()),
    ]));
    let mut session = session_with(completion, Arc::new(KeywordEmbedder::default()));
    session.load_document("pets.txt", CATS_AND_DOGS.as_bytes()).unwrap();

    let first = session.ask("What are cats?", AnswerStyle::Direct).unwrap().id.clone();
    session.ask("What are dogs?", AnswerStyle::Direct).unwrap();
    session.summarize(100, &Focus::EntireDocument).unwrap();

    session.load_document("more.txt", b"Dogs are mammals.").unwrap();
    assert_eq!(session.histories().qa.len(), 2);
    assert_eq!(session.histories().summaries.len(), 1);

    session.delete(HistoryKind::Qa, &first).unwrap();
    let remaining: Vec<&str> = session.histories().qa.items().map(|a| a.answer.as_str()).collect();
    assert_eq!(remaining, vec!["second"]);

    assert!(matches!(
        session.delete(HistoryKind::Qa, &first),
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        session.delete(HistoryKind::Summaries, &Eid::new()),
        Err(AppError::NotFound(_))
    ));

    assert_eq!(session.clear(HistoryKind::Summaries), 1);
    assert!(session.histories().summaries.is_empty());
}

#[test]
fn test_quiz_grading() {
    let completion = Arc::new(ScriptedCompletion::new(vec![Ok(TWO_MCQS.to_string())]));
    let mut session = session_with(completion, Arc::new(KeywordEmbedder::default()));
    session.load_document("pets.txt", CATS_AND_DOGS.as_bytes()).unwrap();

    let entry = session.mcqs(5, Difficulty::Medium, &Focus::EntireDocument).unwrap();
    assert_eq!(entry.item.mcqs.len(), 2);
    assert_eq!(entry.item.requested, 5);
    let id = entry.id.clone();

    assert_eq!(session.grade_quiz(&id, &[Some(Choice::B), Some(Choice::A)]).unwrap(), (2, 2));
    assert_eq!(session.grade_quiz(&id, &[Some(Choice::B), None]).unwrap(), (1, 2));
    assert!(matches!(
        session.grade_quiz(&id, &[Some(Choice::B)]),
        Err(AppError::AnswerCount { expected: 2, got: 1 })
    ));
    assert!(matches!(
        session.grade_quiz(&Eid::new(), &[]),
        Err(AppError::NotFound(_))
    ));
}
