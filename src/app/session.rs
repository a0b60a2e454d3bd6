//! One user's working session: the loaded document, its retrieval index and
//! every result generated so far.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::app::errors::AppError;
use crate::app::history::{Entry, History};
use crate::document::{Document, ExtractionError, TextExtractor};
use crate::eid::Eid;
use crate::llm::{AnswerStyle, Completion, Difficulty, Focus};
use crate::semantic::{split_into_passages, Embedder, RetrievalError, Retriever};
use crate::study::{self, Answer, Choice, Flashcard, Mcq, SummaryRecord};

/// A document together with the index built over its passages.
pub struct KnowledgeBase {
    document: Document,
    retriever: Retriever,
}

impl KnowledgeBase {
    pub fn passages(&self) -> &[String] {
        self.retriever.passages()
    }
}

impl fmt::Debug for KnowledgeBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KnowledgeBase")
            .field("document", &self.document.name)
            .field("passages", &self.retriever.len())
            .field("embedder", &self.retriever.embedder_name())
            .finish()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FlashcardSet {
    pub requested: usize,
    pub focus: String,
    pub cards: Vec<Flashcard>,
}

#[derive(Debug, Clone, Serialize)]
pub struct McqSet {
    pub requested: usize,
    pub difficulty: Difficulty,
    pub focus: String,
    pub mcqs: Vec<Mcq>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryKind {
    Qa,
    Eli5,
    Insights,
    Summaries,
    Flashcards,
    Mcqs,
}

impl HistoryKind {
    pub const ALL: [HistoryKind; 6] = [
        HistoryKind::Qa,
        HistoryKind::Eli5,
        HistoryKind::Insights,
        HistoryKind::Summaries,
        HistoryKind::Flashcards,
        HistoryKind::Mcqs,
    ];

    pub fn label(self) -> &'static str {
        match self {
            HistoryKind::Qa => "Q&A",
            HistoryKind::Eli5 => "ELI5",
            HistoryKind::Insights => "Insights",
            HistoryKind::Summaries => "Summaries",
            HistoryKind::Flashcards => "Flashcards",
            HistoryKind::Mcqs => "MCQs",
        }
    }
}

impl fmt::Display for HistoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<AnswerStyle> for HistoryKind {
    fn from(style: AnswerStyle) -> Self {
        match style {
            AnswerStyle::Direct => HistoryKind::Qa,
            AnswerStyle::Eli5 => HistoryKind::Eli5,
            AnswerStyle::Insights => HistoryKind::Insights,
        }
    }
}

#[derive(Debug, Default)]
pub struct Histories {
    pub qa: History<Answer>,
    pub eli5: History<Answer>,
    pub insights: History<Answer>,
    pub summaries: History<SummaryRecord>,
    pub flashcards: History<FlashcardSet>,
    pub mcqs: History<McqSet>,
}

impl Histories {
    pub fn answers(&self, style: AnswerStyle) -> &History<Answer> {
        match style {
            AnswerStyle::Direct => &self.qa,
            AnswerStyle::Eli5 => &self.eli5,
            AnswerStyle::Insights => &self.insights,
        }
    }

    fn answers_mut(&mut self, style: AnswerStyle) -> &mut History<Answer> {
        match style {
            AnswerStyle::Direct => &mut self.qa,
            AnswerStyle::Eli5 => &mut self.eli5,
            AnswerStyle::Insights => &mut self.insights,
        }
    }

    pub fn len(&self, kind: HistoryKind) -> usize {
        match kind {
            HistoryKind::Qa => self.qa.len(),
            HistoryKind::Eli5 => self.eli5.len(),
            HistoryKind::Insights => self.insights.len(),
            HistoryKind::Summaries => self.summaries.len(),
            HistoryKind::Flashcards => self.flashcards.len(),
            HistoryKind::Mcqs => self.mcqs.len(),
        }
    }

    fn delete(&mut self, kind: HistoryKind, id: &Eid) -> bool {
        match kind {
            HistoryKind::Qa => self.qa.delete(id).is_some(),
            HistoryKind::Eli5 => self.eli5.delete(id).is_some(),
            HistoryKind::Insights => self.insights.delete(id).is_some(),
            HistoryKind::Summaries => self.summaries.delete(id).is_some(),
            HistoryKind::Flashcards => self.flashcards.delete(id).is_some(),
            HistoryKind::Mcqs => self.mcqs.delete(id).is_some(),
        }
    }

    fn clear(&mut self, kind: HistoryKind) -> usize {
        match kind {
            HistoryKind::Qa => self.qa.clear(),
            HistoryKind::Eli5 => self.eli5.clear(),
            HistoryKind::Insights => self.insights.clear(),
            HistoryKind::Summaries => self.summaries.clear(),
            HistoryKind::Flashcards => self.flashcards.clear(),
            HistoryKind::Mcqs => self.mcqs.clear(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentInfo {
    pub name: String,
    pub words: usize,
    pub passages: usize,
    pub fingerprint: String,
    pub embedder: String,
}

pub struct Session {
    completion: Arc<dyn Completion>,
    embedder: Arc<dyn Embedder>,
    extractor: Box<dyn TextExtractor>,
    top_k: usize,

    knowledge: Option<KnowledgeBase>,
    histories: Histories,
}

impl Session {
    pub fn new(
        completion: Arc<dyn Completion>,
        embedder: Arc<dyn Embedder>,
        extractor: Box<dyn TextExtractor>,
        top_k: usize,
    ) -> Self {
        Self {
            completion,
            embedder,
            extractor,
            top_k,
            knowledge: None,
            histories: Histories::default(),
        }
    }

    /// Extract, chunk and index an upload.
    ///
    /// The previous document stays loaded unless every step succeeds.
    /// Histories are kept across loads.
    pub fn load_document(&mut self, name: &str, bytes: &[u8]) -> Result<&KnowledgeBase, AppError> {
        let text = self.extractor.extract(bytes)?;

        let passages = split_into_passages(&text);
        if passages.is_empty() {
            return Err(ExtractionError::Empty.into());
        }

        let retriever = Retriever::build(passages, self.embedder.clone())?;
        let document = Document::new(name, text);

        log::info!(
            "document loaded name={name} words={} passages={} fingerprint={}",
            document.word_count(),
            retriever.len(),
            document.fingerprint
        );

        Ok(&*self.knowledge.insert(KnowledgeBase { document, retriever }))
    }

    pub fn knowledge(&self) -> Option<&KnowledgeBase> {
        self.knowledge.as_ref()
    }

    pub fn document_info(&self) -> Option<DocumentInfo> {
        let kb = self.knowledge.as_ref()?;
        Some(DocumentInfo {
            name: kb.document.name.clone(),
            words: kb.document.word_count(),
            passages: kb.retriever.len(),
            fingerprint: kb.document.fingerprint.clone(),
            embedder: kb.retriever.embedder_name().to_string(),
        })
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn set_top_k(&mut self, top_k: usize) {
        self.top_k = top_k;
    }

    pub fn histories(&self) -> &Histories {
        &self.histories
    }

    fn require_knowledge(&self) -> Result<&KnowledgeBase, RetrievalError> {
        self.knowledge.as_ref().ok_or(RetrievalError::NoIndex)
    }

    pub fn ask(&mut self, question: &str, style: AnswerStyle) -> Result<&Entry<Answer>, AppError> {
        let kb = self.require_knowledge()?;
        let answer = study::answer_question(
            &kb.retriever,
            self.completion.as_ref(),
            question,
            style,
            self.top_k,
        )?;

        log::info!(
            "answered style={style:?} passages={} answer_len={}",
            answer.passages.len(),
            answer.answer.len()
        );

        Ok(self.histories.answers_mut(style).push(answer))
    }

    pub fn summarize(&mut self, words: usize, focus: &Focus) -> Result<&Entry<SummaryRecord>, AppError> {
        let kb = self.require_knowledge()?;
        let summary = study::summarize(self.completion.as_ref(), &kb.document.text, words, focus);
        Ok(self.histories.summaries.push(summary))
    }

    pub fn flashcards(&mut self, count: usize, focus: &Focus) -> Result<&Entry<FlashcardSet>, AppError> {
        let kb = self.require_knowledge()?;
        let cards = study::generate_flashcards(self.completion.as_ref(), &kb.document.text, count, focus);

        log::info!("flashcards requested={count} generated={}", cards.len());

        Ok(self.histories.flashcards.push(FlashcardSet {
            requested: count,
            focus: focus.to_string(),
            cards,
        }))
    }

    pub fn mcqs(
        &mut self,
        count: usize,
        difficulty: Difficulty,
        focus: &Focus,
    ) -> Result<&Entry<McqSet>, AppError> {
        let kb = self.require_knowledge()?;
        let mcqs = study::generate_mcqs(self.completion.as_ref(), &kb.document.text, count, difficulty, focus);

        log::info!("mcqs requested={count} generated={} difficulty={difficulty}", mcqs.len());

        Ok(self.histories.mcqs.push(McqSet {
            requested: count,
            difficulty,
            focus: focus.to_string(),
            mcqs,
        }))
    }

    /// Score answers against a stored MCQ set. Returns `(correct, total)`.
    pub fn grade_quiz(&self, id: &Eid, answers: &[Option<Choice>]) -> Result<(usize, usize), AppError> {
        let entry = self
            .histories
            .mcqs
            .get(id)
            .ok_or_else(|| AppError::NotFound(id.clone()))?;

        let expected = entry.item.mcqs.len();
        if answers.len() != expected {
            return Err(AppError::AnswerCount {
                expected,
                got: answers.len(),
            });
        }

        Ok(study::mcq::score(answers, &entry.item.mcqs))
    }

    pub fn delete(&mut self, kind: HistoryKind, id: &Eid) -> Result<(), AppError> {
        if self.histories.delete(kind, id) {
            log::info!("history entry deleted kind={kind} id={id}");
            Ok(())
        } else {
            Err(AppError::NotFound(id.clone()))
        }
    }

    pub fn clear(&mut self, kind: HistoryKind) -> usize {
        let count = self.histories.clear(kind);
        log::info!("history cleared kind={kind} count={count}");
        count
    }
}
