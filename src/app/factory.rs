use std::sync::Arc;
use std::time::Duration;

use crate::{
    app::{errors::AppError, session::Session},
    config::Config,
    document::DocumentExtractor,
    llm::{ChatClient, Completion},
    semantic::{Embedder, EmbeddingModel},
};

/// Builds sessions wired to the configured model endpoints.
pub struct AppFactory;

impl AppFactory {
    pub fn create_session(config: &Config) -> Result<Session, AppError> {
        let completion = Self::create_completion(config)?;
        let embedder = Self::create_embedder(config)?;

        Ok(Session::new(
            completion,
            embedder,
            Box::new(DocumentExtractor),
            config.retrieval.top_k,
        ))
    }

    fn create_completion(config: &Config) -> Result<Arc<dyn Completion>, AppError> {
        let completion = &config.completion;
        let api_key = completion.api_key.clone().unwrap_or_else(|| {
            log::warn!("no api key set (DOCQA_API_KEY or GROQ_API_KEY), completions will fail");
            String::new()
        });

        log::info!("Using completion endpoint: {} model={}", completion.api_url, completion.model);

        let client = ChatClient::new(
            &completion.api_url,
            api_key,
            &completion.model,
            Duration::from_secs(completion.timeout_secs),
        )?
        .with_system_prompt(completion.system_prompt.clone());
        Ok(Arc::new(client))
    }

    fn create_embedder(config: &Config) -> Result<Arc<dyn Embedder>, AppError> {
        let model = EmbeddingModel::new(
            &config.embedding.model,
            config.base_path().to_path_buf(),
            Some(Duration::from_secs(config.embedding.download_timeout_secs)),
        )?;
        Ok(Arc::new(model))
    }
}
