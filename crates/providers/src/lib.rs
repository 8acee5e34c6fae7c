//! Chat model backends for the switchboard request router.
//!
//! All backends implement `switchboard_core::ChatModel`. Production wiring
//! goes through [`build_from_config`], which stacks the retry wrapper on
//! top of the configured HTTP backend.

pub mod openai;
pub mod retry;

pub use openai::OpenAiChatModel;
pub use retry::RetryingModel;

use std::sync::Arc;
use std::time::Duration;
use switchboard_config::AppConfig;
use switchboard_core::ChatModel;

/// Build the production model stack from configuration.
pub fn build_from_config(config: &AppConfig) -> Arc<dyn ChatModel> {
    let backend = OpenAiChatModel::new(
        &config.llm.api_url,
        config.llm.api_key.clone(),
        &config.llm.model,
        Duration::from_secs(config.llm.timeout_secs),
    );

    let retrying = RetryingModel::new(Arc::new(backend))
        .with_max_attempts(config.llm.max_retries)
        .with_call_timeout(Duration::from_secs(config.llm.timeout_secs));

    Arc::new(retrying)
}
