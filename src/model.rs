use std::env;

use anyhow::{Result, anyhow};
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::Config;
use crate::providers::openai::{self, ChatCompletion, OpenAiChatModel};

pub const SUPPORTED_PROVIDERS: &[&str] = &["openai"];

// One variant per supported provider; adding a provider means adding a
// variant here and a case in select_model_with.
#[derive(Debug, Clone)]
pub enum ModelHandle {
    OpenAi(OpenAiChatModel),
}

#[derive(Debug)]
pub enum ModelResponse {
    OpenAi(ChatCompletion),
}

impl ModelHandle {
    pub fn provider_name(&self) -> &'static str {
        match self {
            Self::OpenAi(_) => "openai",
        }
    }

    pub async fn invoke(&self, client: &Client, prompt: &str) -> Result<ModelResponse> {
        match self {
            Self::OpenAi(model) => {
                debug!(provider = "openai", prompt_len = prompt.len(), "invoking model");
                let completion = model.complete(client, prompt).await?;
                Ok(ModelResponse::OpenAi(completion))
            }
        }
    }
}

pub fn extract_text(response: ModelResponse) -> Result<String> {
    match response {
        ModelResponse::OpenAi(completion) => openai::response_text(completion),
    }
}

pub fn select_model(cfg: &Config) -> Result<ModelHandle> {
    select_model_with(cfg, |key| env::var(key).ok())
}

pub fn select_model_with(
    cfg: &Config,
    get_var: impl FnMut(&str) -> Option<String>,
) -> Result<ModelHandle> {
    let provider = cfg.provider.to_ascii_lowercase();

    match provider.as_str() {
        "openai" => {
            debug!(provider = "openai", model = %cfg.model, "constructing model handle");
            let model = OpenAiChatModel::from_config_with(cfg, get_var)?;
            Ok(ModelHandle::OpenAi(model))
        }
        other => {
            warn!(provider = %other, "unsupported provider configured");
            Err(anyhow!(
                "Unsupported provider: {}. Currently supported providers: {}.",
                other,
                SUPPORTED_PROVIDERS.join(", ")
            ))
        }
    }
}
