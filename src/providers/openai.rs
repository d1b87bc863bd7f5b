use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Config;
use crate::providers::http_errors::model_api_request_error;

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    messages: Vec<RequestMessage>,
}

#[derive(Debug, Serialize)]
struct RequestMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OpenAiChatModel {
    pub(crate) model: String,
    pub(crate) temperature: f64,
    pub(crate) max_tokens: Option<u32>,
    pub(crate) api_base: Option<String>,
    api_key: String,
}

fn chat_url(api_base: Option<&str>) -> String {
    let base = api_base.unwrap_or(DEFAULT_API_BASE);
    format!("{}/chat/completions", base.trim_end_matches('/'))
}

impl OpenAiChatModel {
    pub fn from_config_with(
        cfg: &Config,
        mut get_var: impl FnMut(&str) -> Option<String>,
    ) -> Result<Self> {
        let api_key = get_var(API_KEY_ENV)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "Missing OpenAI API key. Set the {} environment variable.",
                    API_KEY_ENV
                )
            })?;

        Ok(Self {
            model: cfg.model.clone(),
            temperature: cfg.temperature,
            max_tokens: cfg.max_tokens,
            api_base: cfg.api_base.clone(),
            api_key,
        })
    }

    fn build_request(&self, prompt: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            messages: vec![RequestMessage {
                role: "user",
                content: prompt.to_string(),
            }],
        }
    }

    pub async fn complete(&self, client: &Client, prompt: &str) -> Result<ChatCompletion> {
        let api_url = chat_url(self.api_base.as_deref());
        let body = self.build_request(prompt);
        debug!(
            api_url = %api_url,
            model = %self.model,
            prompt_len = prompt.len(),
            "sending chat completion request"
        );

        let response = client
            .post(&api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                warn!(
                    api_url = %api_url,
                    model = %self.model,
                    error = %err,
                    "chat completion request failed"
                );
                model_api_request_error(err, &api_url)
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let response_body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read response body>".to_string());
            warn!(
                api_url = %api_url,
                model = %self.model,
                status = %status,
                response_body_len = response_body.len(),
                "chat completion returned non-success status"
            );
            return Err(anyhow!(
                "Model request failed with status {}: {}",
                status,
                response_body
            ));
        }

        let parsed: ChatCompletion = response
            .json()
            .await
            .context("Failed to parse model chat response")?;
        debug!(
            model = %self.model,
            choice_count = parsed.choices.len(),
            "received chat completion response"
        );
        Ok(parsed)
    }
}

pub fn response_text(completion: ChatCompletion) -> Result<String> {
    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("Model response contained no choices"))?;
    Ok(choice.message.content.unwrap_or_default())
}
