use std::future::Future;
use std::pin::Pin;

use anyhow::Result;
use reqwest::Client;
use tracing::debug;

use crate::config::Config;
use crate::model::{self, ModelHandle, ModelResponse};
use crate::prompt::PromptTemplate;

pub type InvokeFuture<'a> = Pin<Box<dyn Future<Output = Result<ModelResponse>> + 'a>>;

// Seam around the network stage so the pipeline can be exercised
// without a provider on the other end.
pub trait ModelBackend {
    fn invoke<'a>(
        &'a self,
        client: &'a Client,
        handle: &'a ModelHandle,
        prompt: &'a str,
    ) -> InvokeFuture<'a>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProviderBackend;

impl ModelBackend for ProviderBackend {
    fn invoke<'a>(
        &'a self,
        client: &'a Client,
        handle: &'a ModelHandle,
        prompt: &'a str,
    ) -> InvokeFuture<'a> {
        Box::pin(async move { handle.invoke(client, prompt).await })
    }
}

pub struct AnswerPipeline<'a, B = ProviderBackend> {
    client: &'a Client,
    template: PromptTemplate,
    handle: ModelHandle,
    backend: B,
}

impl<'a> AnswerPipeline<'a> {
    pub fn from_config(client: &'a Client, cfg: &Config) -> Result<Self> {
        let template = PromptTemplate::parse(&cfg.prompt_template)?;
        let handle = model::select_model(cfg)?;
        Ok(Self {
            client,
            template,
            handle,
            backend: ProviderBackend,
        })
    }
}

impl<'a, B> AnswerPipeline<'a, B> {
    pub fn with_backend(
        client: &'a Client,
        template: PromptTemplate,
        handle: ModelHandle,
        backend: B,
    ) -> Self {
        Self {
            client,
            template,
            handle,
            backend,
        }
    }

    // render -> invoke -> extract, in order, nothing wrapped or retried.
    pub async fn answer(&self, question: &str) -> Result<String>
    where
        B: ModelBackend,
    {
        let prompt = self.template.render(question);
        debug!(
            provider = self.handle.provider_name(),
            prompt_len = prompt.len(),
            "running answer pipeline"
        );
        let response = self
            .backend
            .invoke(self.client, &self.handle, &prompt)
            .await?;
        model::extract_text(response)
    }
}
