//! Hosted model client.
//!
//! Talks to any OpenAI-compatible API (Gemini's compatibility endpoint by
//! default) through `async-openai`. The handle is built once per process.

use crate::config::{LlmSettings, PLACEHOLDER_API_KEY};
use crate::error::{BriefError, Result};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    CreateCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{debug, info, instrument};

static SHARED_CLIENT: OnceLock<Arc<ModelClient>> = OnceLock::new();

/// Which call path produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationStyle {
    /// Chat completions with composed messages.
    Chat,
    /// Legacy text completions with the raw prompt.
    Completion,
}

impl std::fmt::Display for InvocationStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvocationStyle::Chat => write!(f, "chat"),
            InvocationStyle::Completion => write!(f, "completion"),
        }
    }
}

/// Response shapes a model call can return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelOutput {
    /// A structured message with a content field.
    Message { content: String },
    /// A raw text value.
    Text(String),
}

impl ModelOutput {
    pub fn into_text(self) -> String {
        match self {
            ModelOutput::Message { content } => content,
            ModelOutput::Text(text) => text,
        }
    }
}

/// The two ways of invoking a hosted model with a rendered prompt.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Compose system and user messages, then call chat completions.
    async fn invoke_chat(&self, system: &str, prompt: &str) -> Result<ModelOutput>;

    /// Send the rendered prompt to the legacy completions endpoint.
    async fn invoke_completion(&self, prompt: &str) -> Result<ModelOutput>;

    /// Model name, for display.
    fn model(&self) -> &str;
}

/// Read the API key named in settings.
///
/// Fails when the variable is unset, blank, or still the sample placeholder.
pub fn credential_from_env(settings: &LlmSettings) -> Result<String> {
    check_credential(&settings.api_key_env, std::env::var(&settings.api_key_env).ok())
}

fn check_credential(var: &str, value: Option<String>) -> Result<String> {
    match value {
        Some(key) if !key.trim().is_empty() && key.trim() != PLACEHOLDER_API_KEY => {
            Ok(key.trim().to_string())
        }
        _ => Err(BriefError::Config(format!(
            "{} not configured. Please set it in your environment or .env file.",
            var
        ))),
    }
}

/// Handle to the hosted model.
pub struct ModelClient {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
    system_as_user: bool,
}

impl ModelClient {
    /// Build a client from settings, reading the API key from the environment.
    pub fn new(settings: &LlmSettings) -> Result<Self> {
        let api_key = credential_from_env(settings)?;
        Self::with_api_key(settings, &api_key)
    }

    /// Build a client with an explicit API key.
    pub fn with_api_key(settings: &LlmSettings, api_key: &str) -> Result<Self> {
        check_credential("API key", Some(api_key.to_string()))?;

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        let config = OpenAIConfig::new()
            .with_api_base(settings.api_base.trim_end_matches('/'))
            .with_api_key(api_key);

        Ok(Self {
            client: Client::with_config(config).with_http_client(http_client),
            model: settings.model.clone(),
            temperature: settings.temperature,
            system_as_user: settings.system_as_user,
        })
    }

    /// Process-wide handle, built on first use.
    ///
    /// Later calls return the same handle and ignore `settings`.
    pub fn shared(settings: &LlmSettings) -> Result<Arc<ModelClient>> {
        if let Some(client) = SHARED_CLIENT.get() {
            return Ok(Arc::clone(client));
        }

        let client = Self::new(settings)?;
        info!("Initialized model client ({})", client.model);
        // A concurrent caller may have won the race; either handle is fine.
        let _ = SHARED_CLIENT.set(Arc::new(client));
        SHARED_CLIENT
            .get()
            .map(Arc::clone)
            .ok_or_else(|| BriefError::Config("Model client was not initialized".to_string()))
    }

    /// Messages for a chat request.
    fn compose(&self, system: &str, prompt: &str) -> Result<Vec<ChatCompletionRequestMessage>> {
        compose_messages(system, prompt, self.system_as_user)
    }
}

fn compose_messages(
    system: &str,
    prompt: &str,
    system_as_user: bool,
) -> Result<Vec<ChatCompletionRequestMessage>> {
    let build_err = |e: async_openai::error::OpenAIError| BriefError::Summarization(e.to_string());

    if system.trim().is_empty() {
        return Ok(vec![ChatCompletionRequestUserMessageArgs::default()
            .content(prompt.to_string())
            .build()
            .map_err(build_err)?
            .into()]);
    }

    if system_as_user {
        return Ok(vec![ChatCompletionRequestUserMessageArgs::default()
            .content(format!("{}\n\n{}", system, prompt))
            .build()
            .map_err(build_err)?
            .into()]);
    }

    Ok(vec![
        ChatCompletionRequestSystemMessageArgs::default()
            .content(system.to_string())
            .build()
            .map_err(build_err)?
            .into(),
        ChatCompletionRequestUserMessageArgs::default()
            .content(prompt.to_string())
            .build()
            .map_err(build_err)?
            .into(),
    ])
}

#[async_trait]
impl LanguageModel for ModelClient {
    #[instrument(skip(self, system, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn invoke_chat(&self, system: &str, prompt: &str) -> Result<ModelOutput> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(self.compose(system, prompt)?)
            .temperature(self.temperature)
            .build()
            .map_err(|e| BriefError::Summarization(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            BriefError::Summarization(format!("Chat completion failed: {}", e))
        })?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| BriefError::Summarization("Empty response from model".to_string()))?;

        debug!("Chat completion returned {} chars", content.len());
        Ok(ModelOutput::Message { content })
    }

    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn invoke_completion(&self, prompt: &str) -> Result<ModelOutput> {
        let request = CreateCompletionRequestArgs::default()
            .model(&self.model)
            .prompt(prompt.to_string())
            .temperature(self.temperature)
            .build()
            .map_err(|e| BriefError::Summarization(e.to_string()))?;

        let response = self.client.completions().create(request).await.map_err(|e| {
            BriefError::Summarization(format!("Completion failed: {}", e))
        })?;

        let text = response
            .choices
            .into_iter()
            .next()
            .map(|c| c.text)
            .ok_or_else(|| BriefError::Summarization("Empty response from model".to_string()))?;

        debug!("Completion returned {} chars", text.len());
        Ok(ModelOutput::Text(text))
    }

    fn model(&self) -> &str {
        &self.model
    }
}
