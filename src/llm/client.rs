use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use super::{ChatBackend, ChatMessage, Role};
use crate::config::Config;

/// OpenAI-compatible chat client pointed at the local model server.
pub struct LlmClient {
    chat_client: Client<OpenAIConfig>,
    chat_model: String,
    temperature: f32,
}

impl LlmClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let mut chat_config = OpenAIConfig::new().with_api_base(&config.llm_url);

        if let Some(key) = &config.llm_api_key {
            chat_config = chat_config.with_api_key(key);
        } else {
            chat_config = chat_config.with_api_key("unused");
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.llm_timeout_secs))
            .build()?;

        Ok(Self {
            chat_client: Client::with_config(chat_config).with_http_client(http_client),
            chat_model: config.llm_model.clone(),
            temperature: config.llm_temperature,
        })
    }

    fn to_request_message(message: ChatMessage) -> anyhow::Result<ChatCompletionRequestMessage> {
        let converted: ChatCompletionRequestMessage = match message.role {
            Role::System => ChatCompletionRequestSystemMessageArgs::default()
                .content(message.content)
                .build()?
                .into(),
            Role::User => ChatCompletionRequestUserMessageArgs::default()
                .content(message.content)
                .build()?
                .into(),
            Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                .content(message.content)
                .build()?
                .into(),
        };
        Ok(converted)
    }
}

#[async_trait]
impl ChatBackend for LlmClient {
    async fn chat(&self, messages: Vec<ChatMessage>) -> anyhow::Result<String> {
        let messages = messages
            .into_iter()
            .map(Self::to_request_message)
            .collect::<anyhow::Result<Vec<_>>>()?;

        debug!("LLM: sending {} messages to {}", messages.len(), self.chat_model);

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.chat_model)
            .messages(messages)
            .temperature(self.temperature)
            .build()?;

        let response = self.chat_client.chat().create(request).await?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| anyhow::anyhow!("No response from LLM"))?;

        Ok(content)
    }
}
