use futures_util::StreamExt;
use rig::agent::MultiTurnStreamItem;
use rig::completion::Prompt;
use rig::prelude::CompletionClient;
use rig::providers::openai;
use rig::streaming::{StreamedAssistantContent, StreamingPrompt};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::config::AiConfig;

/// Reply when no completion API is configured.
pub const UNAVAILABLE_REPLY: &str = "I'm not able to answer questions right now, but our team \
                                     would love to help! Book a free trial session to get \
                                     personalized advice.";

/// Reply when the completion API fails or returns nothing.
pub const FALLBACK_REPLY: &str = "Sorry, I had a brain fog moment there. Try asking that again, \
                                  or book a free session to chat with our team directly!";

const TEMPERATURE: f64 = 0.7;
const MAX_TOKENS: u64 = 500;

fn preamble(brand_name: &str) -> String {
    format!(
        "You are the conversational assistant for {brand_name}, a fitness coaching business. \
         You answer questions about the programs, training structure, nutrition basics, \
         common fitness myths and fitting exercise around a busy life. \
         Be warm, direct and encouraging. Keep answers to two or three short paragraphs. \
         Never shame anyone's starting point. Do not give medical advice, promise unrealistic \
         results or use pushy sales language."
    )
}

/// Question-answering side channel next to the scripted flow.
///
/// Never fails towards the caller: a missing key or a provider error turns
/// into a fixed fallback reply.
#[derive(Clone)]
pub struct AdvisorAgent {
    client: Option<openai::Client>,
    model: String,
    preamble: String,
}

impl AdvisorAgent {
    pub fn new(config: Option<&AiConfig>, brand_name: &str) -> Self {
        let Some(config) = config else {
            warn!("AI assistant disabled (no OPENAI_API_KEY set)");
            return Self::disabled(brand_name);
        };

        match openai::Client::builder()
            .api_key(config.api_key.as_str())
            .base_url(&config.base_url)
            .build()
        {
            Ok(client) => {
                info!("AI assistant initialised with model {}", config.model);
                Self {
                    client: Some(client),
                    model: config.model.clone(),
                    preamble: preamble(brand_name),
                }
            }
            Err(e) => {
                warn!("AI assistant disabled, failed to build OpenAI client: {e}");
                Self::disabled(brand_name)
            }
        }
    }

    pub fn disabled(brand_name: &str) -> Self {
        Self { client: None, model: String::new(), preamble: preamble(brand_name) }
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    pub async fn answer(&self, question: &str) -> String {
        let Some(client) = &self.client else {
            return UNAVAILABLE_REPLY.to_string();
        };

        let agent = client
            .agent(&self.model)
            .preamble(&self.preamble)
            .temperature(TEMPERATURE)
            .max_tokens(MAX_TOKENS)
            .build();

        match agent.prompt(question).await {
            Ok(answer) if !answer.trim().is_empty() => answer,
            Ok(_) => FALLBACK_REPLY.to_string(),
            Err(e) => {
                error!("Completion request failed: {e}");
                FALLBACK_REPLY.to_string()
            }
        }
    }

    /// Pushes the answer into `tx` chunk by chunk as the provider streams
    /// it. The receiver sees the channel close when the answer is complete.
    /// Without a configured provider, or when nothing arrives before an
    /// error, a single fallback chunk is sent instead.
    pub async fn stream_answer(&self, question: &str, tx: mpsc::Sender<String>) {
        let Some(client) = &self.client else {
            deliver(&tx, UNAVAILABLE_REPLY.to_string()).await;
            return;
        };

        let agent = client
            .agent(&self.model)
            .preamble(&self.preamble)
            .temperature(TEMPERATURE)
            .max_tokens(MAX_TOKENS)
            .build();

        let mut stream = agent.stream_prompt(question).await;
        let mut delivered = false;
        while let Some(item) = stream.next().await {
            match item {
                Ok(MultiTurnStreamItem::StreamAssistantItem(StreamedAssistantContent::Text(
                    text,
                ))) => {
                    if text.text.is_empty() {
                        continue;
                    }
                    if !deliver(&tx, text.text).await {
                        return;
                    }
                    delivered = true;
                }
                Ok(_) => {}
                Err(e) => {
                    error!("Streaming completion failed: {e}");
                    break;
                }
            }
        }

        if !delivered {
            deliver(&tx, FALLBACK_REPLY.to_string()).await;
        }
    }
}

/// False once the receiver has gone away.
async fn deliver(tx: &mpsc::Sender<String>, chunk: String) -> bool {
    if tx.send(chunk).await.is_err() {
        warn!("Answer stream receiver dropped before delivery");
        return false;
    }
    true
}
