//! services/api/src/adapters/fortune_llm.rs
//!
//! This module contains the adapter for the fortune-text LLM.
//! It implements the `FortuneTextService` port from the `core` crate and
//! carries the retry policy for transient upstream failures.

use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;

use saju_core::ports::{FortuneTextService, PortError, PortResult};

/// Hard cap on a single upstream call, on top of any client-side timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

//=========================================================================================
// Retry Policy
//=========================================================================================

/// Replays transient failures (rate limits, timeouts) with exponential
/// backoff. Permanent failures are returned immediately.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// Runs `operation` under the given policy. The delay doubles after each
/// failed attempt: base, base*2, base*4, ...
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, mut operation: F) -> PortResult<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = PortResult<T>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt + 1 < policy.max_attempts => {
                let delay = policy.base_delay * 2u32.pow(attempt);
                tracing::warn!(
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "transient upstream failure, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `FortuneTextService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiFortuneAdapter {
    client: Client<OpenAIConfig>,
    model: String,
    retry: RetryPolicy,
}

impl OpenAiFortuneAdapter {
    /// Creates a new `OpenAiFortuneAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self {
            client,
            model,
            retry: RetryPolicy::default(),
        }
    }

    async fn call_once(&self, prompt: &str) -> PortResult<String> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(
                    "당신은 사주명리학 전문가입니다. 요청된 JSON 형식을 정확히 지켜 답변하세요.",
                )
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt.to_string())
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = tokio::time::timeout(REQUEST_TIMEOUT, self.client.chat().create(request))
            .await
            .map_err(|_| {
                PortError::Timeout(format!(
                    "fortune generation exceeded {}s",
                    REQUEST_TIMEOUT.as_secs()
                ))
            })?
            .map_err(classify_openai_error)?;

        // Extract the text content from the first choice in the response.
        if let Some(choice) = response.choices.into_iter().next() {
            if let Some(content) = choice.message.content {
                Ok(content)
            } else {
                Err(PortError::Unexpected(
                    "Fortune LLM response contained no text content.".to_string(),
                ))
            }
        } else {
            Err(PortError::Unexpected(
                "Fortune LLM returned no choices in its response.".to_string(),
            ))
        }
    }
}

/// Maps library errors into the port taxonomy so the retry policy and the
/// endpoint layer can react to the class, not the library type.
fn classify_openai_error(err: OpenAIError) -> PortError {
    match &err {
        OpenAIError::ApiError(api_err) => {
            let kind = api_err.r#type.as_deref().unwrap_or("");
            let message = api_err.message.to_lowercase();
            if kind.contains("rate_limit") || message.contains("rate limit") {
                PortError::RateLimited(err.to_string())
            } else if message.contains("timeout") || message.contains("timed out") {
                PortError::Timeout(err.to_string())
            } else {
                PortError::Unexpected(err.to_string())
            }
        }
        _ => {
            let text = err.to_string().to_lowercase();
            if text.contains("timed out") || text.contains("timeout") {
                PortError::Timeout(err.to_string())
            } else {
                PortError::Unexpected(err.to_string())
            }
        }
    }
}

//=========================================================================================
// `FortuneTextService` Trait Implementation
//=========================================================================================

#[async_trait]
impl FortuneTextService for OpenAiFortuneAdapter {
    async fn generate_fortune(&self, prompt: &str) -> PortResult<String> {
        with_retry(self.retry, || self.call_once(prompt)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn retries_transient_failures_until_success() {
        let calls = AtomicU32::new(0);
        let result = with_retry(fast_policy(3), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(PortError::RateLimited("throttled".into()))
                } else {
                    Ok("done".to_string())
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: PortResult<String> = with_retry(fast_policy(3), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(PortError::Timeout("slow upstream".into())) }
        })
        .await;

        assert!(matches!(result, Err(PortError::Timeout(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_failures_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: PortResult<String> = with_retry(fast_policy(3), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(PortError::Unexpected("bad request".into())) }
        })
        .await;

        assert!(matches!(result, Err(PortError::Unexpected(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
