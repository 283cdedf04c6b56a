// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Chat Gateway - Provider Dispatch, Retry Policy, Fan-out Comparison
//
// Routes one neutral conversation to the right provider adapter. Retry is an
// explicit bounded loop (never recursion) and fires only on the Anthropic
// overload signal; every other error propagates immediately.

use crate::domain::chat::ChatMessage;
use crate::domain::llm::{ChatProvider, GatewayError, ProviderId};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

pub struct ChatGateway {
    providers: HashMap<ProviderId, Arc<dyn ChatProvider>>,
    max_retries: u32,
    retry_delay: Duration,
}

impl ChatGateway {
    pub fn new(providers: Vec<Arc<dyn ChatProvider>>) -> Self {
        let providers = providers.into_iter().map(|p| (p.id(), p)).collect();
        Self {
            providers,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Override the retry policy (tests shrink the delay).
    pub fn with_retry_policy(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    fn provider(&self, id: ProviderId) -> Result<&Arc<dyn ChatProvider>, GatewayError> {
        self.providers
            .get(&id)
            .ok_or_else(|| GatewayError::UnsupportedProvider(id.to_string()))
    }

    /// Single call, no retry.
    pub async fn send(
        &self,
        id: ProviderId,
        model: &str,
        system_prompt: &str,
        messages: &[ChatMessage],
    ) -> Result<String, GatewayError> {
        self.provider(id)?.send(model, system_prompt, messages).await
    }

    /// Call with bounded exponential backoff on the overload signal.
    ///
    /// Delay before retry k (0-indexed) is `retry_delay * 2^k`; after
    /// `max_retries` retries the last error surfaces.
    pub async fn send_with_retry(
        &self,
        id: ProviderId,
        model: &str,
        system_prompt: &str,
        messages: &[ChatMessage],
    ) -> Result<String, GatewayError> {
        let mut attempt: u32 = 0;
        loop {
            match self.send(id, model, system_prompt, messages).await {
                Ok(reply) => {
                    if attempt > 0 {
                        info!(provider = %id, model, attempt, "provider recovered after overload");
                    }
                    return Ok(reply);
                }
                Err(e) if e.is_overloaded() && attempt < self.max_retries => {
                    let delay = self.retry_delay * 2u32.pow(attempt);
                    warn!(
                        provider = %id,
                        model,
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "provider overloaded, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Fan one message out to N (provider, model) pairs concurrently.
    ///
    /// Replies come back in input order regardless of completion order;
    /// any single failure fails the whole comparison.
    pub async fn compare(
        &self,
        pairs: &[(ProviderId, String)],
        message: &str,
        system_prompt: &str,
    ) -> Result<Vec<String>, GatewayError> {
        let turn = ChatMessage::user(message);
        let calls = pairs.iter().map(|(provider, model)| {
            self.send_with_retry(*provider, model, system_prompt, std::slice::from_ref(&turn))
        });
        futures::future::try_join_all(calls).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Stub provider that answers after an optional delay, or keeps
    /// returning a fixed error. Every call is stamped so tests can check
    /// the retry schedule.
    struct StubProvider {
        id: ProviderId,
        reply: Result<String, (u16, String)>,
        delay: Duration,
        calls: AtomicU32,
        stamps: std::sync::Mutex<Vec<tokio::time::Instant>>,
    }

    impl StubProvider {
        fn ok(id: ProviderId, reply: &str, delay: Duration) -> Self {
            Self {
                id,
                reply: Ok(reply.to_string()),
                delay,
                calls: AtomicU32::new(0),
                stamps: std::sync::Mutex::new(Vec::new()),
            }
        }

        fn failing(id: ProviderId, status: u16) -> Self {
            Self {
                id,
                reply: Err((status, "synthetic failure".to_string())),
                delay: Duration::ZERO,
                calls: AtomicU32::new(0),
                stamps: std::sync::Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatProvider for StubProvider {
        fn id(&self) -> ProviderId {
            self.id
        }

        async fn send(
            &self,
            _model: &str,
            _system_prompt: &str,
            _messages: &[ChatMessage],
        ) -> Result<String, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.stamps.lock().unwrap().push(tokio::time::Instant::now());
            tokio::time::sleep(self.delay).await;
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err((status, body)) => Err(GatewayError::Provider {
                    provider: self.id,
                    status: *status,
                    body: body.clone(),
                }),
            }
        }
    }

    #[tokio::test]
    async fn compare_preserves_input_order_despite_completion_order() {
        let slow = Arc::new(StubProvider::ok(
            ProviderId::OpenAi,
            "first",
            Duration::from_millis(50),
        ));
        let fast = Arc::new(StubProvider::ok(
            ProviderId::Anthropic,
            "second",
            Duration::ZERO,
        ));
        let gateway = ChatGateway::new(vec![slow, fast]);

        let pairs = vec![
            (ProviderId::OpenAi, "gpt-4o".to_string()),
            (ProviderId::Anthropic, "claude-3-haiku-20240307".to_string()),
        ];
        let results = gateway.compare(&pairs, "hi", "sys").await.unwrap();
        assert_eq!(results, vec!["first".to_string(), "second".to_string()]);
    }

    #[tokio::test]
    async fn compare_is_all_or_nothing() {
        let ok = Arc::new(StubProvider::ok(ProviderId::OpenAi, "fine", Duration::ZERO));
        let bad = Arc::new(StubProvider::failing(ProviderId::Anthropic, 500));
        let gateway = ChatGateway::new(vec![ok, bad]);

        let pairs = vec![
            (ProviderId::OpenAi, "gpt-4o".to_string()),
            (ProviderId::Anthropic, "claude-3-opus-20240229".to_string()),
        ];
        let err = gateway.compare(&pairs, "hi", "sys").await.unwrap_err();
        assert!(matches!(err, GatewayError::Provider { status: 500, .. }));
    }

    #[tokio::test]
    async fn overload_retries_then_surfaces_last_error() {
        let overloaded = Arc::new(StubProvider::failing(ProviderId::Anthropic, 529));
        let gateway = ChatGateway::new(vec![overloaded.clone()])
            .with_retry_policy(3, Duration::from_millis(1));

        let err = gateway
            .send_with_retry(ProviderId::Anthropic, "claude-3-opus-20240229", "sys", &[])
            .await
            .unwrap_err();

        assert!(err.is_overloaded());
        // Initial attempt plus max_retries retries.
        assert_eq!(overloaded.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn overload_backoff_delay_doubles_per_retry() {
        let overloaded = Arc::new(StubProvider::failing(ProviderId::Anthropic, 529));
        let gateway = ChatGateway::new(vec![overloaded.clone()])
            .with_retry_policy(3, Duration::from_secs(1));

        let err = gateway
            .send_with_retry(ProviderId::Anthropic, "claude-3-opus-20240229", "sys", &[])
            .await
            .unwrap_err();
        assert!(err.is_overloaded());

        // With the clock paused, gaps between attempts are exactly the
        // sleeps the gateway scheduled: 2^k * retry_delay.
        let stamps = overloaded.stamps.lock().unwrap();
        assert_eq!(stamps.len(), 4);
        let gaps: Vec<Duration> = stamps.windows(2).map(|w| w[1] - w[0]).collect();
        assert_eq!(
            gaps,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
            ]
        );
    }

    #[tokio::test]
    async fn non_overload_errors_are_not_retried() {
        let failing = Arc::new(StubProvider::failing(ProviderId::OpenAi, 529));
        let gateway = ChatGateway::new(vec![failing.clone()])
            .with_retry_policy(3, Duration::from_millis(1));

        let err = gateway
            .send_with_retry(ProviderId::OpenAi, "gpt-4o", "sys", &[])
            .await
            .unwrap_err();

        // A 529 from the completions-style provider is not the overload signal.
        assert!(!err.is_overloaded());
        assert_eq!(failing.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unregistered_provider_is_unsupported() {
        let gateway = ChatGateway::new(vec![]);
        let err = gateway
            .send(ProviderId::OpenAi, "gpt-4o", "sys", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::UnsupportedProvider(_)));
    }
}
