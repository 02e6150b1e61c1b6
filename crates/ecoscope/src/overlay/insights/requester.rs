use std::fmt::Debug;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::Serialize;

use super::prompt::build_prompt;
use super::InsightsError;
use crate::overlay::layers::LayerActivationState;
use crate::overlay::providers::PayloadStore;

/// Narrative service turning a prompt into markdown.
pub trait InsightsGateway: Debug + Send + Sync {
    fn generate(&self, prompt: String) -> BoxFuture<'_, Result<String, InsightsError>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightsStatus {
    Idle,
    Pending,
    Ready,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightsView {
    pub status: InsightsStatus,
    pub markdown: Option<String>,
    pub requested_at: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct InsightsSlot {
    fired: bool,
    status: InsightsStatus,
    markdown: Option<String>,
    requested_at: Option<DateTime<Utc>>,
}

/// Fires at most once per session, the first time every layer is active.
#[derive(Debug)]
pub struct InsightsRequester {
    gateway: Arc<dyn InsightsGateway>,
    slot: Mutex<InsightsSlot>,
}

impl InsightsRequester {
    pub fn new(gateway: Arc<dyn InsightsGateway>) -> Self {
        Self {
            gateway,
            slot: Mutex::new(InsightsSlot {
                fired: false,
                status: InsightsStatus::Idle,
                markdown: None,
                requested_at: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, InsightsSlot> {
        self.slot.lock().expect("insights slot mutex poisoned")
    }

    /// Claims the one request of the session. Returns the prompt built from the
    /// payloads present at this instant, or `None` if the set is not full or
    /// the request already went out.
    pub fn claim(
        &self,
        activation: &LayerActivationState,
        payloads: &PayloadStore,
    ) -> Option<String> {
        if !activation.all_active() {
            return None;
        }
        let mut slot = self.lock();
        if slot.fired {
            return None;
        }
        slot.fired = true;
        slot.status = InsightsStatus::Pending;
        slot.requested_at = Some(Utc::now());
        tracing::info!(payloads = payloads.len(), "all layers active; requesting insights");
        Some(build_prompt(payloads))
    }

    /// Sends a claimed prompt. No retry; a failure leaves the slot empty.
    pub async fn submit(&self, prompt: String) -> Result<(), InsightsError> {
        let reply = self.gateway.generate(prompt).await;
        let mut slot = self.lock();
        match reply {
            Ok(markdown) => {
                tracing::info!(chars = markdown.len(), "insights received");
                slot.markdown = Some(markdown);
                slot.status = InsightsStatus::Ready;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "insights request failed");
                slot.status = InsightsStatus::Failed;
                Err(err)
            }
        }
    }

    pub fn view(&self) -> InsightsView {
        let slot = self.lock();
        InsightsView {
            status: slot.status,
            markdown: slot.markdown.clone(),
            requested_at: slot.requested_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::FutureExt;

    use super::*;
    use crate::overlay::layers::LayerId;

    #[derive(Debug, Default)]
    struct CountingGateway {
        calls: AtomicUsize,
        fail: bool,
    }

    impl InsightsGateway for CountingGateway {
        fn generate(&self, prompt: String) -> BoxFuture<'_, Result<String, InsightsError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let fail = self.fail;
            async move {
                if fail {
                    Err(InsightsError::Status {
                        status: 500,
                        body: "boom".into(),
                    })
                } else {
                    Ok(format!("## Insights\n{} chars of context", prompt.len()))
                }
            }
            .boxed()
        }
    }

    fn all_layers() -> LayerActivationState {
        LayerId::ordered().into_iter().collect()
    }

    #[test]
    fn partial_activation_never_claims() {
        let requester = InsightsRequester::new(Arc::new(CountingGateway::default()));
        let four: LayerActivationState = LayerId::ordered().into_iter().skip(1).collect();
        assert!(requester.claim(&four, &PayloadStore::default()).is_none());
        assert_eq!(requester.view().status, InsightsStatus::Idle);
    }

    #[tokio::test]
    async fn full_set_fires_exactly_once() {
        let gateway = Arc::new(CountingGateway::default());
        let requester = InsightsRequester::new(gateway.clone());

        let prompt = requester
            .claim(&all_layers(), &PayloadStore::default())
            .expect("first claim");
        assert_eq!(requester.view().status, InsightsStatus::Pending);
        assert!(requester.claim(&all_layers(), &PayloadStore::default()).is_none());

        requester.submit(prompt).await.expect("gateway succeeds");
        let view = requester.view();
        assert_eq!(view.status, InsightsStatus::Ready);
        assert!(view.markdown.expect("stored").starts_with("## Insights"));
        assert!(requester.claim(&all_layers(), &PayloadStore::default()).is_none());
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_leaves_the_slot_empty() {
        let requester = InsightsRequester::new(Arc::new(CountingGateway {
            fail: true,
            ..CountingGateway::default()
        }));
        let prompt = requester
            .claim(&all_layers(), &PayloadStore::default())
            .expect("claim");
        assert!(requester.submit(prompt).await.is_err());

        let view = requester.view();
        assert_eq!(view.status, InsightsStatus::Failed);
        assert_eq!(view.markdown, None);
        assert!(requester.claim(&all_layers(), &PayloadStore::default()).is_none());
    }
}
