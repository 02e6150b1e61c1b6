use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Deserialize;
use serde_json::json;

use super::requester::InsightsGateway;
use super::InsightsError;

/// Client for the narrative service's `POST /api/insights` endpoint.
#[derive(Debug, Clone)]
pub struct HttpInsightsClient {
    client: reqwest::Client,
    base_url: Option<String>,
}

impl HttpInsightsClient {
    pub fn new(base_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url
                .map(|url| url.trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty()),
        }
    }
}

/// The service answers either `{insights}` or a wrapped `{body: {insights}}`.
#[derive(Debug, Default, Deserialize)]
struct InsightsReply {
    insights: Option<String>,
    body: Option<Box<InsightsReply>>,
}

impl InsightsReply {
    fn into_markdown(self) -> Option<String> {
        self.insights
            .or_else(|| self.body.and_then(|body| body.into_markdown()))
            .filter(|text| !text.trim().is_empty())
    }
}

impl InsightsGateway for HttpInsightsClient {
    fn generate(&self, prompt: String) -> BoxFuture<'_, Result<String, InsightsError>> {
        async move {
            let base_url = self.base_url.as_deref().ok_or(InsightsError::NotConfigured)?;
            let response = self
                .client
                .post(format!("{base_url}/api/insights"))
                .json(&json!({ "prompt": prompt }))
                .send()
                .await
                .map_err(|err| InsightsError::Transport(err.to_string()))?;

            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|err| InsightsError::Transport(err.to_string()))?;
            if !status.is_success() {
                return Err(InsightsError::Status {
                    status: status.as_u16(),
                    body,
                });
            }

            let reply: InsightsReply =
                serde_json::from_str(&body).map_err(|err| InsightsError::Decode(err.to_string()))?;
            reply.into_markdown().ok_or(InsightsError::EmptyReply)
        }
        .boxed()
    }
}
