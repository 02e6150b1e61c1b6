//! Narrative insights, requested once per session when every layer is on.

mod client;
mod prompt;
mod requester;

pub use client::HttpInsightsClient;
pub use prompt::build_prompt;
pub use requester::{InsightsGateway, InsightsRequester, InsightsStatus, InsightsView};

#[derive(Debug, thiserror::Error)]
pub enum InsightsError {
    #[error("insights request failed: {0}")]
    Transport(String),
    #[error("insights service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unable to decode insights reply: {0}")]
    Decode(String),
    #[error("insights reply contained no text")]
    EmptyReply,
    #[error("no insights service configured")]
    NotConfigured,
}
