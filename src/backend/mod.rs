//! HTTP transport to the analysis backend.
//!
//! One POST per run: `/analyze_url` with a `url` part or `/analyze_file` with a
//! `file` part. Responses are mapped to a [`ResultSet`] or an [`AnalysisError`]
//! whose `Display` is the message shown to the user.

mod multipart;
mod response;

use crate::model::{AnalysisConfig, AnalysisInput, ResultSet};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("{0}")]
    Network(#[source] reqwest::Error),
    #[error("{message}")]
    Server { status: u16, message: String },
    #[error("invalid response from server: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("could not read {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid backend address {0:?}")]
    InvalidBaseUrl(String),
    #[error("analysis task failed: {0}")]
    Task(String),
}

pub struct AnalysisBackend {
    http: reqwest::Client,
    base_url: String,
}

impl AnalysisBackend {
    pub fn new(cfg: &AnalysisConfig) -> Result<Self, AnalysisError> {
        let base_url = cfg.base_url.trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url)
            .map_err(|_| AnalysisError::InvalidBaseUrl(cfg.base_url.clone()))?;

        // No request timeout: a run resolves or rejects exactly once.
        let http = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .build()
            .map_err(AnalysisError::Network)?;

        Ok(Self { http, base_url })
    }

    pub fn endpoint_url(&self, input: &AnalysisInput) -> String {
        format!("{}{}", self.base_url, input.mode().endpoint())
    }

    /// Submit one input and wait for the three results.
    pub async fn analyze(&self, input: &AnalysisInput) -> Result<ResultSet, AnalysisError> {
        let url = self.endpoint_url(input);
        let form = multipart::build_form(input).await?;
        tracing::info!(%url, source = %input.source_label(), "submitting analysis");

        let resp = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(AnalysisError::Network)?;

        response::read_results(resp).await
    }
}
