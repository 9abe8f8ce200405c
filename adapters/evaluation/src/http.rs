//! HTTP client for the remote evaluation service.

use std::{future::Future, time::Duration};

use log::debug;
use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;
use wflop_editor_core::{EvaluationFailure, EvaluationRequest, Problem, SolutionResponse};

use crate::Evaluator;

const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/wflop";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Location and timeout of the evaluation service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerSettings {
    /// Base URL; `/evaluate` and `/solve` are appended to it.
    pub base_url: String,
    /// Upper bound on the duration of a single call.
    pub timeout: Duration,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Reasons the HTTP client could not be constructed.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The base URL is empty.
    #[error("evaluation service base URL must not be empty")]
    EmptyBaseUrl,
    /// The underlying HTTP client failed to initialise.
    #[error("failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

/// [`Evaluator`] that posts JSON to the evaluation service.
#[derive(Clone, Debug)]
pub struct HttpEvaluator {
    client: reqwest::Client,
    base_url: String,
}

impl HttpEvaluator {
    /// Creates a client for the configured service.
    pub fn new(settings: &ServerSettings) -> Result<Self, ClientError> {
        let base_url = settings.base_url.trim_end_matches('/');
        if base_url.is_empty() {
            return Err(ClientError::EmptyBaseUrl);
        }

        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.to_owned(),
        })
    }

    /// Base URL the client posts to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B>(&self, endpoint: &str, body: &B) -> Result<SolutionResponse, EvaluationFailure>
    where
        B: Serialize + Sync + ?Sized,
    {
        let url = format!("{}/{endpoint}", self.base_url);
        debug!("POST {url}");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(transport_failure)?;

        let status = response.status();
        if !status.is_success() {
            return Err(failure_for_status(status));
        }

        let bytes = response.bytes().await.map_err(transport_failure)?;
        serde_json::from_slice(&bytes).map_err(|error| EvaluationFailure::MalformedResponse {
            detail: error.to_string(),
        })
    }
}

impl Evaluator for HttpEvaluator {
    fn evaluate(
        &self,
        request: EvaluationRequest,
    ) -> impl Future<Output = Result<SolutionResponse, EvaluationFailure>> + Send {
        async move {
            request
                .validate()
                .map_err(EvaluationFailure::InvalidRequest)?;
            self.post("evaluate", &request).await
        }
    }

    fn solve(
        &self,
        problem: Problem,
    ) -> impl Future<Output = Result<SolutionResponse, EvaluationFailure>> + Send {
        async move { self.post("solve", &problem).await }
    }
}

fn transport_failure(error: reqwest::Error) -> EvaluationFailure {
    EvaluationFailure::TransportUnavailable {
        detail: error.to_string(),
    }
}

pub(crate) fn failure_for_status(status: StatusCode) -> EvaluationFailure {
    if status.is_server_error() {
        EvaluationFailure::FitnessCalculation {
            detail: format!("server responded with {status}"),
        }
    } else {
        EvaluationFailure::TransportUnavailable {
            detail: format!("unexpected status {status}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_map_to_fitness_calculation() {
        assert!(matches!(
            failure_for_status(StatusCode::INTERNAL_SERVER_ERROR),
            EvaluationFailure::FitnessCalculation { .. }
        ));
        assert!(matches!(
            failure_for_status(StatusCode::BAD_GATEWAY),
            EvaluationFailure::FitnessCalculation { .. }
        ));
    }

    #[test]
    fn other_statuses_map_to_transport_unavailable() {
        assert!(matches!(
            failure_for_status(StatusCode::NOT_FOUND),
            EvaluationFailure::TransportUnavailable { .. }
        ));
        assert!(matches!(
            failure_for_status(StatusCode::BAD_REQUEST),
            EvaluationFailure::TransportUnavailable { .. }
        ));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let settings = ServerSettings {
            base_url: "http://localhost:9000/api/wflop/".to_owned(),
            ..ServerSettings::default()
        };
        let evaluator = HttpEvaluator::new(&settings).expect("client");
        assert_eq!(evaluator.base_url(), "http://localhost:9000/api/wflop");
    }

    #[test]
    fn empty_base_url_is_rejected() {
        let settings = ServerSettings {
            base_url: "/".to_owned(),
            ..ServerSettings::default()
        };
        assert!(matches!(
            HttpEvaluator::new(&settings),
            Err(ClientError::EmptyBaseUrl)
        ));
    }
}
