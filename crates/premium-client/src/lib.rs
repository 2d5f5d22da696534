//! Client for the premium classifier API.
//!
//! Talks to `/predict` and, optionally, `/predict_proba` on the same host.
//! Connection failures are reported as [`ClientError::UpstreamUnreachable`],
//! separately from input and API errors.

use premium_core::error::ValidationError;
use premium_core::schema::{ProbaResponse, RawInput};
use reqwest::{StatusCode, Url};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_URL: &str = "http://127.0.0.1:8000/predict";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Please provide a valid endpoint URL (got '{0}')")]
    InvalidEndpoint(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Could not connect to the prediction server at {url}. Make sure it's running and reachable.")]
    UpstreamUnreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} timed out after {after:?}")]
    Timeout { url: String, after: Duration },

    #[error("API Error: {status}")]
    Api { status: StatusCode, body: Value },

    #[error("Request error: {0}")]
    Request(#[source] reqwest::Error),
}

impl ClientError {
    fn from_reqwest(url: &Url, timeout: Duration, e: reqwest::Error) -> Self {
        if e.is_connect() {
            ClientError::UpstreamUnreachable {
                url: url.to_string(),
                source: e,
            }
        } else if e.is_timeout() {
            ClientError::Timeout {
                url: url.to_string(),
                after: timeout,
            }
        } else {
            ClientError::Request(e)
        }
    }
}

/// What came back from `/predict`.
#[derive(Debug, Clone, PartialEq)]
pub enum Prediction {
    Category(String),
    /// 2xx with a body that carries no category; shown as received.
    Other(Value),
}

impl Prediction {
    /// Accepts `{"predicted_category": ..}` and `{"response": {"predicted_category": ..}}`.
    pub fn from_body(body: Value) -> Self {
        let label = body
            .get("predicted_category")
            .or_else(|| body.get("response").and_then(|r| r.get("predicted_category")))
            .and_then(label_text);
        match label {
            Some(label) => Prediction::Category(label),
            None => Prediction::Other(body),
        }
    }
}

fn label_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Result of the optional probability call. Never fatal for the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbaOutcome {
    Available(ProbaResponse),
    Unavailable(String),
}

/// `/predict` -> `/predict_proba` on the same host; only the path changes.
pub fn proba_url(predict: &Url) -> Url {
    let path = predict.path();
    let proba_path = match path.strip_suffix("/predict") {
        Some(base) => format!("{base}/predict_proba"),
        None => path.replacen("/predict", "/predict_proba", 1),
    };
    let mut url = predict.clone();
    url.set_path(&proba_path);
    url
}

fn parse_endpoint(url: &str) -> Result<Url, ClientError> {
    let trimmed = url.trim();
    let parsed = Url::parse(trimmed).map_err(|_| ClientError::InvalidEndpoint(url.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ClientError::InvalidEndpoint(url.to_string()));
    }
    Ok(parsed)
}

#[derive(Debug, Clone)]
pub struct PremiumClient {
    http: reqwest::Client,
    timeout: Duration,
    predict_url: Url,
    proba_url: Url,
}

impl PremiumClient {
    pub fn new(url: &str) -> Result<Self, ClientError> {
        Self::with_timeout(url, REQUEST_TIMEOUT)
    }

    /// Same as [`PremiumClient::new`] with a per-request timeout other than 15 s.
    pub fn with_timeout(url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let predict_url = parse_endpoint(url)?;
        let proba_url = proba_url(&predict_url);
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ClientError::Request)?;
        Ok(Self {
            http,
            timeout,
            predict_url,
            proba_url,
        })
    }

    pub fn predict_url(&self) -> &Url {
        &self.predict_url
    }

    pub fn proba_url(&self) -> &Url {
        &self.proba_url
    }

    /// Validates locally, then posts to `/predict`.
    pub async fn predict(&self, input: &RawInput) -> Result<Prediction, ClientError> {
        input.clone().validate()?;

        let resp = self
            .http
            .post(self.predict_url.clone())
            .json(input)
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(&self.predict_url, self.timeout, e))?;

        let status = resp.status();
        let is_json = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.starts_with("application/json"))
            .unwrap_or(false);
        let body = if is_json {
            resp.json::<Value>()
                .await
                .map_err(|e| ClientError::from_reqwest(&self.predict_url, self.timeout, e))?
        } else {
            Value::Object(Default::default())
        };

        tracing::debug!(url = %self.predict_url, %status, "predict response");

        if status.is_success() {
            Ok(Prediction::from_body(body))
        } else {
            Err(ClientError::Api { status, body })
        }
    }

    pub async fn predict_proba(&self, input: &RawInput) -> ProbaOutcome {
        let resp = match self
            .http
            .post(self.proba_url.clone())
            .json(input)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                tracing::debug!(url = %self.proba_url, err = %e, "predict_proba call failed");
                return ProbaOutcome::Unavailable(format!(
                    "Could not call {} (endpoint may not exist).",
                    self.proba_url.path()
                ));
            }
        };

        let status = resp.status();
        match resp.json::<Value>().await {
            Ok(body) if status.is_success() => match serde_json::from_value(body) {
                Ok(p) => ProbaOutcome::Available(p),
                Err(e) => ProbaOutcome::Unavailable(format!("Unexpected predict_proba body: {e}")),
            },
            Ok(body) => ProbaOutcome::Unavailable(
                body.get("error")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| {
                        "Predict_proba endpoint not available or returned an error.".to_string()
                    }),
            ),
            Err(_) => ProbaOutcome::Unavailable(
                "Predict_proba endpoint not available or returned an error.".to_string(),
            ),
        }
    }
}
