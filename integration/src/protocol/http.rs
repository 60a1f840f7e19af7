//! Signed REST request plumbing. An [`ExchangeAdapter`] (crate
//! `conduit-execution`) implements [`RestRequest`] per endpoint and
//! hands it to a [`RestClient`] carrying a venue-specific
//! [`RequestSigner`] — the same split the teacher's Binance client uses
//! (`execution::client::binance::request::BinanceRequestSigner`).

use crate::{error::SocketError, rate_limit::RateLimiter};
use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};
use std::{borrow::Cow, sync::Arc, time::Duration};

/// One REST endpoint: path, method, and the (de)serializable
/// query/body/response types that go with it.
pub trait RestRequest {
    type Response: DeserializeOwned;
    type QueryParams: Serialize;
    type Body: Serialize;

    fn path(&self) -> Cow<'static, str>;
    fn method() -> Method;
    fn query_params(&self) -> Option<&Self::QueryParams> {
        None
    }
    fn body(&self) -> Option<&Self::Body> {
        None
    }
}

/// Per-venue request signing strategy (API key headers, HMAC query
/// signatures, etc).
pub trait RequestSigner: Send + Sync {
    fn sign(
        &self,
        builder: reqwest::RequestBuilder,
        query_string: Option<&str>,
    ) -> Result<reqwest::RequestBuilder, SocketError>;
}

/// Signs nothing; used by adapters that authenticate some other way
/// (e.g. ProfitDLL's login handshake) or by public/unauthenticated
/// endpoints.
#[derive(Debug, Default, Clone)]
pub struct NoopSigner;

impl RequestSigner for NoopSigner {
    fn sign(
        &self,
        builder: reqwest::RequestBuilder,
        _query_string: Option<&str>,
    ) -> Result<reqwest::RequestBuilder, SocketError> {
        Ok(builder)
    }
}

/// A signed, rate-limited REST client for one venue base URL. Per spec
/// §5 "Exchange calls ... wrap in per-call timeout (default 30s)", every
/// request is bounded by `timeout`.
#[derive(Debug, Clone)]
pub struct RestClient<Signer> {
    http: reqwest::Client,
    base_url: String,
    signer: Arc<Signer>,
    limiter: Arc<dyn RateLimiter>,
    rate_limit_key: String,
    timeout: Duration,
}

impl<Signer: RequestSigner> RestClient<Signer> {
    pub fn new(
        base_url: impl Into<String>,
        signer: Signer,
        limiter: Arc<dyn RateLimiter>,
        rate_limit_key: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            signer: Arc::new(signer),
            limiter,
            rate_limit_key: rate_limit_key.into(),
            timeout,
        }
    }

    pub async fn execute<R: RestRequest>(&self, request: R) -> Result<R::Response, SocketError> {
        self.limiter.acquire(&self.rate_limit_key).await;

        let url = format!("{}{}", self.base_url, request.path());
        let mut builder = self.http.request(R::method(), &url).timeout(self.timeout);

        let query_string = match request.query_params() {
            Some(params) => {
                let encoded = serde_urlencoded::to_string(params)
                    .map_err(|e| SocketError::Serialization(e.to_string()))?;
                if !encoded.is_empty() {
                    builder = builder.query(params);
                }
                Some(encoded)
            }
            None => None,
        };

        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let builder = self.signer.sign(builder, query_string.as_deref())?;

        let response = builder
            .send()
            .await
            .map_err(|e| SocketError::Timeout {
                exchange: self.base_url.clone(),
                elapsed_ms: e
                    .is_timeout()
                    .then_some(self.timeout.as_millis() as u64)
                    .unwrap_or(0),
            })?;

        if response.status().as_u16() == 429 {
            return Err(SocketError::RateLimited { retry_after_ms: 1000 });
        }

        response
            .error_for_status()
            .map_err(SocketError::from)?
            .json::<R::Response>()
            .await
            .map_err(SocketError::from)
    }
}
