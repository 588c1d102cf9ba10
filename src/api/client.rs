//! `reqwest`-backed implementation of [`PricingApi`].

use super::wire::{
    AutocompleteResponse, PriceCalculationBody, PriceResponse, ServiceIdRequest,
    TariffEstimateResponse,
};
use super::PricingApi;
use crate::config::ApiConfig;
use crate::dispatch::TaskFailure;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Path of the autocomplete endpoint below a base URL.
pub const AUTOCOMPLETE_PATH: &str = "/cities/autocomplete";
/// Path of the tariff-estimate endpoint below a base URL.
pub const ESTIMATE_PATH: &str = "/estimateV2";
/// Path of the price-calculation endpoint below a base URL.
pub const PRICE_PATH: &str = "/getTariffInfo";

/// HTTP client for the courier pricing API.
///
/// Only the price-calculation call is authenticated; it carries the bearer
/// token set with [`HttpPricingApi::with_bearer_token`].
///
/// ## Example
///
/// ```no_run
/// use tokio_route_pricer::api::HttpPricingApi;
/// use tokio_route_pricer::config::ApiConfig;
/// use std::time::Duration;
///
/// let api = HttpPricingApi::new(&ApiConfig::default())
///     .with_bearer_token("secret")
///     .with_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct HttpPricingApi {
    client: reqwest::Client,
    autocomplete_url: String,
    estimate_url: String,
    price_url: String,
    bearer_token: Option<String>,
    timeout: Duration,
}

impl HttpPricingApi {
    /// Client for the endpoints named in `config`.
    pub fn new(config: &ApiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            autocomplete_url: config.autocomplete_url.clone(),
            estimate_url: config.estimate_url.clone(),
            price_url: config.price_url.clone(),
            bearer_token: None,
            timeout: config.request_timeout(),
        }
    }

    /// Point all three endpoints at `base_url` using the standard paths.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        self.autocomplete_url = format!("{base}{AUTOCOMPLETE_PATH}");
        self.estimate_url = format!("{base}{ESTIMATE_PATH}");
        self.price_url = format!("{base}{PRICE_PATH}");
        self
    }

    /// Set the bearer token sent with price-calculation calls.
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send a prepared request and decode its JSON body.
    async fn send_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, TaskFailure> {
        let response = request.timeout(self.timeout).send().await.map_err(|e| {
            if e.is_timeout() {
                TaskFailure::Transport(format!("{endpoint} request timed out: {e}"))
            } else {
                TaskFailure::Transport(format!("{endpoint} request failed: {e}"))
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(TaskFailure::Transport(format!(
                "{endpoint} error {status}: {error_text}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| TaskFailure::Transport(format!("{endpoint} response undecodable: {e}")))
    }
}

#[async_trait]
impl PricingApi for HttpPricingApi {
    async fn autocomplete(&self, city_name: &str) -> Result<AutocompleteResponse, TaskFailure> {
        let request = self.client.get(&self.autocomplete_url).query(&[
            ("str", city_name),
            ("page", "1"),
            ("perPage", "10"),
        ]);
        self.send_json("autocomplete", request).await
    }

    async fn estimate_tariffs(
        &self,
        request: &ServiceIdRequest<'_>,
    ) -> Result<TariffEstimateResponse, TaskFailure> {
        let request = self.client.post(&self.estimate_url).json(request);
        self.send_json("estimate", request).await
    }

    async fn calculate_price(
        &self,
        body: &PriceCalculationBody<'_>,
    ) -> Result<PriceResponse, TaskFailure> {
        let mut request = self.client.post(&self.price_url).json(body);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }
        self.send_json("price", request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_base_url_appends_standard_paths() {
        let api = HttpPricingApi::new(&ApiConfig::default()).with_base_url("http://127.0.0.1:9/");
        assert_eq!(api.autocomplete_url, "http://127.0.0.1:9/cities/autocomplete");
        assert_eq!(api.estimate_url, "http://127.0.0.1:9/estimateV2");
        assert_eq!(api.price_url, "http://127.0.0.1:9/getTariffInfo");
    }

    #[test]
    fn test_new_takes_timeout_from_config() {
        let config = ApiConfig {
            request_timeout_ms: 1234,
            ..ApiConfig::default()
        };
        let api = HttpPricingApi::new(&config);
        assert_eq!(api.timeout, Duration::from_millis(1234));
        assert!(api.bearer_token.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_failure() {
        let api = HttpPricingApi::new(&ApiConfig::default())
            .with_base_url("http://127.0.0.1:9")
            .with_timeout(Duration::from_millis(500));
        let result = api.autocomplete("Moscow").await;
        assert!(matches!(result, Err(TaskFailure::Transport(_))));
    }
}
