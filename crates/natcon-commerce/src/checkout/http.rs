//! [`OrderApi`] over HTTP.

use async_trait::async_trait;
use natcon_data::{FetchClient, FetchError, Response};

use crate::checkout::{OrderApi, OrderApiError, OrderConfirmation, OrderRequest, OrderResponse};
use crate::config::OrderApiConfig;
use crate::error::CommerceError;

/// Header carrying the idempotency key.
pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// Posts orders as JSON to the commerce API.
#[derive(Clone)]
pub struct HttpOrderApi {
    client: FetchClient,
    orders_path: String,
    api_key: Option<String>,
}

impl HttpOrderApi {
    /// Post to `orders_path` on `client`, which should carry the base URL.
    pub fn new(client: FetchClient, orders_path: impl Into<String>) -> Self {
        Self {
            client,
            orders_path: orders_path.into(),
            api_key: None,
        }
    }

    pub fn from_config(config: &OrderApiConfig) -> Result<Self, CommerceError> {
        let base_url = config.base_url.as_deref().ok_or_else(|| {
            CommerceError::ConfigError("order_api.base_url is not set".to_string())
        })?;
        let client = FetchClient::new()
            .map_err(|e| CommerceError::ConfigError(e.to_string()))?
            .with_base_url(base_url)
            .with_default_header("Accept", "application/json")
            .with_timeout(config.timeout());

        let api = Self::new(client, config.orders_path.clone());
        Ok(match &config.api_key {
            Some(key) => api.with_api_key(key.clone()),
            None => api,
        })
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn interpret(response: Response) -> Result<OrderConfirmation, OrderApiError> {
        let transient = response.status == 429 || response.is_server_error();

        match response.json::<OrderResponse>() {
            Ok(OrderResponse::Accepted { .. }) if !response.is_success() => {
                Err(OrderApiError::invalid_response(
                    format!("order accepted with HTTP {}", response.status),
                    transient,
                ))
            }
            Ok(body) => body.into_result(transient),
            // The order may exist already; a retry with the same key is safe.
            Err(_) if response.is_success() => Err(OrderApiError::invalid_response(
                "order API returned an unreadable confirmation",
                true,
            )),
            Err(_) => Err(response
                .error_for_status()
                .err()
                .map(OrderApiError::from)
                .unwrap_or_else(|| OrderApiError::invalid_response("unexpected response", false))),
        }
    }
}

#[async_trait]
impl OrderApi for HttpOrderApi {
    async fn submit_order(
        &self,
        request: &OrderRequest,
    ) -> Result<OrderConfirmation, OrderApiError> {
        let mut call = self
            .client
            .post(&self.orders_path)
            .header(IDEMPOTENCY_HEADER, request.idempotency_key.as_str())
            .json(request)?;
        if let Some(key) = &self.api_key {
            call = call.bearer_auth(key);
        }

        tracing::debug!(
            idempotency_key = %request.idempotency_key,
            items = request.items.len(),
            "posting order"
        );
        let response = call.send().await?;
        Self::interpret(response)
    }
}

impl From<FetchError> for OrderApiError {
    fn from(e: FetchError) -> Self {
        let retryable = e.is_retryable();
        match e {
            FetchError::ConnectionError(_) | FetchError::RequestError(_) => {
                OrderApiError::network(e.to_string())
            }
            FetchError::Timeout => OrderApiError::new("timeout", e.to_string(), true),
            FetchError::HttpError { status, .. } => {
                OrderApiError::new(format!("http_{}", status), e.to_string(), retryable)
            }
            FetchError::InvalidUrl(_) | FetchError::JsonError(_) => {
                OrderApiError::new("client_error", e.to_string(), false)
            }
            FetchError::ParseError(_) => OrderApiError::invalid_response(e.to_string(), retryable),
        }
    }
}
