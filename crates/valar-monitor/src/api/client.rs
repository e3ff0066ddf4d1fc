/*
[INPUT]:  API base URL, bearer token, timeouts, account filters
[OUTPUT]: Typed dashboard, position and order snapshots
[POS]:    HTTP layer - read-only dashboard REST client
[UPDATE]: When adding endpoints or changing query parameters
*/

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::error::{ApiError, Result};
use super::types::{DashboardSummary, Order, OrdersResponse, PositionsResponse, TradeDate};

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api/".to_string(),
            token: None,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct DashboardClient {
    http_client: Client,
    base_url: Url,
    token: Option<String>,
}

impl DashboardClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        // `Url::join` drops the last path segment unless it ends with a slash.
        let mut base = config.base_url;
        if !base.ends_with('/') {
            base.push('/');
        }

        Ok(Self {
            http_client,
            base_url: Url::parse(&base)?,
            token: config.token,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// GET /dashboard/summary?accounts=..
    ///
    /// An empty filter asks for every account.
    pub async fn summary(&self, accounts: &[String]) -> Result<DashboardSummary> {
        let builder = self
            .request(Method::GET, "dashboard/summary")?
            .query(&account_params(accounts));
        self.send_json(builder).await
    }

    /// GET /positions?accounts=..
    pub async fn positions(&self, accounts: &[String]) -> Result<PositionsResponse> {
        if accounts.is_empty() {
            return Ok(PositionsResponse::default());
        }
        let builder = self
            .request(Method::GET, "positions")?
            .query(&account_params(accounts));
        self.send_json(builder).await
    }

    /// GET /orders?tradedate=..&accounts=..
    pub async fn orders(&self, accounts: &[String], trade_date: Option<&str>) -> Result<Vec<Order>> {
        if accounts.is_empty() {
            return Ok(Vec::new());
        }
        let mut params = Vec::with_capacity(accounts.len() + 1);
        if let Some(trade_date) = trade_date {
            params.push(("tradedate", trade_date));
        }
        params.extend(account_params(accounts));

        let builder = self.request(Method::GET, "orders")?.query(&params);
        let response: OrdersResponse = self.send_json(builder).await?;
        Ok(response.orders)
    }

    /// GET /orders/current-date
    pub async fn current_trade_date(&self) -> Result<String> {
        let builder = self.request(Method::GET, "orders/current-date")?;
        let response: TradeDate = self.send_json(builder).await?;
        Ok(response.current_date)
    }

    fn request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        let url = self.base_url.join(endpoint)?;
        let builder = self.http_client.request(method, url);
        Ok(match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder.send().await?;
        let status = response.status();
        let url = response.url().clone();
        let body = response.text().await?;
        debug!(url = %url, status = status.as_u16(), bytes = body.len(), "api response");

        if !status.is_success() {
            return Err(ApiError::from_response(status, &body));
        }
        Ok(serde_json::from_str(&body)?)
    }
}

fn account_params(accounts: &[String]) -> Vec<(&'static str, &str)> {
    accounts
        .iter()
        .map(|account| ("accounts", account.as_str()))
        .collect()
}
