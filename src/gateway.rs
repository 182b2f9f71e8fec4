use std::fmt::Display;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::config::AppConfig;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("http error: {0}")]
    Http(String),
    #[error("{method} {table} failed: {status} {body}")]
    Status {
        method: Method,
        table: String,
        status: u16,
        body: String,
    },
    #[error("parse error: {0}")]
    Parse(String),
}

/// PostgREST query parameters (`select`, column filters, ordering, limit).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    params: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.params.push(("select".into(), columns.into()));
        self
    }

    pub fn eq(mut self, column: &str, value: impl Display) -> Self {
        self.params.push((column.into(), format!("eq.{value}")));
        self
    }

    pub fn order(mut self, column: &str, descending: bool) -> Self {
        let direction = if descending { "desc" } else { "asc" };
        self.params
            .push(("order".into(), format!("{column}.{direction}")));
        self
    }

    pub fn limit(mut self, rows: usize) -> Self {
        self.params.push(("limit".into(), rows.to_string()));
        self
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// Thin client for the managed backend's per-table REST endpoints.
#[derive(Clone)]
pub struct RestGateway {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestGateway {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("event-monitor/0.1")
            .build()
            .map_err(|err| GatewayError::Http(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, GatewayError> {
        Self::new(&config.store_url, &config.api_key, config.timeout)
    }

    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query,
    ) -> Result<Vec<T>, GatewayError> {
        let response = self.send(self.request(Method::GET, table, query)).await?;
        read_rows(Method::GET, table, response).await
    }

    pub async fn insert<T, B>(&self, table: &str, body: &B) -> Result<Vec<T>, GatewayError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self
            .request(Method::POST, table, &Query::new())
            .header("Prefer", "return=representation")
            .json(body);
        let response = self.send(request).await?;
        read_rows(Method::POST, table, response).await
    }

    pub async fn update<T, B>(
        &self,
        table: &str,
        body: &B,
        query: &Query,
    ) -> Result<Vec<T>, GatewayError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self
            .request(Method::PATCH, table, query)
            .header("Prefer", "return=representation")
            .json(body);
        let response = self.send(request).await?;
        read_rows(Method::PATCH, table, response).await
    }

    pub async fn delete(&self, table: &str, query: &Query) -> Result<(), GatewayError> {
        let response = self.send(self.request(Method::DELETE, table, query)).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                method: Method::DELETE,
                table: table.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    fn request(&self, method: Method, table: &str, query: &Query) -> RequestBuilder {
        let url = format!("{}/rest/v1/{}", self.base_url.trim_end_matches('/'), table);
        let builder = self
            .client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key);
        if query.is_empty() {
            builder
        } else {
            builder.query(query.params())
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, GatewayError> {
        request
            .send()
            .await
            .map_err(|err| GatewayError::Http(err.to_string()))
    }
}

async fn read_rows<T: DeserializeOwned>(
    method: Method,
    table: &str,
    response: Response,
) -> Result<Vec<T>, GatewayError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|err| GatewayError::Http(err.to_string()))?;
    if !status.is_success() {
        return Err(GatewayError::Status {
            method,
            table: table.to_string(),
            status: status.as_u16(),
            body,
        });
    }
    serde_json::from_str(&body).map_err(|err| GatewayError::Parse(format!("{table}: {err}")))
}
