//! Data API query builder.

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{check, Backend, BackendError};

/// Entry point returned by `Client::from(table)`.
pub struct QueryBuilder {
    backend: Backend,
    table: String,
    bearer: Option<String>,
}

impl QueryBuilder {
    pub(super) fn new(backend: Backend, table: &str, bearer: Option<String>) -> Self {
        Self {
            backend,
            table: table.to_string(),
            bearer,
        }
    }

    fn request(self, method: Method, body: Option<serde_json::Value>) -> Request {
        Request {
            backend: self.backend,
            table: self.table,
            bearer: self.bearer,
            method,
            body,
            params: Vec::new(),
            prefer: Vec::new(),
        }
    }

    pub fn select(self, columns: &str) -> Request {
        let mut request = self.request(Method::GET, None);
        request.params.push(("select".to_string(), columns.to_string()));
        request
    }

    pub fn insert<T: Serialize>(self, row: &T) -> Result<Request, BackendError> {
        let body = serde_json::to_value(row)?;
        let mut request = self.request(Method::POST, Some(body));
        request.prefer.push("return=representation");
        Ok(request)
    }

    /// Insert, or overwrite the row with the same primary key.
    pub fn upsert<T: Serialize>(self, row: &T) -> Result<Request, BackendError> {
        let body = serde_json::to_value(row)?;
        let mut request = self.request(Method::POST, Some(body));
        request.prefer.push("resolution=merge-duplicates");
        Ok(request)
    }

    pub fn update<T: Serialize>(self, patch: &T) -> Result<Request, BackendError> {
        let body = serde_json::to_value(patch)?;
        Ok(self.request(Method::PATCH, Some(body)))
    }

    pub fn delete(self) -> Request {
        self.request(Method::DELETE, None)
    }
}

/// A data API call ready to be filtered and sent.
pub struct Request {
    backend: Backend,
    table: String,
    bearer: Option<String>,
    method: Method,
    body: Option<serde_json::Value>,
    params: Vec<(String, String)>,
    prefer: Vec<&'static str>,
}

impl Request {
    /// Keep rows where `column` equals `value`.
    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.params
            .push((column.to_string(), format!("eq.{}", value.to_string())));
        self
    }

    /// Sort by `column`.
    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.params
            .push(("order".to_string(), format!("{}.{}", column, direction)));
        self
    }

    fn build(self, single: bool) -> reqwest::RequestBuilder {
        let url = self.backend.rest_url(&self.table);
        let mut builder = self.backend.inner.http.request(self.method.clone(), url);
        builder = self.backend.authorize(builder, self.bearer.as_deref());

        if !self.params.is_empty() {
            builder = builder.query(&self.params);
        }
        if !self.prefer.is_empty() {
            builder = builder.header("Prefer", self.prefer.join(","));
        }
        if single {
            builder = builder.header("Accept", "application/vnd.pgrst.object+json");
        }
        if let Some(body) = &self.body {
            builder = builder.json(body);
        }

        tracing::debug!(method = %self.method, table = %self.table, "Backend request");
        builder
    }

    /// Send and decode every returned row.
    pub async fn fetch<T: DeserializeOwned>(self) -> Result<Vec<T>, BackendError> {
        let response = check(self.build(false).send().await?).await?;
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Send and decode exactly one row; "no rows" is `Ok(None)`.
    pub async fn fetch_optional<T: DeserializeOwned>(self) -> Result<Option<T>, BackendError> {
        match check(self.build(true).send().await?).await {
            Ok(response) => {
                let bytes = response.bytes().await?;
                Ok(Some(serde_json::from_slice(&bytes)?))
            }
            Err(err) if err.is_no_rows() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Send, discarding any body.
    pub async fn execute(self) -> Result<(), BackendError> {
        check(self.build(false).send().await?).await?;
        Ok(())
    }
}
