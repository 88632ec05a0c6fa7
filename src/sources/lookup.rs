//! Lookup fetchers
//!
//! Lookup options are resolved by an external fetch rather than metadata.
//! [`HttpLookupFetcher`] queries a remote endpoint keyed on a field,
//! [`FieldLookup`] binds such a service to one field, and [`FnLookup`] adapts
//! an injected async function.

use super::{LookupFetcher, LookupService, SelectOption, SourceResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Remote lookup endpoint
///
/// Issues `GET {base_url}?field=<field>&q=<query>` and accepts either a bare
/// JSON array of options or an object wrapping them in `values`.
#[derive(Debug, Clone)]
pub struct HttpLookupFetcher {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LookupPayload {
    Bare(Vec<SelectOption>),
    Wrapped { values: Vec<SelectOption> },
}

impl LookupPayload {
    fn into_options(self) -> Vec<SelectOption> {
        match self {
            Self::Bare(values) | Self::Wrapped { values } => values,
        }
    }
}

impl HttpLookupFetcher {
    pub fn new(base_url: impl Into<String>) -> SourceResult<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> SourceResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn query_params(field_api_name: &str, query: Option<&str>) -> Vec<(&'static str, String)> {
        let mut params = vec![("field", field_api_name.to_string())];
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            params.push(("q", query.to_string()));
        }
        params
    }

    fn decode(body: &str) -> SourceResult<Vec<SelectOption>> {
        let payload: LookupPayload = serde_json::from_str(body)?;
        Ok(payload.into_options())
    }
}

#[async_trait]
impl LookupService for HttpLookupFetcher {
    async fn lookup_values(
        &self,
        field_api_name: &str,
        query: Option<&str>,
    ) -> SourceResult<Vec<SelectOption>> {
        debug!("Lookup request for field '{}' with query {:?}", field_api_name, query);

        let body = self
            .client
            .get(&self.base_url)
            .query(&Self::query_params(field_api_name, query))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let options = Self::decode(&body)?;
        debug!("Lookup for '{}' returned {} options", field_api_name, options.len());
        Ok(options)
    }
}

/// A lookup service bound to a single field
#[derive(Debug, Clone)]
pub struct FieldLookup {
    service: Arc<dyn LookupService>,
    field_api_name: String,
}

impl FieldLookup {
    pub fn new(service: Arc<dyn LookupService>, field_api_name: impl Into<String>) -> Self {
        Self {
            service,
            field_api_name: field_api_name.into(),
        }
    }
}

#[async_trait]
impl LookupFetcher for FieldLookup {
    fn name(&self) -> &str {
        &self.field_api_name
    }

    async fn fetch(&self, query: Option<&str>) -> SourceResult<Vec<SelectOption>> {
        self.service.lookup_values(&self.field_api_name, query).await
    }
}

/// Adapts an async function into a [`LookupFetcher`]
pub struct FnLookup<F> {
    name: String,
    fetch_fn: F,
}

impl<F, Fut> FnLookup<F>
where
    F: Fn(Option<String>) -> Fut + Send + Sync,
    Fut: Future<Output = SourceResult<Vec<SelectOption>>> + Send + 'static,
{
    pub fn new(name: impl Into<String>, fetch_fn: F) -> Self {
        Self {
            name: name.into(),
            fetch_fn,
        }
    }
}

impl<F> fmt::Debug for FnLookup<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnLookup").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<F, Fut> LookupFetcher for FnLookup<F>
where
    F: Fn(Option<String>) -> Fut + Send + Sync,
    Fut: Future<Output = SourceResult<Vec<SelectOption>>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, query: Option<&str>) -> SourceResult<Vec<SelectOption>> {
        (self.fetch_fn)(query.map(str::to_string)).await
    }
}
