//! JSON-over-HTTP client for the TimeCore REST backend.

use reqwest::{header, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{ChangesResponse, Page, TimeCoreApi};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::models::{
    Project, ReportId, ReportQuery, ReportScope, ReportSummary, TimeReport, TimeReportPatch,
};
use crate::util::compact_text;

/// HTTP implementation of [`TimeCoreApi`].
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct HttpApi {
    base_url: String,
    session_cookie: Option<String>,
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpApi {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("HttpApi")
            .field("base_url", &self.base_url)
            .field(
                "session_cookie",
                &self.session_cookie.as_ref().map(|_| "[REDACTED]"),
            )
            .finish_non_exhaustive()
    }
}

impl HttpApi {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let config = config.clone().validated()?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            base_url: config.api_base_url,
            session_cookie: config.session_cookie,
            client,
        })
    }

    /// Returns the base URL this client was configured with.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let request = self
            .client
            .request(method, url)
            .header(header::ACCEPT, "application/json");
        match &self.session_cookie {
            Some(cookie) => request.header(header::COOKIE, cookie),
            None => request,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        pairs: &[(&'static str, String)],
    ) -> Result<T> {
        tracing::debug!(path = %path, "GET");
        let response = self.request(Method::GET, path).query(pairs).send().await?;
        let response = ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

impl TimeCoreApi for HttpApi {
    async fn list_reports(&self, query: &ReportQuery, cursor: Option<&str>) -> Result<Page> {
        self.get_json(query.scope.list_path(), &query.list_pairs(cursor))
            .await
    }

    async fn report_summary(&self, query: &ReportQuery) -> Result<ReportSummary> {
        let path = format!("{}/summary", query.scope.list_path());
        self.get_json(&path, &query.filter_pairs()).await
    }

    async fn latest_change(&self, query: &ReportQuery, since: Option<i64>) -> Result<Option<i64>> {
        let path = format!("{}/changes", query.scope.list_path());
        let mut pairs = query.filter_pairs();
        pairs.push(("scope", query.scope.as_str().to_string()));
        if let Some(since) = since {
            pairs.push(("since", since.to_string()));
        }
        let changes: ChangesResponse = self.get_json(&path, &pairs).await?;
        Ok(changes.latest_ms)
    }

    async fn update_report(
        &self,
        scope: ReportScope,
        id: ReportId,
        patch: &TimeReportPatch,
    ) -> Result<TimeReport> {
        let path = format!("{}/{id}", scope.list_path());
        tracing::debug!(path = %path, "PUT");
        let response = self.request(Method::PUT, &path).json(patch).send().await?;
        let response = ensure_report_success(response, id).await?;
        Ok(response.json::<TimeReport>().await?)
    }

    async fn delete_report(&self, scope: ReportScope, id: ReportId) -> Result<()> {
        let path = format!("{}/{id}", scope.list_path());
        tracing::debug!(path = %path, "DELETE");
        let response = self.request(Method::DELETE, &path).send().await?;
        ensure_report_success(response, id).await?;
        Ok(())
    }

    async fn list_projects(&self, customer_id: i64) -> Result<Vec<Project>> {
        let path = format!("/customers/{customer_id}/projects");
        self.get_json(&path, &[]).await
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::api(status.as_u16(), parse_api_error(status, &body)))
}

/// Like [`ensure_success`], but a 404 names the missing report.
async fn ensure_report_success(response: Response, id: ReportId) -> Result<Response> {
    if response.status() == StatusCode::NOT_FOUND {
        return Err(Error::NotFound(id));
    }
    ensure_success(response).await
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return compact_text(&message);
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .map_or_else(|| format!("HTTP {}", status.as_u16()), ToString::to_string)
    } else {
        trimmed
    }
}
