//! REST API client for the scheduling backend.
//!
//! Wraps the team, resource, lookup, project, job and config endpoints using
//! [`reqwest`]. Every call returns an explicit [`Result`]; choosing between an
//! empty state and an error toast is left to the caller.

use crewboard_core::allocation::AllocationRequest;
use crewboard_core::filter::{
    JobFilter, LookupQuery, ProjectFilter, ResourceQuery, SuggestionQuery, TeamFilter,
};
use crewboard_core::team::{
    Job, LookupRecord, OrgConfig, Page, Project, Resource, Team, TeamSuggestion,
};
use serde::{Deserialize, Serialize};

/// HTTP client for one backend deployment.
#[derive(Clone)]
pub struct BackendApi {
    client: reqwest::Client,
    api_url: String,
}

/// Acknowledgement returned by every mutating endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MutationResponse {
    pub success: bool,
    /// Backend explanation, usually present when `success` is false.
    #[serde(default)]
    pub message: Option<String>,
    /// Id of the created or updated record, when the backend reports it.
    #[serde(default)]
    pub id: Option<String>,
}

/// `{ "results": [...] }` envelope of unpaged list endpoints.
#[derive(Debug, Deserialize)]
struct Results<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

#[derive(Serialize)]
struct DeactivateBody<'a> {
    id: &'a str,
}

/// Errors from the backend REST layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, body decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("Backend API error ({status}): {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The backend answered 2xx but reported `success: false`.
    #[error("Backend rejected the request: {0}")]
    Rejected(String),
}

impl BackendApi {
    /// Create a new API client.
    ///
    /// * `api_url` - Base HTTP URL without trailing slash, e.g.
    ///   `http://host:8080/api`.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self { client, api_url }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    // ---- teams ----

    /// `GET /team`: one page of teams matching the filter.
    pub async fn list_teams(&self, filter: &TeamFilter) -> Result<Page<Team>, ApiError> {
        let response = self
            .client
            .get(self.url("/team"))
            .query(filter)
            .send()
            .await?;
        let page: Page<Team> = Self::parse_response(response).await?;
        tracing::debug!(
            total_items = page.total_items,
            returned = page.results.len(),
            "Fetched teams"
        );
        Ok(page)
    }

    /// `POST /team`: create or update a team.
    pub async fn save_team(&self, team: &Team) -> Result<MutationResponse, ApiError> {
        let response = self
            .client
            .post(self.url("/team"))
            .json(team)
            .send()
            .await?;
        Self::parse_mutation(response).await
    }

    /// `POST /team/deactivate`: soft-delete a team.
    pub async fn deactivate_team(&self, team_id: &str) -> Result<MutationResponse, ApiError> {
        let response = self
            .client
            .post(self.url("/team/deactivate"))
            .json(&DeactivateBody { id: team_id })
            .send()
            .await?;
        Self::parse_mutation(response).await
    }

    /// `GET /teamResource/suggestion`: backend-ranked candidates for a
    /// requirement.
    pub async fn team_suggestions(
        &self,
        query: &SuggestionQuery,
    ) -> Result<Vec<TeamSuggestion>, ApiError> {
        let response = self
            .client
            .get(self.url("/teamResource/suggestion"))
            .query(query)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    /// `POST /team/allocate`: create (no id) or update an allocation.
    pub async fn allocate(
        &self,
        request: &AllocationRequest,
    ) -> Result<MutationResponse, ApiError> {
        let response = self
            .client
            .post(self.url("/team/allocate"))
            .json(request)
            .send()
            .await?;
        Self::parse_mutation(response).await
    }

    // ---- resources and lookups ----

    /// `GET /resource`: resources in the given regions and window.
    pub async fn list_resources(&self, query: &ResourceQuery) -> Result<Vec<Resource>, ApiError> {
        let response = self
            .client
            .get(self.url("/resource"))
            .query(query)
            .send()
            .await?;
        let envelope: Results<Resource> = Self::parse_response(response).await?;
        Ok(envelope.results)
    }

    /// `GET /genericQuery`: id/name lookup for any object type.
    pub async fn generic_query(&self, query: &LookupQuery) -> Result<Vec<LookupRecord>, ApiError> {
        let response = self
            .client
            .get(self.url("/genericQuery"))
            .query(query)
            .send()
            .await?;
        let envelope: Results<LookupRecord> = Self::parse_response(response).await?;
        Ok(envelope.results)
    }

    // ---- list panels ----

    /// `GET /project`
    pub async fn list_projects(&self, filter: &ProjectFilter) -> Result<Page<Project>, ApiError> {
        let response = self
            .client
            .get(self.url("/project"))
            .query(filter)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    /// `GET /job`
    pub async fn list_jobs(&self, filter: &JobFilter) -> Result<Page<Job>, ApiError> {
        let response = self
            .client
            .get(self.url("/job"))
            .query(filter)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    /// `GET /config`: org feature flags and picklists.
    pub async fn fetch_config(&self) -> Result<OrgConfig, ApiError> {
        let response = self.client.get(self.url("/config")).send().await?;
        Self::parse_response(response).await
    }

    // ---- private helpers ----

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or an [`ApiError::Status`]
    /// containing the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// Parse a mutation acknowledgement, turning `success: false` into
    /// [`ApiError::Rejected`].
    async fn parse_mutation(response: reqwest::Response) -> Result<MutationResponse, ApiError> {
        let ack: MutationResponse = Self::parse_response(response).await?;
        if !ack.success {
            let message = ack
                .message
                .unwrap_or_else(|| "The request was not accepted".to_string());
            return Err(ApiError::Rejected(message));
        }
        Ok(ack)
    }
}
