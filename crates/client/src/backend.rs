//! The data-access seam used by the console panels.

use async_trait::async_trait;
use crewboard_core::allocation::AllocationRequest;
use crewboard_core::filter::{
    JobFilter, LookupQuery, ProjectFilter, ResourceQuery, SuggestionQuery, TeamFilter,
};
use crewboard_core::team::{
    Job, LookupRecord, OrgConfig, Page, Project, Resource, Team, TeamSuggestion,
};

use crate::api::{ApiError, BackendApi, MutationResponse};

/// Everything the console reads from or writes to the scheduling backend.
#[async_trait]
pub trait SchedulingBackend: Send + Sync {
    async fn list_teams(&self, filter: &TeamFilter) -> Result<Page<Team>, ApiError>;
    async fn save_team(&self, team: &Team) -> Result<MutationResponse, ApiError>;
    async fn deactivate_team(&self, team_id: &str) -> Result<MutationResponse, ApiError>;
    async fn team_suggestions(
        &self,
        query: &SuggestionQuery,
    ) -> Result<Vec<TeamSuggestion>, ApiError>;
    async fn allocate(&self, request: &AllocationRequest) -> Result<MutationResponse, ApiError>;
    async fn list_resources(&self, query: &ResourceQuery) -> Result<Vec<Resource>, ApiError>;
    async fn generic_query(&self, query: &LookupQuery) -> Result<Vec<LookupRecord>, ApiError>;
    async fn list_projects(&self, filter: &ProjectFilter) -> Result<Page<Project>, ApiError>;
    async fn list_jobs(&self, filter: &JobFilter) -> Result<Page<Job>, ApiError>;
    async fn fetch_config(&self) -> Result<OrgConfig, ApiError>;
}

#[async_trait]
impl SchedulingBackend for BackendApi {
    async fn list_teams(&self, filter: &TeamFilter) -> Result<Page<Team>, ApiError> {
        BackendApi::list_teams(self, filter).await
    }

    async fn save_team(&self, team: &Team) -> Result<MutationResponse, ApiError> {
        BackendApi::save_team(self, team).await
    }

    async fn deactivate_team(&self, team_id: &str) -> Result<MutationResponse, ApiError> {
        BackendApi::deactivate_team(self, team_id).await
    }

    async fn team_suggestions(
        &self,
        query: &SuggestionQuery,
    ) -> Result<Vec<TeamSuggestion>, ApiError> {
        BackendApi::team_suggestions(self, query).await
    }

    async fn allocate(&self, request: &AllocationRequest) -> Result<MutationResponse, ApiError> {
        BackendApi::allocate(self, request).await
    }

    async fn list_resources(&self, query: &ResourceQuery) -> Result<Vec<Resource>, ApiError> {
        BackendApi::list_resources(self, query).await
    }

    async fn generic_query(&self, query: &LookupQuery) -> Result<Vec<LookupRecord>, ApiError> {
        BackendApi::generic_query(self, query).await
    }

    async fn list_projects(&self, filter: &ProjectFilter) -> Result<Page<Project>, ApiError> {
        BackendApi::list_projects(self, filter).await
    }

    async fn list_jobs(&self, filter: &JobFilter) -> Result<Page<Job>, ApiError> {
        BackendApi::list_jobs(self, filter).await
    }

    async fn fetch_config(&self) -> Result<OrgConfig, ApiError> {
        BackendApi::fetch_config(self).await
    }
}
