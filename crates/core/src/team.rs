//! Team, requirement, allocation and resource records as exchanged with the
//! scheduling backend.
//!
//! The console never holds an authoritative copy of these: every list or
//! detail view is fetched fresh and refetched after a mutation.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{Hhmm, RecordId};

fn active() -> bool {
    true
}

/// A skill or qualification tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: RecordId,
    #[serde(default)]
    pub name: String,
}

/// A crew of resources working together in a region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    /// `None` for a team that has not been saved yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub name: String,
    #[serde(default)]
    pub region_id: Option<RecordId>,
    #[serde(default)]
    pub region_name: Option<String>,
    /// Deactivated teams are soft-deleted.
    #[serde(default = "active")]
    pub active: bool,
    #[serde(default)]
    pub requirements: Vec<TeamRequirement>,
}

impl Team {
    pub fn requirement(&self, requirement_id: &str) -> Option<&TeamRequirement> {
        self.requirements
            .iter()
            .find(|r| r.id.as_deref() == Some(requirement_id))
    }

    /// Every allocation across all requirements of the team.
    pub fn allocations(&self) -> impl Iterator<Item = &TeamAllocation> {
        self.requirements.iter().flat_map(|r| r.allocations.iter())
    }
}

/// One seat in a team, optionally constrained by tags and a preferred
/// resource.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRequirement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub required_tags: Vec<Tag>,
    #[serde(default)]
    pub preferred_resource_id: Option<RecordId>,
    #[serde(default)]
    pub allocations: Vec<TeamAllocation>,
}

/// A resource assigned to a requirement for a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamAllocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub resource_id: RecordId,
    #[serde(default)]
    pub resource_name: Option<String>,
    pub start_date: NaiveDate,
    /// Never before `start_date`.
    pub end_date: NaiveDate,
    #[serde(default)]
    pub start_time: Hhmm,
    #[serde(default)]
    pub end_time: Hhmm,
    #[serde(default)]
    pub is_team_leader: bool,
}

/// A leave or other unavailability period of a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unavailability {
    #[serde(default)]
    pub id: Option<RecordId>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub reason: Option<String>,
}

/// A schedulable person or asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub unavailabilities: Vec<Unavailability>,
}

impl Resource {
    pub fn has_tag(&self, tag_id: &str) -> bool {
        self.tags.iter().any(|t| t.id == tag_id)
    }
}

/// A backend-ranked candidate for a requirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSuggestion {
    pub resource_id: RecordId,
    #[serde(default)]
    pub resource_name: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
}

/// Result row of the generic lookup endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupRecord {
    pub id: RecordId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub region_id: Option<RecordId>,
    #[serde(default)]
    pub account_name: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub project_id: Option<RecordId>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

/// One entry of an org-level picklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PicklistEntry {
    pub value: String,
    pub label: String,
}

/// Org-level feature flags and picklists, fetched once at startup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgConfig {
    #[serde(default)]
    pub features: BTreeMap<String, bool>,
    #[serde(default)]
    pub picklists: BTreeMap<String, Vec<PicklistEntry>>,
}

impl OrgConfig {
    /// Unknown flags are off.
    pub fn feature(&self, name: &str) -> bool {
        self.features.get(name).copied().unwrap_or(false)
    }

    pub fn picklist(&self, name: &str) -> &[PicklistEntry] {
        self.picklists.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// A page of list results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default)]
    pub total_items: u64,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            total_items: 0,
            results: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn team_deserializes_backend_payload() {
        let json = r#"{
            "id": "T1",
            "name": "North crew",
            "regionId": "R1",
            "requirements": [{
                "id": "REQ1",
                "requiredTags": [{"id": "TAG1", "name": "Electrician"}],
                "preferredResourceId": "RES9",
                "allocations": [{
                    "id": "A1",
                    "resourceId": "RES1",
                    "startDate": "2024-01-02",
                    "endDate": "2024-01-04",
                    "startTime": 800,
                    "endTime": 1700,
                    "isTeamLeader": true
                }]
            }]
        }"#;
        let team: Team = serde_json::from_str(json).unwrap();
        assert!(team.active);
        let req = team.requirement("REQ1").unwrap();
        assert_eq!(req.required_tags[0].id, "TAG1");
        assert_eq!(req.preferred_resource_id.as_deref(), Some("RES9"));
        assert_eq!(team.allocations().count(), 1);
        assert!(req.allocations[0].is_team_leader);
    }

    #[test]
    fn unsaved_team_omits_id() {
        let team = Team {
            id: None,
            name: "New".into(),
            region_id: None,
            region_name: None,
            active: true,
            requirements: vec![],
        };
        let value = serde_json::to_value(&team).unwrap();
        assert!(value.get("id").is_none());
        assert_eq!(value["name"], "New");
    }

    #[test]
    fn page_tolerates_missing_fields() {
        let page: Page<LookupRecord> = serde_json::from_str("{}").unwrap();
        assert_eq!(page.total_items, 0);
        assert!(page.results.is_empty());
    }

    #[test]
    fn org_config_unknown_feature_is_off() {
        let config: OrgConfig =
            serde_json::from_str(r#"{"features": {"teamSuggestions": true}}"#).unwrap();
        assert!(config.feature("teamSuggestions"));
        assert!(!config.feature("somethingElse"));
        assert!(config.picklist("jobStatus").is_empty());
    }
}
