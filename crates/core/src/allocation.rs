//! Allocation rules: slot selection, candidate matching, conflict flagging and
//! the allocation editor form.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::hhmm;
use crate::team::{Resource, Team, TeamAllocation, TeamRequirement};
use crate::types::{Hhmm, RecordId};

// ---------------------------------------------------------------------------
// Period selection
// ---------------------------------------------------------------------------

/// The user's in-progress selection on the grid: a date window and optionally
/// the resource it was started on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default)]
    pub resource_id: Option<RecordId>,
}

impl Period {
    /// Build from two grid dates picked in either order.
    pub fn between(a: NaiveDate, b: NaiveDate) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
            resource_id: None,
        }
    }

    pub fn with_resource(mut self, resource_id: impl Into<RecordId>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        ranges_overlap(self.start, self.end, start, end)
    }
}

/// Inclusive-inclusive interval intersection.
pub fn ranges_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start <= b_end && b_start <= a_end
}

// ---------------------------------------------------------------------------
// Candidate matching
// ---------------------------------------------------------------------------

/// Whether `resource` carries every tag the requirement asks for.
pub fn satisfies_tags(requirement: &TeamRequirement, resource: &Resource) -> bool {
    requirement
        .required_tags
        .iter()
        .all(|tag| resource.has_tag(&tag.id))
}

/// Resources eligible for a requirement.
///
/// A resource qualifies when it holds all required tags. The requirement's
/// preferred resource is left out; it is surfaced separately by
/// [`preferred_resource`].
pub fn matching_resources<'a>(
    requirement: &TeamRequirement,
    resources: &'a [Resource],
) -> Vec<&'a Resource> {
    let preferred = requirement.preferred_resource_id.as_deref();
    resources
        .iter()
        .filter(|r| Some(r.id.as_str()) != preferred)
        .filter(|r| satisfies_tags(requirement, r))
        .collect()
}

/// The requirement's preferred resource, if it is among `resources`.
pub fn preferred_resource<'a>(
    requirement: &TeamRequirement,
    resources: &'a [Resource],
) -> Option<&'a Resource> {
    let preferred = requirement.preferred_resource_id.as_deref()?;
    resources.iter().find(|r| r.id == preferred)
}

// ---------------------------------------------------------------------------
// Conflicts
// ---------------------------------------------------------------------------

/// Whether the resource is unavailable at any point of the allocation.
pub fn is_conflicting(allocation: &TeamAllocation, resource: &Resource) -> bool {
    resource.unavailabilities.iter().any(|u| {
        ranges_overlap(
            allocation.start_date,
            allocation.end_date,
            u.start_date,
            u.end_date,
        )
    })
}

/// Ids of allocations whose resource is unavailable during the allocation.
///
/// Allocations without an id or whose resource is not in `resources` are
/// never flagged.
pub fn conflicting_allocations(teams: &[Team], resources: &[Resource]) -> HashSet<RecordId> {
    let by_id: BTreeMap<&str, &Resource> = resources.iter().map(|r| (r.id.as_str(), r)).collect();
    teams
        .iter()
        .flat_map(Team::allocations)
        .filter(|a| {
            by_id
                .get(a.resource_id.as_str())
                .is_some_and(|r| is_conflicting(a, r))
        })
        .filter_map(|a| a.id.clone())
        .collect()
}

/// Pairs of allocations in one requirement that book the same resource on
/// overlapping dates. These are shown as conflicts, not rejected.
pub fn double_bookings(requirement: &TeamRequirement) -> Vec<(&TeamAllocation, &TeamAllocation)> {
    let allocations = &requirement.allocations;
    let mut pairs = Vec::new();
    for (i, a) in allocations.iter().enumerate() {
        for b in &allocations[i + 1..] {
            if a.resource_id == b.resource_id
                && ranges_overlap(a.start_date, a.end_date, b.start_date, b.end_date)
            {
                pairs.push((a, b));
            }
        }
    }
    pairs
}

// ---------------------------------------------------------------------------
// Editor form
// ---------------------------------------------------------------------------

/// Field name to message, for inline rendering next to each input.
pub type FieldErrors = BTreeMap<String, String>;

/// Flatten validator output into one message per field.
pub fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .filter_map(|(field, errs)| {
            errs.first().map(|e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                (field.to_string(), message)
            })
        })
        .collect()
}

fn validate_hhmm(value: &Hhmm) -> Result<(), ValidationError> {
    if hhmm::is_valid(*value) {
        Ok(())
    } else {
        let mut err = ValidationError::new("hhmm");
        err.message = Some("Enter a valid time (HH:MM)".into());
        Err(err)
    }
}

/// State of the allocation editor form.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct AllocationForm {
    /// Present when editing an existing allocation.
    pub id: Option<RecordId>,
    pub team_id: RecordId,
    pub requirement_id: RecordId,
    #[validate(required(message = "Resource is required"))]
    pub resource_id: Option<RecordId>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[validate(custom(function = "validate_hhmm"))]
    pub start_time: Hhmm,
    #[validate(custom(function = "validate_hhmm"))]
    pub end_time: Hhmm,
    pub is_team_leader: bool,
}

impl AllocationForm {
    /// Blank form for a new allocation over `period`, with the working-hours
    /// window as default times.
    pub fn new(
        team_id: impl Into<RecordId>,
        requirement_id: impl Into<RecordId>,
        period: &Period,
        day_start: Hhmm,
        day_end: Hhmm,
    ) -> Self {
        Self {
            id: None,
            team_id: team_id.into(),
            requirement_id: requirement_id.into(),
            resource_id: period.resource_id.clone(),
            start_date: period.start,
            end_date: period.end,
            start_time: day_start,
            end_time: day_end,
            is_team_leader: false,
        }
    }

    /// Form prefilled from an existing allocation.
    pub fn from_allocation(
        team_id: impl Into<RecordId>,
        requirement_id: impl Into<RecordId>,
        allocation: &TeamAllocation,
    ) -> Self {
        Self {
            id: allocation.id.clone(),
            team_id: team_id.into(),
            requirement_id: requirement_id.into(),
            resource_id: Some(allocation.resource_id.clone()),
            start_date: allocation.start_date,
            end_date: allocation.end_date,
            start_time: allocation.start_time,
            end_time: allocation.end_time,
            is_team_leader: allocation.is_team_leader,
        }
    }

    pub fn is_update(&self) -> bool {
        self.id.is_some()
    }

    /// Run field validation plus the date-order rule.
    pub fn check(&self) -> Result<(), FieldErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };
        if self.start_date > self.end_date {
            let mut err = ValidationError::new("date_order");
            err.message = Some("End date must not be before start date".into());
            errors.add("end_date", err);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(field_errors(&errors))
        }
    }

    /// Validate and convert into the wire request.
    pub fn into_request(self) -> Result<AllocationRequest, FieldErrors> {
        self.check()?;
        let Some(resource_id) = self.resource_id else {
            return Err(FieldErrors::from([(
                "resource_id".to_string(),
                "Resource is required".to_string(),
            )]));
        };
        Ok(AllocationRequest {
            id: self.id,
            team_id: self.team_id,
            requirement_id: self.requirement_id,
            resource_id,
            start_date: self.start_date,
            end_date: self.end_date,
            start_time: self.start_time,
            end_time: self.end_time,
            is_team_leader: self.is_team_leader,
        })
    }
}

/// Body of `POST /team/allocate`. An `id` updates, its absence creates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub team_id: RecordId,
    pub requirement_id: RecordId,
    pub resource_id: RecordId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: Hhmm,
    pub end_time: Hhmm,
    pub is_team_leader: bool,
}
