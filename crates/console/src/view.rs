//! Swimlane view model: the plain data a renderer draws.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crewboard_core::allocation::double_bookings;
use crewboard_core::hhmm;
use crewboard_core::layout::{CardRect, GridLayout};
use crewboard_core::swimlane::SwimlaneSetting;
use crewboard_core::team::{Team, TeamAllocation, TeamRequirement};
use crewboard_core::types::RecordId;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnHeader {
    pub date: NaiveDate,
    /// e.g. `Mon 01/08`.
    pub label: String,
    pub left: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardView {
    pub allocation_id: Option<RecordId>,
    pub resource_id: RecordId,
    pub resource_name: String,
    pub left: f64,
    pub width: f64,
    pub first_column: usize,
    pub span: usize,
    /// `HH:MM - HH:MM`.
    pub time_label: String,
    pub is_team_leader: bool,
    /// Resource unavailable or double-booked during the allocation.
    pub conflicting: bool,
}

/// One requirement of a team: a horizontal lane of cards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaneView {
    pub requirement_id: Option<RecordId>,
    pub name: String,
    pub cards: Vec<CardView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamRow {
    pub team_id: Option<RecordId>,
    pub name: String,
    pub region_name: Option<String>,
    pub lanes: Vec<LaneView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwimlaneView {
    pub columns: Vec<ColumnHeader>,
    pub column_width: f64,
    pub total_width: f64,
    /// Slot labels of the working-hours window, shown under each date.
    pub time_slots: Vec<String>,
    pub rows: Vec<TeamRow>,
}

impl SwimlaneView {
    pub fn card(&self, allocation_id: &str) -> Option<&CardView> {
        self.rows
            .iter()
            .flat_map(|row| row.lanes.iter())
            .flat_map(|lane| lane.cards.iter())
            .find(|card| card.allocation_id.as_deref() == Some(allocation_id))
    }
}

/// Build the view for `teams` on `grid`.
///
/// `conflicts` holds ids of allocations whose resource is unavailable;
/// allocations double-booked within one requirement are flagged as well.
/// Cards entirely outside the visible dates are left out.
pub fn build_view(
    teams: &[Team],
    grid: &GridLayout,
    setting: &SwimlaneSetting,
    conflicts: &HashSet<RecordId>,
) -> SwimlaneView {
    let width = grid.column_width();
    let columns = grid
        .dates()
        .iter()
        .enumerate()
        .map(|(i, date)| ColumnHeader {
            date: *date,
            label: format!("{} {:02}/{:02}", date.weekday(), date.month(), date.day()),
            left: i as f64 * width,
        })
        .collect();

    let rows = teams
        .iter()
        .map(|team| TeamRow {
            team_id: team.id.clone(),
            name: team.name.clone(),
            region_name: team.region_name.clone(),
            lanes: team
                .requirements
                .iter()
                .enumerate()
                .map(|(i, req)| lane(i, req, grid, conflicts))
                .collect(),
        })
        .collect();

    SwimlaneView {
        columns,
        column_width: width,
        total_width: grid.total_width(),
        time_slots: setting.time_slots().into_iter().map(hhmm::decode).collect(),
        rows,
    }
}

fn lane(
    index: usize,
    requirement: &TeamRequirement,
    grid: &GridLayout,
    conflicts: &HashSet<RecordId>,
) -> LaneView {
    let double_booked: HashSet<&str> = double_bookings(requirement)
        .into_iter()
        .flat_map(|(a, b)| [a.id.as_deref(), b.id.as_deref()])
        .flatten()
        .collect();

    let cards = requirement
        .allocations
        .iter()
        .filter_map(|allocation| {
            let rect = grid.place(allocation.start_date, allocation.end_date)?;
            let conflicting = allocation
                .id
                .as_deref()
                .is_some_and(|id| conflicts.contains(id) || double_booked.contains(id));
            Some(card(allocation, rect, conflicting))
        })
        .collect();

    LaneView {
        requirement_id: requirement.id.clone(),
        name: requirement
            .name
            .clone()
            .unwrap_or_else(|| format!("Position {}", index + 1)),
        cards,
    }
}

fn card(allocation: &TeamAllocation, rect: CardRect, conflicting: bool) -> CardView {
    CardView {
        allocation_id: allocation.id.clone(),
        resource_id: allocation.resource_id.clone(),
        resource_name: allocation
            .resource_name
            .clone()
            .unwrap_or_else(|| allocation.resource_id.clone()),
        left: rect.left,
        width: rect.width,
        first_column: rect.first_column,
        span: rect.span,
        time_label: format!(
            "{} - {}",
            hhmm::decode(allocation.start_time),
            hhmm::decode(allocation.end_time)
        ),
        is_team_leader: allocation.is_team_leader,
        conflicting,
    }
}

#[cfg(test)]
mod tests {
    use crewboard_core::swimlane::{build_date_range, WeekdayMask};

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn allocation(id: &str, resource: &str, start: NaiveDate, end: NaiveDate) -> TeamAllocation {
        TeamAllocation {
            id: Some(id.into()),
            resource_id: resource.into(),
            resource_name: Some(format!("Name {resource}")),
            start_date: start,
            end_date: end,
            start_time: 800,
            end_time: 1630,
            is_team_leader: false,
        }
    }

    fn team(allocations: Vec<TeamAllocation>) -> Team {
        Team {
            id: Some("T1".into()),
            name: "North crew".into(),
            region_id: Some("R1".into()),
            region_name: Some("North".into()),
            active: true,
            requirements: vec![TeamRequirement {
                id: Some("REQ1".into()),
                allocations,
                ..TeamRequirement::default()
            }],
        }
    }

    fn week_grid() -> GridLayout {
        // 7 columns at 1750px * 0.8 / 7 = 200px.
        GridLayout::new(
            build_date_range(date(2024, 1, 1), date(2024, 1, 7), &WeekdayMask::all()),
            1750.0,
        )
    }

    #[test]
    fn columns_and_cards_are_positioned() {
        let teams = vec![team(vec![allocation(
            "A1",
            "RES1",
            date(2024, 1, 2),
            date(2024, 1, 3),
        )])];
        let view = build_view(&teams, &week_grid(), &SwimlaneSetting::default(), &HashSet::new());

        assert_eq!(view.columns.len(), 7);
        assert_eq!(view.columns[0].label, "Mon 01/01");
        assert_eq!(view.column_width, 200.0);
        assert_eq!(view.rows.len(), 1);
        assert_eq!(view.rows[0].lanes[0].name, "Position 1");

        let card = view.card("A1").unwrap();
        assert_eq!(card.left, 200.0);
        assert_eq!(card.width, 400.0);
        assert_eq!(card.span, 2);
        assert_eq!(card.time_label, "08:00 - 16:30");
        assert!(!card.conflicting);
    }

    #[test]
    fn cards_outside_range_are_skipped_and_edges_clipped() {
        let teams = vec![team(vec![
            allocation("OUT", "RES1", date(2023, 12, 1), date(2023, 12, 5)),
            allocation("CLIP", "RES2", date(2023, 12, 30), date(2024, 1, 2)),
        ])];
        let view = build_view(&teams, &week_grid(), &SwimlaneSetting::default(), &HashSet::new());

        assert!(view.card("OUT").is_none());
        let clipped = view.card("CLIP").unwrap();
        assert_eq!(clipped.first_column, 0);
        assert_eq!(clipped.span, 2);
    }

    #[test]
    fn conflicts_and_double_bookings_are_flagged() {
        let teams = vec![team(vec![
            allocation("A1", "RES1", date(2024, 1, 1), date(2024, 1, 2)),
            allocation("A2", "RES1", date(2024, 1, 2), date(2024, 1, 3)),
            allocation("A3", "RES2", date(2024, 1, 5), date(2024, 1, 5)),
            allocation("A4", "RES3", date(2024, 1, 6), date(2024, 1, 6)),
        ])];
        let conflicts = HashSet::from(["A3".to_string()]);
        let view = build_view(&teams, &week_grid(), &SwimlaneSetting::default(), &conflicts);

        assert!(view.card("A1").unwrap().conflicting);
        assert!(view.card("A2").unwrap().conflicting);
        assert!(view.card("A3").unwrap().conflicting);
        assert!(!view.card("A4").unwrap().conflicting);
    }
}
