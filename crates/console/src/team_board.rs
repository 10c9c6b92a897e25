//! The team allocation board: team rows over a date window, the single open
//! allocation editor, and the card drag/resize gesture.
//!
//! Reads degrade to empty state plus a toast. Writes keep the editor open and
//! toast the failure. Every successful write refetches the team list; the
//! board never patches its rows locally.

use std::collections::HashSet;

use chrono::NaiveDate;

use crewboard_core::allocation::{
    self, conflicting_allocations, AllocationForm, FieldErrors, Period,
};
use crewboard_core::error::CoreError;
use crewboard_core::filter::{
    normalize_search, Paged, Pagination, ResourceQuery, SuggestionQuery, TeamFilter, FIRST_PAGE,
};
use crewboard_core::layout::{AllocationChanged, Gesture, GridLayout, PointerEvent};
use crewboard_core::swimlane::SwimlaneSetting;
use crewboard_core::team::{Page, Resource, Team, TeamRequirement, TeamSuggestion};
use crewboard_core::types::RecordId;

use crate::context::AppContext;
use crate::error::{ConsoleError, ConsoleResult};
use crate::preferences::SavedFilter;
use crate::search::SearchController;
use crate::view::{build_view, SwimlaneView};

// ---------------------------------------------------------------------------
// Allocation editor
// ---------------------------------------------------------------------------

/// The open allocation editor: its form, inline errors and candidate lists.
#[derive(Debug, Clone)]
pub struct AllocationEditor {
    pub form: AllocationForm,
    pub errors: FieldErrors,
    /// Resources available in the form's window.
    pub candidates: Vec<Resource>,
    pub suggestions: Vec<TeamSuggestion>,
}

impl AllocationEditor {
    fn new(form: AllocationForm) -> Self {
        Self {
            form,
            errors: FieldErrors::new(),
            candidates: Vec::new(),
            suggestions: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// TeamBoard
// ---------------------------------------------------------------------------

pub struct TeamBoard {
    ctx: AppContext,
    setting: SwimlaneSetting,
    filter: TeamFilter,
    teams: Vec<Team>,
    total_items: u64,
    /// Resources in the board window, used for conflict flags.
    resources: Vec<Resource>,
    viewport_width: f64,
    grid: GridLayout,
    gesture: Gesture,
    editor: Option<AllocationEditor>,
    name_search: SearchController<Page<Team>>,
    /// Search generation whose rows are shown.
    applied_search: u64,
}

impl TeamBoard {
    /// Board over `filter`'s window, first page at the configured size.
    /// Nothing is fetched until [`refresh`](Self::refresh).
    pub fn new(ctx: AppContext, setting: SwimlaneSetting, mut filter: TeamFilter) -> Self {
        filter.set_pagination(Pagination::new(FIRST_PAGE, ctx.config.page_size));
        let viewport_width = ctx.config.viewport_width;
        let grid = GridLayout::new(
            setting.date_range(filter.start_date, filter.end_date),
            viewport_width,
        );
        let name_search = SearchController::list_name(&ctx, filter.clone());
        Self {
            ctx,
            setting,
            filter,
            teams: Vec::new(),
            total_items: 0,
            resources: Vec::new(),
            viewport_width,
            grid,
            gesture: Gesture::Idle,
            editor: None,
            name_search,
            applied_search: 0,
        }
    }

    pub fn filter(&self) -> &TeamFilter {
        &self.filter
    }

    pub fn setting(&self) -> &SwimlaneSetting {
        &self.setting
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn total_items(&self) -> u64 {
        self.total_items
    }

    pub fn total_pages(&self) -> u32 {
        self.filter.pagination().total_pages(self.total_items)
    }

    pub fn grid(&self) -> &GridLayout {
        &self.grid
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn editor(&self) -> Option<&AllocationEditor> {
        self.editor.as_ref()
    }

    pub fn editor_mut(&mut self) -> Option<&mut AllocationEditor> {
        self.editor.as_mut()
    }

    // -- reads ----------------------------------------------------------------

    /// One page of teams for `filter`.
    pub async fn list_teams(&self, filter: &TeamFilter) -> ConsoleResult<Page<Team>> {
        let page = self
            .ctx
            .loading
            .track(self.ctx.backend.list_teams(filter))
            .await?;
        Ok(page)
    }

    /// Refetch the current page of teams and the window's resources.
    ///
    /// A failed team fetch shows an empty board with a toast.
    pub async fn refresh(&mut self) -> bool {
        let result = self.list_teams(&self.filter).await;
        let loaded = match result {
            Ok(page) => {
                tracing::info!(
                    team_count = page.results.len(),
                    total = page.total_items,
                    page = self.filter.page_number,
                    "Teams loaded"
                );
                self.total_items = page.total_items;
                self.teams = page.results;
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Team fetch failed");
                self.teams.clear();
                self.total_items = 0;
                self.ctx.toasts.error(e.user_message());
                false
            }
        };
        self.refresh_resources().await;
        loaded
    }

    /// Reload the resources used for conflict flags. Failure clears them.
    async fn refresh_resources(&mut self) {
        if self.teams.is_empty() {
            self.resources.clear();
            return;
        }
        let query = ResourceQuery {
            region_ids: self.filter.region_ids.clone(),
            start_date: self.filter.start_date,
            start_time: self.setting.day_start,
            end_date: self.filter.end_date,
            end_time: self.setting.day_end,
        };
        let result = self
            .ctx
            .loading
            .track(self.ctx.backend.list_resources(&query))
            .await;
        match result {
            Ok(resources) => self.resources = resources,
            Err(e) => {
                tracing::warn!(error = %e, "Resource fetch failed, conflicts not shown");
                self.resources.clear();
            }
        }
    }

    /// Replace the filter and refetch from page 1.
    pub async fn set_filter(&mut self, mut filter: TeamFilter) -> bool {
        let size = self.filter.pagination().page_size;
        filter.set_pagination(Pagination::new(FIRST_PAGE, size));
        self.filter = filter;
        self.name_search = SearchController::list_name(&self.ctx, self.filter.clone());
        self.applied_search = 0;
        self.rebuild_grid();
        self.refresh().await
    }

    /// Team name box keystroke. `GET /team` goes out once typing pauses;
    /// earlier keystrokes and their requests are cancelled.
    pub fn search_name(&mut self, text: &str) {
        self.name_search.query(text);
    }

    /// Wait for the pending team name search and show its rows. `false` when
    /// there was no new search to apply. A failed search leaves an empty
    /// board; the toast was already published.
    pub async fn settle_search(&mut self) -> bool {
        let state = self.name_search.settled().await;
        if state.generation == self.applied_search {
            return false;
        }
        self.applied_search = state.generation;
        let size = self.filter.pagination().page_size;
        self.filter.name = normalize_search(&state.query);
        self.filter.set_pagination(Pagination::new(FIRST_PAGE, size));
        tracing::info!(
            query = %state.query,
            team_count = state.results.results.len(),
            total = state.results.total_items,
            "Team name search applied"
        );
        self.total_items = state.results.total_items;
        self.teams = state.results.results;
        self.refresh_resources().await;
        true
    }

    /// Re-apply a saved filter set and refetch from page 1.
    pub async fn apply_saved_filter(&mut self, saved: &SavedFilter) -> bool {
        tracing::debug!(name = %saved.name, "Applying saved filter");
        let filter = saved.apply(self.filter.clone());
        self.set_filter(filter).await
    }

    /// Show a different date window.
    pub async fn set_window(&mut self, start: NaiveDate, end: NaiveDate) -> bool {
        let mut filter = self.filter.clone();
        filter.start_date = start;
        filter.end_date = end;
        self.set_filter(filter).await
    }

    pub async fn go_to_page(&mut self, page_number: u32) -> bool {
        let pagination = self.filter.pagination().with_page(page_number);
        self.filter.set_pagination(pagination);
        self.refresh().await
    }

    /// Apply a new display setting. Invalid settings are rejected unchanged.
    pub fn set_setting(&mut self, setting: SwimlaneSetting) -> ConsoleResult<()> {
        setting.validate()?;
        self.setting = setting;
        self.rebuild_grid();
        Ok(())
    }

    /// Recompute column widths after a viewport resize.
    pub fn resize(&mut self, available_width: f64) {
        self.viewport_width = available_width;
        self.grid.resize(available_width);
    }

    fn rebuild_grid(&mut self) {
        let dates = self
            .setting
            .date_range(self.filter.start_date, self.filter.end_date);
        self.gesture = Gesture::Idle;
        self.grid = GridLayout::new(dates, self.viewport_width);
    }

    // -- editor -----------------------------------------------------------------

    fn requirement(&self, team_id: &str, requirement_id: &str) -> Option<&TeamRequirement> {
        self.teams
            .iter()
            .find(|t| t.id.as_deref() == Some(team_id))?
            .requirement(requirement_id)
    }

    /// Open the allocation editor for a new allocation on a requirement,
    /// replacing any open editor.
    pub fn select_requirement_slot(
        &mut self,
        team_id: &str,
        requirement_id: &str,
        period: Period,
    ) -> ConsoleResult<()> {
        if self.requirement(team_id, requirement_id).is_none() {
            return Err(CoreError::NotFound {
                entity: "requirement",
                id: requirement_id.to_string(),
            }
            .into());
        }
        let form = AllocationForm::new(
            team_id,
            requirement_id,
            &period,
            self.setting.day_start,
            self.setting.day_end,
        );
        tracing::debug!(team_id, requirement_id, start = %period.start, end = %period.end, "Slot selected");
        self.editor = Some(AllocationEditor::new(form));
        Ok(())
    }

    /// Turn a click-drag across empty lane space (pixel offsets from the first
    /// column) into a slot selection.
    pub fn select_grid_range(
        &mut self,
        team_id: &str,
        requirement_id: &str,
        from_x: f64,
        to_x: f64,
    ) -> ConsoleResult<()> {
        let (Some(from), Some(to)) = (self.grid.date_at(from_x), self.grid.date_at(to_x)) else {
            return Err(CoreError::Validation("Selection is outside the visible dates".into()).into());
        };
        self.select_requirement_slot(team_id, requirement_id, Period::between(from, to))
    }

    /// Open the editor on an existing allocation.
    pub fn edit_allocation(&mut self, allocation_id: &str) -> ConsoleResult<()> {
        let (team_id, requirement_id, form) = self
            .locate(allocation_id)
            .map(|(team_id, requirement_id, allocation)| {
                let form = AllocationForm::from_allocation(team_id.clone(), requirement_id.clone(), allocation);
                (team_id, requirement_id, form)
            })
            .ok_or_else(|| CoreError::NotFound {
                entity: "allocation",
                id: allocation_id.to_string(),
            })?;
        tracing::debug!(%team_id, %requirement_id, allocation_id, "Allocation opened");
        self.editor = Some(AllocationEditor::new(form));
        Ok(())
    }

    pub fn close_editor(&mut self) {
        self.editor = None;
    }

    /// Fetch available resources and backend suggestions for the editor's
    /// window. Either list degrades to empty with a toast on failure.
    pub async fn load_candidates(&mut self) -> ConsoleResult<()> {
        let form = self
            .editor
            .as_ref()
            .map(|e| e.form.clone())
            .ok_or(ConsoleError::NoSelection)?;

        let resource_query = ResourceQuery {
            region_ids: self.filter.region_ids.clone(),
            start_date: form.start_date,
            start_time: form.start_time,
            end_date: form.end_date,
            end_time: form.end_time,
        };
        let suggestion_query = SuggestionQuery {
            team_id: form.team_id.clone(),
            requirement_id: form.requirement_id.clone(),
            start_date: form.start_date,
            end_date: form.end_date,
        };

        let backend = self.ctx.backend.as_ref();
        let (resources, suggestions) = self
            .ctx
            .loading
            .track(async {
                futures::join!(
                    backend.list_resources(&resource_query),
                    backend.team_suggestions(&suggestion_query)
                )
            })
            .await;

        let candidates = resources.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Candidate resources unavailable");
            self.ctx.toasts.error(ConsoleError::from(e).user_message());
            Vec::new()
        });
        let suggestions = suggestions.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Suggestions unavailable");
            self.ctx.toasts.error(ConsoleError::from(e).user_message());
            Vec::new()
        });

        if let Some(editor) = self.editor.as_mut() {
            editor.candidates = candidates;
            editor.suggestions = suggestions;
        }
        Ok(())
    }

    fn editor_requirement(&self) -> Option<(&AllocationEditor, &TeamRequirement)> {
        let editor = self.editor.as_ref()?;
        let requirement = self.requirement(&editor.form.team_id, &editor.form.requirement_id)?;
        Some((editor, requirement))
    }

    /// Candidates holding every required tag, preferred resource excluded.
    pub fn matching_resources(&self) -> Vec<&Resource> {
        match self.editor_requirement() {
            Some((editor, requirement)) => {
                allocation::matching_resources(requirement, &editor.candidates)
            }
            None => Vec::new(),
        }
    }

    pub fn preferred_resource(&self) -> Option<&Resource> {
        let (editor, requirement) = self.editor_requirement()?;
        allocation::preferred_resource(requirement, &editor.candidates)
    }

    /// Validate and persist the editor's allocation.
    ///
    /// Invalid fields are stored on the editor and nothing is sent. On
    /// success the editor closes and the board refetches; on failure the
    /// editor stays open.
    pub async fn submit_allocation(&mut self) -> bool {
        let Some(editor) = self.editor.as_mut() else {
            self.ctx.toasts.warning(ConsoleError::NoSelection.user_message());
            return false;
        };

        let request = match editor.form.clone().into_request() {
            Ok(request) => request,
            Err(errors) => {
                tracing::debug!(fields = ?errors.keys().collect::<Vec<_>>(), "Allocation form invalid");
                editor.errors = errors;
                return false;
            }
        };
        editor.errors.clear();

        let result = self
            .ctx
            .loading
            .track(self.ctx.backend.allocate(&request))
            .await;
        match result {
            Ok(ack) => {
                tracing::info!(
                    team_id = %request.team_id,
                    resource_id = %request.resource_id,
                    allocation_id = ?ack.id,
                    update = request.id.is_some(),
                    "Allocation saved"
                );
                self.ctx.toasts.success("Allocation saved");
                self.editor = None;
                self.refresh().await;
                true
            }
            Err(e) => {
                tracing::error!(team_id = %request.team_id, error = %e, "Allocation save failed");
                self.ctx.toasts.error(ConsoleError::from(e).user_message());
                false
            }
        }
    }

    // -- gestures -------------------------------------------------------------

    /// Feed one pointer event to the card gesture state machine.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Option<AllocationChanged> {
        let gesture = std::mem::take(&mut self.gesture);
        let (next, change) = gesture.handle(event, &self.grid);
        self.gesture = next;
        change
    }

    /// Preview range of the card being dragged or resized.
    pub fn gesture_preview(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.gesture.preview(&self.grid)
    }

    /// Persist a completed drag or resize, then refetch so the board shows
    /// the stored position either way.
    pub async fn apply_change(&mut self, change: AllocationChanged) -> bool {
        let Some((team_id, requirement_id, existing)) = self.locate(&change.allocation_id) else {
            let err = ConsoleError::from(CoreError::NotFound {
                entity: "allocation",
                id: change.allocation_id.clone(),
            });
            self.ctx.toasts.error(err.user_message());
            return false;
        };
        let mut form = AllocationForm::from_allocation(team_id, requirement_id, existing);
        form.start_date = change.start;
        form.end_date = change.end;

        let request = match form.into_request() {
            Ok(request) => request,
            Err(errors) => {
                let err = ConsoleError::Invalid(errors);
                tracing::warn!(allocation_id = %change.allocation_id, error = %err, "Moved allocation invalid");
                self.ctx.toasts.error(err.user_message());
                return false;
            }
        };

        let result = self
            .ctx
            .loading
            .track(self.ctx.backend.allocate(&request))
            .await;
        let saved = match result {
            Ok(_) => {
                tracing::info!(
                    allocation_id = %change.allocation_id,
                    start = %change.start,
                    end = %change.end,
                    "Allocation moved"
                );
                true
            }
            Err(e) => {
                tracing::error!(allocation_id = %change.allocation_id, error = %e, "Allocation move failed");
                self.ctx.toasts.error(ConsoleError::from(e).user_message());
                false
            }
        };
        self.refresh().await;
        saved
    }

    /// Team id, requirement id and allocation for an allocation id.
    fn locate(
        &self,
        allocation_id: &str,
    ) -> Option<(RecordId, RecordId, &crewboard_core::team::TeamAllocation)> {
        self.teams.iter().find_map(|team| {
            team.requirements.iter().find_map(|req| {
                req.allocations
                    .iter()
                    .find(|a| a.id.as_deref() == Some(allocation_id))
                    .and_then(|a| Some((team.id.clone()?, req.id.clone()?, a)))
            })
        })
    }

    // -- team writes ------------------------------------------------------------

    /// Create or update a team, then refetch.
    pub async fn save_team(&mut self, team: &Team) -> bool {
        if team.name.trim().is_empty() {
            let err = ConsoleError::from(CoreError::Validation("Team name is required".into()));
            self.ctx.toasts.warning(err.user_message());
            return false;
        }
        let result = self
            .ctx
            .loading
            .track(self.ctx.backend.save_team(team))
            .await;
        match result {
            Ok(ack) => {
                tracing::info!(team_id = ?ack.id.as_ref().or(team.id.as_ref()), name = %team.name, "Team saved");
                self.ctx.toasts.success("Team saved");
                self.refresh().await;
                true
            }
            Err(e) => {
                tracing::error!(name = %team.name, error = %e, "Team save failed");
                self.ctx.toasts.error(ConsoleError::from(e).user_message());
                false
            }
        }
    }

    /// Soft-delete a team, then refetch.
    pub async fn deactivate_team(&mut self, team_id: &str) -> bool {
        let result = self
            .ctx
            .loading
            .track(self.ctx.backend.deactivate_team(team_id))
            .await;
        match result {
            Ok(_) => {
                tracing::info!(team_id, "Team deactivated");
                self.ctx.toasts.success("Team deactivated");
                if self
                    .editor
                    .as_ref()
                    .is_some_and(|e| e.form.team_id == team_id)
                {
                    self.editor = None;
                }
                self.refresh().await;
                true
            }
            Err(e) => {
                tracing::error!(team_id, error = %e, "Team deactivation failed");
                self.ctx.toasts.error(ConsoleError::from(e).user_message());
                false
            }
        }
    }

    // -- view -----------------------------------------------------------------

    /// Ids of allocations whose resource is unavailable during them.
    pub fn conflicts(&self) -> HashSet<RecordId> {
        conflicting_allocations(&self.teams, &self.resources)
    }

    /// Swimlane view model laid out for `available_width` pixels.
    pub fn view(&self, available_width: f64) -> SwimlaneView {
        let grid = GridLayout::new(self.grid.dates().to_vec(), available_width);
        build_view(&self.teams, &grid, &self.setting, &self.conflicts())
    }
}
