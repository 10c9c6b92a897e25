//! Page-number-driven list panels for projects, jobs and teams.

use async_trait::async_trait;

use crewboard_client::api::ApiError;
use crewboard_client::backend::SchedulingBackend;
use crewboard_core::filter::{
    normalize_search, JobFilter, Paged, Pagination, ProjectFilter, TeamFilter, FIRST_PAGE,
};
use crewboard_core::team::{Job, Page, Project, Team};

use crate::context::AppContext;
use crate::error::ConsoleError;
use crate::search::SearchController;

/// A filter that knows which endpoint lists its rows.
#[async_trait]
pub trait ListFilter: Paged + Clone + Send + Sync + 'static {
    type Item: Clone + Send + Sync + 'static;

    /// Entity name used in logs.
    const ENTITY: &'static str;

    /// Replace the name text filter.
    fn set_name(&mut self, name: Option<String>);

    async fn fetch(&self, backend: &dyn SchedulingBackend) -> Result<Page<Self::Item>, ApiError>;
}

#[async_trait]
impl ListFilter for ProjectFilter {
    type Item = Project;
    const ENTITY: &'static str = "project";

    fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    async fn fetch(&self, backend: &dyn SchedulingBackend) -> Result<Page<Project>, ApiError> {
        backend.list_projects(self).await
    }
}

#[async_trait]
impl ListFilter for JobFilter {
    type Item = Job;
    const ENTITY: &'static str = "job";

    fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    async fn fetch(&self, backend: &dyn SchedulingBackend) -> Result<Page<Job>, ApiError> {
        backend.list_jobs(self).await
    }
}

#[async_trait]
impl ListFilter for TeamFilter {
    type Item = Team;
    const ENTITY: &'static str = "team";

    fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    async fn fetch(&self, backend: &dyn SchedulingBackend) -> Result<Page<Team>, ApiError> {
        backend.list_teams(self).await
    }
}

/// One list panel: the current filter, the page it produced and the
/// debounced name box.
pub struct PagedList<F: ListFilter> {
    ctx: AppContext,
    filter: F,
    page: Page<F::Item>,
    name_search: SearchController<Page<F::Item>>,
    /// Search generation whose page is shown.
    applied_search: u64,
}

pub type ProjectList = PagedList<ProjectFilter>;
pub type JobList = PagedList<JobFilter>;
pub type TeamList = PagedList<TeamFilter>;

impl<F: ListFilter> PagedList<F> {
    /// Starts on page 1 with the configured page size. Nothing is fetched
    /// until [`load`](Self::load).
    pub fn new(ctx: AppContext, mut filter: F) -> Self {
        filter.set_pagination(Pagination::new(FIRST_PAGE, ctx.config.page_size));
        let name_search = SearchController::list_name(&ctx, filter.clone());
        Self {
            ctx,
            filter,
            page: Page::default(),
            name_search,
            applied_search: 0,
        }
    }

    pub fn filter(&self) -> &F {
        &self.filter
    }

    pub fn items(&self) -> &[F::Item] {
        &self.page.results
    }

    pub fn total_items(&self) -> u64 {
        self.page.total_items
    }

    pub fn page_number(&self) -> u32 {
        self.filter.pagination().page_number
    }

    pub fn total_pages(&self) -> u32 {
        self.filter.pagination().total_pages(self.page.total_items)
    }

    /// Fetch the current page. A failure leaves an empty page and a toast.
    pub async fn load(&mut self) -> bool {
        let result = self
            .ctx
            .loading
            .track(self.filter.fetch(self.ctx.backend.as_ref()))
            .await;
        match result {
            Ok(page) => {
                tracing::debug!(
                    entity = F::ENTITY,
                    page = self.page_number(),
                    rows = page.results.len(),
                    total = page.total_items,
                    "List page loaded"
                );
                self.page = page;
                true
            }
            Err(e) => {
                tracing::warn!(entity = F::ENTITY, error = %e, "List fetch failed");
                self.page = Page::default();
                self.ctx.toasts.error(ConsoleError::from(e).user_message());
                false
            }
        }
    }

    /// Replace the filter and refetch from page 1, keeping the page size.
    pub async fn set_filter(&mut self, mut filter: F) -> bool {
        let size = self.filter.pagination().page_size;
        filter.set_pagination(Pagination::new(FIRST_PAGE, size));
        self.filter = filter;
        self.rebind_search();
        self.load().await
    }

    /// Edit the filter in place and refetch from page 1.
    pub async fn update_filter(&mut self, edit: impl FnOnce(&mut F)) -> bool {
        let mut filter = self.filter.clone();
        edit(&mut filter);
        self.set_filter(filter).await
    }

    /// Jump to a page (clamped to at least 1) and refetch.
    pub async fn go_to_page(&mut self, page_number: u32) -> bool {
        let pagination = self.filter.pagination().with_page(page_number);
        self.filter.set_pagination(pagination);
        self.load().await
    }

    /// Advance one page; `false` without a request on the last page.
    pub async fn next_page(&mut self) -> bool {
        let current = self.page_number();
        if current >= self.total_pages() {
            return false;
        }
        self.go_to_page(current + 1).await
    }

    /// Go back one page; `false` without a request on the first page.
    pub async fn previous_page(&mut self) -> bool {
        let current = self.page_number();
        if current <= FIRST_PAGE {
            return false;
        }
        self.go_to_page(current - 1).await
    }

    /// Change rows per page and refetch from page 1.
    pub async fn set_page_size(&mut self, page_size: u32) -> bool {
        self.filter
            .set_pagination(Pagination::new(FIRST_PAGE, page_size));
        self.rebind_search();
        self.load().await
    }

    /// Name box keystroke. The request goes out once typing pauses for the
    /// configured debounce; earlier keystrokes are cancelled.
    pub fn search_name(&mut self, text: &str) {
        self.name_search.query(text);
    }

    /// Wait for the pending name search and show its page (page 1 of the
    /// current filter with the typed name). `false` when there was no new
    /// search to apply. A failed search shows an empty page; the toast was
    /// already published.
    pub async fn settle_search(&mut self) -> bool {
        let state = self.name_search.settled().await;
        if state.generation == self.applied_search {
            return false;
        }
        self.applied_search = state.generation;
        let size = self.filter.pagination().page_size;
        self.filter.set_name(normalize_search(&state.query));
        self.filter.set_pagination(Pagination::new(FIRST_PAGE, size));
        tracing::debug!(
            entity = F::ENTITY,
            query = %state.query,
            total = state.results.total_items,
            "Name search applied"
        );
        self.page = state.results;
        true
    }

    /// Bind the name box to the current filter, dropping any pending search.
    fn rebind_search(&mut self) {
        self.name_search = SearchController::list_name(&self.ctx, self.filter.clone());
        self.applied_search = 0;
    }
}
