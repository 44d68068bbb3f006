//! The state behind one viewer window.
//!
//! A [`Session`] owns the loaded dataset and everything derived from it.
//! Every handler mutates the session synchronously and returns the set of
//! display regions that now need redrawing.

use std::path::{Path, PathBuf};

use bitflags::bitflags;
use serde::Serialize;

use crate::{
    Dataset, Download, Insights, ParseOutcome, Result, Summary, Upload, View, ViewerConfig,
    export::prepare_download,
    filter::{FilterCriteria, download_label, filter_view, profile_options, profile_view},
    page::Pager,
    parse::parse_dataset,
    render::{Grid, Renderer},
    sort::base_order,
};

bitflags! {
    /// Display regions invalidated by a state change.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Invalidation: u8 {
        const SUMMARY = 1;
        const TABLE = 1 << 1;
        const PAGINATION = 1 << 2;
        const DOWNLOAD_LABEL = 1 << 3;
        const PROFILES = 1 << 4;
        const STATUS = 1 << 5;
    }
}

impl Invalidation {
    /// Everything that follows from a new filtered view.
    pub const VIEW: Self = Self::SUMMARY.union(Self::TABLE).union(Self::PAGINATION);
}

/// The single status line. Stored as plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "lowercase")]
pub enum Status {
    Error(String),
    Success(String),
}

impl Status {
    pub fn message(&self) -> &str {
        match self {
            Status::Error(msg) | Status::Success(msg) => msg,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Status::Error(_))
    }
}

/// Identifies one upload. Only the ticket of the latest upload is accepted
/// by [`Session::finish_upload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadTicket {
    generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    SelectProfile(String),
    Search(String),
    NextPage,
    PrevPage,
    GoToPage(usize),
}

/// Everything a front end needs to draw the current state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub status: Option<Status>,
    pub loading: bool,
    pub summary: Summary,
    pub date_range: String,
    pub profiles: Vec<String>,
    pub profile: String,
    pub query: String,
    pub page: usize,
    pub page_count: usize,
    pub page_label: String,
    pub has_prev: bool,
    pub has_next: bool,
    pub download_label: String,
    pub grid: Grid,
}

#[derive(Debug)]
pub struct Session {
    config: ViewerConfig,
    generation: u64,
    loading: bool,
    status: Option<Status>,

    dataset: Dataset,
    base: View,
    profile_column: Option<usize>,
    timestamp_column: Option<usize>,
    profiles: Vec<String>,

    criteria: FilterCriteria,
    view: View,
    pager: Pager,
    summary: Summary,

    renderer: Renderer,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(ViewerConfig::default())
    }
}

impl Session {
    pub fn new(config: ViewerConfig) -> Self {
        let pager = Pager::new(0, config.page_size);
        Self {
            config,
            generation: 0,
            loading: false,
            status: None,
            dataset: Dataset::default(),
            base: View::default(),
            profile_column: None,
            timestamp_column: None,
            profiles: Vec::new(),
            criteria: FilterCriteria::default(),
            view: View::default(),
            pager,
            summary: Summary::default(),
            renderer: Renderer::new(),
        }
    }

    /// Clears all state for a new upload and marks the session as loading.
    pub fn begin_upload(&mut self) -> UploadTicket {
        self.generation += 1;
        self.clear();
        self.loading = true;
        tracing::debug!("upload {} started", self.generation);
        UploadTicket {
            generation: self.generation,
        }
    }

    /// Completes the upload identified by `ticket`. A ticket from a superseded
    /// upload is ignored and nothing is invalidated.
    pub fn finish_upload(
        &mut self,
        ticket: UploadTicket,
        result: Result<ParseOutcome>,
    ) -> Invalidation {
        if ticket.generation != self.generation {
            tracing::warn!(
                "discarding stale upload {} (current is {})",
                ticket.generation,
                self.generation
            );
            return Invalidation::empty();
        }
        self.loading = false;

        match result {
            Ok(outcome) => {
                let message = outcome.status_message();
                self.install(outcome.dataset);
                tracing::info!("{message}");
                self.status = Some(Status::Success(message));
            },
            Err(e) => {
                tracing::warn!("upload {} failed: {e}", ticket.generation);
                self.status = Some(Status::Error(e.to_string()));
            },
        }
        Invalidation::all()
    }

    /// Runs a whole upload: preflight checks, extraction, parsing.
    ///
    /// A preflight failure only replaces the status; the session is neither
    /// reset nor marked as loading.
    pub fn load(&mut self, upload: &Upload) -> Invalidation {
        if let Err(e) = upload.preflight(&self.config) {
            tracing::warn!("upload rejected: {e}");
            self.status = Some(Status::Error(e.to_string()));
            return Invalidation::STATUS;
        }
        let ticket = self.begin_upload();
        let result = upload
            .extract(&self.config)
            .and_then(|text| parse_dataset(&text));
        self.finish_upload(ticket, result)
    }

    pub fn select_profile(&mut self, profile: &str) -> Invalidation {
        if self.criteria.profile == profile {
            return Invalidation::empty();
        }
        profile.clone_into(&mut self.criteria.profile);
        self.refilter();
        Invalidation::VIEW | Invalidation::DOWNLOAD_LABEL
    }

    pub fn set_query(&mut self, query: &str) -> Invalidation {
        if self.criteria.query == query {
            return Invalidation::empty();
        }
        query.clone_into(&mut self.criteria.query);
        self.refilter();
        Invalidation::VIEW
    }

    pub fn next_page(&mut self) -> Invalidation {
        page_changed(self.pager.next())
    }

    pub fn prev_page(&mut self) -> Invalidation {
        page_changed(self.pager.prev())
    }

    pub fn go_to_page(&mut self, page: usize) -> Invalidation {
        page_changed(self.pager.go_to(page))
    }

    pub fn handle(&mut self, event: Event) -> Invalidation {
        match event {
            Event::SelectProfile(profile) => self.select_profile(&profile),
            Event::Search(query) => self.set_query(&query),
            Event::NextPage => self.next_page(),
            Event::PrevPage => self.prev_page(),
            Event::GoToPage(page) => self.go_to_page(page),
        }
    }

    /// The full history, or the selected profile's records when a profile is
    /// selected. The search query never narrows a download. `None` when
    /// nothing is loaded. A failure is also recorded as the error status.
    pub fn download(&mut self) -> Result<Option<Download>> {
        let result = self.build_download();
        self.record_failure(result)
    }

    /// [`Session::download`] written into `dir`; returns the saved path.
    pub fn save_download(&mut self, dir: &Path) -> Result<Option<PathBuf>> {
        let result = self
            .build_download()
            .and_then(|download| download.map(|d| d.save_to(dir)).transpose());
        if let Ok(Some(path)) = &result {
            tracing::info!("saved {}", path.display());
        }
        self.record_failure(result)
    }

    fn build_download(&self) -> Result<Option<Download>> {
        if self.dataset.is_empty() {
            return Ok(None);
        }
        let view = profile_view(
            &self.dataset,
            &self.base,
            self.profile_column,
            &self.criteria.profile,
        );
        prepare_download(
            &self.dataset,
            &view,
            &self.config.export_stem,
            &self.criteria.profile,
        )
        .map(Some)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            status: self.status.clone(),
            loading: self.loading,
            summary: self.summary,
            date_range: self.summary.date_range_label(),
            profiles: self.profiles.clone(),
            profile: self.criteria.profile.clone(),
            query: self.criteria.query.clone(),
            page: self.pager.page(),
            page_count: self.pager.page_count(),
            page_label: self.pager.label(),
            has_prev: self.pager.has_prev(),
            has_next: self.pager.has_next(),
            download_label: download_label(&self.criteria.profile),
            grid: self.page_grid(),
        }
    }

    /// Standalone HTML for the current state.
    pub fn render_html(&mut self) -> String {
        let snapshot = self.snapshot();
        self.renderer.dashboard_html(self.generation, &snapshot)
    }

    /// Statistics over the current filtered view.
    pub fn insights(&self) -> Insights {
        Insights::compute(&self.dataset, &self.view, &self.config)
    }

    pub fn page_grid(&self) -> Grid {
        Grid::from_page(&self.dataset, self.view.slice(self.pager.range()))
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// The filtered view, in base order.
    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn profiles(&self) -> &[String] {
        &self.profiles
    }

    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    fn record_failure<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            tracing::warn!("download failed: {e}");
            self.status = Some(Status::Error(e.to_string()));
        }
        result
    }

    fn clear(&mut self) {
        self.status = None;
        self.dataset = Dataset::default();
        self.base = View::default();
        self.profile_column = None;
        self.timestamp_column = None;
        self.profiles.clear();
        self.criteria = FilterCriteria::default();
        self.view = View::default();
        self.pager.reset(0);
        self.summary = Summary::default();
        self.renderer.invalidate();
    }

    fn install(&mut self, dataset: Dataset) {
        self.profile_column = dataset.column(&self.config.profile_field);
        self.timestamp_column = dataset.column(&self.config.timestamp_field);
        self.base = base_order(&dataset, &self.config.timestamp_field);
        self.profiles = profile_options(&dataset, self.profile_column);
        self.dataset = dataset;
        self.refilter();
    }

    fn refilter(&mut self) {
        self.view = filter_view(&self.dataset, &self.base, self.profile_column, &self.criteria);
        self.pager.reset(self.view.len());
        self.summary = Summary::compute(&self.dataset, &self.view, self.timestamp_column);
    }
}

fn page_changed(changed: bool) -> Invalidation {
    if changed {
        Invalidation::TABLE | Invalidation::PAGINATION
    } else {
        Invalidation::empty()
    }
}
