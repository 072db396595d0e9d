use crate::site::{Site, SortSpec};
use crate::source::{FetchRequest, SiteContext};

// small constants reused by rendering code
pub const LABEL_LINES: usize = 1;
pub const MODELINE_LINES: usize = 1;
pub const RESERVED_LINES: usize = LABEL_LINES + MODELINE_LINES;
pub const DEFAULT_WIDTH: usize = 80;

/// Which retrieval the loader issues.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PickerMode {
    /// Site collections (any value other than `web` / `hub`).
    #[default]
    Site,
    /// Sub-webs only.
    Web,
    /// Sites associated with the context's hub.
    Hub,
}

impl From<&str> for PickerMode {
    fn from(s: &str) -> Self {
        match s {
            "web" => PickerMode::Web,
            "hub" => PickerMode::Hub,
            _ => PickerMode::Site,
        }
    }
}

/// What to do with selected sites that disappear from a freshly loaded catalog.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StaleSelectionPolicy {
    #[default]
    Retain,
    Prune,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LoadState {
    /// No context, nothing requested.
    #[default]
    Idle,
    Loading,
    Ready,
    Failed(String),
}

/// Caller-supplied configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PickerProps {
    pub label: String,
    pub disabled: bool,
    pub context: Option<SiteContext>,
    pub initial_sites: Option<Vec<Site>>,
    pub multi_select: bool,
    pub mode: PickerMode,
    pub limit_to_current_site_collection: bool,
    pub allow_search: bool,
    pub order_by: Option<String>,
    pub is_desc: bool,
    pub stale_selection: StaleSelectionPolicy,
}

impl Default for PickerProps {
    fn default() -> Self {
        PickerProps {
            label: String::new(),
            disabled: false,
            context: None,
            initial_sites: None,
            multi_select: true,
            mode: PickerMode::default(),
            limit_to_current_site_collection: false,
            allow_search: false,
            order_by: None,
            is_desc: false,
            stale_selection: StaleSelectionPolicy::default(),
        }
    }
}

/// A retrieval tagged with the generation it was issued under.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fetch {
    pub generation: u64,
    pub request: FetchRequest,
}

/// Side effects requested by `handle_update`; the host carries them out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    Fetch(Fetch),
    SelectionChanged(Vec<Site>),
}

#[derive(Clone, Debug, Default)]
pub struct Model {
    // inputs
    pub label: String,
    pub disabled: bool,
    pub context: Option<SiteContext>,
    pub multi_select: bool,
    pub mode: PickerMode,
    pub limit_to_current_site_collection: bool,
    pub allow_search: bool,
    pub sort: SortSpec,
    pub stale_selection: StaleSelectionPolicy,

    // loader
    pub load_state: LoadState,
    pub generation: u64,
    pub fetches_issued: usize,

    // catalog and derived sets
    pub catalog: Option<Vec<Site>>,
    pub display: Vec<Site>,
    pub selection: Vec<Site>,
    pub selection_initialized: bool,
    pub search_query: String,

    // interactive state
    pub cursor: usize,
    pub page: usize,
    pub per_page: usize,
    pub screen_width: usize,
    pub confirmed: bool,
}

/// Build a model from the caller's props. Applies the inputs the way a freshly
/// mounted picker would: seed the selection, then start loading. The returned
/// effect is the initial fetch, if a context is present.
pub fn initial_model(props: PickerProps) -> (Model, Option<Effect>) {
    let mut m = Model {
        label: props.label,
        disabled: props.disabled,
        multi_select: props.multi_select,
        mode: props.mode,
        limit_to_current_site_collection: props.limit_to_current_site_collection,
        allow_search: props.allow_search,
        sort: SortSpec::new(props.order_by.as_deref(), props.is_desc),
        stale_selection: props.stale_selection,
        ..Model::default()
    };
    if let Some(seed) = props.initial_sites {
        crate::ui::update::handle_update(&mut m, crate::ui::Msg::SetInitialSites(Some(seed)));
    }
    m.context = props.context;
    let effect = crate::ui::update::start_load(&mut m);
    (m, effect)
}

impl Model {
    // wrapper update that delegates to the update module
    pub fn update(&mut self, msg: crate::ui::Msg) -> Option<Effect> {
        crate::ui::update::handle_update(self, msg)
    }

    pub fn is_loading(&self) -> bool {
        self.load_state == LoadState::Loading
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selection.iter().any(|s| s.id == id)
    }

    pub fn selected_ids(&self) -> impl Iterator<Item = &str> {
        self.selection.iter().map(|s| s.id.as_str())
    }

    pub fn options(&self) -> Vec<crate::ui::PickerOption> {
        crate::ui::options::derive_options(&self.display, &self.selection, self.allow_search)
    }

    pub fn status(&self) -> String {
        match &self.load_state {
            LoadState::Idle => "idle".to_string(),
            LoadState::Loading => "loading".to_string(),
            LoadState::Ready => format!("{} sites, {} selected", self.display.len(), self.selection.len()),
            LoadState::Failed(_) => "failed".to_string(),
        }
    }

    // Render helper wrappers that forward to the render module to keep this file focused on state.
    pub fn render_main_content(&self) -> String {
        crate::ui::render::render_main_content(self)
    }
    pub fn render_full(&self) -> String {
        crate::ui::render::render_full(self)
    }
}
