// UI module root: split implementation into focused submodules under `ui/`

pub mod model;
pub mod options;
pub mod render;
pub mod run;
pub mod update;

// Re-export commonly used symbols so call sites can stay short (e.g. `crate::ui::initial_model`).
pub use model::{
    Effect, Fetch, LoadState, Model, PickerMode, PickerProps, StaleSelectionPolicy, initial_model,
};
pub use options::{PickerOption, SEARCH_OPTION_KEY, derive_options};
pub use render::{render_full, render_main_content, render_modeline_padded};
pub use run::{list, run};
pub use update::handle_update;

use crate::site::Site;
use crate::source::{SiteContext, SourceError};

// Messages used by the update logic
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Msg {
    WindowSize { width: usize, height: usize },
    KeyBackspace,
    KeyEnter,
    KeySpace,
    Rune(char),
    KeyUp,
    KeyDown,
    SetContext(Option<SiteContext>),
    SetMode(PickerMode),
    SetLimitToCurrentSiteCollection(bool),
    SetSort { order_by: Option<String>, is_desc: bool },
    SetInitialSites(Option<Vec<Site>>),
    SitesLoaded { generation: u64, result: Result<Vec<Site>, SourceError> },
    ToggleSite(String),
}
