use crate::site::Site;
use std::collections::HashSet;

pub const SEARCH_OPTION_KEY: &str = "search";

/// One entry of the picker's option list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PickerOption {
    /// Leading search affordance; carries no site and never counts as selected.
    Search,
    Site {
        key: String,
        text: String,
        site: Site,
        selected: bool,
    },
}

impl PickerOption {
    pub fn key(&self) -> &str {
        match self {
            PickerOption::Search => SEARCH_OPTION_KEY,
            PickerOption::Site { key, .. } => key,
        }
    }

    pub fn site(&self) -> Option<&Site> {
        match self {
            PickerOption::Search => None,
            PickerOption::Site { site, .. } => Some(site),
        }
    }

    pub fn is_selected(&self) -> bool {
        matches!(self, PickerOption::Site { selected: true, .. })
    }
}

/// Project the displayed sites into options, flagging the ones whose id is in
/// `selection`. Pure; callers recompute whenever they need a fresh list.
pub fn derive_options(display: &[Site], selection: &[Site], search_enabled: bool) -> Vec<PickerOption> {
    let selected: HashSet<&str> = selection.iter().map(|s| s.id.as_str()).collect();
    let mut out = Vec::with_capacity(display.len() + usize::from(search_enabled));
    if search_enabled {
        out.push(PickerOption::Search);
    }
    out.extend(display.iter().map(|s| PickerOption::Site {
        key: s.id.clone(),
        text: s.title.clone(),
        site: s.clone(),
        selected: selected.contains(s.id.as_str()),
    }));
    out
}
