use crate::site::{Site, SortSpec, order_sites};
use crate::source::{FetchRequest, SourceError};
use crate::ui::Msg;
use crate::ui::model::{Effect, Fetch, LoadState, Model, PickerMode, RESERVED_LINES, StaleSelectionPolicy};
use std::collections::HashSet;

pub fn handle_update(m: &mut Model, msg: Msg) -> Option<Effect> {
    match msg {
        Msg::WindowSize { width, height } => {
            handle_window_size(m, width, height);
            None
        }
        Msg::KeyUp => {
            move_cursor(m, false);
            None
        }
        Msg::KeyDown => {
            move_cursor(m, true);
            None
        }
        Msg::KeySpace => toggle_at_cursor(m),
        Msg::KeyEnter => handle_key_enter(m),
        Msg::KeyBackspace => {
            if m.allow_search && m.search_query.pop().is_some() {
                refresh_display(m);
            }
            None
        }
        Msg::Rune(r) => {
            if m.allow_search && m.load_state == LoadState::Ready && !r.is_control() {
                m.search_query.push(r);
                refresh_display(m);
            }
            None
        }
        Msg::SetContext(context) => {
            if m.context == context {
                return None;
            }
            m.context = context;
            start_load(m)
        }
        Msg::SetMode(mode) => {
            if m.mode == mode {
                return None;
            }
            m.mode = mode;
            start_load(m)
        }
        Msg::SetLimitToCurrentSiteCollection(limit) => {
            if m.limit_to_current_site_collection == limit {
                return None;
            }
            m.limit_to_current_site_collection = limit;
            start_load(m)
        }
        Msg::SetSort { order_by, is_desc } => {
            resort(m, SortSpec::new(order_by.as_deref(), is_desc));
            None
        }
        Msg::SetInitialSites(seed) => {
            seed_selection(m, seed);
            None
        }
        Msg::SitesLoaded { generation, result } => handle_sites_loaded(m, generation, result),
        Msg::ToggleSite(id) => toggle_site(m, &id),
    }
}

/// Begin a full retrieval for the current context, mode and scope. Every call
/// advances the generation, so completions of earlier requests are ignored.
pub fn start_load(m: &mut Model) -> Option<Effect> {
    m.generation += 1;
    m.search_query.clear();
    m.display.clear();
    m.cursor = 0;
    m.page = 0;

    let Some(context) = m.context.clone() else {
        tracing::debug!(generation = m.generation, "no site context, nothing to load");
        m.catalog = None;
        m.load_state = LoadState::Idle;
        return None;
    };

    let request = match m.mode {
        // hub lookups ignore the collection scope
        PickerMode::Hub => FetchRequest::HubSites { context },
        mode => FetchRequest::AllSites {
            context,
            web_only: mode == PickerMode::Web,
            limit_to_current_site_collection: m.limit_to_current_site_collection,
        },
    };
    m.load_state = LoadState::Loading;
    m.fetches_issued += 1;
    tracing::debug!(generation = m.generation, ?request, "issuing site retrieval");
    Some(Effect::Fetch(Fetch {
        generation: m.generation,
        request,
    }))
}

fn handle_sites_loaded(
    m: &mut Model,
    generation: u64,
    result: Result<Vec<Site>, SourceError>,
) -> Option<Effect> {
    if generation != m.generation {
        tracing::debug!(generation, current = m.generation, "discarding superseded site retrieval");
        return None;
    }
    match result {
        Ok(sites) => {
            tracing::info!(generation, count = sites.len(), "sites loaded");
            m.catalog = Some(order_sites(&sites, &m.sort));
            m.load_state = LoadState::Ready;
            refresh_display(m);
            prune_stale_selection(m)
        }
        Err(e) => {
            tracing::warn!(generation, error = %e, "site retrieval failed");
            m.catalog = None;
            m.display.clear();
            m.load_state = LoadState::Failed(e.to_string());
            None
        }
    }
}

fn resort(m: &mut Model, sort: SortSpec) {
    m.sort = sort;
    let Some(catalog) = m.catalog.take() else {
        return;
    };
    m.catalog = Some(order_sites(&catalog, &m.sort));
    // the display stays empty until an in-flight retrieval resolves
    if m.load_state == LoadState::Ready {
        refresh_display(m);
    }
}

// Query matching is not wired: every catalog entry is displayed. The query is
// still captured so a predicate can be added here.
fn filter_display(catalog: &[Site], _query: &str) -> Vec<Site> {
    catalog.to_vec()
}

fn refresh_display(m: &mut Model) {
    m.display = filter_display(m.catalog.as_deref().unwrap_or(&[]), &m.search_query);
    if m.cursor >= m.display.len() {
        m.cursor = m.display.len().saturating_sub(1);
    }
    sync_page(m);
}

fn seed_selection(m: &mut Model, seed: Option<Vec<Site>>) {
    let Some(seed) = seed else {
        return;
    };
    if m.selection_initialized || seed.is_empty() {
        return;
    }
    // membership is by id; keep the first entry for each
    let mut seen = HashSet::new();
    let seed: Vec<Site> = seed.into_iter().filter(|s| seen.insert(s.id.clone())).collect();
    tracing::debug!(count = seed.len(), "seeding selection");
    m.selection = seed;
    m.selection_initialized = true;
}

fn prune_stale_selection(m: &mut Model) -> Option<Effect> {
    if m.stale_selection != StaleSelectionPolicy::Prune {
        return None;
    }
    let known: HashSet<&str> = m
        .catalog
        .as_deref()
        .unwrap_or(&[])
        .iter()
        .map(|s| s.id.as_str())
        .collect();
    let before = m.selection.len();
    m.selection.retain(|s| known.contains(s.id.as_str()));
    let removed = before - m.selection.len();
    if removed == 0 {
        return None;
    }
    tracing::debug!(removed, "pruned stale selections");
    Some(Effect::SelectionChanged(m.selection.clone()))
}

fn toggle_site(m: &mut Model, id: &str) -> Option<Effect> {
    if m.disabled || m.load_state != LoadState::Ready {
        return None;
    }
    let site = m.display.iter().find(|s| s.id == id)?.clone();
    if m.multi_select {
        if m.is_selected(id) {
            m.selection.retain(|s| s.id != id);
        } else {
            m.selection.push(site);
        }
    } else {
        m.selection = vec![site];
    }
    m.selection_initialized = true;
    Some(Effect::SelectionChanged(m.selection.clone()))
}

fn toggle_at_cursor(m: &mut Model) -> Option<Effect> {
    let id = m.display.get(m.cursor)?.id.clone();
    toggle_site(m, &id)
}

fn handle_key_enter(m: &mut Model) -> Option<Effect> {
    if m.load_state != LoadState::Ready {
        return None;
    }
    let effect = if m.multi_select {
        None
    } else {
        toggle_at_cursor(m)
    };
    m.confirmed = true;
    effect
}

fn handle_window_size(m: &mut Model, width: usize, height: usize) {
    m.screen_width = width;
    let search_lines = usize::from(m.allow_search);
    m.per_page = height.saturating_sub(RESERVED_LINES + search_lines);
    sync_page(m);
}

fn move_cursor(m: &mut Model, down: bool) {
    let total = m.display.len();
    if total == 0 || m.load_state != LoadState::Ready {
        return;
    }
    m.cursor = if down {
        (m.cursor + 1) % total
    } else if m.cursor == 0 {
        total - 1
    } else {
        m.cursor - 1
    };
    sync_page(m);
}

// keep the page that contains the cursor visible
fn sync_page(m: &mut Model) {
    m.page = if m.per_page == 0 { 0 } else { m.cursor / m.per_page };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SiteContext;
    use crate::ui::model::{PickerProps, initial_model};

    fn ctx(name: &str) -> SiteContext {
        SiteContext {
            web_url: format!("https://c.example/sites/{name}"),
            site_url: format!("https://c.example/sites/{name}"),
            hub_site_id: Some("hub1".to_string()),
        }
    }

    fn beta_alpha() -> Vec<Site> {
        vec![Site::new("b", "Beta", "https://c.example/sites/b"), Site::new("a", "Alpha", "https://c.example/sites/a")]
    }

    fn expect_fetch(effect: Option<Effect>) -> Fetch {
        match effect {
            Some(Effect::Fetch(f)) => f,
            other => panic!("expected a fetch effect, got {other:?}"),
        }
    }

    fn loaded(m: &mut Model, fetch: &Fetch, sites: Vec<Site>) -> Option<Effect> {
        m.update(Msg::SitesLoaded {
            generation: fetch.generation,
            result: Ok(sites),
        })
    }

    fn display_titles(m: &Model) -> Vec<&str> {
        m.display.iter().map(|s| s.title.as_str()).collect()
    }

    fn web_props() -> PickerProps {
        PickerProps {
            context: Some(ctx("hr")),
            mode: PickerMode::Web,
            limit_to_current_site_collection: true,
            ..PickerProps::default()
        }
    }

    #[test]
    fn test_web_scope_default_sort_scenario() {
        let (mut m, effect) = initial_model(web_props());
        let fetch = expect_fetch(effect);
        assert!(matches!(
            fetch.request,
            FetchRequest::AllSites { web_only: true, limit_to_current_site_collection: true, .. }
        ));
        assert!(loaded(&mut m, &fetch, beta_alpha()).is_none());
        assert_eq!(m.load_state, LoadState::Ready);
        assert_eq!(display_titles(&m), vec!["Alpha", "Beta"]);
        assert!(m.options().iter().all(|o| !o.is_selected()));
    }

    #[test]
    fn test_seeded_selection_scenario() {
        let props = PickerProps {
            initial_sites: Some(vec![Site::new("a", "", "")]),
            ..web_props()
        };
        let (mut m, effect) = initial_model(props);
        let fetch = expect_fetch(effect);
        loaded(&mut m, &fetch, beta_alpha());
        let opts = m.options();
        assert_eq!(opts[0].key(), "a");
        assert!(opts[0].is_selected());
        assert_eq!(opts[1].key(), "b");
        assert!(!opts[1].is_selected());
    }

    #[test]
    fn test_descending_sort_scenario() {
        let props = PickerProps {
            order_by: Some("title".to_string()),
            is_desc: true,
            ..web_props()
        };
        let (mut m, effect) = initial_model(props);
        let fetch = expect_fetch(effect);
        loaded(&mut m, &fetch, beta_alpha());
        assert_eq!(display_titles(&m), vec!["Beta", "Alpha"]);
    }

    #[test]
    fn test_sort_change_resorts_without_fetching() {
        let (mut m, effect) = initial_model(web_props());
        let fetch = expect_fetch(effect);
        loaded(&mut m, &fetch, beta_alpha());
        assert_eq!(m.fetches_issued, 1);

        let effect = m.update(Msg::SetSort {
            order_by: None,
            is_desc: true,
        });
        assert!(effect.is_none());
        assert_eq!(m.fetches_issued, 1);
        assert_eq!(display_titles(&m), vec!["Beta", "Alpha"]);

        m.update(Msg::SetSort {
            order_by: Some("id".to_string()),
            is_desc: false,
        });
        assert_eq!(display_titles(&m), vec!["Alpha", "Beta"]);
        assert_eq!(m.fetches_issued, 1);
    }

    #[test]
    fn test_sort_change_before_load_applies_to_next_result() {
        let (mut m, effect) = initial_model(web_props());
        let fetch = expect_fetch(effect);
        m.update(Msg::SetSort {
            order_by: None,
            is_desc: true,
        });
        assert!(m.display.is_empty());
        loaded(&mut m, &fetch, beta_alpha());
        assert_eq!(display_titles(&m), vec!["Beta", "Alpha"]);
    }

    #[test]
    fn test_hub_mode_ignores_scope_flag() {
        let (mut m, effect) = initial_model(web_props());
        expect_fetch(effect);
        let fetch = expect_fetch(m.update(Msg::SetMode(PickerMode::Hub)));
        assert_eq!(fetch.request, FetchRequest::HubSites { context: ctx("hr") });
        assert_eq!(m.fetches_issued, 2);
        // the scope flag has no bearing on hub requests but still re-triggers
        let fetch = expect_fetch(m.update(Msg::SetLimitToCurrentSiteCollection(false)));
        assert_eq!(fetch.request, FetchRequest::HubSites { context: ctx("hr") });
    }

    #[test]
    fn test_unchanged_inputs_do_not_refetch() {
        let (mut m, effect) = initial_model(web_props());
        expect_fetch(effect);
        assert!(m.update(Msg::SetMode(PickerMode::Web)).is_none());
        assert!(m.update(Msg::SetContext(Some(ctx("hr")))).is_none());
        assert!(m.update(Msg::SetLimitToCurrentSiteCollection(true)).is_none());
        assert_eq!(m.fetches_issued, 1);
    }

    #[test]
    fn test_reload_clears_search_and_display() {
        let props = PickerProps {
            allow_search: true,
            ..web_props()
        };
        let (mut m, effect) = initial_model(props);
        let fetch = expect_fetch(effect);
        loaded(&mut m, &fetch, beta_alpha());
        m.update(Msg::Rune('a'));
        assert_eq!(m.search_query, "a");

        let fetch = expect_fetch(m.update(Msg::SetContext(Some(ctx("it")))));
        assert!(m.is_loading());
        assert!(m.search_query.is_empty());
        assert!(m.display.is_empty());
        loaded(&mut m, &fetch, vec![Site::new("z", "Zeta", "")]);
        assert_eq!(display_titles(&m), vec!["Zeta"]);
    }

    #[test]
    fn test_superseded_retrieval_is_discarded() {
        let (mut m, effect) = initial_model(web_props());
        let stale = expect_fetch(effect);
        let current = expect_fetch(m.update(Msg::SetContext(Some(ctx("it")))));
        assert!(current.generation > stale.generation);

        loaded(&mut m, &current, vec![Site::new("z", "Zeta", "")]);
        // the older request resolves late and must not overwrite newer state
        loaded(&mut m, &stale, beta_alpha());
        assert_eq!(display_titles(&m), vec!["Zeta"]);
        assert_eq!(m.load_state, LoadState::Ready);
    }

    #[test]
    fn test_failure_resolves_gate() {
        let (mut m, effect) = initial_model(web_props());
        let fetch = expect_fetch(effect);
        m.update(Msg::SitesLoaded {
            generation: fetch.generation,
            result: Err(SourceError::Lookup("timed out".to_string())),
        });
        assert_eq!(m.load_state, LoadState::Failed("site lookup failed: timed out".to_string()));
        assert!(!m.is_loading());
        assert!(m.display.is_empty());
        // a later input change recovers
        let fetch = expect_fetch(m.update(Msg::SetMode(PickerMode::Site)));
        loaded(&mut m, &fetch, beta_alpha());
        assert_eq!(m.load_state, LoadState::Ready);
    }

    #[test]
    fn test_removing_context_goes_idle_and_drops_inflight() {
        let (mut m, effect) = initial_model(web_props());
        let fetch = expect_fetch(effect);
        assert!(m.update(Msg::SetContext(None)).is_none());
        assert_eq!(m.load_state, LoadState::Idle);
        loaded(&mut m, &fetch, beta_alpha());
        assert_eq!(m.load_state, LoadState::Idle);
        assert!(m.catalog.is_none());
    }

    #[test]
    fn test_seed_initializes_once() {
        let (mut m, _) = initial_model(web_props());
        m.update(Msg::SetInitialSites(None));
        m.update(Msg::SetInitialSites(Some(vec![])));
        assert!(!m.selection_initialized);
        m.update(Msg::SetInitialSites(Some(vec![Site::new("a", "", "")])));
        m.update(Msg::SetInitialSites(Some(vec![Site::new("b", "", "")])));
        let ids: Vec<&str> = m.selected_ids().collect();
        assert_eq!(ids, vec!["a"]);
    }

    #[test]
    fn test_user_toggle_blocks_late_seed() {
        let (mut m, effect) = initial_model(web_props());
        let fetch = expect_fetch(effect);
        loaded(&mut m, &fetch, beta_alpha());
        m.update(Msg::ToggleSite("b".to_string()));
        m.update(Msg::SetInitialSites(Some(vec![Site::new("a", "", "")])));
        let ids: Vec<&str> = m.selected_ids().collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[test]
    fn test_multi_select_toggle() {
        let (mut m, effect) = initial_model(web_props());
        let fetch = expect_fetch(effect);
        loaded(&mut m, &fetch, beta_alpha());
        let effect = m.update(Msg::ToggleSite("a".to_string()));
        assert_eq!(effect, Some(Effect::SelectionChanged(vec![Site::new("a", "Alpha", "https://c.example/sites/a")])));
        m.update(Msg::ToggleSite("b".to_string()));
        assert!(m.is_selected("a") && m.is_selected("b"));
        let effect = m.update(Msg::ToggleSite("a".to_string()));
        assert_eq!(effect, Some(Effect::SelectionChanged(vec![Site::new("b", "Beta", "https://c.example/sites/b")])));
        // unknown ids are ignored
        assert!(m.update(Msg::ToggleSite("nope".to_string())).is_none());
    }

    #[test]
    fn test_repeated_seed_ids_toggle_off_together() {
        let props = PickerProps {
            initial_sites: Some(vec![Site::new("a", "", ""), Site::new("a", "", "")]),
            ..web_props()
        };
        let (mut m, effect) = initial_model(props);
        let fetch = expect_fetch(effect);
        assert_eq!(m.selection.len(), 1);
        loaded(&mut m, &fetch, vec![Site::new("a", "Alpha", "")]);
        let effect = m.update(Msg::ToggleSite("a".to_string()));
        assert_eq!(effect, Some(Effect::SelectionChanged(vec![])));
        assert!(!m.is_selected("a"));
    }

    #[test]
    fn test_single_select_replaces() {
        let props = PickerProps {
            multi_select: false,
            ..web_props()
        };
        let (mut m, effect) = initial_model(props);
        let fetch = expect_fetch(effect);
        loaded(&mut m, &fetch, beta_alpha());
        m.update(Msg::ToggleSite("a".to_string()));
        m.update(Msg::ToggleSite("b".to_string()));
        let ids: Vec<&str> = m.selected_ids().collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[test]
    fn test_toggle_ignored_when_disabled_or_loading() {
        let props = PickerProps {
            disabled: true,
            ..web_props()
        };
        let (mut m, effect) = initial_model(props);
        let fetch = expect_fetch(effect);
        assert!(m.update(Msg::ToggleSite("a".to_string())).is_none());
        loaded(&mut m, &fetch, beta_alpha());
        assert!(m.update(Msg::ToggleSite("a".to_string())).is_none());
        assert!(m.selection.is_empty());
    }

    #[test]
    fn test_stale_selection_retained_by_default() {
        let props = PickerProps {
            initial_sites: Some(vec![Site::new("gone", "Gone", "")]),
            ..web_props()
        };
        let (mut m, effect) = initial_model(props);
        let fetch = expect_fetch(effect);
        assert!(loaded(&mut m, &fetch, beta_alpha()).is_none());
        assert!(m.is_selected("gone"));
        assert!(m.options().iter().all(|o| !o.is_selected()));
    }

    #[test]
    fn test_stale_selection_pruned_on_catalog_replacement() {
        let props = PickerProps {
            initial_sites: Some(vec![Site::new("gone", "Gone", ""), Site::new("a", "Alpha", "")]),
            stale_selection: StaleSelectionPolicy::Prune,
            ..web_props()
        };
        let (mut m, effect) = initial_model(props);
        let fetch = expect_fetch(effect);
        let effect = loaded(&mut m, &fetch, beta_alpha());
        assert_eq!(effect, Some(Effect::SelectionChanged(vec![Site::new("a", "Alpha", "")])));
        let ids: Vec<&str> = m.selected_ids().collect();
        assert_eq!(ids, vec!["a"]);
    }

    #[test]
    fn test_cursor_navigation_and_space_toggle() {
        let (mut m, effect) = initial_model(web_props());
        let fetch = expect_fetch(effect);
        loaded(&mut m, &fetch, beta_alpha());
        m.update(Msg::KeyUp);
        assert_eq!(m.cursor, 1);
        m.update(Msg::KeyDown);
        assert_eq!(m.cursor, 0);
        m.update(Msg::KeySpace);
        assert!(m.is_selected("a"));
        m.update(Msg::KeyEnter);
        assert!(m.confirmed);
        assert!(m.is_selected("a"));
    }

    #[test]
    fn test_enter_in_single_select_picks_and_confirms() {
        let props = PickerProps {
            multi_select: false,
            ..web_props()
        };
        let (mut m, effect) = initial_model(props);
        let fetch = expect_fetch(effect);
        loaded(&mut m, &fetch, beta_alpha());
        m.update(Msg::KeyDown);
        let effect = m.update(Msg::KeyEnter);
        assert!(matches!(effect, Some(Effect::SelectionChanged(_))));
        assert!(m.confirmed && m.is_selected("b"));
    }

    #[test]
    fn test_window_size_pagination_follows_cursor() {
        let (mut m, effect) = initial_model(web_props());
        let fetch = expect_fetch(effect);
        let sites: Vec<Site> = (0..10).map(|i| Site::new(&format!("s{i}"), &format!("Site {i}"), "")).collect();
        loaded(&mut m, &fetch, sites);
        m.update(Msg::WindowSize { width: 80, height: 6 });
        assert_eq!(m.per_page, 4);
        for _ in 0..5 {
            m.update(Msg::KeyDown);
        }
        assert_eq!(m.cursor, 5);
        assert_eq!(m.page, 1);
    }

    #[test]
    fn test_search_runes_and_backspace() {
        let props = PickerProps {
            allow_search: true,
            ..web_props()
        };
        let (mut m, effect) = initial_model(props);
        let fetch = expect_fetch(effect);
        m.update(Msg::Rune('x'));
        assert!(m.search_query.is_empty());
        loaded(&mut m, &fetch, beta_alpha());
        m.update(Msg::Rune('a'));
        m.update(Msg::Rune('l'));
        m.update(Msg::KeyBackspace);
        assert_eq!(m.search_query, "a");
        assert_eq!(m.display.len(), 2);
    }
}
