use crate::picker::{Picker, fetch_future};
use crate::site::{Site, to_relative_url};
use crate::source::SiteSource;
use crate::ui::model::{Effect, LoadState, Model, PickerProps, initial_model};
use crate::ui::options::PickerOption;
use bubbletea_rs::{
    Program, command::Cmd, event::KeyMsg, event::WindowSizeMsg, model::Model as TeaModel,
    window_size,
};
use crossterm::event::{KeyCode, KeyModifiers};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("no site context: pass --site-url")]
    NoContext,
    #[error("failed to load sites: {0}")]
    Load(String),
    #[error("failed to build program: {0}")]
    Build(String),
    #[error("program error: {0}")]
    Program(String),
    #[error("interactive picker already started")]
    AlreadyStarted,
}

// One line per site option: mark, title, relative url, id.
pub fn format_options(options: &[PickerOption]) -> String {
    options
        .iter()
        .filter_map(|o| match o {
            PickerOption::Search => None,
            PickerOption::Site { key, text, site, selected } => {
                let mark = if *selected { "[x]" } else { "[ ]" };
                Some(format!("{mark} {text}\t{}\t{key}", to_relative_url(&site.url)))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Load once and return the projected option list without a terminal UI.
pub async fn list(props: PickerProps, source: Arc<dyn SiteSource>) -> Result<String, RunError> {
    if props.context.is_none() {
        return Err(RunError::NoContext);
    }
    let mut picker = Picker::new(props, source);
    picker.settle().await;
    if let LoadState::Failed(message) = picker.load_state() {
        return Err(RunError::Load(message.clone()));
    }
    Ok(format_options(&picker.options()))
}

// The bubbletea Model trait builds its state in a static `init`, so the launch
// inputs are parked here first.
struct Launch {
    props: PickerProps,
    source: Arc<dyn SiteSource>,
}

static LAUNCH: OnceCell<Launch> = OnceCell::new();

// Adapter type implementing bubbletea-rs Model trait by delegating to our Model
struct TeaAdapter {
    inner: Model,
    source: Option<Arc<dyn SiteSource>>,
    cancelled: bool,
}

impl TeaAdapter {
    fn effect_cmd(&mut self, effect: Option<Effect>) -> Option<Cmd> {
        match effect? {
            Effect::Fetch(fetch) => {
                let source = self.source.clone()?;
                let fut = fetch_future(source, fetch);
                let cmd: Cmd = Box::pin(async move {
                    let msg = fut.await;
                    Some(Box::new(msg) as bubbletea_rs::event::Msg)
                });
                Some(cmd)
            }
            Effect::SelectionChanged(selection) => {
                tracing::debug!(count = selection.len(), "selection changed");
                None
            }
        }
    }

    fn quit(&mut self) -> Option<Cmd> {
        self.cancelled = true;
        Some(bubbletea_rs::quit())
    }
}

impl TeaModel for TeaAdapter {
    fn init() -> (Self, Option<Cmd>) {
        let (props, source) = match LAUNCH.get() {
            Some(l) => (l.props.clone(), Some(l.source.clone())),
            None => (PickerProps::default(), None),
        };
        let (mut inner, effect) = initial_model(props);
        let (width, height) = crossterm::terminal::size().unwrap_or((80, 24));
        inner.update(crate::ui::Msg::WindowSize {
            width: width as usize,
            height: height as usize,
        });
        let mut adapter = TeaAdapter {
            inner,
            source,
            cancelled: false,
        };
        let cmd = adapter.effect_cmd(effect).unwrap_or_else(window_size);
        (adapter, Some(cmd))
    }

    fn update(&mut self, msg: bubbletea_rs::event::Msg) -> Option<Cmd> {
        // completed retrievals come back as our own messages
        if let Some(ours) = msg.downcast_ref::<crate::ui::Msg>() {
            let effect = self.inner.update(ours.clone());
            return self.effect_cmd(effect);
        }
        if let Some(km) = msg.downcast_ref::<KeyMsg>() {
            let ui_msg = match &km.key {
                KeyCode::Esc => return self.quit(),
                KeyCode::Enter => crate::ui::Msg::KeyEnter,
                KeyCode::Backspace => crate::ui::Msg::KeyBackspace,
                KeyCode::Up => crate::ui::Msg::KeyUp,
                KeyCode::Down => crate::ui::Msg::KeyDown,
                KeyCode::Char(ch) => {
                    if *ch == '\u{03}' {
                        // Ctrl-C delivered as ETX
                        return self.quit();
                    }
                    if km.modifiers.contains(KeyModifiers::CONTROL) {
                        match ch {
                            'c' | 'C' => return self.quit(),
                            'n' | 'N' => crate::ui::Msg::KeyDown,
                            'p' | 'P' => crate::ui::Msg::KeyUp,
                            _ => return None,
                        }
                    } else if *ch == ' ' {
                        crate::ui::Msg::KeySpace
                    } else {
                        crate::ui::Msg::Rune(*ch)
                    }
                }
                _ => return None,
            };
            let effect = self.inner.update(ui_msg);
            if self.inner.confirmed {
                return Some(bubbletea_rs::quit());
            }
            return self.effect_cmd(effect);
        }
        if let Some(ws) = msg.downcast_ref::<WindowSizeMsg>() {
            self.inner.update(crate::ui::Msg::WindowSize {
                width: ws.width as usize,
                height: ws.height as usize,
            });
        }
        None
    }

    fn view(&self) -> String {
        self.inner.render_full()
    }
}

/// Run the interactive picker. Returns the confirmed selection, or `None` when
/// the user quit without confirming.
pub async fn run(props: PickerProps, source: Arc<dyn SiteSource>) -> Result<Option<Vec<Site>>, RunError> {
    LAUNCH
        .set(Launch { props, source })
        .map_err(|_| RunError::AlreadyStarted)?;

    let builder = Program::<TeaAdapter>::builder()
        .alt_screen(true)
        .signal_handler(true);
    let program = builder.build().map_err(|e| RunError::Build(format!("{e:?}")))?;
    let final_adapter = program
        .run()
        .await
        .map_err(|e| RunError::Program(format!("{e:?}")))?;

    if final_adapter.cancelled || !final_adapter.inner.confirmed {
        return Ok(None);
    }
    Ok(Some(final_adapter.inner.selection.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{JsonDirectory, SiteContext};
    use crate::ui::model::PickerMode;
    use std::io::Write;

    fn directory() -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(
            br#"{"sites": [
                {"kind": "site", "id": "b", "title": "Beta", "url": "https://c.example/sites/b", "hubSiteId": "h"},
                {"kind": "site", "id": "a", "title": "Alpha", "url": "https://c.example/sites/a"}
            ]}"#,
        )
        .unwrap();
        f
    }

    fn context() -> SiteContext {
        SiteContext {
            web_url: "https://c.example/sites/a".to_string(),
            site_url: "https://c.example/sites/a".to_string(),
            hub_site_id: Some("h".to_string()),
        }
    }

    #[test]
    fn test_format_options_skips_search_row() {
        let opts = vec![
            PickerOption::Search,
            PickerOption::Site {
                key: "a".to_string(),
                text: "Alpha".to_string(),
                site: Site::new("a", "Alpha", "https://c.example/sites/a"),
                selected: true,
            },
        ];
        assert_eq!(format_options(&opts), "[x] Alpha\t/sites/a\ta");
    }

    #[tokio::test]
    async fn test_list_sorted_with_seed() {
        let f = directory();
        let props = PickerProps {
            context: Some(context()),
            initial_sites: Some(vec![Site::new("a", "", "")]),
            allow_search: true,
            ..PickerProps::default()
        };
        let out = list(props, Arc::new(JsonDirectory::new(f.path()))).await.unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines, vec!["[x] Alpha\t/sites/a\ta", "[ ] Beta\t/sites/b\tb"]);
    }

    #[tokio::test]
    async fn test_list_hub_mode() {
        let f = directory();
        let props = PickerProps {
            context: Some(context()),
            mode: PickerMode::Hub,
            limit_to_current_site_collection: true,
            ..PickerProps::default()
        };
        let out = list(props, Arc::new(JsonDirectory::new(f.path()))).await.unwrap();
        assert_eq!(out, "[ ] Beta\t/sites/b\tb");
    }

    #[tokio::test]
    async fn test_list_without_context_is_an_error() {
        let f = directory();
        let err = list(PickerProps::default(), Arc::new(JsonDirectory::new(f.path())))
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::NoContext));
        assert!(err.to_string().contains("--site-url"));
    }

    #[tokio::test]
    async fn test_list_reports_load_failure() {
        let props = PickerProps {
            context: Some(context()),
            ..PickerProps::default()
        };
        let source = Arc::new(JsonDirectory::new("/nonexistent/sitepick.json"));
        let err = list(props, source).await.unwrap_err();
        assert!(matches!(err, RunError::Load(_)));
    }
}
