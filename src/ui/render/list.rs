use crate::site::to_relative_url;
use crate::ui::model::{DEFAULT_WIDTH, LoadState, Model};
use crate::ui::options::PickerOption;
use crate::ui::render::styles::{
    STYLE_CURSOR, STYLE_ERROR, STYLE_SEARCH, STYLE_SELECTED, STYLE_TITLE, STYLE_URL,
};
use lipgloss::Style;

pub const LOADING_TEXT: &str = "⠋ Loading sites…";
pub const IDLE_TEXT: &str = "No site context";
pub const EMPTY_TEXT: &str = "No sites found";

pub fn content_width(m: &Model) -> usize {
    if m.screen_width > 0 {
        m.screen_width
    } else {
        DEFAULT_WIDTH
    }
}

// Cut `s` to at most `max` chars, marking the cut with an ellipsis.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out: String = s.chars().take(max - 1).collect();
    out.push('…');
    out
}

pub fn normalize_and_pad(lines: Vec<String>, total_width: usize, per: usize) -> String {
    let line_style = Style::new().width(total_width as i32);
    let mut normalized: Vec<String> = lines.into_iter().map(|l| line_style.render(&l)).collect();
    normalized.truncate(per);
    while normalized.len() < per {
        normalized.push(line_style.render(""));
    }
    normalized.join("\n")
}

// One site row: cursor marker, checkbox, title, then the relative url if it fits.
fn render_site_row(site_title: &str, url: &str, selected: bool, at_cursor: bool, width: usize) -> String {
    let marker = if at_cursor { "› " } else { "  " };
    let checkbox = if selected { "[x] " } else { "[ ] " };
    let prefix_len = marker.chars().count() + checkbox.chars().count();
    let title = truncate(site_title, width.saturating_sub(prefix_len));
    let used = prefix_len + title.chars().count();
    let relative = to_relative_url(url);
    let url_room = width.saturating_sub(used + 2);
    let url_part = if relative.is_empty() || url_room == 0 {
        String::new()
    } else {
        format!("  {}", truncate(&relative, url_room))
    };

    let marker_styled = if at_cursor {
        STYLE_CURSOR.render(marker)
    } else {
        marker.to_string()
    };
    let checkbox_styled = if selected {
        STYLE_SELECTED.render(checkbox)
    } else {
        STYLE_TITLE.render(checkbox)
    };
    let title_styled = if at_cursor {
        STYLE_CURSOR.render(&title)
    } else {
        STYLE_TITLE.render(&title)
    };
    let url_styled = if url_part.is_empty() {
        String::new()
    } else {
        STYLE_URL.render(&url_part)
    };
    format!("{marker_styled}{checkbox_styled}{title_styled}{url_styled}")
}

// Lines for the current page of site options plus the optional search row.
pub fn render_list_lines(m: &Model) -> Vec<String> {
    let width = content_width(m);
    let options = m.options();
    let mut lines = Vec::new();
    let mut rows = Vec::new();
    for opt in options.iter() {
        match opt {
            PickerOption::Search => {
                let text = truncate(&format!("Search: {}", m.search_query), width);
                lines.push(STYLE_SEARCH.render(&text));
            }
            PickerOption::Site { text, site, selected, .. } => rows.push((text, site, *selected)),
        }
    }
    if rows.is_empty() {
        lines.push(STYLE_TITLE.render(EMPTY_TEXT));
        return lines;
    }
    let per = if m.per_page == 0 { rows.len() } else { m.per_page };
    let start = m.page.saturating_mul(per);
    for (idx, (text, site, selected)) in rows.iter().enumerate().skip(start).take(per) {
        lines.push(render_site_row(text, &site.url, *selected, idx == m.cursor, width));
    }
    lines
}

/// Main area between the label and the modeline. Only a ready picker shows the
/// list; loading shows a spinner and nothing else.
pub fn render_main_content(m: &Model) -> String {
    let width = content_width(m);
    let lines = match &m.load_state {
        LoadState::Idle => vec![STYLE_URL.render(IDLE_TEXT)],
        LoadState::Loading => vec![STYLE_CURSOR.render(LOADING_TEXT)],
        LoadState::Failed(message) => {
            let text = truncate(&format!("Failed to load sites: {message}"), width);
            vec![STYLE_ERROR.render(&text)]
        }
        LoadState::Ready => render_list_lines(m),
    };
    let height = if m.per_page == 0 {
        lines.len()
    } else {
        m.per_page + usize::from(m.allow_search)
    };
    normalize_and_pad(lines, width, height)
}
