use crate::ui::model::Model;
use crate::ui::render::list::{content_width, truncate};
use crate::ui::render::styles::STYLE_LABEL;
use lipgloss::Style;

pub fn render_label(m: &Model) -> String {
    let width = content_width(m);
    let mut text = if m.label.is_empty() {
        "Sites".to_string()
    } else {
        m.label.clone()
    };
    if m.disabled {
        text.push_str(" (disabled)");
    }
    let text = truncate(&text, width);
    Style::new().width(width as i32).render(&STYLE_LABEL.render(&text))
}

pub fn render_full(m: &Model) -> String {
    let mut lines = vec![render_label(m)];
    lines.extend(m.render_main_content().lines().map(str::to_string));
    let first_line = crate::ui::render::modeline::render_modeline_padded(m)
        .lines()
        .next()
        .unwrap_or("")
        .to_string();
    lines.push(first_line);
    lines.join("\n")
}
