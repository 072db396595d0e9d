use crate::ui::model::{DEFAULT_WIDTH, LoadState, Model};
use crate::ui::render::styles::STYLE_MODELINE;
use lipgloss::Color;

pub fn render_modeline(m: &Model, inner_max: usize, status: &str) -> String {
    // Build styled pairs, compute plain widths, and fit pagination into available space.
    let total = m.display.len();
    let per = if m.per_page == 0 { total } else { m.per_page };
    let total_pages = if per > 0 { total.div_ceil(per).max(1) } else { 1 };

    // prepare inner styles without padding so spacing is under our control
    let inner_style = STYLE_MODELINE.clone().padding(0, 0, 0, 0);
    let key_style = STYLE_MODELINE
        .clone()
        .foreground(Color::from_rgb(238, 0, 238))
        .bold(true)
        .padding(0, 0, 0, 0);
    let pag_style = STYLE_MODELINE.clone().faint(true).padding(0, 0, 0, 0);

    // key hints only make sense once the list is interactive
    let pairs_def: Vec<(&str, &str)> = match (&m.load_state, m.disabled) {
        (LoadState::Ready, false) => vec![("␣", "toggle"), ("⏎", "done"), ("⎋", "quit")],
        _ => vec![("⎋", "quit")],
    };

    let pairs: Vec<(String, usize)> = pairs_def
        .iter()
        .map(|(k, d)| {
            let plain_len = d.chars().count() + 1 + k.chars().count();
            let rendered = format!(
                "{}{}{}",
                inner_style.render(d),
                inner_style.render(":"),
                key_style.render(k)
            );
            (rendered, plain_len)
        })
        .collect();
    let pair_sep_rendered = inner_style.render("  ");
    let pair_sep_width = 2usize;

    let mut pag_plain = String::new();
    let mut pag_rendered = String::new();
    if m.load_state == LoadState::Ready && total_pages > 1 {
        pag_plain = format!("Page {}/{} ↑/↓", m.page + 1, total_pages);
        let arrows = format!("{}/{}", key_style.render("↑"), key_style.render("↓"));
        let pag_unstyled = format!("Page {}/{} ", m.page + 1, total_pages);
        pag_rendered = pag_style.render(&format!("{pag_unstyled}{arrows}"));
    }
    let mut pag_width = pag_plain.chars().count();

    let status_w = status.chars().count() + 2; // padding(0,1)
    let sep_w = " | ".chars().count();
    let avail = inner_max.saturating_sub(status_w + sep_w);

    // drop rightmost pairs until left + pag fits into avail
    let width_of = |count: usize| -> usize {
        if count == 0 {
            0
        } else {
            pairs.iter().take(count).map(|(_, w)| *w).sum::<usize>() + pair_sep_width * (count - 1)
        }
    };
    let mut pairs_count = pairs.len();
    while pairs_count > 0 && width_of(pairs_count) + pag_width > avail {
        pairs_count -= 1;
    }
    let left_width = width_of(pairs_count);
    let left_joined_rendered = pairs
        .iter()
        .take(pairs_count)
        .map(|(r, _)| r.clone())
        .collect::<Vec<_>>()
        .join(&pair_sep_rendered);

    // if still doesn't fit, shorten pagination to just "Page X/Y"
    if left_width + pag_width > avail && !pag_plain.is_empty() {
        let short_pag = format!("Page {}/{}", m.page + 1, total_pages);
        pag_width = short_pag.chars().count();
        pag_rendered = pag_style.render(&short_pag);
    }

    let pad = avail.saturating_sub(left_width + pag_width + 2);
    let filler = if pad > 0 {
        STYLE_MODELINE.clone().width(pad as i32).render("")
    } else {
        String::new()
    };

    let status_style = STYLE_MODELINE
        .clone()
        .background(Color::from_rgb(101, 101, 101))
        .padding(0, 1, 0, 1)
        .bold(true);
    let status_styled = status_style.render(status);
    let sep_styled = inner_style.render(" | ");

    format!("{status_styled}{sep_styled}{left_joined_rendered}{filler}{pag_rendered}")
}

pub fn render_modeline_padded(m: &Model) -> String {
    let total_width = if m.screen_width > 0 {
        m.screen_width
    } else {
        DEFAULT_WIDTH
    };
    let inner_max = total_width.saturating_sub(3);
    let modeline = render_modeline(m, inner_max, &m.status());
    let modeline_single = modeline.replace('\n', " ");
    STYLE_MODELINE
        .clone()
        .width(total_width as i32)
        .render(&modeline_single)
}
