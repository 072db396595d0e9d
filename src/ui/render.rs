// Render module split into focused submodules.

pub mod full;
pub mod list;
pub mod modeline;
pub mod styles;

pub use full::{render_full, render_label};
pub use list::render_main_content;
pub use modeline::{render_modeline, render_modeline_padded};
