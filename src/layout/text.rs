//! Text measurement for a monospace font

use crate::config::Config;

/// Width of the widest line of `text`
pub fn text_width(text: &str, config: &Config) -> f64 {
    text.lines()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0) as f64
        * config.char_width
}

/// Cut `text` so it fits in `max_width`, ending it with an ellipsis when cut
pub fn truncate(text: &str, max_width: f64, config: &Config) -> String {
    if text_width(text, config) <= max_width {
        return text.to_string();
    }
    let ellipsis_width = text_width(config.ellipsis, config);
    let fits = ((max_width - ellipsis_width) / config.char_width).floor().max(0.0) as usize;
    let mut cut: String = text.chars().take(fits).collect();
    cut.push_str(config.ellipsis);
    cut
}
