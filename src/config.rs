//! Geometry and palette constants shared by the layout engine and the renderers.
//!
//! All lengths are in canvas units (one unit is one pixel of the reference
//! renderer). Renderers with a coarser grid, like the terminal viewer, scale the
//! whole diagram instead of changing these values.

use crate::layout::tree::FramePolicy;
use ratatui::style::Color;

/// Colors used for one rendering mode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub background: Color,
    pub stroke: Color,
    pub text: Color,
    pub hovered: Color,
    pub tooltip_fill: Color,
    pub tooltip_text: Color,
    pub placeholder: Color,
}

/// Dark palette for the interactive view
pub const INTERACTIVE_PALETTE: Palette = Palette {
    background: Color::Rgb(44, 62, 80), // slate blue
    stroke: Color::Rgb(153, 153, 153),  // light grey
    text: Color::Rgb(153, 153, 153),
    hovered: Color::Rgb(50, 205, 50),
    tooltip_fill: Color::Black,
    tooltip_text: Color::Rgb(153, 153, 153),
    placeholder: Color::Rgb(243, 139, 168),
};

/// Light palette for printing and export
pub const PRINTABLE_PALETTE: Palette = Palette {
    background: Color::White,
    stroke: Color::Rgb(44, 62, 80),
    text: Color::Rgb(44, 62, 80),
    hovered: Color::Rgb(50, 205, 50),
    tooltip_fill: Color::White,
    tooltip_text: Color::Rgb(44, 62, 80),
    placeholder: Color::Rgb(192, 57, 43),
};

/// Layout configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub canvas_min_width: f64,
    pub canvas_min_height: f64,
    pub canvas_padding_x: f64,
    pub canvas_padding_y: f64,

    pub level_padding_x: f64,
    pub level_padding_y: f64,

    pub frame_min_width: f64,
    pub frame_padding_x: f64,
    pub frame_padding_y: f64,
    pub frame_margin_x: f64,
    pub frame_margin_y: f64,
    pub frame_corner_radius: f64,

    pub fn_radius: f64,
    pub fn_inner_radius: f64,
    pub fn_tooltip_opacity: f64,

    pub data_min_width: f64,
    pub data_unit_width: f64,
    pub data_unit_height: f64,
    pub data_corner_radius: f64,

    pub text_padding_x: f64,
    pub text_padding_y: f64,
    pub text_margin: f64,
    pub text_max_width: f64,
    pub font_size: f64,
    pub char_width: f64, // monospace advance per character

    pub arrow_head_size: f64,
    pub arrow_stroke_width: f64,
    pub arrow_hovered_stroke_width: f64,
    pub arrow_min_height: f64,
    pub arrow_num_lanes: usize,
    pub frame_arrow_stroke_width: f64,

    pub max_export_width: f64,
    pub max_export_height: f64,

    pub constant_colon: &'static str,
    pub variable_colon: &'static str,
    pub ellipsis: &'static str,
    pub unassigned_data: &'static str,
    pub unknown_data: &'static str,
    pub predeclared_text: &'static str,
    pub global_frame_label: &'static str,
    pub global_env_id: &'static str,

    pub frame_policy: FramePolicy,

    pub interactive: Palette,
    pub printable: Palette,
}

impl Config {
    /// Palette for the given mode
    pub fn palette(&self, printable: bool) -> &Palette {
        if printable {
            &self.printable
        } else {
            &self.interactive
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        DEFAULT_CONFIG
    }
}

pub const DEFAULT_CONFIG: Config = Config {
    canvas_min_width: 300.0,
    canvas_min_height: 300.0,
    canvas_padding_x: 30.0,
    canvas_padding_y: 30.0,

    level_padding_x: 10.0,
    level_padding_y: 10.0,

    frame_min_width: 100.0,
    frame_padding_x: 20.0,
    frame_padding_y: 30.0,
    frame_margin_x: 60.0,
    frame_margin_y: 100.0,
    frame_corner_radius: 3.0,

    fn_radius: 15.0,
    fn_inner_radius: 3.0,
    fn_tooltip_opacity: 0.6,

    data_min_width: 20.0,
    data_unit_width: 40.0,
    data_unit_height: 40.0,
    data_corner_radius: 3.0,

    text_padding_x: 10.0,
    text_padding_y: 20.0,
    text_margin: 5.0,
    text_max_width: 300.0,
    font_size: 15.0,
    char_width: 9.0,

    arrow_head_size: 10.0,
    arrow_stroke_width: 1.0,
    arrow_hovered_stroke_width: 2.0,
    arrow_min_height: 100.0,
    arrow_num_lanes: 6,
    frame_arrow_stroke_width: 2.0,

    max_export_width: 20000.0,
    max_export_height: 12000.0,

    constant_colon: ":= ",
    variable_colon: ": ",
    ellipsis: "…",
    unassigned_data: "",
    unknown_data: "<unknown>",
    predeclared_text: ":::pre-declared names::",
    global_frame_label: "Global",
    global_env_id: "-1",

    frame_policy: FramePolicy::PEDAGOGICAL,

    interactive: INTERACTIVE_PALETTE,
    printable: PRINTABLE_PALETTE,
};
