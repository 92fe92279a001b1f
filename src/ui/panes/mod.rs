//! TUI pane rendering modules
//!
//! - [`diagram`]: the environment diagram, painted on a canvas
//! - [`status`]: status bar with keybindings and step state
//!
//! Each pane module exports a stateless `render_*` function.

pub mod diagram;
pub mod status;

pub use diagram::render_diagram_pane;
pub use status::{render_status_bar, StatusRenderData};
