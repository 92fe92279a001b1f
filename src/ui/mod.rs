//! Terminal viewer built on [ratatui](https://github.com/ratatui-org/ratatui).
//!
//! - **[`app`]**: viewer state and keyboard event loop
//! - **[`hover`]**: the hovered function and its overlay layers
//! - **[`panes`]**: stateless render functions for the diagram and the status bar
//! - **[`theme`]**: colors of the viewer chrome
//!
//! Construct an [`App`] with a [`SnapshotHistory`] and call [`App::run`].
//!
//! [`SnapshotHistory`]: crate::snapshot::SnapshotHistory
//! [`App::run`]: app::App::run

pub mod app;
pub mod hover;
pub mod panes;
pub mod theme;

pub use app::App;
