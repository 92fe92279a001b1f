//! # Introduction
//!
//! envscope draws environment-model diagrams of a running program: call frames
//! with their bindings, the arrays and closures those bindings denote, and the
//! arrows between them. An interpreter hands over a [`snapshot::Snapshot`] after
//! each step; the layout engine turns it into a [`layout::Diagram`] that any
//! backend can paint. A terminal viewer built with
//! [ratatui](https://docs.rs/ratatui) is included.
//!
//! ## Pipeline
//!
//! ```text
//! Snapshot → EnvTree → LayoutContext (frames, values, cache) → Diagram → renderer
//! ```
//!
//! 1. [`snapshot`]: the input contract (environments, heap objects) and a
//!    memory-bounded step history.
//! 2. [`layout::tree`]: which environments become frames, and where they hang.
//! 3. [`layout`]: positions frames, bindings and values. Heap objects are
//!    memoized by identity, so aliased data is drawn once and cyclic arrays
//!    terminate.
//! 4. [`layout::arrow`] and [`layout::draw`]: connector routing and the draw
//!    walk producing keyed shapes.
//! 5. [`ui`]: ratatui viewer; not part of the stable library API.
//!
//! Layout never fails. Malformed snapshot parts degrade to placeholders and are
//! reported as [`errors::LayoutWarning`]s on the diagram.

pub mod config;
pub mod demo;
pub mod errors;
pub mod layout;
pub mod snapshot;
pub mod ui;
