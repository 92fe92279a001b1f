//! Error and warning types
//!
//! Layout never fails: every problem found in a snapshot degrades locally and is
//! reported as a [`LayoutWarning`] next to the diagram. [`HistoryError`] covers the
//! few operations that can actually refuse a request (stepping past the ends of
//! the history, exceeding its memory limit).

use crate::snapshot::{DatumId, EnvId};
use std::fmt;

/// Non-fatal problems found while building or laying out a snapshot
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutWarning {
    /// The snapshot has no environment without a parent
    MissingGlobal,

    /// A second parentless environment was found
    ExtraRoot { env: EnvId },

    /// Two environments share an id; the later one is ignored
    DuplicateEnv { env: EnvId },

    /// An environment names a parent that is not in the snapshot
    DanglingParent { env: EnvId, parent: EnvId },

    /// Parent links form a cycle; the loop was cut at `env`
    ParentCycle { env: EnvId },

    /// A binding refers to an object absent from the heap
    UnresolvedDatum { datum: DatumId },

    /// A closure whose defining environment is absent
    MalformedClosure { datum: DatumId, env: EnvId },

    /// The diagram exceeds the export limits and will be scaled down
    OversizedExport {
        width: f64,
        height: f64,
        scale: f64,
    },
}

impl fmt::Display for LayoutWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutWarning::MissingGlobal => write!(f, "snapshot has no global environment"),
            LayoutWarning::ExtraRoot { env } => {
                write!(f, "environment {} has no parent, attached to global", env)
            }
            LayoutWarning::DuplicateEnv { env } => {
                write!(f, "environment {} appears more than once", env)
            }
            LayoutWarning::DanglingParent { env, parent } => write!(
                f,
                "environment {} has unknown parent {}, attached to global",
                env, parent
            ),
            LayoutWarning::ParentCycle { env } => {
                write!(f, "parent links cycle through environment {}", env)
            }
            LayoutWarning::UnresolvedDatum { datum } => {
                write!(f, "object {} is not in the snapshot", datum)
            }
            LayoutWarning::MalformedClosure { datum, env } => write!(
                f,
                "closure {} refers to unknown environment {}",
                datum, env
            ),
            LayoutWarning::OversizedExport {
                width,
                height,
                scale,
            } => write!(
                f,
                "diagram is {:.0}x{:.0}, export scaled by {:.3}",
                width, height, scale
            ),
        }
    }
}

/// Errors from the snapshot history
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    /// Adding the snapshot would exceed the memory limit
    LimitExceeded {
        current: usize,
        requested: usize,
        limit: usize,
    },

    /// Already at the first snapshot
    AtStart,

    /// Already at the last snapshot
    AtEnd,

    /// History holds no snapshots
    Empty,
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryError::LimitExceeded {
                current,
                requested,
                limit,
            } => write!(
                f,
                "snapshot memory limit exceeded: {} + {} > {}",
                current, requested, limit
            ),
            HistoryError::AtStart => write!(f, "already at the first step"),
            HistoryError::AtEnd => write!(f, "already at the last step"),
            HistoryError::Empty => write!(f, "no snapshots recorded"),
        }
    }
}

impl std::error::Error for HistoryError {}
