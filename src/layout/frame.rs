//! Frames and their bindings

use super::text::{text_width, truncate};
use super::tree::NodeId;
use super::{Bounds, FrameId, ValueId};
use crate::config::Config;
use crate::snapshot::{Datum, EnvId, RuntimeEnv};

/// A named slot of a frame. The binding only points at its value; the value
/// itself belongs to the layout context.
#[derive(Debug, Clone)]
pub struct Binding {
    pub name: String,
    pub constant: bool,
    /// `None` for a declared but unassigned name
    pub datum: Option<Datum>,
    pub target: Option<ValueId>,
    pub frame: FrameId,
    pub index: usize,
    /// Name plus colon, as drawn
    pub key_text: String,
    /// Covers the key text; values are placed after it
    pub bounds: Bounds,
    pub(crate) drawn: bool,
}

impl Binding {
    /// Right end of the key text, vertically centered on the row
    pub fn arrow_start(&self) -> super::Point {
        super::Point {
            x: self.bounds.right(),
            y: self.bounds.y + self.bounds.height / 2.0,
        }
    }

    pub fn is_drawn(&self) -> bool {
        self.drawn
    }
}

/// Rendered form of one environment
#[derive(Debug, Clone)]
pub struct Frame {
    pub id: FrameId,
    pub node: NodeId,
    pub env: Option<EnvId>,
    pub is_global: bool,
    pub label: String,
    pub bounds: Bounds,
    /// Frame width plus the values laid out to its right
    pub total_width: f64,
    pub bindings: Vec<Binding>,
    pub predeclared_only: bool,
    pub(crate) drawn: bool,
}

impl Frame {
    /// Build a frame at (x, y) from the environments it stands for, outermost
    /// first. A later environment's name replaces an earlier one in place.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: FrameId,
        node: NodeId,
        env: Option<EnvId>,
        is_global: bool,
        predeclared_only: bool,
        envs: &[&RuntimeEnv],
        x: f64,
        y: f64,
        config: &Config,
    ) -> Frame {
        let mut slots: Vec<(String, bool, Option<Datum>)> = Vec::new();
        for binding in envs.iter().flat_map(|env| env.bindings.iter()) {
            let slot = (binding.name.clone(), binding.constant, binding.value.clone());
            match slots.iter_mut().find(|(name, _, _)| *name == binding.name) {
                Some(existing) => *existing = slot,
                None => slots.push(slot),
            }
        }

        let label = if is_global {
            config.global_frame_label.to_string()
        } else if predeclared_only {
            config.predeclared_text.to_string()
        } else {
            let name = envs.last().map(|env| env.name.as_str()).unwrap_or_default();
            truncate(name, config.text_max_width, config)
        };

        let mut widest: f64 = 0.0;
        let bindings: Vec<Binding> = slots
            .into_iter()
            .enumerate()
            .map(|(index, (name, constant, datum))| {
                let colon = if constant {
                    config.constant_colon
                } else {
                    config.variable_colon
                };
                let key_text = format!("{}{}", truncate(&name, config.text_max_width, config), colon);
                let key_width = text_width(&key_text, config);
                let line_width = key_width + text_width(&inline_text(datum.as_ref(), config), config);
                widest = widest.max(line_width.min(config.text_max_width));
                Binding {
                    name,
                    constant,
                    datum,
                    target: None,
                    frame: id,
                    index,
                    key_text,
                    bounds: Bounds {
                        x: x + config.frame_padding_x,
                        y: y + config.frame_padding_y + index as f64 * config.data_unit_height,
                        width: key_width,
                        height: config.data_unit_height,
                    },
                    drawn: false,
                }
            })
            .collect();

        let width = config.frame_min_width.max(widest) + 2.0 * config.frame_padding_x;
        let height = bindings.len() as f64 * config.data_unit_height + 2.0 * config.frame_padding_y;

        Frame {
            id,
            node,
            env,
            is_global,
            label,
            bounds: Bounds {
                x,
                y,
                width,
                height,
            },
            total_width: width,
            bindings,
            predeclared_only,
            drawn: false,
        }
    }

    /// Identifier shown to renderers; the global frame always uses the sentinel
    pub fn ident(&self, config: &Config) -> String {
        match (self.is_global, self.env) {
            (true, _) | (false, None) => config.global_env_id.to_string(),
            (false, Some(env)) => env.0.to_string(),
        }
    }

    pub fn is_drawn(&self) -> bool {
        self.drawn
    }

    pub(crate) fn reset(&mut self) {
        self.drawn = false;
        for binding in &mut self.bindings {
            binding.drawn = false;
        }
    }
}

/// Text drawn on the binding's own row after the key
pub(crate) fn inline_text(datum: Option<&Datum>, config: &Config) -> String {
    match datum {
        None => config.unassigned_data.to_string(),
        Some(Datum::Primitive(p)) => p.to_string(),
        Some(Datum::Null) => "null".to_string(),
        Some(Datum::Object(_)) => String::new(),
    }
}
