//! Layout engine
//!
//! A [`LayoutContext`] turns a [`Snapshot`] into positioned frames, bindings and
//! values, then into an ordered list of draw instructions (see [`draw`]).
//!
//! # Redraw cycle
//!
//! ```text
//! reset → environment tree → levels / frames / values → draw walk
//! ```
//!
//! 1. [`LayoutContext::reset`] marks every entity undrawn, clears reference
//!    lists and releases the identity cache.
//! 2. [`tree::EnvTree::build`] decides which environments become frames.
//! 3. Levels are laid out top to bottom, frames left to right. Each binding
//!    resolves its datum through [`LayoutContext::get_or_create`], which
//!    memoizes heap objects by identity so shared data is placed and drawn once
//!    and cyclic arrays terminate.
//! 4. [`LayoutContext::draw`] walks frames, bindings and values, emitting each at
//!    most once, and routes an arrow for every reference.
//!
//! Values live in an arena owned by the context; frames, bindings and cells hold
//! [`ValueId`] handles into it.

pub mod arrow;
pub mod draw;
pub mod frame;
pub mod text;
pub mod tree;
pub mod value;

use crate::config::Config;
use crate::errors::LayoutWarning;
use crate::snapshot::{Closure, Datum, DatumId, EnvId, HeapObject, RuntimeEnv, Snapshot};
use frame::Frame;
use rustc_hash::FxHashMap;
use text::{text_width, truncate};
use tree::{EnvTree, NodeId};
use value::{ArrayUnit, ArrayValue, FnValue, PrimitiveValue, UnitContent, Value, ValueKind};

pub use draw::{Diagram, DrawKey, Shape, ShapeKind};

/// Handle of a frame in the layout context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub usize);

/// Handle of a value in the layout context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point {
            x: self.x + self.width / 2.0,
            y: self.y + self.height / 2.0,
        }
    }

    /// Smallest bounds covering both
    pub fn union(&self, other: &Bounds) -> Bounds {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Bounds {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }
}

/// Something that points at a value: a frame's binding or an array cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reference {
    Binding { frame: FrameId, index: usize },
    Unit { array: ValueId, index: usize },
}

/// Frames sharing a tree depth
#[derive(Debug, Clone, PartialEq)]
pub struct Level {
    pub depth: usize,
    pub frames: Vec<FrameId>,
    /// Covers the frames and the values placed next to them
    pub bounds: Bounds,
}

/// Layout state for one redraw cycle
#[derive(Debug)]
pub struct LayoutContext {
    config: Config,
    step: Option<usize>,
    tree: EnvTree,
    frames: Vec<Frame>,
    values: Vec<Value>,
    cache: FxHashMap<DatumId, ValueId>,
    levels: Vec<Level>,
    warnings: Vec<LayoutWarning>,
    next_key: u64,
    /// Area covered by the frame being laid out and its values
    extent: Bounds,
}

impl LayoutContext {
    pub fn new(config: Config) -> Self {
        LayoutContext {
            config,
            step: None,
            tree: EnvTree::default(),
            frames: Vec::new(),
            values: Vec::new(),
            cache: FxHashMap::default(),
            levels: Vec::new(),
            warnings: Vec::new(),
            next_key: 0,
            extent: Bounds::default(),
        }
    }

    /// Full cycle: reset, layout, draw
    pub fn redraw(&mut self, snapshot: &Snapshot, printable: bool) -> Diagram {
        self.layout(snapshot);
        self.draw(printable)
    }

    /// Return every entity to undrawn with no references and release the cache.
    /// Handles obtained before the reset are invalid afterwards.
    pub fn reset(&mut self) {
        for value in &mut self.values {
            value.reset();
        }
        for frame in &mut self.frames {
            frame.reset();
        }
        self.values.clear();
        self.frames.clear();
        self.cache.clear();
        self.levels.clear();
        self.warnings.clear();
        self.tree = EnvTree::default();
        self.next_key = 0;
        self.step = None;
    }

    /// Build the environment tree and position every frame, binding and value
    pub fn layout(&mut self, snapshot: &Snapshot) {
        let _span = tracing::info_span!("env_layout", step = snapshot.step).entered();
        self.reset();
        self.step = Some(snapshot.step);
        self.tree = EnvTree::build(snapshot, self.config.frame_policy, &mut self.warnings);

        let mut env_index: FxHashMap<EnvId, &RuntimeEnv> = FxHashMap::default();
        for env in &snapshot.envs {
            env_index.entry(env.id).or_insert(env);
        }

        let mut y = self.config.canvas_padding_y + self.config.level_padding_y;
        for (depth, nodes) in self.tree.levels().into_iter().enumerate() {
            let start_x = self.config.canvas_padding_x + self.config.level_padding_x;
            let mut x = start_x;
            let mut level_bounds: Option<Bounds> = None;
            let mut frames = Vec::with_capacity(nodes.len());

            for node in nodes {
                let id = self.create_frame(node, &env_index, x, y);
                self.extent = self.frames[id.0].bounds;
                self.bind_values(id, snapshot);

                let frame = &mut self.frames[id.0];
                frame.total_width = self.extent.right() - frame.bounds.x;
                x += frame.total_width + self.config.frame_margin_x;
                level_bounds = Some(match level_bounds {
                    Some(bounds) => bounds.union(&self.extent),
                    None => self.extent,
                });
                frames.push(id);
            }

            let bounds = level_bounds.unwrap_or(Bounds {
                x: start_x,
                y,
                width: 0.0,
                height: 0.0,
            });
            // Values may sit above the level's top edge (e.g. shared data); levels
            // are stacked by their lowest point
            let height = bounds.bottom() - y;
            self.levels.push(Level {
                depth,
                frames,
                bounds: Bounds {
                    x: start_x,
                    y,
                    width: bounds.right() - start_x,
                    height,
                },
            });
            y += height + self.config.frame_margin_y;
        }

        for warning in &self.warnings {
            tracing::warn!(step = snapshot.step, "{}", warning);
        }
        tracing::debug!(
            frames = self.frames.len(),
            values = self.values.len(),
            cached = self.cache.len(),
            "layout complete"
        );
    }

    fn create_frame(
        &mut self,
        node: NodeId,
        env_index: &FxHashMap<EnvId, &RuntimeEnv>,
        x: f64,
        y: f64,
    ) -> FrameId {
        let id = FrameId(self.frames.len());
        let tree_node = self.tree.node(node);
        let envs: Vec<&RuntimeEnv> = tree_node
            .merged
            .iter()
            .chain(tree_node.env.iter())
            .filter_map(|env| env_index.get(env).copied())
            .collect();
        let frame = Frame::new(
            id,
            node,
            tree_node.env,
            tree_node.is_root(),
            tree_node.predeclared_only,
            &envs,
            x,
            y,
            &self.config,
        );
        self.frames.push(frame);
        self.tree.node_mut(node).frame = Some(id);
        id
    }

    fn bind_values(&mut self, frame: FrameId, snapshot: &Snapshot) {
        for index in 0..self.frames[frame.0].bindings.len() {
            let Some(datum) = self.frames[frame.0].bindings[index].datum.clone() else {
                continue;
            };
            let target = self.get_or_create(&datum, Reference::Binding { frame, index }, snapshot);
            self.frames[frame.0].bindings[index].target = Some(target);
        }
    }

    /// Value for `datum` as seen from `reference`. Heap objects are memoized by
    /// identity: the first reference creates and places the value, later ones are
    /// only recorded. Primitives are created per reference.
    pub fn get_or_create(&mut self, datum: &Datum, reference: Reference, snapshot: &Snapshot) -> ValueId {
        let id = match datum {
            Datum::Primitive(p) => return self.create_primitive(p.to_string(), false, reference),
            Datum::Null => return self.create_primitive("null".to_string(), false, reference),
            Datum::Object(id) => *id,
        };

        if let Some(&cached) = self.cache.get(&id) {
            self.update_position(cached, reference);
            let value = &mut self.values[cached.0];
            value.add_reference(reference);
            tracing::debug!(datum = %id, references = value.referenced_by.len(), "identity cache hit");
            return cached;
        }

        match snapshot.object(id) {
            Some(HeapObject::Array(cells)) => self.create_array(id, cells, reference, snapshot),
            Some(HeapObject::Closure(closure)) => match self.tree.resolve(closure.env) {
                Some(node) => self.create_function(id, closure, node, reference),
                None => {
                    self.warnings.push(LayoutWarning::MalformedClosure {
                        datum: id,
                        env: closure.env,
                    });
                    self.create_primitive(closure.describe(), false, reference)
                }
            },
            None => {
                self.warnings.push(LayoutWarning::UnresolvedDatum { datum: id });
                let text = self.config.unknown_data.to_string();
                self.create_primitive(text, true, reference)
            }
        }
    }

    fn push_value(&mut self, datum: Option<DatumId>, kind: ValueKind, bounds: Bounds, reference: Reference) -> ValueId {
        let id = ValueId(self.values.len());
        self.values.push(Value {
            id,
            datum,
            kind,
            bounds,
            referenced_by: vec![reference],
            drawn: false,
        });
        if let Some(datum) = datum {
            self.cache.insert(datum, id);
        }
        self.extent = self.extent.union(&bounds);
        id
    }

    fn create_primitive(&mut self, text: String, placeholder: bool, reference: Reference) -> ValueId {
        let config = &self.config;
        let (text, bounds) = match reference {
            Reference::Binding { frame, index } => {
                let binding = &self.frames[frame.0].bindings[index].bounds;
                let text = truncate(&text, config.text_max_width - binding.width, config);
                let bounds = Bounds {
                    x: binding.right(),
                    y: binding.y + (binding.height - config.font_size) / 2.0,
                    width: text_width(&text, config),
                    height: config.font_size,
                };
                (text, bounds)
            }
            Reference::Unit { array, index } => {
                let unit = self.unit(array, index).map(|u| u.bounds).unwrap_or_default();
                let text = truncate(&text, unit.width - config.text_margin * 2.0, config);
                let width = text_width(&text, config);
                let bounds = Bounds {
                    x: unit.x + (unit.width - width) / 2.0,
                    y: unit.y + (unit.height - config.font_size) / 2.0,
                    width,
                    height: config.font_size,
                };
                (text, bounds)
            }
        };
        self.push_value(
            None,
            ValueKind::Primitive(PrimitiveValue { text, placeholder }),
            bounds,
            reference,
        )
    }

    fn create_array(&mut self, datum: DatumId, cells: &[Datum], reference: Reference, snapshot: &Snapshot) -> ValueId {
        let origin = self.data_origin(reference);
        let len = cells.len();
        let bounds = Bounds {
            x: origin.x,
            y: origin.y,
            width: (len as f64 * self.config.data_unit_width).max(self.config.data_min_width),
            height: self.config.data_unit_height,
        };
        let id = self.push_value(
            Some(datum),
            ValueKind::Array(ArrayValue { units: Vec::new() }),
            bounds,
            reference,
        );
        let units: Vec<ArrayUnit> = (0..len)
            .map(|index| ArrayUnit::new(index, id, len, origin, &self.config))
            .collect();
        if let ValueKind::Array(array) = &mut self.values[id.0].kind {
            array.units = units;
        }

        // The array is cached before its cells resolve, so a cell leading back to
        // it (or to any array still being built) stops here
        for (index, cell) in cells.iter().enumerate() {
            let content = match cell {
                Datum::Null => UnitContent::Null,
                cell => UnitContent::Value(self.get_or_create(cell, Reference::Unit { array: id, index }, snapshot)),
            };
            if let ValueKind::Array(array) = &mut self.values[id.0].kind {
                array.units[index].content = content;
            }
        }
        id
    }

    fn create_function(&mut self, datum: DatumId, closure: &Closure, enclosing: NodeId, reference: Reference) -> ValueId {
        let mut function = FnValue::new(closure, enclosing, &self.config);
        function.center = self.function_center(reference);
        let bounds = function.bounds_at(function.center);
        self.push_value(Some(datum), ValueKind::Function(function), bounds, reference)
    }

    /// Top-left corner for an array placed by `reference`: right of a binding's
    /// frame, right of a last cell, otherwise below the cell
    fn data_origin(&self, reference: Reference) -> Point {
        let config = &self.config;
        match reference {
            Reference::Binding { frame, index } => {
                let frame = &self.frames[frame.0];
                Point {
                    x: frame.bounds.right() + config.frame_margin_x / 4.0,
                    y: frame.bindings[index].bounds.y,
                }
            }
            Reference::Unit { array, index } => {
                let Some(unit) = self.unit(array, index) else {
                    return Point::default();
                };
                if unit.is_last {
                    Point {
                        x: unit.bounds.x + config.data_unit_width * 2.0,
                        y: unit.bounds.y,
                    }
                } else {
                    Point {
                        x: unit.bounds.x,
                        y: unit.bounds.y + self.values[array.0].bounds.height + config.data_unit_height,
                    }
                }
            }
        }
    }

    /// Center of a function glyph placed by `reference`
    fn function_center(&self, reference: Reference) -> Point {
        let config = &self.config;
        match reference {
            Reference::Binding { frame, index } => {
                let frame = &self.frames[frame.0];
                let x = frame.bounds.right() + config.frame_margin_x / 4.0;
                Point {
                    x: x + config.fn_radius * 2.0,
                    y: frame.bindings[index].arrow_start().y,
                }
            }
            Reference::Unit { .. } => {
                let origin = self.data_origin(reference);
                let is_last = matches!(reference, Reference::Unit { array, index } if self.unit(array, index).is_some_and(|u| u.is_last));
                Point {
                    x: origin.x + config.data_unit_width / 2.0,
                    y: if is_last {
                        origin.y + config.data_unit_height / 2.0
                    } else {
                        origin.y + config.fn_radius
                    },
                }
            }
        }
    }

    /// Re-anchor a function reached again through `reference` when that is the
    /// first binding seen in the frame it closes over. Runs while the frame is
    /// still being placed, so the moved glyph widens the frame's extent and
    /// right-hand siblings start past it.
    fn update_position(&mut self, id: ValueId, reference: Reference) {
        let Reference::Binding { frame, .. } = reference else {
            return;
        };
        let value = &self.values[id.0];
        let ValueKind::Function(function) = &value.kind else {
            return;
        };
        let enclosing = function.enclosing;
        let in_enclosing = |r: &Reference| matches!(r, Reference::Binding { frame, .. } if self.frames[frame.0].node == enclosing);
        if !in_enclosing(&reference) || value.referenced_by.iter().any(in_enclosing) {
            return;
        }

        let center = self.function_center(reference);
        let value = &mut self.values[id.0];
        if let ValueKind::Function(function) = &mut value.kind {
            function.center = center;
            value.bounds = function.bounds_at(center);
        }
        self.extent = self.extent.union(&self.values[id.0].bounds);
        tracing::debug!(value = id.0, frame = frame.0, "function moved next to its enclosing frame");
    }

    /// Cell `index` of the array value `array`, if `array` is one
    pub(crate) fn unit(&self, array: ValueId, index: usize) -> Option<&ArrayUnit> {
        match &self.values.get(array.0)?.kind {
            ValueKind::Array(a) => a.units.get(index),
            _ => None,
        }
    }

    pub(crate) fn next_key(&mut self) -> DrawKey {
        let key = DrawKey(self.next_key);
        self.next_key += 1;
        key
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tree(&self) -> &EnvTree {
        &self.tree
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame(&self, id: FrameId) -> &Frame {
        &self.frames[id.0]
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn value(&self, id: ValueId) -> &Value {
        &self.values[id.0]
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn warnings(&self) -> &[LayoutWarning] {
        &self.warnings
    }

    /// Step of the snapshot currently laid out
    pub fn step(&self) -> Option<usize> {
        self.step
    }

    /// Value memoized for a heap object in this cycle
    pub fn cached(&self, datum: DatumId) -> Option<ValueId> {
        self.cache.get(&datum).copied()
    }

    /// Frame drawn for an environment, following skips and merges
    pub fn frame_for_env(&self, env: EnvId) -> Option<FrameId> {
        self.tree.resolve(env).and_then(|node| self.tree.node(node).frame)
    }

    /// Binding named `name` in the frame drawn for `env`
    pub fn binding(&self, env: EnvId, name: &str) -> Option<&frame::Binding> {
        let frame = self.frame_for_env(env)?;
        self.frames[frame.0].bindings.iter().find(|b| b.name == name)
    }
}

impl Default for LayoutContext {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
