//! Draw walk
//!
//! Turns a laid-out [`LayoutContext`] into a [`Diagram`]: a flat, ordered list of
//! keyed shapes a renderer can paint without knowing anything about frames or
//! values. Every frame, binding and value is emitted at most once per cycle; every
//! reference to a non-primitive value gets its own connector.

use super::arrow::{ArrowRouter, Route};
use super::text::text_width;
use super::value::{UnitContent, ValueKind};
use super::{Bounds, FrameId, LayoutContext, Point, Reference, ValueId};
use crate::config::{Config, Palette};
use crate::errors::LayoutWarning;
use ratatui::style::Color;

/// Stable identifier of a shape within one draw cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DrawKey(pub u64);

/// What a rectangle stands for
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RectRole {
    Frame(FrameId),
    Cell { array: ValueId, index: usize },
}

/// What a text label stands for
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TextRole {
    FrameLabel(FrameId),
    BindingKey { frame: FrameId, index: usize },
    Literal(ValueId),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArrowSource {
    Reference(Reference),
    /// A function pointing at its enclosing frame
    Function(ValueId),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArrowTarget {
    Value(ValueId),
    Frame(FrameId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Connector {
    pub source: ArrowSource,
    pub target: ArrowTarget,
    pub route: Route,
    pub color: Color,
    pub stroke_width: f64,
    pub head_size: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShapeKind {
    Rect {
        bounds: Bounds,
        /// Top-left, top-right, bottom-right, bottom-left
        corners: [f64; 4],
        stroke: Color,
        role: RectRole,
    },
    /// `at` is the top-left corner of the first line
    Text {
        at: Point,
        text: String,
        color: Color,
        role: TextRole,
    },
    Circle {
        center: Point,
        radius: f64,
        stroke: Color,
        fill: Option<Color>,
        owner: ValueId,
    },
    Line {
        from: Point,
        to: Point,
        color: Color,
    },
    Tooltip {
        at: Point,
        text: String,
        width: f64,
        visible: bool,
        fill: Color,
        color: Color,
        opacity: f64,
        owner: ValueId,
    },
    Connector(Connector),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub key: DrawKey,
    pub kind: ShapeKind,
}

impl Shape {
    /// Area the shape covers, if it takes up room on the canvas
    fn extent(&self, config: &Config) -> Option<Bounds> {
        match &self.kind {
            ShapeKind::Rect { bounds, .. } => Some(*bounds),
            ShapeKind::Text { at, text, .. } => Some(Bounds {
                x: at.x,
                y: at.y,
                width: text_width(text, config),
                height: text.lines().count().max(1) as f64 * config.font_size,
            }),
            ShapeKind::Circle { center, radius, .. } => Some(Bounds {
                x: center.x - radius,
                y: center.y - radius,
                width: radius * 2.0,
                height: radius * 2.0,
            }),
            ShapeKind::Line { from, to, .. } => Some(span(&[*from, *to])),
            ShapeKind::Tooltip {
                at,
                text,
                width,
                visible: true,
                ..
            } => Some(Bounds {
                x: at.x,
                y: at.y,
                width: *width,
                height: text.lines().count().max(1) as f64 * config.font_size,
            }),
            ShapeKind::Tooltip { .. } => None,
            ShapeKind::Connector(connector) => Some(span(&connector.route.points)),
        }
    }
}

fn span(points: &[Point]) -> Bounds {
    let min_x = points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let min_y = points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let max_x = points.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
    let max_y = points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
    Bounds {
        x: min_x,
        y: min_y,
        width: max_x - min_x,
        height: max_y - min_y,
    }
}

/// Output of one draw cycle
#[derive(Debug, Clone, PartialEq)]
pub struct Diagram {
    pub step: Option<usize>,
    pub printable: bool,
    pub width: f64,
    pub height: f64,
    pub background: Color,
    pub shapes: Vec<Shape>,
    pub warnings: Vec<LayoutWarning>,
}

impl Diagram {
    pub fn connectors(&self) -> impl Iterator<Item = &Connector> {
        self.shapes.iter().filter_map(|shape| match &shape.kind {
            ShapeKind::Connector(connector) => Some(connector),
            _ => None,
        })
    }

    /// Number of arrows ending on a value
    pub fn arrows_into(&self, value: ValueId) -> usize {
        self.connectors()
            .filter(|c| c.target == ArrowTarget::Value(value))
            .count()
    }

    pub fn shape(&self, key: DrawKey) -> Option<&Shape> {
        self.shapes.iter().find(|shape| shape.key == key)
    }

    /// Factor that fits the diagram in the export limits, at most 1
    pub fn export_scale(&self, config: &Config) -> f64 {
        (config.max_export_width / self.width)
            .min(config.max_export_height / self.height)
            .min(1.0)
    }
}

/// Per-cycle drawing state
struct Painter {
    shapes: Vec<Shape>,
    router: ArrowRouter,
    palette: Palette,
    printable: bool,
}

impl LayoutContext {
    /// Emit the laid-out snapshot as shapes. Only drawn flags are reset, so this
    /// can be called again (e.g. to switch palettes) without a new layout.
    pub fn draw(&mut self, printable: bool) -> Diagram {
        let _span = tracing::info_span!("env_draw", step = ?self.step, printable).entered();
        for value in &mut self.values {
            value.reset_drawn();
        }
        for frame in &mut self.frames {
            frame.reset();
        }
        self.next_key = 0;

        let mut painter = Painter {
            shapes: Vec::new(),
            router: ArrowRouter::new(&self.config),
            palette: *self.config.palette(printable),
            printable,
        };
        let frames: Vec<FrameId> = self.levels.iter().flat_map(|level| level.frames.iter().copied()).collect();
        for frame in frames {
            self.draw_frame(frame, &mut painter);
        }

        let extent = painter
            .shapes
            .iter()
            .filter_map(|shape| shape.extent(&self.config))
            .reduce(|a, b| a.union(&b))
            .unwrap_or_default();
        let width = (extent.right() + self.config.canvas_padding_x).max(self.config.canvas_min_width);
        let height = (extent.bottom() + self.config.canvas_padding_y).max(self.config.canvas_min_height);

        let mut warnings = self.warnings.clone();
        if printable && (width > self.config.max_export_width || height > self.config.max_export_height) {
            let scale = (self.config.max_export_width / width).min(self.config.max_export_height / height);
            let warning = LayoutWarning::OversizedExport { width, height, scale };
            tracing::warn!("{}", warning);
            warnings.push(warning);
        }

        tracing::debug!(shapes = painter.shapes.len(), width, height, "draw complete");
        Diagram {
            step: self.step,
            printable,
            width,
            height,
            background: painter.palette.background,
            shapes: painter.shapes,
            warnings,
        }
    }

    fn emit(&mut self, painter: &mut Painter, kind: ShapeKind) {
        let key = self.next_key();
        painter.shapes.push(Shape { key, kind });
    }

    fn draw_frame(&mut self, id: FrameId, painter: &mut Painter) {
        let palette = painter.palette;
        let frame = &mut self.frames[id.0];
        if frame.drawn {
            return;
        }
        frame.drawn = true;
        let (bounds, label, count) = (frame.bounds, frame.label.clone(), frame.bindings.len());

        let label_at = Point {
            x: bounds.x,
            y: bounds.y - self.config.font_size - self.config.text_margin,
        };
        let radius = self.config.frame_corner_radius;
        self.emit(
            painter,
            ShapeKind::Text {
                at: label_at,
                text: label,
                color: palette.text,
                role: TextRole::FrameLabel(id),
            },
        );
        self.emit(
            painter,
            ShapeKind::Rect {
                bounds,
                corners: [radius; 4],
                stroke: palette.stroke,
                role: RectRole::Frame(id),
            },
        );
        for index in 0..count {
            self.draw_binding(id, index, painter);
        }
    }

    fn draw_binding(&mut self, frame: FrameId, index: usize, painter: &mut Painter) {
        let palette = painter.palette;
        let binding = &mut self.frames[frame.0].bindings[index];
        if binding.drawn {
            return;
        }
        binding.drawn = true;
        let (bounds, key_text, target, start) = (binding.bounds, binding.key_text.clone(), binding.target, binding.arrow_start());

        self.emit(
            painter,
            ShapeKind::Text {
                at: Point {
                    x: bounds.x,
                    y: bounds.y + (bounds.height - self.config.font_size) / 2.0,
                },
                text: key_text,
                color: palette.text,
                role: TextRole::BindingKey { frame, index },
            },
        );

        let Some(target) = target else {
            return;
        };
        self.draw_value(target, painter);
        if self.values[target.0].is_primitive() {
            return;
        }
        let value = &self.values[target.0];
        let route = painter
            .router
            .route_to_bounds(start, value.bounds, value.entry_point().y);
        self.emit_connector(
            painter,
            ArrowSource::Reference(Reference::Binding { frame, index }),
            ArrowTarget::Value(target),
            route,
            self.config.arrow_stroke_width,
        );
    }

    fn emit_connector(&mut self, painter: &mut Painter, source: ArrowSource, target: ArrowTarget, route: Route, stroke_width: f64) {
        let connector = Connector {
            source,
            target,
            route,
            color: painter.palette.stroke,
            stroke_width,
            head_size: self.config.arrow_head_size,
        };
        self.emit(painter, ShapeKind::Connector(connector));
    }

    fn draw_value(&mut self, id: ValueId, painter: &mut Painter) {
        let (palette, printable) = (painter.palette, painter.printable);
        let value = &mut self.values[id.0];
        if value.drawn {
            return;
        }
        value.drawn = true;
        let bounds = value.bounds;

        match value.kind.clone() {
            ValueKind::Primitive(primitive) => {
                let color = if primitive.placeholder {
                    palette.placeholder
                } else {
                    palette.text
                };
                self.emit(
                    painter,
                    ShapeKind::Text {
                        at: Point { x: bounds.x, y: bounds.y },
                        text: primitive.text,
                        color,
                        role: TextRole::Literal(id),
                    },
                );
            }
            ValueKind::Array(array) => {
                let radius = self.config.data_corner_radius;
                for unit in &array.units {
                    let left = if unit.is_first { radius } else { 0.0 };
                    let right = if unit.is_last { radius } else { 0.0 };
                    self.emit(
                        painter,
                        ShapeKind::Rect {
                            bounds: unit.bounds,
                            corners: [left, right, right, left],
                            stroke: palette.stroke,
                            role: RectRole::Cell { array: id, index: unit.index },
                        },
                    );
                    if let ValueKind::Array(a) = &mut self.values[id.0].kind {
                        a.units[unit.index].drawn = true;
                    }

                    let target = match unit.content {
                        UnitContent::Null => {
                            self.emit(
                                painter,
                                ShapeKind::Line {
                                    from: Point { x: unit.bounds.x, y: unit.bounds.bottom() },
                                    to: Point { x: unit.bounds.right(), y: unit.bounds.y },
                                    color: palette.stroke,
                                },
                            );
                            continue;
                        }
                        UnitContent::Value(target) => target,
                    };
                    self.draw_value(target, painter);
                    if self.values[target.0].is_primitive() {
                        continue;
                    }
                    let route = if target == id {
                        painter.router.route_loop(unit.center(), bounds)
                    } else {
                        let value = &self.values[target.0];
                        painter
                            .router
                            .route_to_bounds(unit.center(), value.bounds, value.entry_point().y)
                    };
                    self.emit_connector(
                        painter,
                        ArrowSource::Reference(Reference::Unit { array: id, index: unit.index }),
                        ArrowTarget::Value(target),
                        route,
                        self.config.arrow_stroke_width,
                    );
                }
            }
            ValueKind::Function(function) => {
                let (left, right) = function.circle_centers();
                for center in [left, right] {
                    self.emit(
                        painter,
                        ShapeKind::Circle {
                            center,
                            radius: function.radius,
                            stroke: palette.stroke,
                            fill: None,
                            owner: id,
                        },
                    );
                    self.emit(
                        painter,
                        ShapeKind::Circle {
                            center,
                            radius: function.inner_radius,
                            stroke: palette.stroke,
                            fill: Some(palette.stroke),
                            owner: id,
                        },
                    );
                }

                let (text, width) = if printable {
                    (function.export_tooltip.clone(), function.export_tooltip_width)
                } else {
                    (function.tooltip.clone(), function.tooltip_width)
                };
                self.emit(
                    painter,
                    ShapeKind::Tooltip {
                        at: function.tooltip_origin(&self.config),
                        text,
                        width,
                        visible: printable,
                        fill: palette.tooltip_fill,
                        color: palette.tooltip_text,
                        opacity: self.config.fn_tooltip_opacity,
                        owner: id,
                    },
                );

                if let Some(frame) = self.tree.node(function.enclosing).frame {
                    let route = painter
                        .router
                        .route_to_frame(right, self.frames[frame.0].bounds);
                    self.emit_connector(
                        painter,
                        ArrowSource::Function(id),
                        ArrowTarget::Frame(frame),
                        route,
                        self.config.frame_arrow_stroke_width,
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_CONFIG;
    use crate::snapshot::{Datum, RuntimeEnv, Snapshot};

    fn null_array() -> Snapshot {
        Snapshot::new(0)
            .with_env(RuntimeEnv::new(0, "global", None).bind("x", Datum::object(7)))
            .with_array(7, vec![Datum::number(1.0), Datum::Null])
    }

    #[test]
    fn test_keys_are_sequential() {
        let mut ctx = LayoutContext::new(DEFAULT_CONFIG);
        let diagram = ctx.redraw(&null_array(), false);
        let keys: Vec<u64> = diagram.shapes.iter().map(|s| s.key.0).collect();
        assert_eq!(keys, (0..diagram.shapes.len() as u64).collect::<Vec<_>>());
    }

    #[test]
    fn test_cell_corners_and_null_line() {
        let mut ctx = LayoutContext::new(DEFAULT_CONFIG);
        let diagram = ctx.redraw(&null_array(), false);
        let r = DEFAULT_CONFIG.data_corner_radius;

        let cells: Vec<[f64; 4]> = diagram
            .shapes
            .iter()
            .filter_map(|s| match &s.kind {
                ShapeKind::Rect {
                    corners,
                    role: RectRole::Cell { .. },
                    ..
                } => Some(*corners),
                _ => None,
            })
            .collect();
        assert_eq!(cells, vec![[r, 0.0, 0.0, r], [0.0, r, r, 0.0]]);

        let lines = diagram
            .shapes
            .iter()
            .filter(|s| matches!(s.kind, ShapeKind::Line { .. }))
            .count();
        assert_eq!(lines, 1);
    }

    #[test]
    fn test_redraw_without_layout_switches_palette() {
        let mut ctx = LayoutContext::new(DEFAULT_CONFIG);
        let interactive = ctx.redraw(&null_array(), false);
        let printable = ctx.draw(true);

        assert_eq!(interactive.shapes.len(), printable.shapes.len());
        assert_eq!(printable.background, DEFAULT_CONFIG.printable.background);
        assert_eq!(ctx.draw(false), interactive);
    }

    #[test]
    fn test_minimum_canvas_size() {
        let mut ctx = LayoutContext::new(DEFAULT_CONFIG);
        let diagram = ctx.redraw(&Snapshot::new(0).with_env(RuntimeEnv::new(0, "global", None)), false);
        assert!(diagram.width >= DEFAULT_CONFIG.canvas_min_width);
        assert!(diagram.height >= DEFAULT_CONFIG.canvas_min_height);
        assert_eq!(diagram.export_scale(&DEFAULT_CONFIG), 1.0);
    }
}
