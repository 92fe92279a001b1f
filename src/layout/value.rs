//! Values: the rendered form of runtime data
//!
//! - [`PrimitiveValue`]: a literal drawn inline; no outgoing edges
//! - [`ArrayValue`]: a row of [`ArrayUnit`] cells, each holding a value or null
//! - [`FnValue`]: a closure, drawn as two circles with an arrow to the frame it
//!   closes over
//!
//! Every value records the references (bindings and array cells) pointing at it.
//! The first one is the main reference and decides where the value is placed.

use super::text::text_width;
use super::tree::NodeId;
use super::{Bounds, Point, Reference, ValueId};
use crate::config::{Config, Palette};
use crate::snapshot::{Closure, DatumId};
use ratatui::style::Color;

/// Show/hide/raise access to something a renderer has drawn. Hover handling
/// only talks to shapes through this trait.
pub trait DrawableHandle {
    fn show(&mut self);
    fn hide(&mut self);
    fn raise_to_front(&mut self);
    /// `None` restores the default stroke
    fn set_stroke(&mut self, color: Option<Color>);
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveValue {
    pub text: String,
    /// Stands in for data that could not be resolved
    pub placeholder: bool,
}

/// What a cell holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitContent {
    Null,
    Value(ValueId),
}

/// One cell of an array
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayUnit {
    pub index: usize,
    pub array: ValueId,
    pub content: UnitContent,
    pub is_first: bool,
    pub is_last: bool,
    pub bounds: Bounds,
    pub(crate) drawn: bool,
}

impl ArrayUnit {
    pub(crate) fn new(index: usize, array: ValueId, len: usize, origin: Point, config: &Config) -> Self {
        ArrayUnit {
            index,
            array,
            content: UnitContent::Null,
            is_first: index == 0,
            is_last: index + 1 == len,
            bounds: Bounds {
                x: origin.x + index as f64 * config.data_unit_width,
                y: origin.y,
                width: config.data_unit_width,
                height: config.data_unit_height,
            },
            drawn: false,
        }
    }

    pub fn center(&self) -> Point {
        self.bounds.center()
    }

    pub fn is_drawn(&self) -> bool {
        self.drawn
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayValue {
    pub units: Vec<ArrayUnit>,
}

/// A closure value
#[derive(Debug, Clone, PartialEq)]
pub struct FnValue {
    pub name: String,
    pub params_text: String,
    pub body_text: String,
    pub export_body_text: String,
    pub tooltip: String,
    pub export_tooltip: String,
    pub tooltip_width: f64,
    pub export_tooltip_width: f64,
    /// Node of the frame this closure closes over
    pub enclosing: NodeId,
    pub center: Point,
    pub radius: f64,
    pub inner_radius: f64,
}

impl FnValue {
    pub(crate) fn new(closure: &Closure, enclosing: NodeId, config: &Config) -> Self {
        let params_text = format!("params: ({})", closure.params.join(", "));
        let body_text = format!("body: {}", closure.body);
        let export_body_text = shorten_body(&body_text);
        let tooltip = format!("{}\n{}", params_text, body_text);
        let export_tooltip = format!("{}\n{}", params_text, export_body_text);
        FnValue {
            name: closure.name.clone(),
            tooltip_width: text_width(&params_text, config).max(text_width(&body_text, config)),
            export_tooltip_width: text_width(&params_text, config).max(text_width(&export_body_text, config)),
            params_text,
            body_text,
            export_body_text,
            tooltip,
            export_tooltip,
            enclosing,
            center: Point::default(),
            radius: config.fn_radius,
            inner_radius: config.fn_inner_radius,
        }
    }

    /// Bounding box of both circles around `center`
    pub fn bounds_at(&self, center: Point) -> Bounds {
        Bounds {
            x: center.x - 2.0 * self.radius,
            y: center.y - self.radius,
            width: 4.0 * self.radius,
            height: 2.0 * self.radius,
        }
    }

    /// Centers of the left and right circles
    pub fn circle_centers(&self) -> (Point, Point) {
        (
            Point {
                x: self.center.x - self.radius,
                y: self.center.y,
            },
            Point {
                x: self.center.x + self.radius,
                y: self.center.y,
            },
        )
    }

    /// Where the tooltip label sits
    pub fn tooltip_origin(&self, config: &Config) -> Point {
        Point {
            x: self.center.x + 2.0 * self.radius + config.text_padding_x * 2.0,
            y: self.center.y - config.text_padding_y,
        }
    }

    pub fn on_mouse_enter(
        &self,
        printable: bool,
        palette: &Palette,
        glyph: &mut dyn DrawableHandle,
        label: &mut dyn DrawableHandle,
    ) {
        if printable {
            return;
        }
        label.raise_to_front();
        label.show();
        glyph.set_stroke(Some(palette.hovered));
    }

    pub fn on_mouse_leave(
        &self,
        printable: bool,
        glyph: &mut dyn DrawableHandle,
        label: &mut dyn DrawableHandle,
    ) {
        if printable {
            return;
        }
        label.hide();
        glyph.set_stroke(None);
    }
}

/// Body text for exports: at most two lines of the first 20 characters
fn shorten_body(body_text: &str) -> String {
    let head: String = if body_text.chars().count() > 23 {
        body_text.chars().take(20).collect()
    } else {
        body_text.to_string()
    };
    let mut short = head.split('\n').take(2).collect::<Vec<_>>().join("\n");
    short.push_str(" ...");
    short
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValueKind {
    Primitive(PrimitiveValue),
    Array(ArrayValue),
    Function(FnValue),
}

/// A value owned by the layout context's arena
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub id: ValueId,
    /// Identity of the runtime object; `None` for primitives
    pub datum: Option<DatumId>,
    pub kind: ValueKind,
    pub bounds: Bounds,
    pub referenced_by: Vec<Reference>,
    pub(crate) drawn: bool,
}

impl Value {
    /// Reference that anchors this value's position
    pub fn main_reference(&self) -> Option<Reference> {
        self.referenced_by.first().copied()
    }

    pub fn add_reference(&mut self, reference: Reference) {
        self.referenced_by.push(reference);
    }

    pub fn is_drawn(&self) -> bool {
        self.drawn
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self.kind, ValueKind::Primitive(_))
    }

    pub fn as_array(&self) -> Option<&ArrayValue> {
        match &self.kind {
            ValueKind::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FnValue> {
        match &self.kind {
            ValueKind::Function(function) => Some(function),
            _ => None,
        }
    }

    /// Point where incoming arrows land
    pub fn entry_point(&self) -> Point {
        match &self.kind {
            ValueKind::Function(function) => Point {
                x: self.bounds.x,
                y: function.center.y,
            },
            _ => Point {
                x: self.bounds.x,
                y: self.bounds.y + self.bounds.height / 2.0,
            },
        }
    }

    /// Back to undrawn with no references, ready for a new cycle
    pub fn reset(&mut self) {
        self.drawn = false;
        self.referenced_by.clear();
        self.reset_drawn();
    }

    /// Back to undrawn, keeping references
    pub(crate) fn reset_drawn(&mut self) {
        self.drawn = false;
        if let ValueKind::Array(array) = &mut self.kind {
            for unit in &mut array.units {
                unit.drawn = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_CONFIG;
    use crate::snapshot::EnvId;

    #[derive(Default)]
    struct Recorder {
        visible: bool,
        raised: bool,
        stroke: Option<Color>,
    }

    impl DrawableHandle for Recorder {
        fn show(&mut self) {
            self.visible = true;
        }
        fn hide(&mut self) {
            self.visible = false;
        }
        fn raise_to_front(&mut self) {
            self.raised = true;
        }
        fn set_stroke(&mut self, color: Option<Color>) {
            self.stroke = color;
        }
    }

    fn closure(body: &str) -> Closure {
        Closure {
            name: "f".to_string(),
            params: vec!["a".to_string(), "b".to_string()],
            body: body.to_string(),
            env: EnvId(0),
        }
    }

    #[test]
    fn test_tooltip_texts() {
        let f = FnValue::new(&closure("return a + b;"), 0, &DEFAULT_CONFIG);
        assert_eq!(f.tooltip, "params: (a, b)\nbody: return a + b;");
        assert_eq!(f.export_body_text, "body: return a + b; ...");

        let long = FnValue::new(&closure("{\n  const c = a * b;\n  return c;\n}"), 0, &DEFAULT_CONFIG);
        assert_eq!(long.export_body_text, "body: {\n  const c =  ...");
    }

    #[test]
    fn test_tooltip_width_is_widest_of_params_and_body() {
        let w = DEFAULT_CONFIG.char_width;
        let short = FnValue::new(&closure("a"), 0, &DEFAULT_CONFIG);
        // "params: (a, b)" is wider than "body: a"
        assert_eq!(short.tooltip_width, 14.0 * w);
        assert_eq!(short.export_tooltip_width, 14.0 * w);

        let long = FnValue::new(&closure("{\n  const c = a * b;\n  return c;\n}"), 0, &DEFAULT_CONFIG);
        // "  const c = a * b;" and, once shortened, "  const c =  ..."
        assert_eq!(long.tooltip_width, 18.0 * w);
        assert_eq!(long.export_tooltip_width, 16.0 * w);
    }

    #[test]
    fn test_hover_is_noop_when_printable() {
        let f = FnValue::new(&closure("a"), 0, &DEFAULT_CONFIG);
        let palette = DEFAULT_CONFIG.palette(false);
        let (mut glyph, mut label) = (Recorder::default(), Recorder::default());

        f.on_mouse_enter(true, palette, &mut glyph, &mut label);
        assert!(!label.visible);

        f.on_mouse_enter(false, palette, &mut glyph, &mut label);
        assert!(label.visible && label.raised);
        assert_eq!(glyph.stroke, Some(palette.hovered));

        f.on_mouse_leave(false, &mut glyph, &mut label);
        assert!(!label.visible);
        assert_eq!(glyph.stroke, None);
    }
}
