//! Hover state of the diagram view
//!
//! The terminal has no pointer over the canvas, so "hovering" is a cursor that
//! cycles through the functions of the diagram. The drawn glyph and tooltip are
//! represented by two overlay layers implementing [`DrawableHandle`]; the
//! diagram pane consults them when painting.

use crate::config::Config;
use crate::layout::draw::ShapeKind;
use crate::layout::value::DrawableHandle;
use crate::layout::{Diagram, LayoutContext, ValueId};
use ratatui::style::Color;

/// Stroke override for the circles of one function
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlyphLayer {
    pub owner: Option<ValueId>,
    pub stroke: Option<Color>,
}

impl DrawableHandle for GlyphLayer {
    fn show(&mut self) {}

    fn hide(&mut self) {}

    fn raise_to_front(&mut self) {}

    fn set_stroke(&mut self, color: Option<Color>) {
        self.stroke = color;
    }
}

/// Visibility and stacking of one function's tooltip
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TooltipLayer {
    pub owner: Option<ValueId>,
    pub visible: bool,
    pub raised: bool,
}

impl DrawableHandle for TooltipLayer {
    fn show(&mut self) {
        self.visible = true;
    }

    fn hide(&mut self) {
        self.visible = false;
        self.raised = false;
    }

    fn raise_to_front(&mut self) {
        self.raised = true;
    }

    fn set_stroke(&mut self, _color: Option<Color>) {}
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HoverState {
    pub glyph: GlyphLayer,
    pub tooltip: TooltipLayer,
}

impl HoverState {
    pub fn hovered(&self) -> Option<ValueId> {
        self.glyph.owner
    }

    /// Stroke to use for a circle owned by `owner`
    pub fn stroke_for(&self, owner: ValueId) -> Option<Color> {
        (self.glyph.owner == Some(owner)).then_some(self.glyph.stroke).flatten()
    }

    /// Whether the tooltip of `owner` is shown, overriding the diagram's default
    pub fn tooltip_visible(&self, owner: ValueId, default: bool) -> bool {
        default || (self.tooltip.owner == Some(owner) && self.tooltip.visible)
    }

    /// Leave the hovered function, if any
    pub fn leave(&mut self, context: &LayoutContext, printable: bool) {
        if let Some(owner) = self.glyph.owner {
            if let Some(function) = context.value(owner).as_function() {
                function.on_mouse_leave(printable, &mut self.glyph, &mut self.tooltip);
            }
        }
        if !printable {
            *self = HoverState::default();
        }
    }

    /// Move the hover to the next function of the diagram, wrapping around to
    /// no hover after the last one
    pub fn cycle(&mut self, diagram: &Diagram, context: &LayoutContext, config: &Config) {
        let functions = functions_of(diagram);
        let next = match self.hovered() {
            None => functions.first().copied(),
            Some(current) => functions
                .iter()
                .position(|&f| f == current)
                .and_then(|i| functions.get(i + 1).copied()),
        };

        self.leave(context, diagram.printable);
        let Some(next) = next else {
            return;
        };
        let Some(function) = context.value(next).as_function() else {
            return;
        };
        self.glyph.owner = Some(next);
        self.tooltip.owner = Some(next);
        function.on_mouse_enter(
            diagram.printable,
            config.palette(diagram.printable),
            &mut self.glyph,
            &mut self.tooltip,
        );
    }
}

/// Functions in the order their glyphs were drawn
pub fn functions_of(diagram: &Diagram) -> Vec<ValueId> {
    let mut functions: Vec<ValueId> = Vec::new();
    for shape in &diagram.shapes {
        if let ShapeKind::Circle { owner, .. } = shape.kind {
            if !functions.contains(&owner) {
                functions.push(owner);
            }
        }
    }
    functions
}
