//! Diagram pane: paints a [`Diagram`] on a ratatui canvas
//!
//! Diagram coordinates grow downwards, canvas coordinates upwards, so every y is
//! flipped against the diagram height. The whole diagram is fitted into the
//! pane; rounded corners, fills and opacity have no terminal equivalent and are
//! dropped.

use crate::layout::draw::{Connector, ShapeKind};
use crate::layout::{Diagram, Point};
use crate::ui::hover::HoverState;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    symbols::Marker,
    text::Span,
    widgets::{
        canvas::{Canvas, Circle, Context, Line as CanvasLine, Rectangle},
        Block, Borders, Paragraph,
    },
    Frame,
};

/// Render the diagram pane
pub fn render_diagram_pane(
    frame: &mut Frame,
    area: Rect,
    diagram: Option<&Diagram>,
    hover: &HoverState,
    title: &str,
    font_size: f64,
) {
    let block = Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(DEFAULT_THEME.border));

    let Some(diagram) = diagram else {
        let paragraph = Paragraph::new("(no snapshot)")
            .block(block)
            .style(Style::default().fg(DEFAULT_THEME.comment));
        frame.render_widget(paragraph, area);
        return;
    };

    let height = diagram.height;
    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .background_color(diagram.background)
        .x_bounds([0.0, diagram.width])
        .y_bounds([0.0, height])
        .paint(|ctx| paint(ctx, diagram, hover, font_size));
    frame.render_widget(canvas, area);
}

fn paint(ctx: &mut Context, diagram: &Diagram, hover: &HoverState, font_size: f64) {
    let height = diagram.height;
    let flip = |p: Point| (p.x, height - p.y);
    let mut raised = Vec::new();

    for shape in &diagram.shapes {
        match &shape.kind {
            ShapeKind::Rect { bounds, stroke, .. } => ctx.draw(&Rectangle {
                x: bounds.x,
                y: height - bounds.bottom(),
                width: bounds.width,
                height: bounds.height,
                color: *stroke,
            }),
            ShapeKind::Text { at, text, color, .. } => {
                print_lines(ctx, flip(*at), text, Style::default().fg(*color), font_size);
            }
            ShapeKind::Circle {
                center,
                radius,
                stroke,
                owner,
                ..
            } => {
                let (x, y) = flip(*center);
                ctx.draw(&Circle {
                    x,
                    y,
                    radius: *radius,
                    color: hover.stroke_for(*owner).unwrap_or(*stroke),
                });
            }
            ShapeKind::Line { from, to, color } => {
                let ((x1, y1), (x2, y2)) = (flip(*from), flip(*to));
                ctx.draw(&CanvasLine::new(x1, y1, x2, y2, *color));
            }
            ShapeKind::Tooltip {
                at,
                text,
                visible,
                color,
                owner,
                ..
            } => {
                if !hover.tooltip_visible(*owner, *visible) {
                    continue;
                }
                if hover.tooltip.owner == Some(*owner) && hover.tooltip.raised {
                    raised.push((flip(*at), text, *color));
                    continue;
                }
                print_lines(ctx, flip(*at), text, Style::default().fg(*color), font_size);
            }
            ShapeKind::Connector(connector) => draw_connector(ctx, connector, height),
        }
    }

    // Raised tooltips go on a layer of their own, above everything else
    if !raised.is_empty() {
        ctx.layer();
        for (at, text, color) in raised {
            let style = Style::default().fg(color).add_modifier(Modifier::BOLD);
            print_lines(ctx, at, text, style, font_size);
        }
    }
}

fn print_lines(ctx: &mut Context, at: (f64, f64), text: &str, style: Style, font_size: f64) {
    for (i, line) in text.lines().enumerate() {
        ctx.print(at.0, at.1 - i as f64 * font_size, Span::styled(line.to_string(), style));
    }
}

fn draw_connector(ctx: &mut Context, connector: &Connector, height: f64) {
    let points = &connector.route.points;
    for pair in points.windows(2) {
        ctx.draw(&CanvasLine::new(
            pair[0].x,
            height - pair[0].y,
            pair[1].x,
            height - pair[1].y,
            connector.color,
        ));
    }
    if let [.., before, tip] = points.as_slice() {
        for barb in arrowhead(*before, *tip, connector.head_size) {
            ctx.draw(&CanvasLine::new(
                tip.x,
                height - tip.y,
                barb.x,
                height - barb.y,
                connector.color,
            ));
        }
    }
}

/// Ends of the two barbs of an arrowhead at `tip`, coming from `before`
pub fn arrowhead(before: Point, tip: Point, size: f64) -> [Point; 2] {
    let angle = (tip.y - before.y).atan2(tip.x - before.x);
    let spread = std::f64::consts::FRAC_PI_6;
    [angle + spread, angle - spread].map(|a| Point {
        x: tip.x - size * a.cos(),
        y: tip.y - size * a.sin(),
    })
}
