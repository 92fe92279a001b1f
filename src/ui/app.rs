//! Viewer state and event loop

use crate::config::Config;
use crate::layout::{Diagram, LayoutContext};
use crate::snapshot::SnapshotHistory;
use crate::ui::hover::HoverState;
use crate::ui::panes::{render_diagram_pane, render_status_bar, StatusRenderData};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;

/// The main application state
pub struct App {
    pub history: SnapshotHistory,

    /// Layout of the current snapshot
    pub context: LayoutContext,

    /// Last drawn diagram; `None` when the history is empty
    pub diagram: Option<Diagram>,

    pub printable: bool,

    pub hover: HoverState,

    /// Name shown in the pane title
    pub title: String,

    /// Whether the app should quit
    pub should_quit: bool,

    /// Status message to display
    pub status_message: String,
}

impl App {
    pub fn new(history: SnapshotHistory, config: Config, title: String) -> Self {
        let mut app = App {
            history,
            context: LayoutContext::new(config),
            diagram: None,
            printable: false,
            hover: HoverState::default(),
            title,
            should_quit: false,
            status_message: String::from("Ready!"),
        };
        app.relayout();
        app
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }

        Ok(())
    }

    fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(frame.area());

        render_diagram_pane(
            frame,
            chunks[0],
            self.diagram.as_ref(),
            &self.hover,
            &self.title,
            self.context.config().font_size,
        );

        render_status_bar(
            frame,
            chunks[1],
            &StatusRenderData {
                message: &self.status_message,
                current_step: self.history.position(),
                total_steps: self.history.len(),
                printable: self.printable,
                warnings: self.diagram.as_ref().map_or(0, |d| d.warnings.len()),
            },
        );
    }

    /// Handle keyboard events
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }
            KeyCode::Right | KeyCode::Char('l') => self.step_forward(),
            KeyCode::Left | KeyCode::Char('h') => self.step_backward(),
            KeyCode::Char('p') => self.toggle_printable(),
            KeyCode::Char('f') => self.cycle_hover(),
            KeyCode::Enter => {
                self.history.jump_to_end();
                self.relayout();
                self.status_message = "Jumped to end".to_string();
            }
            KeyCode::Backspace => {
                self.history.rewind();
                self.relayout();
                self.status_message = "Jumped to start".to_string();
            }
            _ => {}
        }
    }

    /// Lay out and draw the current snapshot from scratch
    fn relayout(&mut self) {
        self.hover = HoverState::default();
        self.diagram = self
            .history
            .current()
            .map(|snapshot| self.context.redraw(snapshot, self.printable));
    }

    fn step_forward(&mut self) {
        match self.history.step_forward() {
            Ok(_) => {
                self.relayout();
                self.status_message = "Stepped forward".to_string();
            }
            Err(e) => {
                self.status_message = format!("Cannot step forward: {}", e);
            }
        }
    }

    fn step_backward(&mut self) {
        match self.history.step_backward() {
            Ok(_) => {
                self.relayout();
                self.status_message = "Stepped backward".to_string();
            }
            Err(e) => {
                self.status_message = format!("Cannot step backward: {}", e);
            }
        }
    }

    /// Switch palettes. Geometry does not change, so only the draw walk reruns.
    fn toggle_printable(&mut self) {
        if self.diagram.is_none() {
            return;
        }
        self.hover.leave(&self.context, self.printable);
        self.hover = HoverState::default();
        self.printable = !self.printable;
        let diagram = self.context.draw(self.printable);
        self.status_message = match diagram.warnings.last() {
            Some(warning) if self.printable => format!("Printable mode: {}", warning),
            _ if self.printable => "Printable mode".to_string(),
            _ => "Interactive mode".to_string(),
        };
        self.diagram = Some(diagram);
    }

    fn cycle_hover(&mut self) {
        let Some(diagram) = &self.diagram else {
            return;
        };
        self.hover.cycle(diagram, &self.context, self.context.config());
        self.status_message = match self.hover.hovered().and_then(|id| self.context.value(id).as_function()) {
            Some(function) => format!("Hovering {}", function.name),
            None => "No function hovered".to_string(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_CONFIG;
    use crate::demo;
    use crossterm::event::KeyModifiers;

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key_event(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn counter_app() -> App {
        let history = demo::history("counter", usize::MAX).unwrap().unwrap();
        App::new(history, DEFAULT_CONFIG, "counter".to_string())
    }

    #[test]
    fn test_stepping_relays_out() {
        let mut app = counter_app();
        assert_eq!(app.diagram.as_ref().and_then(|d| d.step), Some(0));

        press(&mut app, KeyCode::Right);
        assert_eq!(app.diagram.as_ref().and_then(|d| d.step), Some(1));

        press(&mut app, KeyCode::Char('h'));
        press(&mut app, KeyCode::Left);
        assert_eq!(app.history.position(), 0);
        assert!(app.status_message.starts_with("Cannot step backward"));
    }

    #[test]
    fn test_printable_toggle_keeps_geometry() {
        let mut app = counter_app();
        press(&mut app, KeyCode::Enter);
        let before = app.diagram.clone().unwrap();

        press(&mut app, KeyCode::Char('p'));
        let after = app.diagram.clone().unwrap();
        assert!(after.printable);
        assert_eq!(before.shapes.len(), after.shapes.len());
        assert_eq!(after.background, DEFAULT_CONFIG.printable.background);
    }

    #[test]
    fn test_quit() {
        let mut app = counter_app();
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }
}
