use crate::error::Result;
use crate::storage::TraceReader;
use crate::trace::TraceIndex;
use crate::viewport::{
    PanDirection, PositionChanged, ScreenPoint, ScreenRect, ViewController, ZoomAxes,
    ZoomDirection, is_misclick, wheel_delta,
};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, prelude::*};
use std::io::{self, stdout};
use std::time::Duration;

use super::ui;

/// Wheel delta of one notch on a typical mouse
const WHEEL_NOTCH: i32 = 120;

/// What an in-progress mouse drag does on release
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DragKind {
    Pan,
    Select,
    Zoom(ZoomDirection),
}

#[derive(Clone, Copy, Debug)]
struct Drag {
    kind: DragKind,
    start: ScreenPoint,
    last: ScreenPoint,
}

/// Drag started by pressing `button`, or `None` for buttons the viewer ignores
fn drag_kind(button: MouseButton, modifiers: KeyModifiers) -> Option<DragKind> {
    let ctrl = modifiers.contains(KeyModifiers::CONTROL);
    match button {
        MouseButton::Left if ctrl => Some(DragKind::Select),
        MouseButton::Left => Some(DragKind::Pan),
        MouseButton::Right if ctrl => Some(DragKind::Zoom(ZoomDirection::Backward)),
        MouseButton::Right => Some(DragKind::Zoom(ZoomDirection::Forward)),
        MouseButton::Middle => None,
    }
}

/// Axes zoomed by the wheel under the held modifiers
fn wheel_axes(modifiers: KeyModifiers) -> ZoomAxes {
    if modifiers.contains(KeyModifiers::CONTROL) {
        ZoomAxes::Address
    } else if modifiers.contains(KeyModifiers::SHIFT) {
        ZoomAxes::Time
    } else if modifiers.contains(KeyModifiers::ALT) {
        ZoomAxes::Size
    } else {
        ZoomAxes::Both
    }
}

/// A released pan drag that barely moved selects the event under the pointer
fn is_event_click(drag: &Drag, release: ScreenPoint) -> bool {
    drag.kind == DragKind::Pan && is_misclick(drag.start, release)
}

pub struct App<'a> {
    reader: TraceReader,
    view: ViewController<'a>,
    running: bool,
    /// Last position notification from the view
    position: PositionChanged,
    cursor: Option<PositionChanged>,
    /// Description of the clicked event or the selected range
    selection: Option<String>,
    drag: Option<Drag>,
    trace_area: Rect,
}

impl<'a> App<'a> {
    pub fn new(reader: TraceReader, index: &'a TraceIndex) -> Self {
        let view = ViewController::new(index, 1.0, 1.0);
        let position = view.position();
        App {
            reader,
            view,
            running: true,
            position,
            cursor: None,
            selection: None,
            drag: None,
            trace_area: Rect::default(),
        }
    }

    pub fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Main loop
        let result = self.main_loop(&mut terminal);

        // Restore terminal
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        result
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        let mut needs_redraw = true;
        while self.running {
            if needs_redraw {
                terminal.draw(|frame| ui::draw(frame, self))?;
                needs_redraw = false;
            }

            if event::poll(Duration::from_millis(80))? {
                match event::read()? {
                    Event::Key(key) => {
                        if key.kind == KeyEventKind::Press {
                            self.handle_key(key.code, key.modifiers);
                            needs_redraw = true;
                        }
                    }
                    Event::Mouse(mouse) => {
                        needs_redraw = self.handle_mouse(mouse);
                    }
                    Event::Resize(_, _) => needs_redraw = true,
                    _ => {}
                }
            }
        }

        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        let ctrl = modifiers.contains(KeyModifiers::CONTROL);

        match key {
            KeyCode::Char('c') if ctrl => self.running = false,
            KeyCode::Char('q') => self.running = false,
            KeyCode::Esc => self.selection = None,
            KeyCode::Up | KeyCode::Char('k') => self.position = self.view.key_pan(PanDirection::Up),
            KeyCode::Down | KeyCode::Char('j') => {
                self.position = self.view.key_pan(PanDirection::Down)
            }
            KeyCode::Left | KeyCode::Char('h') => {
                self.position = self.view.key_pan(PanDirection::Left)
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.position = self.view.key_pan(PanDirection::Right)
            }
            KeyCode::Char('+') | KeyCode::Char('=') => self.position = self.view.grow_marks(),
            KeyCode::Char('-') => self.position = self.view.shrink_marks(),
            KeyCode::Char('o') | KeyCode::Home => self.position = self.view.zoom_to_overview(),
            _ => {}
        }
    }

    /// Mouse position relative to the trace area
    fn to_view(&self, mouse: &MouseEvent) -> ScreenPoint {
        ScreenPoint::new(
            mouse.column as i32 - self.trace_area.x as i32,
            mouse.row as i32 - self.trace_area.y as i32,
        )
    }

    fn in_trace_area(&self, mouse: &MouseEvent) -> bool {
        self.trace_area.contains(Position::new(mouse.column, mouse.row))
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> bool {
        let pos = self.to_view(&mouse);

        match mouse.kind {
            MouseEventKind::Down(button) if self.in_trace_area(&mouse) => {
                let Some(kind) = drag_kind(button, mouse.modifiers) else {
                    return false;
                };
                self.drag = Some(Drag {
                    kind,
                    start: pos,
                    last: pos,
                });
                true
            }
            MouseEventKind::Drag(_) => {
                let Some(drag) = self.drag.as_mut() else {
                    return false;
                };
                let last = drag.last;
                drag.last = pos;
                match drag.kind {
                    DragKind::Pan => self.position = self.view.drag_pan(last, pos),
                    DragKind::Select => {
                        let rect = ScreenRect::new(drag.start, pos);
                        let report = self.view.index().range_query(self.view.viewport(), rect);
                        self.selection = Some(report.to_string());
                    }
                    DragKind::Zoom(_) => {}
                }
                true
            }
            MouseEventKind::Up(_) => {
                let Some(drag) = self.drag.take() else {
                    return false;
                };
                if is_event_click(&drag, pos) {
                    self.select_event_at(pos);
                }
                if let DragKind::Zoom(direction) = drag.kind {
                    if let Some(position) = self.view.rect_zoom(drag.start, pos, direction) {
                        self.position = position;
                    }
                }
                true
            }
            MouseEventKind::ScrollUp | MouseEventKind::ScrollDown
                if self.in_trace_area(&mouse) =>
            {
                let notch = if mouse.kind == MouseEventKind::ScrollUp {
                    WHEEL_NOTCH
                } else {
                    -WHEEL_NOTCH
                };
                let axes = wheel_axes(mouse.modifiers);
                if let Some(position) = self.view.wheel_zoom(pos, wheel_delta(0, notch), axes) {
                    self.position = position;
                }
                true
            }
            MouseEventKind::Moved if self.in_trace_area(&mouse) => {
                self.cursor = Some(self.view.cursor_position(pos));
                true
            }
            _ => false,
        }
    }

    fn select_event_at(&mut self, pos: ScreenPoint) {
        let event = self.view.index().point_query(self.view.viewport(), pos);
        self.selection = Some(match self.reader.describe_event(&event) {
            Ok(description) => description,
            Err(e) => {
                tracing::warn!(id = event.id, "failed to describe event: {e}");
                format!("#{} (no description: {e})", event.id)
            }
        });
    }

    /// Called by the renderer with the area the trace is drawn into
    pub fn set_trace_area(&mut self, area: Rect) {
        if area == self.trace_area {
            return;
        }
        let first = self.trace_area == Rect::default();
        self.trace_area = area;
        let (width, height) = (area.width as f64, area.height as f64);
        self.position = if first {
            self.view.update_zoom_factors(width, height);
            self.view.zoom_to_overview()
        } else {
            self.view.resize(width, height)
        };
    }

    pub fn view(&self) -> &ViewController<'a> {
        &self.view
    }

    pub fn position(&self) -> PositionChanged {
        self.position
    }

    pub fn cursor(&self) -> Option<PositionChanged> {
        self.cursor
    }

    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    pub fn file_name(&self) -> Option<String> {
        self.reader
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
    }

    /// Rectangle being dragged out for a selection or zoom
    pub fn rubber_band(&self) -> Option<(DragKind, ScreenRect)> {
        self.drag
            .filter(|d| d.kind != DragKind::Pan)
            .map(|d| (d.kind, ScreenRect::new(d.start, d.last).normalized()))
    }
}
