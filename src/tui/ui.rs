use super::app::{App, DragKind};
use crate::trace::{EventType, TraceIndex};
use crate::viewport::Viewport;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    symbols::Marker,
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, Paragraph, Wrap,
        canvas::{Canvas, Line as CanvasLine, Points, Rectangle},
    },
};

/// Kinds drawn as separate point layers, with their colors
const LAYERS: [(EventType, Color); 4] = [
    (EventType::INS, Color::Gray),
    (EventType::READ, Color::Green),
    (EventType::WRITE, Color::Red),
    (EventType::from_bits(0b11), Color::Blue),
];

const REGION_MARKER: Color = Color::Rgb(255, 128, 0);

/// Everything visible in the current view, in canvas coordinates
#[derive(Default)]
struct Marks {
    points: [Vec<(f64, f64)>; 4],
    rects: Vec<Rectangle>,
    /// x of each region start and its real address
    regions: Vec<(f64, u64)>,
}

fn layer_of(kind: EventType) -> Option<usize> {
    LAYERS.iter().position(|(k, _)| *k == kind)
}

/// Walk the blocks and events inside the view.
///
/// Canvas y grows upwards while view y grows downwards, so y is flipped
/// against `height`.
fn collect_marks(index: &TraceIndex, vp: &Viewport, width: f64, height: f64) -> Marks {
    let mut marks = Marks::default();
    let last_address = vp.view_address as f64 + width / vp.address_zoom_factor;
    let last_time = vp.view_time as f64 + height / vp.time_zoom_factor;
    let size_px = vp.size_px as f64;

    for block in index.blocks() {
        if block.display_address as f64 > last_address {
            break;
        }
        if block.display_address + block.size <= vp.view_address {
            continue;
        }
        if block.start_region {
            marks.regions.push((vp.screen_x(block.display_address), block.address));
        }
        for event in &block.events {
            if event.time as f64 > last_time {
                break;
            }
            if event.time < vp.view_time {
                continue;
            }
            let Some(layer) = layer_of(event.kind) else {
                continue;
            };
            let display = block.display_address + (event.address - block.address);
            let x = vp.screen_x(display);
            let y = height - vp.screen_y(event.time);
            let w = (event.size as f64 * vp.address_zoom_factor).max(size_px) * vp.size_factor;
            let h = vp.time_zoom_factor.max(size_px) * vp.size_factor;

            if w <= 1.0 && h <= 1.0 {
                marks.points[layer].push((x, y));
            } else {
                marks.rects.push(Rectangle {
                    x,
                    y: y - h,
                    width: w,
                    height: h,
                    color: LAYERS[layer].1,
                });
            }
        }
    }
    marks
}

pub fn draw(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),
            Constraint::Length(3),
            Constraint::Length(6),
        ])
        .split(frame.area());

    draw_trace(frame, app, chunks[0]);
    draw_status(frame, app, chunks[1]);
    draw_selection(frame, app, chunks[2]);
}

fn draw_trace(frame: &mut Frame, app: &mut App, area: Rect) {
    let title = match app.file_name() {
        Some(name) => format!(" tracegraph: {} ", name),
        None => " tracegraph ".to_string(),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    app.set_trace_area(inner);

    let (width, height) = (inner.width as f64, inner.height as f64);
    let view = app.view();
    let index = view.index();

    if index.blocks().is_empty() {
        let text = Paragraph::new(Line::from(Span::styled(
            "Trace contains no events.",
            Style::default().fg(Color::DarkGray),
        )))
        .block(block);
        frame.render_widget(text, area);
        return;
    }

    let marks = collect_marks(index, view.viewport(), width, height);
    let band = app.rubber_band();

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds([0.0, width])
        .y_bounds([0.0, height])
        .paint(move |ctx| {
            for &(x, address) in &marks.regions {
                ctx.draw(&CanvasLine::new(x, 0.0, x, height, REGION_MARKER));
                ctx.print(
                    x,
                    0.0,
                    Span::styled(format!("0x{:x}", address), Style::default().fg(REGION_MARKER)),
                );
            }
            for (layer, coords) in marks.points.iter().enumerate() {
                ctx.draw(&Points {
                    coords,
                    color: LAYERS[layer].1,
                });
            }
            for rect in &marks.rects {
                ctx.draw(rect);
            }
            if let Some((kind, rect)) = band {
                let color = match kind {
                    DragKind::Select => Color::Yellow,
                    _ => Color::White,
                };
                let (x0, y0) = (rect.top_left.x as f64, rect.top_left.y as f64);
                let (x1, y1) = (rect.bottom_right.x as f64, rect.bottom_right.y as f64);
                ctx.draw(&Rectangle {
                    x: x0,
                    y: height - y1,
                    width: x1 - x0,
                    height: y1 - y0,
                    color,
                });
            }
        });
    frame.render_widget(canvas, area);
}

fn draw_status(frame: &mut Frame, app: &App, area: Rect) {
    let vp = app.view().viewport();
    let mut spans = vec![
        Span::styled("View ", Style::default().fg(Color::DarkGray)),
        Span::raw(app.position().to_string()),
    ];
    if let Some(cursor) = app.cursor() {
        spans.push(Span::styled("  Cursor ", Style::default().fg(Color::DarkGray)));
        spans.push(Span::raw(cursor.to_string()));
    }
    spans.push(Span::styled(
        format!(
            "  zoom {:.3e}x{:.3e} mark {}",
            vp.address_zoom_factor, vp.time_zoom_factor, vp.size_px
        ),
        Style::default().fg(Color::DarkGray),
    ));

    let help = Line::from(Span::styled(
        "arrows pan  wheel zoom  click event  ctrl+drag range  right drag zoom  +/- marks  o overview  q quit",
        Style::default().fg(Color::DarkGray),
    ));
    let status = Paragraph::new(Text::from(vec![Line::from(spans), help]))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(status, area);
}

fn draw_selection(frame: &mut Frame, app: &App, area: Rect) {
    let text = match app.selection() {
        Some(s) => Text::from(s.to_string()),
        None => Text::from(Line::from(Span::styled(
            "Nothing selected",
            Style::default().fg(Color::DarkGray),
        ))),
    };
    let panel = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .block(Block::default().title(" Selection ").borders(Borders::ALL));
    frame.render_widget(panel, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::Event;

    #[test]
    fn test_collect_marks_clips_to_view() {
        let mut index = TraceIndex::new();
        for (t, (address, kind)) in [
            (0x1000u64, EventType::READ),
            (0x1010, EventType::WRITE),
            (0x9000, EventType::INS),
            (0x9004, EventType::UFO),
        ]
        .into_iter()
        .enumerate()
        {
            index.ingest(Event {
                time: t as u64,
                address,
                size: 1,
                id: t as i64,
                kind,
                value: 0,
            });
        }
        index.finish();

        let vp = Viewport {
            view_time: 1,
            ..Viewport::default()
        };
        let marks = collect_marks(&index, &vp, 0x2000 as f64, 10.0);

        assert!(marks.points[1].is_empty());
        assert_eq!(marks.points[2], vec![(16.0, 10.0)]);
        assert_eq!(marks.points[0], vec![(4096.0, 9.0)]);
        assert_eq!(marks.regions, vec![(0.0, 0x1000), (4096.0, 0x9000)]);
        assert!(marks.rects.is_empty());
    }
}
