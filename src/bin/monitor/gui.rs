use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    style::{Color, Style},
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame, Terminal,
};
use std::{
    collections::VecDeque,
    error::Error,
    io,
    time::{Duration, Instant},
};

use pinpoint::layout::RoomBounds;
use pinpoint::Point;

/// Recent fixes kept on screen.
const TRAIL_LEN: usize = 60;

type FixGenerator = Box<dyn FnMut() -> Option<Point>>;

struct App {
    room: RoomBounds,
    stations: Vec<(f64, f64)>,
    trail: VecDeque<(f64, f64)>,
    next_fix: FixGenerator,
}

impl App {
    fn new(room: RoomBounds, stations: Vec<Point>, next_fix: FixGenerator) -> App {
        App {
            room,
            stations: stations.iter().map(|&Point { x, y }| (x, y)).collect(),
            trail: VecDeque::new(),
            next_fix,
        }
    }

    fn on_tick(&mut self) {
        if let Some(Point { x, y }) = (self.next_fix)() {
            self.trail.push_back((x, y));
            if self.trail.len() > TRAIL_LEN {
                self.trail.pop_front();
            }
        }
    }
}

pub fn engage_gui(
    room: RoomBounds,
    stations: Vec<Point>,
    next_fix: FixGenerator,
) -> Result<(), Box<dyn Error>> {
    // setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // create app and run it
    let tick_rate = Duration::from_millis(100);
    let app = App::new(room, stations, next_fix);
    let res = run_app(&mut terminal, app, tick_rate);

    // restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{:?}", err)
    }

    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    tick_rate: Duration,
) -> io::Result<()> {
    let mut last_tick = Instant::now();
    loop {
        terminal.draw(|f| ui(f, &mut app))?;

        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if let KeyCode::Char('q') = key.code {
                    return Ok(());
                }
            }
        }
        if last_tick.elapsed() >= tick_rate {
            app.on_tick();
            last_tick = Instant::now();
        }
    }
}

fn axis_labels(extent: f64) -> Vec<Span<'static>> {
    [0.0, extent / 2.0, extent]
        .iter()
        .map(|v| Span::from(format!("{:.1}", v)))
        .collect()
}

fn ui(f: &mut Frame, app: &mut App) {
    let trail: Vec<(f64, f64)> = app.trail.iter().cloned().collect();
    let chart = Chart::new(vec![
        Dataset::default()
            .name("Anchors")
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::Cyan))
            .data(&app.stations),
        Dataset::default()
            .name("Tag")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::Red))
            .data(&trail),
    ])
    .block(
        Block::default()
            .title(" Room (q quits) ")
            .borders(Borders::ALL),
    )
    .x_axis(
        Axis::default()
            .title(Span::styled("m", Style::default().fg(Color::Gray)))
            .style(Style::default().fg(Color::White))
            .bounds([0.0, app.room.width])
            .labels(axis_labels(app.room.width)),
    )
    .y_axis(
        Axis::default()
            .title(Span::styled("m", Style::default().fg(Color::Gray)))
            .style(Style::default().fg(Color::White))
            .bounds([0.0, app.room.height])
            .labels(axis_labels(app.room.height)),
    );

    f.render_widget(chart, f.size());
}
