use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
        MouseEventKind,
    },
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use std::{
    io::{stdout, Stdout},
    time::{Duration, Instant},
};

use blockfall::config::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use blockfall::{
    Cell, ColorId, Engine, EngineConfig, GameEvent, PieceSource, Profile, RandomPieceSource,
    SessionManager,
};

// ============================================================================
// Command Line
// ============================================================================

/// Falling-block puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(name = "blockfall", version)]
struct Args {
    /// Play field width in cells.
    #[arg(long, default_value_t = DEFAULT_WIDTH as u16, value_parser = clap::value_parser!(u16).range(4..=200))]
    width: u16,

    /// Play field height in cells.
    #[arg(long, default_value_t = DEFAULT_HEIGHT as u16, value_parser = clap::value_parser!(u16).range(4..=200))]
    height: u16,

    /// Rule set: current (table rotation, row leveling) or legacy (rotation
    /// revert, neighbour collision, timed leveling).
    #[arg(long, value_enum, default_value = "current")]
    profile: ProfileArg,

    /// Level the game starts at.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=99))]
    level: u32,

    /// Seed for the piece sequence. Each restart reseeds from it in turn.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ProfileArg {
    Current,
    Legacy,
}

impl From<ProfileArg> for Profile {
    fn from(arg: ProfileArg) -> Self {
        match arg {
            ProfileArg::Current => Profile::Current,
            ProfileArg::Legacy => Profile::Legacy,
        }
    }
}

// ============================================================================
// Visual Constants
// ============================================================================

const CELL_WIDTH: u16 = 2;
const BLOCK_CHAR: &str = "██";
const EMPTY_CHAR: &str = " .";
const FRAME_TIME: Duration = Duration::from_millis(16);
const STATUS_TIME: Duration = Duration::from_millis(1200);

fn palette_color(color: ColorId) -> Color {
    match color.index() {
        0 => Color::Rgb(205, 26, 26),
        1 => Color::Rgb(233, 128, 22),
        2 => Color::Rgb(243, 250, 28),
        3 => Color::Rgb(35, 137, 14),
        4 => Color::Rgb(26, 246, 209),
        5 => Color::Rgb(26, 33, 246),
        _ => Color::Rgb(129, 26, 246),
    }
}

// ============================================================================
// Rendering
// ============================================================================

struct Status {
    text: String,
    since: Instant,
}

fn render(frame: &mut Frame, sessions: &SessionManager, status: Option<&Status>) {
    let area = frame.size();
    let engine = sessions.engine();

    render_game(frame, sessions, status, area);
    if engine.is_game_over() {
        render_game_over(frame, sessions, area);
    }
}

fn render_game(frame: &mut Frame, sessions: &SessionManager, status: Option<&Status>, area: Rect) {
    let engine = sessions.engine();
    let grid = engine.grid();

    let grid_display_width = (grid.width() as u16 * CELL_WIDTH) + 2;
    let grid_display_height = grid.height() as u16 + 2;
    let side_width = 16;
    let total_width = grid_display_width + side_width + 2;
    let total_height = grid_display_height + 2;

    let main_area = centered_rect(total_width, total_height, area);

    let vertical = Layout::vertical([
        Constraint::Length(grid_display_height),
        Constraint::Fill(1),
    ])
    .split(main_area);

    let game_row = vertical[0];

    let horizontal = Layout::horizontal([
        Constraint::Length(grid_display_width),
        Constraint::Length(side_width),
    ])
    .split(game_row);

    let side = Layout::vertical([Constraint::Length(7), Constraint::Fill(1)]).split(horizontal[1]);

    render_grid(frame, engine, horizontal[0]);
    render_preview(frame, engine, side[0]);
    render_info(frame, sessions, status, side[1]);

    let controls_area = Rect {
        x: area.x,
        y: game_row.y + game_row.height,
        width: area.width,
        height: 1,
    };

    if controls_area.y < area.height {
        let controls = Paragraph::new(Line::from(
            "←→/AD: Move | ↓/S: Down | ↑/W/Click: Rotate | Space: Drop | R: Restart | Q: Quit",
        ))
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(controls, controls_area);
    }
}

fn render_grid(frame: &mut Frame, engine: &Engine, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Blockfall ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines: Vec<Line> = engine
        .render_grid()
        .into_iter()
        .map(|row| {
            let spans: Vec<Span> = row
                .into_iter()
                .map(|cell| match cell {
                    Cell::Empty => Span::styled(EMPTY_CHAR, Style::default().fg(Color::DarkGray)),
                    Cell::Occupied(color) => {
                        Span::styled(BLOCK_CHAR, Style::default().fg(palette_color(color)))
                    }
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_preview(frame: &mut Frame, engine: &Engine, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Next ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let next = engine.next();
    let offsets = next.offsets();
    let color = palette_color(next.color);

    let mut lines: Vec<Line> = Vec::new();
    for y in 0i16..4 {
        let mut spans: Vec<Span> = vec![Span::raw(" ")];
        for x in 0i16..4 {
            if offsets.contains(&(x, y)) {
                spans.push(Span::styled(BLOCK_CHAR, Style::default().fg(color)));
            } else {
                spans.push(Span::raw("  "));
            }
        }
        lines.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_info(frame: &mut Frame, sessions: &SessionManager, status: Option<&Status>, area: Rect) {
    let engine = sessions.engine();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Info ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled("Score", Style::default().fg(Color::Yellow))),
        Line::from(format!("{}", engine.score())),
        Line::from(""),
        Line::from(Span::styled("Level", Style::default().fg(Color::Green))),
        Line::from(format!("{}", engine.level())),
        Line::from(""),
        Line::from(Span::styled("Best", Style::default().fg(Color::Cyan))),
        Line::from(format!("{}", sessions.best_score())),
        Line::from(""),
    ];
    if let Some(status) = status {
        lines.push(Line::from(Span::styled(
            status.text.clone(),
            Style::default().fg(Color::White),
        )));
    }

    let paragraph = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(paragraph, inner);
}

fn render_game_over(frame: &mut Frame, sessions: &SessionManager, area: Rect) {
    let engine = sessions.engine();
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("GAME OVER", Style::default().fg(Color::Red))),
        Line::from(""),
        Line::from(format!("Level: {}", engine.level())),
        Line::from(format!("This Game Score: {}", engine.score())),
        Line::from(format!("Max Game Score: {}", sessions.best_score())),
        Line::from(""),
        Line::from(Span::styled(
            "Press R to start new game",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let paragraph = Paragraph::new(text).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Game Over ")
            .title_alignment(Alignment::Center)
            .style(Style::default().bg(Color::Black)),
    );

    let popup_area = centered_rect(30, 10, area);
    frame.render_widget(paragraph, popup_area);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let horizontal = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(width.min(area.width)),
        Constraint::Fill(1),
    ])
    .split(area);

    let vertical = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height.min(area.height)),
        Constraint::Fill(1),
    ])
    .split(horizontal[1]);

    vertical[1]
}

fn describe(event: &GameEvent) -> Option<String> {
    match event {
        GameEvent::RowsCleared { rows, points } => Some(format!("{rows} rows +{points}")),
        GameEvent::LevelUp(level) => Some(format!("LEVEL {level}")),
        _ => None,
    }
}

// ============================================================================
// Input
// ============================================================================

enum Action {
    Quit,
    Restart,
    Left,
    Right,
    Down,
    Drop,
    Rotate,
    RotateBack,
}

fn map_event(event: Event) -> Option<Action> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => Some(Action::Quit),
            KeyCode::Char('r') | KeyCode::Char('R') => Some(Action::Restart),
            KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Some(Action::Left),
            KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Some(Action::Right),
            KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => Some(Action::Down),
            KeyCode::Char(' ') => Some(Action::Drop),
            KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Some(Action::Rotate),
            KeyCode::Char('z') | KeyCode::Char('Z') => Some(Action::RotateBack),
            _ => None,
        },
        Event::Mouse(mouse) => match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => Some(Action::RotateBack),
            MouseEventKind::Down(_) => Some(Action::Rotate),
            _ => None,
        },
        _ => None,
    }
}

fn apply(engine: &mut Engine, action: Action) -> Result<()> {
    match action {
        Action::Left => {
            engine.move_left();
        }
        Action::Right => {
            engine.move_right();
        }
        Action::Down => engine.soft_drop()?,
        Action::Drop => {
            engine.hard_drop();
        }
        Action::Rotate => {
            engine.rotate();
        }
        Action::RotateBack => {
            engine.rotate_back();
        }
        Action::Quit | Action::Restart => {}
    }
    Ok(())
}

// ============================================================================
// Main Loop
// ============================================================================

fn run(terminal: &mut Terminal<CrosstermBackend<Stdout>>, args: &Args) -> Result<()> {
    let mut config = EngineConfig::for_profile(
        args.profile.into(),
        usize::from(args.width),
        usize::from(args.height),
    );
    config.start_level = args.level;

    let mut next_seed = args.seed;
    let mut sessions = SessionManager::new(config, move || -> Box<dyn PieceSource> {
        match next_seed.as_mut() {
            Some(seed) => {
                let source = RandomPieceSource::seeded(*seed);
                *seed = seed.wrapping_add(1);
                Box::new(source)
            }
            None => Box::new(RandomPieceSource::from_entropy()),
        }
    });

    let mut status: Option<Status> = None;
    let mut last_tick = Instant::now();
    let mut last_frame = Instant::now();

    loop {
        terminal
            .draw(|frame| render(frame, &sessions, status.as_ref()))
            .context("drawing frame")?;

        let until_tick = sessions
            .engine()
            .gravity_interval()
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);

        if event::poll(until_tick.min(FRAME_TIME)).context("polling input")? {
            let action = map_event(event::read().context("reading input")?);
            match action {
                Some(Action::Quit) => break,
                Some(Action::Restart) => {
                    sessions.restart();
                    status = None;
                    last_tick = Instant::now();
                }
                Some(action) => apply(sessions.engine_mut(), action)?,
                None => {}
            }
        }

        let engine = sessions.engine_mut();
        engine.advance_clock(last_frame.elapsed());
        last_frame = Instant::now();

        if last_tick.elapsed() >= engine.gravity_interval() {
            engine.tick_gravity()?;
            last_tick = Instant::now();
        }
        engine.clear_full_rows();

        if let Some(text) = engine.take_events().iter().filter_map(describe).last() {
            status = Some(Status {
                text,
                since: Instant::now(),
            });
        }
        if status.as_ref().is_some_and(|s| s.since.elapsed() >= STATUS_TIME) {
            status = None;
        }
    }

    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    stdout()
        .execute(EnterAlternateScreen)
        .context("entering alternate screen")?;
    stdout()
        .execute(EnableMouseCapture)
        .context("enabling mouse capture")?;
    Terminal::new(CrosstermBackend::new(stdout())).context("creating terminal")
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode().context("disabling raw mode")?;
    stdout()
        .execute(DisableMouseCapture)
        .context("disabling mouse capture")?;
    stdout()
        .execute(LeaveAlternateScreen)
        .context("leaving alternate screen")?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    enable_raw_mode().context("enabling raw mode")?;
    let result = setup_terminal().and_then(|mut terminal| run(&mut terminal, &args));
    let restored = restore_terminal();

    result.and(restored)
}
