use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Paragraph};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use jungle_pulse::config::SessionConfig;
use jungle_pulse::session::Session;
use jungle_pulse::state::{DataQuality, LiveStatus, Snapshot};

struct App {
    session: Arc<Session>,
    should_quit: bool,
}

impl App {
    fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            should_quit: false,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('r') | KeyCode::Char('R') => self.request_refresh(),
            _ => {}
        }
    }

    fn request_refresh(&self) {
        let session = self.session.clone();
        tokio::spawn(async move {
            session.refresh().await;
        });
    }
}

fn init_logging() -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = tracing_appender::rolling::never(".", "jungle_pulse.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .init();
    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    let _log_guard = init_logging();

    let config = SessionConfig::from_env();
    let session = Arc::new(Session::from_config(&config).context("failed to create session")?);
    session.start();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut app = App::new(session.clone());
    app.request_refresh();
    let res = run_app(&mut terminal, &mut app);

    session.dispose();

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res.context("terminal loop failed")
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        let snapshot = app.session.snapshot();
        terminal.draw(|f| ui(f, &snapshot))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, snap: &Snapshot) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Min(6),
            Constraint::Length(6),
            Constraint::Length(1),
        ])
        .split(frame.size());

    render_header(frame, chunks[0], snap);
    render_stat_cards(frame, chunks[1], snap);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[2]);

    let matches = Paragraph::new(matches_text(snap)).block(
        Block::default()
            .title(format!("Recent Matches [{}]", snap.history_quality.label()))
            .borders(Borders::ALL),
    );
    frame.render_widget(matches, body[0]);

    let champions = Paragraph::new(champions_text(snap))
        .block(Block::default().title("Champions").borders(Borders::ALL));
    frame.render_widget(champions, body[1]);

    let console = Paragraph::new(console_text(snap))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[3]);

    let footer = Paragraph::new(footer_text(snap)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[4]);
}

fn render_header(frame: &mut Frame, area: Rect, snap: &Snapshot) {
    let title = match &snap.profile {
        Some(profile) => {
            let rank = profile
                .rank
                .as_ref()
                .map(|r| format!("{} {} LP", r.label(), r.league_points))
                .unwrap_or_else(|| "Unranked".to_string());
            format!(
                "{}  [{}]  {}",
                profile.identity,
                profile.region.to_uppercase(),
                rank
            )
        }
        None if snap.loading => "Loading profile...".to_string(),
        None => snap
            .error
            .clone()
            .unwrap_or_else(|| "No profile".to_string()),
    };

    let mut spans = vec![
        Span::styled(title, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled(
            format!(" {} ", snap.live_status.label()),
            live_chip_style(snap.live_status),
        ),
    ];
    if snap.profile.is_some() && snap.profile_quality != DataQuality::Live {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!(" {} ", snap.profile_quality.label()),
            Style::default().fg(Color::Black).bg(Color::Yellow),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, area);
}

fn live_chip_style(status: LiveStatus) -> Style {
    match status {
        LiveStatus::InGame => Style::default().fg(Color::Black).bg(Color::Green),
        LiveStatus::NotInGame => Style::default().fg(Color::White).bg(Color::DarkGray),
        LiveStatus::Checking => Style::default().fg(Color::Black).bg(Color::Yellow),
    }
}

fn render_stat_cards(frame: &mut Frame, area: Rect, snap: &Snapshot) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 4),
            Constraint::Ratio(1, 4),
            Constraint::Ratio(1, 4),
            Constraint::Ratio(1, 4),
        ])
        .split(area);

    let stats = &snap.stats;
    let entries = [
        ("Win Rate", format!("{}%", stats.win_rate)),
        ("Avg KDA", format!("{:.1}", stats.average_kda)),
        ("Record", format!("{}W {}L", stats.wins, stats.losses)),
        (
            "K / D / A",
            format!(
                "{:.1} / {:.1} / {:.1}",
                stats.avg_kills, stats.avg_deaths, stats.avg_assists
            ),
        ),
    ];
    for ((title, value), card) in entries.into_iter().zip(cards.iter()) {
        let widget = Paragraph::new(value)
            .alignment(Alignment::Center)
            .style(Style::default().add_modifier(Modifier::BOLD))
            .block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(widget, *card);
    }
}

fn matches_text(snap: &Snapshot) -> String {
    if snap.matches.is_empty() {
        return if snap.loading {
            "Loading...".to_string()
        } else {
            "No matches".to_string()
        };
    }
    snap.matches
        .iter()
        .map(|m| {
            let marker = if m.quality == DataQuality::Live { ' ' } else { '*' };
            format!(
                "{}{:<4} {:<10} {:>8}  {:>4.1} KDA  {:>2}m  {}",
                marker,
                if m.result.is_win() { "WIN" } else { "LOSS" },
                m.champion,
                m.kda.to_string(),
                m.kda.ratio(),
                m.duration_minutes,
                m.id
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn champions_text(snap: &Snapshot) -> String {
    if snap.stats.champions.is_empty() {
        return "-".to_string();
    }
    snap.stats
        .champions
        .iter()
        .map(|c| {
            format!(
                "{:<10} {:>2}g  {:>3}%  {:.1} KDA",
                c.name, c.games, c.win_rate, c.kda
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn console_text(snap: &Snapshot) -> String {
    if snap.logs.is_empty() {
        return "No alerts yet".to_string();
    }
    snap.logs
        .iter()
        .rev()
        .take(4)
        .cloned()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join("\n")
}

fn footer_text(snap: &Snapshot) -> String {
    let updated = snap
        .updated_at
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string());
    let tier = snap.history_tier.as_deref().unwrap_or("-");
    let session = if snap.live_status.can_start_session() {
        "ready"
    } else {
        "wait"
    };
    format!("r refresh | q quit | updated {updated} | history {tier} | session {session}")
}
