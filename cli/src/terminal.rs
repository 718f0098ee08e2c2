//! Terminal shell: owns the screen, feeds keys to `Sys` and paints tiles.

use std::io;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame, Terminal,
};

use blinken_core::command::Command;
use blinken_core::help;
use blinken_core::plugins::Frame as ContentFrame;
use blinken_core::tile::{TileBody, TileView};
use blinken_core::types::geometry;
use blinken_core::Sys;

use crate::keymap::Keymap;
use crate::theme;

type Term = Terminal<CrosstermBackend<io::Stdout>>;

/// Upper bound on how long the loop waits for input before advancing timers.
const POLL_MS: u64 = 50;

const MAX_NOTICES: usize = 3;


/// Set the terminal up, run `body`, and restore the terminal whatever
/// `body` returned.
fn with_terminal<F>(body: F) -> Result<()>
where
    F: FnOnce(&mut Term) -> Result<()>,
{
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = body(&mut terminal);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}


/// Run the dashboard until a quit command. `open` receives the initial
/// screen size.
pub fn run_dashboard<F>(open: F) -> Result<()>
where
    F: FnOnce(u16, u16) -> Result<Sys>,
{
    with_terminal(|terminal| {
        let size = terminal.size()?;
        let sys = open(size.width, size.height)?;
        Dashboard::new(sys).event_loop(terminal)
    })
}


/// Show a full-screen error listing the available plugins until a key is
/// pressed.
pub fn run_plugin_error(requested: &str, available: &[String]) -> Result<()> {
    with_terminal(|terminal| loop {
        terminal.draw(|f| render_plugin_error(f, requested, available))?;
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                return Ok(());
            }
        }
    })
}


struct Dashboard {
    sys: Sys,
    keymap: Keymap,
    started: Instant,
}


impl Dashboard {
    fn new(sys: Sys) -> Self {
        let keymap = Keymap::with_overrides(&sys.key_bindings());
        Dashboard {
            sys,
            keymap,
            started: Instant::now(),
        }
    }

    fn now_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    fn event_loop(&mut self, terminal: &mut Term) -> Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            let timeout = self.sys.next_due_in_ms().unwrap_or(POLL_MS).min(POLL_MS);
            if event::poll(Duration::from_millis(timeout))? {
                match event::read()? {
                    Event::Key(key) => {
                        if let Some(cmd) = self.keymap.lookup(&key) {
                            self.dispatch(cmd);
                        }
                    }
                    Event::Resize(width, height) => self.sys.resize(width, height),
                    _ => {}
                }
            }

            let now = self.now_ms();
            self.sys.advance(now);

            if self.sys.should_quit() {
                break;
            }
        }
        Ok(())
    }

    fn dispatch(&mut self, cmd: Command) {
        let response = self.sys.execute(cmd);
        tracing::debug!(?cmd, ok = response.is_ok(), output = response.text(), "command");
        if cmd == Command::ReloadConfig {
            self.keymap = Keymap::with_overrides(&self.sys.key_bindings());
        }
    }

    fn render(&self, f: &mut Frame) {
        let screen = f.area();
        let directive = self.sys.directive();
        let focus = theme::parse_color(&directive.focus_color, Color::Cyan);
        let unfocus = theme::parse_color(&directive.unfocus_color, Color::DarkGray);
        let border = theme::border_type(&directive.border_style);

        for view in self.sys.views() {
            let area = to_rect(view.area).intersection(screen);
            if area.is_empty() {
                continue;
            }
            let block = match border {
                Some(kind) => Block::default()
                    .borders(Borders::ALL)
                    .border_type(kind)
                    .border_style(Style::default().fg(if view.focused { focus } else { unfocus }))
                    .title(view.title.clone()),
                None => Block::default(),
            };
            f.render_widget(tile_body(&view).block(block), area);
        }

        self.render_notices(f, screen);
        if self.sys.help_visible() {
            self.render_help(f, screen);
        }
    }

    fn render_notices(&self, f: &mut Frame, screen: Rect) {
        let notices = self.sys.notices();
        let shown = &notices[notices.len().saturating_sub(MAX_NOTICES)..];
        if shown.is_empty() {
            return;
        }
        let lines: Vec<Line> = shown
            .iter()
            .map(|n| Line::styled(n.message.clone(), theme::notice_style(n.level)))
            .collect();
        let widest = shown.iter().map(|n| n.message.chars().count()).max().unwrap_or(0);
        let area = toast_area(screen, widest, lines.len());
        f.render_widget(Clear, area);
        f.render_widget(
            Paragraph::new(lines).block(Block::default().borders(Borders::ALL)),
            area,
        );
    }

    fn render_help(&self, f: &mut Frame, screen: Rect) {
        let mut text = help::help_text();
        let bindings = self.sys.key_bindings();
        if !bindings.is_empty() {
            text.push_str("\n\nConfigured bindings:\n");
            text.push_str(&help::binding_lines(&bindings).join("\n"));
        }
        let rows = text.lines().count() as u16 + 2;
        let cols = text.lines().map(|l| l.chars().count()).max().unwrap_or(0) as u16 + 4;
        let area = centered(screen, cols, rows);
        f.render_widget(Clear, area);
        f.render_widget(
            Paragraph::new(text).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Help")
                    .border_style(Style::default().fg(Color::Cyan)),
            ),
            area,
        );
    }
}


fn tile_body(view: &TileView) -> Paragraph<'static> {
    match &view.body {
        TileBody::Content(frame) => Paragraph::new(to_text(frame)),
        TileBody::Placeholder(message) => Paragraph::new(*message)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center),
        TileBody::TooSmall {
            min_width,
            min_height,
        } => Paragraph::new(format!("Too small (needs {}x{})", min_width, min_height))
            .style(Style::default().fg(Color::Yellow))
            .alignment(Alignment::Center),
    }
}


fn to_text(frame: &ContentFrame) -> Text<'static> {
    frame
        .lines
        .iter()
        .map(|line| {
            Line::from(
                line.spans
                    .iter()
                    .map(|s| Span::styled(s.text.clone(), theme::tone_style(s.tone)))
                    .collect::<Vec<_>>(),
            )
        })
        .collect::<Vec<_>>()
        .into()
}


fn to_rect(r: geometry::Rect) -> Rect {
    Rect::new(r.left, r.top, r.width, r.height)
}


/// Bottom-right box for `rows` lines of at most `widest` characters, clamped
/// to the screen.
fn toast_area(screen: Rect, widest: usize, rows: usize) -> Rect {
    let width = u16::try_from(widest).unwrap_or(u16::MAX).saturating_add(4).min(screen.width);
    let height = u16::try_from(rows).unwrap_or(u16::MAX).saturating_add(2).min(screen.height);
    Rect::new(
        screen.x + screen.width - width,
        screen.y + screen.height - height,
        width,
        height,
    )
}


fn centered(screen: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(screen.width);
    let height = height.min(screen.height);
    Rect::new(
        screen.x + (screen.width - width) / 2,
        screen.y + (screen.height - height) / 2,
        width,
        height,
    )
}


fn render_plugin_error(f: &mut Frame, requested: &str, available: &[String]) {
    let red = Style::default().fg(Color::Red);
    let mut lines = vec![
        Line::styled(format!("Unknown plugin: {}", requested), red.add_modifier(Modifier::BOLD)),
        Line::default(),
        Line::raw("Available plugins:"),
    ];
    lines.extend(available.iter().map(|name| Line::raw(format!("  {}", name))));
    lines.push(Line::default());
    lines.push(Line::styled("Press any key to exit.", Style::default().fg(Color::DarkGray)));
    let error = Paragraph::new(lines).block(
        Block::default()
            .title("Error")
            .borders(Borders::ALL)
            .border_style(red),
    );
    f.render_widget(error, f.area());
}
