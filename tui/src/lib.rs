mod app;
mod tabs;
pub mod widgets;

use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, MouseEvent, MouseEventKind};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use models::{GraphData, ScanSession, Vulnerability};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Tabs};
use ratatui::{Frame, Terminal};

use app::App;

const TICK: Duration = Duration::from_millis(100);

/// Open the interactive viewer for a finished scan.
///
/// `findings` are listed in the order given; callers pass them sorted.
pub fn run_report(graph: GraphData, session: &ScanSession, findings: Vec<Vulnerability>) -> io::Result<()> {
    let mut screen = Screen::enter()?;
    let mut app = App::new(graph, session, findings);
    let result = event_loop(&mut screen.terminal, &mut app);
    screen.leave()?;
    result
}

/// Raw mode plus alternate screen, undone on `leave`, on drop and on panic.
struct Screen {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    active: bool,
}

impl Screen {
    fn enter() -> io::Result<Self> {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = restore(&mut io::stderr());
            previous(info);
        }));

        enable_raw_mode()?;
        let mut out = io::stdout();
        execute!(out, EnterAlternateScreen, EnableMouseCapture)?;
        Ok(Self { terminal: Terminal::new(CrosstermBackend::new(out))?, active: true })
    }

    fn leave(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        restore(self.terminal.backend_mut())?;
        self.terminal.show_cursor()
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        let _ = self.leave();
    }
}

fn restore(out: &mut impl io::Write) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(out, LeaveAlternateScreen, DisableMouseCapture)
}

fn event_loop(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| draw(f, app))?;

        if !event::poll(TICK)? {
            continue;
        }
        match event::read()? {
            Event::Key(key) if !app.handle_key(key.code) && matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) => {
                return Ok(());
            }
            Event::Mouse(mouse) => on_mouse(app, mouse),
            _ => {}
        }
    }
}

fn draw(f: &mut Frame, app: &mut App) {
    let [bar, body] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .areas(f.area());

    let tabs = Tabs::new(app.tab_titles())
        .block(Block::default().borders(Borders::ALL).title(" siteward (t: switch tab, q: quit) "))
        .select(app.current_tab_index())
        .style(Style::default().fg(Color::White))
        .highlight_style(Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, bar);

    app.render_current_tab(f, body);
}

fn on_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        // Rows 1-2 are the tab bar inside its border.
        MouseEventKind::Down(_) if (1..=2).contains(&mouse.row) => {
            if let Some(idx) = tab_at(&app.tab_titles(), mouse.column) {
                app.select_tab(idx);
            }
        }
        MouseEventKind::Down(_) => app.handle_click(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.handle_scroll_down(),
        MouseEventKind::ScrollUp => app.handle_scroll_up(),
        _ => {}
    }
}

/// Tab under column `col` of the bar, which renders as ` a │ b ` inside a border.
fn tab_at(titles: &[&str], col: u16) -> Option<usize> {
    let col = col as usize;
    let mut x = 1;
    for (i, t) in titles.iter().enumerate() {
        let w = t.len() + 2;
        if (x..x + w).contains(&col) {
            return Some(i);
        }
        x += w + 1;
    }
    None
}
