use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::info;

use super::app::App;
use super::models::InputMode;
use super::rendering::ui;
use crate::models::Rating;
use crate::tracker::{Intent, Tracker};

pub async fn run_tui(tracker: Tracker) -> Result<()> {
    let mut app = App::load(tracker).await;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    info!("tui closed");
    res
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<()> {
    loop {
        app.clear_status_if_expired();

        terminal.draw(|f| ui(f, app))?;

        if app.pending.is_some() {
            app.run_pending().await;
            continue;
        }

        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            handle_key(app, key);
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    match app.input_mode {
        InputMode::Normal => handle_normal_key(app, key.code),
        InputMode::ConfirmDelete => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_delete(),
            _ => app.cancel_input(),
        },
        _ => match key.code {
            KeyCode::Enter => app.submit_input(),
            KeyCode::Esc => app.cancel_input(),
            KeyCode::Backspace => {
                app.input.pop();
            }
            KeyCode::Char(c) => app.input.push(c),
            _ => {}
        },
    }
}

fn handle_normal_key(app: &mut App, code: KeyCode) {
    if app.show_help {
        if matches!(
            code,
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('h') | KeyCode::Char('?')
        ) {
            app.toggle_help();
        }
        return;
    }

    match code {
        KeyCode::Char('q') | KeyCode::Esc => {
            if app.show_episodes {
                app.toggle_episodes();
            } else {
                app.should_quit = true;
            }
        }
        KeyCode::Char('h') | KeyCode::Char('?') => app.toggle_help(),
        KeyCode::Down | KeyCode::Char('j') => app.next(),
        KeyCode::Up | KeyCode::Char('k') => app.previous(),
        KeyCode::Enter | KeyCode::Char(' ') => app.toggle_episodes(),
        KeyCode::Char('[') => app.switch_list(false),
        KeyCode::Char(']') => app.switch_list(true),
        KeyCode::Char('0') => app.rate_selected(None),
        KeyCode::Char(c @ '1'..='5') => {
            let rating = c
                .to_digit(10)
                .and_then(|value| Rating::try_from(value as u8).ok());
            if rating.is_some() {
                app.rate_selected(rating);
            }
        }
        KeyCode::Char('d') | KeyCode::Delete => app.remove_selected(),
        KeyCode::Char('o') => app.show_continue_url(),
        KeyCode::Char('r') => app.queue(Intent::RefreshAll, "Refreshing..."),
        KeyCode::Char('i') => app.queue(Intent::ImportHistory, "Importing history..."),
        KeyCode::Char('a') => app.begin_input(InputMode::AddItem),
        KeyCode::Char('n') => app.begin_input(InputMode::CreateList),
        KeyCode::Char('R') => app.begin_input(InputMode::RenameList),
        KeyCode::Char('m') => app.begin_input(InputMode::MergeList),
        KeyCode::Char('x') => app.begin_input(InputMode::ConfirmDelete),
        _ => {}
    }
}
