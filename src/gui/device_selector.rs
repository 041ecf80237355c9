use std::{io::stdout, path::PathBuf};

use crate::gui::error::PinpointGuiError;

use crossterm::{
    event::{self, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{
        block::{Position, Title},
        *,
    },
    Terminal,
};

/// Full-screen picker over the serial devices present on the machine.
/// Returns `None` when the user backs out (or there is nothing to pick).
pub fn device_selector(
    mut available_ports: Vec<PathBuf>,
) -> Result<Option<PathBuf>, PinpointGuiError> {
    if available_ports.is_empty() {
        return Ok(None);
    }

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    terminal.clear()?;

    let n_ports = available_ports.len();
    let mut cursor = 0;
    let mut list_state = ListState::default().with_selected(Some(cursor));
    let mut chosen = None;
    loop {
        let title = Title::from(" Select the UWB serial device ".cyan().bold());
        let instructions = Title::from(Line::from(vec![
            " Navigate ".into(),
            "<Up>/<Down>".cyan().bold(),
            " Connect ".into(),
            "<Enter>".cyan().bold(),
            " Quit ".into(),
            "<Q> ".cyan().bold(),
        ]));
        let block = Block::default()
            .title(title.alignment(Alignment::Center))
            .title(
                instructions
                    .alignment(Alignment::Center)
                    .position(Position::Bottom),
            )
            .borders(Borders::ALL);
        let entries = available_ports.iter().map(|p| p.to_string_lossy());
        let list = List::new(entries)
            .style(Style::default().fg(Color::White))
            .highlight_symbol("> ")
            .highlight_style(Style::default().fg(Color::Cyan))
            .block(block);
        list_state.select(Some(cursor));
        terminal.draw(|frame| {
            frame.render_stateful_widget(list, frame.size(), &mut list_state);
        })?;

        if event::poll(std::time::Duration::from_millis(16))? {
            if let event::Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Down => cursor = (cursor + 1) % n_ports,
                        KeyCode::Up => cursor = (cursor + n_ports - 1) % n_ports,
                        KeyCode::Enter => {
                            chosen = Some(cursor);
                            break;
                        }
                        KeyCode::Char('q') | KeyCode::Esc => break,
                        _ => {}
                    }
                }
            }
        }
    }

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(chosen.map(|i| available_ports.swap_remove(i)))
}
