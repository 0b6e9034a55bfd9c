//! Pure view/render functions for the profile screen.
//!
//! Functions here take `&AppState` by immutable reference, draw to a
//! ratatui frame, and never mutate state or return effects.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::state::{AppState, Phase};

/// Height of the status line at the bottom.
const STATUS_HEIGHT: u16 = 1;

/// Renders the entire screen to the frame.
pub fn render(app: &AppState, frame: &mut Frame) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(4), Constraint::Length(STATUS_HEIGHT)])
        .split(area);

    render_profile_panel(app, frame, chunks[0]);
    render_status_line(app, frame, chunks[1]);
}

/// The profile panel: the two rendered lines, or a phase-appropriate hint.
fn render_profile_panel(app: &AppState, frame: &mut Frame, area: Rect) {
    let title = match &app.account {
        Some(account) => format!(" Peep - {} ", account.email),
        None => " Peep ".to_string(),
    };

    let lines: Vec<Line<'_>> = match (&app.phase, &app.profile) {
        (Phase::SignedOut, _) => vec![Line::from(Span::styled(
            "Not signed in.",
            Style::default().fg(Color::DarkGray),
        ))],
        (Phase::SigningIn, _) => vec![Line::from(Span::styled(
            "Waiting for the browser sign-in...",
            Style::default().fg(Color::Yellow),
        ))],
        (Phase::SignedIn, Some(profile)) => vec![
            Line::from(profile.birthday_line()),
            Line::from(profile.gender_line()),
        ],
        (Phase::SignedIn, None) => {
            if app.fetch_in_flight {
                vec![Line::from(Span::styled(
                    "Fetching profile...",
                    Style::default().fg(Color::Yellow),
                ))]
            } else {
                vec![Line::from(Span::styled(
                    "Signed in.",
                    Style::default().fg(Color::DarkGray),
                ))]
            }
        }
    };

    let panel = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(panel, area);
}

/// Status line: transient toast when present, key hints otherwise.
fn render_status_line(app: &AppState, frame: &mut Frame, area: Rect) {
    let line = if let Some(toast) = &app.toast {
        Line::from(Span::styled(
            toast.message.clone(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ))
    } else {
        let action = match app.phase {
            Phase::SignedOut => "enter sign in",
            Phase::SigningIn => "esc cancel",
            Phase::SignedIn => "enter sign out",
        };
        Line::from(Span::styled(
            format!(" {action} | q quit"),
            Style::default().fg(Color::DarkGray),
        ))
    };

    frame.render_widget(Paragraph::new(line), area);
}
