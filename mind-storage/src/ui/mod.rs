use crate::app::{App, Screen};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Padding, Paragraph, Wrap},
    Frame,
};

mod auth_modal;
mod calendar_views;
mod detail_view;
mod landing_view;
pub(super) mod utils;

/// Draw the whole screen: one view per navigation state, then the auth modal
/// and the alert on top.
pub fn render(frame: &mut Frame, app: &mut App) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, root[0], app);

    let body = root[1];
    match app.nav.screen {
        Screen::Landing => landing_view::render_landing(frame, app, body),
        Screen::Year => calendar_views::render_year_view(frame, app, body),
        Screen::Month => calendar_views::render_month_view(frame, app, body),
        Screen::Day => calendar_views::render_day_view(frame, app, body),
        Screen::Detail => detail_view::render_detail_view(frame, app, body),
    }

    render_footer(frame, root[2], app);

    if app.auth_modal.is_some() {
        auth_modal::render_auth_modal(frame, app);
    }
    if app.alert.is_some() {
        render_alert_overlay(frame, app);
    }
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let Some(user) = &app.user else {
        return;
    };
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Min(0)])
        .split(area);

    frame.render_widget(
        Paragraph::new(Span::styled(
            " mind storage",
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
        cols[0],
    );
    let who = user.email.as_deref().unwrap_or("signed in");
    frame.render_widget(
        Paragraph::new(Span::styled(
            format!("{} ", who),
            Style::default().fg(Color::DarkGray),
        ))
        .alignment(Alignment::Right),
        cols[1],
    );
}

fn render_footer(frame: &mut Frame, area: Rect, app: &mut App) {
    let throbber_area = Rect {
        x: area.x + 1,
        y: area.y,
        width: 1,
        height: 1,
    };
    let text_area = Rect {
        x: area.x + 3,
        y: area.y,
        width: area.width.saturating_sub(3),
        height: 1,
    };

    if app.is_loading {
        let throbber = throbber_widgets_tui::Throbber::default()
            .style(Style::default().fg(Color::Yellow))
            .throbber_style(Style::default().fg(Color::Yellow))
            .throbber_set(throbber_widgets_tui::BRAILLE_SIX)
            .use_type(throbber_widgets_tui::WhichUse::Spin);
        frame.render_stateful_widget(throbber, throbber_area, &mut app.throbber_state);
    }

    let line = match &app.status_message {
        Some(message) => Line::from(Span::styled(
            message.as_str(),
            Style::default().fg(Color::Yellow),
        )),
        None => utils::key_hints(help_for(app)),
    };
    frame.render_widget(Paragraph::new(line), text_area);
}

fn help_for(app: &App) -> &'static [(&'static str, &'static str)] {
    if app.auth_modal.is_some() {
        return &[];
    }
    match app.nav.screen {
        Screen::Landing => &[("l", "login"), ("s", "sign up"), ("q", "quit")],
        Screen::Year => &[
            ("↑↓", "move"),
            ("Enter", "open"),
            ("L", "log out"),
            ("q", "quit"),
        ],
        Screen::Month => &[
            ("↑↓", "move"),
            ("←→", "year"),
            ("Enter", "open"),
            ("Esc", "back"),
        ],
        Screen::Day => &[
            ("↑↓", "move"),
            ("←→", "month"),
            ("Enter", "open"),
            ("Esc", "back"),
        ],
        Screen::Detail if app.detail.editing => &[("Esc", "done"), ("Enter", "new line")],
        Screen::Detail => &[
            ("←→", "day"),
            ("Tab", "switch"),
            ("Enter", "write"),
            ("d", "…"),
            ("Esc", "back"),
        ],
    }
}

fn render_alert_overlay(frame: &mut Frame, app: &App) {
    let Some(alert) = &app.alert else {
        return;
    };

    let area = utils::centered_rect(60, 9, frame.area());
    frame.render_widget(Clear, area);

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            alert.message.as_str(),
            Style::default().fg(Color::White),
        )),
        Line::from(""),
        Line::from(Span::styled("[Enter] OK", Style::default().fg(Color::Yellow))),
    ];

    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .title(format!(" {} ", alert.title))
                .padding(Padding::horizontal(1)),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}
