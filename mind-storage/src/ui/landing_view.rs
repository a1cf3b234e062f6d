use super::utils::centered_rect;
use super::*;
use crate::app::AuthKind;

pub fn render_landing(frame: &mut Frame, app: &App, body: Rect) {
    let area = centered_rect(44, 11, body);

    let button = |kind: AuthKind| {
        let style = if app.landing_choice == kind {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        Span::styled(format!("  {}  ", kind.title()), style)
    };

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            "mind storage",
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "keep the happy days, let the sad ones go",
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(""),
        Line::from(""),
        Line::from(vec![
            button(AuthKind::Login),
            Span::raw("   "),
            button(AuthKind::SignUp),
        ]),
    ];

    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        )
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}
