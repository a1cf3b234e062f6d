use super::utils::{centered_rect, key_hints};
use super::*;
use crate::app::{AuthField, AuthKind, AuthModalState, TextInput};

pub fn render_auth_modal(frame: &mut Frame, app: &App) {
    let Some(modal) = &app.auth_modal else {
        return;
    };

    let area = centered_rect(56, 19, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![Line::from("")];
    if let Some(notice) = &modal.notice {
        lines.push(Line::from(Span::styled(
            notice.as_str(),
            Style::default().fg(Color::Green),
        )));
        lines.push(Line::from(""));
    }

    lines.push(input_line(modal, AuthField::Email, "Email   ", &modal.email, false));
    lines.push(input_line(
        modal,
        AuthField::Password,
        "Password",
        &modal.password,
        true,
    ));
    lines.push(Line::from(""));

    match &modal.error {
        Some(error) => lines.push(Line::from(Span::styled(
            error.as_str(),
            Style::default().fg(Color::Red),
        ))),
        None => lines.push(Line::from("")),
    }
    lines.push(Line::from(""));

    lines.push(button_line(modal, AuthField::Google, "continue with Google"));
    lines.push(button_line(modal, AuthField::Apple, "continue with Apple"));

    if modal.kind == AuthKind::Login {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Forgot your password? Reset it from the web app.",
            Style::default().fg(Color::DarkGray),
        )));
    }

    lines.push(Line::from(""));
    lines.push(key_hints(&[
        ("Tab", "next"),
        ("Enter", "submit"),
        ("Ctrl+T", "login↔sign up"),
        ("Esc", "close"),
    ]));

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title(format!(" {} ", modal.kind.title()))
                .title_alignment(Alignment::Center)
                .padding(Padding::horizontal(2)),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, area);
}

fn input_line(
    modal: &AuthModalState,
    field: AuthField,
    label: &'static str,
    input: &TextInput,
    secret: bool,
) -> Line<'static> {
    let focused = modal.focused == field;
    let label_style = if focused {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };

    let shown = if secret {
        input.masked()
    } else {
        input.value.clone()
    };
    let mut spans = vec![
        Span::styled(label, label_style),
        Span::raw("  "),
        Span::raw(shown),
    ];
    if focused {
        spans.push(Span::styled("█", Style::default().fg(Color::Yellow)));
    }
    Line::from(spans)
}

fn button_line(modal: &AuthModalState, field: AuthField, label: &'static str) -> Line<'static> {
    let style = if modal.focused == field {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };
    Line::from(Span::styled(format!("  {}  ", label), style))
}
