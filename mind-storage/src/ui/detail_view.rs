use super::utils::paging_header;
use super::*;
use crate::app::{TextInput, Transition};
use crate::entry_store::EntryField;

pub fn render_detail_view(frame: &mut Frame, app: &App, body: Rect) {
    let date = app.nav.selected_date();
    let area = Rect {
        x: body.x + body.width.saturating_sub(body.width.min(72)) / 2,
        y: body.y,
        width: body.width.min(72),
        height: body.height,
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Percentage(50),
            Constraint::Percentage(50),
        ])
        .split(area);

    let header = paging_header(
        format!("{}/{}", date.month, date.day),
        app.can_navigate(Transition::Prev),
        app.can_navigate(Transition::Next),
    );
    frame.render_widget(Paragraph::new(header).alignment(Alignment::Center), rows[0]);

    render_entry_box(frame, app, rows[1], EntryField::Happy);
    render_entry_box(frame, app, rows[2], EntryField::Sad);
}

fn render_entry_box(frame: &mut Frame, app: &App, area: Rect, field: EntryField) {
    let detail = &app.detail;
    let focused = detail.focused == field;
    let editing = focused && detail.editing;

    let (face, accent) = match field {
        EntryField::Happy => (" :) ", Color::Yellow),
        EntryField::Sad => (" :( ", Color::Red),
    };
    let border_style = if editing {
        Style::default().fg(accent).add_modifier(Modifier::BOLD)
    } else if focused {
        Style::default().fg(accent)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(face)
        .padding(Padding::horizontal(1));
    if !detail.is_covered(field) {
        block = block.title(Line::from(" … ").alignment(Alignment::Right));
    }

    let mut lines = if detail.is_covered(field) {
        covered_lines()
    } else {
        text_lines(detail.input(field), editing)
    };

    if detail.delete_menu == Some(field) {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("Clear this note? ", Style::default().fg(Color::White)),
            Span::styled("[y] Yes", Style::default().fg(Color::Red)),
            Span::raw("    "),
            Span::styled("[n] No", Style::default().fg(Color::White)),
        ]));
    }

    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false }),
        area,
    );
}

/// The band-aid over the sad box.
fn covered_lines() -> Vec<Line<'static>> {
    vec![
        Line::from(""),
        Line::from(Span::styled(
            "  ╲╱╲╱  band-aid  ╲╱╲╱",
            Style::default().fg(Color::Rgb(222, 184, 135)),
        )),
        Line::from(Span::styled(
            "  press Enter to peel it off",
            Style::default().fg(Color::DarkGray),
        )),
    ]
}

fn text_lines(input: &TextInput, editing: bool) -> Vec<Line<'static>> {
    if !editing {
        if input.value.is_empty() {
            return vec![Line::from(Span::styled(
                "nothing written yet",
                Style::default().fg(Color::DarkGray),
            ))];
        }
        return input
            .value
            .split('\n')
            .map(|line| Line::from(line.to_string()))
            .collect();
    }

    // Draw the cursor as a block between the two halves.
    let (before, after) = input.split_at_cursor();
    let cursor = Span::styled("█", Style::default().fg(Color::Yellow));
    let text = format!("{}\u{0}{}", before, after);
    text.split('\n')
        .map(|line| match line.split_once('\u{0}') {
            Some((left, right)) => Line::from(vec![
                Span::raw(left.to_string()),
                cursor.clone(),
                Span::raw(right.to_string()),
            ]),
            None => Line::from(line.to_string()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_is_drawn_on_the_right_line() {
        let mut input = TextInput::from_str("one\ntwo");
        input.move_left();
        let lines = text_lines(&input, true);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].spans.len(), 1);
        let second: Vec<&str> = lines[1].spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(second, vec!["tw", "█", "o"]);
    }

    #[test]
    fn empty_note_shows_placeholder_when_not_editing() {
        let lines = text_lines(&TextInput::new(), false);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].spans[0].content, "nothing written yet");
    }
}
