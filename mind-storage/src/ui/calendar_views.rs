use super::utils::{data_style, highlighted, month_name, paging_header, status_style};
use super::*;
use crate::app::Transition;
use crate::date_engine::{last_selectable_day, last_selectable_month, CivilDate, FIRST_YEAR};

pub fn render_year_view(frame: &mut Frame, app: &App, body: Rect) {
    let today = app.today();
    let lines: Vec<Line> = (FIRST_YEAR..=today.year)
        .map(|year| {
            let style = highlighted(data_style(app.entries.has_data_for_year(year)), app.highlight == year);
            Line::from(Span::styled(format!("  {}  ", year), style))
        })
        .collect();

    render_list(frame, body, Line::from(" years "), lines, app.highlight - FIRST_YEAR);
}

pub fn render_month_view(frame: &mut Frame, app: &App, body: Rect) {
    let today = app.today();
    let year = app.nav.selected_year;
    let lines: Vec<Line> = (1..=last_selectable_month(year, today))
        .map(|month| {
            let style = highlighted(
                data_style(app.entries.has_data_for_month(year, month)),
                app.highlight == i32::from(month),
            );
            Line::from(Span::styled(format!("  {:<9}  ", month_name(month)), style))
        })
        .collect();

    let header = paging_header(
        year.to_string(),
        app.can_navigate(Transition::Prev),
        app.can_navigate(Transition::Next),
    );
    render_list(frame, body, header, lines, app.highlight - 1);
}

pub fn render_day_view(frame: &mut Frame, app: &App, body: Rect) {
    let today = app.today();
    let (year, month) = (app.nav.selected_year, app.nav.selected_month);
    let lines: Vec<Line> = (1..=last_selectable_day(year, month, today))
        .map(|day| {
            let status = app.entries.status_of(CivilDate::new(year, month, day));
            let style = highlighted(status_style(status), app.highlight == i32::from(day));
            Line::from(Span::styled(format!("  {}/{}  ", month, day), style))
        })
        .collect();

    let header = paging_header(
        format!("{} {}", month_name(month), year),
        app.can_navigate(Transition::Prev),
        app.can_navigate(Transition::Next),
    );
    render_list(frame, body, header, lines, app.highlight - 1);
}

/// Centered bordered column, scrolled so the highlighted row stays visible.
fn render_list(frame: &mut Frame, body: Rect, title: Line, lines: Vec<Line>, selected: i32) {
    let height = (lines.len() as u16 + 2).min(body.height);
    let area = utils::centered_rect(28, height, body);

    let visible = usize::from(area.height.saturating_sub(2)).max(1);
    let selected = usize::try_from(selected).unwrap_or_default();
    let scroll = selected.saturating_sub(visible - 1);

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(title)
                .title_alignment(Alignment::Center),
        )
        .alignment(Alignment::Center)
        .scroll((scroll as u16, 0));

    frame.render_widget(paragraph, area);
}
