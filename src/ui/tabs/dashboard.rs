use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::App;
use crate::ui::styles;

/// Render the Dashboard tab - analysis counters above the review queue
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(5)])
        .split(area);

    render_analysis_panel(frame, app, chunks[0]);
    render_pending_table(frame, app, chunks[1]);
}

fn render_analysis_panel(frame: &mut Frame, app: &App, area: Rect) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
        ])
        .split(area);

    let analysis = &app.analysis;
    render_stat_card(frame, cards[0], "Total Dicoms", analysis.dicoms);
    render_stat_card(frame, cards[1], "Annotated", analysis.annotated);
    render_stat_card(frame, cards[2], "Unannotated", analysis.unannotated);
    render_stat_card(frame, cards[3], "Pending", analysis.pending);
}

fn render_stat_card(frame: &mut Frame, area: Rect, title: &str, value: i64) {
    let block = Block::default()
        .title(format!(" {} ", title))
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::muted_style());

    let inner_width = area.width.saturating_sub(3) as usize;
    let value_line = Line::from(Span::styled(
        format!("{:>width$}", value, width = inner_width),
        styles::title_style(),
    ));

    let paragraph = Paragraph::new(vec![Line::from(""), value_line]).block(block);
    frame.render_widget(paragraph, area);
}

fn render_pending_table(frame: &mut Frame, app: &App, area: Rect) {
    let header = Row::new([
        Cell::from("Id"),
        Cell::from("Patient"),
        Cell::from("Modality"),
        Cell::from("Status"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = app
        .pending_list
        .iter()
        .map(|item| {
            Row::new([
                Cell::from(item.id.clone()),
                Cell::from(item.patient_id.clone()),
                Cell::from(item.modality.clone()),
                Cell::from(item.status.to_string()),
            ])
            .style(styles::list_item_style())
        })
        .collect();

    let widths = [
        Constraint::Percentage(25),
        Constraint::Fill(2),
        Constraint::Fill(1),
        Constraint::Length(12),
    ];

    let title = format!(" Review Requests ({}) ", app.pending_list.len());

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(true)),
        )
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if !app.pending_list.is_empty() {
        state.select(Some(app.pending_selection));
    }

    frame.render_stateful_widget(table, area, &mut state);
}
