use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::App;
use crate::models::{DicomSortColumn, DicomStatus};
use crate::ui::styles;
use crate::utils::format_study_date;

/// Render the Dicoms tab - paginated table with sortable columns
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(1)])
        .split(area);

    render_dicom_table(frame, app, chunks[0]);
    render_page_line(frame, app, chunks[1]);
}

fn render_dicom_table(frame: &mut Frame, app: &App, area: Rect) {
    let sorted = app.sorted_dicoms();

    // Build header with sort indicators
    let sort_indicator = |col: DicomSortColumn| {
        if app.dicom_sort_column == col {
            if app.dicom_sort_ascending {
                " ▲"
            } else {
                " ▼"
            }
        } else {
            ""
        }
    };

    let header_cells = [
        Cell::from(format!("Id{}", sort_indicator(DicomSortColumn::Id))),
        Cell::from(format!(
            "Patient{}",
            sort_indicator(DicomSortColumn::PatientId)
        )),
        Cell::from(format!(
            "Modality{}",
            sort_indicator(DicomSortColumn::Modality)
        )),
        Cell::from(format!("Status{}", sort_indicator(DicomSortColumn::Status))),
        Cell::from(format!("Review{}", sort_indicator(DicomSortColumn::Review))),
        Cell::from(format!(
            "Study Date{}",
            sort_indicator(DicomSortColumn::StudyDate)
        )),
    ];

    let header = Row::new(header_cells).style(styles::title_style()).height(1);

    let rows: Vec<Row> = sorted
        .iter()
        .map(|item| {
            let status_style = match item.status {
                DicomStatus::Annotated => styles::success_style(),
                DicomStatus::Unannotated => styles::highlight_style(),
            };

            Row::new([
                Cell::from(item.id.clone()),
                Cell::from(item.patient_id.clone()),
                Cell::from(item.modality.clone()),
                Cell::from(Span::styled(item.status.to_string(), status_style)),
                Cell::from(item.review.to_string()),
                Cell::from(format_study_date(&item.study_date)),
            ])
            .style(styles::list_item_style())
        })
        .collect();

    let widths = [
        Constraint::Percentage(20),
        Constraint::Fill(2),
        Constraint::Length(10),
        Constraint::Length(13),
        Constraint::Length(9),
        Constraint::Length(18),
    ];

    let total = app.dicom_page.as_ref().map(|p| p.total).unwrap_or(0);
    let sort_help = "[i]d [p]atient [m]odality [s]tatus re[v]iew stud[y]date";
    let title = format!(" Dicoms ({}) - {} ", total, sort_help);

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
    if !sorted.is_empty() {
        state.select(Some(app.dicom_selection));
    }

    frame.render_stateful_widget(table, area, &mut state);
}

fn render_page_line(frame: &mut Frame, app: &App, area: Rect) {
    let (page, pages, total) = match app.dicom_page {
        Some(ref p) => (p.page, p.page_count(), p.total),
        None => (app.requested_page, 1, 0),
    };

    let line = Line::from(Span::styled(
        format!(
            " Page {}/{} · {} records · [ = prev page, ] = next page",
            page, pages, total
        ),
        styles::muted_style(),
    ));

    frame.render_widget(Paragraph::new(line), area);
}
