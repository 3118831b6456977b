use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::{App, AppState};
use crate::models::{Role, UserSortColumn};
use crate::ui::styles;

/// Render the Users tab - account table with filter and actions
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(1)])
        .split(area);

    render_user_table(frame, app, chunks[0]);
    render_filter_line(frame, app, chunks[1]);
}

fn render_user_table(frame: &mut Frame, app: &App, area: Rect) {
    let visible = app.visible_users();

    let sort_indicator = |col: UserSortColumn| {
        if app.user_sort_column == col {
            if app.user_sort_ascending {
                " ▲"
            } else {
                " ▼"
            }
        } else {
            ""
        }
    };

    let header_cells = [
        Cell::from(format!("Role{}", sort_indicator(UserSortColumn::Role))),
        Cell::from(format!(
            "Username{}",
            sort_indicator(UserSortColumn::Username)
        )),
    ];

    let header = Row::new(header_cells).style(styles::title_style()).height(1);

    let rows: Vec<Row> = visible
        .iter()
        .map(|user| {
            // Admin accounts stand out, mirroring the destructive badge
            let role_style = match user.role {
                Role::Admin => styles::error_style(),
                Role::User => styles::list_item_style(),
            };

            Row::new([
                Cell::from(Span::styled(user.role.to_string(), role_style)),
                Cell::from(user.username.clone()),
            ])
            .style(styles::list_item_style())
        })
        .collect();

    let widths = [Constraint::Length(8), Constraint::Fill(1)];

    let title = format!(
        " Users ({}) - [a]dd [e]dit [d]elete · sort [r]ole [n]ame ",
        visible.len()
    );

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
    if !visible.is_empty() {
        state.select(Some(app.user_selection));
    }

    frame.render_stateful_widget(table, area, &mut state);
}

fn render_filter_line(frame: &mut Frame, app: &App, area: Rect) {
    let line = if matches!(app.state, AppState::Searching) {
        Line::from(vec![
            Span::styled(" Filter: ", styles::muted_style()),
            Span::styled(app.search_query.clone(), styles::search_style()),
            Span::styled("█", styles::search_style()),
        ])
    } else if !app.search_query.is_empty() {
        Line::from(vec![
            Span::styled(" Filter: ", styles::muted_style()),
            Span::styled(app.search_query.clone(), styles::search_style()),
            Span::styled("  (Esc to clear)", styles::muted_style()),
        ])
    } else {
        Line::from(Span::styled(" [/] filter", styles::muted_style()))
    };

    frame.render_widget(Paragraph::new(line), area);
}
