use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{App, AppState, LoginFocus, Tab, UserFormFocus, UserFormMode};
use crate::models::Role;

use super::styles;
use super::tabs::{dashboard, dicoms, users};

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(3), // Tabs
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_tabs(frame, app, chunks[1]);
    render_main_content(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    // Render overlays
    if matches!(app.state, AppState::ShowingHelp) {
        render_help_overlay(frame);
    }

    if matches!(app.state, AppState::LoggingIn) {
        render_login_overlay(frame, app);
    }

    if matches!(app.state, AppState::EditingUser) {
        render_user_form_overlay(frame, app);
    }

    if matches!(app.state, AppState::ConfirmingDelete) {
        render_delete_overlay(frame, app);
    }

    if matches!(app.state, AppState::ConfirmingQuit) {
        render_quit_overlay(frame);
    }
}

fn render_title_bar(frame: &mut Frame, _app: &App, area: Rect) {
    let title = "  Nova Admin";
    let help_hint = "[?] Help";
    let title_len = title.len();

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(
            area.width
                .saturating_sub(title_len as u16 + help_hint.len() as u16 + 4)
                as usize,
        )),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let main_tabs = [
        ("[1] Dashboard", app.current_tab == Tab::Dashboard),
        ("[2] Dicoms", app.current_tab == Tab::Dicoms),
        ("[3] Users", app.current_tab == Tab::Users),
    ];

    let mut spans = vec![Span::raw(" ")];
    for (i, (label, selected)) in main_tabs.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        if *selected {
            spans.push(Span::styled(*label, styles::tab_style(true)));
        } else {
            spans.push(Span::styled(*label, styles::muted_style()));
        }
    }

    let line = Line::from(spans);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(line).block(block);
    frame.render_widget(paragraph, area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.current_tab {
        Tab::Dashboard => dashboard::render(frame, app, area),
        Tab::Dicoms => dicoms::render(frame, app, area),
        Tab::Users => users::render(frame, app, area),
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = "[u]pdate | [L]ogout | [q]uit";

    let left_text = if let Some(ref msg) = app.status_message {
        format!(" {} ", msg)
    } else if let Some(ref data) = app.session.data {
        format!(" {} ({}) ", data.username, data.role)
    } else {
        " Not logged in ".to_string()
    };

    let right_text = format!(" {} ", shortcuts);

    let width = area.width as usize;
    let padding_len = width
        .saturating_sub(left_text.len())
        .saturating_sub(right_text.len());

    let left_style = if app
        .status_message
        .as_deref()
        .map(|m| m.starts_with("Error") || m.starts_with("Session expired"))
        .unwrap_or(false)
    {
        styles::error_style()
    } else {
        styles::muted_style()
    };

    let status_line = Line::from(vec![
        Span::styled(left_text, left_style),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

// ============================================================================
// Overlays
// ============================================================================

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(52, 22, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let help_text = vec![
        Line::from(Span::styled("  Nova Admin", styles::title_style())),
        Line::from(Span::styled(
            format!("  version {}", version),
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        help_line("  1-3       ", "Switch tabs"),
        help_line("  ←/→       ", "Prev/next tab"),
        help_line("  ↑/↓       ", "Navigate list"),
        help_line("  PgUp/PgDn ", "Scroll by page"),
        help_line("  [ / ]     ", "Prev/next dicom page"),
        Line::from(""),
        Line::from(Span::styled(" Actions", styles::highlight_style())),
        help_line("  a         ", "Add user (Users tab)"),
        help_line("  e / Enter ", "Edit user (Users tab)"),
        help_line("  d         ", "Delete user (Users tab)"),
        help_line("  /         ", "Filter users"),
        help_line("  u         ", "Update data from server"),
        help_line("  L         ", "Log out"),
        help_line("  q         ", "Quit"),
        Line::from(""),
        Line::from(Span::styled(
            "  Press Esc to close",
            styles::muted_style(),
        )),
    ];

    let block = Block::default()
        .title(" Help ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

fn help_line(key: &str, desc: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(key.to_string(), styles::help_key_style()),
        Span::styled(desc.to_string(), styles::help_desc_style()),
    ])
}

fn render_login_overlay(frame: &mut Frame, app: &App) {
    let height = if app.login_error.is_some() { 13 } else { 11 };
    let area = centered_rect_fixed(46, height, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(Span::styled(
            "            N O V A   A D M I N",
            styles::title_style(),
        )),
        Line::from(Span::styled(
            "        Sign in to the imaging console",
            styles::muted_style(),
        )),
        Line::from(""),
    ];

    lines.push(field_line(
        "Username",
        &app.login_username,
        app.login_focus == LoginFocus::Username,
        false,
    ));
    lines.push(Line::from(""));
    lines.push(field_line(
        "Password",
        &app.login_password,
        app.login_focus == LoginFocus::Password,
        true,
    ));
    lines.push(Line::from(""));

    let button_style = if app.login_focus == LoginFocus::Button {
        styles::selected_style()
    } else {
        styles::muted_style()
    };
    lines.push(Line::from(vec![
        Span::raw("                "),
        Span::styled("[ Sign in ]", button_style),
    ]));

    if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("  {}", error),
            styles::error_style(),
        )));
    }

    let block = Block::default()
        .title(" Login ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_user_form_overlay(frame: &mut Frame, app: &App) {
    let Some(ref form) = app.user_form else {
        return;
    };

    let is_edit = matches!(form.mode, UserFormMode::Edit { .. });
    let base_height = if is_edit { 10 } else { 14 };
    let height = if form.error.is_some() {
        base_height + 2
    } else {
        base_height
    };
    let area = centered_rect_fixed(46, height, frame.area());
    frame.render_widget(Clear, area);

    let title = if is_edit { " Edit User " } else { " Add User " };

    let mut lines = vec![Line::from("")];

    lines.push(labeled_field_line(
        "Username",
        &form.username,
        form.focus == UserFormFocus::Username,
        false,
        field_has_error(form, "username"),
    ));
    lines.push(Line::from(""));

    // Role selector
    let role_focused = form.focus == UserFormFocus::Role;
    let role_style = if role_focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let admin_marker = if form.role == Role::Admin { "●" } else { "○" };
    let user_marker = if form.role == Role::User { "●" } else { "○" };
    lines.push(Line::from(vec![
        Span::styled("  Role         ", styles::muted_style()),
        Span::styled(
            format!("{} ADMIN   {} USER", admin_marker, user_marker),
            role_style,
        ),
    ]));
    lines.push(Line::from(""));

    if !is_edit {
        lines.push(labeled_field_line(
            "Password",
            &form.password,
            form.focus == UserFormFocus::Password,
            true,
            field_has_error(form, "password"),
        ));
        lines.push(Line::from(""));
        lines.push(labeled_field_line(
            "Confirm",
            &form.confirm_password,
            form.focus == UserFormFocus::ConfirmPassword,
            true,
            field_has_error(form, "confirm_password"),
        ));
        lines.push(Line::from(""));
    }

    let button_style = if form.focus == UserFormFocus::Submit {
        styles::selected_style()
    } else {
        styles::muted_style()
    };
    lines.push(Line::from(vec![
        Span::raw("                "),
        Span::styled("[ Save ]", button_style),
    ]));

    if let Some(ref error) = form.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("  {}", error.message),
            styles::error_style(),
        )));
    }

    let block = Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn field_has_error(form: &crate::app::UserFormState, field: &str) -> bool {
    form.error.as_ref().map(|e| e.field == field).unwrap_or(false)
}

/// A login-overlay field: label, value (masked for passwords), cursor mark
fn field_line(label: &str, value: &str, focused: bool, masked: bool) -> Line<'static> {
    let display = if masked {
        "•".repeat(value.chars().count())
    } else {
        value.to_string()
    };

    let value_style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };

    let cursor = if focused { "█" } else { " " };

    Line::from(vec![
        Span::styled(format!("  {:<10}", label), styles::muted_style()),
        Span::styled(display, value_style),
        Span::styled(cursor.to_string(), value_style),
    ])
}

/// A user-form field; the label turns red when validation pinned an error
/// to it.
fn labeled_field_line(
    label: &str,
    value: &str,
    focused: bool,
    masked: bool,
    has_error: bool,
) -> Line<'static> {
    let display = if masked {
        "•".repeat(value.chars().count())
    } else {
        value.to_string()
    };

    let label_style = if has_error {
        styles::error_style()
    } else {
        styles::muted_style()
    };

    let value_style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };

    let cursor = if focused { "█" } else { " " };

    Line::from(vec![
        Span::styled(format!("  {:<13}", label), label_style),
        Span::styled(display, value_style),
        Span::styled(cursor.to_string(), value_style),
    ])
}

fn render_delete_overlay(frame: &mut Frame, app: &App) {
    let Some(ref user) = app.pending_delete else {
        return;
    };

    let area = centered_rect_fixed(50, 7, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("  Delete user \"{}\" ({})?", user.username, user.role),
            styles::list_item_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("  [y]", styles::help_key_style()),
            Span::styled(" delete   ", styles::help_desc_style()),
            Span::styled("[n]", styles::help_key_style()),
            Span::styled(" cancel", styles::help_desc_style()),
        ]),
    ];

    let block = Block::default()
        .title(" Confirm Delete ")
        .title_style(styles::error_style())
        .borders(Borders::ALL)
        .border_style(styles::error_style());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(36, 7, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled("  Quit Nova Admin?", styles::list_item_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled("  [y]", styles::help_key_style()),
            Span::styled(" quit   ", styles::help_desc_style()),
            Span::styled("[n]", styles::help_key_style()),
            Span::styled(" stay", styles::help_desc_style()),
        ]),
    ];

    let block = Block::default()
        .title(" Quit ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// A fixed-size rectangle centered in `r`, clamped to its bounds
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let width = width.min(r.width);
    let height = height.min(r.height);
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}
