//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{
    App, AppState, LoginFocus, Tab, UserFormFocus, UserFormState, MAX_PASSWORD_LENGTH,
    MAX_USERNAME_LENGTH, PAGE_SCROLL_SIZE,
};
use crate::models::{DicomSortColumn, UserSortColumn};

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Handle login overlay
    if matches!(app.state, AppState::LoggingIn) {
        return handle_login_input(app, key).await;
    }

    // Handle help overlay
    if matches!(app.state, AppState::ShowingHelp) {
        if matches!(
            key.code,
            KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')
        ) {
            app.state = AppState::Normal;
        }
        return Ok(false);
    }

    // Handle quit confirmation
    if matches!(app.state, AppState::ConfirmingQuit) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Quitting;
                return Ok(true);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        }
        return Ok(false);
    }

    // Handle delete confirmation
    if matches!(app.state, AppState::ConfirmingDelete) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.confirm_delete();
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.cancel_delete();
            }
            _ => {}
        }
        return Ok(false);
    }

    // Handle the create/edit user form
    if matches!(app.state, AppState::EditingUser) {
        handle_user_form_input(app, key);
        return Ok(false);
    }

    // Handle filter entry
    if matches!(app.state, AppState::Searching) {
        handle_search_input(app, key);
        return Ok(false);
    }

    // Global keys
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
            return Ok(false);
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
            return Ok(false);
        }
        KeyCode::Char('1') => app.current_tab = Tab::Dashboard,
        KeyCode::Char('2') => app.current_tab = Tab::Dicoms,
        KeyCode::Char('3') => app.current_tab = Tab::Users,
        KeyCode::Left => app.current_tab = app.current_tab.prev(),
        KeyCode::Right => app.current_tab = app.current_tab.next(),
        KeyCode::Char('u') => app.refresh_all_background(),
        KeyCode::Char('L') => app.logout(),
        KeyCode::Esc => app.search_query.clear(),
        _ => {
            // Tab-specific input
            match app.current_tab {
                Tab::Dashboard => handle_dashboard_input(app, key),
                Tab::Dicoms => handle_dicoms_input(app, key),
                Tab::Users => handle_users_input(app, key),
            }
        }
    }

    Ok(false)
}

fn handle_search_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Normal;
            app.search_query.clear();
        }
        KeyCode::Enter => {
            // Keep the filter active
            app.state = AppState::Normal;
        }
        KeyCode::Backspace => {
            app.search_query.pop();
            app.user_selection = 0;
        }
        KeyCode::Char(c) => {
            app.search_query.push(c);
            app.user_selection = 0;
        }
        _ => {}
    }
}

async fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            // Quit if on login screen
            app.state = AppState::Quitting;
            return Ok(true);
        }
        KeyCode::Down | KeyCode::Tab => {
            app.login_focus = match app.login_focus {
                LoginFocus::Username => LoginFocus::Password,
                LoginFocus::Password => LoginFocus::Button,
                LoginFocus::Button => LoginFocus::Username,
            };
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.login_focus = match app.login_focus {
                LoginFocus::Username => LoginFocus::Button,
                LoginFocus::Password => LoginFocus::Username,
                LoginFocus::Button => LoginFocus::Password,
            };
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Username => {
                app.login_focus = LoginFocus::Password;
            }
            LoginFocus::Password | LoginFocus::Button => {
                // Failures surface inline via login_error
                let _ = app.attempt_login().await;
            }
        },
        KeyCode::Backspace => {
            match app.login_focus {
                LoginFocus::Username => {
                    app.login_username.pop();
                }
                LoginFocus::Password => {
                    app.login_password.pop();
                }
                LoginFocus::Button => {}
            }
            app.login_error = None;
        }
        KeyCode::Char(c) => {
            match app.login_focus {
                LoginFocus::Username => {
                    if app.login_username.chars().count() < MAX_USERNAME_LENGTH {
                        app.login_username.push(c);
                    }
                }
                LoginFocus::Password => {
                    if app.login_password.chars().count() < MAX_PASSWORD_LENGTH {
                        app.login_password.push(c);
                    }
                }
                LoginFocus::Button => {}
            }
            app.login_error = None;
        }
        _ => {}
    }

    Ok(false)
}

/// What the user-form key handler decided while the form was borrowed
enum FormAction {
    None,
    Close,
    Submit,
}

fn handle_user_form_input(app: &mut App, key: KeyEvent) {
    let action = {
        let Some(form) = app.user_form.as_mut() else {
            app.state = AppState::Normal;
            return;
        };

        match key.code {
            KeyCode::Esc => FormAction::Close,
            KeyCode::Down | KeyCode::Tab => {
                form.next_focus();
                FormAction::None
            }
            KeyCode::Up | KeyCode::BackTab => {
                form.prev_focus();
                FormAction::None
            }
            KeyCode::Enter => {
                if form.focus == UserFormFocus::Submit {
                    FormAction::Submit
                } else {
                    form.next_focus();
                    FormAction::None
                }
            }
            KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')
                if form.focus == UserFormFocus::Role =>
            {
                form.role = form.role.toggle();
                form.error = None;
                FormAction::None
            }
            KeyCode::Backspace => {
                match form.focus {
                    UserFormFocus::Username => {
                        form.username.pop();
                    }
                    UserFormFocus::Password => {
                        form.password.pop();
                    }
                    UserFormFocus::ConfirmPassword => {
                        form.confirm_password.pop();
                    }
                    UserFormFocus::Role | UserFormFocus::Submit => {}
                }
                form.error = None;
                FormAction::None
            }
            KeyCode::Char(c) => {
                match form.focus {
                    UserFormFocus::Username => {
                        if form.username.chars().count() < MAX_USERNAME_LENGTH {
                            form.username.push(c);
                        }
                    }
                    UserFormFocus::Password => {
                        if form.password.chars().count() < MAX_PASSWORD_LENGTH {
                            form.password.push(c);
                        }
                    }
                    UserFormFocus::ConfirmPassword => {
                        if form.confirm_password.chars().count() < MAX_PASSWORD_LENGTH {
                            form.confirm_password.push(c);
                        }
                    }
                    UserFormFocus::Role | UserFormFocus::Submit => {}
                }
                form.error = None;
                FormAction::None
            }
            _ => FormAction::None,
        }
    };

    match action {
        FormAction::None => {}
        FormAction::Close => {
            app.user_form = None;
            app.state = AppState::Normal;
        }
        FormAction::Submit => app.submit_user_form(),
    }
}

fn handle_dashboard_input(app: &mut App, key: KeyEvent) {
    let len = app.pending_list.len();
    match key.code {
        KeyCode::Down => {
            if len > 0 {
                app.pending_selection = (app.pending_selection + 1).min(len - 1);
            }
        }
        KeyCode::Up => {
            app.pending_selection = app.pending_selection.saturating_sub(1);
        }
        KeyCode::PageDown => {
            if len > 0 {
                app.pending_selection = (app.pending_selection + PAGE_SCROLL_SIZE).min(len - 1);
            }
        }
        KeyCode::PageUp => {
            app.pending_selection = app.pending_selection.saturating_sub(PAGE_SCROLL_SIZE);
        }
        _ => {}
    }
}

fn handle_dicoms_input(app: &mut App, key: KeyEvent) {
    let len = app.sorted_dicoms().len();
    match key.code {
        KeyCode::Down => {
            if len > 0 {
                app.dicom_selection = (app.dicom_selection + 1).min(len - 1);
            }
        }
        KeyCode::Up => {
            app.dicom_selection = app.dicom_selection.saturating_sub(1);
        }
        KeyCode::PageDown => {
            if len > 0 {
                app.dicom_selection = (app.dicom_selection + PAGE_SCROLL_SIZE).min(len - 1);
            }
        }
        KeyCode::PageUp => {
            app.dicom_selection = app.dicom_selection.saturating_sub(PAGE_SCROLL_SIZE);
        }
        KeyCode::Char('[') => app.prev_dicom_page(),
        KeyCode::Char(']') => app.next_dicom_page(),
        KeyCode::Char('i') => app.sort_dicoms_by(DicomSortColumn::Id),
        KeyCode::Char('p') => app.sort_dicoms_by(DicomSortColumn::PatientId),
        KeyCode::Char('m') => app.sort_dicoms_by(DicomSortColumn::Modality),
        KeyCode::Char('s') => app.sort_dicoms_by(DicomSortColumn::Status),
        KeyCode::Char('v') => app.sort_dicoms_by(DicomSortColumn::Review),
        KeyCode::Char('y') => app.sort_dicoms_by(DicomSortColumn::StudyDate),
        _ => {}
    }
}

fn handle_users_input(app: &mut App, key: KeyEvent) {
    let len = app.visible_users().len();
    match key.code {
        KeyCode::Down => {
            if len > 0 {
                app.user_selection = (app.user_selection + 1).min(len - 1);
            }
        }
        KeyCode::Up => {
            app.user_selection = app.user_selection.saturating_sub(1);
        }
        KeyCode::PageDown => {
            if len > 0 {
                app.user_selection = (app.user_selection + PAGE_SCROLL_SIZE).min(len - 1);
            }
        }
        KeyCode::PageUp => {
            app.user_selection = app.user_selection.saturating_sub(PAGE_SCROLL_SIZE);
        }
        KeyCode::Char('/') => {
            app.state = AppState::Searching;
            app.search_query.clear();
            app.user_selection = 0;
        }
        KeyCode::Char('a') => {
            app.user_form = Some(UserFormState::create());
            app.state = AppState::EditingUser;
        }
        KeyCode::Char('e') | KeyCode::Enter => {
            if let Some(user) = app.selected_user().cloned() {
                app.user_form = Some(UserFormState::edit(&user));
                app.state = AppState::EditingUser;
            }
        }
        KeyCode::Char('d') => app.request_delete_selected(),
        KeyCode::Char('n') => app.sort_users_by(UserSortColumn::Username),
        KeyCode::Char('r') => app.sort_users_by(UserSortColumn::Role),
        _ => {}
    }
}
