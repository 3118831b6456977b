//! Application state management for nova-admin.
//!
//! This module contains the core `App` struct that owns the session, the
//! API client, the cached screen data, and the background task channel.
//! It is mutated only from the main event loop.

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::api::{ApiClient, ApiError, UnauthorizedLatch};
use crate::auth::{CredentialStore, Session};
use crate::config::Config;
use crate::models::{
    Analysis, DicomInfo, DicomPage, DicomSortColumn, Role, UserInfo, UserPage, UserSortColumn,
};
use crate::utils::{cmp_ignore_case, contains_ignore_case};
use crate::validation::{self, FieldError};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
/// 32 is plenty for a full refresh (a handful of fetches) with headroom.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Maximum length for username input.
/// Usernames are short handles; 50 chars covers them with room to spare.
pub const MAX_USERNAME_LENGTH: usize = 50;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Number of rows to scroll on page up/down
pub const PAGE_SCROLL_SIZE: usize = 10;

/// Page size requested from `/admin/users`.
/// The backend paginates; 1000 effectively fetches the whole listing so
/// sorting and filtering can stay client-side.
const USER_LIST_LIMIT: i64 = 1000;

/// Status line shown while a background refresh is in flight
const REFRESHING_MESSAGE: &str = "Refreshing...";

// ============================================================================
// UI State Types
// ============================================================================

/// Main navigation tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Dashboard,
    Dicoms,
    Users,
}

impl Tab {
    /// Get the display title for this tab.
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Dashboard => "Dashboard",
            Tab::Dicoms => "Dicoms",
            Tab::Users => "Users",
        }
    }

    /// Get the next tab (wrapping around)
    pub fn next(&self) -> Self {
        match self {
            Tab::Dashboard => Tab::Dicoms,
            Tab::Dicoms => Tab::Users,
            Tab::Users => Tab::Dashboard,
        }
    }

    /// Get the previous tab (wrapping around)
    pub fn prev(&self) -> Self {
        match self {
            Tab::Dashboard => Tab::Users,
            Tab::Dicoms => Tab::Dashboard,
            Tab::Users => Tab::Dicoms,
        }
    }
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    Searching,
    ShowingHelp,
    LoggingIn,
    EditingUser,
    ConfirmingDelete,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFocus {
    Username,
    Password,
    Button,
}

/// Whether the user form creates a new account or edits an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserFormMode {
    Create,
    Edit { id: i64 },
}

/// User form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserFormFocus {
    Username,
    Role,
    Password,
    ConfirmPassword,
    Submit,
}

/// State of the create/edit account overlay
#[derive(Debug, Clone)]
pub struct UserFormState {
    pub mode: UserFormMode,
    pub username: String,
    pub role: Role,
    pub password: String,
    pub confirm_password: String,
    pub focus: UserFormFocus,
    pub error: Option<FieldError>,
}

impl UserFormState {
    pub fn create() -> Self {
        Self {
            mode: UserFormMode::Create,
            username: String::new(),
            role: Role::User,
            password: String::new(),
            confirm_password: String::new(),
            focus: UserFormFocus::Username,
            error: None,
        }
    }

    pub fn edit(user: &UserInfo) -> Self {
        Self {
            mode: UserFormMode::Edit { id: user.id },
            username: user.username.clone(),
            role: user.role,
            password: String::new(),
            confirm_password: String::new(),
            focus: UserFormFocus::Username,
            error: None,
        }
    }

    pub fn is_edit(&self) -> bool {
        matches!(self.mode, UserFormMode::Edit { .. })
    }

    /// Move focus to the next field. The edit form has no password fields.
    pub fn next_focus(&mut self) {
        self.focus = match (self.focus, self.is_edit()) {
            (UserFormFocus::Username, _) => UserFormFocus::Role,
            (UserFormFocus::Role, true) => UserFormFocus::Submit,
            (UserFormFocus::Role, false) => UserFormFocus::Password,
            (UserFormFocus::Password, _) => UserFormFocus::ConfirmPassword,
            (UserFormFocus::ConfirmPassword, _) => UserFormFocus::Submit,
            (UserFormFocus::Submit, _) => UserFormFocus::Username,
        };
    }

    /// Move focus to the previous field
    pub fn prev_focus(&mut self) {
        self.focus = match (self.focus, self.is_edit()) {
            (UserFormFocus::Username, _) => UserFormFocus::Submit,
            (UserFormFocus::Role, _) => UserFormFocus::Username,
            (UserFormFocus::Password, _) => UserFormFocus::Role,
            (UserFormFocus::ConfirmPassword, _) => UserFormFocus::Password,
            (UserFormFocus::Submit, true) => UserFormFocus::Role,
            (UserFormFocus::Submit, false) => UserFormFocus::ConfirmPassword,
        };
    }
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Result types sent from background fetch tasks back to the main loop.
enum FetchResult {
    /// Dashboard counters fetched successfully
    Analysis(Analysis),
    /// Pending review list fetched successfully
    PendingList(Vec<DicomInfo>),
    /// One page of imaging records fetched successfully
    DicomPage(DicomPage),
    /// Account listing fetched successfully
    Users(UserPage),
    /// Account created (username)
    UserCreated(String),
    /// Account updated; apply to the listing in place
    UserUpdated(UserInfo),
    /// Account deleted (username); the row was already removed optimistically
    UserDeleted(String),
    /// Delete failed; restore the row at its original position
    UserDeleteFailed { index: usize, user: UserInfo },
    /// A fetch or mutation failed
    Error(String),
}

// ============================================================================
// Main Application Struct
// ============================================================================

/// Main application state container
pub struct App {
    // Core services
    pub config: Config,
    pub session: Session,
    pub api: ApiClient,
    unauthorized: UnauthorizedLatch,

    // UI state
    pub state: AppState,
    pub current_tab: Tab,
    pub search_query: String,

    // Login form state
    pub login_username: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,

    // User form / delete confirmation state
    pub user_form: Option<UserFormState>,
    pub pending_delete: Option<UserInfo>,

    // Selection indices
    pub pending_selection: usize,
    pub dicom_selection: usize,
    pub user_selection: usize,

    // Sorting
    pub dicom_sort_column: DicomSortColumn,
    pub dicom_sort_ascending: bool,
    pub user_sort_column: UserSortColumn,
    pub user_sort_ascending: bool,

    // Cached data
    pub analysis: Analysis,
    pub pending_list: Vec<DicomInfo>,
    pub dicom_page: Option<DicomPage>,
    pub requested_page: i64,
    pub users: Vec<UserInfo>,

    // Background task channel
    fetch_rx: mpsc::Receiver<FetchResult>,
    fetch_tx: mpsc::Sender<FetchResult>,

    // Status message
    pub status_message: Option<String>,

    // Set when the listing must be re-fetched after a mutation
    users_reload_pending: bool,
}

impl App {
    /// Create a new application instance
    pub async fn new(config: Config) -> Result<Self> {
        let base_url = config.resolve_base_url()?;

        let data_dir = config
            .data_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."));

        // Hydrate the session from the persisted credential record
        let mut session = Session::new(data_dir);
        let found = session.load().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load session, starting unauthenticated");
            false
        });
        info!(found, "Session hydrated");

        let unauthorized = UnauthorizedLatch::new();
        let mut api = ApiClient::new(base_url, unauthorized.clone())?;

        // A persisted record obliges the client to carry its token
        if let Some(token) = session.token() {
            api.set_token(token.to_string());
        }

        let (fetch_tx, fetch_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        // Prefill the login form from env vars or the remembered username
        let login_username = std::env::var("NOVA_USERNAME")
            .ok()
            .or_else(|| config.last_username.clone())
            .unwrap_or_default();
        let login_password = std::env::var("NOVA_PASSWORD").unwrap_or_default();

        Ok(Self {
            config,
            session,
            api,
            unauthorized,

            state: AppState::Normal,
            current_tab: Tab::Dashboard,
            search_query: String::new(),

            login_username,
            login_password,
            login_focus: LoginFocus::Username,
            login_error: None,

            user_form: None,
            pending_delete: None,

            pending_selection: 0,
            dicom_selection: 0,
            user_selection: 0,

            dicom_sort_column: DicomSortColumn::StudyDate,
            dicom_sort_ascending: false,
            user_sort_column: UserSortColumn::Username,
            user_sort_ascending: true,

            analysis: Analysis::default(),
            pending_list: Vec::new(),
            dicom_page: None,
            requested_page: 1,
            users: Vec::new(),

            fetch_rx,
            fetch_tx,

            status_message: None,
            users_reload_pending: false,
        })
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Open the login overlay, prefilling the remembered password if the
    /// field is empty.
    pub fn start_login(&mut self) {
        self.state = AppState::LoggingIn;
        self.login_focus = if self.login_username.is_empty() {
            LoginFocus::Username
        } else {
            LoginFocus::Password
        };
        self.login_error = None;

        if self.login_password.is_empty() && !self.login_username.is_empty() {
            if let Ok(stored) = CredentialStore::get_password(&self.login_username) {
                self.login_password = stored;
            }
        }
    }

    /// Attempt login with the credentials from the login form
    pub async fn attempt_login(&mut self) -> Result<()> {
        let username = self.login_username.clone();
        let password = self.login_password.clone();

        // Field validation happens before any network call
        if let Err(e) = validation::validate_login(&username, &password) {
            self.login_error = Some(e.message.clone());
            return Err(anyhow::anyhow!(e.message));
        }

        self.login_error = None;

        match self.api.authenticate(&username, &password).await {
            Ok(session_data) => {
                if let Err(e) = CredentialStore::store(&username, &password) {
                    warn!(error = %e, "Failed to store credentials");
                }

                self.config.last_username = Some(username.clone());
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }

                self.session.update(session_data);
                if let Err(e) = self.session.save() {
                    warn!(error = %e, "Failed to save session");
                }

                if let Some(ref data) = self.session.data {
                    self.api.set_token(data.token.clone());
                }

                self.login_password.clear();
                self.state = AppState::Normal;
                info!(username = %username, "Login successful");

                self.refresh_all_background();
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Login failed");
                let user_message = match e.downcast_ref::<ApiError>() {
                    Some(ApiError::Unauthorized) => "Invalid username or password".to_string(),
                    Some(ApiError::NetworkError(_)) => {
                        "Unable to connect to server. Check your connection.".to_string()
                    }
                    _ => format!("Login failed: {}", e),
                };
                self.login_error = Some(user_message);
                Err(e)
            }
        }
    }

    /// Explicit logout. Also forgets the keychain password.
    pub fn logout(&mut self) {
        info!("Logging out");
        if let Some(ref data) = self.session.data {
            if let Err(e) = CredentialStore::delete(&data.username) {
                warn!(error = %e, "Failed to delete stored credential");
            }
        }
        self.login_password.clear();
        self.force_logout();
    }

    /// The AUTHENTICATED -> UNAUTHENTICATED transition: clear the session
    /// store, clear the client credential, erase the persisted record, and
    /// route to the login overlay. Idempotent - repeating it has no effect
    /// beyond the first invocation.
    pub fn force_logout(&mut self) {
        let was_authenticated = self.session.is_authenticated();
        if let Err(e) = self.session.clear() {
            warn!(error = %e, "Failed to erase persisted session");
        }
        self.api.clear_token();

        // Don't re-open (and reset) the login overlay if it is already up
        if was_authenticated || self.state != AppState::LoggingIn {
            self.start_login();
        }
    }

    /// Drain the unauthorized latch; called once per event-loop tick. Any
    /// number of concurrent 401 observations collapse into one transition.
    pub fn check_session_guard(&mut self) {
        if self.unauthorized.take() {
            let was_authenticated = self.is_authenticated();
            warn!("Unauthorized response observed, forcing re-login");
            self.force_logout();
            // A failed login raises the latch too; the overlay already
            // shows its own inline error in that case
            if was_authenticated {
                self.status_message = Some("Session expired. Please log in again.".to_string());
            }
        }
    }

    // =========================================================================
    // Background Data Refresh
    // =========================================================================

    /// Helper to send fetch results, logging any channel errors
    async fn send_result(tx: &mpsc::Sender<FetchResult>, result: FetchResult) {
        if let Err(e) = tx.send(result).await {
            error!(error = %e, "Failed to send fetch result - channel closed");
        }
    }

    /// Refresh everything the current screens show
    pub fn refresh_all_background(&mut self) {
        if !self.is_authenticated() {
            return;
        }
        info!("Starting background refresh of all data");
        self.refresh_dashboard();
        self.refresh_dicoms(self.requested_page);
        self.refresh_users();
        self.status_message = Some(REFRESHING_MESSAGE.to_string());
    }

    /// Fetch the analysis counters and the pending review list
    pub fn refresh_dashboard(&self) {
        if !self.api.has_token() {
            return;
        }
        let api = self.api.clone();
        let tx = self.fetch_tx.clone();

        tokio::spawn(async move {
            let (analysis, pending) = tokio::join!(api.fetch_analysis(), api.fetch_pending_list());

            match analysis {
                Ok(data) => Self::send_result(&tx, FetchResult::Analysis(data)).await,
                Err(e) => {
                    error!(error = %e, "Analysis fetch failed");
                    Self::send_result(&tx, FetchResult::Error(format!("analysis: {}", e))).await;
                }
            }

            match pending {
                Ok(data) => Self::send_result(&tx, FetchResult::PendingList(data)).await,
                Err(e) => {
                    error!(error = %e, "Pending list fetch failed");
                    Self::send_result(&tx, FetchResult::Error(format!("pending list: {}", e)))
                        .await;
                }
            }
        });
    }

    /// Fetch one page of imaging records
    pub fn refresh_dicoms(&self, page: i64) {
        if !self.api.has_token() {
            return;
        }
        let api = self.api.clone();
        let tx = self.fetch_tx.clone();
        let page = page.max(1);

        tokio::spawn(async move {
            match api.fetch_dicom_page(page).await {
                Ok(data) => Self::send_result(&tx, FetchResult::DicomPage(data)).await,
                Err(e) => {
                    error!(error = %e, page, "Dicom page fetch failed");
                    Self::send_result(&tx, FetchResult::Error(format!("dicoms: {}", e))).await;
                }
            }
        });
    }

    /// Fetch the account listing
    pub fn refresh_users(&self) {
        if !self.api.has_token() {
            return;
        }
        let api = self.api.clone();
        let tx = self.fetch_tx.clone();

        tokio::spawn(async move {
            match api.fetch_users(USER_LIST_LIMIT).await {
                Ok(data) => Self::send_result(&tx, FetchResult::Users(data)).await,
                Err(e) => {
                    error!(error = %e, "User list fetch failed");
                    Self::send_result(&tx, FetchResult::Error(format!("users: {}", e))).await;
                }
            }
        });
    }

    // =========================================================================
    // Dicom Pagination
    // =========================================================================

    pub fn next_dicom_page(&mut self) {
        let max_page = self
            .dicom_page
            .as_ref()
            .map(|p| p.page_count())
            .unwrap_or(1);
        if self.requested_page < max_page {
            self.requested_page += 1;
            self.dicom_selection = 0;
            self.refresh_dicoms(self.requested_page);
        }
    }

    pub fn prev_dicom_page(&mut self) {
        if self.requested_page > 1 {
            self.requested_page -= 1;
            self.dicom_selection = 0;
            self.refresh_dicoms(self.requested_page);
        }
    }

    // =========================================================================
    // Account Mutations
    // =========================================================================

    /// Validate and submit the user form. Validation failures stay inline
    /// and never issue a network call.
    pub fn submit_user_form(&mut self) {
        let Some(form) = self.user_form.as_mut() else {
            return;
        };

        match form.mode {
            UserFormMode::Create => {
                if let Err(e) = validation::validate_create_user(
                    &form.username,
                    &form.password,
                    &form.confirm_password,
                ) {
                    form.error = Some(e);
                    return;
                }

                let username = form.username.clone();
                let role = form.role;
                let password = form.password.clone();
                self.user_form = None;
                self.state = AppState::Normal;
                self.status_message = Some(format!("Creating {}...", username));

                let api = self.api.clone();
                let tx = self.fetch_tx.clone();
                tokio::spawn(async move {
                    match api.create_user(&username, role, &password).await {
                        Ok(()) => Self::send_result(&tx, FetchResult::UserCreated(username)).await,
                        Err(e) => {
                            error!(error = %e, username = %username, "User creation failed");
                            Self::send_result(
                                &tx,
                                FetchResult::Error(format!("Failed to create {}: {}", username, e)),
                            )
                            .await;
                        }
                    }
                });
            }
            UserFormMode::Edit { id } => {
                if let Err(e) = validation::validate_update_user(&form.username) {
                    form.error = Some(e);
                    return;
                }

                let updated = UserInfo {
                    id,
                    role: form.role,
                    username: form.username.clone(),
                };
                self.user_form = None;
                self.state = AppState::Normal;

                let api = self.api.clone();
                let tx = self.fetch_tx.clone();
                tokio::spawn(async move {
                    match api.update_user(updated.id, &updated.username, updated.role).await {
                        Ok(()) => Self::send_result(&tx, FetchResult::UserUpdated(updated)).await,
                        Err(e) => {
                            error!(error = %e, username = %updated.username, "User update failed");
                            Self::send_result(
                                &tx,
                                FetchResult::Error(format!(
                                    "Failed to update {}: {}",
                                    updated.username, e
                                )),
                            )
                            .await;
                        }
                    }
                });
            }
        }
    }

    /// Ask for confirmation before deleting the selected account
    pub fn request_delete_selected(&mut self) {
        if let Some(user) = self.selected_user().cloned() {
            self.pending_delete = Some(user);
            self.state = AppState::ConfirmingDelete;
        }
    }

    /// Confirmed delete: remove the row optimistically, then issue the
    /// request. On failure the row is restored at its original position.
    pub fn confirm_delete(&mut self) {
        self.state = AppState::Normal;
        let Some(user) = self.pending_delete.take() else {
            return;
        };

        let Some(index) = self.users.iter().position(|u| u.id == user.id) else {
            return;
        };
        let removed = self.users.remove(index);
        self.user_selection = self
            .user_selection
            .min(self.visible_users().len().saturating_sub(1));

        let api = self.api.clone();
        let tx = self.fetch_tx.clone();
        tokio::spawn(async move {
            match api.delete_user(removed.id).await {
                Ok(()) => {
                    Self::send_result(&tx, FetchResult::UserDeleted(removed.username.clone()))
                        .await;
                }
                Err(e) => {
                    error!(error = %e, username = %removed.username, "User delete failed");
                    Self::send_result(
                        &tx,
                        FetchResult::UserDeleteFailed {
                            index,
                            user: removed,
                        },
                    )
                    .await;
                }
            }
        });
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
        self.state = AppState::Normal;
    }

    // =========================================================================
    // Background Task Processing
    // =========================================================================

    /// Check for completed background tasks and process results
    pub fn check_background_tasks(&mut self) {
        // Collect all pending results first to avoid borrow conflicts
        let mut results = Vec::new();
        while let Ok(result) = self.fetch_rx.try_recv() {
            results.push(result);
        }

        for result in results {
            self.process_fetch_result(result);
        }

        if self.users_reload_pending {
            self.users_reload_pending = false;
            self.refresh_users();
        }
    }

    /// Clear the progress status line once data starts arriving, leaving
    /// error messages in place.
    fn clear_progress_message(&mut self) {
        if self.status_message.as_deref() == Some(REFRESHING_MESSAGE) {
            self.status_message = None;
        }
    }

    fn process_fetch_result(&mut self, result: FetchResult) {
        match result {
            FetchResult::Analysis(data) => {
                self.analysis = data;
                self.clear_progress_message();
            }
            FetchResult::PendingList(data) => {
                self.pending_list = data;
                self.pending_selection = self
                    .pending_selection
                    .min(self.pending_list.len().saturating_sub(1));
                self.clear_progress_message();
            }
            FetchResult::DicomPage(data) => {
                self.dicom_selection = self.dicom_selection.min(data.dicoms.len().saturating_sub(1));
                self.dicom_page = Some(data);
                self.clear_progress_message();
            }
            FetchResult::Users(page) => {
                self.users = page.users;
                self.user_selection = self
                    .user_selection
                    .min(self.visible_users().len().saturating_sub(1));
                self.clear_progress_message();
            }
            FetchResult::UserCreated(username) => {
                info!(username = %username, "User created");
                self.status_message = Some(format!("{} created", username));
                self.users_reload_pending = true;
            }
            FetchResult::UserUpdated(user) => {
                info!(username = %user.username, "User updated");
                self.status_message = Some(format!("{} updated", user.username));
                if let Some(existing) = self.users.iter_mut().find(|u| u.id == user.id) {
                    *existing = user;
                }
            }
            FetchResult::UserDeleted(username) => {
                info!(username = %username, "User deleted");
                self.status_message = Some(format!("{} deleted", username));
            }
            FetchResult::UserDeleteFailed { index, user } => {
                let at = index.min(self.users.len());
                self.status_message = Some(format!("Error: failed to delete {}", user.username));
                self.users.insert(at, user);
            }
            FetchResult::Error(msg) => {
                error!(error = %msg, "Background task error");
                let user_message = if msg.to_lowercase().contains("unauthorized") {
                    "Session expired. Please log in again.".to_string()
                } else if msg.to_lowercase().contains("network")
                    || msg.to_lowercase().contains("connect")
                {
                    "Network error. Check your connection.".to_string()
                } else {
                    format!("Error: {}", msg)
                };
                self.status_message = Some(user_message);
            }
        }
    }

    // =========================================================================
    // Table Views
    // =========================================================================

    /// Imaging records of the current page, sorted by the active column
    pub fn sorted_dicoms(&self) -> Vec<&DicomInfo> {
        let Some(ref page) = self.dicom_page else {
            return Vec::new();
        };

        let mut rows: Vec<&DicomInfo> = page.dicoms.iter().collect();
        rows.sort_by(|a, b| {
            let ord = match self.dicom_sort_column {
                DicomSortColumn::Id => cmp_ignore_case(&a.id, &b.id),
                DicomSortColumn::PatientId => cmp_ignore_case(&a.patient_id, &b.patient_id),
                DicomSortColumn::Modality => cmp_ignore_case(&a.modality, &b.modality),
                DicomSortColumn::Status => a.status.as_str().cmp(b.status.as_str()),
                DicomSortColumn::Review => a.review.as_str().cmp(b.review.as_str()),
                // ISO dates sort chronologically as strings
                DicomSortColumn::StudyDate => a.study_date.cmp(&b.study_date),
            };
            if self.dicom_sort_ascending {
                ord
            } else {
                ord.reverse()
            }
        });
        rows
    }

    /// Account listing after the username filter and active sort
    pub fn visible_users(&self) -> Vec<&UserInfo> {
        let mut rows: Vec<&UserInfo> = self
            .users
            .iter()
            .filter(|u| {
                self.search_query.is_empty()
                    || contains_ignore_case(&u.username, &self.search_query)
            })
            .collect();

        rows.sort_by(|a, b| {
            let ord = match self.user_sort_column {
                UserSortColumn::Role => a.role.as_str().cmp(b.role.as_str()),
                UserSortColumn::Username => cmp_ignore_case(&a.username, &b.username),
            };
            if self.user_sort_ascending {
                ord
            } else {
                ord.reverse()
            }
        });
        rows
    }

    pub fn selected_user(&self) -> Option<&UserInfo> {
        self.visible_users().get(self.user_selection).copied()
    }

    /// Select a sort column; a second press on the same column flips the
    /// direction.
    pub fn sort_dicoms_by(&mut self, column: DicomSortColumn) {
        if self.dicom_sort_column == column {
            self.dicom_sort_ascending = !self.dicom_sort_ascending;
        } else {
            self.dicom_sort_column = column;
            self.dicom_sort_ascending = true;
        }
    }

    pub fn sort_users_by(&mut self, column: UserSortColumn) {
        if self.user_sort_column == column {
            self.user_sort_ascending = !self.user_sort_ascending;
        } else {
            self.user_sort_column = column;
            self.user_sort_ascending = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SessionData;

    fn test_app(dir: &std::path::Path) -> App {
        let unauthorized = UnauthorizedLatch::new();
        let api = ApiClient::new("http://127.0.0.1:1", unauthorized.clone()).unwrap();
        let (fetch_tx, fetch_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        App {
            config: Config::default(),
            session: Session::new(dir.to_path_buf()),
            api,
            unauthorized,
            state: AppState::Normal,
            current_tab: Tab::Dashboard,
            search_query: String::new(),
            login_username: String::new(),
            login_password: String::new(),
            login_focus: LoginFocus::Username,
            login_error: None,
            user_form: None,
            pending_delete: None,
            pending_selection: 0,
            dicom_selection: 0,
            user_selection: 0,
            dicom_sort_column: DicomSortColumn::StudyDate,
            dicom_sort_ascending: false,
            user_sort_column: UserSortColumn::Username,
            user_sort_ascending: true,
            analysis: Analysis::default(),
            pending_list: Vec::new(),
            dicom_page: None,
            requested_page: 1,
            users: Vec::new(),
            fetch_rx,
            fetch_tx,
            status_message: None,
            users_reload_pending: false,
        }
    }

    fn authenticate(app: &mut App) {
        app.session.update(SessionData {
            token: "tok-123".to_string(),
            username: "alice".to_string(),
            role: Role::Admin,
        });
        app.session.save().unwrap();
        app.api.set_token("tok-123".to_string());
    }

    fn sample_users() -> Vec<UserInfo> {
        vec![
            UserInfo {
                id: 1,
                role: Role::Admin,
                username: "alice".to_string(),
            },
            UserInfo {
                id: 7,
                role: Role::User,
                username: "bob".to_string(),
            },
            UserInfo {
                id: 9,
                role: Role::User,
                username: "carol".to_string(),
            },
        ]
    }

    #[test]
    fn test_unauthorized_burst_forces_single_logout() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        authenticate(&mut app);

        // Several in-flight requests all observe a 401
        app.unauthorized.raise();
        app.unauthorized.raise();
        app.unauthorized.raise();

        app.check_session_guard();
        assert!(!app.is_authenticated());
        assert!(!app.api.has_token());
        assert_eq!(app.state, AppState::LoggingIn);
        assert!(!dir.path().join("session.json").exists());

        // The burst is drained; a second tick does nothing further
        app.status_message = None;
        app.check_session_guard();
        assert!(app.status_message.is_none());
        assert_eq!(app.state, AppState::LoggingIn);
    }

    #[test]
    fn test_force_logout_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        authenticate(&mut app);

        app.force_logout();
        let first_state = app.state;
        app.force_logout();

        assert_eq!(app.state, first_state);
        assert!(!app.is_authenticated());
        assert!(!app.api.has_token());
        assert!(!dir.path().join("session.json").exists());
    }

    #[tokio::test]
    async fn test_delete_is_optimistic_and_restored_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        authenticate(&mut app);
        app.users = sample_users();
        let original = app.users.clone();

        // Select bob (username sort: alice, bob, carol)
        app.user_selection = 1;
        app.request_delete_selected();
        assert_eq!(app.pending_delete.as_ref().unwrap().username, "bob");

        app.confirm_delete();
        // Row removed before the request resolves
        assert!(app.users.iter().all(|u| u.username != "bob"));

        // Simulate the failure coming back from the task
        app.process_fetch_result(FetchResult::UserDeleteFailed {
            index: 1,
            user: original[1].clone(),
        });

        assert_eq!(app.users, original);
        let message = app.status_message.as_deref().unwrap();
        assert!(message.contains("bob"));
    }

    #[test]
    fn test_create_with_mismatched_confirmation_stays_local() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        authenticate(&mut app);

        let mut form = UserFormState::create();
        form.username = "dave".to_string();
        form.password = "secret1".to_string();
        form.confirm_password = "secret2".to_string();
        app.user_form = Some(form);
        app.state = AppState::EditingUser;

        app.submit_user_form();

        // The form stays open with the error pinned to the confirmation
        // field; no task was spawned and no status message was set.
        let form = app.user_form.as_ref().expect("form should stay open");
        assert_eq!(form.error.as_ref().unwrap().field, "confirm_password");
        assert_eq!(app.state, AppState::EditingUser);
        assert!(app.status_message.is_none());
    }

    #[test]
    fn test_visible_users_filter_and_sort() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.users = sample_users();

        app.search_query = "bo".to_string();
        let visible = app.visible_users();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].username, "bob");

        app.search_query.clear();
        // Username ascending is the default; selecting it again flips
        app.sort_users_by(UserSortColumn::Username);
        let names: Vec<_> = app.visible_users().iter().map(|u| u.username.clone()).collect();
        assert_eq!(names, vec!["carol", "bob", "alice"]);
    }

    #[test]
    fn test_dicom_page_navigation_clamps() {
        let dir = tempfile::tempdir().unwrap();
        // No token, so page changes skip the fetch; clamping still applies
        let mut app = test_app(dir.path());
        app.dicom_page = Some(DicomPage {
            page: 1,
            total: 45,
            per_page: 20,
            dicoms: vec![],
        });

        app.prev_dicom_page();
        assert_eq!(app.requested_page, 1);

        app.next_dicom_page();
        app.next_dicom_page();
        app.next_dicom_page(); // beyond page_count (3)
        assert_eq!(app.requested_page, 3);
    }

    #[test]
    fn test_tab_cycle_wraps() {
        assert_eq!(Tab::Users.next(), Tab::Dashboard);
        assert_eq!(Tab::Dashboard.prev(), Tab::Users);
        assert_eq!(Tab::Dicoms.title(), "Dicoms");
    }

    #[test]
    fn test_edit_form_focus_skips_password_fields() {
        let user = UserInfo {
            id: 7,
            role: Role::User,
            username: "bob".to_string(),
        };
        let mut form = UserFormState::edit(&user);
        assert_eq!(form.focus, UserFormFocus::Username);
        form.next_focus();
        assert_eq!(form.focus, UserFormFocus::Role);
        form.next_focus();
        assert_eq!(form.focus, UserFormFocus::Submit);
        form.prev_focus();
        assert_eq!(form.focus, UserFormFocus::Role);
    }
}
