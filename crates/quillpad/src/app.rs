use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::command::{self, Command};
use crate::config::Config;
use crate::file_manager::FileManager;
use crate::replace::ReplaceOutcome;
use crate::search::MatchStatus;
use crate::session::EditorSession;
use crate::ui_state::{Mode, SearchFocus, UiState};

const TAB_SIZE: usize = 4;

/// The running application: session, preferences, file binding and UI state,
/// with one key handler per mode.
pub struct App {
    pub session: EditorSession,
    pub config: Config,
    pub files: FileManager,
    pub ui: UiState,
}

impl App {
    pub async fn new() -> Result<Self> {
        let config = Config::load().await?;
        Ok(Self {
            session: EditorSession::new(),
            config,
            files: FileManager::new(),
            ui: UiState::new(),
        })
    }

    pub fn should_quit(&self) -> bool {
        self.ui.should_quit()
    }

    pub fn is_modified(&self) -> bool {
        self.session.is_modified()
    }

    pub fn update_status(&mut self) {
        self.ui.update_status();
    }

    pub async fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        match self.ui.mode() {
            Mode::Edit => self.handle_edit_key(key).await,
            Mode::Command => self.handle_command_key(key).await,
            Mode::Search => {
                self.handle_search_key(key);
                Ok(())
            }
            Mode::SavePrompt => self.handle_save_prompt_key(key).await,
            Mode::ConfirmDiscard => self.handle_confirm_key(key).await,
            Mode::Help => {
                self.handle_help_key(key);
                Ok(())
            }
        }
    }

    async fn handle_edit_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return self.handle_control_key(key).await;
        }
        if key.code == KeyCode::Esc {
            self.ui.enter_command_mode();
            return Ok(());
        }
        if self.ui.is_preview() {
            // The preview pane is read-only; only shortcuts work here
            return Ok(());
        }

        let document = &mut self.session.document;
        match key.code {
            KeyCode::Char(c) => document.insert_char(c),
            KeyCode::Enter => document.insert_newline(),
            KeyCode::Backspace => document.delete_char_backward(),
            KeyCode::Delete => document.delete_char_forward(),
            KeyCode::Tab => {
                for _ in 0..TAB_SIZE {
                    document.insert_char(' ');
                }
            }
            KeyCode::Left => document.move_cursor_left(),
            KeyCode::Right => document.move_cursor_right(),
            KeyCode::Up => document.move_cursor_up(),
            KeyCode::Down => document.move_cursor_down(),
            KeyCode::Home => document.move_to_line_start(),
            KeyCode::End => document.move_to_line_end(),
            KeyCode::PageUp => document.page_up(),
            KeyCode::PageDown => document.page_down(),
            _ => {}
        }
        Ok(())
    }

    async fn handle_control_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('c') => {
                if self.is_modified() {
                    self.ui
                        .set_warning_message("Save changes before exit? (y/n/c)".to_string());
                    self.ui.set_mode(Mode::SavePrompt);
                } else {
                    self.ui.quit();
                }
            }
            KeyCode::Char('s') => self.run_command(Command::QuickSave).await,
            KeyCode::Char('n') => {
                if self.is_modified() {
                    self.ui
                        .set_warning_message("Discard unsaved changes? (y/n)".to_string());
                    self.ui.set_pending(Command::NewFile);
                } else {
                    self.run_command(Command::NewFile).await;
                }
            }
            KeyCode::Char('w') => {
                if self.is_modified() {
                    self.ui
                        .set_warning_message("Discard unsaved changes? (y/n)".to_string());
                    self.ui.set_pending(Command::CloseFile);
                } else {
                    self.run_command(Command::CloseFile).await;
                }
            }
            KeyCode::Char('o') => {
                self.ui
                    .set_info_message("Open a file with :e <path> or :recent".to_string());
            }
            KeyCode::Char('p') => self.run_command(Command::TogglePreview).await,
            KeyCode::Char('f') => self.open_search(false),
            KeyCode::Char('h') => self.open_search(true),
            KeyCode::Char('g') => self.ui.toggle_help(),
            _ => {}
        }
        Ok(())
    }

    async fn handle_command_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Enter => {
                let input = self.ui.command_buffer().to_string();
                self.ui.clear_command_buffer();
                self.ui.enter_edit_mode();
                let trimmed = input.trim().to_string();
                if trimmed.is_empty() {
                    return Ok(());
                }
                match Command::parse(&trimmed) {
                    Ok(command) => self.run_command(command).await,
                    Err(e) => self.ui.set_error_message(e.to_string()),
                }
            }
            KeyCode::Esc => {
                self.ui.clear_command_buffer();
                self.ui.enter_edit_mode();
                self.ui.set_info_message("Cancelled".to_string());
            }
            KeyCode::Char(c) => self.ui.push_to_command_buffer(c),
            KeyCode::Backspace => self.ui.pop_from_command_buffer(),
            _ => {}
        }
        Ok(())
    }

    /// The search bar captures everything: printable keys build the focused
    /// field, Enter steps through matches, Tab switches fields, Esc closes.
    fn handle_search_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('f') => self.close_search(),
                KeyCode::Char('h') => self.ui.show_replace_field(),
                KeyCode::Char('r') => {
                    let replacement = self.ui.replace_input().to_string();
                    if let Some(status) = self.session.replace_current(&replacement) {
                        self.show_match_status(status);
                    }
                }
                KeyCode::Char('l') => {
                    let replacement = self.ui.replace_input().to_string();
                    let outcome = self.session.replace_all(&replacement);
                    self.show_replace_outcome(outcome);
                }
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Esc => self.close_search(),
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => {
                let status = self.session.find_previous();
                self.show_match_status(status);
            }
            KeyCode::Enter | KeyCode::Down => {
                let status = self.session.find_next();
                self.show_match_status(status);
            }
            KeyCode::Up => {
                let status = self.session.find_previous();
                self.show_match_status(status);
            }
            KeyCode::Tab => self.ui.toggle_search_focus(),
            KeyCode::Backspace => {
                self.ui.pop_from_search_field();
                self.refresh_query();
            }
            KeyCode::Char(c) => {
                self.ui.push_to_search_field(c);
                self.refresh_query();
            }
            _ => {}
        }
    }

    async fn handle_save_prompt_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                if !self.files.has_file() {
                    self.ui
                        .set_error_message("No file name set (use :w <path>)".to_string());
                    self.ui.enter_edit_mode();
                    return Ok(());
                }
                match self.files.save_file(&mut self.session.document).await {
                    Ok(_) => self.ui.quit(),
                    Err(e) => {
                        self.ui.set_error_message(format!("Error saving: {}", e));
                        self.ui.enter_edit_mode();
                    }
                }
            }
            KeyCode::Char('n') | KeyCode::Char('N') => self.ui.quit(),
            KeyCode::Char('c') | KeyCode::Char('C') | KeyCode::Esc => {
                self.ui.enter_edit_mode();
                self.ui.status.clear();
            }
            _ => {}
        }
        Ok(())
    }

    async fn handle_confirm_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.ui.enter_edit_mode();
                if let Some(command) = self.ui.take_pending() {
                    self.run_command(command).await;
                }
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.ui.take_pending();
                self.ui.enter_edit_mode();
                self.ui.set_info_message("Cancelled".to_string());
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_help_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.ui.hide_help(),
            KeyCode::Char('g') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.ui.hide_help();
            }
            _ => {}
        }
    }

    async fn run_command(&mut self, command: Command) {
        match command::dispatch(
            command,
            &mut self.session,
            &mut self.files,
            &mut self.config,
            &mut self.ui,
        )
        .await
        {
            Ok(message) => {
                if message.is_empty() {
                    return;
                }
                if message.starts_with("Wrote") || message.contains("saved") {
                    self.ui.set_success_message(message);
                } else {
                    self.ui.set_info_message(message);
                }
            }
            Err(e) => self.ui.set_error_message(e.to_string()),
        }
    }

    fn open_search(&mut self, with_replace: bool) {
        if self.ui.is_preview() {
            // The engine needs a live editable buffer
            self.ui
                .set_warning_message("Search is unavailable in preview".to_string());
            return;
        }
        if self.session.search_is_active() {
            if with_replace {
                self.ui.show_replace_field();
            } else {
                self.close_search();
            }
            return;
        }
        self.session.open_search();
        self.ui.open_search_bar(with_replace);
    }

    fn close_search(&mut self) {
        self.session.close_search();
        self.ui.close_search_bar();
    }

    fn refresh_query(&mut self) {
        if self.ui.search_focus() != SearchFocus::Query {
            return;
        }
        let query = self.ui.search_input().to_string();
        if let Some(status) = self.session.set_query(&query) {
            self.show_match_status(status);
        }
    }

    fn show_match_status(&mut self, status: MatchStatus) {
        match status {
            MatchStatus::Empty => self.ui.status.clear(),
            MatchStatus::NoMatches => self.ui.set_warning_message(status.label().to_string()),
            _ => self.ui.set_info_message(status.label().to_string()),
        }
    }

    fn show_replace_outcome(&mut self, outcome: ReplaceOutcome) {
        match outcome {
            ReplaceOutcome::Replaced(_) => self.ui.set_success_message(outcome.label()),
            ReplaceOutcome::NoMatches => self.ui.set_warning_message(outcome.label()),
            ReplaceOutcome::Empty => {}
        }
    }
}
