use crate::command::Command;
use crate::status_manager::StatusManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Edit,
    Command,
    Search,
    SavePrompt,
    ConfirmDiscard,
    Help,
}

/// Which field of the search bar receives keystrokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchFocus {
    Query,
    Replacement,
}

/// Everything the drawing code needs that is not document content: the mode
/// machine, the command line, the search bar fields, the preview toggle and
/// the status feed.
pub struct UiState {
    mode: Mode,
    pub status: StatusManager,
    command_buffer: String,
    search_input: String,
    replace_input: String,
    search_focus: SearchFocus,
    replace_visible: bool,
    preview: Option<String>,
    stamp_on_save: bool,
    pending: Option<Command>,
    show_help: bool,
    should_quit: bool,
}

impl UiState {
    pub fn new() -> Self {
        Self {
            mode: Mode::Edit,
            status: StatusManager::new(),
            command_buffer: String::new(),
            search_input: String::new(),
            replace_input: String::new(),
            search_focus: SearchFocus::Query,
            replace_visible: false,
            preview: None,
            stamp_on_save: false,
            pending: None,
            show_help: false,
            should_quit: false,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn enter_edit_mode(&mut self) {
        self.mode = Mode::Edit;
    }

    pub fn enter_command_mode(&mut self) {
        self.mode = Mode::Command;
        self.command_buffer.clear();
    }

    // Command line ----------------------------------------------------------

    pub fn command_buffer(&self) -> &str {
        &self.command_buffer
    }

    pub fn push_to_command_buffer(&mut self, c: char) {
        self.command_buffer.push(c);
    }

    pub fn pop_from_command_buffer(&mut self) {
        self.command_buffer.pop();
    }

    pub fn clear_command_buffer(&mut self) {
        self.command_buffer.clear();
    }

    // Search bar ------------------------------------------------------------

    pub fn open_search_bar(&mut self, with_replace: bool) {
        self.mode = Mode::Search;
        self.search_input.clear();
        self.replace_input.clear();
        self.search_focus = SearchFocus::Query;
        self.replace_visible = with_replace;
    }

    pub fn show_replace_field(&mut self) {
        self.replace_visible = true;
    }

    pub fn close_search_bar(&mut self) {
        if self.mode == Mode::Search {
            self.mode = Mode::Edit;
        }
        self.search_input.clear();
        self.replace_input.clear();
        self.replace_visible = false;
        self.search_focus = SearchFocus::Query;
    }

    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    pub fn replace_input(&self) -> &str {
        &self.replace_input
    }

    pub fn search_focus(&self) -> SearchFocus {
        self.search_focus
    }

    pub fn replace_visible(&self) -> bool {
        self.replace_visible
    }

    pub fn toggle_search_focus(&mut self) {
        self.search_focus = match self.search_focus {
            SearchFocus::Query if self.replace_visible => SearchFocus::Replacement,
            _ => SearchFocus::Query,
        };
    }

    pub fn push_to_search_field(&mut self, c: char) {
        match self.search_focus {
            SearchFocus::Query => self.search_input.push(c),
            SearchFocus::Replacement => self.replace_input.push(c),
        }
    }

    pub fn pop_from_search_field(&mut self) {
        match self.search_focus {
            SearchFocus::Query => {
                self.search_input.pop();
            }
            SearchFocus::Replacement => {
                self.replace_input.pop();
            }
        }
    }

    // Preview ---------------------------------------------------------------

    pub fn is_preview(&self) -> bool {
        self.preview.is_some()
    }

    pub fn enter_preview(&mut self, html: String) {
        self.preview = Some(html);
    }

    pub fn exit_preview(&mut self) {
        self.preview = None;
    }

    pub fn preview_html(&self) -> Option<&str> {
        self.preview.as_deref()
    }

    // Stamping --------------------------------------------------------------

    pub fn stamp_on_save(&self) -> bool {
        self.stamp_on_save
    }

    pub fn set_stamp_on_save(&mut self, enabled: bool) {
        self.stamp_on_save = enabled;
    }

    // Pending confirmation --------------------------------------------------

    pub fn set_pending(&mut self, command: Command) {
        self.pending = Some(command);
        self.mode = Mode::ConfirmDiscard;
    }

    pub fn take_pending(&mut self) -> Option<Command> {
        self.pending.take()
    }

    // Help ------------------------------------------------------------------

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
        self.mode = if self.show_help { Mode::Help } else { Mode::Edit };
    }

    pub fn is_help_shown(&self) -> bool {
        self.show_help
    }

    pub fn hide_help(&mut self) {
        self.show_help = false;
        if self.mode == Mode::Help {
            self.mode = Mode::Edit;
        }
    }

    // Status ----------------------------------------------------------------

    pub fn set_info_message(&mut self, message: String) {
        self.status.set_info(message);
    }

    pub fn set_success_message(&mut self, message: String) {
        self.status.set_success(message);
    }

    pub fn set_warning_message(&mut self, message: String) {
        self.status.set_warning(message);
    }

    pub fn set_error_message(&mut self, message: String) {
        self.status.set_error(message);
    }

    pub fn update_status(&mut self) {
        self.status.update();
    }

    // Quit ------------------------------------------------------------------

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}
