use crate::buffer::TextBuffer;
use crate::document::Document;
use crate::replace::{self, ReplaceOutcome};
use crate::search::{MatchStatus, SearchState};

/// The editing session: the document plus the search tracked over it.
/// Every operation receives this explicitly; there is no shared global
/// position state anywhere.
pub struct EditorSession {
    pub document: Document,
    pub search: SearchState,
}

impl EditorSession {
    pub fn new() -> Self {
        Self {
            document: Document::new(),
            search: SearchState::default(),
        }
    }

    /// Load freshly read file content, dropping any running search.
    pub fn load(&mut self, content: String) {
        self.search.close();
        self.document.set_text(content);
    }

    /// Reset to an empty document, as for New/Close.
    pub fn reset(&mut self) {
        self.search.close();
        self.document.clear();
    }

    pub fn is_modified(&self) -> bool {
        self.document.is_modified()
    }

    /// Open the search bar anchored at the current cursor position.
    pub fn open_search(&mut self) {
        let cursor = self.document.caret_byte();
        self.search.open(cursor);
    }

    /// Close the search bar; the document becomes editable again.
    pub fn close_search(&mut self) {
        self.search.close();
        self.document.clear_selection();
    }

    pub fn search_is_active(&self) -> bool {
        self.search.is_active()
    }

    pub fn set_query(&mut self, query: &str) -> Option<MatchStatus> {
        self.search.set_query(&mut self.document, query)
    }

    pub fn find_next(&mut self) -> MatchStatus {
        self.search.find_next(&mut self.document)
    }

    pub fn find_previous(&mut self) -> MatchStatus {
        self.search.find_previous(&mut self.document)
    }

    pub fn replace_current(&mut self, replacement: &str) -> Option<MatchStatus> {
        replace::replace_current(&mut self.document, &mut self.search, replacement)
    }

    pub fn replace_all(&mut self, replacement: &str) -> ReplaceOutcome {
        replace::replace_all(&mut self.document, &self.search, replacement)
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new()
    }
}
