// quillpad library exports

pub mod app;
pub mod buffer;
pub mod command;
pub mod config;
pub mod document;
pub mod file_manager;
pub mod replace;
pub mod search;
pub mod session;
pub mod stamp;
pub mod status_manager;
pub mod ui;
pub mod ui_state;

pub use app::App;
pub use buffer::TextBuffer;
pub use command::Command;
pub use config::Config;
pub use document::Document;
pub use search::{MatchStatus, SearchState};
pub use session::EditorSession;
