use anyhow::Result;
use chrono::Local;
use std::path::PathBuf;

use crate::buffer::TextBuffer;
use crate::config::{Config, Theme};
use crate::file_manager::FileManager;
use crate::session::EditorSession;
use crate::stamp::{self, DateFormat};
use crate::ui_state::UiState;

/// The closed set of shell actions. Key handlers and the `:` line both
/// produce these; a single dispatcher consumes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    NewFile,
    OpenFile(PathBuf),
    OpenRecent(usize),
    QuickSave,
    SaveAs(PathBuf),
    AppendTo(PathBuf, bool),
    PrependTo(PathBuf, bool),
    CloseFile,
    TogglePreview,
    ExportHtml(PathBuf),
    ShowRecent,
    Set(String, String),
    Help,
    Quit,
    ForceQuit,
    SaveAndQuit,
}

impl Command {
    pub fn parse(input: &str) -> Result<Command> {
        let parts: Vec<&str> = input.trim().split_whitespace().collect();
        if parts.is_empty() {
            return Err(anyhow::anyhow!("E471: Argument required"));
        }
        let path_arg = |parts: &[&str]| -> Result<PathBuf> {
            if parts.len() > 1 {
                Ok(PathBuf::from(parts[1..].join(" ")))
            } else {
                Err(anyhow::anyhow!("E471: Argument required"))
            }
        };

        match parts[0] {
            "w" => {
                if parts.len() > 1 {
                    Ok(Command::SaveAs(path_arg(&parts)?))
                } else {
                    Ok(Command::QuickSave)
                }
            }
            "q" => Ok(Command::Quit),
            "q!" => Ok(Command::ForceQuit),
            "wq" => Ok(Command::SaveAndQuit),
            "e" | "open" => Ok(Command::OpenFile(path_arg(&parts)?)),
            "new" => Ok(Command::NewFile),
            "close" => Ok(Command::CloseFile),
            "preview" => Ok(Command::TogglePreview),
            "export" => Ok(Command::ExportHtml(path_arg(&parts)?)),
            "append" => Ok(Command::AppendTo(path_arg(&parts)?, false)),
            "append!" => Ok(Command::AppendTo(path_arg(&parts)?, true)),
            "prepend" => Ok(Command::PrependTo(path_arg(&parts)?, false)),
            "prepend!" => Ok(Command::PrependTo(path_arg(&parts)?, true)),
            "recent" => {
                if parts.len() > 1 {
                    let index: usize = parts[1]
                        .parse()
                        .map_err(|_| anyhow::anyhow!("Not a recent file number: {}", parts[1]))?;
                    Ok(Command::OpenRecent(index))
                } else {
                    Ok(Command::ShowRecent)
                }
            }
            "set" => {
                let key = parts
                    .get(1)
                    .ok_or_else(|| anyhow::anyhow!("E471: Argument required"))?;
                let value = parts[2..].join(" ");
                Ok(Command::Set(key.to_string(), value))
            }
            "help" => Ok(Command::Help),
            other => Err(anyhow::anyhow!("E492: Not an editor command: {}", other)),
        }
    }
}

/// Run one command against the session. Returns the status line text;
/// failures surface as errors for the caller to show, with the document left
/// as it was.
pub async fn dispatch(
    command: Command,
    session: &mut EditorSession,
    files: &mut FileManager,
    config: &mut Config,
    ui: &mut UiState,
) -> Result<String> {
    match command {
        Command::NewFile => {
            session.reset();
            files.close();
            ui.exit_preview();
            Ok("New note".to_string())
        }
        Command::OpenFile(path) => {
            let path = resolve(path, &config.default_open_dir);
            open_path(path, session, files, config, ui).await
        }
        Command::OpenRecent(index) => {
            let path = index
                .checked_sub(1)
                .and_then(|i| config.recent_files.get(i))
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("No recent file {}", index))?;
            open_path(path, session, files, config, ui).await
        }
        Command::QuickSave => {
            if session.document.text().trim().is_empty() {
                return Ok("Nothing to save".to_string());
            }
            if files.has_file() {
                files.save_file(&mut session.document).await
            } else {
                let today = Local::now().date_naive();
                let suggested = match &config.default_save_dir {
                    Some(dir) => dir.join(stamp::default_file_name(today)),
                    None => PathBuf::from(stamp::default_file_name(today)),
                };
                Err(anyhow::anyhow!(
                    "No file name set (try :w {})",
                    suggested.display()
                ))
            }
        }
        Command::SaveAs(path) => {
            let path = resolve(path, &config.default_save_dir);
            let text = session.document.text();
            if text.trim().is_empty() {
                return Ok("Nothing to save".to_string());
            }
            if ui.stamp_on_save() {
                let decorated = stamp::decorate(text.trim(), &stamp_line(config));
                session.load(decorated);
            }
            let message = files.save_file_as(path.clone(), &mut session.document).await?;
            remember_recent(config, path).await;
            Ok(message)
        }
        Command::AppendTo(path, force) => {
            let path = resolve(path, &config.default_open_dir);
            let text = session.document.text();
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok("Nothing to append".to_string());
            }
            if !force && files.current_path() == Some(&path) && !session.is_modified() {
                return Ok(
                    "No changes detected; use :append! to append this file to itself".to_string()
                );
            }
            let addition = decorated_content(trimmed, config, ui);
            let joined = files.append_to(path.clone(), &addition).await?;
            session.load(joined);
            session.document.move_to_end();
            remember_recent(config, path).await;
            Ok("Content appended".to_string())
        }
        Command::PrependTo(path, force) => {
            let path = resolve(path, &config.default_open_dir);
            let text = session.document.text();
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok("Nothing to prepend".to_string());
            }
            if !force && files.current_path() == Some(&path) && !session.is_modified() {
                return Ok(
                    "No changes detected; use :prepend! to prepend this file to itself".to_string(),
                );
            }
            let addition = decorated_content(trimmed, config, ui);
            let joined = files.prepend_to(path.clone(), &addition).await?;
            session.load(joined);
            session.document.move_to_start();
            remember_recent(config, path).await;
            Ok("Content prepended".to_string())
        }
        Command::CloseFile => {
            session.reset();
            files.close();
            ui.exit_preview();
            Ok("File closed".to_string())
        }
        Command::TogglePreview => {
            if ui.is_preview() {
                ui.exit_preview();
                return Ok(String::new());
            }
            let text = session.document.text();
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok("Nothing to preview".to_string());
            }
            if session.search_is_active() {
                session.close_search();
                ui.close_search_bar();
            }
            ui.enter_preview(mdlite::to_html(trimmed));
            Ok(String::new())
        }
        Command::ExportHtml(path) => {
            let path = resolve(path, &config.default_save_dir);
            let text = session.document.text();
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok("Nothing to export".to_string());
            }
            let fragment = mdlite::sanitize::clean_fragment(&mdlite::to_html(trimmed));
            let title = files.file_name().unwrap_or_else(|| "quillpad note".to_string());
            let page = html_page(&title, config.theme, &fragment);
            files.write_plain(&path, &page).await?;
            Ok(format!("Exported HTML to {}", path.display()))
        }
        Command::ShowRecent => {
            if config.recent_files.is_empty() {
                return Ok("No recent files".to_string());
            }
            let listing = config
                .recent_files
                .iter()
                .enumerate()
                .map(|(i, path)| format!("{} {}", i + 1, path.display()))
                .collect::<Vec<_>>()
                .join("\n");
            Ok(listing)
        }
        Command::Set(key, value) => apply_setting(&key, &value, config, ui).await,
        Command::Help => {
            ui.toggle_help();
            Ok(String::new())
        }
        Command::Quit => {
            if session.is_modified() {
                Ok("No write since last change (use :q! to override)".to_string())
            } else {
                ui.quit();
                Ok("Quitting".to_string())
            }
        }
        Command::ForceQuit => {
            ui.quit();
            Ok("Force quitting".to_string())
        }
        Command::SaveAndQuit => {
            if !files.has_file() {
                return Err(anyhow::anyhow!("No file name set (use :w <path>)"));
            }
            let message = files.save_file(&mut session.document).await?;
            ui.quit();
            Ok(format!("{} - Quitting", message))
        }
    }
}

async fn open_path(
    path: PathBuf,
    session: &mut EditorSession,
    files: &mut FileManager,
    config: &mut Config,
    ui: &mut UiState,
) -> Result<String> {
    let content = files.open_file(path.clone()).await?;
    session.load(content);
    ui.exit_preview();
    remember_recent(config, path.clone()).await;
    Ok(format!("Opened {}", path.display()))
}

async fn remember_recent(config: &mut Config, path: PathBuf) {
    config.add_recent(path);
    if let Err(e) = config.save().await {
        log::warn!("Failed to persist recent file list: {}", e);
    }
}

fn resolve(path: PathBuf, base: &Option<PathBuf>) -> PathBuf {
    if path.is_relative() {
        if let Some(dir) = base {
            return dir.join(path);
        }
    }
    path
}

fn stamp_line(config: &Config) -> String {
    stamp::date_line(
        config.include_date,
        config.date_format,
        &config.date_text,
        Local::now().date_naive(),
    )
}

fn decorated_content(trimmed: &str, config: &Config, ui: &UiState) -> String {
    if ui.stamp_on_save() {
        stamp::decorate(trimmed, &stamp_line(config))
    } else {
        trimmed.to_string()
    }
}

async fn apply_setting(
    key: &str,
    value: &str,
    config: &mut Config,
    ui: &mut UiState,
) -> Result<String> {
    match key {
        "theme" => {
            config.theme =
                Theme::parse(value).ok_or_else(|| anyhow::anyhow!("Unknown theme: {}", value))?;
            config.save().await?;
            Ok(format!("Theme set to {}", value))
        }
        "dateformat" => {
            config.date_format = DateFormat::parse(value)
                .ok_or_else(|| anyhow::anyhow!("Unknown date format: {}", value))?;
            config.save().await?;
            Ok(format!("Date format set to {}", config.date_format.as_str()))
        }
        "includedate" => {
            config.include_date = parse_switch(value)?;
            config.save().await?;
            Ok(format!("Date stamping dates: {}", value))
        }
        "datetext" => {
            config.date_text = value.to_string();
            config.save().await?;
            Ok("Default stamp text updated".to_string())
        }
        "opendir" => {
            config.default_open_dir = (!value.is_empty()).then(|| PathBuf::from(value));
            config.save().await?;
            Ok("Default open directory updated".to_string())
        }
        "savedir" => {
            config.default_save_dir = (!value.is_empty()).then(|| PathBuf::from(value));
            config.save().await?;
            Ok("Default save directory updated".to_string())
        }
        "stamp" => {
            ui.set_stamp_on_save(parse_switch(value)?);
            Ok(format!("Date stamp on save: {}", value))
        }
        other => Err(anyhow::anyhow!("Unknown setting: {}", other)),
    }
}

fn parse_switch(value: &str) -> Result<bool> {
    match value {
        "on" | "true" => Ok(true),
        "off" | "false" => Ok(false),
        _ => Err(anyhow::anyhow!("Expected on or off, got: {}", value)),
    }
}

fn html_page(title: &str, theme: Theme, fragment: &str) -> String {
    let (background, foreground) = match theme {
        Theme::Dark => ("#1e1e1e", "#d4d4d4"),
        Theme::Light => ("#ffffff", "#1e1e1e"),
    };
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n\
         <style>\nbody {{ background: {background}; color: {foreground}; \
         font-family: sans-serif; max-width: 50em; margin: 2em auto; padding: 0 1em; }}\n\
         pre {{ background: rgba(128, 128, 128, 0.15); padding: 0.8em; overflow-x: auto; }}\n\
         blockquote {{ border-left: 3px solid {foreground}; margin-left: 0; padding-left: 1em; }}\n\
         </style>\n</head>\n<body>\n{fragment}\n</body>\n</html>\n",
        title = mdlite::render::escape_html(title),
        background = background,
        foreground = foreground,
        fragment = fragment,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture() -> (EditorSession, FileManager, Config, UiState) {
        (
            EditorSession::new(),
            FileManager::new(),
            Config::default(),
            UiState::new(),
        )
    }

    /// Point config persistence at a scratch directory for the duration of a
    /// test.
    fn isolated_config_env() -> (std::sync::MutexGuard<'static, ()>, TempDir) {
        let guard = crate::config::test_env_lock().lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        std::env::set_var("QUILLPAD_CONFIG_DIR", temp_dir.path());
        std::env::remove_var("QUILLPAD_CONFIG_PATH");
        (guard, temp_dir)
    }

    #[test]
    fn test_parse_save_and_quit_commands() {
        assert!(matches!(Command::parse("w").unwrap(), Command::QuickSave));
        assert!(matches!(
            Command::parse("w note.md").unwrap(),
            Command::SaveAs(p) if p == PathBuf::from("note.md")
        ));
        assert!(matches!(Command::parse("q").unwrap(), Command::Quit));
        assert!(matches!(Command::parse("q!").unwrap(), Command::ForceQuit));
        assert!(matches!(Command::parse("wq").unwrap(), Command::SaveAndQuit));
    }

    #[test]
    fn test_parse_paths_with_spaces() {
        assert!(matches!(
            Command::parse("e my notes.md").unwrap(),
            Command::OpenFile(p) if p == PathBuf::from("my notes.md")
        ));
    }

    #[test]
    fn test_parse_append_variants() {
        assert!(matches!(
            Command::parse("append log.md").unwrap(),
            Command::AppendTo(_, false)
        ));
        assert!(matches!(
            Command::parse("append! log.md").unwrap(),
            Command::AppendTo(_, true)
        ));
        assert!(matches!(
            Command::parse("prepend! log.md").unwrap(),
            Command::PrependTo(_, true)
        ));
    }

    #[test]
    fn test_parse_recent() {
        assert!(matches!(Command::parse("recent").unwrap(), Command::ShowRecent));
        assert!(matches!(
            Command::parse("recent 3").unwrap(),
            Command::OpenRecent(3)
        ));
        assert!(Command::parse("recent x").is_err());
    }

    #[test]
    fn test_parse_set() {
        assert!(matches!(
            Command::parse("set theme light").unwrap(),
            Command::Set(key, value) if key == "theme" && value == "light"
        ));
    }

    #[test]
    fn test_parse_requires_argument() {
        assert!(Command::parse("e").is_err());
        assert!(Command::parse("export").is_err());
    }

    #[test]
    fn test_parse_unknown_command() {
        let err = Command::parse("frobnicate").unwrap_err();
        assert!(err.to_string().contains("Not an editor command"));
    }

    #[tokio::test]
    async fn test_quit_refuses_when_modified() {
        let (mut session, mut files, mut config, mut ui) = fixture();
        session.document.insert_char('x');

        let message = dispatch(Command::Quit, &mut session, &mut files, &mut config, &mut ui)
            .await
            .unwrap();
        assert!(message.contains("No write since last change"));
        assert!(!ui.should_quit());

        dispatch(Command::ForceQuit, &mut session, &mut files, &mut config, &mut ui)
            .await
            .unwrap();
        assert!(ui.should_quit());
    }

    #[tokio::test]
    async fn test_quit_when_clean() {
        let (mut session, mut files, mut config, mut ui) = fixture();
        dispatch(Command::Quit, &mut session, &mut files, &mut config, &mut ui)
            .await
            .unwrap();
        assert!(ui.should_quit());
    }

    #[tokio::test]
    async fn test_open_and_save_round_trip() {
        let (_guard, _config_dir) = isolated_config_env();
        let dir = TempDir::new().unwrap();
        let note = dir.path().join("note.md");
        std::fs::write(&note, "hello").unwrap();

        let (mut session, mut files, mut config, mut ui) = fixture();
        dispatch(
            Command::OpenFile(note.clone()),
            &mut session,
            &mut files,
            &mut config,
            &mut ui,
        )
        .await
        .unwrap();
        assert_eq!(session.document.text(), "hello");
        assert_eq!(config.recent_files[0], note);

        session.document.insert_char('!');
        let message = dispatch(
            Command::QuickSave,
            &mut session,
            &mut files,
            &mut config,
            &mut ui,
        )
        .await
        .unwrap();
        assert!(message.starts_with("Wrote"));
        assert_eq!(std::fs::read_to_string(&note).unwrap(), "!hello");
    }

    #[tokio::test]
    async fn test_quick_save_without_file_suggests_name() {
        let (mut session, mut files, mut config, mut ui) = fixture();
        session.document.insert_char('x');

        let err = dispatch(
            Command::QuickSave,
            &mut session,
            &mut files,
            &mut config,
            &mut ui,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("No file name set"));
    }

    #[tokio::test]
    async fn test_append_self_without_changes_is_guarded() {
        let (_guard, _config_dir) = isolated_config_env();
        let dir = TempDir::new().unwrap();
        let note = dir.path().join("note.md");
        std::fs::write(&note, "body").unwrap();

        let (mut session, mut files, mut config, mut ui) = fixture();
        dispatch(
            Command::OpenFile(note.clone()),
            &mut session,
            &mut files,
            &mut config,
            &mut ui,
        )
        .await
        .unwrap();

        let message = dispatch(
            Command::AppendTo(note.clone(), false),
            &mut session,
            &mut files,
            &mut config,
            &mut ui,
        )
        .await
        .unwrap();
        assert!(message.contains("No changes detected"));
        assert_eq!(std::fs::read_to_string(&note).unwrap(), "body");

        dispatch(
            Command::AppendTo(note.clone(), true),
            &mut session,
            &mut files,
            &mut config,
            &mut ui,
        )
        .await
        .unwrap();
        assert_eq!(std::fs::read_to_string(&note).unwrap(), "body\n\nbody");
        assert_eq!(session.document.text(), "body\n\nbody");
    }

    #[tokio::test]
    async fn test_preview_toggle_renders() {
        let (mut session, mut files, mut config, mut ui) = fixture();
        session.load("# Title".to_string());

        dispatch(
            Command::TogglePreview,
            &mut session,
            &mut files,
            &mut config,
            &mut ui,
        )
        .await
        .unwrap();
        assert_eq!(ui.preview_html(), Some("<h1>Title</h1>"));

        dispatch(
            Command::TogglePreview,
            &mut session,
            &mut files,
            &mut config,
            &mut ui,
        )
        .await
        .unwrap();
        assert!(!ui.is_preview());
    }

    #[tokio::test]
    async fn test_preview_of_empty_document() {
        let (mut session, mut files, mut config, mut ui) = fixture();
        let message = dispatch(
            Command::TogglePreview,
            &mut session,
            &mut files,
            &mut config,
            &mut ui,
        )
        .await
        .unwrap();
        assert_eq!(message, "Nothing to preview");
        assert!(!ui.is_preview());
    }

    #[tokio::test]
    async fn test_export_html() {
        let (_guard, _config_dir) = isolated_config_env();
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out.html");

        let (mut session, mut files, mut config, mut ui) = fixture();
        session.load("# Title\n<script>x</script>".to_string());

        dispatch(
            Command::ExportHtml(target.clone()),
            &mut session,
            &mut files,
            &mut config,
            &mut ui,
        )
        .await
        .unwrap();
        let page = std::fs::read_to_string(&target).unwrap();
        assert!(page.contains("<h1>Title</h1>"));
        assert!(!page.contains("<script>x"));
        assert!(page.starts_with("<!DOCTYPE html>"));
    }

    #[tokio::test]
    async fn test_set_theme_and_stamp() {
        let (_guard, _config_dir) = isolated_config_env();
        let (mut session, mut files, mut config, mut ui) = fixture();

        dispatch(
            Command::Set("theme".to_string(), "light".to_string()),
            &mut session,
            &mut files,
            &mut config,
            &mut ui,
        )
        .await
        .unwrap();
        assert_eq!(config.theme, Theme::Light);

        dispatch(
            Command::Set("stamp".to_string(), "on".to_string()),
            &mut session,
            &mut files,
            &mut config,
            &mut ui,
        )
        .await
        .unwrap();
        assert!(ui.stamp_on_save());

        let err = dispatch(
            Command::Set("theme".to_string(), "sepia".to_string()),
            &mut session,
            &mut files,
            &mut config,
            &mut ui,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("Unknown theme"));
    }

    #[tokio::test]
    async fn test_stamped_save_decorates_content() {
        let (_guard, _config_dir) = isolated_config_env();
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("stamped.md");

        let (mut session, mut files, mut config, mut ui) = fixture();
        session.load("body".to_string());
        ui.set_stamp_on_save(true);

        dispatch(
            Command::SaveAs(target.clone()),
            &mut session,
            &mut files,
            &mut config,
            &mut ui,
        )
        .await
        .unwrap();
        let saved = std::fs::read_to_string(&target).unwrap();
        assert!(saved.contains("\n\nbody\n\n"));
        assert!(saved.starts_with('_'));
        assert!(saved.ends_with('_'));
        assert!(!session.is_modified());
    }

    #[tokio::test]
    async fn test_open_recent_by_index() {
        let (_guard, _config_dir) = isolated_config_env();
        let dir = TempDir::new().unwrap();
        let note = dir.path().join("note.md");
        std::fs::write(&note, "recent body").unwrap();

        let (mut session, mut files, mut config, mut ui) = fixture();
        config.add_recent(note.clone());

        dispatch(
            Command::OpenRecent(1),
            &mut session,
            &mut files,
            &mut config,
            &mut ui,
        )
        .await
        .unwrap();
        assert_eq!(session.document.text(), "recent body");

        let err = dispatch(
            Command::OpenRecent(9),
            &mut session,
            &mut files,
            &mut config,
            &mut ui,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("No recent file"));
    }

    #[tokio::test]
    async fn test_new_file_resets_everything() {
        let (mut session, mut files, mut config, mut ui) = fixture();
        session.load("old content".to_string());
        ui.enter_preview("<p>old content</p>".to_string());

        dispatch(Command::NewFile, &mut session, &mut files, &mut config, &mut ui)
            .await
            .unwrap();
        assert!(session.document.is_empty());
        assert!(!files.has_file());
        assert!(!ui.is_preview());
    }
}
