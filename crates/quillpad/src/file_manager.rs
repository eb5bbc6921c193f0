use anyhow::Result;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::buffer::TextBuffer;
use crate::document::Document;

const LARGE_FILE_THRESHOLD: u64 = 10 * 1024 * 1024;
const LARGE_CONTENT_THRESHOLD: usize = 50 * 1024 * 1024;
const MAX_SAVE_ATTEMPTS: u32 = 3;

/// The file the session is bound to, plus all disk traffic. Failures are
/// reported upward as messages; the in-memory document is never touched on a
/// failed write.
pub struct FileManager {
    current_path: Option<PathBuf>,
    is_readonly: bool,
}

impl FileManager {
    pub fn new() -> Self {
        Self {
            current_path: None,
            is_readonly: false,
        }
    }

    pub fn current_path(&self) -> Option<&PathBuf> {
        self.current_path.as_ref()
    }

    pub fn has_file(&self) -> bool {
        self.current_path.is_some()
    }

    /// Short display name for the title bar.
    pub fn file_name(&self) -> Option<String> {
        self.current_path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
    }

    pub fn close(&mut self) {
        self.current_path = None;
        self.is_readonly = false;
    }

    pub async fn open_file(&mut self, path: PathBuf) -> Result<String> {
        let content = self.read_text(&path).await?;

        match fs::metadata(&path).await {
            Ok(metadata) => {
                self.is_readonly = metadata.permissions().readonly();
                if metadata.len() > LARGE_FILE_THRESHOLD {
                    log::warn!(
                        "Large file detected ({} bytes): {}",
                        metadata.len(),
                        path.display()
                    );
                }
            }
            Err(e) => {
                log::warn!("Failed to get file metadata: {}", e);
                self.is_readonly = false;
            }
        }

        self.current_path = Some(path.clone());
        log::info!("Opened file: {}", path.display());
        Ok(content)
    }

    pub async fn save_file(&self, document: &mut Document) -> Result<String> {
        let Some(ref path) = self.current_path else {
            return Err(anyhow::anyhow!("No file name set"));
        };
        if self.is_readonly {
            return Err(anyhow::anyhow!("File is read-only: {}", path.display()));
        }

        let content = document.text();
        Self::check_content_size(&content)?;
        Self::backup_existing(path).await;

        let mut attempts = 0;
        loop {
            match fs::write(path, content.as_bytes()).await {
                Ok(_) => {
                    document.mark_saved();
                    log::info!("Saved file: {}", path.display());
                    return Ok(format!("Wrote {} lines", document.line_count()));
                }
                Err(e) => {
                    attempts += 1;
                    if attempts >= MAX_SAVE_ATTEMPTS {
                        return Err(Self::write_error(path, &e));
                    }
                    tokio::time::sleep(std::time::Duration::from_millis(100 * attempts as u64))
                        .await;
                    log::warn!(
                        "Save attempt {} failed for {}, retrying...",
                        attempts,
                        path.display()
                    );
                }
            }
        }
    }

    pub async fn save_file_as(&mut self, path: PathBuf, document: &mut Document) -> Result<String> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    anyhow::anyhow!("Could not create directory {}: {}", parent.display(), e)
                })?;
            }
        }

        if path.exists() {
            if let Ok(metadata) = fs::metadata(&path).await {
                if metadata.permissions().readonly() {
                    return Err(anyhow::anyhow!(
                        "Target file is read-only: {}",
                        path.display()
                    ));
                }
            }
        }

        let content = document.text();
        Self::check_content_size(&content)?;

        match fs::write(&path, content.as_bytes()).await {
            Ok(_) => {
                self.current_path = Some(path.clone());
                self.is_readonly = false;
                document.mark_saved();
                log::info!("Saved file as: {}", path.display());
                Ok(format!(
                    "Wrote {} lines to '{}'",
                    document.line_count(),
                    path.display()
                ))
            }
            Err(e) => Err(Self::write_error(&path, &e)),
        }
    }

    /// Append this session's content to another file and adopt that file.
    /// Returns the joined text to load back into the document.
    pub async fn append_to(&mut self, path: PathBuf, addition: &str) -> Result<String> {
        let target = self.read_text(&path).await?;
        let joined = format!("{}\n\n{}", target, addition);
        fs::write(&path, joined.as_bytes())
            .await
            .map_err(|e| Self::write_error(&path, &e))?;
        self.current_path = Some(path.clone());
        self.is_readonly = false;
        log::info!("Appended to file: {}", path.display());
        Ok(joined)
    }

    /// Like `append_to`, with this session's content placed first.
    pub async fn prepend_to(&mut self, path: PathBuf, addition: &str) -> Result<String> {
        let target = self.read_text(&path).await?;
        let joined = format!("{}\n\n{}", addition, target);
        fs::write(&path, joined.as_bytes())
            .await
            .map_err(|e| Self::write_error(&path, &e))?;
        self.current_path = Some(path.clone());
        self.is_readonly = false;
        log::info!("Prepended to file: {}", path.display());
        Ok(joined)
    }

    /// Write arbitrary text (the HTML export path); the bound file does not
    /// change.
    pub async fn write_plain(&self, path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    anyhow::anyhow!("Could not create directory {}: {}", parent.display(), e)
                })?;
            }
        }
        fs::write(path, content.as_bytes())
            .await
            .map_err(|e| Self::write_error(path, &e))
    }

    async fn read_text(&self, path: &Path) -> Result<String> {
        if !path.exists() {
            return Err(anyhow::anyhow!("File not found: {}", path.display()));
        }
        if !path.is_file() {
            return Err(anyhow::anyhow!("Not a file: {}", path.display()));
        }

        match fs::read_to_string(path).await {
            Ok(content) => {
                if content.contains('\0') {
                    return Err(anyhow::anyhow!(
                        "File appears to be binary: {}",
                        path.display()
                    ));
                }
                Ok(content)
            }
            Err(e) => {
                let message = match e.kind() {
                    std::io::ErrorKind::PermissionDenied => {
                        format!("Permission denied reading: {}", path.display())
                    }
                    std::io::ErrorKind::NotFound => {
                        format!("File not found: {}", path.display())
                    }
                    std::io::ErrorKind::InvalidData => {
                        format!("File is not valid UTF-8: {}", path.display())
                    }
                    _ => format!("Could not read {}: {}", path.display(), e),
                };
                Err(anyhow::anyhow!(message))
            }
        }
    }

    fn check_content_size(content: &str) -> Result<()> {
        if content.len() > LARGE_CONTENT_THRESHOLD {
            return Err(anyhow::anyhow!(
                "Content too large to save ({} bytes)",
                content.len()
            ));
        }
        Ok(())
    }

    async fn backup_existing(path: &Path) {
        if !path.exists() {
            return;
        }
        if let Ok(metadata) = fs::metadata(path).await {
            if metadata.len() > 0 {
                let backup_path = path.with_extension("bak");
                match fs::copy(path, &backup_path).await {
                    Ok(_) => log::info!("Created backup: {}", backup_path.display()),
                    Err(e) => log::warn!("Failed to create backup: {}", e),
                }
            }
        }
    }

    fn write_error(path: &Path, e: &std::io::Error) -> anyhow::Error {
        let message = match e.kind() {
            std::io::ErrorKind::PermissionDenied => {
                format!("Permission denied writing: {}", path.display())
            }
            std::io::ErrorKind::WriteZero => {
                format!("Disk may be full while writing: {}", path.display())
            }
            _ => format!("Could not write {}: {}", path.display(), e),
        };
        anyhow::anyhow!(message)
    }
}

impl Default for FileManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[tokio::test]
    async fn test_file_manager_creation() {
        let fm = FileManager::new();
        assert!(!fm.has_file());
        assert!(fm.current_path().is_none());
        assert!(fm.file_name().is_none());
    }

    #[tokio::test]
    async fn test_open_and_save_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "Hello World").unwrap();

        let mut fm = FileManager::new();
        let mut document = Document::new();

        let content = fm.open_file(temp_file.path().to_path_buf()).await.unwrap();
        document.set_text(content);
        assert!(fm.has_file());
        assert!(!document.is_modified());

        document.insert_char('!');
        let message = fm.save_file(&mut document).await.unwrap();
        assert!(message.starts_with("Wrote"));
        assert!(!document.is_modified());

        let on_disk = std::fs::read_to_string(temp_file.path()).unwrap();
        assert_eq!(on_disk, "!Hello World\n");
    }

    #[tokio::test]
    async fn test_save_without_file_fails() {
        let fm = FileManager::new();
        let mut document = Document::new();
        document.insert_char('x');
        assert!(fm.save_file(&mut document).await.is_err());
        assert!(document.is_modified());
    }

    #[tokio::test]
    async fn test_save_file_as() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("nested").join("note.md");

        let mut fm = FileManager::new();
        let mut document = Document::new();
        document.set_text("note body".to_string());

        fm.save_file_as(target.clone(), &mut document).await.unwrap();
        assert_eq!(fm.current_path(), Some(&target));
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "note body");
    }

    #[tokio::test]
    async fn test_open_missing_file() {
        let mut fm = FileManager::new();
        let result = fm.open_file(PathBuf::from("/no/such/file.txt")).await;
        assert!(result.is_err());
        assert!(!fm.has_file());
    }

    #[tokio::test]
    async fn test_open_rejects_binary() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"text\0binary").unwrap();

        let mut fm = FileManager::new();
        let result = fm.open_file(temp_file.path().to_path_buf()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_append_to_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "existing").unwrap();

        let mut fm = FileManager::new();
        let joined = fm
            .append_to(temp_file.path().to_path_buf(), "added")
            .await
            .unwrap();
        assert_eq!(joined, "existing\n\nadded");
        assert_eq!(
            std::fs::read_to_string(temp_file.path()).unwrap(),
            "existing\n\nadded"
        );
        assert_eq!(fm.current_path(), Some(&temp_file.path().to_path_buf()));
    }

    #[tokio::test]
    async fn test_prepend_to_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "existing").unwrap();

        let mut fm = FileManager::new();
        let joined = fm
            .prepend_to(temp_file.path().to_path_buf(), "added")
            .await
            .unwrap();
        assert_eq!(joined, "added\n\nexisting");
    }

    #[tokio::test]
    async fn test_save_creates_backup() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "original").unwrap();

        let mut fm = FileManager::new();
        let mut document = Document::new();
        let content = fm.open_file(temp_file.path().to_path_buf()).await.unwrap();
        document.set_text(content);
        document.insert_char('!');

        fm.save_file(&mut document).await.unwrap();
        let backup = temp_file.path().with_extension("bak");
        assert_eq!(std::fs::read_to_string(&backup).unwrap(), "original");
    }

    #[tokio::test]
    async fn test_write_plain() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("export.html");

        let fm = FileManager::new();
        fm.write_plain(&target, "<p>hi</p>").await.unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "<p>hi</p>");
        assert!(!fm.has_file());
    }
}
