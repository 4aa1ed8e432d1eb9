//! Filesystem-backed collaborators for running `textredact` from a shell.

use std::fs;
use std::path::{Component, Path, PathBuf};

use textredact::detector::OcrResponse;
use textredact::{Detection, Notifier, ObjectRef, ObjectStore, OutputFormat, RedactError};
use tracing::info;

/// [`ObjectStore`] where each bucket is a sub-directory of `root`.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Filesystem path of `object`. Keys may not climb out of their bucket.
    pub fn path_of(&self, object: &ObjectRef) -> Result<PathBuf, RedactError> {
        let escapes = |p: &Path| {
            p.components()
                .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        };
        if object.bucket.is_empty() || escapes(Path::new(&object.bucket)) {
            return Err(RedactError::Storage(format!(
                "invalid bucket name: {:?}",
                object.bucket
            )));
        }
        if object.key.is_empty() || escapes(Path::new(&object.key)) {
            return Err(RedactError::Storage(format!(
                "invalid object key: {:?}",
                object.key
            )));
        }
        Ok(self.root.join(&object.bucket).join(&object.key))
    }
}

fn io_err(action: &str, path: &Path, e: std::io::Error) -> RedactError {
    RedactError::Storage(format!("{action} {}: {e}", path.display()))
}

impl ObjectStore for DirectoryStore {
    fn get(&self, object: &ObjectRef) -> Result<Vec<u8>, RedactError> {
        let path = self.path_of(object)?;
        fs::read(&path).map_err(|e| io_err("failed to read", &path, e))
    }

    fn put(&self, object: &ObjectRef, data: &[u8], _content_type: &str) -> Result<(), RedactError> {
        let path = self.path_of(object)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| io_err("failed to create", parent, e))?;
        }
        fs::write(&path, data).map_err(|e| io_err("failed to write", &path, e))
    }

    fn copy(&self, from: &ObjectRef, to: &ObjectRef) -> Result<(), RedactError> {
        let src = self.path_of(from)?;
        let dst = self.path_of(to)?;
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent).map_err(|e| io_err("failed to create", parent, e))?;
        }
        fs::copy(&src, &dst)
            .map(|_| ())
            .map_err(|e| io_err("failed to copy", &src, e))
    }

    fn delete(&self, object: &ObjectRef) -> Result<(), RedactError> {
        let path = self.path_of(object)?;
        fs::remove_file(&path).map_err(|e| io_err("failed to delete", &path, e))
    }
}

/// [`Notifier`] that writes each message to the log under a topic name.
#[derive(Debug, Clone)]
pub struct LogNotifier {
    topic: String,
}

impl LogNotifier {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
        }
    }
}

impl Notifier for LogNotifier {
    fn notify(&self, subject: &str, body: &str) -> Result<(), RedactError> {
        info!(topic = %self.topic, subject, "notification\n{body}");
        Ok(())
    }
}

/// Read word detections from a saved OCR response.
pub fn load_detections(path: &Path) -> Result<Vec<Detection>, RedactError> {
    let body = fs::read_to_string(path)
        .map_err(|e| RedactError::Detection(format!("failed to read {}: {e}", path.display())))?;
    Ok(OcrResponse::from_json(&body)?.word_detections())
}

/// Output format named by `path`'s extension.
///
/// `None` when the path has no extension, leaving the input's format in place.
pub fn output_format(path: &Path) -> Result<Option<OutputFormat>, RedactError> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(OutputFormat::from_extension)
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_cannot_escape_the_root() {
        let store = DirectoryStore::new("/tmp/store");
        assert!(store.path_of(&ObjectRef::new("b", "../etc/passwd")).is_err());
        assert!(store.path_of(&ObjectRef::new("..", "x.png")).is_err());
        assert!(store.path_of(&ObjectRef::new("b", "/abs.png")).is_err());
        assert_eq!(
            store.path_of(&ObjectRef::new("b", "dir/x.png")).unwrap(),
            PathBuf::from("/tmp/store/b/dir/x.png")
        );
    }

    #[test]
    fn output_format_follows_extension() {
        assert_eq!(
            output_format(Path::new("out/a.JPG")).unwrap(),
            Some(OutputFormat::Jpeg)
        );
        assert_eq!(
            output_format(Path::new("a.webp")).unwrap(),
            Some(OutputFormat::Webp)
        );
        assert!(output_format(Path::new("a.gif")).is_err());
    }

    #[test]
    fn output_without_extension_keeps_input_format() {
        assert_eq!(output_format(Path::new("out/redacted")).unwrap(), None);
    }

    #[test]
    fn log_notifier_accepts_messages() {
        assert!(LogNotifier::new("topic").notify("s", "b").is_ok());
    }
}
