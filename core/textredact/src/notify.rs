use std::sync::Mutex;

use crate::error::RedactError;
use crate::store::ObjectRef;

/// Separator placed between detected texts in a report.
pub const TEXT_SEPARATOR: &str = "  ";

/// Publishes human-readable reports to whoever reviews uploads.
pub trait Notifier: Send + Sync {
    /// Deliver one message.
    fn notify(&self, subject: &str, body: &str) -> Result<(), RedactError>;
}

/// A rendered message, ready for a [`Notifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// One-line subject.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

/// Report for an upload that had text blurred out of it.
pub fn redaction_report(source: &ObjectRef, detected_texts: &[String]) -> Notification {
    let texts = detected_texts.join(TEXT_SEPARATOR);
    let body = format!(
        "Dear review team,\n\n\
         The profile picture {key} stored in bucket {bucket} was found to contain \
         text, which is not allowed under the profile picture policy.\n\n\
         Text found in the image:\n{texts}\n\n\
         The text regions have been blurred in place. Please review the image \
         and take any further action needed.\n\n\
         Sincerely,\nProfile Picture Validation",
        key = source.key,
        bucket = source.bucket,
    );
    Notification {
        subject: format!("Text redacted from profile picture {}", source.file_name()),
        body,
    }
}

/// Confirmation for an upload that contained no text.
pub fn compliance_notice(source: &ObjectRef) -> Notification {
    Notification {
        subject: format!("Profile picture {} is compliant", source.file_name()),
        body: format!(
            "The profile picture {} in bucket {} is compliant.",
            source.key, source.bucket
        ),
    }
}

/// [`Notifier`] that keeps every message in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages delivered so far, oldest first.
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, subject: &str, body: &str) -> Result<(), RedactError> {
        self.sent
            .lock()
            .map_err(|_| RedactError::Notification("recorder lock poisoned".into()))?
            .push(Notification {
                subject: subject.to_string(),
                body: body.to_string(),
            });
        Ok(())
    }
}
