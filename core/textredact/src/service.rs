use tracing::{error, info, warn};

use crate::codec::{ImageLoader, OutputFormat};
use crate::config::ServiceConfig;
use crate::detector::TextDetector;
use crate::error::RedactError;
use crate::notify::{compliance_notice, redaction_report, Notifier};
use crate::pipeline::RedactionPipeline;
use crate::store::{ObjectRef, ObjectStore, UploadEvent};

/// Message returned with a 200 status.
pub const SUCCESS_MESSAGE: &str = "Profile picture has been verified successfully";
/// Message returned with a 500 status. Carries no internal detail.
pub const FAILURE_MESSAGE: &str = "There was an error while verifying the profile picture";

/// What happened to one upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingOutcome {
    /// Text was found and blurred; the original object now holds the redacted image.
    Redacted {
        /// Text that was blurred, in detector order.
        detected_texts: Vec<String>,
    },
    /// No text was found; the object was left alone.
    Compliant,
    /// The object was not eligible for processing.
    Skipped {
        /// Why the object was passed over.
        reason: String,
    },
}

/// Coarse result handed back to whatever invoked the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingStatus {
    /// HTTP-style status, 200 or 500.
    pub status_code: u16,
    /// Fixed human-readable message for the status.
    pub message: &'static str,
}

impl ProcessingStatus {
    /// Success.
    pub fn ok() -> Self {
        Self {
            status_code: 200,
            message: SUCCESS_MESSAGE,
        }
    }

    /// Generic failure.
    pub fn failed() -> Self {
        Self {
            status_code: 500,
            message: FAILURE_MESSAGE,
        }
    }

    /// Whether this is the success status.
    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

/// Runs uploads through detection, redaction, staging and notification.
///
/// All collaborators are borrowed; the service itself holds no mutable state
/// and can process several uploads concurrently.
pub struct RedactionService<'a> {
    config: ServiceConfig,
    store: &'a dyn ObjectStore,
    detector: &'a dyn TextDetector,
    notifier: &'a dyn Notifier,
    loader: &'a dyn ImageLoader,
    pipeline: RedactionPipeline,
}

impl<'a> RedactionService<'a> {
    /// Service over the given collaborators.
    pub fn new(
        config: ServiceConfig,
        store: &'a dyn ObjectStore,
        detector: &'a dyn TextDetector,
        notifier: &'a dyn Notifier,
        loader: &'a dyn ImageLoader,
    ) -> Self {
        Self {
            config,
            store,
            detector,
            notifier,
            loader,
            pipeline: RedactionPipeline::new(),
        }
    }

    /// Settings in use.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Process one uploaded object, propagating the first failure.
    pub fn process(&self, object: &ObjectRef) -> Result<ProcessingOutcome, RedactError> {
        if object.bucket == self.config.processing_bucket {
            return Ok(skipped(object, "object is in the processing bucket"));
        }
        if let Some(source) = &self.config.source_bucket {
            if &object.bucket != source {
                return Ok(skipped(object, "object is not in the source bucket"));
            }
        }

        let format = OutputFormat::from_extension(object.extension().unwrap_or_default())?;
        info!(object = %object, format = ?format, "processing upload");

        let bytes = self.store.get(object)?;
        let image = self.loader.load(&bytes)?;
        let detections = self.detector.detect(object, &image)?;
        info!(object = %object, detections = detections.len(), "text detection finished");

        let result = self.pipeline.run(&image, &detections)?;

        if !result.had_redactions {
            if self.config.notify_compliant {
                let notice = compliance_notice(object);
                self.notifier.notify(&notice.subject, &notice.body)?;
            }
            info!(object = %object, "upload is compliant");
            return Ok(ProcessingOutcome::Compliant);
        }

        let encoded = self.loader.encode(&result.redacted_image, format)?;
        self.replace_via_staging(object, &encoded, format)?;

        let report = redaction_report(object, &result.detected_texts);
        self.notifier.notify(&report.subject, &report.body)?;
        info!(object = %object, "redaction report sent");

        Ok(ProcessingOutcome::Redacted {
            detected_texts: result.detected_texts,
        })
    }

    /// Overwrite `object` without writing to it directly.
    ///
    /// The new bytes land in the processing bucket first and are then copied
    /// over the original, so the upload trigger on the source bucket never
    /// sees a fresh write of its own output.
    fn replace_via_staging(
        &self,
        object: &ObjectRef,
        data: &[u8],
        format: OutputFormat,
    ) -> Result<(), RedactError> {
        let staged = object.in_bucket(&self.config.processing_bucket);

        self.store.put(&staged, data, format.mime_type())?;
        info!(staged = %staged, bytes = data.len(), "redacted image staged");

        self.store.copy(&staged, object)?;
        info!(object = %object, "redacted image copied over original");

        self.store.delete(&staged)?;
        info!(staged = %staged, "staged copy deleted");
        Ok(())
    }

    /// Process one object and reduce the result to a status.
    ///
    /// Failures are logged with their stage and kind; callers only learn that
    /// processing failed.
    pub fn handle(&self, object: &ObjectRef) -> ProcessingStatus {
        match self.process(object) {
            Ok(_) => ProcessingStatus::ok(),
            Err(e) => {
                log_failure(&e, Some(object));
                ProcessingStatus::failed()
            }
        }
    }

    /// Parse a store event and [`handle`](Self::handle) the object it names.
    pub fn handle_event(&self, body: &str) -> ProcessingStatus {
        match UploadEvent::from_json(body).and_then(|event| event.first_object()) {
            Ok(object) => self.handle(&object),
            Err(e) => {
                log_failure(&e, None);
                ProcessingStatus::failed()
            }
        }
    }
}

fn skipped(object: &ObjectRef, reason: &str) -> ProcessingOutcome {
    warn!(object = %object, reason, "skipping upload");
    ProcessingOutcome::Skipped {
        reason: reason.to_string(),
    }
}

fn log_failure(e: &RedactError, object: Option<&ObjectRef>) {
    let object = object.map(ToString::to_string).unwrap_or_default();
    error!(
        stage = e.stage().as_str(),
        kind = e.kind(),
        error = %e,
        object = %object,
        "failed to process upload"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::StandardLoader;
    use crate::detector::{Detection, StaticDetector};
    use crate::geometry::NormalizedBox;
    use crate::notify::RecordingNotifier;
    use crate::store::{MemoryStore, StoreOp};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x * 7 % 256) as u8, (y * 11 % 256) as u8, 90])
        });
        crate::codec::encode_image(&img, OutputFormat::Png, 95).unwrap()
    }

    #[test]
    fn processing_bucket_uploads_are_skipped() {
        let store = MemoryStore::new();
        let detector = StaticDetector::default();
        let notifier = RecordingNotifier::new();
        let loader = StandardLoader::default();
        let service = RedactionService::new(
            ServiceConfig::new("staging", "topic"),
            &store,
            &detector,
            &notifier,
            &loader,
        );

        let outcome = service.process(&ObjectRef::new("staging", "a.png")).unwrap();
        assert!(matches!(outcome, ProcessingOutcome::Skipped { .. }));
        assert!(store.journal().is_empty());
        assert!(notifier.sent().is_empty());
    }

    #[test]
    fn foreign_bucket_is_skipped_when_source_is_pinned() {
        let store = MemoryStore::new();
        let detector = StaticDetector::default();
        let notifier = RecordingNotifier::new();
        let loader = StandardLoader::default();
        let mut config = ServiceConfig::new("staging", "topic");
        config.source_bucket = Some("uploads".into());
        let service = RedactionService::new(config, &store, &detector, &notifier, &loader);

        let outcome = service.process(&ObjectRef::new("other", "a.png")).unwrap();
        assert!(matches!(outcome, ProcessingOutcome::Skipped { .. }));
    }

    #[test]
    fn unsupported_extension_fails_before_reading() {
        let store = MemoryStore::new();
        let detector = StaticDetector::default();
        let notifier = RecordingNotifier::new();
        let loader = StandardLoader::default();
        let service = RedactionService::new(
            ServiceConfig::new("staging", "topic"),
            &store,
            &detector,
            &notifier,
            &loader,
        );

        let err = service
            .process(&ObjectRef::new("uploads", "a.gif"))
            .unwrap_err();
        assert!(matches!(err, RedactError::UnsupportedFormat(_)));
        assert_eq!(
            service.handle(&ObjectRef::new("uploads", "a.gif")),
            ProcessingStatus::failed()
        );
    }

    #[test]
    fn redaction_stages_then_copies_then_deletes() {
        let store = MemoryStore::new();
        let source = ObjectRef::new("uploads", "p/me.png");
        store.insert(source.clone(), png_bytes(40, 40));
        let detector = StaticDetector::new(vec![Detection::new(
            "555",
            NormalizedBox::new(0.1, 0.1, 0.3, 0.2),
        )]);
        let notifier = RecordingNotifier::new();
        let loader = StandardLoader::default();
        let service = RedactionService::new(
            ServiceConfig::new("staging", "topic"),
            &store,
            &detector,
            &notifier,
            &loader,
        );

        let outcome = service.process(&source).unwrap();
        assert_eq!(
            outcome,
            ProcessingOutcome::Redacted {
                detected_texts: vec!["555".into()]
            }
        );

        let staged = source.in_bucket("staging");
        assert_eq!(
            store.journal(),
            vec![
                StoreOp::Put(staged.clone()),
                StoreOp::Copy {
                    from: staged.clone(),
                    to: source.clone()
                },
                StoreOp::Delete(staged),
            ]
        );
        assert_eq!(notifier.sent().len(), 1);
    }
}
