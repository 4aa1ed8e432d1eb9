use std::fs;

use textredact::{
    ObjectRef, ObjectStore, OutputFormat, ProcessingOutcome, RecordingNotifier, RedactionService,
    Redactor, ServiceConfig, StandardLoader, StaticDetector,
};
use textredact_cli::{load_detections, output_format, DirectoryStore};

const OCR_RESPONSE: &str = r#"{"Blocks": [
    {"BlockType": "LINE", "Text": "call me",
     "Geometry": {"BoundingBox": {"Left": 0.1, "Top": 0.1, "Width": 0.6, "Height": 0.1}}},
    {"BlockType": "WORD", "Text": "call",
     "Geometry": {"BoundingBox": {"Left": 0.1, "Top": 0.1, "Width": 0.25, "Height": 0.1}}},
    {"BlockType": "WORD", "Text": "me",
     "Geometry": {"BoundingBox": {"Left": 0.4, "Top": 0.1, "Width": 0.2, "Height": 0.1}}}
]}"#;

fn make_test_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, 128])
    });
    textredact::codec::encode_image(&img, OutputFormat::Png, 95).unwrap()
}

#[test]
fn loads_words_from_saved_response() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ocr.json");
    fs::write(&path, OCR_RESPONSE).unwrap();

    let texts: Vec<_> = load_detections(&path)
        .unwrap()
        .into_iter()
        .map(|d| d.text)
        .collect();
    assert_eq!(texts, vec!["call", "me"]);
}

#[test]
fn missing_response_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_detections(&dir.path().join("absent.json")).is_err());
}

#[test]
fn extensionless_output_keeps_png_input_as_png() {
    let dir = tempfile::tempdir().unwrap();
    let ocr_path = dir.path().join("ocr.json");
    fs::write(&ocr_path, OCR_RESPONSE).unwrap();

    let mut redactor = Redactor::new(make_test_png(80, 60)).unwrap();
    if let Some(format) = output_format(&dir.path().join("redacted")).unwrap() {
        redactor = redactor.format(format);
    }
    let result = redactor
        .redact(&load_detections(&ocr_path).unwrap())
        .unwrap();

    assert_eq!(result.format, OutputFormat::Png);
    assert_eq!(
        image::guess_format(&result.data).unwrap(),
        image::ImageFormat::Png
    );
}

#[test]
fn store_round_trips_objects() {
    let dir = tempfile::tempdir().unwrap();
    let store = DirectoryStore::new(dir.path());
    let a = ObjectRef::new("one", "nested/a.bin");
    let b = a.in_bucket("two");

    store.put(&a, b"payload", "application/octet-stream").unwrap();
    store.copy(&a, &b).unwrap();
    store.delete(&a).unwrap();

    assert_eq!(store.get(&b).unwrap(), b"payload");
    assert!(store.get(&a).is_err());
}

#[test]
fn service_replaces_upload_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = DirectoryStore::new(dir.path());
    let source = ObjectRef::new("uploads", "players/1/me.png");
    let original = make_test_png(80, 60);
    store.put(&source, &original, "image/png").unwrap();

    let ocr_path = dir.path().join("ocr.json");
    fs::write(&ocr_path, OCR_RESPONSE).unwrap();
    let detector = StaticDetector::new(load_detections(&ocr_path).unwrap());
    let notifier = RecordingNotifier::new();
    let loader = StandardLoader::default();
    let service = RedactionService::new(
        ServiceConfig::new("processing", "reviewers"),
        &store,
        &detector,
        &notifier,
        &loader,
    );

    let outcome = service.process(&source).unwrap();
    assert_eq!(
        outcome,
        ProcessingOutcome::Redacted {
            detected_texts: vec!["call".into(), "me".into()]
        }
    );

    let replaced = store.get(&source).unwrap();
    assert_ne!(replaced, original);
    assert!(!dir.path().join("processing/players/1/me.png").exists());
    assert_eq!(notifier.sent().len(), 1);
}
