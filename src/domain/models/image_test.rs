use super::DetectionStatus;
use super::Image;

#[test]
fn it_starts_pending_without_labels() {
    let image = Image::new("fridge.jpg", vec![1, 2, 3]);
    assert_eq!(image.status(), DetectionStatus::Pending);
    assert!(image.labels().is_empty());
    assert_eq!(image.status_text(), "detecting...");
    assert_eq!(image.id.len(), 8);
}

#[test]
fn it_creates_unique_ids() {
    assert_ne!(Image::create_id(), Image::create_id());
}

#[test]
fn it_resolves_labels() {
    let mut image = Image::new("fridge.jpg", vec![]);
    image.resolve(vec!["egg".to_string(), "rice".to_string()]);
    assert_eq!(image.status(), DetectionStatus::Done);
    assert_eq!(image.status_text(), "egg, rice");
}

#[test]
fn it_reports_empty_detections() {
    let mut image = Image::new("table.png", vec![]);
    image.resolve(vec![]);
    assert_eq!(image.status(), DetectionStatus::Done);
    assert_eq!(image.status_text(), "no ingredients detected");
}

#[test]
fn it_accepts_supported_extensions() {
    assert!(Image::is_supported("a.jpg"));
    assert!(Image::is_supported("photos/B.JPEG"));
    assert!(Image::is_supported("c.webp"));
}

#[test]
fn it_rejects_unsupported_extensions() {
    assert!(!Image::is_supported("notes.txt"));
    assert!(!Image::is_supported("no_extension"));
    assert!(!Image::is_supported(""));
}
