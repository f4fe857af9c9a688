#[cfg(test)]
#[path = "image_test.rs"]
mod tests;

use std::path::Path;

use uuid::Uuid;

const SUPPORTED_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "bmp", "webp"];

pub type ImageId = String;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetectionStatus {
    Pending,
    Done,
}

/// An uploaded photo and the ingredient labels detected in it.
#[derive(Clone, Debug)]
pub struct Image {
    pub id: ImageId,
    pub name: String,
    pub bytes: Vec<u8>,
    status: DetectionStatus,
    labels: Vec<String>,
}

impl Image {
    pub fn new(name: &str, bytes: Vec<u8>) -> Image {
        return Image {
            id: Image::create_id(),
            name: name.to_string(),
            bytes,
            status: DetectionStatus::Pending,
            labels: vec![],
        };
    }

    /// Short ids are easier to type back into `/remove`.
    pub fn create_id() -> ImageId {
        return Uuid::new_v4()
            .to_string()
            .split('-')
            .next()
            .unwrap_or_default()
            .to_string();
    }

    pub fn is_supported(name: &str) -> bool {
        let extension = Path::new(name)
            .extension()
            .and_then(|ext| return ext.to_str())
            .map(|ext| return ext.to_lowercase());

        return match extension {
            Some(ext) => SUPPORTED_EXTENSIONS.contains(&ext.as_str()),
            None => false,
        };
    }

    pub fn status(&self) -> DetectionStatus {
        return self.status;
    }

    pub fn labels(&self) -> &[String] {
        return &self.labels;
    }

    pub fn resolve(&mut self, labels: Vec<String>) {
        self.status = DetectionStatus::Done;
        self.labels = labels;
    }

    pub fn status_text(&self) -> String {
        if self.status == DetectionStatus::Pending {
            return "detecting...".to_string();
        }
        if self.labels.is_empty() {
            return "no ingredients detected".to_string();
        }

        return self.labels.join(", ");
    }
}
