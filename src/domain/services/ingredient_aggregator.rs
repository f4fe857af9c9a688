#[cfg(test)]
#[path = "ingredient_aggregator_test.rs"]
mod tests;

use anyhow::Result;

use crate::domain::models::Image;
use crate::domain::models::IngredientSet;
use crate::domain::models::WorkflowError;

/// Keeps the ingredient set in step with the uploaded images.
///
/// The set is rebuilt from image labels whenever a detection resolves or an
/// image is removed. A committed manual edit replaces it wholesale and stays in
/// place until the next such event.
#[derive(Default)]
pub struct IngredientAggregator {
    images: Vec<Image>,
    ingredients: IngredientSet,
    draft: Option<Vec<String>>,
}

impl IngredientAggregator {
    pub fn images(&self) -> &[Image] {
        return &self.images;
    }

    pub fn image(&self, image_id: &str) -> Option<&Image> {
        return self.images.iter().find(|image| return image.id == image_id);
    }

    pub fn ingredients(&self) -> &IngredientSet {
        return &self.ingredients;
    }

    pub fn draft(&self) -> Option<&[String]> {
        return self.draft.as_deref();
    }

    pub fn is_editing(&self) -> bool {
        return self.draft.is_some();
    }

    pub fn on_image_added(&mut self, image: Image) {
        self.images.push(image);
    }

    /// Returns false when the image was removed before detection finished.
    pub fn on_detection_resolved(&mut self, image_id: &str, result: Result<Vec<String>>) -> bool {
        let image = match self.images.iter_mut().find(|image| return image.id == image_id) {
            Some(image) => image,
            None => {
                tracing::debug!(image_id, "Ignoring detection for a removed image");
                return false;
            }
        };

        let labels = result.unwrap_or_else(|err| {
            tracing::warn!(image_id, error = ?err, "Detection failed, treating as no ingredients");
            return vec![];
        });

        image.resolve(labels);
        self.reaggregate();

        return true;
    }

    pub fn on_image_removed(&mut self, image_id: &str) -> Result<(), WorkflowError> {
        let before = self.images.len();
        self.images.retain(|image| return image.id != image_id);
        if self.images.len() == before {
            return Err(WorkflowError::UnknownImage(image_id.to_string()));
        }

        self.reaggregate();
        return Ok(());
    }

    fn reaggregate(&mut self) {
        self.ingredients = IngredientSet::from_labels(
            self.images
                .iter()
                .flat_map(|image| return image.labels().iter()),
        );

        tracing::debug!(ingredients = ?self.ingredients.as_slice(), "Ingredients re-aggregated");
    }

    pub fn begin_manual_edit(&mut self) {
        self.draft = Some(self.ingredients.to_vec());
    }

    fn draft_mut(&mut self) -> Result<&mut Vec<String>, WorkflowError> {
        return self.draft.as_mut().ok_or(WorkflowError::NoEditInProgress);
    }

    pub fn edit_draft(&mut self, index: usize, value: &str) -> Result<(), WorkflowError> {
        let draft = self.draft_mut()?;
        let slot = draft
            .get_mut(index)
            .ok_or(WorkflowError::DraftIndexOutOfRange(index))?;
        *slot = value.to_string();

        return Ok(());
    }

    pub fn add_draft_slot(&mut self) -> Result<(), WorkflowError> {
        self.draft_mut()?.push("".to_string());
        return Ok(());
    }

    pub fn remove_draft_slot(&mut self, index: usize) -> Result<(), WorkflowError> {
        let draft = self.draft_mut()?;
        if index >= draft.len() {
            return Err(WorkflowError::DraftIndexOutOfRange(index));
        }

        draft.remove(index);
        return Ok(());
    }

    pub fn commit_manual_edit(&mut self) -> Result<(), WorkflowError> {
        let draft = self.draft.take().ok_or(WorkflowError::NoEditInProgress)?;
        self.ingredients = IngredientSet::from_labels(
            draft
                .iter()
                .map(|label| return label.trim())
                .filter(|label| return !label.is_empty()),
        );

        tracing::debug!(ingredients = ?self.ingredients.as_slice(), "Manual ingredient edit saved");
        return Ok(());
    }

    pub fn cancel_manual_edit(&mut self) {
        self.draft = None;
    }
}
