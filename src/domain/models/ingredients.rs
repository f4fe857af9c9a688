#[cfg(test)]
#[path = "ingredients_test.rs"]
mod tests;

/// De-duplicated ingredient labels, kept in first-seen order for display.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IngredientSet {
    labels: Vec<String>,
}

impl IngredientSet {
    pub fn from_labels<I, S>(labels: I) -> IngredientSet
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = IngredientSet::default();
        for label in labels {
            set.insert(label.as_ref());
        }

        return set;
    }

    pub fn insert(&mut self, label: &str) -> bool {
        if self.contains(label) {
            return false;
        }

        self.labels.push(label.to_string());
        return true;
    }

    pub fn contains(&self, label: &str) -> bool {
        return self.labels.iter().any(|e| return e == label);
    }

    pub fn as_slice(&self) -> &[String] {
        return &self.labels;
    }

    pub fn to_vec(&self) -> Vec<String> {
        return self.labels.clone();
    }

    pub fn len(&self) -> usize {
        return self.labels.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.labels.is_empty();
    }
}
