/// Recipe text together with the ingredients it was generated from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Recipe {
    pub text: String,
    pub ingredients: Vec<String>,
}

impl Recipe {
    pub fn new(text: &str, ingredients: Vec<String>) -> Recipe {
        return Recipe {
            text: text.to_string(),
            ingredients,
        };
    }
}
