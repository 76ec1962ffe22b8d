use crate::models::{EntityId, Expand};

pub const DEFAULT_LANG: &str = "en";

/// Search for objects by name.
///
/// Defaults to an exact, English-language match expanded with suggested
/// properties and parents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindObjects {
    pub name: String,
    pub lang: String,
    pub parent_id: Option<EntityId>,
    pub exact_match: bool,
    pub expand: Vec<Expand>,
}

impl FindObjects {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: DEFAULT_LANG.to_string(),
            parent_id: None,
            exact_match: true,
            expand: Expand::DEFAULT_SEARCH.to_vec(),
        }
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<EntityId>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn fuzzy(mut self) -> Self {
        self.exact_match = false;
        self
    }

    pub fn with_expand(mut self, expand: impl IntoIterator<Item = Expand>) -> Self {
        self.expand = expand.into_iter().collect();
        self
    }

    /// Filter parameters in the order the API documents them. `expand` is
    /// left to the caller.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("name", self.name.clone()), ("lang", self.lang.clone())];
        if let Some(parent_id) = &self.parent_id {
            params.push(("parentId", parent_id.to_string()));
        }
        if self.exact_match {
            params.push(("exactMatch", "1".to_string()));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let find = FindObjects::new("Cars");
        assert_eq!(
            find.params(),
            vec![
                ("name", "Cars".to_string()),
                ("lang", "en".to_string()),
                ("exactMatch", "1".to_string()),
            ]
        );
        assert_eq!(find.expand, Expand::DEFAULT_SEARCH.to_vec());
    }

    #[test]
    fn test_fuzzy_with_parent() {
        let find = FindObjects::new("Fido").with_lang("de").with_parent(7u64).fuzzy();
        assert_eq!(
            find.params(),
            vec![
                ("name", "Fido".to_string()),
                ("lang", "de".to_string()),
                ("parentId", "7".to_string()),
            ]
        );
    }
}
