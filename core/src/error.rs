use std::collections::BTreeMap;

/// Field-level validation error map, e.g. `{"scriptContent": "required when
/// scriptType is user_provided"}`. Supplements spec §8 scenario 5's
/// `{error: {...}}` shape with named fields instead of a single string.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FieldErrors(pub BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
