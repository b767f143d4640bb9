use std::collections::BTreeMap;

/// Model used when the form leaves the selection blank.
pub const DEFAULT_MODEL: &str = "gpt-5";

/// Report language used when the form leaves it blank.
pub const DEFAULT_LANGUAGE: &str = "en";

const MODEL_FIELD: &str = "ai_model";
const MULTI_VALUE_DELIMITER: &str = ",";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Single(String),
    Multi(Vec<String>),
}

impl FieldValue {
    /// Collapse the value into the single string sent on the wire.
    pub fn joined(&self) -> String {
        match self {
            FieldValue::Single(value) => value.clone(),
            FieldValue::Multi(values) => values
                .iter()
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .collect::<Vec<_>>()
                .join(MULTI_VALUE_DELIMITER),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Single(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Single(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(values: Vec<String>) -> Self {
        FieldValue::Multi(values)
    }
}

/// Immutable report-generation payload: named form fields plus the selected model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    fields: BTreeMap<String, FieldValue>,
    model: String,
}

impl JobRequest {
    /// A blank `model` falls back to [`DEFAULT_MODEL`].
    pub fn new(model: impl Into<String>) -> Self {
        let model = model.into();
        let model = match model.trim() {
            "" => DEFAULT_MODEL.to_string(),
            trimmed => trimmed.to_string(),
        };
        Self {
            fields: BTreeMap::new(),
            model,
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        let name = name.into();
        // The model travels in its own slot so the fallback always applies.
        if name != MODEL_FIELD {
            self.fields.insert(name, value.into());
        }
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Ordered `(name, value)` pairs ready for url-encoding. `ai_model` is always last.
    pub fn form_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .fields
            .iter()
            .map(|(name, value)| (name.clone(), value.joined()))
            .collect();
        pairs.push((MODEL_FIELD.to_string(), self.model.clone()));
        pairs
    }
}

impl Default for JobRequest {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL)
    }
}
