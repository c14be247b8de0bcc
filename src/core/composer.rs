//! Record composer: merges context, metadata and error into one payload

use super::log_record::LogError;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Converts an attached error into the value stored in the payload
pub type ErrorSerializer = Arc<dyn Fn(&LogError) -> Value + Send + Sync>;

/// Default error serializer: `{"message": ..., "causes": [...]}`
///
/// `causes` is only present when the error has a `source()` chain.
pub fn default_error_serializer(error: &LogError) -> Value {
    let mut obj = Map::new();
    obj.insert("message".to_string(), Value::String(error.message()));
    let causes = error.causes();
    if !causes.is_empty() {
        obj.insert(
            "causes".to_string(),
            Value::Array(causes.into_iter().map(Value::String).collect()),
        );
    }
    Value::Object(obj)
}

pub const DEFAULT_ERROR_FIELD_NAME: &str = "err";

/// Field-name layout of the composed payload
#[derive(Clone)]
pub struct RecordComposer {
    context_field_name: Option<String>,
    metadata_field_name: Option<String>,
    error_field_name: String,
    error_field_in_metadata: bool,
    error_serializer: ErrorSerializer,
}

/// Inputs for one emission, already resolved
pub(crate) struct CompositionInput<'a> {
    pub context: &'a Map<String, Value>,
    pub metadata: Option<&'a Map<String, Value>>,
    pub error: Option<&'a LogError>,
    pub mute_context: bool,
    pub mute_metadata: bool,
}

impl RecordComposer {
    pub fn new() -> Self {
        Self {
            context_field_name: None,
            metadata_field_name: None,
            error_field_name: DEFAULT_ERROR_FIELD_NAME.to_string(),
            error_field_in_metadata: false,
            error_serializer: Arc::new(default_error_serializer),
        }
    }

    #[must_use]
    pub fn with_context_field_name(mut self, name: Option<String>) -> Self {
        self.context_field_name = name;
        self
    }

    #[must_use]
    pub fn with_metadata_field_name(mut self, name: Option<String>) -> Self {
        self.metadata_field_name = name;
        self
    }

    #[must_use]
    pub fn with_error_field_name(mut self, name: impl Into<String>) -> Self {
        self.error_field_name = name.into();
        self
    }

    #[must_use]
    pub fn with_error_field_in_metadata(mut self, in_metadata: bool) -> Self {
        self.error_field_in_metadata = in_metadata;
        self
    }

    #[must_use]
    pub fn with_error_serializer(mut self, serializer: ErrorSerializer) -> Self {
        self.error_serializer = serializer;
        self
    }

    pub fn error_field_name(&self) -> &str {
        &self.error_field_name
    }

    /// Build the data payload
    ///
    /// Context first, then metadata, then the error. When context and
    /// metadata share a field name they land in one nested object with
    /// metadata winning on key collisions.
    pub(crate) fn compose(&self, input: CompositionInput<'_>) -> Map<String, Value> {
        let mut data = Map::new();

        let context = (!input.mute_context && !input.context.is_empty()).then_some(input.context);
        let mut metadata: Option<Map<String, Value>> = if input.mute_metadata {
            None
        } else {
            input.metadata.filter(|m| !m.is_empty()).cloned()
        };

        let mut serialized_error = input.error.map(|e| (self.error_serializer)(e));
        if self.error_field_in_metadata {
            if let Some(err) = serialized_error.take() {
                metadata
                    .get_or_insert_with(Map::new)
                    .insert(self.error_field_name.clone(), err);
            }
        }

        match (&self.context_field_name, &self.metadata_field_name) {
            (Some(ctx_name), Some(meta_name)) if ctx_name == meta_name => {
                let mut shared = context.cloned().unwrap_or_default();
                if let Some(metadata) = metadata {
                    shared.extend(metadata);
                }
                if !shared.is_empty() {
                    data.insert(ctx_name.clone(), Value::Object(shared));
                }
            }
            _ => {
                if let Some(context) = context {
                    place(&mut data, self.context_field_name.as_deref(), context.clone());
                }
                if let Some(metadata) = metadata {
                    place(&mut data, self.metadata_field_name.as_deref(), metadata);
                }
            }
        }

        if let Some(err) = serialized_error {
            data.insert(self.error_field_name.clone(), err);
        }

        data
    }
}

fn place(data: &mut Map<String, Value>, field_name: Option<&str>, values: Map<String, Value>) {
    match field_name {
        Some(name) => {
            data.insert(name.to_string(), Value::Object(values));
        }
        None => data.extend(values),
    }
}

impl Default for RecordComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RecordComposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordComposer")
            .field("context_field_name", &self.context_field_name)
            .field("metadata_field_name", &self.metadata_field_name)
            .field("error_field_name", &self.error_field_name)
            .field("error_field_in_metadata", &self.error_field_in_metadata)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    fn input<'a>(
        context: &'a Map<String, Value>,
        metadata: Option<&'a Map<String, Value>>,
        error: Option<&'a LogError>,
    ) -> CompositionInput<'a> {
        CompositionInput {
            context,
            metadata,
            error,
            mute_context: false,
            mute_metadata: false,
        }
    }

    #[test]
    fn test_flat_merge_metadata_wins() {
        let ctx = obj(json!({"a": 1, "b": 1}));
        let meta = obj(json!({"b": 2}));
        let data = RecordComposer::new().compose(input(&ctx, Some(&meta), None));
        assert_eq!(Value::Object(data), json!({"a": 1, "b": 2}));
    }

    #[test]
    fn test_shared_field_name_single_nesting() {
        let composer = RecordComposer::new()
            .with_context_field_name(Some("shared".into()))
            .with_metadata_field_name(Some("shared".into()));
        let ctx = obj(json!({"a": 1}));
        let meta = obj(json!({"b": 2}));

        let data = composer.compose(input(&ctx, Some(&meta), None));
        assert_eq!(Value::Object(data), json!({"shared": {"a": 1, "b": 2}}));
    }

    #[test]
    fn test_separate_field_names() {
        let composer = RecordComposer::new()
            .with_context_field_name(Some("ctx".into()))
            .with_metadata_field_name(Some("meta".into()));
        let ctx = obj(json!({"a": 1}));
        let meta = obj(json!({"b": 2}));

        let data = composer.compose(input(&ctx, Some(&meta), None));
        assert_eq!(Value::Object(data), json!({"ctx": {"a": 1}, "meta": {"b": 2}}));
    }

    #[test]
    fn test_error_top_level_default() {
        let err = LogError::msg("boom");
        let ctx = Map::new();
        let data = RecordComposer::new().compose(input(&ctx, None, Some(&err)));
        assert_eq!(Value::Object(data), json!({"err": {"message": "boom"}}));
    }

    #[test]
    fn test_error_in_metadata_creates_namespace() {
        let composer = RecordComposer::new()
            .with_metadata_field_name(Some("meta".into()))
            .with_error_field_name("error")
            .with_error_field_in_metadata(true);
        let err = LogError::msg("boom");
        let ctx = Map::new();

        let data = composer.compose(input(&ctx, None, Some(&err)));
        assert_eq!(
            Value::Object(data),
            json!({"meta": {"error": {"message": "boom"}}})
        );
    }

    #[test]
    fn test_custom_serializer() {
        let composer = RecordComposer::new()
            .with_error_serializer(Arc::new(|e: &LogError| Value::String(e.message())));
        let err = LogError::msg("boom");
        let ctx = Map::new();
        let data = composer.compose(input(&ctx, None, Some(&err)));
        assert_eq!(data["err"], json!("boom"));
    }

    #[test]
    fn test_mutes() {
        let ctx = obj(json!({"a": 1}));
        let meta = obj(json!({"b": 2}));
        let composer = RecordComposer::new();

        let data = composer.compose(CompositionInput {
            mute_context: true,
            ..input(&ctx, Some(&meta), None)
        });
        assert_eq!(Value::Object(data), json!({"b": 2}));

        let data = composer.compose(CompositionInput {
            mute_metadata: true,
            ..input(&ctx, Some(&meta), None)
        });
        assert_eq!(Value::Object(data), json!({"a": 1}));
    }

    #[test]
    fn test_empty_inputs_produce_no_nesting() {
        let composer = RecordComposer::new().with_context_field_name(Some("ctx".into()));
        let ctx = Map::new();
        let data = composer.compose(input(&ctx, None, None));
        assert!(data.is_empty());
    }
}
