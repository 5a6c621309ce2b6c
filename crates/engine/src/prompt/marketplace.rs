//! Composite marketplace-image prompt.
//!
//! An azure-marketplace field collects several parts of an image reference in
//! one pass and resolves to a nested object of those parts.

use serde_json::{Map as JsonMap, Value};
use stratus_types::FieldSpec;

use crate::error::ResolveResult;

use super::text::prompt_text;

/// Parts prompted when the field config names none.
const DEFAULT_PARTS: [&str; 4] = ["publisher", "offer", "sku", "version"];

/// Prompt every configured part, producing an object keyed by part name.
/// Skipping the first part skips the whole field.
pub fn prompt_marketplace(spec: &FieldSpec) -> ResolveResult<Option<Value>> {
    let configured: Vec<String> = spec
        .config
        .as_ref()
        .map(|config| config.parts.clone())
        .filter(|parts| !parts.is_empty())
        .unwrap_or_else(|| DEFAULT_PARTS.iter().map(|part| part.to_string()).collect());

    let mut image = JsonMap::new();
    for part in &configured {
        let part_spec = FieldSpec {
            field_name: part.clone(),
            field_label: Some(format!("{} {}", spec.label(), part)),
            required: spec.required || !image.is_empty(),
            ..FieldSpec::default()
        };
        match prompt_text(&part_spec)? {
            Some(value) => {
                image.insert(part.clone(), Value::String(value));
            }
            None => return Ok(None),
        }
    }
    Ok(Some(Value::Object(image)))
}

#[cfg(test)]
mod tests {
    use stratus_types::{FieldConfig, FieldSpec};

    use super::DEFAULT_PARTS;

    #[test]
    fn test_default_parts_cover_image_reference() {
        assert_eq!(DEFAULT_PARTS, ["publisher", "offer", "sku", "version"]);
    }

    #[test]
    fn test_configured_parts_override_defaults() {
        let spec = FieldSpec {
            field_name: "image".into(),
            config: Some(FieldConfig {
                parts: vec!["publisher".into(), "offer".into()],
                ..FieldConfig::default()
            }),
            ..FieldSpec::default()
        };
        assert_eq!(spec.config.unwrap().parts.len(), 2);
    }
}
