//! File-backed prompters: local path validation and the three-mode
//! file-content prompt.

use std::fs;
use std::path::Path;

use serde_json::{Map as JsonMap, Value, json};
use stratus_types::{FieldSpec, FieldType, OptionsSpec, SelectOption};

use crate::error::ResolveResult;
use crate::source::OptionSource;

use super::select::prompt_select;
use super::text::prompt_text;

/// Source-mode values of the file-content prompt.
const MODE_LOCAL: &str = "local";
const MODE_URL: &str = "url";
const MODE_SCM: &str = "scm";

/// Prompt for a local path, re-prompting until it names a regular file.
pub fn prompt_file(spec: &FieldSpec) -> ResolveResult<Option<String>> {
    loop {
        let Some(answer) = prompt_text(spec)? else {
            return Ok(None);
        };
        let path = Path::new(&answer);
        if path.is_file() {
            return Ok(Some(answer));
        }
        eprintln!("'{answer}' is not a regular file");
    }
}

/// Prompt for file content through a nested source-mode select: inline local
/// content, a URL reference, or a source-control repository reference.
pub async fn prompt_file_content(
    spec: &FieldSpec,
    resolved: &JsonMap<String, Value>,
    source: &dyn OptionSource,
) -> ResolveResult<Option<Value>> {
    let mode_spec = FieldSpec {
        field_name: format!("{}Source", spec.field_name),
        field_label: Some(format!("{} source", spec.label())),
        field_type: FieldType::Select,
        required: spec.required,
        default_value: Some(MODE_LOCAL.into()),
        options: Some(OptionsSpec::Static {
            options: vec![
                SelectOption::new("Local file", MODE_LOCAL),
                SelectOption::new("URL", MODE_URL),
                SelectOption::new("Source-control repository", MODE_SCM),
            ],
        }),
        ..FieldSpec::default()
    };
    let Some(mode) = prompt_select(&mode_spec, resolved, source).await? else {
        return Ok(None);
    };

    match mode.value.as_str() {
        MODE_URL => {
            let Some(url) = prompt_text(&sub_spec(spec, "Url", "URL", true))? else {
                return Ok(None);
            };
            Ok(Some(json!({ "sourceType": MODE_URL, "url": url })))
        }
        MODE_SCM => {
            let Some(repository) = prompt_text(&sub_spec(spec, "Repository", "repository URL", true))? else {
                return Ok(None);
            };
            let Some(path) = prompt_text(&sub_spec(spec, "Path", "path in the repository", true))? else {
                return Ok(None);
            };
            let reference = prompt_text(&sub_spec(spec, "Ref", "ref (branch, tag, or commit)", false))?;
            let mut entry = json!({ "sourceType": MODE_SCM, "repository": repository, "path": path });
            if let Some(reference) = reference {
                entry["ref"] = Value::String(reference);
            }
            Ok(Some(entry))
        }
        _ => {
            let Some(path) = prompt_file(&sub_spec(spec, "Path", "local file", true))? else {
                return Ok(None);
            };
            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(error) => {
                    eprintln!("could not read '{path}': {error}");
                    return Box::pin(prompt_file_content(spec, resolved, source)).await;
                }
            };
            Ok(Some(json!({ "sourceType": MODE_LOCAL, "content": content })))
        }
    }
}

/// Synthetic sub-field of a file-content prompt.
fn sub_spec(parent: &FieldSpec, suffix: &str, label: &str, required: bool) -> FieldSpec {
    FieldSpec {
        field_name: format!("{}{}", parent.field_name, suffix),
        field_label: Some(format!("{} {}", parent.label(), label)),
        required,
        ..FieldSpec::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_spec_names_follow_parent() {
        let parent = FieldSpec {
            field_name: "recipe".into(),
            field_label: Some("Recipe".into()),
            ..FieldSpec::default()
        };
        let sub = sub_spec(&parent, "Url", "URL", true);
        assert_eq!(sub.field_name, "recipeUrl");
        assert_eq!(sub.label(), "Recipe URL");
        assert!(sub.required);
    }
}
