//! # Stratus configuration field model
//!
//! Shared declarative types for the configuration-resolution engine. A calling
//! command describes every configurable value of a resource as a [`FieldSpec`];
//! the engine walks the spec list, fills in values from supplied options,
//! defaults, remote candidate sources, or interactive prompts, and returns a
//! nested configuration document ready to merge into an API payload.
//!
//! Everything in this crate is plain data. Candidate sources and value
//! transforms that were once executable closures in older clients are modeled
//! here as closed, serializable strategy enums ([`OptionsSpec`],
//! [`ValueTransform`]) so a schema can round-trip through YAML or JSON.

use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value};

pub mod depends;

pub use depends::{DependencyClause, DependencyExpr, ExprParseError, MatchType};

/// Prompt kind of a configurable field.
///
/// The engine dispatches to one prompter routine per variant. Serialized names
/// follow the platform's schema vocabulary (`multiSelect`, `file-content`,
/// `azure-marketplace`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    /// Free-text line input
    #[default]
    Text,
    /// Integer or float input
    Number,
    /// No-echo secret input
    Password,
    /// Yes/no toggle
    Checkbox,
    /// Single choice from a static candidate list
    Radio,
    /// Multi-line input terminated by an `EOF` line
    Multiline,
    /// Single choice from a candidate list
    Select,
    /// Repeated choice from a candidate list
    MultiSelect,
    /// Single choice, candidates re-queried per attempt with the input as filter
    Typeahead,
    /// Repeated typeahead choice
    MultiTypeahead,
    /// Local path that must exist and be a regular file
    File,
    /// File content sourced inline, by URL, or from a source-control repository
    #[serde(rename = "file-content")]
    FileContent,
    /// Repeated free-text entries
    MultiText,
    /// Comma-separated list collected into an array
    TextArray,
    /// `k=v` pairs or a JSON object collected into a map
    KeyValue,
    /// Byte count with optional `G`/`M` suffix
    ByteSize,
    /// Platform credential, resolved through a nested credential-type schema
    Credential,
    /// Azure marketplace image reference built from several parts
    #[serde(rename = "azure-marketplace")]
    AzureMarketplace,
}

impl FieldType {
    /// True for types resolved through [`SelectOption`] matching.
    pub fn is_select_like(self) -> bool {
        matches!(
            self,
            Self::Radio | Self::Select | Self::MultiSelect | Self::Typeahead | Self::MultiTypeahead
        )
    }

    /// True for types that accumulate more than one value.
    pub fn is_multi(self) -> bool {
        matches!(self, Self::MultiSelect | Self::MultiTypeahead)
    }

    /// True for types that re-query their candidate source on every attempt.
    pub fn is_typeahead(self) -> bool {
        matches!(self, Self::Typeahead | Self::MultiTypeahead)
    }
}

/// One selectable candidate exposed to the operator.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectOption {
    /// Display name shown in listings and matched as a fallback
    pub name: String,
    /// Underlying value written into the result
    pub value: String,
    /// Marks the candidate the engine may auto-pick in no-prompt mode
    #[serde(default)]
    pub is_default: bool,
    /// Marks a display-only group header row; never matched
    #[serde(default)]
    pub is_group: bool,
    /// Extra attributes carried by remote rows, handed back to the caller
    /// alongside the chosen value
    #[serde(flatten)]
    pub attributes: JsonMap<String, Value>,
}

impl SelectOption {
    /// Convenience constructor for a plain name/value candidate.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Self::default()
        }
    }
}

/// Candidate-value strategy for a choice field.
///
/// A closed set replaces the function-valued `selectOptions`/`optionSource`
/// fields of older clients: the schema stays data-only and the engine
/// dispatches on the tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum OptionsSpec {
    /// Inline candidate list fixed at schema-authoring time.
    Static {
        options: Vec<SelectOption>,
    },
    /// Candidates fetched from a named remote option source.
    #[serde(rename_all = "camelCase")]
    Remote {
        /// Provider name understood by the options endpoint
        source: String,
        /// Optional source-type discriminator forwarded to the endpoint
        #[serde(default)]
        source_type: Option<String>,
        /// Extra request parameters
        #[serde(default)]
        params: JsonMap<String, Value>,
    },
    /// Candidates computed from already-resolved sibling fields, bypassing the
    /// network entirely.
    #[serde(rename_all = "camelCase")]
    Derived {
        /// Dotted result paths whose values become the candidates
        from_fields: Vec<String>,
    },
}

/// Post-prompt value transform, applied before type coercion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ValueTransform {
    /// Substitute the raw value into a `{value}` placeholder.
    Template { pattern: String },
}

impl ValueTransform {
    /// Apply the transform to a raw string value.
    pub fn apply(&self, raw: &str) -> String {
        match self {
            Self::Template { pattern } => pattern.replace("{value}", raw),
        }
    }
}

/// Type-specific prompt configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldConfig {
    /// Multi prompts bias the "add another?" default toward yes while the
    /// accumulated count stays below this threshold
    #[serde(default)]
    pub recommended_count: Option<u64>,
    /// Sub-field names of composite prompts (e.g. the marketplace image parts)
    #[serde(default)]
    pub parts: Vec<String>,
}

/// Declarative description of one configurable value.
///
/// Field specs are authored per invocation by the calling command and treated
/// as immutable inputs; the engine clones a spec when it needs to annotate a
/// computed default.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    /// Leaf key of the resolved value
    pub field_name: String,
    /// Dotted namespace prefix placing the value under nested keys
    #[serde(default)]
    pub field_context: Option<String>,
    /// Human-facing label; falls back to `field_name`
    #[serde(default)]
    pub field_label: Option<String>,
    /// Prompt kind
    #[serde(default, rename = "type")]
    pub field_type: FieldType,
    /// Whether resolution without a value is fatal in no-prompt mode
    #[serde(default)]
    pub required: bool,
    /// Raw default, matched against candidates for choice fields
    #[serde(default)]
    pub default_value: Option<String>,
    /// Explicit dependency handle; other fields reference this spec by this
    /// code or, absent one, by its `context.name` path
    #[serde(default)]
    pub code: Option<String>,
    /// Unsatisfied expression skips the field entirely
    #[serde(default)]
    pub depends_on_code: Option<String>,
    /// Unsatisfied expression skips the field entirely
    #[serde(default)]
    pub visible_on_code: Option<String>,
    /// Expression result overwrites `required` before processing
    #[serde(default)]
    pub require_on_code: Option<String>,
    /// Help text printed by the `?` escape and in missing-required guidance
    #[serde(default)]
    pub description: Option<String>,
    /// Whole-string regex a text answer must match
    #[serde(default)]
    pub verification_pattern: Option<String>,
    /// Candidate-value strategy for choice fields
    #[serde(default)]
    pub options: Option<OptionsSpec>,
    /// Presentation group; `default` sorts first, `advanced` last
    #[serde(default)]
    pub field_group: Option<String>,
    /// Ascending sort key within a group
    #[serde(default)]
    pub display_order: i64,
    /// Post-prompt transform
    #[serde(default)]
    pub transform: Option<ValueTransform>,
    /// Type-specific prompt configuration
    #[serde(default)]
    pub config: Option<FieldConfig>,
    /// Nested specs for structurally recursive prompts (credential sub-schemas)
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

impl FieldSpec {
    /// Human-facing label, falling back to the field name.
    pub fn label(&self) -> &str {
        self.field_label
            .as_deref()
            .filter(|label| !label.is_empty())
            .unwrap_or(&self.field_name)
    }

    /// Namespace path segments: the dotted context followed by the field name.
    pub fn path(&self) -> Vec<String> {
        let mut segments: Vec<String> = self
            .field_context
            .as_deref()
            .unwrap_or("")
            .split('.')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();
        segments.push(self.field_name.clone());
        segments
    }

    /// Dotted form of [`FieldSpec::path`].
    pub fn path_string(&self) -> String {
        self.path().join(".")
    }

    /// Handle other fields use in dependency expressions: the explicit `code`
    /// when present, otherwise the `context.name` path.
    pub fn dependency_code(&self) -> String {
        self.code
            .as_deref()
            .filter(|code| !code.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.path_string())
    }

    /// Threshold below which multi prompts default "add another?" to yes.
    pub fn recommended_count(&self) -> u64 {
        self.config
            .as_ref()
            .and_then(|config| config.recommended_count)
            .unwrap_or(0)
    }
}

/// Display paging state for long candidate listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pagination {
    /// Zero-based page currently on screen
    pub current_page: usize,
    /// Rows per terminal screen
    pub page_size: usize,
    /// Total candidate count
    pub total: usize,
}

impl Pagination {
    /// Build paging state over `total` rows, `page_size` floored to 1.
    pub fn new(page_size: usize, total: usize) -> Self {
        Self {
            current_page: 0,
            page_size: page_size.max(1),
            total,
        }
    }

    /// Number of screens needed to show every row.
    pub fn page_count(&self) -> usize {
        self.total.div_ceil(self.page_size)
    }

    /// Half-open row range of the current page.
    pub fn page_bounds(&self) -> (usize, usize) {
        let start = self.current_page * self.page_size;
        (start.min(self.total), (start + self.page_size).min(self.total))
    }

    /// True when at least one page follows the current one.
    pub fn has_next(&self) -> bool {
        self.current_page + 1 < self.page_count()
    }

    /// Move to the next page; returns false when already on the last one.
    pub fn advance(&mut self) -> bool {
        if self.has_next() {
            self.current_page += 1;
            true
        } else {
            false
        }
    }
}

/// One credential type exposed by the platform, with its own field schema.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialTypeSpec {
    /// Display name
    pub name: String,
    /// Selection value; `local` recurses into `fields`
    pub value: String,
    /// Nested field schema collected when this type is chosen
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

/// Result of a select operation: the chosen value plus the chosen candidate's
/// auxiliary attributes, returned explicitly instead of parked in shared state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectOutcome {
    /// Underlying value of the chosen candidate
    pub value: String,
    /// Extra attributes the chosen candidate carried
    pub auxiliary: JsonMap<String, Value>,
}

impl SelectOutcome {
    /// Outcome for a candidate, copying its auxiliary attributes.
    pub fn from_option(option: &SelectOption) -> Self {
        Self {
            value: option.value.clone(),
            auxiliary: option.attributes.clone(),
        }
    }

    /// Outcome carrying a bare value with no auxiliary attributes.
    pub fn bare(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            auxiliary: JsonMap::new(),
        }
    }
}
