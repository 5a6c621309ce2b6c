//! The per-field value-resolution loop.
//!
//! [`Resolver::resolve`] walks a compiled schema in processing order. Each
//! field runs through the same pipeline: engine-level filters, dependency
//! gating, the supplied-value fast path, non-interactive defaults, and — in
//! interactive mode — the type-specific prompter. The final value is
//! post-processed (transform, then coercion) and written into the nested
//! result, which never retains null or empty-map entries.
//!
//! Everything is sequential: one field at a time, one prompt or fetch at a
//! time. Fatal conditions return a typed [`ResolveError`] to the caller.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use serde_json::{Map as JsonMap, Value};
use stratus_types::{FieldSpec, FieldType, SelectOption};
use tracing::debug;

use crate::coerce::{coerce, stringify};
use crate::depends::{EvalContext, evaluate};
use crate::error::{ResolveError, ResolveResult};
use crate::matching::{TokenMatch, auto_pick, match_default, match_token};
use crate::paths::{get_path, is_empty_value, prune_path, set_path, vivify_path};
use crate::prompt;
use crate::prompt::select::{prompt_multi_select, prompt_select};
use crate::schema::{CompiledField, Schema};
use crate::source::{OptionSource, load_candidates};

/// Sentinel credential-type value that recurses into a nested field schema.
const LOCAL_CREDENTIAL: &str = "local";

/// Engine-level switches for one resolution run.
#[derive(Debug, Clone, Default)]
pub struct ResolveSettings {
    /// Forbid interactive prompting; unattended automation mode
    pub no_prompt: bool,
    /// Prompt even for fields the supplied bag already covers
    pub always_prompt: bool,
    /// Suppress prompting for every field (supplied values and defaults still
    /// apply; nothing becomes fatal)
    pub no_options: bool,
    /// Field names or labels never prompted for
    pub skip_fields: Vec<String>,
    /// When non-empty, the only field names or labels prompted for
    pub only_fields: Vec<String>,
}

/// Drives one resolution run over a compiled schema.
pub struct Resolver<'a> {
    source: &'a dyn OptionSource,
    settings: ResolveSettings,
    api_params: JsonMap<String, Value>,
    local_credential_done: bool,
}

impl<'a> Resolver<'a> {
    pub fn new(source: &'a dyn OptionSource, settings: ResolveSettings) -> Self {
        Self {
            source,
            settings,
            api_params: JsonMap::new(),
            local_credential_done: false,
        }
    }

    /// Attach flat API parameters consulted last by dependency lookups.
    pub fn with_api_params(mut self, api_params: JsonMap<String, Value>) -> Self {
        self.api_params = api_params;
        self
    }

    /// Resolve a schema against a supplied options bag into a nested
    /// configuration document.
    pub async fn resolve(
        &mut self,
        schema: &Schema,
        supplied: JsonMap<String, Value>,
    ) -> ResolveResult<JsonMap<String, Value>> {
        let mut bag = supplied;
        let mut result = JsonMap::new();
        self.resolve_fields(&schema.fields, schema.code_paths(), &mut bag, &mut result)
            .await?;
        Ok(result)
    }

    /// Sequentially resolve a field list. Boxed so the credential prompter can
    /// recurse into a nested schema.
    fn resolve_fields<'s>(
        &'s mut self,
        fields: &'s [CompiledField],
        code_paths: &'s HashMap<String, Vec<String>>,
        bag: &'s mut JsonMap<String, Value>,
        result: &'s mut JsonMap<String, Value>,
    ) -> Pin<Box<dyn Future<Output = ResolveResult<()>> + 's>> {
        Box::pin(async move {
            for field in fields {
                self.resolve_field(field, code_paths, bag, result).await?;
            }
            Ok(())
        })
    }

    async fn resolve_field(
        &mut self,
        field: &CompiledField,
        code_paths: &HashMap<String, Vec<String>>,
        bag: &mut JsonMap<String, Value>,
        result: &mut JsonMap<String, Value>,
    ) -> ResolveResult<()> {
        let path = field.spec.path();
        let filtered = self.filtered(&field.spec);

        // Dependency gating; requireOnCode only rewrites the required flag.
        let (gated_out, required) = {
            let ctx = EvalContext {
                resolved: result,
                supplied: bag,
                api_params: &self.api_params,
                code_paths,
            };
            let visible = field.depends_on.as_ref().is_none_or(|expr| evaluate(expr, &ctx))
                && field.visible_on.as_ref().is_none_or(|expr| evaluate(expr, &ctx));
            let required = match &field.require_on {
                Some(expr) => evaluate(expr, &ctx),
                None => field.spec.required,
            };
            (!visible, required)
        };
        if gated_out {
            debug!(field = %field.spec.field_name, "dependency gate unsatisfied; skipped");
            prune_path(result, &path);
            return Ok(());
        }

        // The schema stays immutable; annotate a copy.
        let mut spec = field.spec.clone();
        spec.required = required;

        vivify_path(bag, &path);
        vivify_path(result, &path);

        // Supplied fast path: flags, -O overrides, payload files.
        if !self.settings.always_prompt
            && let Some(raw) = get_path(bag, &path).filter(|value| !is_empty_value(value)).cloned()
            && let Some(value) = self.supplied_value(&spec, &raw, result, filtered).await?
        {
            debug!(field = %spec.field_name, "resolved from supplied options");
            self.commit(result, &path, value);
            return Ok(());
        }

        // Non-interactive resolution from defaults and auto-pickable candidates.
        if self.settings.no_prompt || filtered {
            let candidates = if spec.field_type.is_select_like() {
                load_candidates(&spec, result, self.source, None).await?
            } else {
                Vec::new()
            };
            if let Some(value) = self.pick_non_interactive(&spec, &candidates) {
                debug!(field = %spec.field_name, "resolved without prompting");
                self.commit(result, &path, value);
                return Ok(());
            }
            if spec.required && self.settings.no_prompt && !filtered {
                prompt::print_missing_required(&spec, &candidates);
                return Err(ResolveError::MissingRequired {
                    field: spec.field_name.clone(),
                });
            }
            debug!(field = %spec.field_name, "nothing to resolve; skipped");
            prune_path(result, &path);
            return Ok(());
        }

        // Interactive: hand off to the type-specific prompter.
        match self.prompt_value(&spec, bag, result).await? {
            Some(value) if !is_empty_value(&value) => {
                self.commit(result, &path, value);
            }
            _ => {
                prune_path(result, &path);
            }
        }
        Ok(())
    }

    /// True when engine-level filters make this field non-interactive.
    fn filtered(&self, spec: &FieldSpec) -> bool {
        if self.settings.no_options {
            return true;
        }
        let matches = |name: &String| name == &spec.field_name || name == spec.label();
        if self.settings.skip_fields.iter().any(matches) {
            return true;
        }
        !self.settings.only_fields.is_empty() && !self.settings.only_fields.iter().any(matches)
    }

    /// Write a final value, dropping nulls and empty maps instead.
    fn commit(&self, result: &mut JsonMap<String, Value>, path: &[String], value: Value) {
        if is_empty_value(&value) {
            prune_path(result, path);
        } else {
            set_path(result, path, value);
        }
    }

    /// Normalize a supplied value. `None` means the value did not resolve and
    /// the field falls through as if unsupplied.
    async fn supplied_value(
        &self,
        spec: &FieldSpec,
        raw: &Value,
        result: &JsonMap<String, Value>,
        filtered: bool,
    ) -> ResolveResult<Option<Value>> {
        if !spec.field_type.is_select_like() {
            return Ok(Some(match raw {
                Value::String(text) => self.post_process(spec, text),
                other => other.clone(),
            }));
        }

        let tokens: Vec<String> = if spec.field_type.is_multi() {
            match raw {
                Value::Array(items) => items.iter().map(stringify).collect(),
                other => stringify(other)
                    .split(',')
                    .map(str::trim)
                    .filter(|token| !token.is_empty())
                    .map(str::to_string)
                    .collect(),
            }
        } else {
            vec![stringify(raw)]
        };
        if tokens.is_empty() {
            return Ok(None);
        }

        let mut values = Vec::with_capacity(tokens.len());
        for token in &tokens {
            let filter = if spec.field_type.is_typeahead() { Some(token.as_str()) } else { None };
            let candidates = load_candidates(spec, result, self.source, filter).await?;
            match match_token(&candidates, token) {
                TokenMatch::Value(option) | TokenMatch::Name(option) => {
                    values.push(self.finalize_select(spec, &option.value));
                }
                TokenMatch::Ambiguous(matches) => {
                    prompt::print_ambiguous(token, &matches);
                    if self.settings.no_prompt && !filtered {
                        return Err(ResolveError::AmbiguousValue {
                            field: spec.field_name.clone(),
                            token: token.clone(),
                            matches: prompt::ambiguous_names(&matches),
                        });
                    }
                    // Interactive and filtered flows fall through instead.
                    return Ok(None);
                }
                TokenMatch::None => return Ok(None),
            }
        }

        Ok(Some(if spec.field_type.is_multi() {
            Value::Array(values)
        } else {
            values.into_iter().next().expect("one token produced one value")
        }))
    }

    /// Resolve from the default value or an auto-pickable candidate, without
    /// prompting. `None` means nothing resolved.
    fn pick_non_interactive(&self, spec: &FieldSpec, candidates: &[SelectOption]) -> Option<Value> {
        if spec.field_type.is_multi() {
            if let Some(default) = spec.default_value.as_deref() {
                let tokens: Vec<&str> = default
                    .split(',')
                    .map(str::trim)
                    .filter(|token| !token.is_empty())
                    .collect();
                if !tokens.is_empty() {
                    let mut values = Vec::with_capacity(tokens.len());
                    for token in tokens {
                        values.push(self.finalize_select(spec, &match_default(candidates, token)?.value));
                    }
                    return Some(Value::Array(values));
                }
            }
            return auto_pick(candidates, None)
                .map(|option| Value::Array(vec![self.finalize_select(spec, &option.value)]));
        }
        if spec.field_type.is_select_like() {
            return auto_pick(candidates, spec.default_value.as_deref())
                .map(|option| self.finalize_select(spec, &option.value));
        }
        spec.default_value
            .as_deref()
            .map(|default| self.post_process(spec, default))
    }

    /// Transform then coerce a raw string answer.
    fn post_process(&self, spec: &FieldSpec, raw: &str) -> Value {
        let transformed = match &spec.transform {
            Some(transform) => transform.apply(raw),
            None => raw.to_string(),
        };
        coerce(spec.field_type, &transformed)
    }

    /// A matched candidate value only passes through the transform; matching
    /// already produced the canonical value.
    fn finalize_select(&self, spec: &FieldSpec, value: &str) -> Value {
        let transformed = match &spec.transform {
            Some(transform) => transform.apply(value),
            None => value.to_string(),
        };
        Value::String(transformed)
    }

    /// Dispatch to the matching type-specific prompter.
    async fn prompt_value(
        &mut self,
        spec: &FieldSpec,
        bag: &mut JsonMap<String, Value>,
        result: &mut JsonMap<String, Value>,
    ) -> ResolveResult<Option<Value>> {
        let value = match spec.field_type {
            FieldType::Text | FieldType::ByteSize | FieldType::KeyValue | FieldType::TextArray => {
                prompt::text::prompt_text(spec)?.map(|raw| self.post_process(spec, &raw))
            }
            FieldType::Number => prompt::text::prompt_number(spec)?.map(|raw| self.post_process(spec, &raw)),
            FieldType::Password => prompt::text::prompt_password(spec)?.map(|raw| self.post_process(spec, &raw)),
            FieldType::Checkbox => prompt::text::prompt_checkbox(spec)?.map(|raw| self.post_process(spec, &raw)),
            FieldType::Multiline => prompt::text::prompt_multiline(spec)?.map(|raw| self.post_process(spec, &raw)),
            FieldType::MultiText => prompt::text::prompt_multi_text(spec)?.map(|entries| {
                Value::Array(
                    entries
                        .iter()
                        .map(|entry| self.finalize_select(spec, entry))
                        .collect(),
                )
            }),
            FieldType::File => prompt::file::prompt_file(spec)?.map(|raw| self.post_process(spec, &raw)),
            FieldType::FileContent => prompt::file::prompt_file_content(spec, result, self.source).await?,
            FieldType::Select | FieldType::Radio | FieldType::Typeahead => {
                prompt_select(spec, result, self.source)
                    .await?
                    .map(|outcome| self.finalize_select(spec, &outcome.value))
            }
            FieldType::MultiSelect | FieldType::MultiTypeahead => {
                prompt_multi_select(spec, result, self.source).await?.map(|outcomes| {
                    Value::Array(
                        outcomes
                            .iter()
                            .map(|outcome| self.finalize_select(spec, &outcome.value))
                            .collect(),
                    )
                })
            }
            FieldType::AzureMarketplace => prompt::marketplace::prompt_marketplace(spec)?,
            FieldType::Credential => self.prompt_credential(spec, bag, result).await?,
        };
        Ok(value)
    }

    /// Credential prompt: a nested select over the platform's credential
    /// types. The sentinel `local` type recurses into that type's own field
    /// schema and merges the collected values under a `credential` key; once
    /// one credential has been collected this way, later local-credential
    /// prompts are suppressed for the rest of the run.
    async fn prompt_credential(
        &mut self,
        spec: &FieldSpec,
        bag: &mut JsonMap<String, Value>,
        result: &mut JsonMap<String, Value>,
    ) -> ResolveResult<Option<Value>> {
        if self.local_credential_done {
            debug!(field = %spec.field_name, "credential already collected; prompt suppressed");
            return Ok(None);
        }

        let types = self.source.credential_types().await.map_err(ResolveError::Source)?;
        let type_spec = FieldSpec {
            field_name: format!("{}Type", spec.field_name),
            field_label: Some(format!("{} type", spec.label())),
            field_type: FieldType::Select,
            required: spec.required,
            default_value: spec.default_value.clone(),
            options: Some(stratus_types::OptionsSpec::Static {
                options: types
                    .iter()
                    .map(|credential_type| SelectOption::new(credential_type.name.clone(), credential_type.value.clone()))
                    .collect(),
            }),
            ..FieldSpec::default()
        };
        let Some(choice) = prompt_select(&type_spec, result, self.source).await? else {
            return Ok(None);
        };

        if choice.value != LOCAL_CREDENTIAL {
            return Ok(Some(Value::String(choice.value)));
        }

        let nested = types
            .into_iter()
            .find(|credential_type| credential_type.value == LOCAL_CREDENTIAL)
            .map(|credential_type| credential_type.fields)
            .unwrap_or_default();
        let nested_schema = Schema::compile(nested)?;

        // The sub-run reads any supplied values nested under the field's path.
        let mut sub_bag = get_path(bag, &spec.path())
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        let mut sub_result = JsonMap::new();
        self.resolve_fields(&nested_schema.fields, nested_schema.code_paths(), &mut sub_bag, &mut sub_result)
            .await?;
        self.local_credential_done = true;

        if sub_result.is_empty() {
            return Ok(None);
        }
        let mut wrapped = JsonMap::new();
        wrapped.insert("credential".to_string(), Value::Object(sub_result));
        Ok(Some(Value::Object(wrapped)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StaticOptionSource;
    use serde_json::json;
    use stratus_types::{OptionsSpec, ValueTransform};

    fn field(name: &str) -> FieldSpec {
        FieldSpec {
            field_name: name.into(),
            ..FieldSpec::default()
        }
    }

    fn select_field(name: &str) -> FieldSpec {
        FieldSpec {
            field_name: name.into(),
            field_type: FieldType::Select,
            options: Some(OptionsSpec::Static {
                options: vec![SelectOption::new("Alpha", "a"), SelectOption::new("Beta", "b")],
            }),
            ..FieldSpec::default()
        }
    }

    fn bag(value: Value) -> JsonMap<String, Value> {
        value.as_object().expect("object literal").clone()
    }

    fn no_prompt() -> ResolveSettings {
        ResolveSettings {
            no_prompt: true,
            ..ResolveSettings::default()
        }
    }

    async fn run(
        fields: Vec<FieldSpec>,
        settings: ResolveSettings,
        supplied: JsonMap<String, Value>,
    ) -> ResolveResult<JsonMap<String, Value>> {
        let schema = Schema::compile(fields).expect("schema compiles");
        let source = StaticOptionSource::default();
        Resolver::new(&source, settings).resolve(&schema, supplied).await
    }

    /// Walk a result asserting the no-null / no-empty-map invariant.
    fn assert_clean(value: &Value) {
        match value {
            Value::Null => panic!("result contains a null value"),
            Value::Object(map) => {
                assert!(!map.is_empty(), "result contains an empty map");
                for nested in map.values() {
                    assert_clean(nested);
                }
            }
            _ => {}
        }
    }

    #[tokio::test]
    async fn test_missing_required_is_fatal_in_no_prompt_mode() {
        let mut required = field("clusterName");
        required.required = true;

        let result = run(vec![required], no_prompt(), JsonMap::new()).await;
        match result {
            Err(ResolveError::MissingRequired { field }) => assert_eq!(field, "clusterName"),
            other => panic!("expected MissingRequired, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_optional_unresolved_field_is_absent() {
        let result = run(vec![field("comment")], no_prompt(), JsonMap::new()).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_fully_supplied_bag_is_deterministic_without_prompts() {
        let fields = || {
            let mut name = field("clusterName");
            name.required = true;
            let mut select = select_field("flavor");
            select.required = true;
            vec![name, select]
        };
        let supplied = bag(json!({"clusterName": "prod", "flavor": "a"}));

        // Interactive settings: any prompt attempt would fail (or hang) here,
        // so a pair of clean identical runs proves zero prompts were issued.
        let first = run(fields(), ResolveSettings::default(), supplied.clone()).await.unwrap();
        let second = run(fields(), ResolveSettings::default(), supplied).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(Value::Object(first), json!({"clusterName": "prod", "flavor": "a"}));
    }

    #[tokio::test]
    async fn test_invisible_field_is_absent_despite_required_and_supplied() {
        let cloud = field("cloud");
        let mut gated = field("subscriptionId");
        gated.required = true;
        gated.visible_on_code = Some("cloud:azure".into());

        let supplied = bag(json!({"cloud": "aws", "subscriptionId": "sub-1"}));
        let result = run(vec![cloud, gated], no_prompt(), supplied).await.unwrap();

        assert_eq!(Value::Object(result), json!({"cloud": "aws"}));
    }

    #[tokio::test]
    async fn test_depends_on_pattern_mismatch_skips_required_field() {
        let toggle = field("A");
        let mut dependent = field("B");
        dependent.required = true;
        dependent.depends_on_code = Some("A:yes".into());

        let supplied = bag(json!({"A": "no"}));
        let result = run(vec![toggle, dependent], no_prompt(), supplied).await.unwrap();

        assert_eq!(Value::Object(result), json!({"A": "no"}));
    }

    #[tokio::test]
    async fn test_select_matching_value_then_name() {
        let by_value = run(
            vec![select_field("flavor")],
            no_prompt(),
            bag(json!({"flavor": "a"})),
        )
        .await
        .unwrap();
        assert_eq!(by_value["flavor"], json!("a"));

        let by_name = run(
            vec![select_field("flavor")],
            no_prompt(),
            bag(json!({"flavor": "Alpha"})),
        )
        .await
        .unwrap();
        assert_eq!(by_name["flavor"], json!("a"));
    }

    #[tokio::test]
    async fn test_unmatched_select_token_behaves_as_unsupplied() {
        let mut required = select_field("flavor");
        required.required = true;
        let fatal = run(vec![required], no_prompt(), bag(json!({"flavor": "Gamma"}))).await;
        assert!(matches!(fatal, Err(ResolveError::MissingRequired { .. })));

        let optional = run(vec![select_field("flavor")], no_prompt(), bag(json!({"flavor": "Gamma"})))
            .await
            .unwrap();
        assert!(optional.is_empty());
    }

    #[tokio::test]
    async fn test_ambiguous_name_is_fatal_in_no_prompt_mode() {
        let mut ambiguous = select_field("flavor");
        ambiguous.options = Some(OptionsSpec::Static {
            options: vec![SelectOption::new("Beta", "b1"), SelectOption::new("Beta", "b2")],
        });

        let result = run(vec![ambiguous], no_prompt(), bag(json!({"flavor": "Beta"}))).await;
        match result {
            Err(ResolveError::AmbiguousValue { field, token, matches }) => {
                assert_eq!(field, "flavor");
                assert_eq!(token, "Beta");
                assert_eq!(matches, vec!["b1".to_string(), "b2".to_string()]);
            }
            other => panic!("expected AmbiguousValue, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_number_coercion_from_supplied_string() {
        let mut count = field("count");
        count.field_type = FieldType::Number;

        let result = run(vec![count], no_prompt(), bag(json!({"count": "3.5"}))).await.unwrap();
        assert_eq!(result["count"], json!(3.5));
    }

    #[tokio::test]
    async fn test_text_array_coercion_from_supplied_string() {
        let mut tags = field("tags");
        tags.field_type = FieldType::TextArray;

        let result = run(vec![tags], no_prompt(), bag(json!({"tags": "a, b ,c"}))).await.unwrap();
        assert_eq!(result["tags"], json!(["a", "b", "c"]));
    }

    #[tokio::test]
    async fn test_default_value_resolves_in_no_prompt_mode() {
        let mut region = field("region");
        region.required = true;
        region.default_value = Some("eu-west-1".into());

        let result = run(vec![region], no_prompt(), JsonMap::new()).await.unwrap();
        assert_eq!(result["region"], json!("eu-west-1"));
    }

    #[tokio::test]
    async fn test_select_default_uses_prefix_matching() {
        let mut flavor = select_field("flavor");
        flavor.required = true;
        flavor.default_value = Some("Alp".into());

        let result = run(vec![flavor], no_prompt(), JsonMap::new()).await.unwrap();
        assert_eq!(result["flavor"], json!("a"));
    }

    #[tokio::test]
    async fn test_sole_candidate_is_auto_picked() {
        let mut flavor = select_field("flavor");
        flavor.required = true;
        flavor.options = Some(OptionsSpec::Static {
            options: vec![SelectOption::new("Only", "only")],
        });

        let result = run(vec![flavor], no_prompt(), JsonMap::new()).await.unwrap();
        assert_eq!(result["flavor"], json!("only"));
    }

    #[tokio::test]
    async fn test_flagged_default_candidate_is_auto_picked() {
        let mut flavor = select_field("flavor");
        flavor.required = true;
        flavor.options = Some(OptionsSpec::Static {
            options: vec![
                SelectOption::new("Alpha", "a"),
                SelectOption {
                    name: "Beta".into(),
                    value: "b".into(),
                    is_default: true,
                    ..SelectOption::default()
                },
            ],
        });

        let result = run(vec![flavor], no_prompt(), JsonMap::new()).await.unwrap();
        assert_eq!(result["flavor"], json!("b"));
    }

    #[tokio::test]
    async fn test_require_on_overwrites_required_flag() {
        let cloud = field("cloud");
        let mut key = field("sshKey");
        key.required = false;
        key.require_on_code = Some("cloud:aws".into());

        let fatal = run(
            vec![cloud.clone(), key.clone()],
            no_prompt(),
            bag(json!({"cloud": "aws"})),
        )
        .await;
        assert!(matches!(fatal, Err(ResolveError::MissingRequired { .. })));

        // And the inverse: a required field demoted by the expression.
        let mut demoted = field("sshKey");
        demoted.required = true;
        demoted.require_on_code = Some("cloud:azure".into());
        let result = run(vec![cloud, demoted], no_prompt(), bag(json!({"cloud": "aws"})))
            .await
            .unwrap();
        assert_eq!(Value::Object(result), json!({"cloud": "aws"}));
    }

    #[tokio::test]
    async fn test_no_options_filter_suppresses_fatality() {
        let mut required = field("clusterName");
        required.required = true;
        let settings = ResolveSettings {
            no_options: true,
            ..ResolveSettings::default()
        };

        let result = run(vec![required], settings, JsonMap::new()).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_skip_filter_still_honors_supplied_and_default() {
        let mut skipped = field("comment");
        skipped.default_value = Some("managed".into());
        let mut supplied_field = field("owner");
        supplied_field.required = true;
        let settings = ResolveSettings {
            no_prompt: true,
            skip_fields: vec!["comment".into()],
            ..ResolveSettings::default()
        };

        let result = run(
            vec![skipped, supplied_field],
            settings,
            bag(json!({"owner": "ops"})),
        )
        .await
        .unwrap();
        assert_eq!(Value::Object(result), json!({"comment": "managed", "owner": "ops"}));
    }

    #[tokio::test]
    async fn test_only_filter_restricts_other_fields() {
        let kept = field("region");
        let mut excluded = field("zone");
        excluded.required = true;
        let settings = ResolveSettings {
            no_prompt: true,
            only_fields: vec!["region".into()],
            ..ResolveSettings::default()
        };

        let result = run(vec![kept, excluded], settings, bag(json!({"region": "eu-west-1"})))
            .await
            .unwrap();
        assert_eq!(Value::Object(result), json!({"region": "eu-west-1"}));
    }

    #[tokio::test]
    async fn test_nested_context_prunes_cleanly_when_skipped() {
        let mut nested = field("vpcId");
        nested.field_context = Some("network.aws".into());

        let result = run(vec![nested], no_prompt(), JsonMap::new()).await.unwrap();
        assert!(result.is_empty(), "skipped field left {result:?}");
    }

    #[tokio::test]
    async fn test_nested_context_writes_and_result_is_clean() {
        let mut nested = field("vpcId");
        nested.field_context = Some("network.aws".into());
        let plain = field("region");

        let result = run(
            vec![nested, plain],
            no_prompt(),
            bag(json!({"network": {"aws": {"vpcId": "vpc-1"}}, "region": "eu-west-1"})),
        )
        .await
        .unwrap();

        assert_eq!(
            Value::Object(result.clone()),
            json!({"network": {"aws": {"vpcId": "vpc-1"}}, "region": "eu-west-1"})
        );
        assert_clean(&Value::Object(result));
    }

    #[tokio::test]
    async fn test_dependency_on_nested_resolved_value() {
        let mut vpc = field("vpcId");
        vpc.field_context = Some("network".into());
        let mut subnet = field("subnetId");
        subnet.field_context = Some("network".into());
        subnet.required = true;
        subnet.depends_on_code = Some("network.vpcId".into());

        // Dependency satisfied: subnet becomes required and fatal without a value.
        let fatal = run(
            vec![vpc.clone(), subnet.clone()],
            no_prompt(),
            bag(json!({"network": {"vpcId": "vpc-1"}})),
        )
        .await;
        assert!(matches!(fatal, Err(ResolveError::MissingRequired { .. })));

        // Dependency unsatisfied: subnet is skipped.
        let result = run(vec![vpc, subnet], no_prompt(), JsonMap::new()).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_multi_select_supplied_csv_resolves_each_token() {
        let mut groups = select_field("groups");
        groups.field_type = FieldType::MultiSelect;

        let result = run(vec![groups], no_prompt(), bag(json!({"groups": "a, Beta"})))
            .await
            .unwrap();
        assert_eq!(result["groups"], json!(["a", "b"]));
    }

    #[tokio::test]
    async fn test_transform_applies_before_coercion() {
        let mut account = field("accountId");
        account.transform = Some(ValueTransform::Template {
            pattern: "arn:aws:iam::{value}:root".into(),
        });

        let result = run(vec![account], no_prompt(), bag(json!({"accountId": "42"})))
            .await
            .unwrap();
        assert_eq!(result["accountId"], json!("arn:aws:iam::42:root"));
    }

    #[tokio::test]
    async fn test_supplied_structured_value_passes_through() {
        let mut attrs = field("attributes");
        attrs.field_type = FieldType::KeyValue;

        let result = run(
            vec![attrs],
            no_prompt(),
            bag(json!({"attributes": {"team": "data"}})),
        )
        .await
        .unwrap();
        assert_eq!(result["attributes"], json!({"team": "data"}));
    }
}
