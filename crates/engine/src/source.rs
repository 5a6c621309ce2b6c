//! Candidate loading for choice fields.
//!
//! Each choice field declares one of three candidate strategies
//! ([`stratus_types::OptionsSpec`]): a static inline list, a named remote
//! source resolved through the [`OptionSource`] trait, or a list derived from
//! already-resolved sibling fields. Transport failures are not caught here;
//! they propagate to the calling command, which may substitute a degraded
//! static fallback list.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map as JsonMap, Value};
use stratus_api::StratusClient;
use stratus_types::{CredentialTypeSpec, FieldSpec, OptionsSpec, SelectOption};
use tracing::debug;

use crate::error::{ResolveError, ResolveResult};
use crate::paths::get_path;

/// Reserved source name bound to custom user-defined option lists; requests
/// against it carry the owning field's identifier.
pub const USER_DEFINED_SOURCE: &str = "userDefined";

/// Provider of candidate values and credential-type schemas.
///
/// The engine only ever issues sequential, blocking-in-effect reads through
/// this trait; implementations need no internal synchronization.
#[async_trait]
pub trait OptionSource: Send + Sync {
    /// List candidate values for a named source.
    async fn options(
        &self,
        source: &str,
        source_type: Option<&str>,
        params: &JsonMap<String, Value>,
    ) -> Result<Vec<SelectOption>>;

    /// Fetch the platform's credential types with their nested field schemas.
    async fn credential_types(&self) -> Result<Vec<CredentialTypeSpec>>;
}

/// Remote loader over the Stratus management API.
pub struct RemoteOptionSource {
    client: StratusClient,
}

impl RemoteOptionSource {
    pub fn new(client: StratusClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl OptionSource for RemoteOptionSource {
    async fn options(
        &self,
        source: &str,
        source_type: Option<&str>,
        params: &JsonMap<String, Value>,
    ) -> Result<Vec<SelectOption>> {
        self.client.option_values(source, source_type, params).await
    }

    async fn credential_types(&self) -> Result<Vec<CredentialTypeSpec>> {
        self.client.credential_types().await
    }
}

/// In-memory source for offline runs and tests.
#[derive(Debug, Default)]
pub struct StaticOptionSource {
    pub options: HashMap<String, Vec<SelectOption>>,
    pub credential_types: Vec<CredentialTypeSpec>,
}

#[async_trait]
impl OptionSource for StaticOptionSource {
    async fn options(
        &self,
        source: &str,
        _source_type: Option<&str>,
        _params: &JsonMap<String, Value>,
    ) -> Result<Vec<SelectOption>> {
        Ok(self.options.get(source).cloned().unwrap_or_default())
    }

    async fn credential_types(&self) -> Result<Vec<CredentialTypeSpec>> {
        Ok(self.credential_types.clone())
    }
}

/// Load the candidate list for a field according to its strategy.
///
/// `filter` carries the operator's current input for typeahead fields: remote
/// sources receive it as a `filter` parameter, static and derived lists are
/// narrowed to name/value prefix matches locally.
pub async fn load_candidates(
    field: &FieldSpec,
    resolved: &JsonMap<String, Value>,
    source: &dyn OptionSource,
    filter: Option<&str>,
) -> ResolveResult<Vec<SelectOption>> {
    let candidates = match &field.options {
        None => Vec::new(),
        Some(OptionsSpec::Static { options }) => narrow(options.clone(), filter),
        Some(OptionsSpec::Remote {
            source: name,
            source_type,
            params,
        }) => {
            let mut params = params.clone();
            if name == USER_DEFINED_SOURCE {
                params.insert("field".into(), Value::String(field.dependency_code()));
            }
            if let Some(filter) = filter.filter(|input| !input.is_empty()) {
                params.insert("filter".into(), Value::String(filter.to_string()));
            }
            debug!(source = %name, field = %field.field_name, "loading remote candidates");
            source
                .options(name, source_type.as_deref(), &params)
                .await
                .map_err(ResolveError::Source)?
        }
        Some(OptionsSpec::Derived { from_fields }) => narrow(derive_candidates(from_fields, resolved), filter),
    };
    Ok(candidates)
}

/// Build candidates from already-resolved sibling values: strings become one
/// candidate each, arrays contribute every string element.
fn derive_candidates(from_fields: &[String], resolved: &JsonMap<String, Value>) -> Vec<SelectOption> {
    let mut candidates = Vec::new();
    for path in from_fields {
        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        match get_path(resolved, &segments) {
            Some(Value::String(value)) => candidates.push(SelectOption::new(value.clone(), value.clone())),
            Some(Value::Array(values)) => {
                for value in values {
                    if let Value::String(value) = value {
                        candidates.push(SelectOption::new(value.clone(), value.clone()));
                    }
                }
            }
            _ => {}
        }
    }
    candidates
}

/// Narrow a local candidate list to name/value prefix matches.
fn narrow(options: Vec<SelectOption>, filter: Option<&str>) -> Vec<SelectOption> {
    match filter.filter(|input| !input.is_empty()) {
        None => options,
        Some(input) => options
            .into_iter()
            .filter(|option| option.is_group || option.name.starts_with(input) || option.value.starts_with(input))
            .collect(),
    }
}
