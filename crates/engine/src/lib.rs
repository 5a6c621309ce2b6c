//! # Stratus configuration-resolution engine
//!
//! The interactive heart of the Stratus CLI. Calling commands declare a
//! schema of [`stratus_types::FieldSpec`]s and a partially-filled options bag
//! (parsed flags, `-O` overrides, payload files); the engine produces a fully
//! resolved nested configuration document, prompting the operator for missing
//! pieces or failing deterministically when run unattended.
//!
//! ## Pipeline
//!
//! 1. [`schema::Schema::compile`] parses dependency expressions, applies the
//!    group/display-order sort, and validates reference ordering.
//! 2. [`resolve::Resolver::resolve`] walks the fields: filters, dependency
//!    gating, supplied fast path, no-prompt defaults, or a type-specific
//!    prompter.
//! 3. [`coerce`] normalizes raw answers; [`paths`] assembles the nested
//!    result, pruning null and empty-map entries.
//!
//! Candidate values for choice fields come from a [`source::OptionSource`]:
//! the remote platform endpoint, a static inline list, or values derived from
//! already-resolved sibling fields.
//!
//! ## Example
//!
//! ```no_run
//! use stratus_engine::{Resolver, ResolveSettings, Schema, StaticOptionSource};
//! use stratus_types::FieldSpec;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let schema = Schema::compile(vec![FieldSpec {
//!     field_name: "clusterName".into(),
//!     required: true,
//!     ..FieldSpec::default()
//! }])?;
//! let source = StaticOptionSource::default();
//! let mut resolver = Resolver::new(&source, ResolveSettings::default());
//! let document = resolver.resolve(&schema, Default::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod coerce;
pub mod depends;
pub mod error;
pub mod matching;
pub mod paths;
pub mod prompt;
pub mod resolve;
pub mod schema;
pub mod source;

pub use error::{ResolveError, ResolveResult};
pub use resolve::{ResolveSettings, Resolver};
pub use schema::{CompiledField, Schema};
pub use source::{OptionSource, RemoteOptionSource, StaticOptionSource};
