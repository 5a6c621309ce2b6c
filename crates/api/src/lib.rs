//! Stratus API client utilities.
//!
//! This module provides a lightweight client for the read-side endpoints the
//! configuration engine depends on. It focuses on:
//!
//! - Constructing an HTTP client with sensible defaults
//! - Discovering credentials from `STRATUS_API_KEY` or `~/.netrc`
//! - Validating `STRATUS_API_BASE` for safety
//! - Building requests with a consistent User-Agent and Accept headers
//! - The generic "list candidate values for a named source" read operation
//!   and the credential-types lookup
//!
//! The primary entry point is [`StratusClient`]. Create an instance via
//! [`StratusClient::from_env`], and then build requests with
//! [`StratusClient::request`].
//!
//! # Example
//!
//! ```ignore
//! use stratus_api::StratusClient;
//! use anyhow::Result;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = StratusClient::from_env()?;
//!     let regions = client.option_values("regions", None, &Default::default()).await?;
//!     println!("{} candidate regions", regions.len());
//!     Ok(())
//! }
//! ```

use std::time::Duration;
use std::{env, fs};

use anyhow::{Context, Result, anyhow};
use reqwest::{Client, RequestBuilder, Url, header};
use serde_json::{Map as JsonMap, Value};
use stratus_types::{CredentialTypeSpec, SelectOption};
use tracing::debug;

/// Allowed hostnames or base domains for non-local configurations of
/// `STRATUS_API_BASE`. Subdomains of these domains are also allowed.
const ALLOWED_STRATUS_DOMAINS: &[&str] = &["stratus.io", "stratusdev.io", "stratus-mgmt-staging.stratusapp.io"];
/// Hostnames allowed for local development regardless of scheme.
const LOCALHOST_DOMAINS: &[&str] = &["localhost", "127.0.0.1"];
/// Public management API used when `STRATUS_API_BASE` is unset.
const DEFAULT_BASE_URL: &str = "https://api.stratus.io";
/// Versioned media type accepted from every endpoint.
const ACCEPT_HEADER: &str = "application/vnd.stratus+json; version=1";

#[derive(Debug, Clone)]
/// Thin wrapper around a configured `reqwest::Client` for Stratus API access.
///
/// The client pre-configures default headers and builds requests against a
/// validated base URL. Authentication is read from the environment or the
/// user's `~/.netrc` file.
pub struct StratusClient {
    pub base_url: String,
    pub http: Client,
    pub user_agent: String,
}

impl StratusClient {
    /// Construct a [`StratusClient`] from environment variables and `~/.netrc`.
    ///
    /// Resolution order for authentication:
    /// - `STRATUS_API_KEY` environment variable
    /// - `~/.netrc` entry for `api.stratus.io` (login `api`, password = token)
    ///
    /// The base URL is taken from `STRATUS_API_BASE` (if set) or falls back to
    /// the default public API. Non-localhost hosts must use HTTPS and be within
    /// an allowed Stratus domain.
    pub fn from_env() -> Result<Self> {
        let api_token = env::var("STRATUS_API_KEY").ok().or_else(get_netrc_token);

        let mut default_headers = header::HeaderMap::new();
        if let Some(api_token) = api_token {
            let authorization = format!("Bearer {api_token}");
            default_headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&authorization).context("invalid API token")?,
            );
        }
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static(ACCEPT_HEADER));

        let http = Client::builder()
            .default_headers(default_headers)
            .timeout(Duration::from_secs(30))
            .build()
            .context("build http client")?;

        let base_url = env::var("STRATUS_API_BASE").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        validate_base_url(&base_url)?;

        Ok(Self {
            base_url,
            http,
            user_agent: format!("stratus-cli/0.1; {}", env::consts::OS),
        })
    }

    /// Build a `reqwest::RequestBuilder` for a method and API-relative path.
    ///
    /// The resulting request includes the configured User-Agent and base
    /// headers, and is resolved relative to `self.base_url`.
    pub fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "building request");

        self.http
            .request(method, url)
            .header(header::USER_AGENT, &self.user_agent)
    }

    /// List candidate values for a named option source.
    ///
    /// Issues one read of `/v1/options/{source}`; the optional source-type
    /// discriminator and every entry of `params` travel as query pairs. The
    /// response envelope's `data` array is decoded into [`SelectOption`] rows
    /// (`name`/`value`, optionally `isDefault`/`isGroup`, plus any auxiliary
    /// attributes the source attaches).
    pub async fn option_values(
        &self,
        source: &str,
        source_type: Option<&str>,
        params: &JsonMap<String, Value>,
    ) -> Result<Vec<SelectOption>> {
        let mut query: Vec<(String, String)> = Vec::with_capacity(params.len() + 1);
        if let Some(source_type) = source_type {
            query.push(("sourceType".into(), source_type.to_string()));
        }
        for (key, value) in params {
            query.push((key.clone(), query_value(value)));
        }

        let response = self
            .request(reqwest::Method::GET, &format!("/v1/options/{source}"))
            .query(&query)
            .send()
            .await
            .with_context(|| format!("option source '{source}' request failed"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("option source '{}' returned {}: {}", source, status, body.trim()));
        }

        let payload: Value = response
            .json()
            .await
            .with_context(|| format!("option source '{source}' returned a non-JSON body"))?;
        let rows = payload.get("data").cloned().unwrap_or_else(|| Value::Array(Vec::new()));
        serde_json::from_value(rows).with_context(|| format!("option source '{source}' returned malformed rows"))
    }

    /// Fetch the platform's credential types together with their nested field
    /// schemas.
    pub async fn credential_types(&self) -> Result<Vec<CredentialTypeSpec>> {
        let response = self
            .request(reqwest::Method::GET, "/v1/credentials/types")
            .send()
            .await
            .context("credential types request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("credential types endpoint returned {}: {}", status, body.trim()));
        }

        let payload: Value = response
            .json()
            .await
            .context("credential types endpoint returned a non-JSON body")?;
        let rows = payload.get("data").cloned().unwrap_or_else(|| Value::Array(Vec::new()));
        serde_json::from_value(rows).context("credential types endpoint returned malformed rows")
    }
}

/// Render a JSON parameter value as a query-string value.
///
/// Strings travel verbatim; everything else uses its compact JSON form.
fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Validate that a base URL is acceptable for use by the client.
///
/// Rules:
/// - `localhost` or `127.0.0.1`: any scheme is allowed
/// - otherwise: scheme must be HTTPS, and host must be one of the allowed
///   Stratus domains or a subdomain thereof
fn validate_base_url(base: &str) -> Result<()> {
    let parsed = Url::parse(base).map_err(|e| anyhow!("Invalid STRATUS_API_BASE URL '{}': {}", base, e))?;

    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow!("STRATUS_API_BASE must include a host"))?;

    // Local development allowances: localhost/127.0.0.1 with any scheme.
    if LOCALHOST_DOMAINS.iter().any(|&allowed| host.eq_ignore_ascii_case(allowed)) {
        return Ok(());
    }

    // Production/staging: must be HTTPS and end with one of the allowed domains.
    if parsed.scheme() != "https" {
        return Err(anyhow!(
            "STRATUS_API_BASE must use https for non-localhost hosts; got '{}://'",
            parsed.scheme()
        ));
    }

    let is_allowed = ALLOWED_STRATUS_DOMAINS
        .iter()
        .any(|&domain| host.eq_ignore_ascii_case(domain) || host.ends_with(&format!(".{domain}")));
    if !is_allowed {
        return Err(anyhow!(
            "STRATUS_API_BASE host '{}' is not allowed; must be one of {:?} or a subdomain, or localhost",
            host,
            ALLOWED_STRATUS_DOMAINS
        ));
    }

    Ok(())
}

/// Attempt to read an API token from the user's `~/.netrc` file.
fn get_netrc_token() -> Option<String> {
    let home = dirs_next::home_dir()?;
    let content = fs::read_to_string(home.join(".netrc")).ok()?;
    parse_netrc_for_stratus(&content)
}

/// Minimal `.netrc` parser adequate for bootstrapping and local usage.
///
/// The expected form is roughly:
///
/// ```text
/// machine api.stratus.io
///   login api
///   password <TOKEN>
/// ```
///
/// The parser is intentionally forgiving: it scans whitespace-separated
/// tokens and treats the first plausible value after `password` inside the
/// `api.stratus.io` stanza as the token.
fn parse_netrc_for_stratus(content: &str) -> Option<String> {
    let mut in_stratus_stanza = false;
    let mut awaiting_password = false;

    for token in content.split_whitespace() {
        match token {
            // A new machine stanza resets all state
            "machine" => {
                in_stratus_stanza = false;
                awaiting_password = false;
            }
            "api.stratus.io" => in_stratus_stanza = true,
            "password" if in_stratus_stanza => awaiting_password = true,
            candidate if awaiting_password => {
                if candidate.len() > 20 {
                    return Some(candidate.to_string());
                }
                // value does not look like a token; keep scanning the stanza
                awaiting_password = false;
            }
            _ => {}
        }
    }
    None
}
