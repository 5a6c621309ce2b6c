//! Line-oriented prompters: text, number, password, checkbox, multiline, and
//! the repeated free-text prompt.

use colored::Colorize;
use dialoguer::{Confirm, Input, Password};
use regex::Regex;
use stratus_types::FieldSpec;
use tracing::warn;

use crate::coerce::coerce_checkbox;
use crate::error::ResolveResult;

use super::{Answer, confirm_add_another, print_help, prompt_line, read_answer};

/// Token ending a multiline read.
const MULTILINE_TERMINATOR: &str = "EOF";

/// Free-text prompt with optional whole-string verification.
pub fn prompt_text(spec: &FieldSpec) -> ResolveResult<Option<String>> {
    let line = prompt_line(spec);
    loop {
        match read_answer(&line)? {
            Answer::Help => print_help(spec),
            Answer::Empty => {
                if let Some(default) = spec.default_value.clone() {
                    return Ok(Some(default));
                }
                if spec.required {
                    eprintln!("{} is required", spec.label());
                    continue;
                }
                return Ok(None);
            }
            Answer::Text(text) => {
                if verifies(spec, &text) {
                    return Ok(Some(text));
                }
            }
        }
    }
}

/// Check an answer against the field's verification pattern.
///
/// A mismatch re-prompts, never fatally; a pattern that does not compile
/// prints a warning and skips the check for this attempt.
fn verifies(spec: &FieldSpec, text: &str) -> bool {
    let Some(pattern) = spec.verification_pattern.as_deref().filter(|p| !p.is_empty()) else {
        return true;
    };
    let anchored = format!("^(?:{pattern})$");
    match Regex::new(&anchored) {
        Ok(regex) => {
            if regex.is_match(text) {
                true
            } else {
                eprintln!("{} must match {}", spec.label(), pattern.yellow());
                false
            }
        }
        Err(error) => {
            warn!(%pattern, %error, "malformed verification pattern; skipping check");
            eprintln!("warning: verification pattern for {} is malformed; accepting input", spec.label());
            true
        }
    }
}

/// Numeric prompt: re-prompts until the answer parses as an integer or float.
pub fn prompt_number(spec: &FieldSpec) -> ResolveResult<Option<String>> {
    let line = prompt_line(spec);
    loop {
        match read_answer(&line)? {
            Answer::Help => print_help(spec),
            Answer::Empty => {
                if let Some(default) = spec.default_value.clone() {
                    return Ok(Some(default));
                }
                if spec.required {
                    eprintln!("{} is required", spec.label());
                    continue;
                }
                return Ok(None);
            }
            Answer::Text(text) => {
                if text.parse::<f64>().is_ok() {
                    return Ok(Some(text));
                }
                eprintln!("{} must be a number", spec.label());
            }
        }
    }
}

/// No-echo secret prompt. `?` is a legal password character, so there is no
/// help escape here.
pub fn prompt_password(spec: &FieldSpec) -> ResolveResult<Option<String>> {
    loop {
        let answer = Password::new()
            .with_prompt(spec.label())
            .allow_empty_password(true)
            .interact()?;
        if answer.is_empty() {
            if let Some(default) = spec.default_value.clone() {
                return Ok(Some(default));
            }
            if spec.required {
                eprintln!("{} is required", spec.label());
                continue;
            }
            return Ok(None);
        }
        return Ok(Some(answer));
    }
}

/// Yes/no prompt whose default follows the field's default token.
pub fn prompt_checkbox(spec: &FieldSpec) -> ResolveResult<Option<String>> {
    let default = spec
        .default_value
        .as_deref()
        .map(|token| coerce_checkbox(token) == serde_json::Value::Bool(true))
        .unwrap_or(false);
    let answer = Confirm::new().with_prompt(spec.label()).default(default).interact()?;
    Ok(Some(if answer { "true".into() } else { "false".into() }))
}

/// Multiline prompt: lines are read until a literal `EOF`; an immediately
/// empty first line means skip.
pub fn prompt_multiline(spec: &FieldSpec) -> ResolveResult<Option<String>> {
    println!("{} {}", spec.label(), format!("(end with '{MULTILINE_TERMINATOR}', empty first line skips)").dimmed());
    let mut lines: Vec<String> = Vec::new();
    loop {
        let line: String = Input::new().with_prompt(">").allow_empty(true).interact_text()?;
        if lines.is_empty() && line.trim().is_empty() {
            return Ok(spec.default_value.clone());
        }
        if line.trim() == MULTILINE_TERMINATOR {
            return Ok(Some(lines.join("\n")));
        }
        lines.push(line);
    }
}

/// Repeated free-text prompt for multiText fields.
///
/// The first entry honors required/default handling; once one value is
/// collected, an empty answer ends the loop instead of re-prompting.
pub fn prompt_multi_text(spec: &FieldSpec) -> ResolveResult<Option<Vec<String>>> {
    let mut follow_up = spec.clone();
    follow_up.required = false;
    follow_up.default_value = None;

    let mut collected: Vec<String> = Vec::new();
    loop {
        let current = if collected.is_empty() { spec } else { &follow_up };
        match prompt_text(current)? {
            None => break,
            Some(value) => collected.push(value),
        }
        if !confirm_add_another(spec, collected.len() as u64)? {
            break;
        }
    }
    Ok(if collected.is_empty() { None } else { Some(collected) })
}
