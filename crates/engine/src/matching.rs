//! Candidate matching for choice fields.
//!
//! A raw token is matched against [`SelectOption`] candidates with a fixed
//! precedence: exact value match, then exact display-name match (ambiguous
//! when several candidates share the name), and — only when resolving a
//! default — a name/value prefix fallback. Group header rows never match.

use stratus_types::SelectOption;

/// Outcome of matching one raw token against a candidate list.
#[derive(Debug)]
pub enum TokenMatch<'a> {
    /// Exact value match
    Value(&'a SelectOption),
    /// Unique display-name match
    Name(&'a SelectOption),
    /// Several candidates share the display name
    Ambiguous(Vec<&'a SelectOption>),
    /// Nothing matched
    None,
}

impl<'a> TokenMatch<'a> {
    /// The matched candidate, when the match is unique.
    pub fn unique(&self) -> Option<&'a SelectOption> {
        match self {
            Self::Value(option) | Self::Name(option) => Some(option),
            _ => None,
        }
    }
}

/// Candidates that can actually be chosen (group headers excluded).
pub fn selectable(options: &[SelectOption]) -> impl Iterator<Item = &SelectOption> {
    options.iter().filter(|option| !option.is_group)
}

/// Match a raw token with the standard precedence.
pub fn match_token<'a>(options: &'a [SelectOption], token: &str) -> TokenMatch<'a> {
    if let Some(option) = selectable(options).find(|option| option.value == token) {
        return TokenMatch::Value(option);
    }
    let by_name: Vec<&SelectOption> = selectable(options).filter(|option| option.name == token).collect();
    match by_name.len() {
        0 => TokenMatch::None,
        1 => TokenMatch::Name(by_name[0]),
        _ => TokenMatch::Ambiguous(by_name),
    }
}

/// Match a default token, falling back to a name/value prefix match.
/// Ambiguity disqualifies the default rather than guessing.
pub fn match_default<'a>(options: &'a [SelectOption], token: &str) -> Option<&'a SelectOption> {
    match match_token(options, token) {
        TokenMatch::Value(option) | TokenMatch::Name(option) => Some(option),
        TokenMatch::Ambiguous(_) => None,
        TokenMatch::None => {
            selectable(options).find(|option| option.name.starts_with(token) || option.value.starts_with(token))
        }
    }
}

/// Candidate the engine may pick without prompting: the default token when it
/// matches, else a sole candidate, else a sole `isDefault` candidate.
pub fn auto_pick<'a>(options: &'a [SelectOption], default_token: Option<&str>) -> Option<&'a SelectOption> {
    if let Some(token) = default_token.filter(|token| !token.is_empty())
        && let Some(option) = match_default(options, token)
    {
        return Some(option);
    }
    let mut choosable = selectable(options);
    if let (Some(only), None) = (choosable.next(), choosable.next()) {
        return Some(only);
    }
    let defaults: Vec<&SelectOption> = selectable(options).filter(|option| option.is_default).collect();
    match defaults.as_slice() {
        [only] => Some(only),
        _ => None,
    }
}
