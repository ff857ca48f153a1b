//! Prompt Hub: validation, `{{variable}}` compilation and version bumping.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum prompt text length in characters.
pub const MAX_PROMPT_LENGTH: usize = 100_000;

/// Maximum length for a prompt name.
pub const MAX_PROMPT_NAME_LENGTH: usize = 200;

/// Maximum number of tags on a prompt version.
pub const MAX_TAGS_COUNT: usize = 20;

/// Version assigned to the first version of every prompt.
pub const INITIAL_VERSION: &str = "1.0.0";

/// Matches `{{ name }}` placeholders. Names start with a letter or `_` and
/// may contain letters, digits, `_`, `.` and `-`.
static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_.\-]*)\s*\}\}").expect("valid regex")
});

/// Allowed prompt name characters.
static PROMPT_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.\- ]*$").expect("valid regex"));

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a prompt name: non-empty, bounded, simple characters.
pub fn validate_prompt_name(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation(
            "Prompt name must not be empty".to_string(),
        ));
    }
    if name.chars().count() > MAX_PROMPT_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Prompt name exceeds maximum length of {MAX_PROMPT_NAME_LENGTH} characters"
        )));
    }
    if !PROMPT_NAME_RE.is_match(name) {
        return Err(CoreError::Validation(format!(
            "Prompt name '{name}' may only contain letters, digits, spaces, '_', '.' and '-'"
        )));
    }
    Ok(())
}

/// Validate prompt text: non-empty and within the length limit.
pub fn validate_prompt_text(text: &str) -> Result<(), CoreError> {
    if text.trim().is_empty() {
        return Err(CoreError::Validation(
            "Prompt text must not be empty".to_string(),
        ));
    }
    let len = text.chars().count();
    if len > MAX_PROMPT_LENGTH {
        return Err(CoreError::Validation(format!(
            "Prompt exceeds maximum length of {MAX_PROMPT_LENGTH} characters (got {len})"
        )));
    }
    Ok(())
}

/// Validate tags count: must not exceed the maximum.
pub fn validate_tags(tags: &[String]) -> Result<(), CoreError> {
    if tags.len() > MAX_TAGS_COUNT {
        return Err(CoreError::Validation(format!(
            "Tag count exceeds maximum of {MAX_TAGS_COUNT} (got {})",
            tags.len()
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle of a prompt version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VersionStatus {
    #[default]
    Draft,
    Published,
}

impl VersionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
        }
    }
}

impl FromStr for VersionStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            _ => Err(CoreError::Validation(format!(
                "Unknown version status '{s}' (expected draft or published)"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Compilation
// ---------------------------------------------------------------------------

/// A prompt with its variables substituted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledPrompt {
    pub text: String,
    /// Placeholders present in the template with no supplied value, sorted.
    pub missing_variables: Vec<String>,
}

/// All distinct placeholder names in `template`, sorted.
pub fn extract_variables(template: &str) -> Vec<String> {
    let mut names: Vec<String> = PLACEHOLDER_RE
        .captures_iter(template)
        .map(|c| c[1].to_string())
        .collect();
    names.sort();
    names.dedup();
    names
}

/// Substitute `{{ name }}` placeholders from `variables`. Unknown
/// placeholders are left as written and reported in `missing_variables`.
pub fn compile(template: &str, variables: &HashMap<String, String>) -> CompiledPrompt {
    let mut missing = Vec::new();
    let text = PLACEHOLDER_RE
        .replace_all(template, |caps: &Captures| match variables.get(&caps[1]) {
            Some(value) => value.clone(),
            None => {
                missing.push(caps[1].to_string());
                caps[0].to_string()
            }
        })
        .into_owned();
    missing.sort();
    missing.dedup();
    CompiledPrompt {
        text,
        missing_variables: missing,
    }
}

// ---------------------------------------------------------------------------
// Versioning
// ---------------------------------------------------------------------------

/// A `MAJOR.MINOR.PATCH` prompt version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PromptVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

/// Which part of the version a new version increments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VersionBump {
    Major,
    Minor,
    #[default]
    Patch,
}

impl PromptVersion {
    pub fn bump(self, bump: VersionBump) -> Self {
        match bump {
            VersionBump::Major => Self {
                major: self.major + 1,
                minor: 0,
                patch: 0,
            },
            VersionBump::Minor => Self {
                minor: self.minor + 1,
                patch: 0,
                ..self
            },
            VersionBump::Patch => Self {
                patch: self.patch + 1,
                ..self
            },
        }
    }
}

impl FromStr for VersionBump {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "major" => Ok(Self::Major),
            "minor" => Ok(Self::Minor),
            "patch" => Ok(Self::Patch),
            _ => Err(CoreError::Validation(format!(
                "Unknown version bump '{s}' (expected major, minor or patch)"
            ))),
        }
    }
}

impl FromStr for PromptVersion {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::Validation(format!("Invalid version '{s}' (expected MAJOR.MINOR.PATCH)"));
        let mut parts = s.trim().split('.');
        let mut next = || -> Result<u32, CoreError> {
            parts
                .next()
                .ok_or_else(invalid)?
                .parse::<u32>()
                .map_err(|_| invalid())
        };
        let version = Self {
            major: next()?,
            minor: next()?,
            patch: next()?,
        };
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(version)
    }
}

impl fmt::Display for PromptVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Version string that follows `latest` under `bump`.
pub fn next_version(latest: &str, bump: VersionBump) -> Result<String, CoreError> {
    let current: PromptVersion = latest.parse()?;
    Ok(current.bump(bump).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn compile_substitutes_with_inner_whitespace() {
        let out = compile("Hello {{ name }}, you are {{role}}.", &vars(&[("name", "Ada"), ("role", "admin")]));
        assert_eq!(out.text, "Hello Ada, you are admin.");
        assert!(out.missing_variables.is_empty());
    }

    #[test]
    fn compile_keeps_and_reports_unknown_placeholders() {
        let out = compile("{{a}} and {{ b }} and {{b}}", &vars(&[("a", "1")]));
        assert_eq!(out.text, "1 and {{ b }} and {{b}}");
        assert_eq!(out.missing_variables, vec!["b"]);
    }

    #[test]
    fn single_braces_are_not_placeholders() {
        assert!(extract_variables("json: {\"a\": 1} {x}").is_empty());
    }

    #[test]
    fn extract_is_sorted_and_deduplicated() {
        assert_eq!(
            extract_variables("{{z}} {{a.b}} {{z}} {{user-id}}"),
            vec!["a.b", "user-id", "z"]
        );
    }

    #[test]
    fn bump_minor_resets_patch() {
        assert_eq!(next_version("1.4.2", VersionBump::Minor).unwrap(), "1.5.0");
    }

    #[test]
    fn bump_major_resets_minor_and_patch() {
        assert_eq!(next_version("1.4.2", VersionBump::Major).unwrap(), "2.0.0");
    }

    #[test]
    fn bump_patch_default() {
        assert_eq!(next_version(INITIAL_VERSION, VersionBump::default()).unwrap(), "1.0.1");
    }

    #[test]
    fn invalid_versions_rejected() {
        for bad in ["1.0", "1.0.0.0", "a.b.c", "", "1..0"] {
            assert!(bad.parse::<PromptVersion>().is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn versions_order_numerically() {
        let a: PromptVersion = "1.10.0".parse().unwrap();
        let b: PromptVersion = "1.9.3".parse().unwrap();
        assert!(a > b);
    }

    #[test]
    fn prompt_name_rules() {
        assert!(validate_prompt_name("support-triage v2").is_ok());
        assert!(validate_prompt_name("").is_err());
        assert!(validate_prompt_name("-leading").is_err());
        assert!(validate_prompt_name("semi;colon").is_err());
    }

    #[test]
    fn prompt_text_rules() {
        assert!(validate_prompt_text("  ").is_err());
        assert!(validate_prompt_text(&"x".repeat(MAX_PROMPT_LENGTH + 1)).is_err());
        assert!(validate_prompt_text("Summarise {{doc}}").is_ok());
    }

    #[test]
    fn status_parse() {
        assert_eq!("published".parse::<VersionStatus>().unwrap(), VersionStatus::Published);
        assert!("archived".parse::<VersionStatus>().is_err());
    }
}
