//! Configuration validation engine.
//!
//! Validates TOML configuration files against the known schema, detects
//! unknown/misspelled fields, and reports settings that would make a run
//! fail or misbehave.

use std::{collections::HashMap, path::Path};

use secrecy::ExposeSecret;

use crate::schema::MusterConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "syntax", "unknown-field", "type-error", "credentials",
    /// "run", "file-ref"
    pub category: &'static str,
    /// Dotted path, e.g. "core.api_hash"
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    fn new(
        severity: Severity,
        category: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result of validating a configuration file.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<std::path::PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

// ── Schema tree for unknown-field detection ─────────────────────────────────

enum KnownKeys {
    Struct(HashMap<&'static str, KnownKeys>),
    Leaf,
}

/// Build the schema map mirroring every field in `schema.rs`.
fn build_schema_map() -> KnownKeys {
    use KnownKeys::{Leaf, Struct};

    Struct(HashMap::from([
        (
            "core",
            Struct(HashMap::from([("api_id", Leaf), ("api_hash", Leaf)])),
        ),
        (
            "data",
            Struct(HashMap::from([
                ("sessions", Leaf),
                ("channels", Leaf),
                ("delimiter", Leaf),
            ])),
        ),
        (
            "notify",
            Struct(HashMap::from([
                ("chat_id", Leaf),
                ("bot_token", Leaf),
                ("session", Leaf),
                ("api_url", Leaf),
            ])),
        ),
        (
            "run",
            Struct(HashMap::from([
                ("post_join_action", Leaf),
                ("account_sample_size", Leaf),
                ("inter_channel_delay_secs", Leaf),
                ("seed", Leaf),
            ])),
        ),
        (
            "gateway",
            Struct(HashMap::from([("base_url", Leaf), ("timeout_secs", Leaf)])),
        ),
    ]))
}

// ── Levenshtein distance ────────────────────────────────────────────────────

fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_chars.len()]
}

/// Closest candidate within `max_distance` edits, if any.
fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    candidates
        .iter()
        .map(|c| (*c, levenshtein(needle, c)))
        .filter(|(_, d)| *d > 0 && *d <= max_distance)
        .min_by_key(|(_, d)| *d)
        .map(|(c, _)| c)
}

// ── Core validation ─────────────────────────────────────────────────────────

/// Validate a config file at the given path, or discover the default config
/// file location if `path` is `None`.
#[must_use]
pub fn validate(path: Option<&Path>) -> ValidationResult {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => crate::loader::find_config_file(),
    };

    let Some(ref actual_path) = config_path else {
        return ValidationResult {
            diagnostics: vec![Diagnostic::new(
                Severity::Error,
                "file-ref",
                "",
                "no config file found",
            )],
            config_path: None,
        };
    };

    let ext = actual_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("toml");
    if matches!(ext, "yaml" | "yml" | "json") {
        return ValidationResult {
            diagnostics: vec![Diagnostic::new(
                Severity::Info,
                "format",
                "",
                format!("linting covers TOML only; .{ext} files are checked when loaded"),
            )],
            config_path: Some(actual_path.clone()),
        };
    }

    match std::fs::read_to_string(actual_path) {
        Ok(content) => {
            let content = crate::env_subst::substitute_env(&content);
            let mut result = validate_toml_str(&content);
            result.config_path = Some(actual_path.clone());
            check_file_references(&content, actual_path, &mut result.diagnostics);
            result
        },
        Err(e) => ValidationResult {
            diagnostics: vec![Diagnostic::new(
                Severity::Error,
                "syntax",
                "",
                format!("failed to read config file: {e}"),
            )],
            config_path: Some(actual_path.clone()),
        },
    }
}

/// Validate a TOML string without file-system side effects.
#[must_use]
pub fn validate_toml_str(toml_str: &str) -> ValidationResult {
    let mut diagnostics = Vec::new();

    let toml_value: toml::Value = match toml::from_str(toml_str) {
        Ok(v) => v,
        Err(e) => {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "syntax",
                "",
                format!("TOML syntax error: {e}"),
            ));
            return ValidationResult {
                diagnostics,
                config_path: None,
            };
        },
    };

    check_unknown_fields(&toml_value, &build_schema_map(), "", &mut diagnostics);

    match toml::from_str::<MusterConfig>(toml_str) {
        Ok(config) => check_semantics(&config, &mut diagnostics),
        Err(e) => diagnostics.push(Diagnostic::new(
            Severity::Error,
            "type-error",
            "",
            format!("type error: {e}"),
        )),
    }

    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

fn check_unknown_fields(
    value: &toml::Value,
    schema: &KnownKeys,
    prefix: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let (toml::Value::Table(table), KnownKeys::Struct(fields)) = (value, schema) else {
        return;
    };
    let known_keys: Vec<&str> = fields.keys().copied().collect();
    for (key, child_value) in table {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        if let Some(child_schema) = fields.get(key.as_str()) {
            check_unknown_fields(child_value, child_schema, &path, diagnostics);
            continue;
        }
        let message = match suggest(key, &known_keys, 3) {
            Some(s) => format!("unknown field (did you mean \"{s}\"?)"),
            None => "unknown field".to_string(),
        };
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "unknown-field",
            path,
            message,
        ));
    }
}

fn check_semantics(config: &MusterConfig, diagnostics: &mut Vec<Diagnostic>) {
    if config.core.api_id == 0 {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "credentials",
            "core.api_id",
            "api_id is not set",
        ));
    }
    let api_hash = config.core.api_hash.expose_secret();
    if api_hash.is_empty() {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "credentials",
            "core.api_hash",
            "api_hash is not set",
        ));
    } else if api_hash.starts_with("${") {
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "credentials",
            "core.api_hash",
            "api_hash references an unset environment variable",
        ));
    }

    if let Some(notify) = &config.notify {
        if notify.chat_id.trim().is_empty() {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "credentials",
                "notify.chat_id",
                "notify section present but chat_id is empty",
            ));
        }
        if notify.bot_token.expose_secret().is_empty() {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "credentials",
                "notify.bot_token",
                "notify section present but bot_token is empty",
            ));
        }
    }

    if config.run.account_sample_size == Some(0) {
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "run",
            "run.account_sample_size",
            "sample size 0 selects no accounts; the run will do nothing",
        ));
    }
    if config.run.inter_channel_delay_secs == 0 {
        diagnostics.push(Diagnostic::new(
            Severity::Info,
            "run",
            "run.inter_channel_delay_secs",
            "no pause between channels; the host may throttle the accounts",
        ));
    }
}

/// Check that the data sources named in the file exist next to it.
fn check_file_references(toml_str: &str, config_path: &Path, diagnostics: &mut Vec<Diagnostic>) {
    let Ok(mut config) = toml::from_str::<MusterConfig>(toml_str) else {
        return;
    };
    if let Some(base) = config_path.parent() {
        config.resolve_paths(base);
    }
    for (field, path) in [
        ("data.sessions", &config.data.sessions),
        ("data.channels", &config.data.channels),
    ] {
        if !path.is_file() {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "file-ref",
                field,
                format!("file not found: {}", path.display()),
            ));
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
[core]
api_id = 12345
api_hash = "abcdef"

[run]
inter_channel_delay_secs = 10
"#;

    #[test]
    fn levenshtein_basics() {
        assert_eq!(levenshtein("hello", "hello"), 0);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("api_hsh", "api_hash"), 1);
        assert_eq!(levenshtein("cat", "car"), 1);
    }

    #[test]
    fn valid_config_has_no_diagnostics() {
        let result = validate_toml_str(VALID);
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    }

    #[test]
    fn unknown_nested_key_with_suggestion() {
        let toml = format!("{VALID}\n[data]\nsesions = \"a.csv\"\n");
        let result = validate_toml_str(&toml);
        let d = result
            .diagnostics
            .iter()
            .find(|d| d.category == "unknown-field" && d.path == "data.sesions")
            .expect("unknown-field diagnostic");
        assert_eq!(d.severity, Severity::Error);
        assert!(d.message.contains("sessions"), "{}", d.message);
    }

    #[test]
    fn syntax_error_detected() {
        let result = validate_toml_str("[core\napi_id = 1");
        assert!(result.has_errors());
        assert_eq!(result.diagnostics[0].category, "syntax");
    }

    #[test]
    fn type_error_detected() {
        let result = validate_toml_str("[core]\napi_id = \"not a number\"\n");
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.category == "type-error")
        );
    }

    #[test]
    fn missing_credentials_are_errors() {
        let result = validate_toml_str("[run]\ninter_channel_delay_secs = 5\n");
        let paths: Vec<&str> = result
            .diagnostics
            .iter()
            .filter(|d| d.category == "credentials")
            .map(|d| d.path.as_str())
            .collect();
        assert_eq!(paths, vec!["core.api_id", "core.api_hash"]);
    }

    #[test]
    fn notify_without_token_is_error() {
        let toml = format!("{VALID}\n[notify]\nchat_id = \"-100\"\n");
        let result = validate_toml_str(&toml);
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.path == "notify.bot_token" && d.severity == Severity::Error)
        );
    }

    #[test]
    fn zero_sample_size_warned() {
        let toml = VALID.replace(
            "inter_channel_delay_secs = 10",
            "inter_channel_delay_secs = 10\naccount_sample_size = 0",
        );
        let result = validate_toml_str(&toml);
        assert_eq!(result.count(Severity::Warning), 1);
    }

    #[test]
    fn missing_data_files_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("muster.toml");
        std::fs::write(&path, VALID).unwrap();
        std::fs::write(dir.path().join("accounts.csv"), "session\n").unwrap();

        let result = validate(Some(&path));
        let missing: Vec<&str> = result
            .diagnostics
            .iter()
            .filter(|d| d.category == "file-ref")
            .map(|d| d.path.as_str())
            .collect();
        assert_eq!(missing, vec!["data.channels"]);
    }

    #[test]
    fn non_toml_files_get_a_single_info() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("muster.yaml");
        std::fs::write(&path, "core:\n  api_id: 1\n").unwrap();

        let result = validate(Some(&path));
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].severity, Severity::Info);
        assert!(result.diagnostics[0].message.contains("TOML only"));
        assert!(!result.has_errors());
    }
}
