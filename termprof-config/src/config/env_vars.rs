//! Environment variable substitution for the config file.
//!
//! Only allowlisted variables (and `TERMPROF_*` / `LC_*` prefixed ones) are
//! resolved unless the config opts into `allow_all_env_vars: true`.

use regex::Regex;
use std::sync::LazyLock;

/// `${NAME}` or `${NAME:-default}`; `\}` escapes a brace inside the default.
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-((?:[^}\\]|\\.)*))?}")
        .expect("placeholder regex is valid")
});

static ALLOW_ALL_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^allow_all_env_vars:\s*true\s*$").expect("allow-all regex is valid")
});

/// Variables resolved without `allow_all_env_vars`.
pub const ALLOWED_ENV_VARS: &[&str] = &[
    "HOME",
    "USER",
    "LOGNAME",
    "SHELL",
    "TMPDIR",
    "XDG_CONFIG_HOME",
    "XDG_CACHE_HOME",
    "AWS_CONFIG_FILE",
    "AWS_SHARED_CREDENTIALS_FILE",
    "AWS_PROFILE",
    "KUBECONFIG",
];

const ALLOWED_PREFIXES: &[&str] = &["TERMPROF_", "LC_"];

pub fn is_env_var_allowed(var_name: &str) -> bool {
    ALLOWED_ENV_VARS.contains(&var_name)
        || ALLOWED_PREFIXES.iter().any(|p| var_name.starts_with(p))
}

/// Substitute `${VAR}` placeholders, resolving allowlisted variables only.
///
/// An unset variable falls back to its `:-default`, or stays as written.
/// `$${VAR}` produces a literal `${VAR}`.
pub fn substitute_variables(input: &str) -> String {
    substitute_variables_with_allowlist(input, false)
}

fn resolve(caps: &regex::Captures<'_>, allow_all: bool) -> String {
    let name = &caps[1];
    if !allow_all && !is_env_var_allowed(name) {
        log::warn!(
            "Config variable ${{{name}}} is not allowlisted and was left as-is \
             (set `allow_all_env_vars: true` to resolve it)"
        );
        return caps[0].to_string();
    }
    if let Ok(value) = std::env::var(name) {
        return value;
    }
    match caps.get(2) {
        Some(default) => default.as_str().replace("\\}", "}"),
        None => caps[0].to_string(),
    }
}

/// Like [`substitute_variables`], optionally resolving every variable.
pub fn substitute_variables_with_allowlist(input: &str, allow_all: bool) -> String {
    // Text after an escaping `$$` starts with `{...}` and is never a placeholder
    input
        .split("$${")
        .map(|piece| PLACEHOLDER.replace_all(piece, |caps: &regex::Captures<'_>| resolve(caps, allow_all)))
        .collect::<Vec<_>>()
        .join("${")
}

/// Whether the raw YAML opts into resolving every variable.
pub(crate) fn pre_scan_allow_all_env_vars(raw_yaml: &str) -> bool {
    ALLOW_ALL_LINE.is_match(raw_yaml)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowlist() {
        assert!(is_env_var_allowed("HOME"));
        assert!(is_env_var_allowed("TERMPROF_OUTPUT"));
        assert!(is_env_var_allowed("LC_ALL"));
        assert!(!is_env_var_allowed("AWS_SECRET_ACCESS_KEY"));
    }

    #[test]
    fn test_default_value_for_unset_variable() {
        let out = substitute_variables("x: ${TERMPROF_SURELY_UNSET_VAR:-fallback}");
        assert_eq!(out, "x: fallback");
    }

    #[test]
    fn test_unset_variable_without_default_is_kept() {
        let out = substitute_variables("x: ${TERMPROF_SURELY_UNSET_VAR}");
        assert_eq!(out, "x: ${TERMPROF_SURELY_UNSET_VAR}");
    }

    #[test]
    fn test_escape_produces_literal() {
        let out = substitute_variables("x: $${HOME}");
        assert_eq!(out, "x: ${HOME}");
    }

    #[test]
    fn test_non_allowlisted_is_kept() {
        let out = substitute_variables("x: ${AWS_SECRET_ACCESS_KEY:-nope}");
        assert_eq!(out, "x: ${AWS_SECRET_ACCESS_KEY:-nope}");
    }

    #[test]
    fn test_pre_scan() {
        assert!(pre_scan_allow_all_env_vars("a: 1\nallow_all_env_vars: true\n"));
        assert!(!pre_scan_allow_all_env_vars("  allow_all_env_vars: true\n"));
    }
}
