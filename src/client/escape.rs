//! Quoting helpers for embedding untrusted text in scripts and shell lines.

/// Prefix every `'` in `script` with a backslash.
///
/// Applied before the script is wrapped in single quotes on a `sh -c`
/// line. Nothing else in the script is touched. The result is not safe
/// under POSIX `sh`, where a backslash inside single quotes is literal.
pub fn escape_single_quotes(script: &str) -> String {
    script.replace('\'', "\\'")
}

/// Build the shell line `<client> -e '<escaped-script>'`.
pub fn shell_command(client: &str, script: &str) -> String {
    format!("{client} -e '{}'", escape_single_quotes(script))
}

/// Render `value` as an Emacs Lisp string literal, escaping `"` as `\"`.
pub fn elisp_string(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\\\""))
}
