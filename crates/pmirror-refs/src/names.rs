//! Tag name validation following git's ref-name rules.
//!
//! A valid name:
//! - is non-empty
//! - contains no whitespace, control characters, `~`, `^`, `:`, `?`, `*`,
//!   `[` or `\`
//! - contains neither `..` nor `@{`
//! - does not start or end with `.` or `/`, and does not end with `.lock`
//! - has only non-empty `/`-separated components, none starting with `.`

use crate::error::{RefError, Result};

const FORBIDDEN_CHARS: &[char] = &['~', '^', ':', '?', '*', '[', '\\'];

/// Validate a short tag name such as `v5.0.0`.
///
/// ```
/// use pmirror_refs::names::validate_tag_name;
///
/// assert!(validate_tag_name("v5.0.0").is_ok());
/// assert!(validate_tag_name("v5..0").is_err());
/// ```
pub fn validate_tag_name(name: &str) -> Result<()> {
    let reject = |reason: String| {
        Err(RefError::InvalidName {
            name: name.to_string(),
            reason,
        })
    };

    if name.is_empty() {
        return reject("name must not be empty".into());
    }
    if let Some(ch) = name
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || FORBIDDEN_CHARS.contains(c))
    {
        return reject(format!("contains forbidden character {ch:?}"));
    }
    for seq in ["..", "@{", "//"] {
        if name.contains(seq) {
            return reject(format!("must not contain {seq:?}"));
        }
    }
    if name.starts_with(['.', '/']) || name.ends_with(['.', '/']) {
        return reject("must not start or end with '.' or '/'".into());
    }
    if name.ends_with(".lock") {
        return reject("must not end with '.lock'".into());
    }
    if let Some(component) = name.split('/').find(|c| c.starts_with('.')) {
        return reject(format!("component {component:?} starts with '.'"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_tags_are_valid() {
        for name in ["v5.0.0", "v6.12.3", "unstable/v5.2"] {
            assert!(validate_tag_name(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn rejects_malformed_names() {
        for name in [
            "", "v5..0", "has space", "tab\there", "a~b", "a^b", "a:b", "a?b", "a*b", "a[b",
            "a\\b", "ref@{0}", ".hidden", "trailing.", "/lead", "trail/", "a//b", "v5.lock",
            "x/.y",
        ] {
            assert!(validate_tag_name(name).is_err(), "{name:?} should be rejected");
        }
    }

    #[test]
    fn error_names_the_offender() {
        let err = validate_tag_name("bad name").unwrap_err();
        assert!(err.to_string().contains("bad name"));
    }
}
