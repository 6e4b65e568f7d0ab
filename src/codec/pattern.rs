//! Per-format patterns locating the `key -> version` assignment in a version file.
//!
//! Every pattern exposes the version text as the `value` capture group so the
//! codec can splice a new version into exactly that span.

use regex::bytes::Regex;

use super::FileFormat;
use crate::error::{Result, TaggerError};

pub(super) const VALUE_GROUP: &str = "value";

/// Build the matcher for `key` in the given format
pub(super) fn build(format: FileFormat, key: &str) -> Result<Regex> {
    if key.trim().is_empty() {
        return Err(TaggerError::configuration("version key must not be empty"));
    }

    let key = regex::escape(key);
    let pattern = match format {
        // define('KEY', '1.2.3');  const KEY = "1.2.3";  $KEY = '1.2.3';
        FileFormat::Php => format!(
            r#"(?:define\(\s*['"]{key}['"]\s*,|\bconst\s+{key}\s*=|\${key}\s*=)\s*['"](?P<value>[^'"\r\n]*)['"]"#
        ),
        // KEY: 1.2.3  /  KEY: "1.2.3"  at any indentation
        FileFormat::Yaml => format!(
            r#"(?m)^[ \t]*['"]?{key}['"]?[ \t]*:[ \t]*['"]?(?P<value>[0-9A-Za-z.+\-]+)['"]?"#
        ),
        // "KEY": "1.2.3"
        FileFormat::Json => format!(r#""{key}"\s*:\s*"(?P<value>[^"\r\n]*)""#),
    };

    Regex::new(&pattern).map_err(|e| {
        TaggerError::configuration(format!("Cannot build {} pattern: {}", format, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value<'a>(re: &Regex, content: &'a [u8]) -> Option<&'a [u8]> {
        re.captures(content)
            .and_then(|c| c.name(VALUE_GROUP))
            .map(|m| m.as_bytes())
    }

    #[test]
    fn test_php_define_both_quote_styles() {
        let re = build(FileFormat::Php, "VERSION").unwrap();
        assert_eq!(
            value(&re, b"<?php define('VERSION', '1.2.3');"),
            Some(&b"1.2.3"[..])
        );
        assert_eq!(
            value(&re, b"<?php define(\"VERSION\",\"1.2.3\");"),
            Some(&b"1.2.3"[..])
        );
    }

    #[test]
    fn test_php_const_and_variable() {
        let re = build(FileFormat::Php, "APP_VERSION").unwrap();
        assert_eq!(
            value(&re, b"<?php\nconst APP_VERSION = '0.9.1';\n"),
            Some(&b"0.9.1"[..])
        );
        assert_eq!(
            value(&re, b"<?php\n$APP_VERSION = \"0.9.2\";\n"),
            Some(&b"0.9.2"[..])
        );
    }

    #[test]
    fn test_php_key_must_match_exactly() {
        let re = build(FileFormat::Php, "VERSION").unwrap();
        assert_eq!(value(&re, b"<?php define('VERSIONWRONG', '1.2.3');"), None);
        assert_eq!(value(&re, b"<?php define('MY_VERSION', '1.2.3');"), None);
    }

    #[test]
    fn test_yaml_plain_and_quoted() {
        let re = build(FileFormat::Yaml, "version").unwrap();
        assert_eq!(value(&re, b"name: app\nversion: 1.2.3\n"), Some(&b"1.2.3"[..]));
        assert_eq!(
            value(&re, b"app:\n  version: \"2.0.0\" # pinned\n"),
            Some(&b"2.0.0"[..])
        );
        assert_eq!(value(&re, b"myversion: 1.2.3\n"), None);
    }

    #[test]
    fn test_json_member() {
        let re = build(FileFormat::Json, "version").unwrap();
        assert_eq!(
            value(&re, b"{\n  \"name\": \"app\",\n  \"version\" : \"3.1.4\"\n}"),
            Some(&b"3.1.4"[..])
        );
    }

    #[test]
    fn test_key_is_escaped() {
        let re = build(FileFormat::Json, "app.version").unwrap();
        assert_eq!(value(&re, b"{\"appXversion\": \"1.0.0\"}"), None);
        assert_eq!(
            value(&re, b"{\"app.version\": \"1.0.0\"}"),
            Some(&b"1.0.0"[..])
        );
    }

    #[test]
    fn test_empty_key_is_configuration_error() {
        let err = build(FileFormat::Php, " ").unwrap_err();
        assert!(matches!(err, TaggerError::Configuration(_)));
    }
}
