use std::path::Path;

use encoding_rs::{Encoding, UTF_8};
use serde::Deserialize;

use crate::error::{Error, Result};

pub const FEED_URL_VAR: &str = "FEED_URL";

/// Character encoding of the CSV file on disk
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputEncoding {
    pub encoding: &'static Encoding,
    /// Write a UTF-8 byte-order mark first, which spreadsheet tools use to detect the charset
    pub bom: bool,
}

impl OutputEncoding {
    /// Accepts WHATWG labels (`utf-8`, `cp1250`, `iso-8859-2`, ...), their
    /// underscore spellings (`utf_8`), and `utf-8-sig` for UTF-8 with a BOM.
    fn parse(name: &str) -> Result<Self> {
        let label = name.trim().to_ascii_lowercase();
        let normalized = label.replace('_', "-");

        if matches!(normalized.as_str(), "utf-8-sig" | "utf8-sig") {
            return Ok(OutputEncoding {
                encoding: UTF_8,
                bom: true,
            });
        }

        let encoding = Encoding::for_label(label.as_bytes())
            .or_else(|| Encoding::for_label(normalized.as_bytes()))
            .ok_or_else(|| {
                Error::config("encoding", format!("unknown output encoding {name:?}"))
            })?;

        // UTF-16 and the replacement encoding have no encoder
        if encoding.output_encoding() != encoding {
            return Err(Error::config(
                "encoding",
                format!("cannot write CSV as {}", encoding.name()),
            ));
        }

        Ok(OutputEncoding {
            encoding,
            bom: false,
        })
    }
}

/// Immutable settings for a single run
#[derive(Debug, Clone)]
pub struct Settings {
    pub feed_url: String,
    pub lang: String,
    pub max_images: usize,
    pub supplier_prefix: String,
    pub supplier_prefix_sep: String,
    pub csv_delimiter: u8,
    pub csv_quotechar: u8,
    pub encoding: OutputEncoding,
}

/// Shape of config.json; every key is optional
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default = "default_lang")]
    lang: String,
    #[serde(default = "default_max_images")]
    max_images: usize,
    #[serde(default = "default_supplier_prefix")]
    supplier_prefix: String,
    // null disables the separator, same as ""
    #[serde(default = "default_supplier_prefix_sep")]
    supplier_prefix_sep: Option<String>,
    #[serde(default = "default_csv_delimiter")]
    csv_delimiter: String,
    #[serde(default = "default_csv_quotechar")]
    csv_quotechar: String,
    #[serde(default = "default_encoding")]
    encoding: String,
}

fn default_lang() -> String {
    "pl".to_string()
}

fn default_max_images() -> usize {
    10
}

fn default_supplier_prefix() -> String {
    "VPR".to_string()
}

fn default_supplier_prefix_sep() -> Option<String> {
    Some("-".to_string())
}

fn default_csv_delimiter() -> String {
    ",".to_string()
}

fn default_csv_quotechar() -> String {
    "\"".to_string()
}

fn default_encoding() -> String {
    "utf-8".to_string()
}

/// Reads the feed URL from the environment. Absent or blank is a configuration error.
pub fn feed_url_from_env() -> Result<String> {
    match std::env::var(FEED_URL_VAR) {
        Ok(url) if !url.trim().is_empty() => Ok(url.trim().to_string()),
        _ => Err(Error::config(FEED_URL_VAR, "missing FEED_URL")),
    }
}

impl Settings {
    pub fn load(config_path: &Path, feed_url: String) -> Result<Self> {
        let json = std::fs::read_to_string(config_path)?;
        Self::from_json(&json, feed_url)
    }

    pub fn from_json(json: &str, feed_url: String) -> Result<Self> {
        if feed_url.trim().is_empty() {
            return Err(Error::config(FEED_URL_VAR, "missing FEED_URL"));
        }

        let raw: RawConfig = serde_json::from_str(json)?;

        Ok(Settings {
            feed_url,
            lang: raw.lang,
            max_images: raw.max_images,
            supplier_prefix: raw.supplier_prefix,
            supplier_prefix_sep: raw.supplier_prefix_sep.unwrap_or_default(),
            csv_delimiter: single_ascii("csv_delimiter", &raw.csv_delimiter)?,
            csv_quotechar: single_ascii("csv_quotechar", &raw.csv_quotechar)?,
            encoding: OutputEncoding::parse(&raw.encoding)?,
        })
    }
}

fn single_ascii(key: &str, value: &str) -> Result<u8> {
    match value.as_bytes() {
        [b] if b.is_ascii() => Ok(*b),
        _ => Err(Error::config(
            key,
            format!("expected a single ASCII character, got {value:?}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://feeds.example.com/products.xml";

    #[test]
    fn empty_object_uses_defaults() {
        let settings = Settings::from_json("{}", URL.to_string()).unwrap();

        assert_eq!(settings.feed_url, URL);
        assert_eq!(settings.lang, "pl");
        assert_eq!(settings.max_images, 10);
        assert_eq!(settings.supplier_prefix, "VPR");
        assert_eq!(settings.supplier_prefix_sep, "-");
        assert_eq!(settings.csv_delimiter, b',');
        assert_eq!(settings.csv_quotechar, b'"');
        assert_eq!(settings.encoding.encoding, UTF_8);
        assert!(!settings.encoding.bom);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let json = r#"{
            "lang": "en",
            "max_images": 3,
            "supplier_prefix": "ACME",
            "supplier_prefix_sep": "_",
            "csv_delimiter": ";",
            "csv_quotechar": "'",
            "encoding": "UTF-8-SIG"
        }"#;
        let settings = Settings::from_json(json, URL.to_string()).unwrap();

        assert_eq!(settings.lang, "en");
        assert_eq!(settings.max_images, 3);
        assert_eq!(settings.supplier_prefix, "ACME");
        assert_eq!(settings.supplier_prefix_sep, "_");
        assert_eq!(settings.csv_delimiter, b';');
        assert_eq!(settings.csv_quotechar, b'\'');
        assert_eq!(settings.encoding.encoding, UTF_8);
        assert!(settings.encoding.bom);
    }

    #[test]
    fn null_or_empty_separator_disables_it() {
        let settings =
            Settings::from_json(r#"{"supplier_prefix_sep": null}"#, URL.to_string()).unwrap();
        assert_eq!(settings.supplier_prefix_sep, "");

        let settings =
            Settings::from_json(r#"{"supplier_prefix_sep": ""}"#, URL.to_string()).unwrap();
        assert_eq!(settings.supplier_prefix_sep, "");
    }

    #[test]
    fn empty_feed_url_is_rejected() {
        let err = Settings::from_json("{}", "  ".to_string()).unwrap_err();
        assert!(matches!(err, Error::Config { ref key, .. } if key == FEED_URL_VAR));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = Settings::from_json("{ not json", URL.to_string()).unwrap_err();
        assert!(matches!(err, Error::ConfigFile(_)));
    }

    #[test]
    fn negative_max_images_is_rejected() {
        let err = Settings::from_json(r#"{"max_images": -1}"#, URL.to_string()).unwrap_err();
        assert!(matches!(err, Error::ConfigFile(_)));
    }

    #[test]
    fn multi_character_delimiter_is_rejected() {
        let err = Settings::from_json(r#"{"csv_delimiter": ";;"}"#, URL.to_string()).unwrap_err();
        assert!(matches!(err, Error::Config { ref key, .. } if key == "csv_delimiter"));

        let err = Settings::from_json(r#"{"csv_quotechar": "„"}"#, URL.to_string()).unwrap_err();
        assert!(matches!(err, Error::Config { ref key, .. } if key == "csv_quotechar"));
    }

    #[test]
    fn legacy_encodings_are_accepted() {
        let cases = [
            ("cp1250", encoding_rs::WINDOWS_1250),
            ("Windows-1250", encoding_rs::WINDOWS_1250),
            ("iso_8859_2", encoding_rs::ISO_8859_2),
            ("utf_8", UTF_8),
        ];
        for (label, expected) in cases {
            let json = format!(r#"{{"encoding": "{label}"}}"#);
            let settings = Settings::from_json(&json, URL.to_string()).unwrap();
            assert_eq!(settings.encoding.encoding, expected, "{label}");
            assert!(!settings.encoding.bom);
        }
    }

    #[test]
    fn unknown_encoding_is_rejected() {
        let err = Settings::from_json(r#"{"encoding": "klingon"}"#, URL.to_string()).unwrap_err();
        assert!(matches!(err, Error::Config { ref key, .. } if key == "encoding"));

        let err = Settings::from_json(r#"{"encoding": "utf-16le"}"#, URL.to_string()).unwrap_err();
        assert!(matches!(err, Error::Config { ref key, .. } if key == "encoding"));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"lang": "de"}"#).unwrap();

        let settings = Settings::load(&path, URL.to_string()).unwrap();
        assert_eq!(settings.lang, "de");
    }

    #[test]
    fn load_fails_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load(&dir.path().join("config.json"), URL.to_string()).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
