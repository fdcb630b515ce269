//! Error types for the feed exporter.
//!
//! Every fatal condition of a run maps to one variant: configuration,
//! transport, parse, or output. Field extraction never produces an error.

use thiserror::Error;

/// Result type alias used by every stage of the pipeline
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Missing feed URL or an unusable configuration value
    #[error("configuration error ({key}): {message}")]
    Config {
        /// The setting at fault (e.g. "FEED_URL", "csv_delimiter")
        key: String,
        message: String,
    },

    /// config.json is not valid JSON or does not match the expected shape
    #[error("invalid config file: {0}")]
    ConfigFile(#[from] serde_json::Error),

    /// Network failure, timeout or non-success HTTP status
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// XML declaration names an encoding nobody knows
    #[error("XML parse error: unknown feed encoding {0:?}")]
    FeedEncoding(String),

    /// Feed bytes are invalid in the encoding they declare
    #[error("XML parse error: feed is not valid {0}")]
    FeedDecoding(&'static str),

    /// Feed body is not well-formed XML
    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// CSV text contains a character the configured output encoding lacks
    #[error("cannot encode {character:?} as {encoding}")]
    Unencodable {
        encoding: &'static str,
        character: char,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            key: key.into(),
            message: message.into(),
        }
    }
}
