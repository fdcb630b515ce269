use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::{OutputEncoding, Settings};
use crate::error::{Error, Result};

pub const CSV_FILE_NAME: &str = "feed.csv";
pub const INDEX_FILE_NAME: &str = "index.html";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Writes the header and all rows with minimal quoting, in the configured encoding.
/// Nothing is written when a character cannot be represented in that encoding.
pub fn write_csv(
    path: &Path,
    header: &[String],
    rows: &[Vec<String>],
    settings: &Settings,
) -> Result<()> {
    let mut utf8 = Vec::new();
    let mut writer = csv::WriterBuilder::new()
        .delimiter(settings.csv_delimiter)
        .quote(settings.csv_quotechar)
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::CRLF)
        .from_writer(&mut utf8);

    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    drop(writer);

    // every field came in as a String
    let text = String::from_utf8_lossy(&utf8);
    let bytes = encode(&text, &settings.encoding)?;

    let mut file = BufWriter::new(File::create(path)?);
    if settings.encoding.bom {
        file.write_all(UTF8_BOM)?;
    }
    file.write_all(&bytes)?;
    file.flush()?;

    tracing::info!(
        rows = rows.len(),
        encoding = settings.encoding.encoding.name(),
        path = %path.display(),
        "CSV written"
    );
    Ok(())
}

fn encode<'a>(text: &'a str, output: &OutputEncoding) -> Result<Cow<'a, [u8]>> {
    let encoding = output.encoding;
    let (bytes, _, had_errors) = encoding.encode(text);
    if !had_errors {
        return Ok(bytes);
    }

    let mut buf = [0u8; 4];
    let character = text
        .chars()
        .find(|c| encoding.encode(c.encode_utf8(&mut buf)).2)
        .unwrap_or(char::REPLACEMENT_CHARACTER);
    Err(Error::Unencodable {
        encoding: encoding.name(),
        character,
    })
}

/// Writes a one-line landing page linking to the CSV next to it.
pub fn write_index(dir: &Path) -> Result<PathBuf> {
    let path = dir.join(INDEX_FILE_NAME);
    std::fs::write(
        &path,
        format!(r#"<a href="{CSV_FILE_NAME}">{CSV_FILE_NAME}</a>"#),
    )?;
    Ok(path)
}
