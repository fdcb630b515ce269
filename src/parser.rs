use std::borrow::Cow;
use std::sync::LazyLock;

use encoding_rs::{Encoding, UTF_8};
use regex::bytes::Regex;
use roxmltree::{Document, Node, ParsingOptions};

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::extract::{
    apply_supplier_prefix, child, collect_categories, collect_features, collect_images,
    lang_value, normalize_ean, strip_html, text,
};
use crate::models::{Product, SCALAR_COLUMNS};

// The declaration must sit at the very start, so a short prefix is enough
const DECLARATION_SCAN_LIMIT: usize = 256;

static RE_DECLARED_ENCODING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^<\?xml\s[^>]*?encoding\s*=\s*["']([A-Za-z0-9._:-]+)["']"#).unwrap()
});

/// Decodes the downloaded bytes to text. A byte-order mark wins, then the
/// `encoding` of the XML declaration, then UTF-8.
pub fn decode_feed(raw: &[u8]) -> Result<Cow<'_, str>> {
    let (encoding, body) = match Encoding::for_bom(raw) {
        Some((encoding, bom_len)) => (encoding, &raw[bom_len..]),
        None => (declared_encoding(raw)?.unwrap_or(UTF_8), raw),
    };
    tracing::debug!(encoding = encoding.name(), "decoding feed");

    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .ok_or(Error::FeedDecoding(encoding.name()))
}

fn declared_encoding(raw: &[u8]) -> Result<Option<&'static Encoding>> {
    let head = &raw[..raw.len().min(DECLARATION_SCAN_LIMIT)];
    let Some(caps) = RE_DECLARED_ENCODING.captures(head) else {
        return Ok(None);
    };

    let label = &caps[1];
    Encoding::for_label(label)
        .map(Some)
        .ok_or_else(|| Error::FeedEncoding(String::from_utf8_lossy(label).into_owned()))
}

pub fn parse_document(xml: &str) -> Result<Document<'_>> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    Ok(Document::parse_with_options(xml, options)?)
}

/// Every `product` element below the root, at any depth, in document order.
pub fn find_products<'a, 'input>(doc: &'a Document<'input>) -> Vec<Node<'a, 'input>> {
    let root = doc.root_element();
    root.descendants()
        .filter(|n| *n != root && n.has_tag_name("product"))
        .collect()
}

pub fn parse_products(doc: &Document, settings: &Settings) -> Vec<Product> {
    find_products(doc)
        .into_iter()
        .map(|node| parse_product(node, settings))
        .collect()
}

pub fn parse_product(node: Node, settings: &Settings) -> Product {
    let lang = settings.lang.as_str();
    let localized = |name: &str| lang_value(child(node, name), lang);

    let scalars = SCALAR_COLUMNS
        .iter()
        .map(|&column| {
            let raw = text(child(node, column));
            match column {
                "reference" => apply_supplier_prefix(
                    &raw,
                    &settings.supplier_prefix,
                    &settings.supplier_prefix_sep,
                ),
                "ean" => normalize_ean(&raw),
                _ => raw,
            }
        })
        .collect();

    let description_html = localized("description");
    let description_short_html = localized("description_short");
    let images = collect_images(child(node, "imgs"));

    Product {
        scalars,
        name: localized("name"),
        description_text: strip_html(&description_html),
        description_html,
        description_short_text: strip_html(&description_short_html),
        description_short_html,
        link_rewrite: localized("link_rewrite"),
        meta_description: localized("meta_description"),
        meta_keywords: localized("meta_keywords"),
        meta_title: localized("meta_title"),
        available_now: localized("available_now"),
        available_later: localized("available_later"),
        category_default: localized("category_default"),
        categories: collect_categories(child(node, "categories"), lang),
        image_main: images.main,
        images: images.all,
        features: collect_features(child(node, "features"), lang),
    }
}
