//! Field extractors over product nodes.
//!
//! Every function here is total: an absent node or a sparse subtree yields an
//! empty string or an empty list, never an error.

use std::collections::HashSet;
use std::sync::LazyLock;

use html_escape::decode_html_entities;
use regex::Regex;
use roxmltree::{NS_XML_URI, Node};

pub const CATEGORY_SEPARATOR: &str = " | ";
pub const FEATURE_SEPARATOR: &str = "; ";

static RE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]+>").unwrap());

/// First child element with the given local name.
pub fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|c| c.has_tag_name(name))
}

fn children_named<'a, 'input>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(move |c| c.has_tag_name(name))
}

/// Trimmed text of an element up to its first child element.
/// Comments and processing instructions in between are skipped.
pub fn text(node: Option<Node>) -> String {
    let Some(node) = node else {
        return String::new();
    };

    node.children()
        .take_while(|c| !c.is_element())
        .filter_map(|c| if c.is_text() { c.text() } else { None })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Picks the `value` whose `xml:lang` matches `lang`, else the first `value`.
pub fn lang_value(container: Option<Node>, lang: &str) -> String {
    let Some(container) = container else {
        return String::new();
    };

    let mut chosen = None;
    for value in children_named(container, "value") {
        if value.attribute((NS_XML_URI, "lang")) == Some(lang) {
            chosen = Some(value);
            break;
        }
        chosen.get_or_insert(value);
    }
    text(chosen)
}

/// The feed marks a missing EAN with zeros ("0", "000", ...).
pub fn normalize_ean(raw: &str) -> String {
    let ean = raw.trim();
    if !ean.is_empty() && ean.bytes().all(|b| b == b'0') {
        String::new()
    } else {
        ean.to_string()
    }
}

/// Prefixes a reference with the supplier code unless it already carries it.
///
/// A reference counts as prefixed when it starts with `prefix` (ignoring case)
/// followed by end of string, `-`, `_`, a space, or `sep` itself.
pub fn apply_supplier_prefix(reference: &str, prefix: &str, sep: &str) -> String {
    let reference = reference.trim();
    if reference.is_empty() {
        return String::new();
    }

    if let Some(rest) = strip_prefix_ignore_case(reference, prefix) {
        let already_prefixed = rest.is_empty()
            || rest.starts_with(['-', '_', ' '])
            || rest.starts_with(sep);
        if already_prefixed {
            return reference.to_string();
        }
    }

    format!("{prefix}{sep}{reference}")
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let mut rest = s.chars();
    for expected in prefix.chars() {
        let actual = rest.next()?;
        if !actual.to_lowercase().eq(expected.to_lowercase()) {
            return None;
        }
    }
    Some(rest.as_str())
}

/// Localized labels of every `category`, in document order, without empties.
pub fn collect_categories(categories: Option<Node>, lang: &str) -> Vec<String> {
    let Some(categories) = categories else {
        return Vec::new();
    };

    children_named(categories, "category")
        .map(|cat| lang_value(Some(cat), lang))
        .filter(|label| !label.is_empty())
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Images {
    /// URL of the `main` image, empty when there is none
    pub main: String,
    /// Main image first, then the `i` entries, deduplicated
    pub all: Vec<String>,
}

pub fn collect_images(imgs: Option<Node>) -> Images {
    let Some(imgs) = imgs else {
        return Images::default();
    };

    let mut images = Images::default();
    let mut candidates = Vec::new();

    if let Some(url) = child(imgs, "main").and_then(|m| m.attribute("url")) {
        images.main = url.trim().to_string();
        candidates.push(images.main.clone());
    }

    candidates.extend(
        children_named(imgs, "i")
            .filter_map(|i| i.attribute("url"))
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string),
    );

    let mut seen = HashSet::new();
    images.all = candidates
        .into_iter()
        .filter(|url| seen.insert(url.clone()))
        .collect();
    images
}

/// Renders features as `name: value` pairs joined with `; `.
pub fn collect_features(features: Option<Node>, lang: &str) -> String {
    let Some(features) = features else {
        return String::new();
    };

    children_named(features, "feature")
        .filter_map(|feature| {
            let name = lang_value(child(feature, "name"), lang);
            let value = lang_value(child(feature, "value"), lang);
            if name.is_empty() && value.is_empty() {
                return None;
            }
            let rendered = format!("{name}: {value}");
            let rendered = rendered.trim_matches([':', ' ']).trim();
            (!rendered.is_empty()).then(|| rendered.to_string())
        })
        .collect::<Vec<_>>()
        .join(FEATURE_SEPARATOR)
}

/// Plain-text rendition of an HTML snippet: every `<...>` becomes a space,
/// entities are decoded, whitespace is collapsed.
pub fn strip_html(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }

    let without_tags = RE_TAG.replace_all(html, " ");
    decode_html_entities(&without_tags)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
