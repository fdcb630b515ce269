use crate::extract::CATEGORY_SEPARATOR;

/// Flat scalar columns, copied from same-named children of `product`.
pub const SCALAR_COLUMNS: [&str; 22] = [
    "id_product",
    "id_category_default",
    "url",
    "price",
    "wholesale_price",
    "weight",
    "unity",
    "unit_price_ratio",
    "width",
    "height",
    "depth",
    "on_sale",
    "online_only",
    "quantity",
    "minimal_quantity",
    "vat",
    "active",
    "manufacturer",
    "supplier",
    "reference",
    "ean",
    "upc",
];

/// One product, with every field already extracted and normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Product {
    /// Values in `SCALAR_COLUMNS` order; `reference` is prefixed, `ean` normalized
    pub scalars: Vec<String>,
    pub name: String,
    pub description_html: String,
    pub description_text: String,
    pub description_short_html: String,
    pub description_short_text: String,
    pub link_rewrite: String,
    pub meta_description: String,
    pub meta_keywords: String,
    pub meta_title: String,
    pub available_now: String,
    pub available_later: String,
    pub category_default: String,
    pub categories: Vec<String>,
    pub image_main: String,
    pub images: Vec<String>,
    pub features: String,
}

/// CSV header; localized columns carry the configured language code as suffix.
pub fn header(lang: &str, max_images: usize) -> Vec<String> {
    let mut header: Vec<String> = SCALAR_COLUMNS.iter().map(|c| c.to_string()).collect();
    header.extend([
        format!("name_{lang}"),
        format!("description_{lang}_html"),
        format!("description_{lang}_text"),
        format!("description_short_{lang}_html"),
        format!("description_short_{lang}_text"),
        format!("link_rewrite_{lang}"),
        format!("meta_description_{lang}"),
        format!("meta_keywords_{lang}"),
        format!("meta_title_{lang}"),
        format!("available_now_{lang}"),
        format!("available_later_{lang}"),
        format!("category_default_{lang}"),
        format!("categories_{lang}"),
        "image_main".to_string(),
    ]);
    header.extend((1..=max_images).map(|i| format!("image_{i}")));
    header.push(format!("features_{lang}"));
    header
}

/// Exactly `max_images` slots: extra images are dropped, missing ones are empty.
pub fn image_columns(images: &[String], max_images: usize) -> Vec<String> {
    (0..max_images)
        .map(|i| images.get(i).cloned().unwrap_or_default())
        .collect()
}

impl Product {
    /// Flattens the product into a row matching `header`.
    pub fn into_row(self, max_images: usize) -> Vec<String> {
        let mut row = self.scalars;
        row.resize(SCALAR_COLUMNS.len(), String::new());
        row.extend([
            self.name,
            self.description_html,
            self.description_text,
            self.description_short_html,
            self.description_short_text,
            self.link_rewrite,
            self.meta_description,
            self.meta_keywords,
            self.meta_title,
            self.available_now,
            self.available_later,
            self.category_default,
            self.categories.join(CATEGORY_SEPARATOR),
            self.image_main,
        ]);
        row.extend(image_columns(&self.images, max_images));
        row.push(self.features);
        row
    }
}
