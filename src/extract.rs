use crate::logi;
use crate::model::ProductInfo;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::{Map, Value};
use std::collections::HashSet;
use url::Url;

pub const DEFAULT_TITLE: &str = "Product Title Not Found";
pub const DEFAULT_DESCRIPTION: &str = "No description found.";
pub const MAX_IMAGES: usize = 4;

static SIZE_VARIANT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\._[^.]+\.").unwrap());

static PRODUCT_TITLE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("span#productTitle").unwrap());
static OG_TITLE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse(r#"meta[property="og:title"]"#).unwrap());
static DOC_TITLE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static META_DESC_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse(r#"meta[name="description"]"#).unwrap());
static OG_DESC_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:description"]"#).unwrap());
static DYNAMIC_IMG_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("img[data-a-dynamic-image]").unwrap());
static HERO_IMG_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("img#landingImage").unwrap());
static OG_IMAGE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse(r#"meta[property="og:image"]"#).unwrap());

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Use the hero image or og:image when no dynamic images exist.
    pub hero_fallback: bool,
    pub max_images: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            hero_fallback: true,
            max_images: MAX_IMAGES,
        }
    }
}

/// Strips the `._<variant>.` size marker so resized copies of one image compare equal.
pub fn normalize_image_url(url: &str) -> String {
    SIZE_VARIANT_RE.replace_all(url, ".").into_owned()
}

fn first_text(doc: &Html, sel: &Selector) -> Option<String> {
    doc.select(sel)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .find(|t| !t.is_empty())
}

fn first_attr(doc: &Html, sel: &Selector, attr: &str) -> Option<String> {
    doc.select(sel)
        .filter_map(|el| el.value().attr(attr))
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

fn resolve(locator: &str, base: Option<&Url>) -> String {
    match base {
        Some(base) => base
            .join(locator)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| locator.to_string()),
        None => locator.to_string(),
    }
}

fn dynamic_image_urls(doc: &Html, max_images: usize) -> Vec<String> {
    let mut urls = Vec::new();
    let mut seen = HashSet::new();

    for img in doc.select(&DYNAMIC_IMG_SEL) {
        let Some(data) = img.value().attr("data-a-dynamic-image") else {
            continue;
        };
        let Ok(map) = serde_json::from_str::<Map<String, Value>>(data) else {
            continue;
        };
        for key in map.keys() {
            if urls.len() >= max_images {
                return urls;
            }
            if seen.insert(normalize_image_url(key)) {
                urls.push(key.clone());
            }
        }
    }

    urls
}

/// Recovers title, description and image locators from a product page.
/// Missing pieces fall back to defaults; this never fails.
pub fn extract_product_info(html: &str, page_url: Option<&Url>, opts: &ExtractOptions) -> ProductInfo {
    let doc = Html::parse_document(html);

    let title = first_text(&doc, &PRODUCT_TITLE_SEL)
        .or_else(|| first_attr(&doc, &OG_TITLE_SEL, "content"))
        .or_else(|| first_text(&doc, &DOC_TITLE_SEL))
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    let description = first_attr(&doc, &META_DESC_SEL, "content")
        .or_else(|| first_attr(&doc, &OG_DESC_SEL, "content"))
        .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());

    let mut image_locators = dynamic_image_urls(&doc, opts.max_images);
    if image_locators.is_empty() && opts.hero_fallback {
        if let Some(hero) = first_attr(&doc, &HERO_IMG_SEL, "src")
            .or_else(|| first_attr(&doc, &OG_IMAGE_SEL, "content"))
        {
            image_locators.push(hero);
        }
    }
    let image_locators = image_locators
        .iter()
        .map(|l| resolve(l, page_url))
        .collect::<Vec<_>>();

    logi(format!("Title: {}", title));
    logi(format!(
        "Description: {}...",
        description.chars().take(100).collect::<String>()
    ));
    logi(format!("Images found: {}", image_locators.len()));

    ProductInfo {
        title,
        description,
        image_locators,
    }
}
