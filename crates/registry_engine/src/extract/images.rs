use std::collections::HashSet;

use scraper::{ElementRef, Html};

use super::dom;

const MIN_DIMENSION: u32 = 50;
const IMAGE_EXTENSIONS: [&str; 5] = [".jpg", ".jpeg", ".png", ".gif", ".webp"];
const SKIP_MARKERS: [&str; 5] = ["logo", "icon", "button", "banner", "sprite"];
const CONTENT_MARKERS: [&str; 4] = ["content", "detail", "main", "body"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    /// An `<img>` on the page.
    Photo,
    /// An anchor pointing straight at an image file.
    PhotoLink,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// `src`/`href` exactly as written in the page.
    pub url: String,
    pub alt: String,
    pub kind: ImageKind,
}

/// Candidate dog photos on a detail page, first occurrence of each URL only.
///
/// Three passes: images whose attributes mention a dog or photo, image files
/// inside content containers, and links to image files.
pub fn extract_image_refs(html: &Html) -> Vec<ImageRef> {
    let mut seen = HashSet::new();
    let mut refs = Vec::new();
    let images: Vec<_> = html.select(&dom::IMG).collect();

    for img in images.iter().copied().filter(|img| looks_like_photo(*img)) {
        let Some(src) = image_source(img) else {
            continue;
        };
        if is_tiny(img) || !seen.insert(src.to_string()) {
            continue;
        }
        refs.push(photo(img, src));
    }

    for img in content_images(html) {
        let Some(src) = image_source(img) else {
            continue;
        };
        let lower = src.to_ascii_lowercase();
        if SKIP_MARKERS.iter().any(|marker| lower.contains(marker))
            || !has_image_extension(&lower)
            || is_tiny(img)
        {
            continue;
        }
        if seen.insert(src.to_string()) {
            refs.push(photo(img, src));
        }
    }

    for anchor in html.select(&dom::ANCHOR) {
        let Some(href) = dom::href(anchor) else {
            continue;
        };
        if !has_image_extension(&href.to_ascii_lowercase()) || !seen.insert(href.to_string()) {
            continue;
        }
        refs.push(ImageRef {
            url: href.to_string(),
            alt: anchor.value().attr("title").unwrap_or_default().to_string(),
            kind: ImageKind::PhotoLink,
        });
    }
    refs
}

fn looks_like_photo(img: ElementRef<'_>) -> bool {
    let attr_has = |name: &str, needles: &[&str]| {
        img.value().attr(name).is_some_and(|value| {
            let value = value.to_ascii_lowercase();
            needles.iter().any(|needle| value.contains(needle))
        })
    };
    attr_has("src", &["dog", "photo", "image", "pic"])
        || attr_has("alt", &["dog", "photo", "picture"])
        || attr_has("class", &["dog", "photo", "main", "profile"])
        || attr_has("id", &["dog", "photo", "main", "profile"])
}

fn content_images(html: &Html) -> Vec<ElementRef<'_>> {
    let areas: Vec<_> = dom::elements(html.root_element())
        .filter(|el| matches!(el.value().name(), "div" | "section" | "article"))
        .filter(|el| dom::class_matches(*el, &CONTENT_MARKERS))
        .collect();
    if areas.is_empty() {
        return html.select(&dom::IMG).collect();
    }
    areas
        .into_iter()
        .flat_map(|area| area.select(&dom::IMG))
        .collect()
}

fn image_source<'a>(img: ElementRef<'a>) -> Option<&'a str> {
    ["src", "data-src"]
        .into_iter()
        .filter_map(|name| img.value().attr(name))
        .map(str::trim)
        .find(|src| !src.is_empty())
}

/// Declared width or height below the minimum; undeclared sizes pass.
fn is_tiny(img: ElementRef<'_>) -> bool {
    ["width", "height"].into_iter().any(|name| {
        img.value()
            .attr(name)
            .and_then(|value| value.trim().trim_end_matches("px").parse::<u32>().ok())
            .is_some_and(|size| size < MIN_DIMENSION)
    })
}

fn has_image_extension(lower: &str) -> bool {
    let path = lower.split(['?', '#']).next().unwrap_or(lower);
    IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

fn photo(img: ElementRef<'_>, src: &str) -> ImageRef {
    ImageRef {
        url: src.to_string(),
        alt: img.value().attr("alt").unwrap_or_default().to_string(),
        kind: ImageKind::Photo,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_check_ignores_query() {
        assert!(has_image_extension("/photos/12.jpg?w=300"));
        assert!(!has_image_extension("/photos/12.aspx"));
    }
}
