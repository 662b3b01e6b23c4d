use scraper::{ElementRef, Html};

use super::dom;
use crate::PaginationCursor;

/// Class fragments of pager containers (`pgr` is the GridView pager row).
pub(crate) const PAGER_MARKERS: [&str; 2] = ["pag", "pgr"];

const PAGER_TAGS: [&str; 6] = ["div", "span", "nav", "ul", "tr", "td"];
const CURRENT_MARKERS: [&str; 3] = ["current", "active", "selected"];
const NEXT_GLYPHS: [char; 4] = ['>', '›', '»', '→'];

/// Reads the pager of a results page.
///
/// Never fails: without a pager the cursor says page 1 of 1 with no next link.
pub fn extract_pagination(html: &Html) -> PaginationCursor {
    let mut cursor = PaginationCursor::default();
    let Some(pager) = find_pager(html) else {
        return cursor;
    };

    if let Some(current) = current_page(pager) {
        cursor.current_page = current;
    }

    let links: Vec<ElementRef<'_>> = pager.select(&dom::ANCHOR).collect();
    cursor.total_pages = links
        .iter()
        .filter_map(|link| dom::clean_text(*link).parse::<u32>().ok())
        .fold(cursor.total_pages.max(cursor.current_page), u32::max);

    let next = links
        .iter()
        .find(|link| is_next_label(&dom::clean_text(**link)))
        .and_then(|link| dom::href(*link));
    if let Some(href) = next {
        cursor.has_next = true;
        cursor.next_page_link = Some(href.to_string());
    }
    cursor
}

/// First pager-looking element holding links that does not wrap another such
/// element. A page-wide `class="page-body"` wrapper loses to the pager inside
/// it, and a link-less `class="page-info"` label loses to the pager around it.
///
/// When no candidate has links, the first innermost one still gives the page
/// number.
fn find_pager(html: &Html) -> Option<ElementRef<'_>> {
    let candidates: Vec<_> = dom::elements(html.root_element())
        .filter(|el| is_pager(*el))
        .collect();
    let innermost = |linked_only: bool| {
        candidates.iter().copied().find(|candidate| {
            let eligible = |el: ElementRef<'_>| is_pager(el) && (!linked_only || has_links(el));
            eligible(*candidate) && !dom::elements(*candidate).skip(1).any(eligible)
        })
    };
    innermost(true).or_else(|| innermost(false))
}

fn is_pager(el: ElementRef<'_>) -> bool {
    PAGER_TAGS.contains(&el.value().name()) && dom::class_matches(el, &PAGER_MARKERS)
}

fn has_links(el: ElementRef<'_>) -> bool {
    el.select(&dom::ANCHOR).next().is_some()
}

/// Page number of the element marked current, or else of a bare numeric
/// `<span>` (GridView renders the current page unlinked).
fn current_page(pager: ElementRef<'_>) -> Option<u32> {
    let marked = dom::elements(pager).find(|el| {
        matches!(el.value().name(), "span" | "strong" | "li" | "a")
            && dom::class_matches(*el, &CURRENT_MARKERS)
    });
    if let Some(marked) = marked {
        return dom::clean_text(marked).parse().ok();
    }
    pager
        .select(&dom::SPAN)
        .filter(|span| !has_links(*span))
        .find_map(|span| dom::clean_text(span).parse().ok())
}

fn is_next_label(text: &str) -> bool {
    let lower = text.to_lowercase();
    if lower.contains("next") {
        return true;
    }
    !text.is_empty() && text.chars().all(|c| NEXT_GLYPHS.contains(&c) || c.is_whitespace())
}
