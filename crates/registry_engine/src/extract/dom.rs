//! Small traversal helpers over `scraper` trees, modelled on the
//! find / find_next / next-sibling moves the registry pages need.

use std::sync::LazyLock;

use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

/// Tags whose text is never page content.
const NON_CONTENT_TAGS: [&str; 3] = ["script", "style", "noscript"];

fn css(query: &str) -> Selector {
    Selector::parse(query).expect("invalid selector")
}

pub(crate) static ANCHOR: LazyLock<Selector> = LazyLock::new(|| css("a"));
pub(crate) static DL: LazyLock<Selector> = LazyLock::new(|| css("dl"));
pub(crate) static DT: LazyLock<Selector> = LazyLock::new(|| css("dt"));
pub(crate) static DD: LazyLock<Selector> = LazyLock::new(|| css("dd"));
pub(crate) static IMG: LazyLock<Selector> = LazyLock::new(|| css("img"));
pub(crate) static NAMED_INPUT: LazyLock<Selector> = LazyLock::new(|| css("input[name]"));
pub(crate) static SPAN: LazyLock<Selector> = LazyLock::new(|| css("span"));
pub(crate) static TABLE: LazyLock<Selector> = LazyLock::new(|| css("table"));
pub(crate) static TH: LazyLock<Selector> = LazyLock::new(|| css("th"));
pub(crate) static TITLE: LazyLock<Selector> = LazyLock::new(|| css("title"));
pub(crate) static TR: LazyLock<Selector> = LazyLock::new(|| css("tr"));

/// `root` and all of its element descendants in document order.
pub(crate) fn elements<'a>(root: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    root.descendants().filter_map(ElementRef::wrap)
}

/// Direct element children whose tag is one of `tags`.
pub(crate) fn child_cells<'a>(row: ElementRef<'a>, tags: &[&str]) -> Vec<ElementRef<'a>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|el| tags.iter().any(|tag| el.value().name().eq_ignore_ascii_case(tag)))
        .collect()
}

/// Rows of `table` itself, skipping rows of nested tables.
pub(crate) fn own_rows<'a>(table: ElementRef<'a>) -> Vec<ElementRef<'a>> {
    table
        .select(&TR)
        .filter(|row| {
            row.ancestors()
                .filter_map(ElementRef::wrap)
                .find(|el| el.value().name() == "table")
                .is_some_and(|owner| owner.id() == table.id())
        })
        .collect()
}

/// Case-insensitive substring match of any marker against the class attribute.
pub(crate) fn class_matches(el: ElementRef<'_>, markers: &[&str]) -> bool {
    el.value().attr("class").is_some_and(|class| {
        let class = class.to_ascii_lowercase();
        markers.iter().any(|marker| class.contains(marker))
    })
}

/// Visible text with NBSP folded and whitespace runs collapsed.
pub(crate) fn clean_text(el: ElementRef<'_>) -> String {
    let raw: String = el.text().collect();
    collapse_whitespace(&raw)
}

pub(crate) fn collapse_whitespace(raw: &str) -> String {
    raw.replace('\u{a0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Non-empty, trimmed `href` of an element.
pub(crate) fn href<'a>(el: ElementRef<'a>) -> Option<&'a str> {
    el.value()
        .attr("href")
        .map(str::trim)
        .filter(|href| !href.is_empty())
}

/// First anchor inside `el` (or `el` itself) carrying an href.
pub(crate) fn first_link<'a>(el: ElementRef<'a>) -> Option<ElementRef<'a>> {
    elements(el).find(|a| a.value().name() == "a" && href(*a).is_some())
}

pub(crate) fn next_element_sibling<'a>(el: ElementRef<'a>) -> Option<ElementRef<'a>> {
    el.next_siblings().find_map(ElementRef::wrap)
}

/// Nearest element enclosing a text node.
pub(crate) fn parent_element<'a>(node: NodeRef<'a, Node>) -> Option<ElementRef<'a>> {
    node.ancestors().find_map(ElementRef::wrap)
}

/// Every element after `node` in document order, starting with its own descendants.
pub(crate) fn following_elements<'a>(
    html: &'a Html,
    node: NodeRef<'a, Node>,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    let id = node.id();
    html.tree
        .root()
        .descendants()
        .skip_while(move |candidate| candidate.id() != id)
        .skip(1)
        .filter_map(ElementRef::wrap)
}

/// Content text nodes in document order, with their raw text.
pub(crate) fn text_nodes<'a>(
    html: &'a Html,
) -> impl Iterator<Item = (NodeRef<'a, Node>, &'a str)> + 'a {
    html.tree.root().descendants().filter_map(|node| match node.value() {
        Node::Text(text) if !inside_non_content(node) => Some((node, &**text)),
        _ => None,
    })
}

/// First content text node accepted by `predicate`, compared on its trimmed,
/// lowercased text. Text inside links is skipped: labels are never anchors.
pub(crate) fn find_label<'a>(
    html: &'a Html,
    predicate: impl Fn(&str) -> bool,
) -> Option<NodeRef<'a, Node>> {
    text_nodes(html)
        .filter(|(node, _)| parent_element(*node).is_some_and(|p| p.value().name() != "a"))
        .find(|(_, text)| predicate(&collapse_whitespace(text).to_lowercase()))
        .map(|(node, _)| node)
}

/// All content text of the page joined by spaces.
pub(crate) fn page_text(html: &Html) -> String {
    text_nodes(html)
        .map(|(_, text)| text.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn inside_non_content(node: NodeRef<'_, Node>) -> bool {
    node.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|el| NON_CONTENT_TAGS.contains(&el.value().name()))
}
