use registry_core::{has_content, Record};
use scraper::{ElementRef, Html};

use super::dom;
use super::normalize::normalize_key;
use super::pagination::PAGER_MARKERS;

/// Class fragments that mark a results grid (ASP.NET GridView uses `mGrid`).
const GRID_MARKERS: [&str; 4] = ["mgrid", "grid", "results", "data"];

/// Rows of every results grid on the page, concatenated in document order.
///
/// Tables whose class looks like a grid are preferred; when none exist, any
/// table with a `<th>` is used instead. The site sometimes splits one result
/// set across several tables, so all candidates contribute.
pub fn extract_grid_records(html: &Html) -> Vec<Record> {
    grid_tables(html)
        .into_iter()
        .flat_map(table_records)
        .collect()
}

fn grid_tables(html: &Html) -> Vec<ElementRef<'_>> {
    let tables: Vec<_> = html.select(&dom::TABLE).collect();
    let marked: Vec<_> = tables
        .iter()
        .copied()
        .filter(|table| dom::class_matches(*table, &GRID_MARKERS))
        .collect();
    if !marked.is_empty() {
        return marked;
    }
    tables
        .into_iter()
        .filter(|table| table.select(&dom::TH).next().is_some())
        .collect()
}

/// Records of one table, pager rows left out.
///
/// The header is the first row with `<th>` cells, or else the first row; the
/// rows after it are zipped against its keys.
pub fn table_records(table: ElementRef<'_>) -> Vec<Record> {
    let rows: Vec<_> = dom::own_rows(table)
        .into_iter()
        .filter(|row| !dom::class_matches(*row, &PAGER_MARKERS))
        .collect();
    let header_at = rows
        .iter()
        .position(|row| !dom::child_cells(*row, &["th"]).is_empty())
        .unwrap_or(0);
    let Some((header, body)) = rows[header_at..].split_first() else {
        return Vec::new();
    };
    if body.is_empty() {
        return Vec::new();
    }
    let keys = header_keys(*header);
    if keys.is_empty() {
        return Vec::new();
    }
    body.iter()
        .filter_map(|row| row_record(*row, &keys))
        .collect()
}

/// Normalized header keys; blank headers, and headers that normalize to a key
/// already taken in this row ("Reg" and "Reg #"), become `column_{n}`.
fn header_keys(row: ElementRef<'_>) -> Vec<String> {
    let mut cells = dom::child_cells(row, &["th"]);
    if cells.is_empty() {
        cells = dom::child_cells(row, &["td"]);
    }
    let mut keys: Vec<String> = Vec::with_capacity(cells.len());
    for (index, cell) in cells.into_iter().enumerate() {
        let key = normalize_key(&dom::clean_text(cell));
        if key.is_empty() || keys.contains(&key) {
            keys.push(format!("column_{}", index + 1));
        } else {
            keys.push(key);
        }
    }
    keys
}

fn row_record(row: ElementRef<'_>, keys: &[String]) -> Option<Record> {
    let cells = dom::child_cells(row, &["td"]);
    if cells.is_empty() {
        return None;
    }
    let mut record = Record::new();
    // zip drops surplus cells; short rows leave trailing keys unset
    for (key, cell) in keys.iter().zip(cells) {
        record.insert(key.clone(), dom::clean_text(cell));
        if let Some(href) = dom::first_link(cell).and_then(dom::href) {
            record.insert(format!("{key}_link"), href.to_string());
        }
    }
    has_content(&record).then_some(record)
}
