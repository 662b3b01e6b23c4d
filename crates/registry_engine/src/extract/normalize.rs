/// Turns a column header or field label into a record key.
///
/// Lowercases, then collapses every run of non-alphanumeric characters
/// (whitespace, NBSP, slashes, colons, punctuation, underscores) into a single
/// `_`, with none left at either end: `"Reg. #/Name:"` becomes `"reg_name"`.
/// The result contains only lowercase alphanumerics and inner underscores, so
/// normalizing it again returns it unchanged.
///
/// Labels differing only in punctuation collide (`"Reg #"` and `"Reg"` both
/// give `"reg"`); grid headers resolve that per row in `grid::header_keys`.
pub fn normalize_key(raw: &str) -> String {
    let mut key = String::with_capacity(raw.len());
    let mut pending_separator = false;
    for ch in raw.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            if pending_separator && !key.is_empty() {
                key.push('_');
            }
            pending_separator = false;
            key.push(ch);
        } else {
            pending_separator = true;
        }
    }
    key
}
