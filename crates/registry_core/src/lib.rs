//! Registry core: IO-free domain logic shared by the engine and the app.
mod ids;
mod record;
mod search;
mod site;

pub use ids::{extract_id, normalize_id, RecordKind, SeenIds, ID_PARAMS};
pub use record::{dedupe_rows, has_content, Record};
pub use search::{SearchQuery, ALPHABET, CANADIAN_PROVINCES, US_STATES};
pub use site::{SearchTarget, SiteConfig};
