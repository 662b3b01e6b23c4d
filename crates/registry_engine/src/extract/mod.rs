//! Record extraction from parsed registry pages.
//!
//! Nothing in here fails: a page missing the expected structure simply
//! produces fewer fields, fewer records, or a default pagination cursor.
pub(crate) mod dom;

mod detail;
mod grid;
mod images;
mod normalize;
mod pages;
mod pagination;

pub use detail::{extract_detail_record, DetailStrategy, DETAIL_STRATEGIES, HEALTH_KEYWORDS};
pub use grid::{extract_grid_records, table_records};
pub use images::{extract_image_refs, ImageKind, ImageRef};
pub use normalize::normalize_key;
pub use pages::{
    extract_certifications, extract_dog_record, extract_litter_detail, extract_person_record,
    Certification, LitterDetail, NamedLink,
};
pub use pagination::extract_pagination;
