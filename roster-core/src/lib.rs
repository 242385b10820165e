//! Roster Core - Entity Types
//!
//! Pure data structures and algorithms with no I/O: identifiers, entities,
//! the error taxonomy, header normalization, the five-way distributor and
//! pagination math.

pub mod distribute;
pub mod entities;
pub mod enums;
pub mod error;
pub mod identity;
pub mod normalize;
pub mod pagination;

pub use distribute::{distribute, slice_sizes, AGENTS_PER_LIST};
pub use entities::*;
pub use enums::*;
pub use error::*;
pub use identity::*;
pub use normalize::{normalize_row, normalize_rows, HeaderFamily, RawRow};
pub use pagination::{PageInfo, Pagination, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
