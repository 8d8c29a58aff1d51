//! Database operations for the `locations` table.

mod read;
mod types;

pub use read::{
    bounding_box, build_search_query, count_locations, get_location, list_locations,
    search_locations, BoundingBox,
};
pub use types::LocationRow;
