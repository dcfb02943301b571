//! Paginated cabin deck plans for a sailing's occupants.
//!
//! `layout` turns an occupant list into fixed two-column pages with a corridor
//! between the columns; `render_text` prints those pages for a fixed-width
//! print backend. Both are pure functions of their input.

pub mod grid;
pub mod text;

pub use grid::{layout, page_count, CabinCell, Cell, Corridor, LayoutOptions, Page, PageHeader};
pub use text::render_text;
