use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use voyage_booking::BookingView;

pub const TYPE_LABEL_MAX: usize = 15;
pub const GUEST_NAME_MAX: usize = 14;
pub const CORRIDOR_LABEL: &str = "CORRIDOR";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayoutOptions {
    /// Cells per page, two per row
    pub page_capacity: usize,
    pub title: String,
    pub currency_symbol: String,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            page_capacity: 16,
            title: "Cabin Layout".to_string(),
            currency_symbol: "৳".to_string(),
        }
    }
}

impl LayoutOptions {
    /// Capacity rounded up to a whole number of two-cell rows, never below one row.
    pub fn capacity(&self) -> usize {
        let cap = self.page_capacity.max(2);
        cap + cap % 2
    }

    pub fn rows(&self) -> usize {
        self.capacity() / 2
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PageHeader {
    pub title: String,
    pub page_number: usize,
    pub page_count: usize,
}

/// Vertical gutter between the columns. The label is centered on the
/// boundary below row `after_row`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Corridor {
    pub label: String,
    pub after_row: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CabinCell {
    pub cabin_number: String,
    pub type_label: String,
    pub guest_name: String,
    pub phone: String,
    pub adults: i32,
    pub children: i32,
    pub advance_paid: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Cell {
    Empty,
    Occupied(CabinCell),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Page {
    pub header: PageHeader,
    /// Each row is `[left, right]`
    pub rows: Vec<[Cell; 2]>,
    pub corridor: Corridor,
}

impl Page {
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.rows.iter().flat_map(|row| row.iter())
    }

    pub fn occupied(&self) -> usize {
        self.cells().filter(|c| !c.is_empty()).count()
    }
}

pub fn page_count(occupants: usize, options: &LayoutOptions) -> usize {
    occupants.max(1).div_ceil(options.capacity())
}

/// Hard character cut, not word aware.
fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

pub fn format_amount(symbol: &str, amount: Decimal) -> String {
    format!("{}{:.2}", symbol, amount)
}

fn cabin_cell(view: &BookingView, options: &LayoutOptions) -> CabinCell {
    let booking = &view.booking;
    CabinCell {
        cabin_number: view.room_number.clone().unwrap_or_else(|| "-".to_string()),
        type_label: truncate(view.room_type.as_deref().unwrap_or_default(), TYPE_LABEL_MAX),
        guest_name: truncate(&booking.name, GUEST_NAME_MAX),
        phone: booking.phone.clone(),
        adults: booking.adult_count.max(0),
        children: booking.child_count.max(0),
        advance_paid: format_amount(&options.currency_symbol, booking.paid_amount),
    }
}

/// Place occupants row by row, left cell then right, starting a new page when
/// one fills up. Unfilled cells are kept as `Cell::Empty`.
pub fn layout(occupants: &[BookingView], options: &LayoutOptions) -> Vec<Page> {
    let capacity = options.capacity();
    let rows = options.rows();
    let count = page_count(occupants.len(), options);
    debug!("Laying out {} occupants on {} page(s)", occupants.len(), count);

    (0..count)
        .map(|page_index| {
            let start = page_index * capacity;
            let mut cells: Vec<Cell> = occupants
                .iter()
                .skip(start)
                .take(capacity)
                .map(|v| Cell::Occupied(cabin_cell(v, options)))
                .collect();
            cells.resize(capacity, Cell::Empty);

            let mut iter = cells.into_iter();
            let grid = (0..rows)
                .map(|_| {
                    let left = iter.next().unwrap_or(Cell::Empty);
                    let right = iter.next().unwrap_or(Cell::Empty);
                    [left, right]
                })
                .collect();

            Page {
                header: PageHeader {
                    title: options.title.clone(),
                    page_number: page_index + 1,
                    page_count: count,
                },
                rows: grid,
                corridor: Corridor {
                    label: CORRIDOR_LABEL.to_string(),
                    after_row: (rows / 2).saturating_sub(1),
                },
            }
        })
        .collect()
}
