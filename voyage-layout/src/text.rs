use crate::grid::{Cell, Page};

const CELL_WIDTH: usize = 22;
const CELL_LINES: usize = 5;
/// Border line plus content lines
const ROW_HEIGHT: usize = CELL_LINES + 1;
const FORM_FEED: char = '\u{c}';

fn fit(text: &str) -> String {
    let mut out: String = text.chars().take(CELL_WIDTH).collect();
    let len = out.chars().count();
    out.extend(std::iter::repeat(' ').take(CELL_WIDTH - len));
    out
}

fn border() -> String {
    format!("+{}+", "-".repeat(CELL_WIDTH))
}

fn cell_lines(cell: &Cell) -> [String; CELL_LINES] {
    match cell {
        Cell::Empty => std::array::from_fn(|_| fit("")),
        Cell::Occupied(c) => [
            fit(&format!("{:<5}| {}", c.cabin_number, c.type_label)),
            fit(&c.guest_name),
            fit(&c.phone),
            fit(&format!("Adults: {}  Children: {}", c.adults, c.children)),
            fit(&format!("Advance: {}", c.advance_paid)),
        ],
    }
}

fn render_page(page: &Page) -> String {
    let height = page.rows.len() * ROW_HEIGHT + 1;
    let label: Vec<char> = page.corridor.label.chars().collect();
    let boundary = (page.corridor.after_row + 1) * ROW_HEIGHT;
    let label_start = boundary.saturating_sub(label.len() / 2);

    let gutter = |line: usize| -> String {
        match line.checked_sub(label_start).and_then(|i| label.get(i)) {
            Some(ch) => format!("  {}  ", ch),
            None => "  :  ".to_string(),
        }
    };

    let mut lines = Vec::with_capacity(height + 2);
    lines.push(format!(
        "{}  (page {} of {})",
        page.header.title, page.header.page_number, page.header.page_count
    ));
    lines.push(String::new());

    let mut line_no = 0;
    for [left, right] in &page.rows {
        lines.push(format!("{}{}{}", border(), gutter(line_no), border()));
        line_no += 1;

        let (l, r) = (cell_lines(left), cell_lines(right));
        for (a, b) in l.iter().zip(r.iter()) {
            lines.push(format!("|{}|{}|{}|", a, gutter(line_no), b));
            line_no += 1;
        }
    }
    lines.push(format!("{}{}{}", border(), gutter(line_no), border()));

    lines.join("\n")
}

/// Draw pages as bordered text boxes with the corridor label spelled
/// vertically in the gutter. Pages are separated by a form feed.
pub fn render_text(pages: &[Page]) -> String {
    let mut out = String::new();
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            out.push(FORM_FEED);
        }
        out.push_str(&render_page(page));
        out.push('\n');
    }
    out
}
