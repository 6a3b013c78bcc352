//! Table formatting for query results.

use comfy_table::{
    Attribute, Cell, CellAlignment, ContentArrangement, Table, modifiers::UTF8_ROUND_CORNERS,
    presets::UTF8_FULL,
};

use crate::service::Match;

/// Longest text shown in a table cell before it is cut with an ellipsis.
const MAX_TEXT_CHARS: usize = 80;

/// Render ranked matches as a table: rank, row position, distance, text.
pub fn create_match_table(matches: &[Match<'_>]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.apply_modifier(UTF8_ROUND_CORNERS);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("#").add_attribute(Attribute::Bold),
        Cell::new("Row").add_attribute(Attribute::Bold),
        Cell::new("Distance").add_attribute(Attribute::Bold),
        Cell::new("Text").add_attribute(Attribute::Bold),
    ]);

    for (rank, m) in matches.iter().enumerate() {
        table.add_row(vec![
            Cell::new(rank + 1).set_alignment(CellAlignment::Right),
            Cell::new(m.record.position).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.4}", m.distance.get())).set_alignment(CellAlignment::Right),
            Cell::new(truncate(&m.record.text, MAX_TEXT_CHARS)),
        ]);
    }

    table.to_string()
}

fn truncate(text: &str, max_chars: usize) -> String {
    let single_line = text.replace(['\r', '\n'], " ");
    if single_line.chars().count() <= max_chars {
        return single_line;
    }
    let cut: String = single_line.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{cut}…")
}
