//! Electrode label <-> grid position lookup for 12 x 12 MEA layouts.
//!
//! Labels are a column letter followed by a 1-based row number ("h11").
//! The letter `I` is skipped, so columns run `A..H, J..M`.
use once_cell::sync::Lazy;

use super::error::MeaError;

pub const GRID_COLUMNS: usize = 12;
pub const GRID_ROWS: usize = 12;

const COLUMN_LETTERS: [char; GRID_COLUMNS] =
    ['a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'j', 'k', 'l', 'm'];

/// Positions present on a 120-electrode array: the full grid minus six
/// sites in each corner.
static MEA120_LAYOUT: Lazy<Vec<(String, (usize, usize))>> = Lazy::new(|| {
    let mut layout = Vec::with_capacity(120);
    for col in 0..GRID_COLUMNS {
        for row in 0..GRID_ROWS {
            if is_mea120_site(col, row) {
                layout.push((electrode_name(col, row), (col, row)));
            }
        }
    }
    layout
});

fn is_mea120_site(col: usize, row: usize) -> bool {
    let dx = col.min(GRID_COLUMNS - 1 - col);
    let dy = row.min(GRID_ROWS - 1 - row);
    dx + dy >= 3
}

pub fn coordinates_for_electrode(name: &str) -> Result<(usize, usize), MeaError> {
    let unknown = || MeaError::UnknownElectrode(name.to_owned());
    let mut chars = name.chars();
    let letter = chars.next().ok_or_else(unknown)?.to_ascii_lowercase();
    let col = COLUMN_LETTERS
        .iter()
        .position(|&c| c == letter)
        .ok_or_else(unknown)?;
    // Canonical row numbers only, so each label names exactly one cell.
    let digits = chars.as_str();
    let canonical = matches!(digits.len(), 1 | 2)
        && digits.bytes().all(|b| b.is_ascii_digit())
        && !digits.starts_with('0');
    if !canonical {
        return Err(unknown());
    }
    let row: usize = digits.parse().map_err(|_| unknown())?;
    if row > GRID_ROWS {
        return Err(unknown());
    }
    Ok((col, row - 1))
}

pub fn electrode_name(col: usize, row: usize) -> String {
    format!("{}{}", COLUMN_LETTERS[col % GRID_COLUMNS], row + 1)
}

/// Label of the cell at `(col, row)`, if the position lies on the grid.
pub fn electrode_at(col: usize, row: usize) -> Option<String> {
    (col < GRID_COLUMNS && row < GRID_ROWS).then(|| electrode_name(col, row))
}

/// The 120 standard sites in column-major order.
pub fn mea120_layout() -> &'static [(String, (usize, usize))] {
    &MEA120_LAYOUT
}
