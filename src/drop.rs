use crate::catalog::CATALOG;
use crate::data::{Placement, EMPTY};
use crate::field::Grid;

/// Whether `placement` can be reached by dropping the piece straight down from
/// above the board, without rotating or sliding on the way.
///
/// The piece must be in bounds, overlap nothing, rest on the floor or a filled
/// cell, and have nothing above it in any column it occupies. The grid is
/// never modified; use [`place_piece`] once this returns true.
pub fn can_hard_drop(placement: Placement, grid: &Grid) -> bool {
    let mut supported = false;
    // highest block per bounding box column
    let mut highest = [-1i8; 4];

    for (dx, dy) in CATALOG.cells(placement.piece, placement.rotation) {
        let x = placement.x as i32 + dx as i32;
        let y = placement.y as i32 + dy as i32;
        match grid.get(x, y) {
            Some(EMPTY) => {}
            // out of bounds, including above the top row, or occupied
            _ => return false,
        }
        if y == 0 || grid.is_filled(x, y - 1) {
            supported = true;
        }
        highest[dx as usize] = highest[dx as usize].max(dy);
    }
    if !supported {
        return false;
    }

    CATALOG
        .occupied_cols(placement.piece, placement.rotation)
        .iter()
        .all(|&col| {
            let x = placement.x as i32 + col as i32;
            let top = placement.y as i32 + highest[col as usize] as i32;
            (top + 1..grid.height() as i32).all(|y| !grid.is_filled(x, y))
        })
}

/// Write the piece's colour into every cell it covers. The placement should
/// already have been checked with [`can_hard_drop`]; cells outside the grid
/// are skipped.
pub fn place_piece(placement: Placement, grid: &mut Grid) {
    let color = placement.piece.color();
    for (x, y) in placement.cells() {
        grid.set(x, y, color);
    }
}

#[cfg(test)]
#[path = "drop-tests.rs"]
mod tests;
