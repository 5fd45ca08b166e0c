use serde::{Deserialize, Serialize};

use crate::data::{Cell, Piece, EMPTY, FILL, GARBAGE, MARGIN, SOLID, WIDTH};

pub type Row = [Cell; WIDTH];

pub const EMPTY_ROW: Row = [EMPTY; WIDTH];

/// A 10-wide board stored bottom row first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grid {
    rows: Vec<Row>,
    cleared_rows: u32,
}

/// How [`Grid::add_t`] orients the stamped T around its centre.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TStance {
    /// Flat side up, stem down.
    Flat,
    /// Stem pointing right.
    Vertical,
    /// Stem pointing left.
    VerticalMirror,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum GridError {
    #[error("unexpected character {0:?} in field diagram")]
    BadCharacter(char),
    #[error("field diagram has {0} cells, which is not a whole number of rows")]
    Ragged(usize),
}

const DIAGRAM_CHARS: [char; 4] = ['_', 'X', '*', '.'];

impl Grid {
    pub fn new(height: usize) -> Self {
        Grid {
            rows: vec![EMPTY_ROW; height],
            cleared_rows: 0,
        }
    }

    /// Build from rows listed bottom to top.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Grid {
            rows,
            cleared_rows: 0,
        }
    }

    /// Build from rows listed top to bottom, as diagrams present them.
    pub fn from_top_down(mut rows: Vec<Row>) -> Self {
        rows.reverse();
        Grid::from_rows(rows)
    }

    /// Parse a text diagram: `_` empty, `X` solid, `*` fill, `.` margin.
    ///
    /// Rows run top to bottom. Whitespace is ignored, so both
    /// newline-separated diagrams and unbroken strings of whole rows are accepted.
    pub fn parse_diagram(text: &str) -> Result<Self, GridError> {
        let cells = text
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| match DIAGRAM_CHARS.iter().position(|&d| d == c) {
                Some(v) => Ok(v as Cell),
                None => Err(GridError::BadCharacter(c)),
            })
            .collect::<Result<Vec<_>, _>>()?;
        if cells.len() % WIDTH != 0 {
            return Err(GridError::Ragged(cells.len()));
        }
        let rows = cells
            .chunks(WIDTH)
            .map(|c| {
                let mut row = EMPTY_ROW;
                row.copy_from_slice(c);
                row
            })
            .collect();
        Ok(Grid::from_top_down(rows))
    }

    /// Render with the characters [`Grid::parse_diagram`] accepts, top row first.
    /// Cells outside the diagram alphabet render as solid.
    pub fn diagram(&self) -> String {
        self.rows
            .iter()
            .rev()
            .map(|row| {
                row.iter()
                    .map(|&c| DIAGRAM_CHARS.get(c as usize).copied().unwrap_or('X'))
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Running total of rows removed by [`Grid::clear_rows`].
    pub fn cleared_rows(&self) -> u32 {
        self.cleared_rows
    }

    pub fn get(&self, x: i32, y: i32) -> Option<Cell> {
        if x < 0 || x >= WIDTH as i32 || y < 0 {
            return None;
        }
        self.rows.get(y as usize).map(|row| row[x as usize])
    }

    pub fn set(&mut self, x: i32, y: i32, cell: Cell) -> bool {
        if x < 0 || x >= WIDTH as i32 || y < 0 {
            return false;
        }
        match self.rows.get_mut(y as usize) {
            Some(row) => {
                row[x as usize] = cell;
                true
            }
            None => false,
        }
    }

    /// In bounds and non-empty.
    #[inline(always)]
    pub fn is_filled(&self, x: i32, y: i32) -> bool {
        matches!(self.get(x, y), Some(c) if c != EMPTY)
    }

    pub fn is_blank(&self) -> bool {
        self.rows.iter().all(|row| *row == EMPTY_ROW)
    }

    /// Pad with empty rows on top until the grid is at least `height` tall.
    pub fn extend_to(&mut self, height: usize) {
        if self.rows.len() < height {
            self.rows.resize(height, EMPTY_ROW);
        }
    }

    /// Remove every fully occupied row, returning how many were removed.
    pub fn clear_rows(&mut self) -> u32 {
        let before = self.rows.len();
        self.rows.retain(|row| row.iter().any(|&c| c == EMPTY));
        let cleared = (before - self.rows.len()) as u32;
        self.cleared_rows += cleared;
        cleared
    }

    /// Stamp a T centred on `(x, y)` without drop physics, then clear rows.
    ///
    /// Returns the number of rows this placement cleared, or `None` (leaving
    /// the grid untouched) if a stamped cell would fall outside the grid.
    pub fn add_t(&mut self, x: i32, y: i32, stance: TStance) -> Option<u32> {
        let cells = match stance {
            TStance::Flat => [(x - 1, y), (x, y), (x + 1, y), (x, y - 1)],
            TStance::Vertical => [(x, y + 1), (x, y), (x + 1, y), (x, y - 1)],
            TStance::VerticalMirror => [(x, y + 1), (x, y), (x - 1, y), (x, y - 1)],
        };
        if cells.iter().any(|&(cx, cy)| self.get(cx, cy).is_none()) {
            return None;
        }
        for (cx, cy) in cells {
            self.set(cx, cy, Piece::T.color());
        }
        Some(self.clear_rows())
    }

    /// Superimpose an overlay of `0` (must stay empty), `FILL` and `MARGIN`.
    ///
    /// Empty cells take the overlay value. An occupied cell under a `0`
    /// overlay cell fails the whole operation; cells written before the
    /// failure stay written, so callers should overlay a copy.
    pub fn add_overlay(&mut self, overlay: &Grid) -> bool {
        self.extend_to(overlay.height());
        for (row, over) in self.rows.iter_mut().zip(&overlay.rows) {
            for (cell, &o) in row.iter_mut().zip(over) {
                if *cell == EMPTY {
                    *cell = o;
                } else if o == EMPTY {
                    return false;
                }
            }
        }
        true
    }

    /// Left-right flip, swapping the colours of chiral pieces.
    pub fn mirrored(&self) -> Grid {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut flipped = *row;
                flipped.reverse();
                for c in &mut flipped {
                    if let Some(p) = Piece::from_color(*c) {
                        *c = p.mirrored().color();
                    }
                }
                flipped
            })
            .collect();
        Grid {
            rows,
            cleared_rows: self.cleared_rows,
        }
    }

    /// Every occupied cell becomes [`SOLID`].
    pub fn solidified(&self) -> Grid {
        let rows = self
            .rows
            .iter()
            .map(|row| row.map(|c| if c == EMPTY { EMPTY } else { SOLID }))
            .collect();
        Grid::from_rows(rows)
    }

    /// Recolour an uncoloured field for the solver: solid becomes garbage,
    /// fill becomes `I` and margin becomes `O`.
    pub fn to_solver_colors(&self) -> Grid {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                row.map(|c| match c {
                    EMPTY => EMPTY,
                    FILL => Piece::I.color(),
                    MARGIN => Piece::O.color(),
                    _ => GARBAGE,
                })
            })
            .collect();
        Grid::from_rows(rows)
    }

    /// Garbage kept, everything else emptied.
    pub fn garbage_only(&self) -> Grid {
        let rows = self
            .rows
            .iter()
            .map(|row| row.map(|c| if c == GARBAGE { GARBAGE } else { EMPTY }))
            .collect();
        Grid::from_rows(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(text: &str) -> Grid {
        Grid::parse_diagram(text).unwrap()
    }

    #[test]
    fn diagram_rows_are_stored_bottom_up() {
        let g = grid(
            "X_________
             XXXXXXXXX_",
        );
        assert_eq!(g.height(), 2);
        assert_eq!(g.get(0, 1), Some(SOLID));
        assert_eq!(g.get(1, 1), Some(EMPTY));
        assert_eq!(g.get(9, 0), Some(EMPTY));
        assert_eq!(g.get(10, 0), None);
        assert_eq!(g.get(0, 2), None);
        assert_eq!(g.diagram(), "X_________\nXXXXXXXXX_");

        let flat = grid("X_________XXXXXXXXX_");
        assert_eq!(flat, g);
        assert_eq!(Grid::parse_diagram("XXX"), Err(GridError::Ragged(3)));
        assert_eq!(
            Grid::parse_diagram("XXXXXXXXXQ"),
            Err(GridError::BadCharacter('Q'))
        );
    }

    #[test]
    fn clear_rows_counts_and_is_idempotent() {
        let mut g = grid(
            "X_________
             XXXXXXXXXX
             XX_XXXXXXX
             XXXXXXXXXX",
        );
        assert_eq!(g.clear_rows(), 2);
        assert_eq!(g.height(), 2);
        assert_eq!(g.cleared_rows(), 2);
        let once = g.clone();
        assert_eq!(g.clear_rows(), 0);
        assert_eq!(g, once);
    }

    #[test]
    fn flat_t_clears_two_rows() {
        // T-spin double slot centred on column 2, row 1.
        let mut g = grid(
            "XX________
             X___XXXXXX
             XX_XXXXXXX",
        );
        assert_eq!(g.add_t(2, 1, TStance::Flat), Some(2));
        assert_eq!(g.height(), 1);
        assert_eq!(g.cleared_rows(), 2);
    }

    #[test]
    fn vertical_t_clears_one_row() {
        let mut g = grid(
            "__________
             __XXXXXXXX
             _X_XXXXXXX",
        );
        assert_eq!(g.add_t(0, 1, TStance::Vertical), Some(1));
        assert_eq!(g.height(), 2);

        let mut m = grid(
            "__________
             XXXXXXXX__
             XXXXXXX_X_",
        );
        assert_eq!(m.add_t(9, 1, TStance::VerticalMirror), Some(1));
    }

    #[test]
    fn out_of_bounds_t_is_rejected() {
        let mut g = Grid::new(3);
        assert_eq!(g.add_t(0, 1, TStance::Flat), None);
        assert_eq!(g.add_t(5, 0, TStance::Flat), None);
        assert!(g.is_blank());
    }

    #[test]
    fn overlay_fills_empty_cells_only() {
        let mut g = grid("XX________");
        let overlay = grid(
            "..........
             **________",
        );
        assert!(g.add_overlay(&overlay));
        assert_eq!(g.height(), 2);
        assert_eq!(g.get(0, 0), Some(SOLID));
        assert_eq!(g.get(1, 0), Some(SOLID));
        assert_eq!(g.get(2, 0), Some(EMPTY));
        assert_eq!(g.get(4, 1), Some(MARGIN));

        let mut blocked = grid("XX________");
        assert!(!blocked.add_overlay(&grid("*_________")));
    }

    #[test]
    fn overlay_never_recolours_occupied_cells() {
        let mut g = Grid::from_rows(vec![[5, 0, 0, 0, 0, 0, 0, 0, 0, 7]]);
        let overlay = Grid::from_rows(vec![[FILL, MARGIN, 0, 0, 0, 0, 0, 0, 0, MARGIN]]);
        assert!(g.add_overlay(&overlay));
        assert_eq!(g.rows()[0], [5, MARGIN, 0, 0, 0, 0, 0, 0, 0, 7]);
    }

    #[test]
    fn mirror_swaps_colours_and_columns() {
        let g = Grid::from_rows(vec![[2, 4, 1, 0, 0, 0, 0, 0, 5, 8]]);
        let m = g.mirrored();
        assert_eq!(m.rows()[0], [8, 5, 0, 0, 0, 0, 0, 1, 7, 6]);
        assert_eq!(m.mirrored(), g);
    }

    #[test]
    fn solver_colours() {
        let g = grid("_X*.______");
        assert_eq!(
            g.to_solver_colors().rows()[0],
            [0, GARBAGE, 1, 3, 0, 0, 0, 0, 0, 0]
        );
        let coloured = Grid::from_rows(vec![[0, 5, 8, 3, 0, 0, 0, 0, 0, 1]]);
        assert_eq!(coloured.solidified().rows()[0], [0, 1, 1, 1, 0, 0, 0, 0, 0, 1]);
        assert_eq!(coloured.garbage_only().rows()[0], [0, 0, 8, 0, 0, 0, 0, 0, 0, 0]);
    }
}
