//! Overlays describing where the next setup should leave room for a spin or a
//! tetris.
//!
//! An overlay is a grid of [`MARGIN`] (anything goes), [`FILL`] (must be
//! filled) and [`EMPTY`] (must stay empty). Spin overlays open to the left by
//! default, with the overhang on the right; `mirror` flips them. Every
//! generator returns `None` when the shape does not fit in the requested
//! height or width.

use crate::data::{Cell, EMPTY, FILL, MARGIN, WIDTH};
use crate::field::Grid;
use crate::fumen::{self, FumenError};

/// Solver arguments for spin setups: hold allowed, every piece but `T`.
pub const SPIN_ARGS: &str = "-m o -f i -p [^T]!";
/// Solver arguments for tetris setups: any seven pieces.
pub const TETRIS_ARGS: &str = "-m o -f i -p *p7";

/// Rows a spin setup is searched in. One bag cannot stack higher.
pub const SPIN_HEIGHT: usize = 6;
pub const TETRIS_HEIGHT: usize = 7;

type Shape = &'static [&'static [Cell]];

// Shapes are listed bottom row first.
const TSPIN: Shape = &[&[FILL, EMPTY, FILL], &[EMPTY, EMPTY, EMPTY], &[EMPTY, EMPTY, FILL]];
// The extra column on the open side keeps the mirrored shape aligned; a T
// cannot be spun in that close to the wall anyway.
const TST: Shape = &[
    &[FILL, FILL, EMPTY],
    &[FILL, EMPTY, EMPTY],
    &[FILL, FILL, EMPTY],
    &[EMPTY, EMPTY, EMPTY],
    &[EMPTY, EMPTY, FILL],
];
const WELL: Shape = &[&[EMPTY], &[EMPTY], &[EMPTY], &[EMPTY]];

/// A `height`-row overlay of margin cells with `cleared_rows` set to fill,
/// then `shape` stamped with its bottom-left corner at `(x, y)`.
pub fn generate_setup(
    height: usize,
    cleared_rows: &[i32],
    shape: &[&[Cell]],
    x: i32,
    y: i32,
    mirror: bool,
) -> Option<Grid> {
    let mut grid = Grid::from_rows(vec![[MARGIN; WIDTH]; height]);
    for &row in cleared_rows {
        for cx in 0..WIDTH as i32 {
            if !grid.set(cx, row, FILL) {
                return None;
            }
        }
    }
    for (dy, row) in shape.iter().enumerate() {
        for dx in 0..row.len() {
            let c = if mirror { row[row.len() - 1 - dx] } else { row[dx] };
            if !grid.set(x + dx as i32, y + dy as i32, c) {
                return None;
            }
        }
    }
    Some(grid)
}

/// Clear `cols` from row `from` to the top so a piece can be dropped in.
fn open_columns(grid: &mut Grid, cols: &[i32], from: i32) -> Option<()> {
    for y in from..grid.height() as i32 {
        for &x in cols {
            if !grid.set(x, y, EMPTY) {
                return None;
            }
        }
    }
    Some(())
}

/// Spin slot with the T centred on `(x, y)`.
fn spin(
    height: usize,
    cleared_rows: &[i32],
    shape: Shape,
    x: i32,
    y: i32,
    mirror: bool,
) -> Option<Grid> {
    let mut grid = generate_setup(height, cleared_rows, shape, x - 1, y - 1, mirror)?;
    let side = if mirror { x + 1 } else { x - 1 };
    open_columns(&mut grid, &[side, x], y + 2)?;
    Some(grid)
}

pub fn tss1(height: usize, x: i32, y: i32, mirror: bool) -> Option<Grid> {
    spin(height, &[y - 1], TSPIN, x, y, mirror)
}

pub fn tss2(height: usize, x: i32, y: i32, mirror: bool) -> Option<Grid> {
    spin(height, &[y], TSPIN, x, y, mirror)
}

pub fn tsd(height: usize, x: i32, y: i32, mirror: bool) -> Option<Grid> {
    spin(height, &[y - 1, y], TSPIN, x, y, mirror)
}

pub fn tst(height: usize, x: i32, y: i32, mirror: bool) -> Option<Grid> {
    spin(height, &[y - 1, y, y + 1], TST, x, y, mirror)
}

/// Four filled rows from `y` with a well in column `x`, open to the top.
pub fn tetris(height: usize, x: i32, y: i32) -> Option<Grid> {
    let rows: Vec<i32> = (y..y + 4).collect();
    let mut grid = generate_setup(height, &rows, WELL, x, y, false)?;
    open_columns(&mut grid, &[x], y + 4)?;
    Some(grid)
}

/// Encode a field, overlay applied, in the colours the solver reads.
pub fn solver_fumen(field: &Grid, args: &str) -> Result<String, FumenError> {
    fumen::encode([(&field.to_solver_colors(), args)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tsd_slot() {
        let left = tsd(6, 2, 1, false).unwrap();
        assert_eq!(
            left.diagram(),
            ".__.......\n\
             .__.......\n\
             .__.......\n\
             .__*......\n\
             *___******\n\
             **_*******"
        );
        let right = tsd(6, 2, 1, true).unwrap();
        assert_eq!(
            right.diagram(),
            "..__......\n\
             ..__......\n\
             ..__......\n\
             .*__......\n\
             *___******\n\
             **_*******"
        );
        assert_eq!(
            solver_fumen(&left, SPIN_ARGS).unwrap(),
            "v115@pgQpBeXpBeXpBeXpBewhVpwhCe3hAe2hJeAgWkAtD9?8AwG98AwzVTASocTASodOEFbcRAVDEHBleEHBEoA6A"
        );
    }

    #[test]
    fn single_slots() {
        assert_eq!(
            tss1(6, 4, 1, false).unwrap().diagram(),
            "...__.....\n\
             ...__.....\n\
             ...__.....\n\
             ...__*....\n\
             ...___....\n\
             ****_*****"
        );
        assert_eq!(
            tss2(6, 4, 1, true).unwrap().diagram(),
            "....__....\n\
             ....__....\n\
             ....__....\n\
             ...*__....\n\
             ***___****\n\
             ...*_*...."
        );
    }

    #[test]
    fn triple_slots() {
        assert_eq!(
            tst(6, 1, 1, false).unwrap().diagram(),
            "__........\n\
             __*.......\n\
             ___.......\n\
             **_*******\n\
             *__*******\n\
             **_*******"
        );
        assert_eq!(
            tst(6, 8, 1, true).unwrap().diagram(),
            "........__\n\
             .......*__\n\
             .......___\n\
             *******_**\n\
             *******__*\n\
             *******_**"
        );
    }

    #[test]
    fn tetris_well() {
        let well = tetris(7, 9, 0).unwrap();
        assert_eq!(
            well.diagram(),
            "........._\n\
             ........._\n\
             ........._\n\
             *********_\n\
             *********_\n\
             *********_\n\
             *********_"
        );
        assert_eq!(
            solver_fumen(&well, TETRIS_ARGS).unwrap(),
            "v115@fgYpAeYpAeYpAe4hAe4hAe4hAe4hKeAgWcAtD98AwG?98AwzVTASocTASodOEFbcRAyxcQB"
        );
    }

    #[test]
    fn shapes_off_the_board_do_not_fit() {
        assert_eq!(tsd(6, 0, 1, false), None);
        assert_eq!(tsd(6, 9, 1, true), None);
        assert_eq!(tsd(6, 4, 0, false), None);
        assert_eq!(tst(4, 4, 1, false), None);
        assert_eq!(tetris(3, 0, 0), None);
        assert_eq!(tetris(7, 10, 0), None);
    }
}
