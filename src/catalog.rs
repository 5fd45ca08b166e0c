//! Static piece shape tables.
//!
//! Each piece has four rotation matrices laid out bottom row first, so
//! `MATRICES[piece][rotation][y][x]` maps directly onto grid coordinates
//! relative to the bottom-left corner of the bounding box. Everything derived
//! from the matrices is computed at compile time into [`CATALOG`].

use std::ops::RangeInclusive;

use arrayvec::ArrayVec;

use crate::data::{Piece, Rotation};

type Matrix = [[u8; 4]; 4];

#[rustfmt::skip]
const MATRICES: [[Matrix; 4]; 7] = [
    // I
    [
        [[0, 0, 0, 0], [1, 1, 1, 1], [0, 0, 0, 0], [0, 0, 0, 0]],
        [[0, 0, 1, 0], [0, 0, 1, 0], [0, 0, 1, 0], [0, 0, 1, 0]],
        [[0, 0, 0, 0], [0, 0, 0, 0], [1, 1, 1, 1], [0, 0, 0, 0]],
        [[0, 1, 0, 0], [0, 1, 0, 0], [0, 1, 0, 0], [0, 1, 0, 0]],
    ],
    // L
    [
        [[1, 0, 0, 0], [1, 1, 1, 0], [0, 0, 0, 0], [0; 4]],
        [[0, 1, 1, 0], [0, 1, 0, 0], [0, 1, 0, 0], [0; 4]],
        [[0, 0, 0, 0], [1, 1, 1, 0], [0, 0, 1, 0], [0; 4]],
        [[0, 1, 0, 0], [0, 1, 0, 0], [1, 1, 0, 0], [0; 4]],
    ],
    // O
    [
        [[1, 1, 0, 0], [1, 1, 0, 0], [0; 4], [0; 4]],
        [[1, 1, 0, 0], [1, 1, 0, 0], [0; 4], [0; 4]],
        [[1, 1, 0, 0], [1, 1, 0, 0], [0; 4], [0; 4]],
        [[1, 1, 0, 0], [1, 1, 0, 0], [0; 4], [0; 4]],
    ],
    // Z
    [
        [[0, 1, 1, 0], [1, 1, 0, 0], [0, 0, 0, 0], [0; 4]],
        [[0, 1, 0, 0], [0, 1, 1, 0], [0, 0, 1, 0], [0; 4]],
        [[0, 0, 0, 0], [0, 1, 1, 0], [1, 1, 0, 0], [0; 4]],
        [[1, 0, 0, 0], [1, 1, 0, 0], [0, 1, 0, 0], [0; 4]],
    ],
    // T
    [
        [[0, 1, 0, 0], [1, 1, 1, 0], [0, 0, 0, 0], [0; 4]],
        [[0, 1, 0, 0], [0, 1, 1, 0], [0, 1, 0, 0], [0; 4]],
        [[0, 0, 0, 0], [1, 1, 1, 0], [0, 1, 0, 0], [0; 4]],
        [[0, 1, 0, 0], [1, 1, 0, 0], [0, 1, 0, 0], [0; 4]],
    ],
    // J
    [
        [[0, 0, 1, 0], [1, 1, 1, 0], [0, 0, 0, 0], [0; 4]],
        [[0, 1, 0, 0], [0, 1, 0, 0], [0, 1, 1, 0], [0; 4]],
        [[0, 0, 0, 0], [1, 1, 1, 0], [1, 0, 0, 0], [0; 4]],
        [[1, 1, 0, 0], [0, 1, 0, 0], [0, 1, 0, 0], [0; 4]],
    ],
    // S
    [
        [[1, 1, 0, 0], [0, 1, 1, 0], [0, 0, 0, 0], [0; 4]],
        [[0, 0, 1, 0], [0, 1, 1, 0], [0, 1, 0, 0], [0; 4]],
        [[0, 0, 0, 0], [1, 1, 0, 0], [0, 1, 1, 0], [0; 4]],
        [[0, 1, 0, 0], [1, 1, 0, 0], [1, 0, 0, 0], [0; 4]],
    ],
];

#[derive(Copy, Clone, Debug)]
struct RotationInfo {
    cells: [(i8, i8); 4],
    min_x: i8,
    max_x: i8,
    min_y: i8,
    top: i8,
    columns: u8,
}

pub struct Catalog {
    info: [[RotationInfo; 4]; 7],
}

pub const CATALOG: Catalog = Catalog::build();

impl Catalog {
    const fn build() -> Catalog {
        let empty = RotationInfo {
            cells: [(0, 0); 4],
            min_x: 0,
            max_x: 0,
            min_y: 0,
            top: 0,
            columns: 0,
        };
        let mut info = [[empty; 4]; 7];
        let mut p = 0;
        while p < 7 {
            let mut r = 0;
            while r < 4 {
                info[p][r] = analyse(&MATRICES[p][r]);
                r += 1;
            }
            p += 1;
        }
        Catalog { info }
    }

    #[inline(always)]
    fn get(&self, piece: Piece, rotation: Rotation) -> &RotationInfo {
        &self.info[piece as usize][rotation.index()]
    }

    /// Occupied cells relative to the bounding box corner, bottom row first.
    #[inline(always)]
    pub fn cells(&self, piece: Piece, rotation: Rotation) -> [(i8, i8); 4] {
        self.get(piece, rotation).cells
    }

    /// Whether the rotation's matrix has a block at box-relative `(x, y)`.
    pub fn occupies(&self, piece: Piece, rotation: Rotation, x: i8, y: i8) -> bool {
        self.get(piece, rotation).cells.contains(&(x, y))
    }

    /// Box x positions that keep every block inside a 10-wide field.
    pub fn valid_x(&self, piece: Piece, rotation: Rotation) -> RangeInclusive<i8> {
        let info = self.get(piece, rotation);
        info.min_x..=info.max_x
    }

    /// Lowest box y that keeps every block on or above the floor.
    pub fn min_y(&self, piece: Piece, rotation: Rotation) -> i8 {
        self.get(piece, rotation).min_y
    }

    /// One past the highest box-relative row holding a block.
    pub fn max_y_offset(&self, piece: Piece, rotation: Rotation) -> i8 {
        self.get(piece, rotation).top
    }

    /// Box-relative columns holding at least one block, left to right.
    pub fn occupied_cols(&self, piece: Piece, rotation: Rotation) -> ArrayVec<i8, 4> {
        let columns = self.get(piece, rotation).columns;
        (0..4).filter(|c| columns & 1 << c != 0).collect()
    }
}

const fn analyse(m: &Matrix) -> RotationInfo {
    let mut cells = [(0, 0); 4];
    let mut n = 0;
    let mut min_col = 4;
    let mut max_col = 0;
    let mut min_row = 4;
    let mut max_row = 0;
    let mut columns = 0u8;
    let mut y = 0;
    while y < 4 {
        let mut x = 0;
        while x < 4 {
            if m[y][x] != 0 {
                cells[n] = (x as i8, y as i8);
                n += 1;
                columns |= 1 << x;
                if x < min_col {
                    min_col = x;
                }
                if x > max_col {
                    max_col = x;
                }
                if y < min_row {
                    min_row = y;
                }
                if y > max_row {
                    max_row = y;
                }
            }
            x += 1;
        }
        y += 1;
    }
    assert!(n == 4);
    RotationInfo {
        cells,
        min_x: -(min_col as i8),
        max_x: 9 - max_col as i8,
        min_y: -(min_row as i8),
        top: max_row as i8 + 1,
        columns,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placement_ranges() {
        let i = Piece::I;
        assert_eq!(CATALOG.valid_x(i, Rotation::South), 0..=6);
        assert_eq!(CATALOG.valid_x(i, Rotation::East), -2..=7);
        assert_eq!(CATALOG.valid_x(i, Rotation::North), 0..=6);
        assert_eq!(CATALOG.valid_x(i, Rotation::West), -1..=8);
        assert_eq!(CATALOG.valid_x(Piece::O, Rotation::North), 0..=8);
        assert_eq!(CATALOG.valid_x(Piece::T, Rotation::East), -1..=7);
        assert_eq!(CATALOG.valid_x(Piece::S, Rotation::West), 0..=8);

        let min_y: Vec<_> = Rotation::ALL.iter().map(|&r| CATALOG.min_y(i, r)).collect();
        assert_eq!(min_y, [-1, 0, -2, 0]);
        let tops: Vec<_> = Rotation::ALL.iter().map(|&r| CATALOG.max_y_offset(i, r)).collect();
        assert_eq!(tops, [2, 4, 3, 4]);
        assert_eq!(CATALOG.min_y(Piece::L, Rotation::North), -1);
        assert_eq!(CATALOG.max_y_offset(Piece::O, Rotation::West), 2);
    }

    #[test]
    fn occupied_columns() {
        let cols = |p, r| CATALOG.occupied_cols(p, r).to_vec();
        assert_eq!(cols(Piece::I, Rotation::South), [0, 1, 2, 3]);
        assert_eq!(cols(Piece::I, Rotation::East), [2]);
        assert_eq!(cols(Piece::I, Rotation::West), [1]);
        assert_eq!(cols(Piece::T, Rotation::East), [1, 2]);
        assert_eq!(cols(Piece::Z, Rotation::West), [0, 1]);
        assert_eq!(cols(Piece::O, Rotation::South), [0, 1]);
    }

    #[test]
    fn spawn_t_points_up() {
        assert_eq!(
            CATALOG.cells(Piece::T, Rotation::North),
            [(0, 1), (1, 1), (2, 1), (1, 2)]
        );
        assert!(CATALOG.occupies(Piece::T, Rotation::East, 2, 1));
        assert!(!CATALOG.occupies(Piece::T, Rotation::East, 0, 1));
    }
}
