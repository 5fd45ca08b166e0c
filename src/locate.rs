//! Finding where each piece was placed in a solver-coloured board.
//!
//! Solver output colours every piece with its own colour and uses each piece at
//! most once, so a piece can be recovered from the four cells of its colour.

use smallvec::SmallVec;

use crate::data::{Piece, Placement, Rotation};
use crate::field::Grid;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum LocateError {
    #[error("found {count} {piece}-coloured cells, expected 4")]
    MalformedPieceCount { piece: Piece, count: usize },
    #[error("{0}-coloured cells do not form a {0} piece")]
    PieceNotLocated(Piece),
    #[error("{piece} in row {row} is above the highest placeable row")]
    RowOutOfRange { piece: Piece, row: usize },
}

/// Placement of each piece present in a board, indexed by piece.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PiecePlacements([Option<Placement>; 7]);

impl PiecePlacements {
    #[inline(always)]
    pub fn get(&self, piece: Piece) -> Option<Placement> {
        self.0[piece as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = Placement> + '_ {
        self.0.iter().flatten().copied()
    }
}

pub fn find_placements(grid: &Grid) -> Result<PiecePlacements, LocateError> {
    let mut placements = PiecePlacements::default();
    for piece in Piece::ALL {
        placements.0[piece as usize] = find_placement(piece, grid)?;
    }
    Ok(placements)
}

/// Locate a single piece by colour. `Ok(None)` means the piece is absent.
///
/// Candidate boxes are tried bottom to top, left to right, and each box tries
/// rotations in [`Rotation::SEARCH_ORDER`], so boards where several rotations
/// cover the same cells always resolve to the same placement.
pub fn find_placement(piece: Piece, grid: &Grid) -> Result<Option<Placement>, LocateError> {
    let color = piece.color();
    let mut blocks: SmallVec<[(i8, i8); 4]> = SmallVec::new();
    for (y, row) in grid.rows().iter().enumerate() {
        for (x, _) in row.iter().enumerate().filter(|&(_, &c)| c == color) {
            let y = i8::try_from(y).map_err(|_| LocateError::RowOutOfRange { piece, row: y })?;
            blocks.push((x as i8, y));
        }
    }

    if blocks.is_empty() {
        return Ok(None);
    }
    if blocks.len() != 4 {
        return Err(LocateError::MalformedPieceCount {
            piece,
            count: blocks.len(),
        });
    }

    for (x, y) in bounding_boxes(&blocks, piece.box_size()) {
        for rotation in Rotation::SEARCH_ORDER {
            let placement = Placement {
                piece,
                rotation,
                x,
                y,
            };
            if piece_is_at(grid, placement) {
                return Ok(Some(placement));
            }
        }
    }
    Err(LocateError::PieceNotLocated(piece))
}

/// Whether every block of `placement` lies inside the grid on a cell of the
/// piece's colour.
pub fn piece_is_at(grid: &Grid, placement: Placement) -> bool {
    let color = placement.piece.color();
    placement
        .cells()
        .iter()
        .all(|&(x, y)| grid.get(x, y) == Some(color))
}

/// Bottom-left corners of every `size`-square box containing all `blocks`,
/// bottom row first. Empty when the blocks are too spread out for the box.
pub fn bounding_boxes(blocks: &[(i8, i8)], size: i8) -> SmallVec<[(i8, i8); 16]> {
    let mut boxes = SmallVec::new();
    let (min_x, max_x) = span(blocks.iter().map(|b| b.0));
    let (min_y, max_y) = span(blocks.iter().map(|b| b.1));
    let x_slack = size - 1 - (max_x - min_x);
    let y_slack = size - 1 - (max_y - min_y);
    if x_slack < 0 || y_slack < 0 {
        return boxes;
    }
    for y in min_y - y_slack..=min_y {
        for x in min_x - x_slack..=min_x {
            boxes.push((x, y));
        }
    }
    boxes
}

fn span(values: impl Iterator<Item = i8>) -> (i8, i8) {
    values.fold((i8::MAX, i8::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fumen;

    const ALBATROSS: &str = "v115@AhBtDewhQ4ywBti0whR4wwRpilg0whAeQ4AeRpglCe?whJeAgl";
    const DT_CANNON: &str =
        "v115@hghlQ4BeAtEeglR4BtAewhh0AeglA8Q4AtRpwhg0Be?D8Rpwhg0CeE8whB8AeI8AeG8JeAgH";

    fn at(piece: Piece, x: i8, y: i8, rotation: usize) -> Option<Placement> {
        Some(Placement {
            piece,
            rotation: Rotation::from_index(rotation).unwrap(),
            x,
            y,
        })
    }

    #[test]
    fn locates_every_albatross_piece() {
        let (grid, _) = fumen::decode(ALBATROSS).unwrap();
        let found = find_placements(&grid).unwrap();
        assert_eq!(found.get(Piece::I), at(Piece::I, 7, 0, 1));
        assert_eq!(found.get(Piece::L), at(Piece::L, 5, 0, 0));
        assert_eq!(found.get(Piece::O), at(Piece::O, 3, 0, 2));
        assert_eq!(found.get(Piece::Z), at(Piece::Z, 3, 1, 2));
        assert_eq!(found.get(Piece::T), at(Piece::T, 1, 1, 0));
        assert_eq!(found.get(Piece::J), at(Piece::J, 6, 1, 0));
        assert_eq!(found.get(Piece::S), at(Piece::S, -1, 0, 1));
        assert_eq!(found.iter().count(), 7);
    }

    #[test]
    fn absent_pieces_are_none() {
        let (grid, _) = fumen::decode(DT_CANNON).unwrap();
        let found = find_placements(&grid).unwrap();
        assert_eq!(found.get(Piece::T), None);
        assert_eq!(found.get(Piece::I), at(Piece::I, 7, 2, 1));
        assert_eq!(found.get(Piece::L), at(Piece::L, 2, 4, 3));
        assert_eq!(found.get(Piece::O), at(Piece::O, 7, 3, 2));
        assert_eq!(found.get(Piece::Z), at(Piece::Z, 5, 4, 1));
        assert_eq!(found.get(Piece::J), at(Piece::J, -1, 2, 1));
        assert_eq!(found.get(Piece::S), at(Piece::S, 3, 4, 1));
        for placement in found.iter() {
            assert!(piece_is_at(&grid, placement));
        }
    }

    #[test]
    fn wrong_cell_counts_are_errors() {
        let grid = Grid::from_rows(vec![[5, 5, 5, 0, 0, 5, 5, 0, 0, 0]]);
        assert_eq!(
            find_placement(Piece::T, &grid),
            Err(LocateError::MalformedPieceCount {
                piece: Piece::T,
                count: 5
            })
        );
    }

    #[test]
    fn scattered_cells_are_not_a_piece() {
        let grid = Grid::from_rows(vec![[1, 1, 0, 0, 0, 0, 0, 0, 1, 1]]);
        assert_eq!(
            find_placement(Piece::I, &grid),
            Err(LocateError::PieceNotLocated(Piece::I))
        );
        // right extent, wrong shape
        let grid = Grid::from_rows(vec![[5, 5, 0, 0, 0, 0, 0, 0, 0, 0], [5, 5, 0, 0, 0, 0, 0, 0, 0, 0]]);
        assert_eq!(
            find_placement(Piece::T, &grid),
            Err(LocateError::PieceNotLocated(Piece::T))
        );
    }

    #[test]
    fn rows_beyond_placement_range() {
        let mut grid = Grid::new(200);
        for x in 3..7 {
            grid.set(x, 120, Piece::I.color());
        }
        let found = find_placement(Piece::I, &grid).unwrap().unwrap();
        assert!(piece_is_at(&grid, found));

        let mut tall = Grid::new(200);
        for x in 3..7 {
            tall.set(x, 150, Piece::I.color());
        }
        assert_eq!(
            find_placement(Piece::I, &tall),
            Err(LocateError::RowOutOfRange {
                piece: Piece::I,
                row: 150
            })
        );
    }

    #[test]
    fn boxes_cover_every_alignment() {
        // vertical I in column 9
        let blocks = [(9, 0), (9, 1), (9, 2), (9, 3)];
        assert_eq!(
            bounding_boxes(&blocks, 4).to_vec(),
            [(6, 0), (7, 0), (8, 0), (9, 0)]
        );
        let blocks = [(3, 0), (4, 0), (3, 1), (4, 1)];
        assert_eq!(bounding_boxes(&blocks, 2).to_vec(), [(3, 0)]);
        let blocks = [(0, 0), (1, 0), (2, 0), (1, 1)];
        assert_eq!(bounding_boxes(&blocks, 3).to_vec(), [(0, -1), (0, 0)]);
        assert!(bounding_boxes(&blocks, 2).is_empty());
    }
}
