use super::*;
use crate::data::{Piece, Rotation};
use crate::fumen;

fn padded(diagram: &str) -> Grid {
    let (mut grid, _) = fumen::decode(diagram).unwrap();
    grid.extend_to(20);
    grid
}

fn at(piece: Piece, x: i8, y: i8, rotation: usize) -> Placement {
    Placement {
        piece,
        rotation: Rotation::from_index(rotation).unwrap(),
        x,
        y,
    }
}

#[test]
fn every_in_bounds_drop_lands_on_an_empty_board() {
    let grid = Grid::new(20);
    for piece in Piece::ALL {
        for rotation in Rotation::ALL {
            let valid = CATALOG.valid_x(piece, rotation);
            let floor = CATALOG.min_y(piece, rotation);
            for y in -2..=0 {
                for x in -2..10 {
                    let placement = Placement {
                        piece,
                        rotation,
                        x,
                        y,
                    };
                    assert_eq!(
                        can_hard_drop(placement, &grid),
                        valid.contains(&x) && y == floor,
                        "{}",
                        placement
                    );
                }
            }
        }
    }
}

#[test]
fn single_point_of_contact_is_enough() {
    // one garbage cell at (5, 2)
    let grid = padded("v115@MhA8heAgH");
    assert!(can_hard_drop(at(Piece::I, 2, 2, 0), &grid));
    assert!(can_hard_drop(at(Piece::I, 3, 3, 1), &grid));
    assert!(can_hard_drop(at(Piece::L, 3, 2, 0), &grid));

    assert!(!can_hard_drop(at(Piece::I, 1, 2, 0), &grid));
    assert!(!can_hard_drop(at(Piece::I, 2, 3, 1), &grid));
    assert!(!can_hard_drop(at(Piece::L, 3, 3, 0), &grid));
}

#[test]
fn gaps_admit_only_narrow_enough_rotations() {
    // wells three wide at column 0, two wide at 4 and one wide at 7
    let open = padded("v115@AhA8BeA8AeB8CeA8BeA8AeB8CeA8BeA8AeB8CeA8Be?A8AeB8JeAgH");
    // the same wells with a roof over them
    let covered = padded("v115@zgJ8CeA8BeA8AeB8CeA8BeA8AeB8CeA8BeA8AeB8Ce?A8BeA8AeB8JeAgH");

    for piece in Piece::ALL {
        for rotation in Rotation::ALL {
            let cols = CATALOG.occupied_cols(piece, rotation);
            let width = cols.len();
            let offset = cols[0];
            let y = CATALOG.min_y(piece, rotation);
            let drop_at = |grid: &Grid, x: i8| {
                can_hard_drop(
                    Placement {
                        piece,
                        rotation,
                        x: x - offset,
                        y,
                    },
                    grid,
                )
            };
            assert_eq!(drop_at(&open, 0), width <= 3, "{:?} {:?}", piece, rotation);
            assert_eq!(drop_at(&open, 4), width <= 2, "{:?} {:?}", piece, rotation);
            assert_eq!(drop_at(&open, 7), width <= 1, "{:?} {:?}", piece, rotation);
            assert!(!drop_at(&covered, 0), "{:?} {:?}", piece, rotation);
        }
    }
}

#[test]
fn blocks_inside_the_bounding_box_still_cover() {
    let grid = padded("v115@RhJ8DeF8JeAgl");
    assert!(!can_hard_drop(at(Piece::I, 0, -1, 0), &grid));
}

#[test]
fn collisions_and_the_top_edge_fail() {
    let mut grid = Grid::new(2);
    grid.set(0, 0, 8);
    assert!(!can_hard_drop(at(Piece::O, 0, 0, 2), &grid));
    assert!(!can_hard_drop(at(Piece::O, 0, 1, 2), &Grid::new(3)));
    // a vertical I does not fit in a two row board
    assert!(!can_hard_drop(at(Piece::I, 0, 0, 1), &grid));
}

#[test]
fn placing_pieces_builds_a_perfect_clear_shape() {
    let mut grid = Grid::new(20);
    for placement in [
        at(Piece::J, 7, -1, 2),
        at(Piece::S, 1, -1, 2),
        at(Piece::O, 8, 1, 2),
        at(Piece::L, 7, 2, 0),
        at(Piece::I, 4, 0, 1),
        at(Piece::T, -1, 0, 1),
        at(Piece::Z, 0, 1, 2),
    ] {
        place_piece(placement, &mut grid);
    }
    assert_eq!(
        fumen::encode([(&grid, "")]).unwrap(),
        "v115@9gBtDewhilwwBtCewhglRpxwR4Bewhg0RpwwR4Cewh?i0JeAgH"
    );
}

#[test]
fn placements_far_off_the_grid_fail() {
    let grid = Grid::new(20);
    for rotation in Rotation::ALL {
        for (x, y) in [(i8::MAX, 0), (0, i8::MAX), (i8::MIN, 0), (i8::MAX, i8::MAX)] {
            let placement = Placement {
                piece: Piece::I,
                rotation,
                x,
                y,
            };
            assert!(!can_hard_drop(placement, &grid), "{}", placement);
        }
    }

    let mut untouched = grid.clone();
    place_piece(at(Piece::I, i8::MAX, i8::MAX, 1), &mut untouched);
    assert_eq!(untouched, grid);
}
