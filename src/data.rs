use std::fmt;

use enumset::{EnumSet, EnumSetType};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::catalog::CATALOG;

/// A single board cell. `0` is empty, `1..=7` are piece colours, `8` is garbage.
///
/// Signed because the diagram format can produce negative values when biased
/// run colours are decoded without a previous frame to diff against.
pub type Cell = i8;

pub const EMPTY: Cell = 0;
pub const GARBAGE: Cell = 8;

/// Overlay-only markers, and the solid marker used by uncoloured solver fields.
pub const SOLID: Cell = 1;
pub const FILL: Cell = 2;
pub const MARGIN: Cell = 3;

pub const WIDTH: usize = 10;

/// Pieces in diagram colour order: `I` is colour 1 through `S` at colour 7.
#[derive(Debug, EnumSetType, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Piece {
    I,
    L,
    O,
    Z,
    T,
    J,
    S,
}

/// Rotation states, numbered the way the diagram format numbers them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rotation {
    South = 0,
    East = 1,
    North = 2,
    West = 3,
}

#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub piece: Piece,
    pub rotation: Rotation,
    /// Bottom-left corner of the rotation's bounding box.
    pub x: i8,
    pub y: i8,
}

/// An ordering of pieces. Seven at most in a bag, plus one when a held piece
/// is appended by hold expansion.
pub type Bag = SmallVec<[Piece; 8]>;

impl Piece {
    pub const ALL: [Piece; 7] = [
        Piece::I,
        Piece::L,
        Piece::O,
        Piece::Z,
        Piece::T,
        Piece::J,
        Piece::S,
    ];

    #[inline(always)]
    pub const fn color(self) -> Cell {
        self as Cell + 1
    }

    pub fn from_color(c: Cell) -> Option<Piece> {
        Piece::ALL.get((c as usize).wrapping_sub(1)).copied()
    }

    /// The piece that occupies the same cells after a left-right flip.
    pub const fn mirrored(self) -> Piece {
        match self {
            Piece::L => Piece::J,
            Piece::J => Piece::L,
            Piece::S => Piece::Z,
            Piece::Z => Piece::S,
            p => p,
        }
    }

    pub const fn to_char(self) -> char {
        match self {
            Piece::I => 'I',
            Piece::L => 'L',
            Piece::O => 'O',
            Piece::Z => 'Z',
            Piece::T => 'T',
            Piece::J => 'J',
            Piece::S => 'S',
        }
    }

    /// Side length of the bounding box all four rotation states live in.
    pub const fn box_size(self) -> i8 {
        match self {
            Piece::I => 4,
            Piece::O => 2,
            _ => 3,
        }
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [
        Rotation::South,
        Rotation::East,
        Rotation::North,
        Rotation::West,
    ];

    /// Spawn orientation first, then the remaining states in index order
    /// starting after spawn. Locating pieces depends on this order.
    pub const SEARCH_ORDER: [Rotation; 4] = [
        Rotation::North,
        Rotation::West,
        Rotation::South,
        Rotation::East,
    ];

    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(i: usize) -> Option<Rotation> {
        Rotation::ALL.get(i).copied()
    }
}

impl Placement {
    #[inline(always)]
    pub fn cells(self) -> [(i32, i32); 4] {
        CATALOG
            .cells(self.piece, self.rotation)
            .map(|(dx, dy)| (self.x as i32 + dx as i32, self.y as i32 + dy as i32))
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at ({}, {}) rotation {}",
            self.piece,
            self.x,
            self.y,
            self.rotation.index()
        )
    }
}

pub fn parse_piece(c: char) -> Result<Piece, &'static str> {
    Ok(match c.to_ascii_uppercase() {
        'I' => Piece::I,
        'O' => Piece::O,
        'T' => Piece::T,
        'L' => Piece::L,
        'J' => Piece::J,
        'S' => Piece::S,
        'Z' => Piece::Z,
        _ => return Err("invalid piece"),
    })
}

/// Parse a bag such as `"TSOLIZJ"`. Pieces may not repeat.
pub fn parse_seq(p: &str) -> Result<Bag, &'static str> {
    let mut seen = EnumSet::<Piece>::empty();
    p.chars().try_fold(Bag::new(), |mut v, c| {
        let piece = parse_piece(c)?;
        if !seen.insert(piece) {
            return Err("piece repeated in bag");
        }
        v.push(piece);
        Ok(v)
    })
}

pub fn bag_string(bag: &[Piece]) -> String {
    bag.iter().map(|p| p.to_char()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_match_diagram_order() {
        for (i, c) in " ILOZTJS".chars().enumerate().skip(1) {
            let piece = Piece::from_color(i as Cell).unwrap();
            assert_eq!(piece.to_char(), c);
            assert_eq!(piece.color(), i as Cell);
        }
        assert_eq!(Piece::from_color(EMPTY), None);
        assert_eq!(Piece::from_color(GARBAGE), None);
        assert_eq!(Piece::from_color(-3), None);
    }

    #[test]
    fn mirroring_swaps_chiral_pairs() {
        assert_eq!(Piece::L.mirrored(), Piece::J);
        assert_eq!(Piece::S.mirrored(), Piece::Z);
        assert_eq!(Piece::T.mirrored(), Piece::T);
        for p in Piece::ALL {
            assert_eq!(p.mirrored().mirrored(), p);
        }
    }

    #[test]
    fn bags_parse_and_print() {
        let bag = parse_seq("tsoLIZJ").unwrap();
        assert_eq!(bag_string(&bag), "TSOLIZJ");
        assert!(parse_seq("TT").is_err());
        assert!(parse_seq("TX").is_err());
        assert!(parse_seq("").unwrap().is_empty());
    }
}
