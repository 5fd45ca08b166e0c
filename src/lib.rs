//! Tetris setup analysis: fumen diagrams, piece placement recovery, hard-drop
//! feasibility and bag coverage of perfect clear setups.

pub mod catalog;
pub mod coverage;
pub mod data;
pub mod drop;
pub mod field;
pub mod fumen;
pub mod locate;
pub mod logging;
pub mod overlay;
pub mod setup;
pub mod solver;
pub mod store;

pub use crate::coverage::{CoverageAnalyzer, CoverageRules};
pub use crate::data::{Bag, Piece, Placement, Rotation};
pub use crate::field::Grid;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Fumen(#[from] fumen::FumenError),
    #[error(transparent)]
    Grid(#[from] field::GridError),
    #[error(transparent)]
    Locate(#[from] locate::LocateError),
    #[error(transparent)]
    Solver(#[from] solver::SolverError),
    #[error(transparent)]
    Store(#[from] store::StoreError),
    #[error(transparent)]
    Logging(#[from] logging::LoggingError),
    #[error("invalid piece list {0}")]
    Pieces(String),
    #[error("{0}")]
    Usage(String),
}
