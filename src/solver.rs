//! Boundary with the external board solver.
//!
//! The solver itself runs out of process. This module only describes what is
//! asked of it, turns its answers into [`Solution`]s and remembers answers
//! that were already given.

use std::fmt;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::field::Grid;
use crate::fumen::{self, FumenError};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum SolverError {
    #[error("solver failed: {0}")]
    Failed(String),
    #[error("no success rate in solver output")]
    NoPercentage,
    #[error("solver diagram: {0}")]
    Fumen(#[from] FumenError),
}

pub trait Solver {
    /// Every way to fill the fill cells of `diagram`, whose comment carries
    /// the solver arguments. Each answer is a diagram of the filled board with
    /// the pieces used as its comment. `None` when the board needs more pieces
    /// than the arguments allow.
    fn setup(&self, diagram: &str) -> Result<Option<Vec<String>>, SolverError>;

    /// Chance in percent of clearing the board of `diagram` within `height`
    /// rows using `pieces`.
    fn percent(&self, diagram: &str, pieces: &str, height: usize) -> Result<f64, SolverError>;
}

/// Pull the success rate out of the solver's percent report.
pub fn parse_success_rate(output: &str) -> Result<f64, SolverError> {
    const MARKER: &str = "success = ";
    let start = output.find(MARKER).ok_or(SolverError::NoPercentage)? + MARKER.len();
    let rest = &output[start..];
    let end = rest.find('%').ok_or(SolverError::NoPercentage)?;
    rest[..end].trim().parse().map_err(|_| SolverError::NoPercentage)
}

/// One filled board returned by the solver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    /// The board with every piece made solid. Spin filters stamp their T here.
    pub grid: Grid,
    /// The diagram as the solver returned it.
    pub fumen: String,
    pub sequence: String,
}

impl Solution {
    pub fn from_fumen(diagram: &str) -> Result<Self, FumenError> {
        let (grid, sequence) = fumen::decode(diagram)?;
        Ok(Solution {
            grid: grid.solidified(),
            fumen: diagram.to_owned(),
            sequence,
        })
    }

    /// Solver piece selector for finishing after this board: the pieces of
    /// the bag not yet used, then a full bag.
    pub fn remaining_pieces(&self) -> String {
        let missing: Vec<String> = "LJSZIOT"
            .chars()
            .filter(|&p| !self.sequence.contains(p))
            .map(String::from)
            .collect();
        if missing.is_empty() {
            "*p7".to_owned()
        } else {
            format!("{},*p7", missing.join(","))
        }
    }

    /// The current board, including any stamped T, with the sequence as the
    /// comment.
    pub fn to_fumen(&self) -> Result<String, FumenError> {
        fumen::encode([(&self.grid.to_solver_colors(), self.sequence.as_str())])
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.grid.diagram())?;
        writeln!(f)?;
        writeln!(f, "Fumen: {}", self.fumen)
    }
}

/// Answers already given by a solver, kept so a long search can be resumed.
#[derive(Default, Serialize, Deserialize)]
pub struct SolverCache {
    setups: DashMap<String, Option<Vec<String>>>,
    rates: DashMap<(String, String, usize), f64>,
}

impl SolverCache {
    pub fn len(&self) -> usize {
        self.setups.len() + self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Wraps a solver, asking it each question at most once.
pub struct CachedSolver<S> {
    inner: S,
    cache: SolverCache,
}

impl<S: Solver> CachedSolver<S> {
    pub fn new(inner: S, cache: SolverCache) -> Self {
        CachedSolver { inner, cache }
    }

    pub fn into_cache(self) -> SolverCache {
        self.cache
    }
}

impl<S: Solver> Solver for CachedSolver<S> {
    fn setup(&self, diagram: &str) -> Result<Option<Vec<String>>, SolverError> {
        if let Some(found) = self.cache.setups.get(diagram) {
            log::debug!("cached setups for {}", diagram);
            return Ok(found.clone());
        }
        let found = self.inner.setup(diagram)?;
        self.cache.setups.insert(diagram.to_owned(), found.clone());
        Ok(found)
    }

    fn percent(&self, diagram: &str, pieces: &str, height: usize) -> Result<f64, SolverError> {
        let key = (diagram.to_owned(), pieces.to_owned(), height);
        if let Some(rate) = self.cache.rates.get(&key) {
            log::debug!("cached success rate for {}", diagram);
            return Ok(*rate);
        }
        let rate = self.inner.percent(diagram, pieces, height)?;
        self.cache.rates.insert(key, rate);
        Ok(rate)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    const ALBATROSS_NO_T: &str = "v115@AhBtDewhQ4CeBti0whR4AeRpilg0whAeQ4AeRpglCe?whJeAgl";

    struct Counting {
        calls: Cell<usize>,
    }

    impl Solver for Counting {
        fn setup(&self, _: &str) -> Result<Option<Vec<String>>, SolverError> {
            self.calls.set(self.calls.get() + 1);
            Ok(Some(vec![ALBATROSS_NO_T.to_owned()]))
        }

        fn percent(&self, _: &str, pieces: &str, _: usize) -> Result<f64, SolverError> {
            self.calls.set(self.calls.get() + 1);
            if pieces.is_empty() {
                return Err(SolverError::Failed("no pieces".to_owned()));
            }
            Ok(pieces.len() as f64)
        }
    }

    #[test]
    fn success_rate_is_read_from_report() {
        let report = "# Output\n  success = 87.62% (4416/5040)\n";
        assert_eq!(parse_success_rate(report), Ok(87.62));
        assert_eq!(parse_success_rate("success = %"), Err(SolverError::NoPercentage));
        assert_eq!(parse_success_rate("nothing here"), Err(SolverError::NoPercentage));
    }

    #[test]
    fn solutions_are_solid_with_sequence() {
        let mut sol = Solution::from_fumen(ALBATROSS_NO_T).unwrap();
        assert_eq!(sol.sequence, "");
        assert!(sol.grid.rows().iter().flatten().all(|&c| c == 0 || c == 1));
        assert_eq!(sol.remaining_pieces(), "L,J,S,Z,I,O,T,*p7");

        sol.sequence = "ILOZJS".to_owned();
        assert_eq!(sol.remaining_pieces(), "T,*p7");
        sol.sequence = "TILOZJS".to_owned();
        assert_eq!(sol.remaining_pieces(), "*p7");

        let (grid, comment) = fumen::decode(&sol.to_fumen().unwrap()).unwrap();
        assert_eq!(comment, "TILOZJS");
        assert_eq!(grid, sol.grid.to_solver_colors());
    }

    #[test]
    fn cached_solver_asks_once() {
        let solver = CachedSolver::new(
            Counting {
                calls: Cell::new(0),
            },
            SolverCache::default(),
        );
        for _ in 0..3 {
            assert_eq!(solver.setup("a").unwrap().unwrap().len(), 1);
            assert_eq!(solver.percent("a", "T,*p7", 4), Ok(5.0));
        }
        assert_eq!(solver.percent("a", "T,*p7", 6), Ok(5.0));
        assert_eq!(solver.inner.calls.get(), 3);

        // failures are not remembered
        assert!(solver.percent("a", "", 4).is_err());
        assert!(solver.percent("a", "", 4).is_err());
        assert_eq!(solver.inner.calls.get(), 5);
        assert_eq!(solver.into_cache().len(), 3);
    }
}
