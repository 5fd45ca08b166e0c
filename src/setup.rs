//! Trees of setups: a first bag, the bags that can follow it, and how likely
//! each line is to end in a perfect clear.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::coverage::Candidate;
use crate::field::{Grid, TStance};
use crate::fumen::{self, FumenError};
use crate::overlay::{self, SPIN_ARGS, SPIN_HEIGHT, TETRIS_ARGS, TETRIS_HEIGHT};
use crate::solver::{Solution, Solver, SolverError};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Setup {
    pub solution: Solution,
    pub continuations: Vec<Setup>,
    /// Best perfect clear chance in percent. When several continuations are
    /// certain, each one beyond the first adds a point so that such setups
    /// sort first.
    pub success_rate: f64,
}

impl Setup {
    pub fn new(solution: Solution) -> Self {
        Setup {
            solution,
            continuations: vec![],
            success_rate: 0.0,
        }
    }

    /// Returns whether any continuation was added.
    pub fn add_continuations(&mut self, solutions: Vec<Solution>) -> bool {
        if solutions.is_empty() {
            return false;
        }
        self.continuations
            .extend(solutions.into_iter().map(Setup::new));
        true
    }

    /// Grow every leaf of the tree by one bag. Branches that cannot be
    /// extended are dropped.
    pub fn find_continuations(
        &mut self,
        solver: &impl Solver,
        search: &SpinSearch,
    ) -> Result<(), SolverError> {
        if self.continuations.is_empty() {
            let found = search.continuations(solver, &self.solution.grid)?;
            self.add_continuations(found);
            return Ok(());
        }
        for cont in &mut self.continuations {
            cont.find_continuations(solver, search)?;
        }
        self.continuations.retain(|cont| !cont.continuations.is_empty());
        Ok(())
    }

    /// Work out perfect clear chances from the leaves up, dropping branches
    /// below `cutoff`. Returns whether this setup reaches the cutoff.
    pub fn find_pcs(
        &mut self,
        solver: &impl Solver,
        height: usize,
        cutoff: f64,
    ) -> Result<bool, SolverError> {
        if self.continuations.is_empty() {
            self.success_rate = if self.solution.grid.height() > height {
                0.0
            } else {
                let diagram = self.solution.to_fumen()?;
                solver
                    .percent(&diagram, &self.solution.remaining_pieces(), height)
                    .map_err(|e| {
                        log::warn!("no success rate for {}: {}", self.solution.fumen, e);
                        e
                    })?
            };
            return Ok(self.success_rate >= cutoff);
        }

        let mut kept = Vec::with_capacity(self.continuations.len());
        for mut cont in std::mem::take(&mut self.continuations) {
            if cont.find_pcs(solver, height, cutoff)? {
                kept.push(cont);
            }
        }
        kept.sort_by(|a, b| b.success_rate.total_cmp(&a.success_rate));
        self.continuations = kept;

        self.success_rate = match self.continuations.first() {
            Some(best) => best.success_rate,
            None => return Ok(false),
        };
        if self.success_rate == 100.0 {
            let certain = self
                .continuations
                .iter()
                .filter(|c| c.success_rate == 100.0)
                .count();
            self.success_rate += (certain - 1) as f64;
        }
        Ok(self.success_rate >= cutoff)
    }

    /// The setup followed by one page per continuation, each captioned with
    /// its success rate.
    pub fn to_fumen(&self) -> Result<String, FumenError> {
        if self.continuations.is_empty() {
            return Ok(self.solution.fumen.clone());
        }
        let mut frames = vec![fumen::decode(&self.solution.fumen)?];
        for cont in &self.continuations {
            let (grid, _) = fumen::decode(&cont.solution.fumen)?;
            let comment = if cont.success_rate > 0.0 {
                format!("{:.2}%", cont.success_rate)
            } else {
                String::new()
            };
            frames.push((grid, comment));
        }
        fumen::encode(frames.iter().map(|(g, c)| (g, c.as_str())))
    }

    /// Continuation boards with their success rates, best first once
    /// [`Setup::find_pcs`] has run.
    pub fn candidates(&self) -> Result<Vec<Candidate>, FumenError> {
        self.continuations
            .iter()
            .map(|cont| {
                let (grid, _) = fumen::decode(&cont.solution.fumen)?;
                Ok(Candidate {
                    grid,
                    success_rate: cont.success_rate,
                })
            })
            .collect()
    }
}

impl fmt::Display for Setup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.solution)?;
        if !self.continuations.is_empty() {
            writeln!(f, "Continuations:")?;
            for cont in &self.continuations {
                writeln!(f, "{} ({:.2}%)", cont.solution.fumen, cont.success_rate)?;
            }
        }
        Ok(())
    }
}

/// Search a blank board for first-bag setups. Mirrors are skipped since every
/// mirrored first bag is found as its own setup.
pub fn initial_setups(solver: &impl Solver, search: &SpinSearch) -> Result<Vec<Setup>, SolverError> {
    let search = SpinSearch {
        mirrors: false,
        ..search.clone()
    };
    let found = search.continuations(solver, &Grid::default())?;
    log::info!("{} initial setups", found.len());
    Ok(found.into_iter().map(Setup::new).collect())
}

/// Grow every setup by one bag, dropping setups that cannot be continued.
pub fn extend_setups(
    setups: &mut Vec<Setup>,
    solver: &impl Solver,
    search: &SpinSearch,
) -> Result<(), SolverError> {
    for setup in setups.iter_mut() {
        setup.find_continuations(solver, search)?;
    }
    setups.retain(|setup| !setup.continuations.is_empty());
    log::info!("{} setups continue", setups.len());
    Ok(())
}

/// Keep the setups whose best line reaches `cutoff`, best first.
pub fn finish_setups(
    setups: &mut Vec<Setup>,
    solver: &impl Solver,
    height: usize,
    cutoff: f64,
) -> Result<(), SolverError> {
    let mut kept = Vec::with_capacity(setups.len());
    for mut setup in std::mem::take(setups) {
        if setup.find_pcs(solver, height, cutoff)? {
            kept.push(setup);
        }
    }
    kept.sort_by(|a, b| b.success_rate.total_cmp(&a.success_rate));
    log::info!("{} setups reach {}%", kept.len(), cutoff);
    *setups = kept;
    Ok(())
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SetupKind {
    Tss1,
    Tss2,
    /// Both single slots.
    Tss,
    Tsd,
    Tst,
    Tetris,
}

/// How solver results are checked against the slot they were built for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SpinFilter {
    /// Keep everything the solver returns.
    Any,
    /// Keep six-piece setups where stamping the T clears the right number of
    /// rows, leaving the T in the board.
    Complete,
    /// Keep setups where a T would clear the right number of rows, leaving
    /// the board untouched.
    Probe,
}

/// Where to look for the next bag's setup and what to accept.
#[derive(Clone, Debug)]
pub struct SpinSearch {
    pub kind: SetupKind,
    /// Row of the T centre, or of the bottom of the tetris.
    pub rows: Vec<i32>,
    /// Column of the T centre, or of the well.
    pub cols: Vec<i32>,
    /// Also try slots opening to the right.
    pub mirrors: bool,
    pub filter: SpinFilter,
}

impl SpinSearch {
    pub fn continuations(
        &self,
        solver: &impl Solver,
        grid: &Grid,
    ) -> Result<Vec<Solution>, SolverError> {
        let mut found = vec![];
        if self.kind == SetupKind::Tetris {
            // one row only
            if let Some(&row) = self.rows.first() {
                for &col in &self.cols {
                    let overlay = overlay::tetris(TETRIS_HEIGHT, col, row);
                    found.extend(solve(solver, grid, overlay, TETRIS_ARGS)?);
                }
            }
            return Ok(found);
        }

        let mirrors: &[bool] = if self.mirrors { &[false, true] } else { &[false] };
        for &row in &self.rows {
            for &col in &self.cols {
                for &mirror in mirrors {
                    let before = found.len();
                    self.slot(solver, grid, col, row, mirror, &mut found)?;
                    log::debug!(
                        "{:?} at ({}, {}){}: {} setups",
                        self.kind,
                        col,
                        row,
                        if mirror { " mirrored" } else { "" },
                        found.len() - before
                    );
                }
            }
        }
        Ok(found)
    }

    fn slot(
        &self,
        solver: &impl Solver,
        grid: &Grid,
        x: i32,
        y: i32,
        mirror: bool,
        found: &mut Vec<Solution>,
    ) -> Result<(), SolverError> {
        // upright T, stem towards the overhang
        let side = if mirror {
            TStance::VerticalMirror
        } else {
            TStance::Vertical
        };
        match self.kind {
            SetupKind::Tss1 | SetupKind::Tss2 | SetupKind::Tss => {
                if self.kind != SetupKind::Tss2 {
                    let sols = solve(solver, grid, overlay::tss1(SPIN_HEIGHT, x, y, mirror), SPIN_ARGS)?;
                    if self.filter == SpinFilter::Any {
                        found.extend(sols);
                    } else {
                        found.extend(self.check(sols.clone(), x, y, TStance::Flat, 1));
                        found.extend(self.check(sols, x, y, side, 1));
                    }
                }
                if self.kind != SetupKind::Tss1 {
                    let sols = solve(solver, grid, overlay::tss2(SPIN_HEIGHT, x, y, mirror), SPIN_ARGS)?;
                    found.extend(self.check(sols, x, y, TStance::Flat, 1));
                }
            }
            SetupKind::Tsd => {
                let sols = solve(solver, grid, overlay::tsd(SPIN_HEIGHT, x, y, mirror), SPIN_ARGS)?;
                found.extend(self.check(sols, x, y, TStance::Flat, 2));
            }
            SetupKind::Tst => {
                let sols = solve(solver, grid, overlay::tst(SPIN_HEIGHT, x, y, mirror), SPIN_ARGS)?;
                let (tx, stance) = tst_stance(x, mirror);
                found.extend(self.check(sols, tx, y, stance, 3));
            }
            SetupKind::Tetris => {}
        }
        Ok(())
    }

    fn check(&self, sols: Vec<Solution>, x: i32, y: i32, stance: TStance, lines: u32) -> Vec<Solution> {
        match self.filter {
            SpinFilter::Any => sols,
            SpinFilter::Complete => sols
                .into_iter()
                .filter_map(|mut s| complete_spin(&mut s, x, y, stance, lines).then(|| s))
                .collect(),
            SpinFilter::Probe => sols
                .into_iter()
                .filter(|s| probe_spin(s, x, y, stance, lines))
                .collect(),
        }
    }
}

/// Overlay the slot onto the board and ask the solver to fill it.
fn solve(
    solver: &impl Solver,
    grid: &Grid,
    overlay: Option<Grid>,
    args: &str,
) -> Result<Vec<Solution>, SolverError> {
    let overlay = match overlay {
        Some(o) => o,
        None => return Ok(vec![]),
    };
    let mut field = grid.clone();
    if !field.add_overlay(&overlay) {
        return Ok(vec![]);
    }
    let diagram = overlay::solver_fumen(&field, args)?;
    let answers = solver.setup(&diagram)?.unwrap_or_default();
    let solutions: Vec<Solution> = answers
        .iter()
        .map(|d| Solution::from_fumen(d))
        .collect::<Result<_, FumenError>>()?;
    Ok(solutions)
}

/// The T of a triple enters from the side opposite the slot's opening.
fn tst_stance(x: i32, mirror: bool) -> (i32, TStance) {
    if mirror {
        (x - 1, TStance::Vertical)
    } else {
        (x + 1, TStance::VerticalMirror)
    }
}

fn complete_spin(solution: &mut Solution, x: i32, y: i32, stance: TStance, lines: u32) -> bool {
    if solution.sequence.chars().count() != 6 {
        return false;
    }
    if solution.grid.add_t(x, y, stance).is_none() {
        return false;
    }
    solution.sequence.push('T');
    solution.grid.cleared_rows() == lines
}

fn probe_spin(solution: &Solution, x: i32, y: i32, stance: TStance, lines: u32) -> bool {
    let mut grid = solution.grid.clone();
    grid.add_t(x, y, stance).is_some() && grid.cleared_rows() == lines
}

/// Place the bag's T centred on `(x, y)` and check it clears one row. Only
/// six-piece setups qualify.
pub fn complete_tss(solution: &mut Solution, x: i32, y: i32, stance: TStance) -> bool {
    complete_spin(solution, x, y, stance, 1)
}

pub fn complete_tsd(solution: &mut Solution, x: i32, y: i32) -> bool {
    complete_spin(solution, x, y, TStance::Flat, 2)
}

/// `x` is the slot's centre column as passed to [`overlay::tst`].
pub fn complete_tst(solution: &mut Solution, x: i32, y: i32, mirror: bool) -> bool {
    let (tx, stance) = tst_stance(x, mirror);
    complete_spin(solution, tx, y, stance, 3)
}

/// Whether a flat T at `(x, y)` would clear two rows, without placing it.
pub fn probe_tsd(solution: &Solution, x: i32, y: i32) -> bool {
    probe_spin(solution, x, y, TStance::Flat, 2)
}

#[cfg(test)]
#[path = "setup-tests.rs"]
mod tests;
