//! Which piece orders can build a board.
//!
//! A board is tested by locating every piece once, then replaying a bag's
//! order as straight drops onto the board's garbage. Hold and mirroring widen
//! the set of orders that count as covered.

use std::collections::HashSet;

use dashmap::DashMap;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::data::{bag_string, Bag, Piece};
use crate::drop::{can_hard_drop, place_piece};
use crate::field::Grid;
use crate::locate::{find_placements, LocateError, PiecePlacements};

/// Boards are replayed at least this tall so pieces above a short solver
/// board still have room to drop.
const REPLAY_HEIGHT: usize = 20;

/// A board prepared for testing many bags against it.
pub struct BagTester {
    placements: PiecePlacements,
    base: Grid,
}

impl BagTester {
    pub fn new(grid: &Grid) -> Result<Self, LocateError> {
        let placements = find_placements(grid)?;
        let mut base = grid.garbage_only();
        base.extend_to(REPLAY_HEIGHT);
        Ok(BagTester { placements, base })
    }

    /// Drop the bag's pieces in order, without hold. Fails on the first piece
    /// that is missing from the board or cannot be hard dropped.
    pub fn is_bag_possible(&self, bag: &[Piece]) -> bool {
        let mut grid = self.base.clone();
        for &piece in bag {
            let placement = match self.placements.get(piece) {
                Some(p) => p,
                None => return false,
            };
            if !can_hard_drop(placement, &grid) {
                return false;
            }
            place_piece(placement, &mut grid);
        }
        true
    }
}

pub fn is_bag_possible(grid: &Grid, bag: &[Piece]) -> Result<bool, LocateError> {
    Ok(BagTester::new(grid)?.is_bag_possible(bag))
}

/// Memoised hold reorderings, shareable between threads.
#[derive(Default)]
pub struct HoldCache {
    memo: DashMap<(Bag, Option<Piece>), HashSet<Bag>>,
}

impl HoldCache {
    /// Every order in which `bag` can be played using a single hold slot that
    /// currently contains `held`. A held piece is played after the bag.
    pub fn hold_equivalent_bags(&self, bag: &[Piece], held: Option<Piece>) -> HashSet<Bag> {
        let key = (Bag::from_slice(bag), held);
        if let Some(result) = self.memo.get(&key) {
            return result.clone();
        }

        let result: HashSet<Bag> = match bag.split_first() {
            None => {
                let mut only = Bag::new();
                only.extend(held);
                std::iter::once(only).collect()
            }
            Some((&first, rest)) => {
                // hold `first`, playing whatever was held before
                let hold = self.hold_equivalent_bags(rest, Some(first));
                // play `first`, hold unchanged
                let play = self.hold_equivalent_bags(rest, held);
                let mut result = HashSet::with_capacity(hold.len() + play.len());
                for tail in hold {
                    let mut order = Bag::new();
                    order.extend(held);
                    order.extend(tail);
                    result.insert(order);
                }
                for tail in play {
                    let mut order = Bag::new();
                    order.push(first);
                    order.extend(tail);
                    result.insert(order);
                }
                result
            }
        };

        self.memo.insert(key, result.clone());
        result
    }
}

pub fn hold_equivalent_bags(bag: &[Piece], held: Option<Piece>) -> HashSet<Bag> {
    HoldCache::default().hold_equivalent_bags(bag, held)
}

/// Every ordering of `pieces`.
pub fn all_bags(pieces: &[Piece]) -> HashSet<Bag> {
    let mut bags = HashSet::new();
    let mut order = Bag::new();
    let mut used = vec![false; pieces.len()];
    permute(pieces, &mut used, &mut order, &mut bags);
    bags
}

fn permute(pieces: &[Piece], used: &mut [bool], order: &mut Bag, into: &mut HashSet<Bag>) {
    if order.len() == pieces.len() {
        into.insert(order.clone());
        return;
    }
    for i in 0..pieces.len() {
        if used[i] {
            continue;
        }
        used[i] = true;
        order.push(pieces[i]);
        permute(pieces, used, order, into);
        order.pop();
        used[i] = false;
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CoverageRules {
    /// Count bags that reach a covered order through the hold slot.
    pub hold: bool,
    /// Count bags that build the left-right mirror of the board.
    pub mirror: bool,
    /// Only bags ending in this piece count, and the piece itself is not
    /// dropped. Used for spins, where the last piece is tucked in by hand.
    pub force_last: Option<Piece>,
}

/// Analyzer reusing hold reorderings across boards.
#[derive(Default)]
pub struct CoverageAnalyzer {
    hold: HoldCache,
}

impl CoverageAnalyzer {
    pub fn bag_coverage(
        &self,
        grid: &Grid,
        bags: &HashSet<Bag>,
        rules: CoverageRules,
    ) -> Result<HashSet<Bag>, LocateError> {
        let tester = BagTester::new(grid)?;
        let mirrored = if rules.mirror {
            Some(BagTester::new(&grid.mirrored())?)
        } else {
            None
        };
        let possible = |bag: &[Piece]| {
            tester.is_bag_possible(bag)
                || mirrored.as_ref().map_or(false, |m| m.is_bag_possible(bag))
        };

        let holdless: HashSet<Bag> = bags
            .par_iter()
            .filter(|bag| match rules.force_last {
                Some(last) => match bag.split_last() {
                    Some((&p, prefix)) => p == last && possible(prefix),
                    None => false,
                },
                None => possible(&bag[..]),
            })
            .cloned()
            .collect();
        log::debug!("{} of {} bags build the board directly", holdless.len(), bags.len());

        if !rules.hold {
            return Ok(holdless);
        }

        let with_hold: Vec<Bag> = bags
            .par_iter()
            .filter(|bag| !holdless.contains(*bag))
            .filter(|bag| {
                self.hold
                    .hold_equivalent_bags(bag, None)
                    .iter()
                    .any(|order| holdless.contains(order))
            })
            .cloned()
            .collect();
        log::debug!("{} more bags build the board with hold", with_hold.len());

        let mut covered = holdless;
        covered.extend(with_hold);
        Ok(covered)
    }

    /// Greedily take candidates in the given order, crediting each with the
    /// bags no earlier candidate covered.
    ///
    /// This is a ranking heuristic. It does not search for the best cover,
    /// and candidates that add no bags are left out of the result.
    pub fn systematize(
        &self,
        candidates: &[Candidate],
        bags: &HashSet<Bag>,
        rules: CoverageRules,
    ) -> Result<System, LocateError> {
        let mut system = System {
            steps: vec![],
            covered: HashSet::new(),
            total_bags: bags.len(),
            success_rate: 0.0,
        };
        let mut weighted = 0.0;

        for (index, candidate) in candidates.iter().enumerate() {
            if system.covered.len() == bags.len() {
                break;
            }
            let remaining: HashSet<Bag> = bags.difference(&system.covered).cloned().collect();
            let coverage = self.bag_coverage(&candidate.grid, &remaining, rules)?;
            let new_bags = coverage.len();
            system.covered.extend(coverage);
            weighted += new_bags as f64 * candidate.success_rate;
            let success_rate = match bags.len() {
                0 => 0.0,
                n => weighted / n as f64,
            };
            log::info!(
                "Adding {} new bags @ {}% - total {}/{} = {:.2}%",
                new_bags,
                candidate.success_rate,
                system.covered.len(),
                bags.len(),
                success_rate
            );
            system.success_rate = success_rate;
            if new_bags > 0 {
                system.steps.push(SystemStep {
                    index,
                    new_bags,
                    covered: system.covered.len(),
                    success_rate,
                });
            }
        }

        if log::log_enabled!(log::Level::Debug) {
            let mut missing: Vec<String> = bags
                .difference(&system.covered)
                .map(|bag| bag_string(bag))
                .collect();
            missing.sort();
            log::debug!("uncovered bags: {:?}", missing);
        }
        Ok(system)
    }
}

pub fn bag_coverage(
    grid: &Grid,
    bags: &HashSet<Bag>,
    rules: CoverageRules,
) -> Result<HashSet<Bag>, LocateError> {
    CoverageAnalyzer::default().bag_coverage(grid, bags, rules)
}

pub fn systematize(
    candidates: &[Candidate],
    bags: &HashSet<Bag>,
    rules: CoverageRules,
) -> Result<System, LocateError> {
    CoverageAnalyzer::default().systematize(candidates, bags, rules)
}

/// A finished board and the chance of completing it, in percent.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub grid: Grid,
    pub success_rate: f64,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SystemStep {
    /// Position of the candidate in the input list.
    pub index: usize,
    pub new_bags: usize,
    /// Bags covered after this step.
    pub covered: usize,
    /// Running success rate over all bags after this step, in percent.
    pub success_rate: f64,
}

#[derive(Clone, Debug)]
pub struct System {
    pub steps: Vec<SystemStep>,
    pub covered: HashSet<Bag>,
    pub total_bags: usize,
    pub success_rate: f64,
}

#[cfg(test)]
#[path = "coverage-tests.rs"]
mod tests;
