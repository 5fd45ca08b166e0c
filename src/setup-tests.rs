use std::cell::RefCell;
use std::collections::HashMap;

use super::*;

const ALBATROSS: &str = "v115@AhBtDewhQ4ywBti0whR4wwRpilg0whAeQ4AeRpglCe?whJeAgl";
const ALBATROSS_NO_T: &str = "v115@AhBtDewhQ4CeBti0whR4AeRpilg0whAeQ4AeRpglCe?whJeAgl";
const DT_CANNON: &str =
    "v115@hghlQ4BeAtEeglR4BtAewhh0AeglA8Q4AtRpwhg0Be?D8Rpwhg0CeE8whB8AeI8AeG8JeAgH";

/// Answers every setup request with the same boards and looks success rates
/// up by the piece sequence in the diagram's comment.
#[derive(Default)]
struct Stub {
    answers: Vec<String>,
    rates: HashMap<String, f64>,
    asked: RefCell<Vec<String>>,
}

impl Solver for Stub {
    fn setup(&self, diagram: &str) -> Result<Option<Vec<String>>, SolverError> {
        self.asked.borrow_mut().push(diagram.to_owned());
        Ok(Some(self.answers.clone()))
    }

    fn percent(&self, diagram: &str, _: &str, _: usize) -> Result<f64, SolverError> {
        let (_, sequence) = fumen::decode(diagram)?;
        self.rates
            .get(&sequence)
            .copied()
            .ok_or_else(|| SolverError::Failed(format!("unknown board {}", sequence)))
    }
}

fn solution(diagram: &str, sequence: &str) -> Solution {
    Solution {
        grid: Grid::parse_diagram(diagram).unwrap(),
        fumen: String::new(),
        sequence: sequence.to_owned(),
    }
}

const TSD_BOARD: &str = "XX________
                         X___XXXXXX
                         XX_XXXXXXX";

fn tsd_search(filter: SpinFilter) -> SpinSearch {
    SpinSearch {
        kind: SetupKind::Tsd,
        rows: vec![1],
        cols: vec![2],
        mirrors: true,
        filter,
    }
}

fn tsd_answer() -> String {
    fumen::encode([(&Grid::parse_diagram(TSD_BOARD).unwrap(), "IOLJSZ")]).unwrap()
}

#[test]
fn tsd_filters() {
    let mut sol = solution(TSD_BOARD, "IOLJSZ");
    assert!(probe_tsd(&sol, 2, 1));
    assert_eq!(sol.grid.height(), 3);
    assert!(!probe_tsd(&sol, 3, 1));

    assert!(complete_tsd(&mut sol, 2, 1));
    assert_eq!(sol.sequence, "IOLJSZT");
    assert_eq!(sol.grid.height(), 1);

    // a full bag leaves no T for the slot
    let mut full = solution(TSD_BOARD, "IOLJSZT");
    assert!(!complete_tsd(&mut full, 2, 1));
    assert!(probe_tsd(&full, 2, 1));
}

#[test]
fn tss_and_tst_filters() {
    let mut single = solution(
        "XX________
         X___XXXXXX
         XX_XXXXX_X",
        "IOLJSZ",
    );
    assert!(complete_tss(&mut single, 2, 1, TStance::Flat));
    assert_eq!(single.grid.cleared_rows(), 1);

    let mut double = solution(TSD_BOARD, "IOLJSZ");
    assert!(!complete_tss(&mut double, 2, 1, TStance::Flat));

    let mut triple = solution(
        "XX_XXXXXXX
         X__XXXXXXX
         XX_XXXXXXX",
        "IOLJSZ",
    );
    assert!(complete_tst(&mut triple, 1, 1, false));
    assert_eq!(triple.grid.height(), 0);

    let mut off_board = solution(TSD_BOARD, "IOLJSZ");
    assert!(!complete_tst(&mut off_board, 9, 1, false));
    assert_eq!(off_board.sequence, "IOLJSZ");
}

#[test]
fn search_asks_for_each_slot() {
    let stub = Stub {
        answers: vec![tsd_answer()],
        ..Stub::default()
    };
    let found = tsd_search(SpinFilter::Complete)
        .continuations(&stub, &Grid::default())
        .unwrap();

    let asked = stub.asked.borrow();
    assert_eq!(asked.len(), 2);
    assert_eq!(
        asked[0],
        "v115@pgQpBeXpBeXpBeXpBewhVpwhCe3hAe2hJeAgWkAtD9?8AwG98AwzVTASocTASodOEFbcRAVDEHBleEHBEoA6A"
    );
    assert_eq!(found.len(), 2);
    for sol in &found {
        assert_eq!(sol.sequence, "IOLJSZT");
        assert_eq!(sol.grid.cleared_rows(), 2);
        assert_eq!(sol.fumen, tsd_answer());
    }
}

#[test]
fn search_filters_leave_boards_alone() {
    let stub = Stub {
        answers: vec![tsd_answer()],
        ..Stub::default()
    };
    for filter in [SpinFilter::Any, SpinFilter::Probe] {
        let found = tsd_search(filter)
            .continuations(&stub, &Grid::default())
            .unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|s| s.sequence == "IOLJSZ" && s.grid.height() == 3));
    }

    let wrong = SpinSearch {
        cols: vec![5],
        ..tsd_search(SpinFilter::Probe)
    };
    assert!(wrong.continuations(&stub, &Grid::default()).unwrap().is_empty());
}

#[test]
fn blocked_slots_are_not_searched() {
    let stub = Stub::default();
    let mut grid = Grid::new(5);
    // inside the left-facing opening only
    grid.set(1, 4, 1);
    tsd_search(SpinFilter::Any)
        .continuations(&stub, &grid)
        .unwrap();
    assert_eq!(stub.asked.borrow().len(), 1);

    // off the board either way round
    let edge = SpinSearch {
        cols: vec![0],
        ..tsd_search(SpinFilter::Any)
    };
    edge.continuations(&stub, &Grid::default()).unwrap();
    assert_eq!(stub.asked.borrow().len(), 1);
}

#[test]
fn tetris_search_uses_first_row() {
    let stub = Stub::default();
    let search = SpinSearch {
        kind: SetupKind::Tetris,
        rows: vec![0, 1],
        cols: vec![9],
        mirrors: true,
        filter: SpinFilter::Complete,
    };
    search.continuations(&stub, &Grid::default()).unwrap();
    assert_eq!(
        *stub.asked.borrow(),
        ["v115@fgYpAeYpAeYpAe4hAe4hAe4hAe4hKeAgWcAtD98AwG?98AwzVTASocTASodOEFbcRAyxcQB"]
    );
}

#[test]
fn continuations_grow_leaves_and_drop_dead_ends() {
    let stub = Stub {
        answers: vec![tsd_answer()],
        ..Stub::default()
    };
    let search = SpinSearch {
        mirrors: false,
        ..tsd_search(SpinFilter::Any)
    };
    let mut blocked = Grid::new(5);
    blocked.set(1, 4, 1);

    let mut root = Setup::new(solution("XXXXXXXXX_", ""));
    assert!(root.add_continuations(vec![
        Solution {
            grid: Grid::default(),
            fumen: String::new(),
            sequence: String::new(),
        },
        Solution {
            grid: blocked,
            fumen: String::new(),
            sequence: String::new(),
        },
    ]));
    assert!(!root.add_continuations(vec![]));

    root.find_continuations(&stub, &search).unwrap();
    assert_eq!(root.continuations.len(), 1);
    assert_eq!(root.continuations[0].continuations.len(), 1);

    let mut setups = initial_setups(&stub, &tsd_search(SpinFilter::Any)).unwrap();
    // mirrors are not searched for the first bag
    assert_eq!(setups.len(), 1);
    // the first bag's stack is in the way of the same slot
    extend_setups(&mut setups.clone(), &stub, &search).unwrap();
    let higher = SpinSearch {
        rows: vec![4],
        ..search
    };
    extend_setups(&mut setups, &stub, &higher).unwrap();
    assert_eq!(setups.len(), 1);
    assert_eq!(setups[0].continuations.len(), 1);
}

fn leaf(sequence: &str, rows: &str) -> Setup {
    Setup::new(solution(rows, sequence))
}

#[test]
fn success_rates_roll_up() {
    let rates = [("IOLJSZT", 100.0), ("TSZJLOI", 100.0), ("LJSZIOT", 40.0)];
    let stub = Stub {
        rates: rates.iter().map(|&(s, r)| (s.to_owned(), r)).collect(),
        ..Stub::default()
    };

    let mut root = leaf("", "XXXXXXXXX_");
    root.continuations = vec![
        leaf("LJSZIOT", "XXXXXXXXX_"),
        leaf("IOLJSZT", "XXXXXXXXX_"),
        leaf("TSZJLOI", "XXXXXXXX__"),
        // too tall to clear in four rows
        leaf("OOOOOO", "X_________\nX_________\nX_________\nX_________\nX_________"),
    ];

    assert!(root.find_pcs(&stub, 4, 50.0).unwrap());
    assert_eq!(root.success_rate, 101.0);
    let kept: Vec<&str> = root
        .continuations
        .iter()
        .map(|c| c.solution.sequence.as_str())
        .collect();
    assert_eq!(kept, ["IOLJSZT", "TSZJLOI"]);

    let mut hopeless = leaf("", "XXXXXXXXX_");
    hopeless.continuations = vec![leaf("LJSZIOT", "XXXXXXXXX_")];
    assert!(!hopeless.find_pcs(&stub, 4, 50.0).unwrap());
    assert!(hopeless.continuations.is_empty());

    let mut unknown = leaf("", "XXXXXXXXX_");
    unknown.continuations = vec![leaf("ZZZ", "XXXXXXXXX_")];
    assert!(matches!(
        unknown.find_pcs(&stub, 4, 50.0),
        Err(SolverError::Failed(_))
    ));
}

#[test]
fn finished_setups_are_sorted() {
    let rates = [("IOLJSZT", 100.0), ("LJSZIOT", 60.0)];
    let stub = Stub {
        rates: rates.iter().map(|&(s, r)| (s.to_owned(), r)).collect(),
        ..Stub::default()
    };
    let mut worse = leaf("", "XXXXXXXXX_");
    worse.continuations = vec![leaf("LJSZIOT", "XXXXXXXXX_")];
    let mut better = leaf("", "XXXXXXXX__");
    better.continuations = vec![leaf("IOLJSZT", "XXXXXXXXX_")];

    let mut setups = vec![worse, better];
    finish_setups(&mut setups, &stub, 4, 50.0).unwrap();
    let rates: Vec<f64> = setups.iter().map(|s| s.success_rate).collect();
    assert_eq!(rates, [100.0, 60.0]);
}

fn from_fumen(diagram: &str, success_rate: f64) -> Setup {
    Setup {
        success_rate,
        ..Setup::new(Solution::from_fumen(diagram).unwrap())
    }
}

#[test]
fn setups_export_as_captioned_pages() {
    let mut root = from_fumen(ALBATROSS_NO_T, 100.0);
    assert_eq!(root.to_fumen().unwrap(), ALBATROSS_NO_T);

    root.continuations = vec![from_fumen(ALBATROSS, 100.0), from_fumen(DT_CANNON, 0.0)];
    assert_eq!(
        root.to_fumen().unwrap(),
        "v115@AhBtDewhQ4CeBti0whR4AeRpilg0whAeQ4AeRpglCe?whJeAgHIhywHewwaeAAPJARY0vAQo78AVAAAAhghlQ4BeAt?EeglR4BtAewhh0AeglA8Q4AtRpwhg0BeBtB8RpAeQaSLBti?lAexhQLxwi0glQ4A8whAexwg0C8Q4JeAAPAA"
    );

    root.continuations[0].success_rate = 101.0;
    root.continuations[1].success_rate = 37.5;
    assert_eq!(
        root.to_fumen().unwrap(),
        "v115@AhBtDewhQ4CeBti0whR4AeRpilg0whAeQ4AeRpglCe?whJeAgHIhywHewwaeAAPJARo2vAQo78AVAAAAhghlQ4BeAt?EeglR4BtAewhh0AeglA8Q4AtRpwhg0BeBtB8RpAeQaSLBti?lAexhQLxwi0glQ4A8whAexwg0C8Q4JeAAPIAzCYHBwngHB"
    );

    let candidates = root.candidates().unwrap();
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].grid, fumen::decode(ALBATROSS).unwrap().0);
    assert_eq!(candidates[1].success_rate, 37.5);

    let text = root.to_string();
    assert!(text.contains(&format!("Fumen: {}", ALBATROSS_NO_T)));
    assert!(text.contains(&format!("{} (101.00%)", ALBATROSS)));
}
