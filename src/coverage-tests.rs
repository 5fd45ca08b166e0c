use super::*;
use crate::data::parse_seq;
use crate::fumen;

const ALBATROSS_NO_T: &str = "v115@AhBtDewhQ4CeBti0whR4AeRpilg0whAeQ4AeRpglCe?whJeAgl";

fn albatross() -> Grid {
    fumen::decode(ALBATROSS_NO_T).unwrap().0
}

fn bag(s: &str) -> Bag {
    parse_seq(s).unwrap()
}

fn bags(list: &[&str]) -> HashSet<Bag> {
    list.iter().map(|s| bag(s)).collect()
}

fn rules(hold: bool, mirror: bool) -> CoverageRules {
    CoverageRules {
        hold,
        mirror,
        force_last: None,
    }
}

#[test]
fn hard_drop_orders() {
    let grid = albatross();
    for order in ["SOLIZJ", "OSILJZ", "ILJOZS"] {
        assert!(is_bag_possible(&grid, &bag(order)).unwrap(), "{}", order);
    }
    // these need hold
    for order in ["SZOLJI", "OSIJLZ", "ILJSZO"] {
        assert!(!is_bag_possible(&grid, &bag(order)).unwrap(), "{}", order);
    }
    // the board has no T
    assert!(!is_bag_possible(&grid, &bag("TSOLIZJ")).unwrap());
}

#[test]
fn malformed_boards_are_reported() {
    let grid = Grid::from_rows(vec![[5, 5, 5, 5, 5, 0, 0, 0, 0, 0]]);
    assert!(matches!(
        is_bag_possible(&grid, &bag("T")),
        Err(LocateError::MalformedPieceCount { .. })
    ));
}

#[test]
fn hold_reorderings() {
    assert_eq!(
        hold_equivalent_bags(&bag("STZ"), None),
        bags(&["STZ", "SZT", "TSZ", "TZS"])
    );
    assert_eq!(
        hold_equivalent_bags(&bag("IOSZ"), None),
        bags(&["IOSZ", "IOZS", "ISOZ", "ISZO", "OISZ", "OIZS", "OSIZ", "OSZI"])
    );
    assert_eq!(
        hold_equivalent_bags(&bag("IOS"), Some(Piece::T)),
        bags(&["IOST", "IOTS", "ITOS", "ITSO", "TIOS", "TISO", "TOIS", "TOSI"])
    );
    assert_eq!(hold_equivalent_bags(&[], None), bags(&[""]));
    assert_eq!(hold_equivalent_bags(&[], Some(Piece::T)), bags(&["T"]));
}

#[test]
fn hold_cache_is_consistent() {
    let cache = HoldCache::default();
    let first = cache.hold_equivalent_bags(&bag("TSOLIZJ"), None);
    assert_eq!(first.len(), 64);
    assert_eq!(cache.hold_equivalent_bags(&bag("TSOLIZJ"), None), first);
    assert!(first.contains(&bag("SOLIZJT")));
}

#[test]
fn permutations() {
    assert_eq!(all_bags(&bag("ILOZJS")).len(), 720);
    assert_eq!(all_bags(&bag("IOTLJSZ")).len(), 5040);
    assert_eq!(all_bags(&bag("TS")), bags(&["TS", "ST"]));
    assert_eq!(all_bags(&[]), bags(&[""]));
}

#[test]
fn coverage_grows_with_each_rule() {
    let grid = albatross();
    let all = all_bags(&bag("ILOZJS"));

    let plain = bag_coverage(&grid, &all, rules(false, false)).unwrap();
    let hold = bag_coverage(&grid, &all, rules(true, false)).unwrap();
    let both = bag_coverage(&grid, &all, rules(true, true)).unwrap();
    let mirror = bag_coverage(&grid, &all, rules(false, true)).unwrap();

    assert_eq!(plain.len(), 150);
    assert_eq!(hold.len(), 480);
    assert_eq!(both.len(), 720);
    assert_eq!(mirror.len(), 300);
    assert!(plain.is_subset(&hold));
    assert!(hold.is_subset(&both));
    assert!(plain.is_subset(&mirror));

    for order in ["SZOLJI", "OSIJLZ", "ILJSZO"] {
        assert!(!plain.contains(&bag(order)));
        assert!(hold.contains(&bag(order)));
    }
}

#[test]
fn forced_last_piece() {
    let grid = albatross();
    let all = all_bags(&bag("IOTLJSZ"));
    let spin = |hold| CoverageRules {
        hold,
        mirror: false,
        force_last: Some(Piece::T),
    };

    let plain = bag_coverage(&grid, &all, spin(false)).unwrap();
    assert_eq!(plain.len(), 150);
    assert!(plain.iter().all(|b| b.last() == Some(&Piece::T)));
    assert_eq!(bag_coverage(&grid, &all, spin(true)).unwrap().len(), 1848);
}

#[test]
fn systematize_credits_only_new_bags() {
    let grid = albatross();
    let candidates = [
        Candidate {
            grid: grid.clone(),
            success_rate: 80.0,
        },
        Candidate {
            grid: grid.mirrored(),
            success_rate: 50.0,
        },
        // same board again adds nothing
        Candidate {
            grid,
            success_rate: 100.0,
        },
    ];
    let all = all_bags(&bag("IOTLJSZ"));
    let system = systematize(
        &candidates,
        &all,
        CoverageRules {
            hold: true,
            mirror: false,
            force_last: Some(Piece::T),
        },
    )
    .unwrap();

    assert_eq!(system.total_bags, 5040);
    assert_eq!(system.steps.len(), 2);
    assert_eq!(system.steps[0].index, 0);
    assert_eq!(system.steps[0].new_bags, 1848);
    assert_eq!(system.steps[0].covered, 1848);
    assert!((system.steps[0].success_rate - 29.333).abs() < 0.001);
    assert_eq!(system.steps[1].index, 1);
    assert_eq!(system.steps[1].new_bags, 1008);
    assert_eq!(system.steps[1].covered, 2856);
    assert!((system.success_rate - 39.333).abs() < 0.001);
    assert_eq!(system.covered.len(), 2856);
}

#[test]
fn mirrored_boards_match_reference_diagrams() {
    let dt = "v115@hghlQ4BeAtEeglR4BtAewhh0AeglA8Q4AtRpwhg0Be?D8Rpwhg0CeE8whB8AeI8AeG8JeAgH";
    let (grid, _) = fumen::decode(dt).unwrap();
    assert_eq!(
        fumen::encode([(&grid.mirrored(), "")]).unwrap(),
        "v115@hgQ4BeAth0BewhAeR4Btg0CewhRpQ4AtA8g0Aehlwh?RpD8BeglwhE8CeglG8AeI8AeB8JeAgH"
    );
    assert_eq!(
        fumen::encode([(&albatross().mirrored(), "")]).unwrap(),
        "v115@9gwhDeR4CewhilR4CeAtwhgli0RpAeBtwhCeg0RpAe?AtKeAgH"
    );
    assert!(is_bag_possible(&grid, &bag("IOSZ")).unwrap());
}
