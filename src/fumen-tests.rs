use super::*;
use crate::data::GARBAGE;

const ALBATROSS: &str = "v115@AhBtDewhQ4ywBti0whR4wwRpilg0whAeQ4AeRpglCe?whJeAgl";
const ALBATROSS_NO_T: &str = "v115@AhBtDewhQ4CeBti0whR4AeRpilg0whAeQ4AeRpglCe?whJeAgl";

#[test]
fn decode_albatross() {
    let (grid, comment) = decode(ALBATROSS).unwrap();
    assert_eq!(comment, "");
    assert_eq!(
        grid.rows(),
        &[
            [0, 7, 0, 3, 3, 2, 0, 0, 0, 1],
            [7, 7, 5, 3, 3, 2, 2, 2, 6, 1],
            [7, 5, 5, 5, 4, 4, 6, 6, 6, 1],
            [0, 0, 0, 4, 4, 0, 0, 0, 0, 1],
        ]
    );
}

#[test]
fn decode_strips_blank_rows() {
    let (grid, _) = decode("v115@MhA8heAgH").unwrap();
    assert_eq!(grid.height(), 3);
    assert_eq!(grid.rows()[2], [0, 0, 0, 0, 0, GARBAGE, 0, 0, 0, 0]);
    assert_eq!(grid.rows()[0], EMPTY_ROW);

    let (grid, _) = decode("v115@RhJ8DeF8JeAgl").unwrap();
    assert_eq!(grid.rows(), &[[0, 0, 0, 0, 8, 8, 8, 8, 8, 8], [8; 10]]);
}

#[test]
fn decode_unescapes_comment() {
    let (grid, comment) =
        decode("v115@bhI8KeAgWkAtD98AwG98AwzVTASocTASodOEFbcRAV?DEHBleEHBEoA6A").unwrap();
    assert_eq!(comment, "-m o -f i -p [^T]!");
    assert_eq!(grid.rows(), &[[8, 8, 8, 8, 8, 8, 8, 8, 8, 0]]);
}

#[test]
fn decode_errors() {
    assert_eq!(decode("v114@vhAgH"), Err(FumenError::UnsupportedVersion));
    assert_eq!(decode("v11"), Err(FumenError::UnsupportedVersion));
    assert_eq!(decode("v115@vh!gH"), Err(FumenError::InvalidEncoding('!')));
    assert_eq!(decode("v115@vhAgH"), Err(FumenError::BlankField));
    assert_eq!(decode("v115@vhAAgH"), Err(FumenError::MultiFrameUnsupported));
    assert_eq!(decode("v115@uhAgH"), Err(FumenError::RepeatedFrame));
    assert_eq!(decode("v115@RhJ8"), Err(FumenError::Truncated));
    assert_eq!(decode("v115@RhJ8DeF8JeAgW"), Err(FumenError::Truncated));
}

#[test]
fn comment_alphabet_ends_at_tilde() {
    let (_, comment) = decode("v115@bhI8KeAgWEAeBAAA").unwrap();
    assert_eq!(comment, "~   ");
    assert_eq!(
        decode("v115@bhI8KeAgWEAfBAAA"),
        Err(FumenError::InvalidEncoding('\u{7f}'))
    );
}

#[test]
fn encode_matches_reference_output() {
    let (grid, _) = decode(ALBATROSS_NO_T).unwrap();
    assert_eq!(
        encode([(&grid, "")]).unwrap(),
        "v115@AhBtDewhQ4CeBti0whR4AeRpilg0whAeQ4AeRpglCe?whJeAgH"
    );
    assert_eq!(
        encode([(&grid, "hello world")]).unwrap(),
        "v115@AhBtDewhQ4CeBti0whR4AeRpilg0whAeQ4AeRpglCe?whJeAgWNAooMDEvoo2A3XaDEEBAAA"
    );

    let colours = Grid::from_rows(vec![[1, 2, 3, 4, 5, 6, 7, 8, 0, 0]]);
    assert_eq!(
        encode([(&colours, "100.00%")]).unwrap(),
        "v115@bhwhglQpAtwwg0Q4A8LeAgWJARY0vAQo78AVAAAA"
    );
}

#[test]
fn encode_escapes_solver_arguments() {
    let grid = Grid::from_rows(vec![[8, 8, 8, 8, 8, 8, 8, 8, 8, 0]]);
    assert_eq!(
        encode([(&grid, "-m o -f i -p [^T]!")]).unwrap(),
        "v115@bhI8KeAgWkAtD98AwG98AwzVTASocTASodOEFbcRAV?DEHBleEHBEoA6A"
    );
}

#[test]
fn encode_wraps_long_output() {
    let grid = Grid::from_rows(vec![[1, 2, 3, 4, 5, 6, 7, 8, 0, 0]]);
    let comment = "a".repeat(50);
    assert_eq!(
        encode([(&grid, comment.as_str())]).unwrap(),
        "v115@bhwhglQpAtwwg0Q4A8LeAgWyAhyrdDhyrdDhyrdDhy?rdDhyrdDhyrdDhyrdDhyrdDhyrdDhyrdDhyrdDhyrdDhiBA?A"
    );
}

#[test]
fn encode_diffs_later_frames() {
    let (grid, _) = decode(ALBATROSS_NO_T).unwrap();
    let bottom = Grid::from_rows(grid.rows()[..2].to_vec());
    let encoded = encode([(&grid, "abc"), (&grid, "abc"), (&bottom, "x?")]).unwrap();
    assert_eq!(
        encoded,
        "v115@AhBtDewhQ4CeBti0whR4AeRpilg0whAeQ4AeRpglCe?whJeAgWDABUYCAvhAAAAhBPDeQawDCeBPiHQadeAAPEA446?AC"
    );
    assert_eq!(decode(&encoded), Err(FumenError::MultiFrameUnsupported));
}

#[test]
fn encode_rejects_tall_fields() {
    let grid = Grid::new(24);
    assert_eq!(encode([(&grid, "")]), Err(FumenError::FieldTooTall(24)));
}

#[test]
fn round_trip() {
    let (albatross, _) = decode(ALBATROSS).unwrap();
    let mut tall = Grid::new(23);
    for y in 0..23 {
        tall.set((y * 3 % 10) as i32, y as i32, (y % 8 + 1) as Cell);
    }
    let grids = [albatross.clone(), albatross.mirrored(), tall];
    let comments = ["", "hello world", "50.00%", "a/b?c&d=e", "~tilde_and.dot-"];
    for grid in &grids {
        for &comment in &comments {
            let encoded = encode([(grid, comment)]).unwrap();
            assert_eq!(decode(&encoded).unwrap(), (grid.clone(), comment.to_owned()));
        }
    }
}

#[test]
fn long_comments_are_clipped() {
    let grid = Grid::from_rows(vec![[8; 10], [0, 8, 8, 8, 8, 8, 8, 8, 8, 8]]);
    let comment = " ".repeat(2000);
    let (_, decoded) = decode(&encode([(&grid, comment.as_str())]).unwrap()).unwrap();
    // 1365 whole escapes fit in 4095 characters
    assert_eq!(decoded, " ".repeat(1365));
}

#[test]
fn unescape_handles_unicode_escapes() {
    assert_eq!(unescape("%u00E9t%E9"), "\u{e9}t\u{fffd}");
    assert_eq!(unescape("100%"), "100%");
    assert_eq!(unescape("%zz%+1"), "%zz%+1");
    assert_eq!(unescape("%C3%A9"), "\u{e9}");
}
