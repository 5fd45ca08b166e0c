//! Reading and writing v1.15 field diagrams.
//!
//! Only the field and comment of each page are understood. Piece and flag
//! data beyond the comment bit is skipped on read, and written as zero
//! apart from the guideline colour flag on the first page.

use crate::data::{Cell, WIDTH};
use crate::field::{Grid, Row, EMPTY_ROW};

pub const VERSION: &str = "v115@";

const FIELD_BLOCKS: usize = 240;
/// Rows above the permanently blank bottom row of a page.
const FIELD_HEIGHT: usize = 23;
const COLOR_BIAS: i64 = 8;
const MAX_COMMENT: usize = 4095;

const ENC_TABLE: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum FumenError {
    #[error("unsupported diagram version")]
    UnsupportedVersion,
    #[error("invalid character {0:?} in diagram")]
    InvalidEncoding(char),
    #[error("diagram data ends early")]
    Truncated,
    #[error("repeated frames are not implemented")]
    RepeatedFrame,
    #[error("data remains after the first frame")]
    MultiFrameUnsupported,
    #[error("field is blank")]
    BlankField,
    #[error("field of height {0} does not fit in a diagram page")]
    FieldTooTall(usize),
}

struct Reader {
    data: Vec<u8>,
    pos: usize,
}

impl Reader {
    /// Little-endian base-64 value of the next `digits` symbols.
    fn take(&mut self, digits: usize) -> Result<i64, FumenError> {
        let end = self.pos + digits;
        let slice = self.data.get(self.pos..end).ok_or(FumenError::Truncated)?;
        self.pos = end;
        Ok(slice.iter().rev().fold(0, |v, &d| v * 64 + d as i64))
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}

/// Decode a single-page diagram into its field and comment.
pub fn decode(diagram: &str) -> Result<(Grid, String), FumenError> {
    let payload = diagram
        .strip_prefix(VERSION)
        .ok_or(FumenError::UnsupportedVersion)?;
    let data = payload
        .chars()
        .filter(|&c| c != '?')
        .map(|c| {
            ENC_TABLE
                .iter()
                .position(|&e| e as char == c)
                .map(|v| v as u8)
                .ok_or(FumenError::InvalidEncoding(c))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let mut reader = Reader { data, pos: 0 };

    let mut field = [0 as Cell; FIELD_BLOCKS];
    let mut j = 0;
    while j < FIELD_BLOCKS {
        let v = reader.take(2)?;
        let run = (v % FIELD_BLOCKS as i64) as usize + 1;
        let block = (v / FIELD_BLOCKS as i64) % 17 - COLOR_BIAS;
        if block == 0 && run == FIELD_BLOCKS - 1 {
            return Err(FumenError::RepeatedFrame);
        }
        if j + run > FIELD_BLOCKS {
            return Err(FumenError::Truncated);
        }
        field[j..j + run].fill(block as Cell);
        j += run;
    }

    let flags = reader.take(3)?;
    let has_comment = (flags / (256 * FIELD_BLOCKS as i64)) % 2 == 1;

    let mut comment = String::new();
    if has_comment {
        let len = (reader.take(2)? % 4096) as usize;
        while comment.len() < len {
            let mut v = reader.take(5)?;
            for _ in 0..4 {
                let c = char::from(b' ' + (v % 96) as u8);
                // printable ASCII only
                if c == '\u{7f}' {
                    return Err(FumenError::InvalidEncoding(c));
                }
                comment.push(c);
                v /= 96;
            }
        }
        comment.truncate(len);
    }

    if reader.remaining() > 0 {
        return Err(FumenError::MultiFrameUnsupported);
    }

    Ok((field_to_grid(&field)?, unescape(&comment)))
}

fn field_to_grid(field: &[Cell; FIELD_BLOCKS]) -> Result<Grid, FumenError> {
    let rows: Vec<Row> = field
        .chunks(WIDTH)
        .map(|c| {
            let mut row = EMPTY_ROW;
            row.copy_from_slice(c);
            row
        })
        .collect();
    let start = rows
        .iter()
        .position(|row| *row != EMPTY_ROW)
        .ok_or(FumenError::BlankField)?;
    let top_down = rows[start.min(FIELD_HEIGHT)..FIELD_HEIGHT].to_vec();
    Ok(Grid::from_top_down(top_down))
}

/// Encode pages as a diagram. Each page's field is stored as a difference
/// from the previous page, and comments are only written when they change.
pub fn encode<'a>(frames: impl IntoIterator<Item = (&'a Grid, &'a str)>) -> Result<String, FumenError> {
    let mut data: Vec<u8> = vec![];
    let mut prev_comment = "";
    let mut guideline_colors = 1;
    let mut prev_frame = [0i64; FIELD_BLOCKS];

    for (grid, comment) in frames {
        if grid.height() > FIELD_HEIGHT {
            return Err(FumenError::FieldTooTall(grid.height()));
        }
        let mut new_frame = [0i64; FIELD_BLOCKS];
        for (y, row) in grid.rows().iter().enumerate() {
            for (x, &c) in row.iter().enumerate() {
                new_frame[(FIELD_HEIGHT - 1 - y) * WIDTH + x] = c as i64;
            }
        }

        let mut frame = [0i64; FIELD_BLOCKS];
        for i in 0..FIELD_BLOCKS {
            frame[i] = new_frame[i] + COLOR_BIAS - prev_frame[i];
        }

        let mut repeat = 0;
        for j in 0..FIELD_BLOCKS - 1 {
            repeat += 1;
            if frame[j] != frame[j + 1] {
                push_digits(&mut data, frame[j] * FIELD_BLOCKS as i64 + repeat - 1, 2);
                repeat = 0;
            }
        }
        push_digits(
            &mut data,
            frame[FIELD_BLOCKS - 1] * FIELD_BLOCKS as i64 + repeat,
            2,
        );

        let changed = comment != prev_comment;
        let flags = 128 * FIELD_BLOCKS as i64 * (changed as i64 * 2 + guideline_colors);
        guideline_colors = 0;
        push_digits(&mut data, flags, 3);

        if changed {
            let escaped = escape(comment);
            let mut chars: Vec<i64> = escaped.bytes().map(|b| (b - b' ') as i64).collect();
            let len = chars.len();
            chars.resize((len + 3) / 4 * 4, 0);

            push_digits(&mut data, len as i64, 2);
            for c in chars.chunks(4) {
                let v = c[0] + c[1] * 96 + c[2] * 9216 + c[3] * 884736;
                push_digits(&mut data, v, 5);
            }
        }

        prev_frame = new_frame;
        prev_comment = comment;
    }

    let mut out = String::from(VERSION);
    for (i, &d) in data.iter().enumerate() {
        out.push(ENC_TABLE[d as usize] as char);
        // first break after 42 symbols, then every 47
        if i % 47 == 41 {
            out.push('?');
        }
    }
    Ok(out)
}

fn push_digits(data: &mut Vec<u8>, mut v: i64, digits: usize) {
    for _ in 0..digits {
        data.push(v.rem_euclid(64) as u8);
        v = v.div_euclid(64);
    }
}

/// Percent-escape everything but unreserved characters and `/`, then clip
/// to the longest length a page can declare without splitting an escape.
fn escape(comment: &str) -> String {
    let mut out = String::with_capacity(comment.len());
    for b in comment.bytes() {
        if b.is_ascii_alphanumeric() || b"_.-~/".contains(&b) {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    if out.len() > MAX_COMMENT {
        out.truncate(MAX_COMMENT);
        if out.ends_with('%') {
            out.pop();
        } else if out[..out.len() - 1].ends_with('%') {
            out.truncate(out.len() - 2);
        }
    }
    out
}

/// Undo `%XX` and `%uXXXX` escapes. Malformed escapes are kept literally.
fn unescape(comment: &str) -> String {
    let bytes = comment.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if bytes.get(i + 1) == Some(&b'u') {
                let code = comment
                    .get(i + 2..i + 6)
                    .and_then(hex)
                    .and_then(char::from_u32);
                if let Some(c) = code {
                    let mut buf = [0; 4];
                    out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                    i += 6;
                    continue;
                }
            } else if let Some(b) = comment.get(i + 1..i + 3).and_then(hex) {
                out.push(b as u8);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex(digits: &str) -> Option<u32> {
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}

#[cfg(test)]
#[path = "fumen-tests.rs"]
mod tests;
