//! Compressed archives of search results.
//!
//! An archive is a zstd stream of records, each a little-endian `u64` length
//! followed by that many bytes of bincode.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::setup::Setup;
use crate::solver::SolverCache;

const LEVEL: i32 = 9;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("archive i/o: {0}")]
    Io(#[from] io::Error),
    #[error("archive record: {0}")]
    Bincode(#[from] bincode::Error),
}

/// Compress `records` into `into`, returning the inner writer once the stream
/// is finished.
pub fn write_records<'a, T, W>(
    into: W,
    records: impl IntoIterator<Item = &'a T>,
) -> Result<W, StoreError>
where
    T: Serialize + 'a,
    W: Write,
{
    let mut into = zstd::Encoder::new(into, LEVEL)?;
    into.multithread(rayon::current_num_threads() as u32)?;
    for record in records {
        let buf = bincode::serialize(record)?;
        into.write_all(&(buf.len() as u64).to_le_bytes())?;
        into.write_all(&buf)?;
    }
    Ok(into.finish()?)
}

/// Read every record of a stream written by [`write_records`]. A stream that
/// ends inside a record is an error.
pub fn read_records<T, R>(from: R) -> Result<Vec<T>, StoreError>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut from = zstd::Decoder::new(from)?;
    let mut records = vec![];
    loop {
        let mut len = [0; 8];
        match from.read_exact(&mut len) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }
        let len = u64::from_le_bytes(len);

        let mut buf = vec![0; len as usize];
        from.read_exact(&mut buf)?;
        records.push(bincode::deserialize(&buf)?);
    }
    Ok(records)
}

/// Write through a temporary file so an interrupted save keeps the old archive.
fn save<'a, T: Serialize + 'a>(
    path: &Path,
    records: impl IntoIterator<Item = &'a T>,
) -> Result<(), StoreError> {
    let tmp = path.with_extension("tmp");
    write_records(File::create(&tmp)?, records)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

pub fn save_setups(path: &Path, setups: &[Setup]) -> Result<(), StoreError> {
    let t = std::time::Instant::now();
    save(path, setups)?;
    log::info!(
        "Saved {} setups to {} in {:.2?}",
        setups.len(),
        path.display(),
        t.elapsed()
    );
    Ok(())
}

pub fn load_setups(path: &Path) -> Result<Vec<Setup>, StoreError> {
    let setups: Vec<Setup> = read_records(File::open(path)?)?;
    log::info!("Loaded {} setups from {}", setups.len(), path.display());
    Ok(setups)
}

pub fn save_cache(path: &Path, cache: &SolverCache) -> Result<(), StoreError> {
    save(path, [cache])?;
    log::info!("Saved {} solver answers", cache.len());
    Ok(())
}

/// A missing file is an empty cache.
pub fn load_cache(path: &Path) -> Result<SolverCache, StoreError> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(SolverCache::default()),
        Err(e) => return Err(e.into()),
    };
    let cache = read_records::<SolverCache, _>(file)?
        .into_iter()
        .next()
        .unwrap_or_default();
    log::info!("Loaded {} solver answers", cache.len());
    Ok(cache)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::solver::{CachedSolver, Solution, Solver, SolverError};

    const ALBATROSS: &str = "v115@AhBtDewhQ4ywBti0whR4wwRpilg0whAeQ4AeRpglCe?whJeAgl";
    const ALBATROSS_NO_T: &str = "v115@AhBtDewhQ4CeBti0whR4AeRpilg0whAeQ4AeRpglCe?whJeAgl";

    fn tree() -> Vec<Setup> {
        let mut root = Setup::new(Solution::from_fumen(ALBATROSS_NO_T).unwrap());
        root.add_continuations(vec![Solution::from_fumen(ALBATROSS).unwrap()]);
        root.continuations[0].success_rate = 87.5;
        root.success_rate = 87.5;
        vec![root, Setup::new(Solution::from_fumen(ALBATROSS).unwrap())]
    }

    #[test]
    fn setups_survive_the_archive() {
        let setups = tree();
        let bytes = write_records(vec![], &setups).unwrap();
        let back: Vec<Setup> = read_records(Cursor::new(bytes)).unwrap();

        assert_eq!(back.len(), 2);
        assert_eq!(back[0].success_rate, 87.5);
        assert_eq!(back[0].continuations[0].solution, setups[0].continuations[0].solution);
        assert_eq!(back[0].to_fumen().unwrap(), setups[0].to_fumen().unwrap());
        assert!(back[1].continuations.is_empty());
    }

    #[test]
    fn empty_and_cut_archives() {
        let none: [Setup; 0] = [];
        let bytes = write_records(vec![], &none).unwrap();
        let back: Vec<Setup> = read_records(Cursor::new(bytes)).unwrap();
        assert!(back.is_empty());

        // decompress, drop the tail of the last record, compress again
        let whole = write_records(vec![], &tree()).unwrap();
        let mut raw = zstd::decode_all(Cursor::new(whole)).unwrap();
        raw.truncate(raw.len() - 3);
        let cut = zstd::encode_all(Cursor::new(raw), LEVEL).unwrap();
        assert!(matches!(
            read_records::<Setup, _>(Cursor::new(cut)),
            Err(StoreError::Io(_))
        ));
    }

    struct Fixed;

    impl Solver for Fixed {
        fn setup(&self, _: &str) -> Result<Option<Vec<String>>, SolverError> {
            Ok(None)
        }

        fn percent(&self, _: &str, _: &str, height: usize) -> Result<f64, SolverError> {
            Ok(height as f64 * 10.0)
        }
    }

    #[test]
    fn solver_cache_round_trip() {
        let solver = CachedSolver::new(Fixed, SolverCache::default());
        assert_eq!(solver.setup("board").unwrap(), None);
        assert_eq!(solver.percent("board", "*p7", 4).unwrap(), 40.0);

        let bytes = write_records(vec![], [&solver.into_cache()]).unwrap();
        let cache = read_records::<SolverCache, _>(Cursor::new(bytes))
            .unwrap()
            .remove(0);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn files_on_disk() {
        let dir = std::env::temp_dir().join(format!("setup-analysis-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("setups.dat");

        save_setups(&path, &tree()).unwrap();
        assert_eq!(load_setups(&path).unwrap().len(), 2);
        assert!(!path.with_extension("tmp").exists());

        assert!(load_cache(&dir.join("missing.dat")).unwrap().is_empty());
        assert!(matches!(
            load_setups(&dir.join("missing.dat")),
            Err(StoreError::Io(_))
        ));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
