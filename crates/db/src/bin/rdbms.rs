use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use db::engine::Engine;

/// Default backing file, in the process working directory.
const DATABASE_FILENAME: &str = "buzzdb.dat";
/// Default input file: whitespace-separated `int int` pairs, one per insert.
const INPUT_FILENAME: &str = "output.txt";

fn main() -> Result<()> {
    env_logger::init();

    let db_path = PathBuf::from(DATABASE_FILENAME);
    let mut engine = Engine::open(&db_path)
        .with_context(|| format!("open database file {}", db_path.display()))?;

    let input = fs::read_to_string(INPUT_FILENAME)
        .with_context(|| format!("open input file {INPUT_FILENAME}"))?;

    let mut numbers = input.split_whitespace();
    while let (Some(key), Some(value)) = (numbers.next(), numbers.next()) {
        let key: i32 = key
            .parse()
            .with_context(|| format!("malformed key token {key:?} in {INPUT_FILENAME}"))?;
        let value: i32 = value
            .parse()
            .with_context(|| format!("malformed value token {value:?} in {INPUT_FILENAME}"))?;
        engine.insert(key, value)?;
    }

    engine.scan_table_to_build_index()?;

    let results = engine.select_group_by_sum(0, i32::MAX);
    println!("Results: {}", results.len());

    Ok(())
}
