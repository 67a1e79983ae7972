//! Command handlers, one module per subcommand.

pub mod calibrate;
pub mod det;
pub mod fuse;
pub mod search;

use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;

/// Read a JSON Lines file, one record per non-empty line.
pub(crate) fn read_jsonl<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read '{}'", path.display()))?;
    let mut records = Vec::new();
    for (line_no, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: T = serde_json::from_str(line)
            .with_context(|| format!("{}:{}", path.display(), line_no + 1))?;
        records.push(record);
    }
    Ok(records)
}
