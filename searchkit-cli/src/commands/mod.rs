pub mod count;
pub mod group_by;
pub mod parse;
pub mod search;

pub use count::run_count;
pub use group_by::{run_group_by, GroupByOptions};
pub use search::{run_search, SearchOptions};

use anyhow::Result;
use serde::Serialize;
use std::io::Write;

/// Write one value as a JSON line
fn emit<W: Write, T: Serialize>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer(&mut *out, value)?;
    out.write_all(b"\n")?;
    Ok(())
}
