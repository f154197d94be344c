//! Persistence of the ordered retrieval table.

use crate::retrieval::record::WindowResult;
use itertools::Itertools;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Column order of the persisted table.
pub const HEADER: &str =
    "xo,xa,xb,lon,lat,roll,Psc,Psn,Pbc,Pbn,Rsc,Rsn,Rbc,Rbn,crls,crlb,e1,sh,h0,h1,Q1";

/// Output path for a track file: `_rsr.txt` replaces a trailing `.txt`
/// extension, or is appended when the input carries another name.
#[must_use]
pub fn output_path(input: &Path) -> PathBuf {
    if input.extension().and_then(|e| e.to_str()) == Some("txt") {
        if let Some(stem) = input.file_stem().and_then(|s| s.to_str()) {
            return input.with_file_name(format!("{stem}_rsr.txt"));
        }
    }
    let mut name = input.as_os_str().to_owned();
    name.push("_rsr.txt");
    PathBuf::from(name)
}

/// Writes the ordered table to `path`, going through a temporary `.part`
/// file in the same directory and renaming only once every row is on disk,
/// so a partial table is never left behind under the final name.
///
/// # Errors
/// Will return `Err` if the file cannot be created, written or renamed.
pub fn write_table(results: &[WindowResult], path: &Path) -> std::io::Result<()> {
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".part");
    let tmp = PathBuf::from(tmp_name);

    let mut file = fs::File::create(&tmp)?;
    writeln!(file, "{HEADER}")?;
    for result in results {
        writeln!(file, "{}", format_row(result))?;
    }
    file.flush()?;
    drop(file);
    fs::rename(&tmp, path)?;
    info!(path = %path.display(), rows = results.len(), "wrote retrieval table");
    Ok(())
}

/// Formats one record as a delimited row. Floats are serialized with fixed
/// precision so identical runs produce byte-identical tables.
fn format_row(r: &WindowResult) -> String {
    let floats = [
        r.lon, r.lat, r.roll, r.psc, r.psn, r.pbc, r.pbn, r.rsc, r.rsn, r.rbc, r.rbn, r.crls,
        r.crlb, r.e1, r.sh, r.h0, r.h1, r.q1,
    ];
    format!(
        "{},{},{},{}",
        r.xo,
        r.xa,
        r.xb,
        floats.iter().map(|v| format!("{v:.6}")).join(",")
    )
}
