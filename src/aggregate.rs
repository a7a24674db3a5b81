//! the aggregation stage: scan the output root for per-molecule
//! descriptor artifacts, assemble one flat record per molecule, and
//! fan the survivors into a single CSV.
//!
//! the defining property here is per-record isolation. missing files
//! and corrupt JSON are expected conditions, so assembly returns
//! `Result<Record, SkipReason>` rather than bubbling errors: the
//! aggregator collects the `Ok`s, logs the skips, and never lets one
//! bad molecule abort the batch.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::{info, warn};
use serde_json::Value;
use thiserror::Error;

use crate::artifact::{
    sanitize_file_name, ALVA_DESC, MOLEC_CANON_SMI, MOLEC_SMI, MOPAC_OUT, RUN_LOG,
};
use crate::descriptor::flatten;
use crate::error::Result;
use crate::mopac::{merge_descriptors, MergeError};
use crate::table::{write_output_table, Record};

/// why one molecule was left out of the aggregated table
#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("missing {name} in {dir:?}")]
    MissingFile { name: String, dir: PathBuf },

    #[error("unreadable {path:?}: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("merge failed for {dir:?}: {source}")]
    Merge {
        dir: PathBuf,
        source: MergeError,
    },

    #[error("merged JSON at {path:?} is malformed: {reason}")]
    BadJson { path: PathBuf, reason: String },
}

/// append-only error log shared by all molecules of one aggregation
/// run. constructed once and passed down explicitly; there is no global
/// logger state to leak across runs.
pub struct RunLog {
    file: File,
}

impl RunLog {
    pub fn create(root: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(root.join(RUN_LOG))?;
        Ok(Self { file })
    }

    pub fn error(&mut self, msg: impl std::fmt::Display) {
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        // a logging failure should not take the batch down with it
        let _ = writeln!(self.file, "{now} - ERROR - {msg}");
    }
}

/// every `alvaDescriptors.json` below `root`, any depth, in sorted path
/// order so repeated aggregation runs are byte-reproducible
fn find_descriptor_files(root: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.file_name().is_some_and(|n| n == ALVA_DESC) {
                found.push(path);
            }
        }
    }
    found.sort();
    Ok(found)
}

fn read_artifact(dir: &Path, name: &str) -> std::result::Result<String, SkipReason> {
    let path = dir.join(name);
    if !path.exists() {
        return Err(SkipReason::MissingFile {
            name: name.to_owned(),
            dir: dir.to_path_buf(),
        });
    }
    match std::fs::read_to_string(&path) {
        Ok(s) => Ok(s.trim().to_owned()),
        Err(source) => Err(SkipReason::Unreadable { path, source }),
    }
}

/// assemble the flat record for the molecule directory holding
/// `alva_path`: merge the MOPAC descriptors into the alvaDesc JSON,
/// read the identity and target artifacts back, and flatten the merged
/// descriptor set to bare values.
fn assemble_record(
    alva_path: &Path,
    y_file: &str,
) -> std::result::Result<Record, SkipReason> {
    let dir = alva_path.parent().unwrap_or(Path::new(""));

    let smiles = read_artifact(dir, MOLEC_SMI)?;
    let canon_smiles = read_artifact(dir, MOLEC_CANON_SMI)?;
    let target = read_artifact(dir, y_file)?;

    let out_path = dir.join(MOPAC_OUT);
    if !out_path.exists() {
        return Err(SkipReason::MissingFile {
            name: MOPAC_OUT.to_owned(),
            dir: dir.to_path_buf(),
        });
    }

    let merged_path =
        merge_descriptors(&out_path, alva_path).map_err(|source| SkipReason::Merge {
            dir: dir.to_path_buf(),
            source,
        })?;

    let text = std::fs::read_to_string(&merged_path).map_err(|source| {
        SkipReason::Unreadable {
            path: merged_path.clone(),
            source,
        }
    })?;
    let data: serde_json::Map<String, Value> =
        serde_json::from_str(&text).map_err(|e| SkipReason::BadJson {
            path: merged_path.clone(),
            reason: e.to_string(),
        })?;

    let descriptors: IndexMap<String, Value> = data
        .iter()
        .map(|(name, entry)| (name.clone(), flatten(entry)))
        .collect();

    Ok(Record {
        smiles,
        canon_smiles,
        target,
        descriptors,
    })
}

/// aggregate every assembled molecule under `output_root` into a CSV at
/// `out_path`. returns the number of rows written; skipped molecules
/// are logged to `log.log` at the output root and reported via `warn!`.
pub fn run_aggregation(
    output_root: &Path,
    y_unit: &str,
    out_path: &Path,
) -> Result<usize> {
    let mut log = RunLog::create(output_root)?;
    let y_file = sanitize_file_name(y_unit);

    let mut records = Vec::new();
    for alva_path in find_descriptor_files(output_root)? {
        match assemble_record(&alva_path, &y_file) {
            Ok(record) => records.push(record),
            Err(reason) => {
                warn!("skipping {alva_path:?}: {reason}");
                log.error(&reason);
            }
        }
    }

    write_output_table(out_path, y_unit, &records)?;
    info!("wrote {} rows to {out_path:?}", records.len());
    Ok(records.len())
}
