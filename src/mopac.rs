//! everything read out of a raw MOPAC output file: the termination
//! classification that drives the per-molecule branching, and the
//! keyword-anchored extraction of scalar descriptors.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::artifact::MERGED_DESC;
use crate::descriptor::{Descriptor, MOPAC_NAME, MOPAC_VERSION};

pub const PI_BOND_MARKER: &str = "AN ERROR IN ASSIGNING PI-BONDS";
pub const ERROR_MARKER: &str = "Error and normal";
pub const NORMAL_MARKER: &str = "JOB ENDED NORMALLY";

const EIGENVALUES_MARKER: &str = "EIGENVALUES";
const CHARGES_MARKER: &str = "NET ATOMIC CHARGES AND DIPOLE CONTRIBUTIONS";

/// how a MOPAC run terminated. this is a closed set: anything the
/// markers below don't match is `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convergence {
    /// geometry optimization finished; the output file is usable as
    /// descriptor input after conversion
    Normal,
    /// the known pi-bond assignment failure; descriptors must be
    /// computed from a structure regenerated from the raw SMILES
    PiBondError,
    /// no success marker, or an explicit error marker; the molecule is
    /// skipped for this run
    Failed,
}

/// classify a raw MOPAC output. lines are scanned top to bottom and
/// each line is checked for the pi-bond marker, then the error marker,
/// then the normal-termination marker; the first hit wins.
pub fn classify(output: &str) -> Convergence {
    for line in output.lines() {
        if line.contains(PI_BOND_MARKER) {
            return Convergence::PiBondError;
        } else if line.contains(ERROR_MARKER) {
            return Convergence::Failed;
        } else if line.contains(NORMAL_MARKER) {
            return Convergence::Normal;
        }
    }
    Convergence::Failed
}

/// find the first line containing `keyword`, split it on whitespace,
/// and parse the token at `index`. any miss (no such line, index out of
/// range, unparsable token) is NaN; extraction is total.
fn extract_float(lines: &[&str], keyword: &str, index: usize) -> f64 {
    lines
        .iter()
        .find(|l| l.contains(keyword))
        .and_then(|l| l.split_whitespace().nth(index))
        .and_then(|tok| tok.parse().ok())
        .unwrap_or(f64::NAN)
}

/// min and max over every float-parsable token in the eigenvalue block:
/// the lines strictly between the last `EIGENVALUES` line and two lines
/// before the net-atomic-charges section. (NaN, NaN) when either marker
/// is missing or the block holds no numbers.
fn eigenvalue_range(lines: &[&str]) -> (f64, f64) {
    let mut eig_idx = None;
    let mut stop_idx = None;
    for (i, line) in lines.iter().enumerate() {
        if line.contains(EIGENVALUES_MARKER) {
            eig_idx = Some(i);
        } else if line.contains(CHARGES_MARKER) {
            stop_idx = i.checked_sub(2);
            break;
        }
    }
    let (Some(eig), Some(stop)) = (eig_idx, stop_idx) else {
        return (f64::NAN, f64::NAN);
    };

    let mut min = f64::NAN;
    let mut max = f64::NAN;
    for line in lines.iter().take(stop).skip(eig + 1) {
        for tok in line.split_whitespace() {
            let Ok(val) = tok.parse::<f64>() else {
                continue;
            };
            if !(min <= val) {
                min = val;
            }
            if !(max >= val) {
                max = val;
            }
        }
    }
    (min, max)
}

/// the fixed set of scalar descriptors pulled from one MOPAC output
/// text, keyed by their `mopac_`-prefixed names. the prefix keeps them
/// disjoint from anything alvaDesc emits. every value is a finite float
/// or NaN; this never fails.
pub fn extract_descriptors(output: &str) -> IndexMap<&'static str, f64> {
    let lines: Vec<&str> = output.lines().map(str::trim).collect();
    let (qmin, qmax) = eigenvalue_range(&lines);
    IndexMap::from([
        ("mopac_hof", extract_float(&lines, "FINAL HEAT OF FORMATION", 5)),
        ("mopac_area", extract_float(&lines, "COSMO AREA", 3)),
        ("mopac_volume", extract_float(&lines, "COSMO VOLUME", 3)),
        (
            "mopac_ionisation_pot",
            extract_float(&lines, "IONIZATION POTENTIAL", 3),
        ),
        ("mopac_homo", extract_float(&lines, "HOMO LUMO ENERGIES (EV)", 5)),
        ("mopac_lumo", extract_float(&lines, "HOMO LUMO ENERGIES (EV)", 6)),
        ("mopac_mol_weight", extract_float(&lines, "MOLECULAR WEIGHT", 3)),
        ("mopac_dip_x", extract_float(&lines, "POINT-CHG.", 1)),
        ("mopac_dip_y", extract_float(&lines, "POINT-CHG.", 2)),
        ("mopac_dip_z", extract_float(&lines, "POINT-CHG.", 3)),
        ("mopac_dip_total", extract_float(&lines, "POINT-CHG.", 4)),
        ("mopac_qmin", qmin),
        ("mopac_qmax", qmax),
    ])
}

/// reasons the descriptor merge can fail for one molecule. these are
/// expected conditions, not panics; the aggregation stage logs them and
/// moves on.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("cannot read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("descriptor JSON at {path:?} is not an object: {reason}")]
    Parse { path: PathBuf, reason: String },
    #[error("cannot write merged JSON to {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// extract the MOPAC descriptors from `out_file`, wrap them with
/// provenance, and merge them into the alvaDesc JSON object at
/// `alva_json`, writing the result to `alvaDesc_and_mopacDesc.json` in
/// the same directory. MOPAC keys overwrite on collision (none occur in
/// practice thanks to the prefix).
pub fn merge_descriptors(out_file: &Path, alva_json: &Path) -> Result<PathBuf, MergeError> {
    let output = std::fs::read_to_string(out_file).map_err(|source| MergeError::Read {
        path: out_file.into(),
        source,
    })?;
    let text = std::fs::read_to_string(alva_json).map_err(|source| MergeError::Read {
        path: alva_json.into(),
        source,
    })?;
    let mut data: Map<String, Value> =
        serde_json::from_str(&text).map_err(|e| MergeError::Parse {
            path: alva_json.into(),
            reason: e.to_string(),
        })?;

    for (name, value) in extract_descriptors(&output) {
        // NaN has no JSON representation and becomes null here, which
        // downstream flattening already treats as missing
        let desc = Descriptor::new(value, MOPAC_NAME, MOPAC_VERSION);
        data.insert(name.to_owned(), serde_json::to_value(desc).unwrap_or(Value::Null));
    }

    let merged_path = alva_json.with_file_name(MERGED_DESC);
    let pretty = serde_json::to_string_pretty(&Value::Object(data))
        .expect("maps of JSON values always serialize");
    std::fs::write(&merged_path, pretty).map_err(|source| MergeError::Write {
        path: merged_path.clone(),
        source,
    })?;
    Ok(merged_path)
}
