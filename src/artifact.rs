//! fixed per-molecule artifact names and the `<output_root>/<index>/`
//! layout. every file a molecule produces lives flat inside its own
//! directory, so each work unit can be inspected (and re-aggregated)
//! independently.

use std::path::{Path, PathBuf};

/// raw input SMILES as given in the input table
pub const MOLEC_SMI: &str = "molec.smi";
/// canonicalized SMILES
pub const MOLEC_CANON_SMI: &str = "molec_canon.smi";
/// MOPAC input generated by the converter
pub const MOP_INPUT: &str = "out.mop";
/// raw MOPAC output
pub const MOPAC_OUT: &str = "out.out";
/// structure regenerated from the raw SMILES when MOPAC hits the
/// pi-bond assignment error
pub const MOLEC_MOL2: &str = "molec.mol2";
/// descriptor JSON written from the alvaDesc run
pub const ALVA_DESC: &str = "alvaDescriptors.json";
/// alvaDesc JSON with the MOPAC-derived descriptors merged in
pub const MERGED_DESC: &str = "alvaDesc_and_mopacDesc.json";
/// append-only error log at the output root, written during aggregation
pub const RUN_LOG: &str = "log.log";

/// working directory for the molecule at row `index`
pub fn molecule_dir(output_root: &Path, index: usize) -> PathBuf {
    output_root.join(index.to_string())
}

/// strip the characters Windows forbids in file names (`< > : " / \ | ?
/// *` and control codes) and trim surrounding whitespace. used to turn
/// the target column header into the target-value file name.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .filter(|c| {
            !matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*')
                && (*c as u32) >= 0x20
        })
        .collect::<String>()
        .trim()
        .to_owned()
}
