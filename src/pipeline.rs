//! the optimization stage: one pass over the input table, producing a
//! self-contained artifact directory per molecule.

use std::fs;
use std::path::Path;

use log::{debug, info};

use crate::artifact::{
    molecule_dir, sanitize_file_name, ALVA_DESC, MOLEC_CANON_SMI, MOLEC_MOL2,
    MOLEC_SMI,
};
use crate::error::Result;
use crate::mopac::{classify, Convergence};
use crate::table::InputTable;
use crate::tools::Toolchain;

/// run every molecule in `table` through convert -> optimize ->
/// classify -> descriptors, in input order.
///
/// molecules whose optimization fails outright are skipped (their
/// directory keeps the MOPAC output for inspection but never gets a
/// descriptor artifact, so aggregation will not see them). a non-zero
/// exit from any external tool, in contrast, aborts the whole stage:
/// that means the tool chain itself is broken, and pressing on would
/// silently yield a systematically incomplete dataset.
pub fn run_optimization<T: Toolchain>(
    tools: &T,
    table: &InputTable,
    output_root: &Path,
) -> Result<()> {
    let y_file = sanitize_file_name(&table.y_unit);
    for (i, row) in table.rows.iter().enumerate() {
        let canon = tools.canonical_smiles(&row.smiles);
        debug!("molecule {i}: input {} canon {canon}", row.smiles);

        let dir = molecule_dir(output_root, i);
        fs::create_dir_all(&dir)?;

        let mop = dir.join(crate::artifact::MOP_INPUT);
        tools.smiles_to_mop(&row.smiles, &mop)?;
        let out = tools.run_mopac(&mop)?;

        let structure = match classify(&fs::read_to_string(&out)?) {
            Convergence::PiBondError => {
                // MOPAC could not assign pi bonds; compute descriptors
                // from a structure rebuilt from the raw SMILES instead
                let mol2 = dir.join(MOLEC_MOL2);
                tools.smiles_to_mol2(&row.smiles, &mol2)?;
                mol2
            }
            Convergence::Normal => {
                let mol = out.with_extension("mol");
                tools.out_to_mol(&out, &mol)?;
                mol
            }
            Convergence::Failed => {
                debug!("molecule {i} did not converge, skipping");
                continue;
            }
        };

        tools.calc_descriptors(&structure, &dir.join(ALVA_DESC))?;

        fs::write(dir.join(MOLEC_SMI), &row.smiles)?;
        fs::write(dir.join(MOLEC_CANON_SMI), &canon)?;
        fs::write(dir.join(&y_file), &row.target)?;
    }
    info!("optimized {} molecules into {output_root:?}", table.rows.len());
    Ok(())
}
