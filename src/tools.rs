//! wrappers around the three external programs. the pipeline only ever
//! talks to the [`Toolchain`] trait, so tests can swap in a stub that
//! never forks. every invocation gets explicit paths; the working
//! directory of this process is never changed or relied on.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use log::{debug, warn};
use serde_json::Value;

use crate::config::Config;
use crate::descriptor::{Descriptor, ALVADESC_NAME, ALVADESC_VERSION};
use crate::error::{Error, Result};

/// obabel's placeholder in generated MOPAC input files
const KEYWORD_PLACEHOLDER: &str = "PUT KEYWORDS HERE";

/// the external collaborators, at the granularity the pipeline needs
/// them
pub trait Toolchain {
    /// canonical re-encoding of a SMILES string. infallible: any
    /// conversion problem returns the input unchanged.
    fn canonical_smiles(&self, smiles: &str) -> String;

    /// SMILES -> MOPAC input file with 3-D coordinates, keyword line
    /// already substituted
    fn smiles_to_mop(&self, smiles: &str, out: &Path) -> Result<()>;

    /// SMILES -> mol2 structure, bypassing any optimized geometry
    fn smiles_to_mol2(&self, smiles: &str, out: &Path) -> Result<()>;

    /// MOPAC output file -> MDL mol structure
    fn out_to_mol(&self, out_file: &Path, mol: &Path) -> Result<()>;

    /// run the optimizer on a .mop input; returns the path of the
    /// produced output file (input with the extension swapped to .out)
    fn run_mopac(&self, mop: &Path) -> Result<PathBuf>;

    /// run the descriptor calculator on a structure file and write the
    /// wrapped `{name: {value, unit, metadata}}` JSON to `json_out`
    fn calc_descriptors(&self, structure: &Path, json_out: &Path) -> Result<()>;
}

/// the real tool chain, built from a [`Config`]
pub struct Tools {
    config: Config,
}

impl Tools {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    fn obabel(&self) -> Command {
        Command::new(&self.config.obabel)
    }
}

/// run a command to completion, mapping a non-zero exit status to
/// [`Error::Tool`]
fn run(mut cmd: Command) -> Result<Output> {
    debug!("running {cmd:?}");
    let output = cmd.output()?;
    if !output.status.success() {
        return Err(Error::Tool {
            program: cmd.get_program().to_string_lossy().into_owned(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(output)
}

/// replace the keyword placeholder obabel writes into .mop files with
/// the configured optimization directive
pub fn change_keywords(path: &Path, keywords: &str) -> Result<()> {
    let contents = std::fs::read_to_string(path)?;
    std::fs::write(path, contents.replace(KEYWORD_PLACEHOLDER, keywords))?;
    Ok(())
}

impl Toolchain for Tools {
    fn canonical_smiles(&self, smiles: &str) -> String {
        let mut cmd = self.obabel();
        cmd.arg("-ismi")
            .arg(format!("-:{smiles}"))
            .arg("-ocan");
        match run(cmd) {
            Ok(output) => {
                let canon = String::from_utf8_lossy(&output.stdout);
                match canon.split_whitespace().next() {
                    Some(c) => c.to_owned(),
                    None => smiles.to_owned(),
                }
            }
            Err(e) => {
                // unparsable SMILES are passed through, not fatal
                warn!("canonicalization failed for {smiles}: {e}");
                smiles.to_owned()
            }
        }
    }

    fn smiles_to_mop(&self, smiles: &str, out: &Path) -> Result<()> {
        let mut cmd = self.obabel();
        cmd.arg("-ismi")
            .arg(format!("-:{smiles}"))
            .arg("-omop")
            .arg("-O")
            .arg(out)
            .arg("--gen3d")
            .arg("-h");
        run(cmd)?;
        change_keywords(out, &self.config.keywords)
    }

    fn smiles_to_mol2(&self, smiles: &str, out: &Path) -> Result<()> {
        let mut cmd = self.obabel();
        cmd.arg("-ismi")
            .arg(format!("-:{smiles}"))
            .arg("-omol2")
            .arg("-O")
            .arg(out)
            .arg("--gen3d")
            .arg("-h");
        run(cmd)?;
        Ok(())
    }

    fn out_to_mol(&self, out_file: &Path, mol: &Path) -> Result<()> {
        let mut cmd = self.obabel();
        cmd.arg("-iout").arg(out_file).arg("-omol").arg("-O").arg(mol);
        run(cmd)?;
        Ok(())
    }

    fn run_mopac(&self, mop: &Path) -> Result<PathBuf> {
        let mut cmd = Command::new(self.config.mopac_path()?);
        cmd.arg(mop);
        run(cmd)?;
        Ok(mop.with_extension("out"))
    }

    fn calc_descriptors(&self, structure: &Path, json_out: &Path) -> Result<()> {
        let mut cmd = Command::new(self.config.alvadesc_path()?);
        cmd.arg("--inputtype=MDL")
            .arg("--descriptors=ALL")
            .arg(format!("--input={}", structure.display()));
        let output = run(cmd)?;
        let descriptors = parse_alvadesc_output(&String::from_utf8_lossy(&output.stdout))?;
        let json = serde_json::to_string_pretty(&descriptors)
            .expect("maps of JSON values always serialize");
        std::fs::write(json_out, json)?;
        Ok(())
    }
}

/// alvaDescCLI prints one tab-separated line of descriptor names and
/// one matching line of values. non-numeric entries (alvaDesc reports
/// "na" for inapplicable descriptors) are kept as strings.
fn parse_alvadesc_output(stdout: &str) -> Result<serde_json::Map<String, Value>> {
    let mut lines = stdout.lines();
    let (Some(names), Some(values)) = (lines.next(), lines.next()) else {
        return Err(Error::ToolOutput {
            program: "alvaDescCLI".to_owned(),
            reason: "expected a name line and a value line".to_owned(),
        });
    };
    let names: Vec<&str> = names.split('\t').collect();
    let values: Vec<&str> = values.split('\t').collect();
    if names.len() != values.len() {
        return Err(Error::ToolOutput {
            program: "alvaDescCLI".to_owned(),
            reason: format!("{} names but {} values", names.len(), values.len()),
        });
    }
    let mut map = serde_json::Map::new();
    for (name, raw) in names.into_iter().zip(values) {
        let value = match raw.parse::<f64>() {
            Ok(num) => Value::from(num),
            Err(_) => Value::from(raw),
        };
        let desc = Descriptor::new(value, ALVADESC_NAME, ALVADESC_VERSION);
        map.insert(name.to_owned(), serde_json::to_value(desc)?);
    }
    Ok(map)
}

/// canned toolchain for exercising the pipeline and driver without the
/// real executables
#[cfg(test)]
pub(crate) mod tests_support {
    use std::cell::Cell;
    use std::path::{Path, PathBuf};

    use crate::error::{Error, Result};

    use super::Toolchain;

    pub(crate) struct StubTools {
        /// per-call MOPAC outcome: "normal", "pi_bond", or "failed"
        outcomes: Vec<&'static str>,
        next: Cell<usize>,
        broken_calculator: bool,
    }

    impl StubTools {
        pub(crate) fn all_normal() -> Self {
            Self::with_outcomes(&[])
        }

        pub(crate) fn with_outcomes(outcomes: &[&'static str]) -> Self {
            Self {
                outcomes: outcomes.to_vec(),
                next: Cell::new(0),
                broken_calculator: false,
            }
        }

        pub(crate) fn broken_calculator() -> Self {
            Self {
                outcomes: Vec::new(),
                next: Cell::new(0),
                broken_calculator: true,
            }
        }
    }

    impl Toolchain for StubTools {
        fn canonical_smiles(&self, smiles: &str) -> String {
            smiles.to_uppercase()
        }

        fn smiles_to_mop(&self, smiles: &str, out: &Path) -> Result<()> {
            std::fs::write(out, format!("PM7 PRECISE PDBOUT\n{smiles}\n"))?;
            Ok(())
        }

        fn smiles_to_mol2(&self, smiles: &str, out: &Path) -> Result<()> {
            std::fs::write(out, format!("@<TRIPOS>MOLECULE\n{smiles}\n"))?;
            Ok(())
        }

        fn out_to_mol(&self, _out_file: &Path, mol: &Path) -> Result<()> {
            std::fs::write(mol, "M  END\n")?;
            Ok(())
        }

        fn run_mopac(&self, mop: &Path) -> Result<PathBuf> {
            let i = self.next.get();
            self.next.set(i + 1);
            let body = match self.outcomes.get(i).copied().unwrap_or("normal") {
                "pi_bond" => "THERE IS AN ERROR IN ASSIGNING PI-BONDS\n",
                "failed" => "EXCESS NUMBER OF OPTIMIZATION CYCLES\n",
                _ => include_str!("../testfiles/ethanol.out"),
            };
            let out = mop.with_extension("out");
            std::fs::write(&out, body)?;
            Ok(out)
        }

        fn calc_descriptors(&self, _structure: &Path, json_out: &Path) -> Result<()> {
            if self.broken_calculator {
                return Err(Error::Tool {
                    program: "alvaDescCLI".to_owned(),
                    status: "exit status: 1".to_owned(),
                    stderr: "license not found".to_owned(),
                });
            }
            let json = r#"{
  "MW": {"value": 46.07, "unit": "None",
         "metadata": {"software_name": "AlvaDesc",
                      "software_version": "alvaDesc v2.0.16",
                      "date": "01.01.2026"}},
  "ALogP": {"value": -0.01, "unit": "None",
            "metadata": {"software_name": "AlvaDesc",
                         "software_version": "alvaDesc v2.0.16",
                         "date": "01.01.2026"}}
}"#;
            std::fs::write(json_out, json)?;
            Ok(())
        }
    }
}
