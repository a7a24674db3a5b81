use std::fs::read_to_string;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// default MOPAC directive substituted for the placeholder obabel leaves
/// in generated .mop files
pub const DEFAULT_KEYWORDS: &str = "PM7 PRECISE PDBOUT";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The directory containing the unpacked MOPAC and alvaDesc
    /// distributions (`mopac_linux/`, `AlvaDesc_Linux/`, ...).
    pub tool_root: PathBuf,

    /// The Open Babel executable, resolved through PATH unless given as
    /// a path.
    pub obabel: String,

    /// The keyword line written into every generated MOPAC input file in
    /// place of the `PUT KEYWORDS HERE` placeholder.
    pub keywords: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tool_root: PathBuf::from("."),
            obabel: "obabel".to_owned(),
            keywords: DEFAULT_KEYWORDS.to_owned(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Ok(toml::from_str(&read_to_string(path)?)?)
    }

    /// path to the MOPAC executable for the current platform
    pub fn mopac_path(&self) -> Result<PathBuf> {
        Ok(self.tool_root.join(platform_path(MOPAC_PATHS)?))
    }

    /// path to the alvaDescCLI executable for the current platform
    pub fn alvadesc_path(&self) -> Result<PathBuf> {
        Ok(self.tool_root.join(platform_path(ALVADESC_PATHS)?))
    }
}

/// relative executable locations keyed by `std::env::consts::OS`. both
/// tools go through the same table lookup so there is exactly one place
/// that knows about platforms.
const MOPAC_PATHS: &[(&str, &str)] = &[
    ("linux", "mopac_linux/bin/mopac"),
    ("macos", "mopac_mac/bin/mopac"),
    ("windows", "mopac_windows/bin/mopac.exe"),
];

const ALVADESC_PATHS: &[(&str, &str)] = &[
    ("linux", "AlvaDesc_Linux/bin/alvaDescCLI"),
    ("macos", "AlvaDesc_MacOS/alvaDescCLI"),
    ("windows", "AlvaDesc_Windows/alvaDescCLI.exe"),
];

fn platform_path(table: &[(&str, &str)]) -> Result<PathBuf> {
    let os = std::env::consts::OS;
    table
        .iter()
        .find(|(k, _)| *k == os)
        .map(|(_, v)| PathBuf::from(v))
        .ok_or_else(|| Error::UnsupportedOs(os.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = Config::default();
        assert_eq!(c.obabel, "obabel");
        assert_eq!(c.keywords, DEFAULT_KEYWORDS);
    }

    #[test]
    fn parse_partial_toml() {
        let c: Config =
            toml::from_str("tool_root = \"/opt/chem\"\n").unwrap();
        assert_eq!(c.tool_root, PathBuf::from("/opt/chem"));
        // unset fields fall back to the defaults
        assert_eq!(c.keywords, DEFAULT_KEYWORDS);
    }

    #[test]
    fn tool_paths_share_the_root() {
        let c: Config = toml::from_str("tool_root = \"/opt/chem\"").unwrap();
        // linux, macos, and windows are the supported platforms; the
        // test runner is one of them
        let mopac = c.mopac_path().unwrap();
        let alva = c.alvadesc_path().unwrap();
        assert!(mopac.starts_with("/opt/chem"));
        assert!(alva.starts_with("/opt/chem"));
    }
}
