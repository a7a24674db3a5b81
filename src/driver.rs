//! the two-phase driver and its resume policy.

use std::path::Path;

use log::info;

use crate::aggregate::run_aggregation;
use crate::error::Result;
use crate::pipeline::run_optimization;
use crate::table::InputTable;
use crate::tools::Toolchain;

/// run the whole pipeline: optimization, then aggregation.
///
/// the output root's state gates both phases. optimization runs only
/// when the root does not exist yet (an existing root means "already
/// optimized, do not redo the expensive part"); aggregation runs only
/// when the root exists and is non-empty. re-invoking on a populated
/// root therefore resumes straight at aggregation over whatever
/// molecules completed.
pub fn run<T: Toolchain>(
    tools: &T,
    input_path: &Path,
    output_root: &Path,
    output_file_name: &str,
) -> Result<()> {
    let table = InputTable::load(input_path)?;
    info!(
        "{} molecules from {input_path:?}, target column {:?}",
        table.rows.len(),
        table.y_unit
    );

    if !output_root.exists() {
        run_optimization(tools, &table, output_root)?;
        info!("optimization completed");
    }

    if output_root.is_dir() && output_root.read_dir()?.next().is_some() {
        let out_path = output_root
            .parent()
            .unwrap_or(Path::new("."))
            .join(output_file_name);
        run_aggregation(output_root, &table.y_unit, &out_path)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::tools::tests_support::StubTools;

    fn write_input(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("input.csv");
        fs::write(&path, "SMILES,Y unit\nCCO,1.5\nc1ccccc1,2.0\n").unwrap();
        path
    }

    #[test]
    fn end_to_end_one_normal_one_failed() {
        let tmp = tempfile::tempdir().unwrap();
        let input = write_input(tmp.path());
        let root = tmp.path().join("preds");
        let tools = StubTools::with_outcomes(&["normal", "failed"]);

        run(&tools, &input, &root, "output_descr.csv").unwrap();

        let table = fs::read_to_string(tmp.path().join("output_descr.csv")).unwrap();
        let lines: Vec<&str> = table.lines().collect();
        // exactly one data row: the failed benzene never reaches the table
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("SMILES,CANON_SMILES,Y unit"));
        assert!(lines[1].starts_with("CCO,CCO,1.5"));
        assert!(!table.contains("c1ccccc1"));
    }

    #[test]
    fn rerun_on_populated_root_only_aggregates() {
        let tmp = tempfile::tempdir().unwrap();
        let input = write_input(tmp.path());
        let root = tmp.path().join("preds");
        let tools = StubTools::with_outcomes(&["normal", "failed"]);
        run(&tools, &input, &root, "output_descr.csv").unwrap();
        let first = fs::read_to_string(tmp.path().join("output_descr.csv")).unwrap();

        // a rerun must not touch optimization: a broken toolchain would
        // abort immediately if it were invoked again
        let broken = StubTools::broken_calculator();
        run(&broken, &input, &root, "output_descr.csv").unwrap();
        let second = fs::read_to_string(tmp.path().join("output_descr.csv")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_existing_root_runs_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let input = write_input(tmp.path());
        let root = tmp.path().join("preds");
        fs::create_dir_all(&root).unwrap();

        let tools = StubTools::broken_calculator();
        run(&tools, &input, &root, "output_descr.csv").unwrap();
        // neither phase ran: no per-molecule dirs, no output table
        assert!(!root.join("0").exists());
        assert!(!tmp.path().join("output_descr.csv").exists());
    }
}
