//! the input table (SMILES + one target column) and the aggregated
//! output table.

use std::path::Path;

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;

use crate::error::{Error, Result};

/// one row of the input table
#[derive(Debug, Clone, PartialEq)]
pub struct InputRow {
    pub smiles: String,
    pub target: String,
}

/// the parsed input table. the first column is the SMILES identifier,
/// the second is the target value; `y_unit` is the target column's
/// header, reused verbatim as the output column header.
#[derive(Debug, Clone)]
pub struct InputTable {
    pub y_unit: String,
    pub rows: Vec<InputRow>,
}

impl InputTable {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut rdr = csv::Reader::from_path(path)?;
        let y_unit = rdr
            .headers()?
            .get(1)
            .ok_or_else(|| Error::NoTargetColumn { path: path.into() })?
            .to_owned();
        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let smiles = record.get(0).unwrap_or_default().to_owned();
            let target = record.get(1).unwrap_or_default().to_owned();
            rows.push(InputRow { smiles, target });
        }
        Ok(Self { y_unit, rows })
    }
}

/// one successfully assembled output row. descriptor values are kept as
/// JSON values: numeric for almost everything, strings for the odd
/// categorical alvaDesc descriptor, null for missing.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub smiles: String,
    pub canon_smiles: String,
    pub target: String,
    pub descriptors: IndexMap<String, Value>,
}

/// write the aggregated table as CSV with a header row and no index
/// column. columns are SMILES, CANON_SMILES, the target column, then
/// the union of descriptor names across all records in first-seen
/// order; a descriptor absent for a molecule becomes an empty cell.
/// zero records write an empty file, not an error.
pub fn write_output_table(
    path: impl AsRef<Path>,
    y_unit: &str,
    records: &[Record],
) -> Result<()> {
    if records.is_empty() {
        std::fs::write(path, "")?;
        return Ok(());
    }

    let mut columns: IndexSet<&str> = IndexSet::new();
    for rec in records {
        for name in rec.descriptors.keys() {
            columns.insert(name);
        }
    }

    let mut wtr = csv::Writer::from_path(path)?;
    let mut header = vec!["SMILES", "CANON_SMILES", y_unit];
    header.extend(columns.iter());
    wtr.write_record(&header)?;

    for rec in records {
        let mut row =
            vec![rec.smiles.clone(), rec.canon_smiles.clone(), rec.target.clone()];
        for name in &columns {
            row.push(cell(rec.descriptors.get(*name)));
        }
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(v) => v.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(smiles: &str, descs: &[(&str, Value)]) -> Record {
        Record {
            smiles: smiles.to_owned(),
            canon_smiles: smiles.to_owned(),
            target: "1.5".to_owned(),
            descriptors: descs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        }
    }

    #[test]
    fn load_input_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.csv");
        std::fs::write(&path, "SMILES,logS [mol/L]\nCCO,1.5\nc1ccccc1,2.0\n")
            .unwrap();
        let table = InputTable::load(&path).unwrap();
        assert_eq!(table.y_unit, "logS [mol/L]");
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].smiles, "CCO");
        assert_eq!(table.rows[1].target, "2.0");
    }

    #[test]
    fn missing_target_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.csv");
        std::fs::write(&path, "SMILES\nCCO\n").unwrap();
        assert!(matches!(
            InputTable::load(&path),
            Err(Error::NoTargetColumn { .. })
        ));
    }

    #[test]
    fn output_columns_are_the_first_seen_union() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let records = [
            record("CCO", &[("mopac_hof", Value::from(-56.3))]),
            record("CCN", &[("ALogP", Value::from(0.2)), ("mopac_hof", Value::Null)]),
        ];
        write_output_table(&path, "Y", &records).unwrap();
        let got = std::fs::read_to_string(&path).unwrap();
        let mut lines = got.lines();
        assert_eq!(lines.next().unwrap(), "SMILES,CANON_SMILES,Y,mopac_hof,ALogP");
        // absent and null descriptors both yield empty cells
        assert_eq!(lines.next().unwrap(), "CCO,CCO,1.5,-56.3,");
        assert_eq!(lines.next().unwrap(), "CCN,CCN,1.5,,0.2");
    }

    #[test]
    fn empty_batch_writes_an_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_output_table(&path, "Y", &[]).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }
}
