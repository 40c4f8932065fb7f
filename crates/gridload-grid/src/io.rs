use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use serde::Serialize;

use crate::types::RawGridLine;

/// Reads raw lines with columns `start`, `end`, `voltage`, `wires`,
/// `length_m`, `resistance`, `capacity`.
pub fn read_raw_lines(path: &Path) -> Result<Vec<RawGridLine>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("opening grid lines CSV {}", path.display()))?;
    let mut lines = Vec::new();
    for (i, result) in rdr.deserialize().enumerate() {
        let line: RawGridLine = result.with_context(|| format!("parsing grid line record {i}"))?;
        lines.push(line);
    }
    Ok(lines)
}

/// Writes any line records with a header row.
pub fn write_lines<T: Serialize>(path: &Path, lines: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("creating CSV writer for {}", path.display()))?;
    for line in lines {
        wtr.serialize(line).context("writing CSV record")?;
    }
    wtr.flush().context("flushing CSV writer")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DeduplicatedGridLine, Lineage};
    use gridload_core::{Kilovolts, MegavoltAmperes, Meters, Ohms, RegionId};
    use tempfile::tempdir;

    #[test]
    fn raw_lines_keep_semicolon_lists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lines.csv");
        fs::write(
            &path,
            "start,end,voltage,wires,length_m,resistance,capacity\n\
             DE_1, DE_2 ,110000;220000,2;1,1200.5,0.4,900\n",
        )
        .unwrap();
        let lines = read_raw_lines(&path).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].end, RegionId::new("DE_2"));
        assert_eq!(lines[0].voltage, "110000;220000");
        assert_eq!(lines[0].length_m, Meters(1200.5));
    }

    #[test]
    fn malformed_number_names_the_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lines.csv");
        fs::write(
            &path,
            "start,end,voltage,wires,length_m,resistance,capacity\nA,B,110000,1,long,1,1\n",
        )
        .unwrap();
        let err = read_raw_lines(&path).unwrap_err();
        assert!(err.to_string().contains("record 0"));
    }

    #[test]
    fn output_has_lineage_and_optional_loadability() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join("clean.csv");
        let line = DeduplicatedGridLine {
            lineage: Lineage::new(4, 1),
            start: RegionId::new("A"),
            end: RegionId::new("B"),
            voltage: Kilovolts(220.0),
            wires: 1,
            length_m: Meters(10.0),
            resistance: Ohms(2.0),
            capacity: MegavoltAmperes(300.0),
            merged: 1,
            loadability: None,
        };
        write_lines(&path, &[line]).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let mut rows = text.lines();
        assert_eq!(
            rows.next(),
            Some("lineage,start,end,voltage,wires,length_m,resistance,capacity,merged,loadability")
        );
        assert_eq!(rows.next(), Some("4_1,A,B,220.0,1,10.0,2.0,300.0,1,"));
    }
}
