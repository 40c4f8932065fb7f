use gridload_core::{Kilovolts, MegavoltAmperes, Meters, NullProgress, Ohms, RegionId};
use gridload_grid::{clean_grid, LineCase, LoadabilityTable, RawGridLine, SplitPolicy};

fn raw(start: &str, end: &str, voltage: &str, wires: &str, length: f64) -> RawGridLine {
    RawGridLine {
        start: RegionId::new(start),
        end: RegionId::new(end),
        voltage: voltage.to_string(),
        wires: wires.to_string(),
        length_m: Meters(length),
        resistance: Ohms(2.0),
        capacity: MegavoltAmperes(400.0),
    }
}

fn table() -> LoadabilityTable {
    LoadabilityTable::new([(80.0, 3.0), (100.0, 2.75), (700.0, 1.0), (750.0, 0.5)]).unwrap()
}

#[test]
fn split_then_merge_bidirectional_duplicates() {
    let lines = [
        raw("B", "A", "220000;380000", "1;1", 120.0),
        raw("A", "B", "220000", "2", 60.0),
        raw("C", "D", "0", "1", 10.0),
    ];
    let out = clean_grid(&lines, SplitPolicy::Apportion, true, &table(), &NullProgress).unwrap();

    assert_eq!(out.resolved, 3);
    assert_eq!(out.skipped, 1);
    assert_eq!(out.cases[&LineCase::MatchedCounts], 1);
    assert_eq!(out.cases[&LineCase::SingleVoltage], 1);

    assert_eq!(out.lines.len(), 1);
    let ab = &out.lines[0];
    assert_eq!(ab.start, RegionId::new("A"));
    assert_eq!(ab.merged, 3);
    // first record of the run in input order
    assert_eq!(ab.voltage, Kilovolts(220.0));
    assert_eq!(ab.lineage.to_string(), "0");
    assert_eq!(ab.capacity, MegavoltAmperes(800.0));
    assert_eq!(ab.length_m, Meters(180.0));
    // 4 || 4 || 2
    assert!((ab.resistance.value() - 1.0).abs() < 1e-12);
    assert_eq!(ab.loadability, Some(1.0));
}

#[test]
fn without_dedup_every_record_is_kept() {
    let lines = [
        raw("A", "B", "110000;220000", "2;1", 50.0),
        raw("B", "A", "110000", "1", 900.0),
    ];
    let out = clean_grid(&lines, SplitPolicy::Duplicate, false, &table(), &NullProgress).unwrap();
    assert_eq!(out.lines.len(), 3);
    assert!(out.lines.iter().all(|l| l.merged == 1));
    assert_eq!(out.lines[0].loadability, Some(3.0));
    assert_eq!(out.lines[2].loadability, Some(0.5));
    assert_eq!(out.lines[2].start, RegionId::new("B"));
}
