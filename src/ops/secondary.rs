//! Secondary-structure ranges declared by HELIX, SHEET and TURN records.

use crate::io::fields::{char_at, column, parse_column};
use crate::model::residue::Residue;
use crate::warnings::{WarningSink, warning};
use std::collections::BTreeMap;

/// Position of a residue inside a file, ordered by chain, then id, then insertion code.
///
/// A blank insertion code is a space, so it sorts before any letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResidueKey {
    pub chain: char,
    pub resid: i64,
    pub inscode: char,
}

impl ResidueKey {
    pub fn new(chain: char, resid: i64, inscode: char) -> Self {
        Self {
            chain,
            resid,
            inscode,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Range {
    start: ResidueKey,
    end: ResidueKey,
    label: &'static str,
}

/// Secondary-structure ranges collected while decoding one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecondaryStructure {
    ranges: Vec<Range>,
}

/// Maps a HELIX class number to its label.
pub fn helix_label(class: u32) -> Option<&'static str> {
    match class {
        1 | 6 => Some("alpha helix"),
        2 | 7 => Some("omega helix"),
        3 => Some("pi helix"),
        4 | 8 => Some("gamma helix"),
        5 => Some("3-10 helix"),
        _ => None,
    }
}

impl SecondaryStructure {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.ranges.clear();
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Adds an inclusive range. Ranges whose start sorts after their end match nothing.
    pub fn add_range(&mut self, start: ResidueKey, end: ResidueKey, label: &'static str) {
        self.ranges.push(Range { start, end, label });
    }

    /// Parses a PDB `HELIX` record.
    pub fn read_helix(&mut self, line: &str, sink: &dyn WarningSink) {
        const CONTEXT: &str = "PDB reader";
        if line.len() < 38 {
            warning!(sink, CONTEXT, "HELIX record too short: '{}'", line);
            return;
        }

        let chain1 = char_at(line, 19);
        let chain2 = char_at(line, 31);
        let inscode1 = char_at(line, 25);
        let inscode2 = char_at(line, 37);

        let (Some(start), Some(end)) = (
            parse_column::<i64>(line, 21, 25),
            parse_column::<i64>(line, 33, 37),
        ) else {
            warning!(sink, CONTEXT, "HELIX record contains invalid numbers: '{}'", line);
            return;
        };

        if chain1 != chain2 {
            warning!(sink, CONTEXT, "HELIX chain {} and {} are not the same", chain1, chain2);
            return;
        }

        let Some(class) = parse_column::<u32>(line, 38, 40) else {
            warning!(sink, CONTEXT, "could not parse helix type");
            return;
        };

        if let Some(label) = helix_label(class) {
            self.add_range(
                ResidueKey::new(chain1, start, inscode1),
                ResidueKey::new(chain2, end, inscode2),
                label,
            );
        }
    }

    /// Parses a PDB `SHEET` or `TURN` record, whose chain ids sit at `i1` and `i2`.
    pub fn read_extended(
        &mut self,
        line: &str,
        i1: usize,
        i2: usize,
        record: &str,
        sink: &dyn WarningSink,
    ) {
        const CONTEXT: &str = "PDB reader";
        if line.len() < i2 + 6 {
            warning!(sink, CONTEXT, "secondary structure record too short: '{}'", line);
            return;
        }

        let chain1 = char_at(line, i1);
        let chain2 = char_at(line, i2);
        if chain1 != chain2 {
            warning!(sink, CONTEXT, "{} chain {} and {} are not the same", record, chain1, chain2);
            return;
        }

        let (Some(resid1), Some(resid2)) = (
            parse_column::<i64>(line, i1 + 1, i1 + 5),
            parse_column::<i64>(line, i2 + 1, i2 + 5),
        ) else {
            warning!(
                sink,
                CONTEXT,
                "error parsing line: '{}', check {} and {}",
                line,
                column(line, i1 + 1, i1 + 5),
                column(line, i2 + 1, i2 + 5)
            );
            return;
        };

        self.add_range(
            ResidueKey::new(chain1, resid1, char_at(line, i1 + 5)),
            ResidueKey::new(chain2, resid2, char_at(line, i2 + 5)),
            "extended",
        );
    }

    /// Tags every residue inside a range with its `secondary_structure` label.
    pub fn apply(&self, residues: &mut BTreeMap<ResidueKey, Residue>) {
        for range in &self.ranges {
            if range.start > range.end {
                continue;
            }
            for residue in residues.range_mut(range.start..=range.end).map(|(_, r)| r) {
                residue.set("secondary_structure", range.label);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::property::Property;
    use crate::warnings::CollectingSink;

    fn residues(keys: &[ResidueKey]) -> BTreeMap<ResidueKey, Residue> {
        keys.iter()
            .map(|&key| (key, Residue::with_id("ALA", key.resid)))
            .collect()
    }

    fn label(map: &BTreeMap<ResidueKey, Residue>, key: ResidueKey) -> Option<&str> {
        map[&key].get("secondary_structure").and_then(Property::as_str)
    }

    #[test]
    fn helix_classes_map_to_labels() {
        assert_eq!(helix_label(1), Some("alpha helix"));
        assert_eq!(helix_label(6), Some("alpha helix"));
        assert_eq!(helix_label(7), Some("omega helix"));
        assert_eq!(helix_label(3), Some("pi helix"));
        assert_eq!(helix_label(8), Some("gamma helix"));
        assert_eq!(helix_label(5), Some("3-10 helix"));
        assert_eq!(helix_label(9), None);
    }

    #[test]
    fn apply_tags_inclusive_range_including_insertion_codes() {
        let a = |resid, inscode| ResidueKey::new('A', resid, inscode);
        let mut map = residues(&[a(1, ' '), a(2, ' '), a(2, 'A'), a(3, ' '), a(4, ' ')]);

        let mut secondary = SecondaryStructure::new();
        secondary.add_range(a(2, ' '), a(3, ' '), "alpha helix");
        secondary.apply(&mut map);

        assert_eq!(label(&map, a(1, ' ')), None);
        assert_eq!(label(&map, a(2, ' ')), Some("alpha helix"));
        assert_eq!(label(&map, a(2, 'A')), Some("alpha helix"));
        assert_eq!(label(&map, a(3, ' ')), Some("alpha helix"));
        assert_eq!(label(&map, a(4, ' ')), None);
    }

    #[test]
    fn ranges_do_not_leak_into_other_chains() {
        let mut map = residues(&[ResidueKey::new('A', 5, ' '), ResidueKey::new('B', 5, ' ')]);
        let mut secondary = SecondaryStructure::new();
        secondary.add_range(
            ResidueKey::new('B', 1, ' '),
            ResidueKey::new('B', 10, ' '),
            "extended",
        );
        secondary.apply(&mut map);

        assert_eq!(label(&map, ResidueKey::new('A', 5, ' ')), None);
        assert_eq!(label(&map, ResidueKey::new('B', 5, ' ')), Some("extended"));
    }

    #[test]
    fn read_helix_parses_a_standard_record() {
        let sink = CollectingSink::new();
        let mut secondary = SecondaryStructure::new();
        secondary.read_helix(
            "HELIX    1  HA GLY A   86  GLY A   94  1                                   9",
            &sink,
        );

        let mut map = residues(&[ResidueKey::new('A', 90, ' ')]);
        secondary.apply(&mut map);
        assert_eq!(label(&map, ResidueKey::new('A', 90, ' ')), Some("alpha helix"));
        assert!(sink.is_empty());
    }

    #[test]
    fn read_helix_warns_on_chain_mismatch_and_short_lines() {
        let sink = CollectingSink::new();
        let mut secondary = SecondaryStructure::new();
        secondary.read_helix("HELIX    1  HA GLY A   86  GLY B   94  1", &sink);
        secondary.read_helix("HELIX    1", &sink);

        assert!(secondary.is_empty());
        assert!(sink.contains("HELIX chain A and B are not the same"));
        assert!(sink.contains("HELIX record too short"));
    }

    #[test]
    fn read_extended_parses_sheet_and_turn_records() {
        let sink = CollectingSink::new();
        let mut secondary = SecondaryStructure::new();
        secondary.read_extended(
            "SHEET    1   A 5 THR A 107  ARG A 110  0",
            21,
            32,
            "SHEET",
            &sink,
        );
        secondary.read_extended(
            "TURN     1 T1 PRO A  41  TYR A  44",
            19,
            30,
            "TURN",
            &sink,
        );
        assert_eq!(secondary.len(), 2);

        let mut map = residues(&[ResidueKey::new('A', 108, ' '), ResidueKey::new('A', 42, ' ')]);
        secondary.apply(&mut map);
        assert_eq!(label(&map, ResidueKey::new('A', 108, ' ')), Some("extended"));
        assert_eq!(label(&map, ResidueKey::new('A', 42, ' ')), Some("extended"));
        assert!(sink.is_empty());
    }

    #[test]
    fn read_extended_warns_on_bad_numbers() {
        let sink = CollectingSink::new();
        let mut secondary = SecondaryStructure::new();
        secondary.read_extended(
            "SHEET    1   A 5 THR A 1x7  ARG A 110  0",
            21,
            32,
            "SHEET",
            &sink,
        );
        assert!(secondary.is_empty());
        assert!(sink.contains("error parsing line"));
    }
}
