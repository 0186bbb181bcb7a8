//! Translation of file atom serials into dense topology indices.
//!
//! PDB-like files number atoms from an arbitrary first serial and consume one serial per
//! chain terminator, so the serial of an atom is rarely its index plus one. The remap keeps
//! the first serial and every terminator serial as breakpoints and subtracts the ones that
//! precede a reference.

use crate::warnings::{WarningSink, warning};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtomIdRemap {
    breakpoints: Vec<u64>,
}

impl AtomIdRemap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` once the first atom serial has been recorded.
    pub fn is_seeded(&self) -> bool {
        !self.breakpoints.is_empty()
    }

    pub fn breakpoints(&self) -> &[u64] {
        &self.breakpoints
    }

    pub fn clear(&mut self) {
        self.breakpoints.clear();
    }

    /// Records the serial field of the first atom record.
    ///
    /// The breakpoint is `serial - 1`. Serials that do not parse or are not positive are
    /// reported and treated as `1`.
    pub fn seed(&mut self, serial_field: &str, context: &str, sink: &dyn WarningSink) {
        let breakpoint = match serial_field.trim().parse::<i64>() {
            Ok(serial) if serial > 0 => (serial - 1) as u64,
            Ok(serial) => {
                warning!(sink, context, "{} is too small, assuming id is '1'", serial);
                0
            }
            Err(_) => {
                warning!(
                    sink,
                    context,
                    "{} is not a valid atom id, assuming '1'",
                    serial_field
                );
                0
            }
        };
        self.breakpoints.clear();
        self.breakpoints.push(breakpoint);
    }

    /// Records the serial consumed by a chain terminator.
    pub fn push_terminator(&mut self, serial: u64) {
        self.breakpoints.push(serial);
    }

    /// Resolves a file serial into a topology index.
    ///
    /// Returns `None` when the remap was never seeded or the arithmetic underflows. The
    /// caller still has to check the result against the atom count.
    pub fn resolve(&self, reference: u64) -> Option<usize> {
        let first = *self.breakpoints.first()?;
        let preceding = self.breakpoints.partition_point(|&b| b <= reference) as u64;
        reference
            .checked_sub(preceding)?
            .checked_sub(first)
            .and_then(|index| usize::try_from(index).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::warnings::CollectingSink;

    fn seeded(serial: &str) -> AtomIdRemap {
        let mut remap = AtomIdRemap::new();
        remap.seed(serial, "test", &CollectingSink::new());
        remap
    }

    #[test]
    fn serials_starting_at_one_map_to_zero_based_indices() {
        let remap = seeded("1");
        assert_eq!(remap.breakpoints(), &[0]);
        assert_eq!(remap.resolve(1), Some(0));
        assert_eq!(remap.resolve(2), Some(1));
    }

    #[test]
    fn offset_numbering_is_shifted_back_to_zero() {
        let remap = seeded("101");
        assert_eq!(remap.resolve(101), Some(0));
        assert_eq!(remap.resolve(105), Some(4));
    }

    #[test]
    fn terminator_serials_are_skipped() {
        let mut remap = seeded("1");
        remap.push_terminator(4);

        assert_eq!(remap.resolve(3), Some(2));
        assert_eq!(remap.resolve(5), Some(3));
        assert_eq!(remap.resolve(7), Some(5));
    }

    #[test]
    fn every_terminator_shifts_the_following_serials() {
        // A: 1 2, TER 3, B: 4 5, TER 6, C: 7 8, TER 9
        let mut remap = seeded("1");
        for serial in [3, 6, 9] {
            remap.push_terminator(serial);
        }

        let resolved: Vec<Option<usize>> = [1, 2, 4, 5, 7, 8].map(|r| remap.resolve(r)).to_vec();
        assert_eq!(resolved, [Some(0), Some(1), Some(2), Some(3), Some(4), Some(5)]);
        assert_eq!(remap.resolve(10), Some(6));
    }

    #[test]
    fn terminators_work_with_offset_numbering() {
        let mut remap = seeded("20");
        remap.push_terminator(22);
        remap.push_terminator(25);

        assert_eq!(remap.resolve(20), Some(0));
        assert_eq!(remap.resolve(21), Some(1));
        assert_eq!(remap.resolve(23), Some(2));
        assert_eq!(remap.resolve(24), Some(3));
        assert_eq!(remap.resolve(26), Some(4));
    }

    #[test]
    fn terminator_before_any_atom_acts_as_the_first_breakpoint() {
        let mut remap = AtomIdRemap::new();
        remap.push_terminator(1);

        assert!(remap.is_seeded());
        assert_eq!(remap.breakpoints(), &[1]);
        assert_eq!(remap.resolve(2), Some(0));
        assert_eq!(remap.resolve(3), Some(1));
        assert_eq!(remap.resolve(1), None);
    }

    #[test]
    fn references_below_the_first_serial_underflow() {
        let remap = seeded("50");
        assert_eq!(remap.resolve(10), None);
        assert_eq!(remap.resolve(0), None);
    }

    #[test]
    fn unseeded_remap_resolves_nothing() {
        assert_eq!(AtomIdRemap::new().resolve(1), None);
    }

    #[test]
    fn invalid_first_serials_warn_and_assume_one() {
        let sink = CollectingSink::new();
        let mut remap = AtomIdRemap::new();

        remap.seed("-5", "PDB reader", &sink);
        assert_eq!(remap.breakpoints(), &[0]);
        remap.seed("abc", "PDB reader", &sink);
        assert_eq!(remap.breakpoints(), &[0]);

        let messages = sink.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].contains("-5 is too small"));
        assert!(messages[1].contains("abc is not a valid atom id"));
    }
}
