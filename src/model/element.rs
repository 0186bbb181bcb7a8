//! Periodic-table lookup used to derive default masses and to guess element types.

/// Static description of a chemical element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Element {
    pub number: u8,
    pub symbol: &'static str,
    /// Standard atomic weight in Da.
    pub mass: f64,
}

macro_rules! elements {
    ($(($number:literal, $symbol:literal, $mass:literal)),* $(,)?) => {
        const ELEMENTS: &[Element] = &[
            $(Element { number: $number, symbol: $symbol, mass: $mass }),*
        ];
    };
}

elements![
    (1, "H", 1.008),
    (2, "He", 4.0026),
    (3, "Li", 6.94),
    (4, "Be", 9.0122),
    (5, "B", 10.81),
    (6, "C", 12.011),
    (7, "N", 14.007),
    (8, "O", 15.999),
    (9, "F", 18.998),
    (10, "Ne", 20.180),
    (11, "Na", 22.990),
    (12, "Mg", 24.305),
    (13, "Al", 26.982),
    (14, "Si", 28.085),
    (15, "P", 30.974),
    (16, "S", 32.06),
    (17, "Cl", 35.45),
    (18, "Ar", 39.948),
    (19, "K", 39.098),
    (20, "Ca", 40.078),
    (21, "Sc", 44.956),
    (22, "Ti", 47.867),
    (23, "V", 50.942),
    (24, "Cr", 51.996),
    (25, "Mn", 54.938),
    (26, "Fe", 55.845),
    (27, "Co", 58.933),
    (28, "Ni", 58.693),
    (29, "Cu", 63.546),
    (30, "Zn", 65.38),
    (31, "Ga", 69.723),
    (32, "Ge", 72.630),
    (33, "As", 74.922),
    (34, "Se", 78.971),
    (35, "Br", 79.904),
    (36, "Kr", 83.798),
    (37, "Rb", 85.468),
    (38, "Sr", 87.62),
    (39, "Y", 88.906),
    (40, "Zr", 91.224),
    (41, "Nb", 92.906),
    (42, "Mo", 95.95),
    (43, "Tc", 98.0),
    (44, "Ru", 101.07),
    (45, "Rh", 102.91),
    (46, "Pd", 106.42),
    (47, "Ag", 107.87),
    (48, "Cd", 112.41),
    (49, "In", 114.82),
    (50, "Sn", 118.71),
    (51, "Sb", 121.76),
    (52, "Te", 127.60),
    (53, "I", 126.90),
    (54, "Xe", 131.29),
    (55, "Cs", 132.91),
    (56, "Ba", 137.33),
    (57, "La", 138.91),
    (58, "Ce", 140.12),
    (59, "Pr", 140.91),
    (60, "Nd", 144.24),
    (61, "Pm", 145.0),
    (62, "Sm", 150.36),
    (63, "Eu", 151.96),
    (64, "Gd", 157.25),
    (65, "Tb", 158.93),
    (66, "Dy", 162.50),
    (67, "Ho", 164.93),
    (68, "Er", 167.26),
    (69, "Tm", 168.93),
    (70, "Yb", 173.05),
    (71, "Lu", 174.97),
    (72, "Hf", 178.49),
    (73, "Ta", 180.95),
    (74, "W", 183.84),
    (75, "Re", 186.21),
    (76, "Os", 190.23),
    (77, "Ir", 192.22),
    (78, "Pt", 195.08),
    (79, "Au", 196.97),
    (80, "Hg", 200.59),
    (81, "Tl", 204.38),
    (82, "Pb", 207.2),
    (83, "Bi", 208.98),
    (84, "Po", 209.0),
    (85, "At", 210.0),
    (86, "Rn", 222.0),
    (87, "Fr", 223.0),
    (88, "Ra", 226.0),
    (89, "Ac", 227.0),
    (90, "Th", 232.04),
    (91, "Pa", 231.04),
    (92, "U", 238.03),
    (93, "Np", 237.0),
    (94, "Pu", 244.0),
    (95, "Am", 243.0),
    (96, "Cm", 247.0),
    (97, "Bk", 247.0),
    (98, "Cf", 251.0),
    (99, "Es", 252.0),
    (100, "Fm", 257.0),
    (101, "Md", 258.0),
    (102, "No", 259.0),
    (103, "Lr", 262.0),
    (104, "Rf", 267.0),
    (105, "Db", 270.0),
    (106, "Sg", 269.0),
    (107, "Bh", 270.0),
    (108, "Hs", 270.0),
    (109, "Mt", 278.0),
    (110, "Ds", 281.0),
    (111, "Rg", 281.0),
    (112, "Cn", 285.0),
    (113, "Nh", 286.0),
    (114, "Fl", 289.0),
    (115, "Mc", 289.0),
    (116, "Lv", 293.0),
    (117, "Ts", 293.0),
    (118, "Og", 294.0),
];

impl Element {
    /// Finds an element by its exact symbol (`"Zn"`, not `"ZN"`).
    pub fn find(symbol: &str) -> Option<&'static Element> {
        ELEMENTS.iter().find(|e| e.symbol == symbol)
    }

    /// Finds an element by symbol, ignoring ASCII case.
    ///
    /// PDB element columns and LAMMPS comments are frequently uppercase, so lookups coming
    /// from file content should go through this function.
    pub fn find_ignore_case(symbol: &str) -> Option<&'static Element> {
        ELEMENTS
            .iter()
            .find(|e| e.symbol.eq_ignore_ascii_case(symbol))
    }

    /// Normalizes an element symbol to the periodic-table capitalization.
    pub fn normalize_symbol(symbol: &str) -> Option<&'static str> {
        Self::find_ignore_case(symbol).map(|e| e.symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_ordered_by_atomic_number() {
        for (i, element) in ELEMENTS.iter().enumerate() {
            assert_eq!(element.number as usize, i + 1);
        }
    }

    #[test]
    fn find_is_case_sensitive() {
        assert_eq!(Element::find("Zn").map(|e| e.number), Some(30));
        assert!(Element::find("ZN").is_none());
    }

    #[test]
    fn find_ignore_case_accepts_uppercase_symbols() {
        let zinc = Element::find_ignore_case("ZN").unwrap();
        assert_eq!(zinc.symbol, "Zn");
        assert_eq!(zinc.mass, 65.38);
    }

    #[test]
    fn normalize_symbol_returns_none_for_unknown_symbols() {
        assert_eq!(Element::normalize_symbol("fe"), Some("Fe"));
        assert_eq!(Element::normalize_symbol("Xx"), None);
    }

    #[test]
    fn carbon_mass_matches_standard_weight() {
        assert_eq!(Element::find("C").unwrap().mass, 12.011);
    }
}
