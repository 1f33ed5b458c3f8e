//! Three-dimensional atomic structures and XYZ dump handling.
//!
//! This module provides [`AtomicStructure`], the ordered list of atoms with
//! Cartesian coordinates that the resolver produces and the assembler
//! consumes, together with helpers for the plain XYZ text emitted by
//! structure-generation tools.
//!
//! All coordinates are in Angstrom.

use nalgebra::DVector;
use thiserror::Error;

/// Number of header lines (atom count, comment) preceding the atom rows of an
/// XYZ dump.
pub const XYZ_HEADER_LINES: usize = 2;

/// Problems turning XYZ text into an [`AtomicStructure`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StructureError {
    /// The dump contained no atom rows
    #[error("no atoms in coordinate block")]
    Empty,
    /// A row could not be read as `element x y z`
    #[error("malformed coordinate row {row}: '{content}'")]
    MalformedRow {
        /// 1-based row number within the coordinate block
        row: usize,
        /// The offending text
        content: String,
    },
    /// The header announced a different number of atoms than were listed
    #[error("header announces {expected} atoms but {found} coordinate rows were found")]
    CountMismatch {
        /// Atom count from the first header line
        expected: usize,
        /// Number of rows actually present
        found: usize,
    },
}

/// An ordered set of atoms with Cartesian coordinates.
///
/// Coordinates are stored flat, `[x1, y1, z1, x2, y2, z2, ...]`, in a
/// `DVector<f64>`. A structure always holds at least one atom.
///
/// # Examples
///
/// ```
/// use orcaprep::structure::AtomicStructure;
///
/// let water = AtomicStructure::new(
///     vec!["O".to_string(), "H".to_string(), "H".to_string()],
///     vec![0.0, 0.0, 0.0, 0.757, 0.586, 0.0, -0.757, 0.586, 0.0],
/// )
/// .unwrap();
///
/// assert_eq!(water.num_atoms(), 3);
/// assert_eq!(water.get_atom_coords(1), [0.757, 0.586, 0.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AtomicStructure {
    elements: Vec<String>,
    coords: DVector<f64>,
}

impl AtomicStructure {
    /// Creates a structure from element symbols and a flat coordinate list.
    ///
    /// Returns `None` if there are no atoms or if `coords.len()` is not
    /// `3 * elements.len()`.
    pub fn new(elements: Vec<String>, coords: Vec<f64>) -> Option<Self> {
        if elements.is_empty() || coords.len() != elements.len() * 3 {
            return None;
        }
        Some(Self {
            elements,
            coords: DVector::from_vec(coords),
        })
    }

    /// Parses a full XYZ dump, header included.
    ///
    /// The two header lines are stripped with [`strip_xyz_header`]. If the
    /// first header line is an integer it must match the number of rows.
    pub fn from_xyz(dump: &str) -> Result<Self, StructureError> {
        let expected = dump
            .lines()
            .next()
            .and_then(|line| line.trim().parse::<usize>().ok());

        let structure = Self::from_rows(&strip_xyz_header(dump))?;

        if let Some(expected) = expected {
            if expected != structure.num_atoms() {
                return Err(StructureError::CountMismatch {
                    expected,
                    found: structure.num_atoms(),
                });
            }
        }
        Ok(structure)
    }

    /// Parses headerless `element x y z` rows. Blank lines are skipped.
    pub fn from_rows(rows: &str) -> Result<Self, StructureError> {
        let mut elements = Vec::new();
        let mut coords = Vec::new();

        for (idx, line) in rows.lines().filter(|l| !l.trim().is_empty()).enumerate() {
            let malformed = || StructureError::MalformedRow {
                row: idx + 1,
                content: line.trim().to_string(),
            };

            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 4 || !parts[0].chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(malformed());
            }

            for value in &parts[1..4] {
                let v: f64 = value.parse().map_err(|_| malformed())?;
                if !v.is_finite() {
                    return Err(malformed());
                }
                coords.push(v);
            }
            elements.push(parts[0].to_string());
        }

        Self::new(elements, coords).ok_or(StructureError::Empty)
    }

    /// Number of atoms.
    pub fn num_atoms(&self) -> usize {
        self.elements.len()
    }

    /// Element symbols in atom order.
    pub fn elements(&self) -> &[String] {
        &self.elements
    }

    /// Flat coordinate vector.
    pub fn coords(&self) -> &DVector<f64> {
        &self.coords
    }

    /// Coordinates `[x, y, z]` of the atom at zero-based `atom_idx`.
    pub fn get_atom_coords(&self, atom_idx: usize) -> [f64; 3] {
        let i = atom_idx * 3;
        [self.coords[i], self.coords[i + 1], self.coords[i + 2]]
    }

    /// Iterates over `(element, [x, y, z])` pairs.
    pub fn atoms(&self) -> impl Iterator<Item = (&str, [f64; 3])> + '_ {
        self.elements
            .iter()
            .enumerate()
            .map(move |(i, el)| (el.as_str(), self.get_atom_coords(i)))
    }

    /// Number of atoms of the given element.
    pub fn count_element(&self, symbol: &str) -> usize {
        self.elements.iter().filter(|e| e.as_str() == symbol).count()
    }

    /// True when a multi-atom structure has every coordinate at the origin,
    /// the signature of a failed embedding.
    pub fn is_collapsed(&self) -> bool {
        self.num_atoms() > 1 && self.coords.iter().all(|v| v.abs() < 1e-6)
    }
}

/// Drops the two XYZ header lines and returns the coordinate rows.
///
/// Each remaining line keeps its trailing newline; a dump with fewer than two
/// lines yields an empty string.
///
/// # Examples
///
/// ```
/// use orcaprep::structure::strip_xyz_header;
///
/// let dump = "2\nhydrogen\nH 0.0 0.0 0.0\nH 0.0 0.0 0.74\n";
/// assert_eq!(strip_xyz_header(dump), "H 0.0 0.0 0.0\nH 0.0 0.0 0.74\n");
/// ```
pub fn strip_xyz_header(dump: &str) -> String {
    dump.lines()
        .skip(XYZ_HEADER_LINES)
        .filter(|line| !line.trim().is_empty())
        .map(|line| format!("{}\n", line))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dump_of(n: usize) -> String {
        let mut dump = format!("{}\ngenerated\n", n);
        for i in 0..n {
            dump.push_str(&format!("C {:.4} 0.0000 0.0000\n", i as f64 * 1.54));
        }
        dump
    }

    #[test]
    fn test_strip_header_keeps_one_row_per_atom() {
        for n in [1usize, 2, 9, 57, 300] {
            let rows = strip_xyz_header(&dump_of(n));
            assert_eq!(rows.lines().count(), n, "n = {}", n);
        }
    }

    #[test]
    fn test_strip_header_on_short_input() {
        assert_eq!(strip_xyz_header(""), "");
        assert_eq!(strip_xyz_header("3\n"), "");
    }

    #[test]
    fn test_from_xyz_reads_elements_and_coords() {
        let dump = "3\nwater\nO 0.0 0.0 0.1173\nH 0.0 0.7572 -0.4692\nH 0.0 -0.7572 -0.4692\n";
        let s = AtomicStructure::from_xyz(dump).unwrap();
        assert_eq!(s.num_atoms(), 3);
        assert_eq!(s.elements(), &["O", "H", "H"]);
        assert_eq!(s.get_atom_coords(1), [0.0, 0.7572, -0.4692]);
        assert_eq!(s.count_element("H"), 2);
    }

    #[test]
    fn test_from_xyz_count_mismatch() {
        let dump = "4\nwater\nO 0.0 0.0 0.1173\nH 0.0 0.7572 -0.4692\nH 0.0 -0.7572 -0.4692\n";
        assert_eq!(
            AtomicStructure::from_xyz(dump),
            Err(StructureError::CountMismatch { expected: 4, found: 3 })
        );
    }

    #[test]
    fn test_from_rows_rejects_malformed() {
        let err = AtomicStructure::from_rows("C 0.0 0.0\n").unwrap_err();
        assert!(matches!(err, StructureError::MalformedRow { row: 1, .. }));

        let err = AtomicStructure::from_rows("C 0.0 0.0 0.0\nH 1.0 abc 0.0\n").unwrap_err();
        assert!(matches!(err, StructureError::MalformedRow { row: 2, .. }));

        assert_eq!(AtomicStructure::from_rows("\n\n"), Err(StructureError::Empty));
    }

    #[test]
    fn test_error_messages() {
        let err = AtomicStructure::from_rows("C 0.0 0.0\n").unwrap_err();
        assert_eq!(err.to_string(), "malformed coordinate row 1: 'C 0.0 0.0'");

        let err = StructureError::CountMismatch { expected: 4, found: 3 };
        assert_eq!(
            err.to_string(),
            "header announces 4 atoms but 3 coordinate rows were found"
        );
        let source: &dyn std::error::Error = &err;
        assert!(source.source().is_none());
    }

    #[test]
    fn test_new_rejects_inconsistent_lengths() {
        assert!(AtomicStructure::new(vec![], vec![]).is_none());
        assert!(AtomicStructure::new(vec!["C".to_string()], vec![0.0, 0.0]).is_none());
    }

    #[test]
    fn test_collapsed_detection() {
        let collapsed = AtomicStructure::from_rows("C 0 0 0\nO 0 0 0\n").unwrap();
        assert!(collapsed.is_collapsed());

        let single = AtomicStructure::from_rows("He 0 0 0\n").unwrap();
        assert!(!single.is_collapsed());
    }
}
