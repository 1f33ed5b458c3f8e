//! Output file naming.
//!
//! Every generated input file gets a descriptive, collision-free name:
//!
//! ```text
//! {method}_{basis}_{target}_{calculation}_{timestamp}.inp
//! ```
//!
//! The timestamp has second resolution and contains no `_`, so cutting the
//! stem at its last `_` always gives back the descriptive base name.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use orcaprep::naming::OutputNamer;
//!
//! let namer = OutputNamer::new("B3LYP", "STO-3G", "CC(C)O", "Geometry Optimization");
//! assert_eq!(namer.base_name(), "B3LYP_STO-3G_CCCO_Geometry_Optimization");
//!
//! let when = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(9, 30, 5).unwrap();
//! let file = namer.file_name_at(when);
//! assert_eq!(file, "B3LYP_STO-3G_CCCO_Geometry_Optimization_20240501-093005.inp");
//! assert_eq!(OutputNamer::base_name_of(&file), namer.base_name());
//! ```

use chrono::{Local, NaiveDateTime};
use log::debug;
use std::path::Path;

/// Separator between name components.
pub const SEPARATOR: char = '_';
/// Extension of generated input files.
pub const EXTENSION: &str = "inp";
/// `chrono` format of the timestamp component.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Characters removed from name components: filesystem-hostile characters
/// plus SMILES/InChI punctuation that makes names awkward to handle.
const STRIPPED: &[char] = &[
    '(', ')', '[', ']', '{', '}', '/', '\\', ':', '*', '?', '"', '<', '>', '|', ',', '=',
];

/// Makes one name component filesystem friendly.
///
/// Spaces become the separator, other whitespace and reserved punctuation are
/// removed.
///
/// ```
/// use orcaprep::naming::sanitize_component;
///
/// assert_eq!(sanitize_component("CC(=O)[O-]"), "CCO-");
/// assert_eq!(sanitize_component("InChI=1S/CH4/h1H4"), "InChI1SCH4h1H4");
/// assert_eq!(sanitize_component("6-31G*"), "6-31G");
/// ```
pub fn sanitize_component(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter_map(|c| match c {
            ' ' => Some(SEPARATOR),
            c if c.is_whitespace() || STRIPPED.contains(&c) => None,
            c => Some(c),
        })
        .collect()
}

/// Builds output file names for one logical request.
#[derive(Debug, Clone)]
pub struct OutputNamer {
    base: String,
}

impl OutputNamer {
    /// Creates a namer from the request's method, basis set, target
    /// identifier and calculation label.
    pub fn new(method: &str, basis_set: &str, target: &str, calculation_label: &str) -> Self {
        let base = [method, basis_set, target, calculation_label]
            .iter()
            .map(|part| sanitize_component(part))
            .collect::<Vec<_>>()
            .join(&SEPARATOR.to_string());
        Self { base }
    }

    /// The descriptive part of every name this namer produces.
    pub fn base_name(&self) -> &str {
        &self.base
    }

    /// File name stamped with `when`.
    ///
    /// Format: `{base}_{YYYYMMDD-HHMMSS}.inp`
    pub fn file_name_at(&self, when: NaiveDateTime) -> String {
        format!(
            "{}{}{}.{}",
            self.base,
            SEPARATOR,
            when.format(TIMESTAMP_FORMAT),
            EXTENSION
        )
    }

    /// File name stamped with `when` that does not yet exist in `dir`.
    ///
    /// If the plain timestamped name is taken (two requests within the same
    /// second), `-2`, `-3`, ... is appended to the timestamp component.
    pub fn unique_file_name_at(&self, dir: &Path, when: NaiveDateTime) -> String {
        let stamp = when.format(TIMESTAMP_FORMAT).to_string();
        let mut candidate = self.file_name_at(when);
        let mut counter = 2u32;

        while dir.join(&candidate).exists() {
            debug!("{} exists, trying next suffix", candidate);
            candidate = format!(
                "{}{}{}-{}.{}",
                self.base, SEPARATOR, stamp, counter, EXTENSION
            );
            counter += 1;
        }
        candidate
    }

    /// File name stamped with the current local time, unique within `dir`.
    pub fn unique_file_name(&self, dir: &Path) -> String {
        self.unique_file_name_at(dir, Local::now().naive_local())
    }

    /// Recovers the descriptive base from a generated file name by dropping
    /// the extension and everything from the last separator on.
    pub fn base_name_of(file_name: &str) -> &str {
        let stem = file_name
            .strip_suffix(EXTENSION)
            .and_then(|s| s.strip_suffix('.'))
            .unwrap_or(file_name);
        match stem.rfind(SEPARATOR) {
            Some(idx) => &stem[..idx],
            None => stem,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs::File;
    use tempfile::TempDir;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_base_name_components() {
        let namer = OutputNamer::new("B3LYP", "STO-3G", "CCO", "Energy");
        assert_eq!(namer.base_name(), "B3LYP_STO-3G_CCO_Energy");
    }

    #[test]
    fn test_label_spaces_become_separator() {
        let namer = OutputNamer::new("PBE0", "def2-SVP", "c1ccccc1", "Vibrational Frequencies");
        assert_eq!(namer.base_name(), "PBE0_def2-SVP_c1ccccc1_Vibrational_Frequencies");
    }

    #[test]
    fn test_identifier_punctuation_stripped() {
        let namer = OutputNamer::new("B3LYP", "6-31G*", "C[C@H](N)C(=O)O", "NMR");
        assert_eq!(namer.base_name(), "B3LYP_6-31G_C@HNCOO_NMR");
        assert!(!namer.file_name_at(at(0, 0, 0)).contains('/'));

        let inchi = OutputNamer::new("HF", "STO-3G", "InChI=1S/C2H6O/c1-2-3/h3H,2H2,1H3", "Energy");
        assert_eq!(inchi.base_name(), "HF_STO-3G_InChI1SC2H6Oc1-2-3h3H2H21H3_Energy");
    }

    #[test]
    fn test_requests_at_different_times_do_not_collide() {
        let namer = OutputNamer::new("B3LYP", "STO-3G", "CCO", "Energy");
        let first = namer.file_name_at(at(10, 0, 0));
        let second = namer.file_name_at(at(10, 0, 1));

        assert_ne!(first, second);
        assert_eq!(OutputNamer::base_name_of(&first), namer.base_name());
        assert_eq!(OutputNamer::base_name_of(&second), namer.base_name());
    }

    #[test]
    fn test_same_second_gets_suffix() {
        let dir = TempDir::new().unwrap();
        let namer = OutputNamer::new("B3LYP", "STO-3G", "CCO", "Energy");
        let when = at(12, 30, 0);

        let first = namer.unique_file_name_at(dir.path(), when);
        File::create(dir.path().join(&first)).unwrap();
        let second = namer.unique_file_name_at(dir.path(), when);
        File::create(dir.path().join(&second)).unwrap();
        let third = namer.unique_file_name_at(dir.path(), when);

        assert_eq!(first, "B3LYP_STO-3G_CCO_Energy_20240115-123000.inp");
        assert_eq!(second, "B3LYP_STO-3G_CCO_Energy_20240115-123000-2.inp");
        assert_eq!(third, "B3LYP_STO-3G_CCO_Energy_20240115-123000-3.inp");
        for name in [&first, &second, &third] {
            assert_eq!(OutputNamer::base_name_of(name), namer.base_name());
        }
    }

    #[test]
    fn test_base_name_of_without_separator() {
        assert_eq!(OutputNamer::base_name_of("plain.inp"), "plain");
    }
}
