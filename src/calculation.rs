//! Calculation settings and the calculation-type directive policy.
//!
//! This module defines:
//!
//! - [`CalculationType`]: the kind of ORCA job to prepare
//! - [`DirectiveSet`]: the static control lines and auxiliary blocks a job
//!   type contributes to the input file
//! - [`CalculationSpec`]: method, basis set, job type, charge and spin of a
//!   single request
//!
//! # Directive Policy
//!
//! | Tag | Directive | Extra |
//! |-----|-----------|-------|
//! | `energy` | *(empty line)* | |
//! | `opt` | `! OPT` | |
//! | `freq` | `! FREQ` | |
//! | `optfreq` | `! OPT FREQ` | |
//! | `nmr` | `! NMR` | `AutoAux` on the method line, `%eprnmr` block after the coordinates |
//! | `uv` | *(empty line)* | `%cis` block before the coordinates |
//!
//! Any other tag yields an empty directive line and no extra blocks, so the
//! assembler can always produce a well-formed file. Supporting a new job type
//! means adding a variant and one `DirectiveSet` constant.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named `%block ... end` section of an ORCA input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuxBlock {
    /// Block keyword without the leading `%`
    pub name: &'static str,
    /// Body lines, written indented between the opener and `end`
    pub body: &'static [&'static str],
}

impl AuxBlock {
    /// Renders the block, ending with a newline.
    ///
    /// ```
    /// use orcaprep::calculation::CalculationType;
    ///
    /// let block = CalculationType::UvVis.directives().pre_coordinate_block.unwrap();
    /// assert_eq!(block.render(), "%cis\n  nroots 8\n  maxdim 64\nend\n");
    /// ```
    pub fn render(&self) -> String {
        let mut text = format!("%{}\n", self.name);
        for line in self.body {
            text.push_str("  ");
            text.push_str(line);
            text.push('\n');
        }
        text.push_str("end\n");
        text
    }
}

/// Everything a calculation type contributes to the input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectiveSet {
    /// Lines written right after the method/basis line
    pub lines: &'static [&'static str],
    /// Keyword appended to the method/basis line
    pub method_modifier: Option<&'static str>,
    /// Block written between the directives and the coordinate block
    pub pre_coordinate_block: Option<AuxBlock>,
    /// Block written after the coordinate block terminator
    pub post_coordinate_block: Option<AuxBlock>,
}

const NO_OP: DirectiveSet = DirectiveSet {
    lines: &[""],
    method_modifier: None,
    pre_coordinate_block: None,
    post_coordinate_block: None,
};

const OPTIMIZATION: DirectiveSet = DirectiveSet {
    lines: &["! OPT"],
    ..NO_OP
};

const FREQUENCIES: DirectiveSet = DirectiveSet {
    lines: &["! FREQ"],
    ..NO_OP
};

const OPT_FREQ: DirectiveSet = DirectiveSet {
    lines: &["! OPT FREQ"],
    ..NO_OP
};

const NMR: DirectiveSet = DirectiveSet {
    lines: &["! NMR"],
    method_modifier: Some("AutoAux"),
    pre_coordinate_block: None,
    post_coordinate_block: Some(AuxBlock {
        name: "eprnmr",
        body: &["Nuclei = all C { shift }", "Nuclei = all H { shift }"],
    }),
};

const UV_VIS: DirectiveSet = DirectiveSet {
    pre_coordinate_block: Some(AuxBlock {
        name: "cis",
        body: &["nroots 8", "maxdim 64"],
    }),
    ..NO_OP
};

/// The kind of calculation to prepare.
///
/// Parsing a tag never fails: unknown tags are kept as [`CalculationType::Other`]
/// and map to a no-op directive.
///
/// # Examples
///
/// ```
/// use orcaprep::calculation::CalculationType;
///
/// assert_eq!(CalculationType::from_tag("OPT"), CalculationType::Optimization);
/// assert_eq!(CalculationType::from_tag("scan"), CalculationType::Other("scan".to_string()));
/// assert_eq!(CalculationType::from_tag("scan").directives().lines, &[""]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CalculationType {
    /// Single-point energy
    Energy,
    /// Geometry optimization
    Optimization,
    /// Vibrational frequency analysis
    Frequencies,
    /// Optimization followed by frequencies
    OptFreq,
    /// NMR chemical shift prediction
    Nmr,
    /// UV/Vis excited-state prediction
    UvVis,
    /// Any tag outside the known set
    Other(String),
}

impl CalculationType {
    /// Known calculation types, in menu order.
    pub fn all() -> [CalculationType; 6] {
        [
            CalculationType::Energy,
            CalculationType::Optimization,
            CalculationType::Frequencies,
            CalculationType::OptFreq,
            CalculationType::Nmr,
            CalculationType::UvVis,
        ]
    }

    /// Maps a tag to a calculation type. Matching ignores case and
    /// surrounding whitespace.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "energy" | "sp" => CalculationType::Energy,
            "opt" => CalculationType::Optimization,
            "freq" => CalculationType::Frequencies,
            "optfreq" | "opt+freq" => CalculationType::OptFreq,
            "nmr" => CalculationType::Nmr,
            "uv" | "uvvis" => CalculationType::UvVis,
            _ => CalculationType::Other(tag.trim().to_string()),
        }
    }

    /// Canonical tag.
    pub fn tag(&self) -> &str {
        match self {
            CalculationType::Energy => "energy",
            CalculationType::Optimization => "opt",
            CalculationType::Frequencies => "freq",
            CalculationType::OptFreq => "optfreq",
            CalculationType::Nmr => "nmr",
            CalculationType::UvVis => "uv",
            CalculationType::Other(tag) => tag.as_str(),
        }
    }

    /// Human-readable label, used in menus and output file names.
    pub fn label(&self) -> &str {
        match self {
            CalculationType::Energy => "Energy",
            CalculationType::Optimization => "Geometry Optimization",
            CalculationType::Frequencies => "Vibrational Frequencies",
            CalculationType::OptFreq => "Optimization and Frequencies",
            CalculationType::Nmr => "NMR",
            CalculationType::UvVis => "UV-Vis",
            CalculationType::Other(tag) => tag.as_str(),
        }
    }

    /// Directive set for this calculation type.
    pub fn directives(&self) -> &'static DirectiveSet {
        match self {
            CalculationType::Energy => &NO_OP,
            CalculationType::Optimization => &OPTIMIZATION,
            CalculationType::Frequencies => &FREQUENCIES,
            CalculationType::OptFreq => &OPT_FREQ,
            CalculationType::Nmr => &NMR,
            CalculationType::UvVis => &UV_VIS,
            CalculationType::Other(_) => &NO_OP,
        }
    }
}

impl fmt::Display for CalculationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Spin multiplicity `2S + 1` for spin quantum number `S`.
///
/// ```
/// use orcaprep::calculation::multiplicity;
///
/// assert_eq!(multiplicity(0), 1);
/// assert_eq!(multiplicity(1), 3);
/// assert_eq!(multiplicity(u32::MAX), 8_589_934_591);
/// ```
pub fn multiplicity(spin: u32) -> u64 {
    2 * u64::from(spin) + 1
}

/// Level of theory, job type and electronic state of one request.
///
/// # Examples
///
/// ```
/// use orcaprep::calculation::{CalculationSpec, CalculationType};
///
/// let spec = CalculationSpec::new("B3LYP", "def2-SVP", CalculationType::Optimization, 0, 1);
/// assert_eq!(spec.multiplicity(), 3);
/// assert_eq!(spec.method_line(), "! B3LYP def2-SVP");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationSpec {
    method: String,
    basis_set: String,
    calculation: CalculationType,
    charge: i32,
    spin: u32,
}

impl CalculationSpec {
    /// Creates a calculation spec.
    pub fn new(
        method: &str,
        basis_set: &str,
        calculation: CalculationType,
        charge: i32,
        spin: u32,
    ) -> Self {
        Self {
            method: method.trim().to_string(),
            basis_set: basis_set.trim().to_string(),
            calculation,
            charge,
            spin,
        }
    }

    /// Electronic structure method, e.g. `B3LYP`.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Basis set, e.g. `def2-SVP`.
    pub fn basis_set(&self) -> &str {
        &self.basis_set
    }

    /// Calculation type.
    pub fn calculation(&self) -> &CalculationType {
        &self.calculation
    }

    /// Net charge.
    pub fn charge(&self) -> i32 {
        self.charge
    }

    /// Spin quantum number S.
    pub fn spin(&self) -> u32 {
        self.spin
    }

    /// Spin multiplicity `2S + 1`.
    pub fn multiplicity(&self) -> u64 {
        multiplicity(self.spin)
    }

    /// The `! method basis` line, with the calculation type's modifier.
    pub fn method_line(&self) -> String {
        let mut line = format!("! {} {}", self.method, self.basis_set);
        if let Some(modifier) = self.calculation.directives().method_modifier {
            line.push(' ');
            line.push_str(modifier);
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiplicity_is_odd() {
        for spin in 0..50u32 {
            let m = multiplicity(spin);
            assert_eq!(m, 2 * u64::from(spin) + 1);
            assert_eq!(m % 2, 1);
        }
    }

    #[test]
    fn test_multiplicity_at_spin_limit() {
        assert_eq!(multiplicity(1 << 31), 4_294_967_297);
        assert_eq!(multiplicity(u32::MAX), 8_589_934_591);

        let spec = CalculationSpec::new("UHF", "STO-3G", CalculationType::Energy, 0, u32::MAX);
        assert_eq!(spec.multiplicity(), 8_589_934_591);
        assert_eq!(spec.multiplicity() % 2, 1);
    }

    #[test]
    fn test_tags_round_trip() {
        for calc in CalculationType::all() {
            assert_eq!(CalculationType::from_tag(calc.tag()), calc);
        }
        assert_eq!(CalculationType::from_tag(" UV "), CalculationType::UvVis);
        assert_eq!(CalculationType::from_tag("opt+freq"), CalculationType::OptFreq);
    }

    #[test]
    fn test_unknown_tag_is_no_op() {
        let calc = CalculationType::from_tag("md");
        assert_eq!(calc, CalculationType::Other("md".to_string()));
        let set = calc.directives();
        assert_eq!(set.lines, &[""]);
        assert!(set.method_modifier.is_none());
        assert!(set.pre_coordinate_block.is_none());
        assert!(set.post_coordinate_block.is_none());
        assert_eq!(calc.label(), "md");
    }

    #[test]
    fn test_only_nmr_and_uv_carry_blocks() {
        for calc in CalculationType::all() {
            let set = calc.directives();
            assert_eq!(set.pre_coordinate_block.is_some(), calc == CalculationType::UvVis);
            assert_eq!(set.post_coordinate_block.is_some(), calc == CalculationType::Nmr);
            assert_eq!(set.method_modifier.is_some(), calc == CalculationType::Nmr);
        }
    }

    #[test]
    fn test_cis_block_requests_eight_roots() {
        let block = CalculationType::UvVis.directives().pre_coordinate_block.unwrap();
        assert_eq!(block.name, "cis");
        assert_eq!(block.body, &["nroots 8", "maxdim 64"]);
    }

    #[test]
    fn test_nmr_block_scoped_to_carbon_and_hydrogen() {
        let text = CalculationType::Nmr
            .directives()
            .post_coordinate_block
            .unwrap()
            .render();
        assert!(text.starts_with("%eprnmr\n"));
        assert!(text.contains("Nuclei = all C { shift }"));
        assert!(text.contains("Nuclei = all H { shift }"));
        assert!(text.ends_with("end\n"));
    }

    #[test]
    fn test_nmr_method_line_has_autoaux() {
        let spec = CalculationSpec::new("PBE0", "def2-TZVP", CalculationType::Nmr, 0, 0);
        assert_eq!(spec.method_line(), "! PBE0 def2-TZVP AutoAux");
    }
}
