//! Molecular descriptors and their surface-syntax validation.
//!
//! A descriptor is the text the operator types to identify a molecule. Two
//! notation families are supported:
//!
//! - **SMILES**: line notation such as `CCO` or `c1ccccc1C(=O)[O-]`
//! - **InChI**: standard identifiers such as `InChI=1S/C2H6O/c1-2-3/h3H,2H2,1H3`
//!
//! Validation only checks the surface grammar. It exists to reject obviously
//! malformed input before the embedding service is invoked; whether the
//! molecule is chemically sensible is decided by the service.
//!
//! # Examples
//!
//! ```
//! use orcaprep::descriptor::{MolecularDescriptor, NotationFamily};
//!
//! let ethanol = MolecularDescriptor::new("CCO", NotationFamily::Smiles).unwrap();
//! assert_eq!(ethanol.text(), "CCO");
//!
//! // Missing the mandatory prefix
//! assert!(MolecularDescriptor::new("1S/C2H6O", NotationFamily::Inchi).is_err());
//! ```

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

/// Notation families a descriptor can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotationFamily {
    /// SMILES line notation
    Smiles,
    /// IUPAC standard identifier (InChI)
    Inchi,
}

impl NotationFamily {
    /// All families, in menu order.
    pub const ALL: [NotationFamily; 2] = [NotationFamily::Smiles, NotationFamily::Inchi];

    /// Guesses the family of a raw string.
    ///
    /// Anything carrying the `InChI=` prefix is treated as an identifier,
    /// everything else as line notation.
    pub fn detect(text: &str) -> Self {
        if text.trim_start().starts_with("InChI=") {
            NotationFamily::Inchi
        } else {
            NotationFamily::Smiles
        }
    }

    /// Input format code understood by Open Babel (`-i<code>`).
    pub fn babel_format(&self) -> &'static str {
        match self {
            NotationFamily::Smiles => "smi",
            NotationFamily::Inchi => "inchi",
        }
    }

    /// Human readable name.
    pub fn label(&self) -> &'static str {
        match self {
            NotationFamily::Smiles => "SMILES",
            NotationFamily::Inchi => "InChI",
        }
    }
}

impl fmt::Display for NotationFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for NotationFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "smiles" | "smi" => Ok(NotationFamily::Smiles),
            "inchi" => Ok(NotationFamily::Inchi),
            other => Err(format!("Unknown notation family: {}", other)),
        }
    }
}

/// Descriptor rejected by its declared grammar.
///
/// The error is recoverable: the caller is expected to report it and ask
/// for another descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Family the descriptor was checked against
    pub family: NotationFamily,
    /// Human-readable error message
    pub message: String,
    /// Optional hint for fixing the descriptor
    pub suggestion: Option<String>,
}

impl ValidationError {
    fn new(family: NotationFamily, message: String) -> Self {
        Self {
            family,
            message,
            suggestion: None,
        }
    }

    fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.suggestion = Some(suggestion.to_string());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "descriptor validation failed ({}): {}", self.family, self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n\nSuggestion: {}", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

lazy_static! {
    // Atom start followed by the atom/bond/branch/charge/ring-closure alphabet.
    static ref SMILES_RE: Regex =
        Regex::new(r"^[A-Za-z\[*][A-Za-z0-9@+\-\[\]()=#$:/\\%.*~]*$").unwrap();

    // InChI=1[S]/<formula>[/<layer>...]
    static ref INCHI_RE: Regex =
        Regex::new(r"^InChI=1S?/[A-Za-z0-9.()*]+(?:/[a-z][^/\s]*)*$").unwrap();
}

/// Checks `text` against the grammar of `family`.
///
/// # Examples
///
/// ```
/// use orcaprep::descriptor::{validate, NotationFamily};
///
/// assert!(validate("C1=CC=CC=C1", NotationFamily::Smiles).is_ok());
/// assert!(validate("C1=CC(", NotationFamily::Smiles).is_err());
/// assert!(validate("InChI=1S/CH4/h1H4", NotationFamily::Inchi).is_ok());
/// ```
pub fn validate(text: &str, family: NotationFamily) -> Result<(), ValidationError> {
    if text.is_empty() {
        return Err(ValidationError::new(family, "descriptor is empty".to_string())
            .with_suggestion("Enter a molecule, e.g. CCO for ethanol"));
    }

    match family {
        NotationFamily::Smiles => validate_smiles(text),
        NotationFamily::Inchi => validate_inchi(text),
    }
}

fn validate_smiles(text: &str) -> Result<(), ValidationError> {
    let family = NotationFamily::Smiles;

    if !SMILES_RE.is_match(text) {
        let offending = text
            .chars()
            .enumerate()
            .find(|(i, c)| {
                let allowed = if *i == 0 {
                    c.is_ascii_alphabetic() || *c == '[' || *c == '*'
                } else {
                    c.is_ascii_alphanumeric() || "@+-[]()=#$:/\\%.*~".contains(*c)
                };
                !allowed
            })
            .map(|(i, c)| format!("unexpected character '{}' at position {}", c, i + 1))
            .unwrap_or_else(|| "string does not match the SMILES alphabet".to_string());
        return Err(ValidationError::new(family, offending)
            .with_suggestion("SMILES must start with an atom and contain no whitespace"));
    }

    let mut depth = 0usize;
    let mut in_bracket = false;
    for (i, c) in text.chars().enumerate() {
        match c {
            '[' if in_bracket => {
                return Err(ValidationError::new(
                    family,
                    format!("nested '[' at position {}", i + 1),
                ))
            }
            '[' => in_bracket = true,
            ']' if !in_bracket => {
                return Err(ValidationError::new(
                    family,
                    format!("unmatched ']' at position {}", i + 1),
                ))
            }
            ']' => in_bracket = false,
            '(' if !in_bracket => depth += 1,
            ')' if !in_bracket => {
                if depth == 0 {
                    return Err(ValidationError::new(
                        family,
                        format!("unmatched ')' at position {}", i + 1),
                    ));
                }
                depth -= 1;
            }
            _ => {}
        }
    }

    if in_bracket {
        return Err(ValidationError::new(family, "unterminated bracket atom".to_string()));
    }
    if depth > 0 {
        return Err(ValidationError::new(family, format!("{} unclosed branch(es)", depth)));
    }
    if text.ends_with(['=', '#', '$', '-', '/', '\\', '~']) {
        return Err(ValidationError::new(
            family,
            "descriptor ends with a dangling bond".to_string(),
        ));
    }

    Ok(())
}

fn validate_inchi(text: &str) -> Result<(), ValidationError> {
    let family = NotationFamily::Inchi;

    if !text.starts_with("InChI=") {
        return Err(
            ValidationError::new(family, "missing mandatory 'InChI=' prefix".to_string())
                .with_suggestion("Identifiers look like InChI=1S/C2H6O/c1-2-3/h3H,2H2,1H3"),
        );
    }

    if !INCHI_RE.is_match(text) {
        return Err(ValidationError::new(
            family,
            "expected InChI=1[S]/<formula> followed by '/'-separated layers".to_string(),
        ));
    }

    Ok(())
}

/// A descriptor that has passed validation for its family.
///
/// The only constructor validates, so holding a `MolecularDescriptor` means
/// the string conforms to its declared grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MolecularDescriptor {
    text: String,
    family: NotationFamily,
}

impl MolecularDescriptor {
    /// Validates `text` as `family` and wraps it.
    ///
    /// Leading and trailing whitespace is removed before validation.
    pub fn new(text: &str, family: NotationFamily) -> Result<Self, ValidationError> {
        let text = text.trim();
        validate(text, family)?;
        Ok(Self {
            text: text.to_string(),
            family,
        })
    }

    /// Validates `text` using the family returned by [`NotationFamily::detect`].
    pub fn detect(text: &str) -> Result<Self, ValidationError> {
        Self::new(text, NotationFamily::detect(text))
    }

    /// The descriptor string.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The declared notation family.
    pub fn family(&self) -> NotationFamily {
        self.family
    }
}

impl fmt::Display for MolecularDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.text, self.family)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_common_smiles() {
        for smiles in [
            "C",
            "CCO",
            "c1ccccc1",
            "CC(=O)O",
            "C#N",
            "[Na+].[Cl-]",
            "C[C@H](N)C(=O)O",
            "F/C=C/F",
            "C%10CCCCC%10",
            "[13CH4]",
        ] {
            assert!(
                validate(smiles, NotationFamily::Smiles).is_ok(),
                "{} should be accepted",
                smiles
            );
        }
    }

    #[test]
    fn test_rejects_malformed_smiles() {
        for smiles in ["", "1CC", "(C)C", "C C", "CC)", "C(C", "[Na", "Na]", "[[Na]]", "CC=", "C!"] {
            assert!(
                validate(smiles, NotationFamily::Smiles).is_err(),
                "{:?} should be rejected",
                smiles
            );
        }
    }

    #[test]
    fn test_smiles_error_names_offending_character() {
        let err = validate("CC!O", NotationFamily::Smiles).unwrap_err();
        assert!(err.message.contains("'!'"));
        assert!(err.message.contains("position 3"));
    }

    #[test]
    fn test_accepts_inchi_layers() {
        for inchi in [
            "InChI=1S/CH4/h1H4",
            "InChI=1S/C2H6O/c1-2-3/h3H,2H2,1H3",
            "InChI=1/C2H6O/c1-2-3/h3H,2H2,1H3",
            "InChI=1S/C2H4O2/c1-2(3)4/h1H3,(H,3,4)/p-1",
            "InChI=1S/C4H8/c1-3-4-2/h3-4H,1-2H3/b4-3+",
            "InChI=1S/Na.H2O/h;1H2/q+1;/p-1",
        ] {
            assert!(
                validate(inchi, NotationFamily::Inchi).is_ok(),
                "{} should be accepted",
                inchi
            );
        }
    }

    #[test]
    fn test_rejects_inchi_without_prefix() {
        let err = validate("1S/C2H6O/c1-2-3/h3H,2H2,1H3", NotationFamily::Inchi).unwrap_err();
        assert_eq!(err.family, NotationFamily::Inchi);
        assert!(err.message.contains("prefix"));
        assert!(err.suggestion.is_some());
    }

    #[test]
    fn test_rejects_malformed_inchi() {
        for inchi in ["InChI=", "InChI=1S", "InChI=1S/", "InChI=2S/CH4", "InChI=1S/CH4//h1H4", "InChI=1S/CH4/h1H4 "] {
            assert!(
                validate(inchi, NotationFamily::Inchi).is_err(),
                "{:?} should be rejected",
                inchi
            );
        }
    }

    #[test]
    fn test_detect_family() {
        assert_eq!(NotationFamily::detect("CCO"), NotationFamily::Smiles);
        assert_eq!(NotationFamily::detect("InChI=1S/CH4/h1H4"), NotationFamily::Inchi);
    }

    #[test]
    fn test_descriptor_trims_whitespace() {
        let desc = MolecularDescriptor::new("  CCO\n", NotationFamily::Smiles).unwrap();
        assert_eq!(desc.text(), "CCO");
        assert_eq!(desc.family(), NotationFamily::Smiles);
    }

    #[test]
    fn test_family_from_str() {
        assert_eq!("SMILES".parse::<NotationFamily>().unwrap(), NotationFamily::Smiles);
        assert_eq!("inchi".parse::<NotationFamily>().unwrap(), NotationFamily::Inchi);
        assert!("mol2".parse::<NotationFamily>().is_err());
    }
}
