//! Structure-generation service interface.
//!
//! Turning a descriptor into 3D coordinates is delegated to an external
//! cheminformatics toolkit. This module defines the [`EmbeddingService`]
//! contract the resolver talks to and provides [`OpenBabel`], the production
//! backend that drives the `obabel` executable.
//!
//! # Interface Design
//!
//! The service is consumed through two operations that fail independently:
//!
//! 1. **parse**: build a structural graph from the descriptor. Fails when the
//!    connectivity is malformed.
//! 2. **embed_3d**: place the graph in three dimensions, optionally
//!    saturating implicit hydrogens first, and return an XYZ dump. Fails when
//!    no geometry satisfies the valence and ring constraints.
//!
//! Keeping the two apart lets the operator see which stage rejected the
//! molecule.
//!
//! # Usage Pattern
//!
//! ```no_run
//! use orcaprep::descriptor::{MolecularDescriptor, NotationFamily};
//! use orcaprep::embedding::{EmbedOptions, EmbeddingService, OpenBabel};
//!
//! let babel = OpenBabel::new("obabel".to_string());
//! let ethanol = MolecularDescriptor::new("CCO", NotationFamily::Smiles)?;
//! let graph = babel.parse(&ethanol)?;
//! let xyz = babel.embed_3d(&graph, &EmbedOptions::default())?;
//! println!("{}", xyz);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::descriptor::MolecularDescriptor;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::process::Command;
use std::str::FromStr;
use thiserror::Error;

/// Error type for structure resolution.
///
/// Resolution can fail at three points:
/// 1. **Unavailable**: the service could not be started at all
/// 2. **Parse**: the descriptor has no valid structural graph
/// 3. **Embed**: the graph has no valid three-dimensional geometry
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The embedding service could not be launched
    #[error("embedding service could not be started: {0}")]
    Unavailable(#[from] std::io::Error),
    /// The descriptor could not be parsed into a structure graph
    #[error("descriptor parsing failed: {0}")]
    Parse(String),
    /// No 3D geometry could be constructed for the graph
    #[error("3D embedding failed: {0}")]
    Embed(String),
}

/// Type alias for resolution results
pub type Result<T> = std::result::Result<T, ResolveError>;

/// Effort level for 3D coordinate generation.
///
/// Mirrors the speed settings accepted by `obabel --gen3d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedSpeed {
    /// No force-field cleanup
    Fastest,
    /// Quick force-field cleanup
    Fast,
    /// Balanced cleanup and conformer search
    #[default]
    Medium,
    /// Extended conformer search
    Slow,
    /// Exhaustive conformer search
    Best,
}

impl EmbedSpeed {
    /// Keyword passed after `--gen3d`.
    pub fn keyword(&self) -> &'static str {
        match self {
            EmbedSpeed::Fastest => "fastest",
            EmbedSpeed::Fast => "fast",
            EmbedSpeed::Medium => "med",
            EmbedSpeed::Slow => "slow",
            EmbedSpeed::Best => "best",
        }
    }
}

impl FromStr for EmbedSpeed {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fastest" => Ok(EmbedSpeed::Fastest),
            "fast" => Ok(EmbedSpeed::Fast),
            "med" | "medium" => Ok(EmbedSpeed::Medium),
            "slow" => Ok(EmbedSpeed::Slow),
            "best" => Ok(EmbedSpeed::Best),
            other => Err(format!("Unknown embedding speed: {}", other)),
        }
    }
}

impl fmt::Display for EmbedSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Options for the embedding step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbedOptions {
    /// Make implicit hydrogens explicit before emitting coordinates
    pub add_hydrogens: bool,
    /// Effort spent on geometry cleanup
    pub speed: EmbedSpeed,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self {
            add_hydrogens: true,
            speed: EmbedSpeed::default(),
        }
    }
}

/// Structural graph produced by [`EmbeddingService::parse`].
///
/// Holds the descriptor it came from and the service's canonical rendering
/// of the connectivity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureGraph {
    /// The validated descriptor the graph was built from
    pub descriptor: MolecularDescriptor,
    /// Canonical SMILES reported by the service
    pub canonical: String,
}

/// Contract for structure-generation backends.
pub trait EmbeddingService {
    /// Builds a structural graph from a descriptor.
    ///
    /// Returns `ResolveError::Parse` when the connectivity is malformed.
    fn parse(&self, descriptor: &MolecularDescriptor) -> Result<StructureGraph>;

    /// Embeds a graph in three dimensions and returns the XYZ dump.
    ///
    /// The dump starts with the two standard XYZ header lines (atom count,
    /// comment). Returns `ResolveError::Embed` when no geometry can be built.
    fn embed_3d(&self, graph: &StructureGraph, options: &EmbedOptions) -> Result<String>;
}

/// Open Babel backend driving the `obabel` command-line tool.
///
/// # Examples
///
/// ```
/// use orcaprep::embedding::OpenBabel;
///
/// let babel = OpenBabel::new("/usr/local/bin/obabel".to_string());
/// assert_eq!(babel.command, "/usr/local/bin/obabel");
/// ```
pub struct OpenBabel {
    /// Open Babel executable (e.g., "obabel", "/opt/openbabel/bin/obabel")
    pub command: String,
}

impl OpenBabel {
    /// Creates a new Open Babel backend.
    pub fn new(command: String) -> Self {
        Self { command }
    }

    fn parse_args(descriptor: &MolecularDescriptor) -> Vec<String> {
        vec![
            format!("-:{}", descriptor.text()),
            format!("-i{}", descriptor.family().babel_format()),
            "-ocan".to_string(),
        ]
    }

    fn embed_args(graph: &StructureGraph, options: &EmbedOptions) -> Vec<String> {
        let mut args = vec![
            format!("-:{}", graph.descriptor.text()),
            format!("-i{}", graph.descriptor.family().babel_format()),
            "-oxyz".to_string(),
            "--gen3d".to_string(),
            options.speed.keyword().to_string(),
        ];
        if options.add_hydrogens {
            args.push("-h".to_string());
        }
        args
    }

    fn run(&self, args: &[String]) -> Result<(String, String)> {
        debug!("Running {} {}", self.command, args.join(" "));
        let output = Command::new(&self.command).args(args).output()?;
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        debug!("{} exited with {}", self.command, output.status);

        if !output.status.success() {
            return Err(ResolveError::Parse(format!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                diagnostic(&stderr)
            )));
        }
        Ok((stdout, stderr))
    }
}

/// True when Open Babel reports that nothing was converted.
fn nothing_converted(stderr: &str) -> bool {
    stderr.lines().any(|l| l.trim().starts_with("0 molecule"))
}

/// The diagnostic part of Open Babel's stderr, without the conversion count.
fn diagnostic(stderr: &str) -> String {
    let text = stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.contains("molecule converted") && !l.contains("molecules converted"))
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() {
        "no diagnostic output".to_string()
    } else {
        text
    }
}

impl EmbeddingService for OpenBabel {
    fn parse(&self, descriptor: &MolecularDescriptor) -> Result<StructureGraph> {
        let (stdout, stderr) = self.run(&Self::parse_args(descriptor))?;

        let canonical = stdout
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string();

        if canonical.is_empty() || nothing_converted(&stderr) {
            return Err(ResolveError::Parse(format!(
                "{} could not read '{}' as {}: {}",
                self.command,
                descriptor.text(),
                descriptor.family(),
                diagnostic(&stderr)
            )));
        }

        debug!("Canonical form of {}: {}", descriptor, canonical);
        Ok(StructureGraph {
            descriptor: descriptor.clone(),
            canonical,
        })
    }

    fn embed_3d(&self, graph: &StructureGraph, options: &EmbedOptions) -> Result<String> {
        let (stdout, stderr) = self
            .run(&Self::embed_args(graph, options))
            .map_err(|e| match e {
                ResolveError::Parse(msg) => ResolveError::Embed(msg),
                other => other,
            })?;

        if stdout.trim().is_empty() || nothing_converted(&stderr) {
            return Err(ResolveError::Embed(format!(
                "{} produced no coordinates for {}: {}",
                self.command,
                graph.canonical,
                diagnostic(&stderr)
            )));
        }

        Ok(stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::NotationFamily;

    #[test]
    fn test_parse_args() {
        let desc = MolecularDescriptor::new("CCO", NotationFamily::Smiles).unwrap();
        assert_eq!(OpenBabel::parse_args(&desc), vec!["-:CCO", "-ismi", "-ocan"]);
    }

    #[test]
    fn test_embed_args_with_hydrogens() {
        let desc =
            MolecularDescriptor::new("InChI=1S/CH4/h1H4", NotationFamily::Inchi).unwrap();
        let graph = StructureGraph {
            descriptor: desc,
            canonical: "C".to_string(),
        };
        let args = OpenBabel::embed_args(&graph, &EmbedOptions::default());
        assert_eq!(
            args,
            vec!["-:InChI=1S/CH4/h1H4", "-iinchi", "-oxyz", "--gen3d", "med", "-h"]
        );

        let bare = EmbedOptions {
            add_hydrogens: false,
            speed: EmbedSpeed::Fastest,
        };
        let args = OpenBabel::embed_args(&graph, &bare);
        assert_eq!(args.last().unwrap(), "fastest");
    }

    #[test]
    fn test_conversion_count_detection() {
        assert!(nothing_converted("==============================\n0 molecules converted\n"));
        assert!(!nothing_converted("1 molecule converted\n"));
    }

    #[test]
    fn test_diagnostic_strips_count() {
        let stderr = "==============================\n*** Open Babel Error  in ParseSimple\n  SMILES string contains a character 'X' which is invalid\n0 molecules converted\n";
        let diag = diagnostic(stderr);
        assert!(diag.contains("invalid"));
        assert!(!diag.contains("converted"));
        assert_eq!(diagnostic("1 molecule converted\n"), "no diagnostic output");
    }

    #[test]
    fn test_speed_from_str() {
        assert_eq!("best".parse::<EmbedSpeed>().unwrap(), EmbedSpeed::Best);
        assert_eq!("Medium".parse::<EmbedSpeed>().unwrap(), EmbedSpeed::Medium);
        assert!("warp".parse::<EmbedSpeed>().is_err());
    }

    #[test]
    fn test_missing_executable_is_unavailable() {
        let babel = OpenBabel::new("/nonexistent/obabel-for-tests".to_string());
        let desc = MolecularDescriptor::new("CCO", NotationFamily::Smiles).unwrap();
        assert!(matches!(babel.parse(&desc), Err(ResolveError::Unavailable(_))));
    }
}
