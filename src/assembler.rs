//! ORCA input file assembly.
//!
//! The assembler turns a [`CalculationSpec`] and an [`AtomicStructure`] into
//! the text of an ORCA input file. The section order is fixed:
//!
//! ```text
//! #
//! #<title>
//! #
//! %maxcore 3000
//!
//! ! B3LYP STO-3G
//! <directive lines>
//!
//! <pre-coordinate block, UV/Vis only>
//! * xyz 0 1
//! C  0.00000000  0.00000000  0.00000000
//! ...
//! *
//! <post-coordinate block, NMR only>
//! ```
//!
//! ORCA reads these tokens positionally, so the literal text matters.

use crate::calculation::CalculationSpec;
use crate::structure::AtomicStructure;
use log::{debug, info};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Resource directives written after the comment header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resources {
    /// Memory per core in MB (`%maxcore`)
    pub maxcore: u32,
    /// Number of parallel processes; `%pal` is written only when > 1
    pub nprocs: u32,
}

impl Default for Resources {
    fn default() -> Self {
        Self {
            maxcore: 3000,
            nprocs: 1,
        }
    }
}

/// Builds the text of an ORCA input file.
///
/// # Examples
///
/// ```
/// use orcaprep::assembler::{build_orca_input, Resources};
/// use orcaprep::calculation::{CalculationSpec, CalculationType};
/// use orcaprep::structure::AtomicStructure;
///
/// let h2 = AtomicStructure::from_rows("H 0.0 0.0 0.0\nH 0.0 0.0 0.74\n").unwrap();
/// let spec = CalculationSpec::new("HF", "STO-3G", CalculationType::Optimization, 0, 0);
/// let text = build_orca_input("h2.inp", &spec, &h2, &Resources::default());
///
/// assert!(text.contains("! HF STO-3G\n! OPT\n"));
/// assert!(text.contains("* xyz 0 1\n"));
/// assert!(text.ends_with("*\n"));
/// ```
pub fn build_orca_input(
    title: &str,
    spec: &CalculationSpec,
    structure: &AtomicStructure,
    resources: &Resources,
) -> String {
    let directives = spec.calculation().directives();
    let mut content = String::new();

    content.push_str(&format!("#\n#{}\n#\n", title));
    content.push_str(&format!("%maxcore {}\n", resources.maxcore));
    if resources.nprocs > 1 {
        content.push_str(&format!("%pal nprocs {} end\n", resources.nprocs));
    }
    content.push('\n');

    content.push_str(&spec.method_line());
    content.push('\n');
    for line in directives.lines {
        content.push_str(line);
        content.push('\n');
    }
    content.push('\n');

    if let Some(block) = &directives.pre_coordinate_block {
        content.push_str(&block.render());
        content.push('\n');
    }

    content.push_str(&format!("* xyz {} {}\n", spec.charge(), spec.multiplicity()));
    for (element, [x, y, z]) in structure.atoms() {
        content.push_str(&format!("{}  {:.8}  {:.8}  {:.8}\n", element, x, y, z));
    }
    content.push_str("*\n");

    if let Some(block) = &directives.post_coordinate_block {
        content.push('\n');
        content.push_str(&block.render());
    }

    content
}

/// A finished input file: name and content.
///
/// Artifacts are written once. [`InputArtifact::write_to`] refuses to
/// overwrite an existing file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputArtifact {
    /// File name, without directory
    pub file_name: String,
    /// Full file content
    pub content: String,
}

impl InputArtifact {
    /// Assembles an artifact whose header title is its own file name.
    pub fn assemble(
        file_name: String,
        spec: &CalculationSpec,
        structure: &AtomicStructure,
        resources: &Resources,
    ) -> Self {
        let content = build_orca_input(&file_name, spec, structure, resources);
        debug!("Assembled {} ({} bytes)", file_name, content.len());
        Self { file_name, content }
    }

    /// Writes the artifact into `dir` and returns the full path.
    ///
    /// The file is created exclusively; an existing file with the same name
    /// is an `AlreadyExists` error. The handle is closed before returning,
    /// whether or not the write succeeded.
    pub fn write_to(&self, dir: &Path) -> io::Result<PathBuf> {
        let path = dir.join(&self.file_name);
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)?;
            file.write_all(self.content.as_bytes())?;
            file.flush()?;
        }
        info!("Wrote {}", path.display());
        Ok(path)
    }
}
