#![deny(missing_docs)]

//! orcaprep - ORCA input generation from molecular descriptors
//!
//! orcaprep turns a molecule typed as a SMILES string or an InChI identifier
//! into a ready-to-run ORCA input file. The operator picks a calculation
//! type, method and basis set from menus; the molecule is embedded in three
//! dimensions with explicit hydrogens and written into the coordinate block.
//!
//! # Pipeline
//!
//! Each request runs strictly in order:
//!
//! 1. **Validation** ([`descriptor`]): reject descriptors that do not match
//!    the surface grammar of their notation family
//! 2. **Resolution** ([`resolver`], [`embedding`]): parse and embed through an
//!    external toolkit (Open Babel), then read the XYZ rows into an
//!    [`structure::AtomicStructure`]
//! 3. **Directive selection** ([`calculation`]): map the calculation type to
//!    its control lines and auxiliary blocks
//! 4. **Naming** ([`naming`]): descriptive, timestamped, collision-free file
//!    name
//! 5. **Assembly** ([`assembler`]): render and write the input file
//!
//! A failing stage aborts only that request ([`pipeline::GenerationError`]).
//!
//! # Quick Start
//!
//! ```no_run
//! use orcaprep::calculation::{CalculationSpec, CalculationType};
//! use orcaprep::embedding::OpenBabel;
//! use orcaprep::pipeline::{GenerationRequest, InputGenerator};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let babel = OpenBabel::new("obabel".to_string());
//!     let generator = InputGenerator::new(&babel, ".");
//!
//!     let request = GenerationRequest {
//!         descriptor: "CCO".to_string(),
//!         family: None,
//!         spec: CalculationSpec::new("B3LYP", "STO-3G", CalculationType::Energy, 0, 0),
//!     };
//!     let generated = generator.generate(&request)?;
//!     println!("wrote {}", generated.path.display());
//!     Ok(())
//! }
//! ```
//!
//! # Generated File
//!
//! ```text
//! #
//! #B3LYP_STO-3G_CCO_Energy_20240501-093005.inp
//! #
//! %maxcore 3000
//!
//! ! B3LYP STO-3G
//!
//!
//! * xyz 0 1
//! C  -0.88708000  0.15860000  0.03080000
//! ...
//! *
//! ```
//!
//! # Configuration
//!
//! See [`settings`] for the `orcaprep_config.cfg` format and search order.

/// Input file assembly
pub mod assembler;
pub mod calculation;
pub mod descriptor;
pub mod embedding;
/// Numbered menus and prompts
pub mod menu;
/// Timestamped output file names
pub mod naming;
pub mod pipeline;
pub mod resolver;
/// Interactive session
pub mod session;
/// Configuration management system
pub mod settings;
pub mod structure;

pub use calculation::{CalculationSpec, CalculationType};
pub use descriptor::{MolecularDescriptor, NotationFamily};
pub use structure::AtomicStructure;
