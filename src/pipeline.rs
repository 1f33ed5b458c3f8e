//! End-to-end input generation.
//!
//! One request runs through the stages strictly in order:
//!
//! 1. validate the descriptor against its notation family
//! 2. resolve it to a 3D structure through the embedding service
//! 3. name the output file
//! 4. assemble and write the ORCA input
//!
//! A failing stage aborts the request with a [`GenerationError`] that names
//! it; nothing is written unless every earlier stage succeeded.

use crate::assembler::{InputArtifact, Resources};
use crate::calculation::{CalculationSpec, CalculationType};
use crate::descriptor::{MolecularDescriptor, NotationFamily, ValidationError};
use crate::embedding::{EmbedSpeed, EmbeddingService, ResolveError};
use crate::naming::OutputNamer;
use crate::resolver::Resolver;
use crate::settings::SettingsManager;
use chrono::{Local, NaiveDateTime};
use log::{error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why a generation request was aborted.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// The descriptor does not conform to its notation family
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The embedding service could not produce a structure
    #[error(transparent)]
    Resolution(#[from] ResolveError),
    /// The input file could not be written
    #[error("could not write input file {}: {source}", .path.display())]
    Io {
        /// Target path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Everything the operator chose for one input file.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Descriptor as typed
    pub descriptor: String,
    /// Declared notation family, or `None` to detect it from the text
    pub family: Option<NotationFamily>,
    /// Level of theory, job type, charge and spin
    pub spec: CalculationSpec,
}

/// A written input file.
#[derive(Debug, Clone)]
pub struct GeneratedInput {
    /// Full path of the written file
    pub path: PathBuf,
    /// Name and content of the file
    pub artifact: InputArtifact,
    /// Number of atoms in the coordinate block
    pub num_atoms: usize,
}

/// Runs generation requests against one embedding service and output
/// directory.
pub struct InputGenerator<'a, S: EmbeddingService + ?Sized> {
    service: &'a S,
    speed: EmbedSpeed,
    resources: Resources,
    output_dir: PathBuf,
}

impl<'a, S: EmbeddingService + ?Sized> InputGenerator<'a, S> {
    /// Creates a generator with default resources and embedding speed.
    pub fn new(service: &'a S, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            service,
            speed: EmbedSpeed::default(),
            resources: Resources::default(),
            output_dir: output_dir.into(),
        }
    }

    /// Creates a generator configured from loaded settings.
    pub fn from_settings(service: &'a S, settings: &SettingsManager) -> Self {
        Self {
            service,
            speed: settings.embedding().speed,
            resources: settings.general().resources(),
            output_dir: settings.general().output_dir.clone(),
        }
    }

    /// Overrides the resource directives.
    pub fn with_resources(mut self, resources: Resources) -> Self {
        self.resources = resources;
        self
    }

    /// Overrides the 3D generation effort.
    pub fn with_speed(mut self, speed: EmbedSpeed) -> Self {
        self.speed = speed;
        self
    }

    /// Directory generated files are written to.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Runs `request`, stamping the file name with the current local time.
    pub fn generate(&self, request: &GenerationRequest) -> Result<GeneratedInput, GenerationError> {
        self.generate_at(request, Local::now().naive_local())
    }

    /// Runs `request`, stamping the file name with `when`.
    pub fn generate_at(
        &self,
        request: &GenerationRequest,
        when: NaiveDateTime,
    ) -> Result<GeneratedInput, GenerationError> {
        let result = self.run(request, when);
        if let Err(e) = &result {
            error!("Request for '{}' aborted: {}", request.descriptor.trim(), e);
        }
        result
    }

    fn run(
        &self,
        request: &GenerationRequest,
        when: NaiveDateTime,
    ) -> Result<GeneratedInput, GenerationError> {
        let descriptor = match request.family {
            Some(family) => MolecularDescriptor::new(&request.descriptor, family)?,
            None => MolecularDescriptor::detect(&request.descriptor)?,
        };
        info!("Accepted {}", descriptor);

        let structure = Resolver::new(self.service, self.speed).resolve(&descriptor)?;

        fs::create_dir_all(&self.output_dir).map_err(|source| GenerationError::Io {
            path: self.output_dir.clone(),
            source,
        })?;

        let spec = &request.spec;
        if let CalculationType::Other(tag) = spec.calculation() {
            warn!("Unknown calculation type '{}', writing no directive", tag);
        }
        let namer = OutputNamer::new(
            spec.method(),
            spec.basis_set(),
            descriptor.text(),
            spec.calculation().label(),
        );
        let file_name = namer.unique_file_name_at(&self.output_dir, when);

        let artifact = InputArtifact::assemble(file_name, spec, &structure, &self.resources);
        let path = artifact
            .write_to(&self.output_dir)
            .map_err(|source| GenerationError::Io {
                path: self.output_dir.join(&artifact.file_name),
                source,
            })?;

        Ok(GeneratedInput {
            path,
            artifact,
            num_atoms: structure.num_atoms(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::{EmbedOptions, Result as ResolveResult, StructureGraph};
    use tempfile::TempDir;

    struct Water;

    impl EmbeddingService for Water {
        fn parse(&self, descriptor: &MolecularDescriptor) -> ResolveResult<StructureGraph> {
            Ok(StructureGraph {
                descriptor: descriptor.clone(),
                canonical: "O".to_string(),
            })
        }

        fn embed_3d(&self, _: &StructureGraph, _: &EmbedOptions) -> ResolveResult<String> {
            Ok("3\nwater\nO 0.0 0.0 0.1173\nH 0.0 0.7572 -0.4692\nH 0.0 -0.7572 -0.4692\n"
                .to_string())
        }
    }

    fn request(descriptor: &str) -> GenerationRequest {
        GenerationRequest {
            descriptor: descriptor.to_string(),
            family: None,
            spec: CalculationSpec::new("HF", "STO-3G", CalculationType::Energy, 0, 0),
        }
    }

    #[test]
    fn test_creates_missing_output_dir() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("nested").join("inputs");
        let generator = InputGenerator::new(&Water, &out);

        let generated = generator.generate(&request("O")).unwrap();
        assert!(generated.path.starts_with(&out));
        assert_eq!(generated.num_atoms, 3);
        assert_eq!(fs::read_to_string(&generated.path).unwrap(), generated.artifact.content);
    }

    #[test]
    fn test_same_second_does_not_overwrite() {
        let dir = TempDir::new().unwrap();
        let generator = InputGenerator::new(&Water, dir.path());
        let when = NaiveDateTime::parse_from_str("2024-03-01 08:00:00", "%Y-%m-%d %H:%M:%S")
            .unwrap();

        let first = generator.generate_at(&request("O"), when).unwrap();
        let second = generator.generate_at(&request("O"), when).unwrap();
        assert_ne!(first.path, second.path);
        assert!(first.path.exists() && second.path.exists());
    }

    #[test]
    fn test_resources_reach_the_file() {
        let dir = TempDir::new().unwrap();
        let generator = InputGenerator::new(&Water, dir.path()).with_resources(Resources {
            maxcore: 1024,
            nprocs: 4,
        });
        let generated = generator.generate(&request("O")).unwrap();
        assert!(generated.artifact.content.contains("%maxcore 1024\n%pal nprocs 4 end\n"));
    }

    #[test]
    fn test_invalid_descriptor_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let generator = InputGenerator::new(&Water, dir.path());
        let err = generator.generate(&request("C1=CC(")).unwrap_err();

        assert!(matches!(err, GenerationError::Validation(_)));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_unwritable_output_dir_is_io_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "").unwrap();

        let generator = InputGenerator::new(&Water, &blocker);
        let err = generator.generate(&request("O")).unwrap_err();
        assert!(matches!(err, GenerationError::Io { .. }));
        assert!(err.to_string().starts_with("could not write input file"));
    }
}
