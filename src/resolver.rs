//! Descriptor to 3D structure resolution.
//!
//! The [`Resolver`] runs a validated descriptor through an
//! [`EmbeddingService`]: parse, embed with explicit hydrogens, then strip the
//! XYZ header and read the coordinate rows. The result is either a complete,
//! non-empty [`AtomicStructure`] or a [`ResolveError`] naming the failed
//! stage.

use crate::descriptor::MolecularDescriptor;
use crate::embedding::{EmbedOptions, EmbedSpeed, EmbeddingService, ResolveError, Result};
use crate::structure::AtomicStructure;
use log::{debug, info};

/// Resolves descriptors to atomic structures through an embedding service.
pub struct Resolver<'a, S: EmbeddingService + ?Sized> {
    service: &'a S,
    speed: EmbedSpeed,
}

impl<'a, S: EmbeddingService + ?Sized> Resolver<'a, S> {
    /// Creates a resolver backed by `service`.
    pub fn new(service: &'a S, speed: EmbedSpeed) -> Self {
        Self { service, speed }
    }

    /// Resolves `descriptor` into a hydrogen-saturated 3D structure.
    ///
    /// # Errors
    ///
    /// - `ResolveError::Parse` if the service cannot build a structure graph
    /// - `ResolveError::Embed` if no geometry can be constructed, or the
    ///   service output does not hold a usable coordinate block
    /// - `ResolveError::Unavailable` if the service cannot be started
    pub fn resolve(&self, descriptor: &MolecularDescriptor) -> Result<AtomicStructure> {
        let graph = self.service.parse(descriptor)?;
        debug!("Parsed {} as {}", descriptor, graph.canonical);

        let options = EmbedOptions {
            add_hydrogens: true,
            speed: self.speed,
        };
        let dump = self.service.embed_3d(&graph, &options)?;

        let structure = AtomicStructure::from_xyz(&dump).map_err(|e| {
            ResolveError::Embed(format!("unusable coordinates for {}: {}", graph.canonical, e))
        })?;

        if structure.is_collapsed() {
            return Err(ResolveError::Embed(format!(
                "all {} atoms of {} were placed at the origin",
                structure.num_atoms(),
                graph.canonical
            )));
        }

        info!(
            "Resolved {} to {} atoms ({} hydrogens)",
            descriptor,
            structure.num_atoms(),
            structure.count_element("H")
        );
        Ok(structure)
    }
}
