//! Interactive session.
//!
//! The session shows the main menu until the operator quits or input ends:
//!
//! ```text
//! orcaprep main menu
//!   1. Generate ORCA input file
//!   2. Write settings template
//!   3. Quit
//! ```
//!
//! Generating a file walks through calculation type, method, basis set,
//! notation family, descriptor, charge and spin. A failed request is
//! reported and the main menu comes back; only I/O errors on the session's
//! own streams end the session early.

use crate::calculation::{CalculationSpec, CalculationType};
use crate::descriptor::NotationFamily;
use crate::embedding::EmbeddingService;
use crate::menu::Prompter;
use crate::pipeline::{GenerationRequest, InputGenerator};
use crate::settings::{MenuSettings, SettingsManager, CONFIG_FILE_NAME};
use log::{error, info};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

const MAIN_MENU: [&str; 3] = ["Generate ORCA input file", "Write settings template", "Quit"];
const OTHER_CALCULATION: &str = "Other (enter a calculation tag)";
const AUTO_DETECT: &str = "Auto-detect";

/// What happened during a session.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    /// Paths of the input files written, in order
    pub generated: Vec<PathBuf>,
    /// Number of requests that were aborted
    pub failures: usize,
}

/// Interactive front end over an [`InputGenerator`].
pub struct Session<'a, S: EmbeddingService + ?Sized, R, W> {
    generator: InputGenerator<'a, S>,
    menu: MenuSettings,
    prompter: Prompter<R, W>,
}

impl<'a, S, R, W> Session<'a, S, R, W>
where
    S: EmbeddingService + ?Sized,
    R: BufRead,
    W: Write,
{
    /// Creates a session.
    pub fn new(generator: InputGenerator<'a, S>, menu: MenuSettings, prompter: Prompter<R, W>) -> Self {
        Self {
            generator,
            menu,
            prompter,
        }
    }

    /// Creates a session configured from loaded settings.
    pub fn from_settings(service: &'a S, settings: &SettingsManager, prompter: Prompter<R, W>) -> Self {
        Self::new(
            InputGenerator::from_settings(service, settings),
            settings.menu().clone(),
            prompter,
        )
    }

    /// The prompter, e.g. to inspect what was printed.
    pub fn prompter(&self) -> &Prompter<R, W> {
        &self.prompter
    }

    /// Runs the main menu loop.
    pub fn run(&mut self) -> io::Result<SessionSummary> {
        let mut summary = SessionSummary::default();

        loop {
            let choice = match self.prompter.select("orcaprep main menu", &MAIN_MENU)? {
                Some(choice) => choice,
                None => break,
            };

            match choice {
                0 => {
                    let request = match self.collect_request()? {
                        Some(request) => request,
                        None => break,
                    };
                    match self.generator.generate(&request) {
                        Ok(generated) => {
                            self.prompter.say(&format!(
                                "Input file written: {} ({} atoms)",
                                generated.path.display(),
                                generated.num_atoms
                            ))?;
                            summary.generated.push(generated.path);
                        }
                        Err(e) => {
                            self.prompter.say(&format!("Error: {}", e))?;
                            summary.failures += 1;
                        }
                    }
                }
                1 => {
                    if !self.write_template()? {
                        break;
                    }
                }
                _ => break,
            }
        }

        info!(
            "Session finished: {} file(s) written, {} request(s) failed",
            summary.generated.len(),
            summary.failures
        );
        Ok(summary)
    }

    /// Asks for everything a request needs. `None` when input ends midway.
    fn collect_request(&mut self) -> io::Result<Option<GenerationRequest>> {
        let calculation = match self.select_calculation()? {
            Some(calculation) => calculation,
            None => return Ok(None),
        };

        let method = match self.prompter.select("Select method:", &self.menu.methods)? {
            Some(i) => self.menu.methods[i].clone(),
            None => return Ok(None),
        };
        let basis = match self.prompter.select("Select basis set:", &self.menu.basis_sets)? {
            Some(i) => self.menu.basis_sets[i].clone(),
            None => return Ok(None),
        };

        let notations = [AUTO_DETECT, NotationFamily::Smiles.label(), NotationFamily::Inchi.label()];
        let family = match self.prompter.select("Select notation:", &notations)? {
            Some(0) => None,
            Some(i) => Some(NotationFamily::ALL[i - 1]),
            None => return Ok(None),
        };

        let label = family.map_or("molecule (SMILES or InChI)", |f| f.label());
        let descriptor = match self.prompter.prompt_nonempty(&format!("Enter {}:", label))? {
            Some(text) => text,
            None => return Ok(None),
        };

        let charge = match self.prompter.prompt_parsed("Charge", 0i32)? {
            Some(charge) => charge,
            None => return Ok(None),
        };
        let spin = match self.prompter.prompt_parsed("Spin quantum number S", 0u32)? {
            Some(spin) => spin,
            None => return Ok(None),
        };

        Ok(Some(GenerationRequest {
            descriptor,
            family,
            spec: CalculationSpec::new(&method, &basis, calculation, charge, spin),
        }))
    }

    fn select_calculation(&mut self) -> io::Result<Option<CalculationType>> {
        let known = CalculationType::all();
        let mut options: Vec<String> = known.iter().map(|c| c.label().to_string()).collect();
        options.push(OTHER_CALCULATION.to_string());

        match self.prompter.select("Select calculation:", &options)? {
            Some(i) if i < known.len() => Ok(Some(known[i].clone())),
            Some(_) => Ok(self
                .prompter
                .prompt_nonempty("Calculation tag:")?
                .map(|tag| CalculationType::from_tag(&tag))),
            None => Ok(None),
        }
    }

    /// Writes a settings template. Returns `false` when input ends.
    fn write_template(&mut self) -> io::Result<bool> {
        let target = match self
            .prompter
            .prompt_parsed("Template path", CONFIG_FILE_NAME.to_string())?
        {
            Some(target) => target,
            None => return Ok(false),
        };
        let path = Path::new(&target);

        if path.exists() {
            self.prompter
                .say(&format!("{} already exists, not overwriting it.", path.display()))?;
            return Ok(true);
        }

        match SettingsManager::create_template(path) {
            Ok(()) => self
                .prompter
                .say(&format!("Settings template written to {}", path.display()))?,
            Err(e) => {
                error!("Could not write settings template {}: {}", path.display(), e);
                self.prompter.say(&format!("Error: {}", e))?;
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::MolecularDescriptor;
    use crate::embedding::{EmbedOptions, Result as ResolveResult, StructureGraph};
    use std::io::Cursor;
    use tempfile::TempDir;

    struct Dihydrogen;

    impl EmbeddingService for Dihydrogen {
        fn parse(&self, descriptor: &MolecularDescriptor) -> ResolveResult<StructureGraph> {
            Ok(StructureGraph {
                descriptor: descriptor.clone(),
                canonical: "[H][H]".to_string(),
            })
        }

        fn embed_3d(&self, _: &StructureGraph, _: &EmbedOptions) -> ResolveResult<String> {
            Ok("2\n\nH 0.0 0.0 0.0\nH 0.0 0.0 0.74\n".to_string())
        }
    }

    type TestSession<'a> = Session<'a, Dihydrogen, Cursor<Vec<u8>>, Vec<u8>>;

    fn session<'a>(dir: &TempDir, input: &str) -> TestSession<'a> {
        let menu = MenuSettings {
            methods: vec!["HF".to_string(), "B3LYP".to_string()],
            basis_sets: vec!["STO-3G".to_string()],
        };
        Session::new(
            InputGenerator::new(&Dihydrogen, dir.path()),
            menu,
            Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new()),
        )
    }

    fn printed(session: &TestSession<'_>) -> String {
        String::from_utf8(session.prompter().output().clone()).unwrap()
    }

    #[test]
    fn test_generate_then_quit() {
        let dir = TempDir::new().unwrap();
        // generate, opt, B3LYP, STO-3G, SMILES, [H][H], charge 0, spin 0, quit
        let mut s = session(&dir, "1\n2\n2\n1\n2\n[H][H]\n\n\n3\n");
        let summary = s.run().unwrap();

        assert_eq!(summary.generated.len(), 1);
        assert_eq!(summary.failures, 0);
        let name = summary.generated[0].file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("B3LYP_STO-3G_HH_Geometry_Optimization_"));

        let content = std::fs::read_to_string(&summary.generated[0]).unwrap();
        assert!(content.contains("! B3LYP STO-3G\n! OPT\n"));
        assert!(content.contains("* xyz 0 1\n"));
        assert!(printed(&s).contains("Input file written:"));
    }

    #[test]
    fn test_failure_returns_to_main_menu() {
        let dir = TempDir::new().unwrap();
        // InChI family with a SMILES string, then end of input
        let mut s = session(&dir, "1\n1\n1\n1\n3\nCCO\n0\n0\n");
        let summary = s.run().unwrap();

        assert!(summary.generated.is_empty());
        assert_eq!(summary.failures, 1);
        let out = printed(&s);
        assert!(out.contains("Error: descriptor validation failed (InChI)"));
        assert_eq!(out.matches("orcaprep main menu").count(), 2);
    }

    #[test]
    fn test_custom_calculation_tag() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir, "1\n7\nmd\n1\n1\n1\n[H][H]\n1\n1\n");
        let summary = s.run().unwrap();

        let content = std::fs::read_to_string(&summary.generated[0]).unwrap();
        assert!(content.contains("! HF STO-3G\n\n\n* xyz 1 3\n"));
    }

    #[test]
    fn test_largest_spin_does_not_end_session() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir, "1\n1\n1\n1\n1\n[H][H]\n0\n4294967295\n3\n");
        let summary = s.run().unwrap();

        assert_eq!(summary.generated.len(), 1);
        let content = std::fs::read_to_string(&summary.generated[0]).unwrap();
        assert!(content.contains("* xyz 0 8589934591\n"));
        assert_eq!(printed(&s).matches("orcaprep main menu").count(), 2);
    }

    #[test]
    fn test_template_written_once() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("custom.cfg");
        let input = format!("2\n{0}\n2\n{0}\n3\n", target.display());
        let mut s = session(&dir, &input);
        s.run().unwrap();

        assert!(target.exists());
        let out = printed(&s);
        assert!(out.contains("Settings template written to"));
        assert!(out.contains("already exists, not overwriting it."));
    }

    #[test]
    fn test_end_of_input_ends_session() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir, "");
        assert_eq!(s.run().unwrap(), SessionSummary::default());
    }
}
