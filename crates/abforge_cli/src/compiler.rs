//! Built-in bundle compiler: packs source files into a flat container.
//!
//! Layout, integers little-endian:
//!
//! ```text
//! magic        4 bytes, b"ABF1"
//! compression  1 byte (0 none, 1 lz4, 2 lzma), recorded for the loader
//! count        u32, number of entries; the primary asset comes first
//! entries      u16 name length, project-relative name, u64 data length, data
//! ```

use std::path::{Path, PathBuf};

use abforge_build::{BundleCompiler, CompileError, CompileJob, CompiledBundle};
use abforge_common::ContentHash;
use abforge_config::Compression;

/// Magic bytes at the start of every container.
pub const CONTAINER_MAGIC: [u8; 4] = *b"ABF1";

/// Compiles bundles by concatenating their files into a container.
///
/// Output is a pure function of the input files, so an unchanged bundle
/// reproduces the previous fingerprint.
pub struct ContainerCompiler {
    project_dir: PathBuf,
}

impl ContainerCompiler {
    /// Creates a compiler for files under `project_dir`.
    pub fn new(project_dir: &Path) -> Self {
        Self {
            project_dir: project_dir.to_path_buf(),
        }
    }

    fn entry_name(&self, file: &Path) -> String {
        let relative = file.strip_prefix(&self.project_dir).unwrap_or(file);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

fn compression_byte(compression: Compression) -> u8 {
    match compression {
        Compression::None => 0,
        Compression::Lz4 => 1,
        Compression::Lzma => 2,
    }
}

impl BundleCompiler for ContainerCompiler {
    fn compile(&self, job: &CompileJob) -> Result<CompiledBundle, CompileError> {
        let files: Vec<&PathBuf> = std::iter::once(&job.source).chain(&job.embedded).collect();

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&CONTAINER_MAGIC);
        bytes.push(compression_byte(job.compression));
        let count = u32::try_from(files.len()).map_err(|_| CompileError::Failed {
            reason: format!("too many assets in {}", job.bundle_name),
        })?;
        bytes.extend_from_slice(&count.to_le_bytes());

        for file in files {
            let data = std::fs::read(file).map_err(|source| CompileError::Io {
                path: file.clone(),
                source,
            })?;
            let name = self.entry_name(file);
            let name_len = u16::try_from(name.len()).map_err(|_| CompileError::Failed {
                reason: format!("asset path too long: {name}"),
            })?;
            bytes.extend_from_slice(&name_len.to_le_bytes());
            bytes.extend_from_slice(name.as_bytes());
            bytes.extend_from_slice(&(data.len() as u64).to_le_bytes());
            bytes.extend_from_slice(&data);
        }

        let fingerprint = ContentHash::from_bytes(&bytes).to_string();
        Ok(CompiledBundle { bytes, fingerprint })
    }
}
