//! # Export Bundle
//!
//! Packs the current artifact set into a single gzipped tarball named after
//! the project.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Component, Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;

use super::project_state::Project;
use crate::error::ForgeError;

/// `<slug>-production-package.tar.gz`
pub fn bundle_file_name(project: &Project) -> String {
    let slug = project.slug();
    let stem = if slug.is_empty() { "project" } else { slug.as_str() };
    format!("{}-production-package.tar.gz", stem)
}

fn check_entry_path(path: &str) -> Result<(), ForgeError> {
    let parsed = Path::new(path);
    let safe = !path.trim().is_empty()
        && parsed
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if safe {
        Ok(())
    } else {
        Err(ForgeError::Export(format!("unsafe artifact path '{}'", path)))
    }
}

/// Write every artifact of the project as a tar.gz stream
pub fn write_bundle<W: Write>(project: &Project, writer: W) -> Result<W, ForgeError> {
    if project.code_files.is_empty() {
        return Err(ForgeError::Export("project has no artifacts".to_string()));
    }
    for file in &project.code_files {
        check_entry_path(&file.path)?;
    }

    let mtime = project.created_at.timestamp().max(0) as u64;
    let encoder = GzEncoder::new(writer, Compression::default());
    let mut archive = tar::Builder::new(encoder);

    for file in &project.code_files {
        let bytes = file.content.as_bytes();
        let mut header = tar::Header::new_gnu();
        header.set_size(bytes.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(mtime);
        archive.append_data(&mut header, &file.path, bytes)?;
    }

    let encoder = archive.into_inner()?;
    Ok(encoder.finish()?)
}

/// Write the bundle into `dir`, returning the file path
pub fn export_bundle(project: &Project, dir: &Path) -> Result<PathBuf, ForgeError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(bundle_file_name(project));
    let file = File::create(&path)?;
    let mut writer = write_bundle(project, BufWriter::new(file))?;
    writer.flush()?;

    tracing::info!(
        path = %path.display(),
        files = project.code_files.len(),
        "Exported production bundle"
    );
    Ok(path)
}
