use crate::GeneratedSite;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Write the site as a ZIP archive, one deflated entry per file
pub fn write_zip<W: Write + Seek>(site: &GeneratedSite, writer: W) -> Result<W> {
    let mut zip = ZipWriter::new(writer);

    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .unix_permissions(0o644);

    for (path, data) in site.files() {
        zip.start_file(path, options)
            .with_context(|| format!("Failed to add {} to archive", path))?;
        zip.write_all(data)?;
    }

    let writer = zip.finish().context("Failed to finish archive")?;
    Ok(writer)
}

/// Create a ZIP file at `path`
pub fn create_zip(site: &GeneratedSite, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create archive {}", path.display()))?;
    write_zip(site, file)?;
    tracing::debug!(entries = site.len(), "wrote {}", path.display());
    Ok(())
}
