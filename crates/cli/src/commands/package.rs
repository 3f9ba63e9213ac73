use anyhow::{Context, Result};
use sitepack_generator::create_zip;
use std::path::PathBuf;

use super::build::{is_inside, render};
use super::project::Project;

/// Render the site and write it as a ZIP archive, by default
/// `<folder name>.zip` in the current directory
pub async fn run(path: PathBuf, output: Option<PathBuf>) -> Result<()> {
    println!("📦 Packaging site: {}", path.display());

    // Load the site and pick the archive name
    let project = Project::open(&path)?;
    let output = output.unwrap_or_else(|| PathBuf::from(format!("{}.zip", project.name())));
    if is_inside(&output, &path) {
        anyhow::bail!(
            "Archive {} would be written inside the site folder; choose a location outside it",
            output.display()
        );
    }

    // Render and zip
    let generated = render(&project)?;
    create_zip(&generated, &output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("   ✓ {} files", generated.len());
    println!();
    println!("✅ Wrote {}", output.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::TempDir;
    use zip::ZipArchive;

    #[tokio::test]
    async fn test_package_writes_archive() {
        let dir = TempDir::new().unwrap();
        let site = dir.path().join("my-site");
        fs::create_dir_all(&site).unwrap();
        fs::write(site.join("start.html"), "<h1>[[title]]</h1>").unwrap();
        fs::write(
            site.join(sitepack_core::STATE_FILE),
            "main = \"start.html\"\n\n[page.\"start.html\".values]\ntitle = \"Hi\"\n",
        )
        .unwrap();

        let out = dir.path().join("site.zip");
        run(site, Some(out.clone())).await.unwrap();

        let mut archive = ZipArchive::new(File::open(&out).unwrap()).unwrap();
        assert_eq!(archive.len(), 1);
        let mut entry = archive.by_name("index.html").unwrap();
        let mut html = String::new();
        std::io::Read::read_to_string(&mut entry, &mut html).unwrap();
        assert_eq!(html, "<h1>Hi</h1>");
    }

    #[tokio::test]
    async fn test_package_stops_on_validation_errors() {
        let dir = TempDir::new().unwrap();
        let site = dir.path().join("site");
        fs::create_dir_all(&site).unwrap();
        fs::write(site.join("a.html"), "a").unwrap();
        fs::write(site.join("b.html"), "b").unwrap();
        fs::write(
            site.join(sitepack_core::STATE_FILE),
            "[page.\"b.html\"]\ntarget = \"a.html\"\n",
        )
        .unwrap();

        let out = dir.path().join("site.zip");
        assert!(run(site, Some(out.clone())).await.is_err());
        assert!(!out.exists());
    }
}
