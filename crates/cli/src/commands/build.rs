use anyhow::{Context, Result};
use sitepack_generator::{GeneratedSite, generate_site, write_to_dir};
use sitepack_validator::validate_site;
use std::path::{Path, PathBuf};

use super::project::Project;
use super::validate::print_report;

/// Validate and render a project, stopping on validation errors
pub fn render(project: &Project) -> Result<GeneratedSite> {
    let report = validate_site(&project.site);
    if !report.is_ok() {
        print_report(&report);
        anyhow::bail!(
            "Cannot export {}: {} validation error(s)",
            project.dir.display(),
            report.errors.len()
        );
    }
    for warning in &report.warnings {
        println!("   ⚠ {}", warning);
    }

    generate_site(&project.site).context("Failed to render site")
}

/// Write the finished site into `output`
///
/// # Arguments
///
/// * `path` - Site folder, with or without a `.sitepack.toml`
/// * `output` - Directory to write to, outside the site folder
///
/// # Errors
///
/// Fails when the site does not validate or a file cannot be written.
pub async fn run(path: PathBuf, output: PathBuf) -> Result<()> {
    println!("🔨 Building site...");
    println!("   Source: {}", path.display());
    println!("   Output: {}", output.display());
    println!();

    // Load the site and its saved settings
    let project = Project::open(&path)?;

    // Keep the output out of the folder it is built from
    if is_inside(&output, &path) {
        anyhow::bail!(
            "Output directory {} is inside the site folder; choose a location outside it",
            output.display()
        );
    }

    // Validate, then render every page
    let generated = render(&project)?;

    // Write pages and assets
    write_to_dir(&generated, &output)?;

    println!("   ✓ {} pages, {} assets", generated.pages.len(), generated.assets.len());
    if let Some(main) = project.site.main_page() {
        println!("   ✓ Home page {} written as index.html", main.path());
    }
    println!();
    println!("✅ Build complete!");
    println!("   Output: {}", output.display());

    Ok(())
}

/// Whether `path` is `dir` or lies below it. Paths that do not exist yet
/// are compared through their nearest existing ancestor.
pub fn is_inside(path: &Path, dir: &Path) -> bool {
    let Ok(dir) = dir.canonicalize() else {
        return false;
    };

    let mut existing = path;
    let mut rest = Vec::new();
    loop {
        if let Ok(resolved) = existing.canonicalize() {
            let full = rest.iter().rev().fold(resolved, |acc, part| acc.join(part));
            return full.starts_with(&dir);
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                rest.push(name.to_os_string());
                existing = if parent.as_os_str().is_empty() {
                    Path::new(".")
                } else {
                    parent
                };
            }
            _ => return false,
        }
    }
}
