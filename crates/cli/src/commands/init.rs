use anyhow::Result;
use sitepack_core::{INDEX_FILE, STATE_FILE};
use std::path::PathBuf;

use super::placeholders::summary;
use super::project::Project;

/// Start tracking a site folder.
///
/// Scans every file, reports pages, assets and placeholders, and writes
/// an initial `.sitepack.toml`. A root `index.html` is picked as the home
/// page when there is one.
pub async fn run(path: PathBuf) -> Result<()> {
    println!("📂 Scanning site folder: {}", path.display());

    // Never overwrite existing settings
    if Project::is_initialized(&path) {
        anyhow::bail!(
            "{} already exists in {}\nUse 'sitepack placeholders {}' to see the current settings",
            STATE_FILE,
            path.display(),
            path.display()
        );
    }

    let mut project = Project::open(&path)?;
    if project.site.pages.is_empty() {
        anyhow::bail!("No HTML pages found in {}", path.display());
    }

    // A root index.html is the natural home page
    if project.site.page(INDEX_FILE).is_some() {
        project.site.set_main(INDEX_FILE)?;
    }

    println!("   ✓ Pages: {}", project.site.pages.len());
    println!("   ✓ Assets: {}", project.site.assets.len());
    println!("   ✓ Placeholders: {}", project.site.placeholder_count());
    println!();

    for page in &project.site.pages {
        let marker = if page.is_main { " (home)" } else { "" };
        if page.placeholders.is_empty() {
            println!("   {}{}", page.path(), marker);
        } else {
            println!("   {}{}: {}", page.path(), marker, summary(page));
        }
    }

    project.save()?;

    println!();
    println!("✅ Created {}", path.join(STATE_FILE).display());
    if project.site.main_page().is_none() {
        println!("   💡 No index.html found, pick a home page with 'sitepack home {} <page>'", path.display());
    }
    println!("   Next: fill placeholders with 'sitepack set' or 'sitepack link'");

    Ok(())
}
