use anyhow::{Context, Result};
use sitepack_generator::plan;
use std::path::PathBuf;

use super::project::Project;

/// Make `page` the home page; any previous home page loses the flag
pub async fn run(path: PathBuf, page: String) -> Result<()> {
    let mut project = Project::open(&path)?;

    let previous = project.site.main_page().map(|p| p.path().to_string());
    project
        .site
        .set_main(&page)
        .with_context(|| format!("No such page: {}", page))?;

    // Refuse a home page that breaks the export before touching the state file
    let plan = plan(&project.site)
        .with_context(|| format!("Cannot make {} the home page", page))?;
    project.save()?;

    println!("🏠 Home page: {}", page);
    if let Some(previous) = previous.filter(|p| *p != page) {
        println!("   (was {})", previous);
    }
    for (source, exported) in plan.renamed() {
        println!("   {} will be exported as {}", source, exported);
    }

    Ok(())
}
