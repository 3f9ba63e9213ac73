use anyhow::{Context, Result};
use sitepack_assistant::{Assistant, FilenameSuggestion, suggest_local};
use sitepack_generator::plan;
use std::path::PathBuf;

use super::ai;
use super::project::Project;

/// Set the export filename of `page`.
///
/// Without an explicit name one is suggested, from the page itself or from
/// the assistant with `use_ai`.
pub async fn run(
    path: PathBuf,
    page: String,
    new_name: Option<String>,
    use_ai: bool,
) -> Result<()> {
    let mut project = Project::open(&path)?;

    let html = project
        .site
        .page(&page)
        .with_context(|| format!("No such page: {}", page))?
        .source()
        .into_owned();

    // Pick the name: given, from the assistant, or from the page itself
    let suggestion = match new_name {
        Some(name) => FilenameSuggestion {
            filename: name,
            reason: None,
        },
        None if use_ai => {
            println!("🤖 Asking the assistant for a name...");
            let client = ai::client()?;
            client.suggest_filename(&page, &html).await?
        }
        None => suggest_local(&page, &html),
    };

    apply(&mut project, &page, &suggestion.filename)?;
    project.save()?;

    println!("✓ {} will be exported as {}", page, suggestion.filename);
    if let Some(reason) = &suggestion.reason {
        println!("   {}", reason);
    }

    Ok(())
}

/// Rename a page, refusing names that clash with another export path
pub fn apply(project: &mut Project, page: &str, filename: &str) -> Result<()> {
    let html = project
        .site
        .page_mut(page)
        .with_context(|| format!("No such page: {}", page))?;
    let previous = html.target_name.clone();
    html.rename(filename)?;

    if let Err(e) = plan(&project.site) {
        if let Some(html) = project.site.page_mut(page) {
            html.target_name = previous;
        }
        return Err(e);
    }
    Ok(())
}
