use anyhow::{Context, Result};
use sitepack_core::HtmlFile;
use std::path::PathBuf;

use super::project::Project;

/// Print every page with its placeholders and what fills them
pub async fn list(path: PathBuf) -> Result<()> {
    let project = Project::open(&path)?;

    for page in &project.site.pages {
        let mut header = page.path().to_string();
        if page.is_main {
            header.push_str(" (home)");
        }
        if page.target_name != page.file.name {
            header.push_str(&format!(" -> {}", page.target_path()));
        }
        println!("{}", header);

        if page.placeholders.is_empty() {
            println!("   (no placeholders)");
            continue;
        }
        for line in describe(page) {
            println!("   {}", line);
        }
    }

    Ok(())
}

/// One line per placeholder of `page`, marking the ones that sit in a link
pub fn describe(page: &HtmlFile) -> Vec<String> {
    let link_names = page.link_placeholders();

    page.placeholders
        .iter()
        .map(|name| {
            let is_link = link_names.contains(name);
            match (page.links.get(name), page.values.get(name)) {
                (Some(target), _) => format!("{} -> {}", name, target),
                (None, Some(value)) if is_link => format!("{} (link) = {:?}", name, value),
                (None, Some(value)) => format!("{} = {:?}", name, value),
                (None, None) if is_link => format!("{} (link, unfilled)", name),
                (None, None) => format!("{} (unfilled)", name),
            }
        })
        .collect()
}

/// Placeholder names of `page`, link placeholders tagged with `(link)`
pub fn summary(page: &HtmlFile) -> String {
    let link_names = page.link_placeholders();

    page.placeholders
        .iter()
        .map(|name| {
            if link_names.contains(name) {
                format!("{} (link)", name)
            } else {
                name.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Fill `name` on `page` with text, replacing any link
pub async fn set(path: PathBuf, page: String, name: String, value: String) -> Result<()> {
    let mut project = Project::open(&path)?;

    let html = project
        .site
        .require_page_mut(&page)
        .with_context(|| format!("No such page: {}", page))?;
    html.clear(&name)?;
    html.set_value(&name, value.as_str())?;
    project.save()?;

    println!("✓ {}: {} = {:?}", page, name, value);
    Ok(())
}

/// Fill `name` on `page` with a link to `target`, replacing any text value
pub async fn link(path: PathBuf, page: String, name: String, target: String) -> Result<()> {
    let mut project = Project::open(&path)?;

    if !project.site.contains(&target) {
        anyhow::bail!("No such file in the site: {}", target);
    }
    project
        .site
        .require_page_mut(&page)
        .with_context(|| format!("No such page: {}", page))?
        .clear(&name)?;
    project.site.set_link(&page, &name, &target)?;
    project.save()?;

    println!("✓ {}: {} -> {}", page, name, target);
    Ok(())
}

pub async fn unset(path: PathBuf, page: String, name: String) -> Result<()> {
    let mut project = Project::open(&path)?;

    project
        .site
        .require_page_mut(&page)
        .with_context(|| format!("No such page: {}", page))?
        .clear(&name)?;
    project.save()?;

    println!("✓ {}: {} cleared", page, name);
    Ok(())
}
