//! Turns an ingested [`Site`] into the files that get hosted.
//!
//! Rendering a page rewrites its relative links for the export layout
//! first, then fills its placeholders. Assets are passed through as-is.

pub mod archive;
pub mod export;
pub mod links;
pub mod preview;
pub mod substitute;

use anyhow::{Context, Result};
use sitepack_core::{HtmlFile, INDEX_FILE, Site};
use std::borrow::Cow;
use std::fs;
use std::path::Path;

pub use archive::{create_zip, write_zip};
pub use export::{ExportPlan, plan};
pub use preview::preview_urls;

/// Rendered site, keyed by export path
#[derive(Debug, Clone, Default)]
pub struct GeneratedSite {
    pub pages: Vec<(String, String)>,   // (path, html)
    pub assets: Vec<(String, Vec<u8>)>, // (path, data)
}

impl GeneratedSite {
    /// Every file as `(path, bytes)`, pages first
    pub fn files(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.pages
            .iter()
            .map(|(p, html)| (p.as_str(), html.as_bytes()))
            .chain(self.assets.iter().map(|(p, data)| (p.as_str(), data.as_slice())))
    }

    pub fn len(&self) -> usize {
        self.pages.len() + self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a file the way a static host would: an empty path or one
    /// ending in `/` means that directory's `index.html`.
    pub fn get(&self, path: &str) -> Option<Cow<'_, [u8]>> {
        let path = path.trim_start_matches('/');
        let path: Cow<'_, str> = if path.is_empty() || path.ends_with('/') {
            Cow::Owned(format!("{}{}", path, INDEX_FILE))
        } else {
            Cow::Borrowed(path)
        };

        self.files()
            .find(|(p, _)| *p == path.as_ref())
            .map(|(_, data)| Cow::Borrowed(data))
    }
}

/// Render every page and collect every asset under its export path
pub fn generate_site(site: &Site) -> Result<GeneratedSite> {
    let plan = plan(site)?;

    let mut pages = Vec::with_capacity(site.pages.len());
    for page in &site.pages {
        let html = render_page(page, &plan)
            .with_context(|| format!("Failed to render {}", page.path()))?;
        let path = final_path(&plan, page.path())?;
        pages.push((path, html));
    }

    let mut assets = Vec::with_capacity(site.assets.len());
    for asset in &site.assets {
        let path = final_path(&plan, &asset.path)?;
        assets.push((path, asset.content.clone()));
    }

    pages.sort_by(|a, b| a.0.cmp(&b.0));
    assets.sort_by(|a, b| a.0.cmp(&b.0));

    tracing::debug!(pages = pages.len(), assets = assets.len(), "generated site");

    Ok(GeneratedSite { pages, assets })
}

/// Rewrite links of one page for the export layout and fill its placeholders
pub fn render_page(page: &HtmlFile, plan: &ExportPlan) -> Result<String> {
    let exported_from = final_path(plan, page.path())?;
    let source = page.source();

    let rewritten = links::rewrite_links(&source, page.path(), &exported_from, |path| {
        plan.final_path(path).map(str::to_string)
    });

    substitute::substitute(page, &rewritten, plan)
}

/// Write a generated site into `dir`, creating directories as needed
pub fn write_to_dir(site: &GeneratedSite, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).context("Failed to create output directory")?;

    for (path, data) in site.files() {
        let dest = dir.join(path);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&dest, data).with_context(|| format!("Failed to write {}", dest.display()))?;
    }

    Ok(())
}

fn final_path(plan: &ExportPlan, source: &str) -> Result<String> {
    plan.final_path(source)
        .map(str::to_string)
        .with_context(|| format!("No export path planned for {}", source))
}
