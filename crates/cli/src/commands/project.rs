use anyhow::{Context, Result};
use sitepack_core::{STATE_FILE, Site, apply_state, load_site, load_state, save_state, state_from_site};
use std::path::{Path, PathBuf};

/// A site folder together with its saved settings
pub struct Project {
    pub dir: PathBuf,
    pub site: Site,
}

impl Project {
    /// Ingest the folder and apply `.sitepack.toml` on top of it
    pub fn open(dir: &Path) -> Result<Self> {
        let mut site = load_site(dir)
            .with_context(|| format!("Failed to load site from {}", dir.display()))?;
        let state = load_state(dir).with_context(|| format!("Failed to parse {}", STATE_FILE))?;
        apply_state(&mut site, &state).with_context(|| format!("Invalid settings in {}", STATE_FILE))?;

        tracing::debug!(
            pages = site.pages.len(),
            assets = site.assets.len(),
            "opened project"
        );

        Ok(Self {
            dir: dir.to_path_buf(),
            site,
        })
    }

    pub fn is_initialized(dir: &Path) -> bool {
        dir.join(STATE_FILE).exists()
    }

    pub fn save(&self) -> Result<()> {
        save_state(&self.dir, &state_from_site(&self.site))
            .with_context(|| format!("Failed to write {}", STATE_FILE))
    }

    /// `(path, source html)` of every page, or just `only` when given
    pub fn page_sources(&self, only: Option<&str>) -> Result<Vec<(String, String)>> {
        if let Some(path) = only
            && self.site.page(path).is_none()
        {
            anyhow::bail!("No such page: {}", path);
        }

        Ok(self
            .site
            .pages
            .iter()
            .filter(|p| only.is_none_or(|o| o == p.path()))
            .map(|p| (p.path().to_string(), p.source().into_owned()))
            .collect())
    }

    /// Folder name, used to name the archive
    pub fn name(&self) -> String {
        self.dir
            .canonicalize()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "site".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.html"), "<h1>[[title]]</h1>").unwrap();
        fs::write(dir.path().join("about.html"), "<a href=\"[[home]]\">home</a>").unwrap();
        fs::write(dir.path().join("style.css"), "body{}").unwrap();
        dir
    }

    #[test]
    fn test_open_save_round_trip() {
        let dir = fixture();
        assert!(!Project::is_initialized(dir.path()));

        let mut project = Project::open(dir.path()).unwrap();
        project.site.set_main("about.html").unwrap();
        project
            .site
            .page_mut("index.html")
            .unwrap()
            .set_value("title", "Hello")
            .unwrap();
        project.site.set_link("about.html", "home", "index.html").unwrap();
        project.save().unwrap();
        assert!(Project::is_initialized(dir.path()));

        let reopened = Project::open(dir.path()).unwrap();
        assert_eq!(reopened.site.main_page().unwrap().path(), "about.html");
        assert_eq!(
            reopened.site.page("index.html").unwrap().values.get("title").map(String::as_str),
            Some("Hello")
        );
        assert_eq!(
            reopened.site.page("about.html").unwrap().links.get("home").map(String::as_str),
            Some("index.html")
        );
        // The state file itself is never part of the site
        assert!(!reopened.site.contains(STATE_FILE));
    }

    #[test]
    fn test_page_sources_filter() {
        let dir = fixture();
        let project = Project::open(dir.path()).unwrap();

        assert_eq!(project.page_sources(None).unwrap().len(), 2);
        let one = project.page_sources(Some("about.html")).unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].0, "about.html");
        assert!(project.page_sources(Some("nope.html")).is_err());
    }

    #[test]
    fn test_open_missing_folder() {
        let dir = TempDir::new().unwrap();
        assert!(Project::open(&dir.path().join("missing")).is_err());
    }
}
