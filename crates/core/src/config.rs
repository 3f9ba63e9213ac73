use crate::error::{Error, Result};
use crate::types::{Site, validate_target_name};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path};

/// Name of the per-site state file, kept in the site folder itself.
/// Hidden, so ingestion never picks it up as part of the site.
pub const STATE_FILE: &str = ".sitepack.toml";

/// Everything the user configured for a site, as stored on disk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectState {
    /// Source path of the home page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
    /// Per-page settings keyed by source path
    #[serde(default, rename = "page", skip_serializing_if = "BTreeMap::is_empty")]
    pub pages: BTreeMap<String, PageState>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub values: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub links: BTreeMap<String, String>,
}

impl PageState {
    fn is_empty(&self) -> bool {
        self.target.is_none() && self.values.is_empty() && self.links.is_empty()
    }
}

/// Load `.sitepack.toml` from a site folder.
///
/// A missing file is not an error: a freshly uploaded site simply has no
/// state yet.
pub fn load_state<P: AsRef<Path>>(site_dir: P) -> Result<ProjectState> {
    let path = site_dir.as_ref().join(STATE_FILE);
    if !path.exists() {
        return Ok(ProjectState::default());
    }
    let content = fs::read_to_string(path)?;
    parse_state_str(&content)
}

/// Parse state from a string (useful for testing)
pub fn parse_state_str(content: &str) -> Result<ProjectState> {
    let state: ProjectState = toml::from_str(content)?;

    if let Some(main) = &state.main {
        validate_path(main, "main")?;
    }

    for (page, settings) in &state.pages {
        validate_path(page, "page")?;
        if let Some(target) = &settings.target {
            validate_target_name(target)
                .map_err(|e| Error::ConfigParse(format!("page '{}': {}", page, e)))?;
        }
        for (name, target) in &settings.links {
            validate_path(target, &format!("page '{}' links.{}", page, name))?;
        }
    }

    Ok(state)
}

/// Write state back to the site folder, stamping the update time
pub fn save_state<P: AsRef<Path>>(site_dir: P, state: &ProjectState) -> Result<()> {
    let mut state = state.clone();
    state.updated = Some(Utc::now());
    let content = toml::to_string_pretty(&state)?;
    fs::write(site_dir.as_ref().join(STATE_FILE), content)?;
    Ok(())
}

/// Copy stored settings onto a freshly ingested site.
///
/// Settings for pages or placeholders that no longer exist in the folder
/// are dropped with a warning instead of failing, since the user may have
/// edited the files since the state was saved.
pub fn apply_state(site: &mut Site, state: &ProjectState) -> Result<()> {
    site.clear_main();
    if let Some(main) = &state.main {
        if site.page(main).is_some() {
            site.set_main(main)?;
        } else {
            tracing::warn!(page = main.as_str(), "home page no longer exists, ignoring");
        }
    }

    for (path, settings) in &state.pages {
        let Some(page) = site.page_mut(path) else {
            tracing::warn!(page = path.as_str(), "dropping settings for missing page");
            continue;
        };

        if let Some(target) = &settings.target {
            page.rename(target)?;
        }

        for (name, value) in &settings.values {
            if page.has_placeholder(name) {
                page.values.insert(name.clone(), value.clone());
            } else {
                tracing::warn!(page = path.as_str(), placeholder = name.as_str(), "dropping value for missing placeholder");
            }
        }

        for (name, target) in &settings.links {
            if page.has_placeholder(name) {
                page.links.insert(name.clone(), target.clone());
            } else {
                tracing::warn!(page = path.as_str(), placeholder = name.as_str(), "dropping link for missing placeholder");
            }
        }
    }

    Ok(())
}

/// Capture the current settings of a site for saving
pub fn state_from_site(site: &Site) -> ProjectState {
    let pages = site
        .pages
        .iter()
        .map(|page| {
            let target = (page.target_name != page.file.name).then(|| page.target_name.clone());
            let settings = PageState {
                target,
                values: page.values.clone(),
                links: page.links.clone(),
            };
            (page.path().to_string(), settings)
        })
        .filter(|(_, settings)| !settings.is_empty())
        .collect();

    ProjectState {
        main: site.main_page().map(|p| p.path().to_string()),
        updated: None,
        pages,
    }
}

/// Validate a site-relative path read from the state file.
///
/// Rejects absolute paths and parent directory references (`..`) so a
/// hand-edited state file cannot point outside the site folder.
fn validate_path(path_str: &str, field_name: &str) -> Result<()> {
    let path = Path::new(path_str);

    if path.is_absolute() || path_str.starts_with('/') {
        return Err(Error::ConfigParse(format!(
            "Absolute paths not allowed in '{}': '{}'. Use site-relative paths only.",
            field_name, path_str
        )));
    }

    if path.components().any(|c| c == Component::ParentDir) {
        return Err(Error::ConfigParse(format!(
            "Parent directory references (..) not allowed in '{}': '{}'",
            field_name, path_str
        )));
    }

    if path_str.trim().is_empty() {
        return Err(Error::ConfigParse(format!(
            "Empty path in '{}' field",
            field_name
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HtmlFile, SiteFile};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn site() -> Site {
        Site {
            root: PathBuf::from("."),
            pages: vec![
                HtmlFile::new(SiteFile::new(
                    "index.html",
                    b"<a href=\"[[next]]\">[[label]]</a>".to_vec(),
                )),
                HtmlFile::new(SiteFile::new("blog/post.html", b"<p>post</p>".to_vec())),
            ],
            assets: vec![],
        }
    }

    #[test]
    fn test_validate_path_valid_relative() {
        assert!(validate_path("index.html", "main").is_ok());
        assert!(validate_path("blog/post.html", "main").is_ok());
    }

    #[test]
    fn test_validate_path_rejects_absolute() {
        let result = validate_path("/etc/passwd", "main");
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Absolute paths not allowed")
        );
    }

    #[test]
    fn test_validate_path_rejects_parent_dir() {
        let result = validate_path("../secret.html", "page");
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Parent directory references")
        );

        assert!(validate_path("blog/../../x.html", "page").is_err());
    }

    #[test]
    fn test_validate_path_rejects_empty() {
        let result = validate_path("  ", "main");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Empty path"));
    }

    #[test]
    fn test_parse_state() {
        let toml = r##"
main = "index.html"

[page."index.html"]
target = "home.html"

[page."index.html".values]
label = "Read more"

[page."index.html".links]
next = "blog/post.html"
        "##;

        let state = parse_state_str(toml).unwrap();
        assert_eq!(state.main.as_deref(), Some("index.html"));
        let page = &state.pages["index.html"];
        assert_eq!(page.target.as_deref(), Some("home.html"));
        assert_eq!(page.values["label"], "Read more");
        assert_eq!(page.links["next"], "blog/post.html");
    }

    #[test]
    fn test_parse_state_rejects_link_traversal() {
        let toml = r##"
[page."index.html".links]
next = "../../etc/passwd"
        "##;

        let result = parse_state_str(toml);
        assert!(result.is_err());
        let message = result.unwrap_err().to_string();
        assert!(message.contains("Parent directory references"));
        assert!(message.contains("links.next"));
    }

    #[test]
    fn test_parse_state_rejects_bad_target() {
        let toml = r##"
[page."index.html"]
target = "sub/dir.html"
        "##;

        assert!(parse_state_str(toml).is_err());
    }

    #[test]
    fn test_load_state_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        assert_eq!(load_state(dir.path()).unwrap(), ProjectState::default());
    }

    #[test]
    fn test_save_then_load_preserves_settings() {
        let dir = TempDir::new().unwrap();
        let mut site = site();
        site.set_main("blog/post.html").unwrap();
        site.page_mut("index.html")
            .unwrap()
            .set_value("label", "Next")
            .unwrap();
        site.set_link("index.html", "next", "blog/post.html").unwrap();
        site.page_mut("blog/post.html")
            .unwrap()
            .rename("first.html")
            .unwrap();

        save_state(dir.path(), &state_from_site(&site)).unwrap();
        let state = load_state(dir.path()).unwrap();
        assert!(state.updated.is_some());

        let mut fresh = self::site();
        apply_state(&mut fresh, &state).unwrap();
        assert_eq!(fresh.main_page().unwrap().path(), "blog/post.html");
        let index = fresh.page("index.html").unwrap();
        assert_eq!(index.values["label"], "Next");
        assert_eq!(index.links["next"], "blog/post.html");
        assert_eq!(fresh.page("blog/post.html").unwrap().target_name, "first.html");
    }

    #[test]
    fn test_state_from_site_omits_untouched_pages() {
        let site = site();
        let state = state_from_site(&site);
        assert!(state.main.is_none());
        assert!(state.pages.is_empty());
    }

    #[test]
    fn test_apply_state_drops_stale_entries() {
        let toml = r##"
main = "gone.html"

[page."gone.html".values]
x = "1"

[page."index.html".values]
label = "kept"
removed = "dropped"
        "##;

        let state = parse_state_str(toml).unwrap();
        let mut site = site();
        apply_state(&mut site, &state).unwrap();

        assert!(site.main_page().is_none());
        let index = site.page("index.html").unwrap();
        assert_eq!(index.values.len(), 1);
        assert_eq!(index.values["label"], "kept");
    }
}
