use crate::error::{Error, Result};
use crate::placeholder;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// File name every host serves for a directory request
pub const INDEX_FILE: &str = "index.html";

const HTML_EXTENSIONS: &[&str] = &["html", "htm"];

/// A single file of the uploaded site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteFile {
    /// Path relative to the site root, always `/`-separated
    pub path: String,
    /// Last path segment
    pub name: String,
    pub content: Vec<u8>,
    pub mime: String,
}

impl SiteFile {
    pub fn new(path: impl Into<String>, content: Vec<u8>) -> Self {
        let path = path.into();
        let name = file_name(&path).to_string();
        let mime = mime_guess::from_path(&path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Self {
            path,
            name,
            content,
            mime,
        }
    }

    /// Directory part of the path, empty for files in the site root
    pub fn dir(&self) -> &str {
        parent_dir(&self.path)
    }

    pub fn is_html(&self) -> bool {
        is_html_path(&self.path)
    }

    /// Content decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }
}

/// An HTML page with everything the user configured for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlFile {
    pub file: SiteFile,
    pub is_main: bool,
    /// File name the page gets in the export
    pub target_name: String,
    /// Placeholder names in order of first appearance
    pub placeholders: Vec<String>,
    pub values: BTreeMap<String, String>,
    /// Placeholder name -> site path of the linked file
    pub links: BTreeMap<String, String>,
}

impl HtmlFile {
    pub fn new(file: SiteFile) -> Self {
        let placeholders = placeholder::scan(&file.text());
        let target_name = file.name.clone();

        Self {
            file,
            is_main: false,
            target_name,
            placeholders,
            values: BTreeMap::new(),
            links: BTreeMap::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.file.path
    }

    pub fn source(&self) -> Cow<'_, str> {
        self.file.text()
    }

    /// Source directory joined with the target name
    pub fn target_path(&self) -> String {
        join_path(self.file.dir(), &self.target_name)
    }

    pub fn has_placeholder(&self, name: &str) -> bool {
        self.placeholders.iter().any(|p| p == name)
    }

    /// Placeholders that sit in an `href`/`src` value at least once,
    /// the ones meant to be filled with a link to another file
    pub fn link_placeholders(&self) -> Vec<String> {
        placeholder::link_placeholders(&self.source())
    }

    /// Placeholders with neither a value nor a link
    pub fn unfilled(&self) -> Vec<&str> {
        self.placeholders
            .iter()
            .filter(|name| !self.values.contains_key(*name) && !self.links.contains_key(*name))
            .map(String::as_str)
            .collect()
    }

    pub fn set_value(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        self.require_placeholder(name)?;
        self.values.insert(name.to_string(), value.into());
        Ok(())
    }

    /// Clear any value and link for `name`
    pub fn clear(&mut self, name: &str) -> Result<()> {
        self.require_placeholder(name)?;
        self.values.remove(name);
        self.links.remove(name);
        Ok(())
    }

    pub fn rename(&mut self, target_name: &str) -> Result<()> {
        validate_target_name(target_name)?;
        self.target_name = target_name.to_string();
        Ok(())
    }

    fn require_placeholder(&self, name: &str) -> Result<()> {
        if !self.has_placeholder(name) {
            return Err(Error::InvalidData(format!(
                "'{}' has no placeholder named '{}'",
                self.path(),
                name
            )));
        }
        Ok(())
    }
}

/// The whole uploaded folder
#[derive(Debug, Clone, Default)]
pub struct Site {
    pub root: PathBuf,
    pub pages: Vec<HtmlFile>,
    /// Everything that is not HTML (CSS, JS, images, ...)
    pub assets: Vec<SiteFile>,
}

impl Site {
    pub fn page(&self, path: &str) -> Option<&HtmlFile> {
        self.pages.iter().find(|p| p.path() == path)
    }

    pub fn page_mut(&mut self, path: &str) -> Option<&mut HtmlFile> {
        self.pages.iter_mut().find(|p| p.path() == path)
    }

    pub fn require_page_mut(&mut self, path: &str) -> Result<&mut HtmlFile> {
        self.page_mut(path)
            .ok_or_else(|| Error::UnknownFile(path.to_string()))
    }

    /// Whether `path` names any file of the site, page or asset
    pub fn contains(&self, path: &str) -> bool {
        self.page(path).is_some() || self.assets.iter().any(|a| a.path == path)
    }

    pub fn main_page(&self) -> Option<&HtmlFile> {
        self.pages.iter().find(|p| p.is_main)
    }

    /// Flag `path` as the home page, clearing the flag everywhere else
    pub fn set_main(&mut self, path: &str) -> Result<()> {
        if self.page(path).is_none() {
            return Err(Error::UnknownFile(path.to_string()));
        }
        for page in &mut self.pages {
            page.is_main = page.path() == path;
        }
        Ok(())
    }

    pub fn clear_main(&mut self) {
        for page in &mut self.pages {
            page.is_main = false;
        }
    }

    /// Map a placeholder of `page` to another file of the site
    pub fn set_link(&mut self, page: &str, name: &str, target: &str) -> Result<()> {
        if !self.contains(target) {
            return Err(Error::UnknownFile(target.to_string()));
        }
        let page = self.require_page_mut(page)?;
        page.require_placeholder(name)?;
        page.links.insert(name.to_string(), target.to_string());
        Ok(())
    }

    pub fn placeholder_count(&self) -> usize {
        self.pages.iter().map(|p| p.placeholders.len()).sum()
    }
}

/// How serious an audit finding is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// One HTML quality issue, found locally or by the assistant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub message: String,
}

impl Finding {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)
    }
}

pub fn is_html_path(path: &str) -> bool {
    path.rsplit_once('.')
        .map(|(_, ext)| HTML_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Last segment of a `/`-separated path
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Everything before the last `/`, or empty
pub fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

pub fn join_path(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Check that `name` can be used as the exported file name of a page.
///
/// Target names stay inside the page's directory, so separators and
/// parent references are rejected, and the name has to keep an HTML
/// extension for static hosts to serve it as a page.
pub fn validate_target_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::InvalidData("Empty target file name".to_string()));
    }

    if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
        return Err(Error::InvalidData(format!(
            "Target name must be a plain file name: '{}'",
            name
        )));
    }

    if name.starts_with('.') {
        return Err(Error::InvalidData(format!(
            "Target name must not be hidden: '{}'",
            name
        )));
    }

    if !is_html_path(name) {
        return Err(Error::InvalidData(format!(
            "Target name must end in .html or .htm: '{}'",
            name
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(path: &str, html: &str) -> HtmlFile {
        HtmlFile::new(SiteFile::new(path, html.as_bytes().to_vec()))
    }

    fn site() -> Site {
        Site {
            root: PathBuf::from("site"),
            pages: vec![
                page("index.html", "<a href=\"[[about]]\">{{ title }}</a>"),
                page("about.html", "<h1>About</h1>"),
            ],
            assets: vec![SiteFile::new("css/style.css", b"body{}".to_vec())],
        }
    }

    #[test]
    fn test_site_file_metadata() {
        let file = SiteFile::new("blog/post.html", b"<p></p>".to_vec());
        assert_eq!(file.name, "post.html");
        assert_eq!(file.dir(), "blog");
        assert_eq!(file.mime, "text/html");
        assert!(file.is_html());

        let css = SiteFile::new("style.css", Vec::new());
        assert_eq!(css.dir(), "");
        assert_eq!(css.mime, "text/css");
        assert!(!css.is_html());

        let unknown = SiteFile::new("data.unknownext", Vec::new());
        assert_eq!(unknown.mime, "application/octet-stream");
    }

    #[test]
    fn test_is_html_path_case_insensitive() {
        assert!(is_html_path("a.html"));
        assert!(is_html_path("a.HTM"));
        assert!(is_html_path("dir/b.Html"));
        assert!(!is_html_path("a.css"));
        assert!(!is_html_path("html"));
    }

    #[test]
    fn test_html_file_scans_placeholders() {
        let page = page("index.html", "[[a]] {{b}} [[a]]");
        assert_eq!(page.placeholders, vec!["a", "b"]);
        assert_eq!(page.target_name, "index.html");
        assert_eq!(page.unfilled(), vec!["a", "b"]);
    }

    #[test]
    fn test_html_file_link_placeholders() {
        let page = page("index.html", r#"<a href="[[next]]">[[label]]</a><img src={{logo}}>"#);
        assert_eq!(page.link_placeholders(), vec!["next", "logo"]);
    }

    #[test]
    fn test_set_value_rejects_unknown_placeholder() {
        let mut page = page("index.html", "[[a]]");
        assert!(page.set_value("a", "x").is_ok());
        assert!(page.set_value("missing", "x").is_err());
        assert!(page.unfilled().is_empty());
    }

    #[test]
    fn test_clear_removes_value_and_link() {
        let mut site = site();
        site.set_link("index.html", "about", "about.html").unwrap();
        site.page_mut("index.html")
            .unwrap()
            .set_value("about", "x")
            .unwrap();

        let page = site.page_mut("index.html").unwrap();
        page.clear("about").unwrap();
        assert!(page.values.is_empty());
        assert!(page.links.is_empty());
    }

    #[test]
    fn test_set_main_keeps_single_flag() {
        let mut site = site();
        site.set_main("index.html").unwrap();
        site.set_main("about.html").unwrap();

        let flagged: Vec<_> = site.pages.iter().filter(|p| p.is_main).collect();
        assert_eq!(flagged.len(), 1);
        assert_eq!(site.main_page().unwrap().path(), "about.html");

        site.clear_main();
        assert!(site.main_page().is_none());
    }

    #[test]
    fn test_set_main_unknown_page() {
        let mut site = site();
        assert!(site.set_main("nope.html").is_err());
        assert!(site.set_main("css/style.css").is_err());
    }

    #[test]
    fn test_set_link_requires_existing_target() {
        let mut site = site();
        assert!(site.set_link("index.html", "about", "about.html").is_ok());
        assert!(site.set_link("index.html", "about", "css/style.css").is_ok());
        assert!(site.set_link("index.html", "about", "missing.html").is_err());
        assert!(site.set_link("index.html", "nope", "about.html").is_err());
    }

    #[test]
    fn test_target_path_uses_source_dir() {
        let mut page = page("blog/post.html", "");
        page.rename("first-post.html").unwrap();
        assert_eq!(page.target_path(), "blog/first-post.html");
    }

    #[test]
    fn test_validate_target_name() {
        assert!(validate_target_name("about-us.html").is_ok());
        assert!(validate_target_name("page.htm").is_ok());
        assert!(validate_target_name("").is_err());
        assert!(validate_target_name("  ").is_err());
        assert!(validate_target_name("../x.html").is_err());
        assert!(validate_target_name("dir/x.html").is_err());
        assert!(validate_target_name(".hidden.html").is_err());
        assert!(validate_target_name("style.css").is_err());
    }

    #[test]
    fn test_finding_display_and_order() {
        let finding = Finding::new(Severity::Warning, "Missing lang");
        assert_eq!(finding.to_string(), "[warning] Missing lang");
        assert!(Severity::Error < Severity::Warning);
        assert!(Severity::Warning < Severity::Info);
    }

    #[test]
    fn test_path_helpers() {
        assert_eq!(file_name("a/b/c.html"), "c.html");
        assert_eq!(file_name("c.html"), "c.html");
        assert_eq!(parent_dir("a/b/c.html"), "a/b");
        assert_eq!(parent_dir("c.html"), "");
        assert_eq!(join_path("", "x.html"), "x.html");
        assert_eq!(join_path("a", "x.html"), "a/x.html");
    }
}
