use crate::error::{Error, Result};
use crate::types::{HtmlFile, Site, SiteFile};
use std::fs;
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

/// Directories never treated as part of the site
const SKIPPED_DIRS: &[&str] = &["node_modules"];

/// Read every file below `dir` into a [`Site`].
///
/// Hidden entries (`.git`, `.DS_Store`, the `.sitepack.toml` state file)
/// and `node_modules` are skipped. Files are visited in file name order,
/// so pages and assets come out sorted by path.
pub fn load_site<P: AsRef<Path>>(dir: P) -> Result<Site> {
    let root = dir.as_ref();
    if !root.is_dir() {
        return Err(Error::InvalidData(format!(
            "Site folder does not exist or is not a directory: {}",
            root.display()
        )));
    }

    let mut site = Site {
        root: root.to_path_buf(),
        ..Site::default()
    };

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped(e));

    for entry in walker {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = relative_path(root, entry.path())?;
        let content = fs::read(entry.path())?;
        let file = SiteFile::new(path, content);

        if file.is_html() {
            let page = HtmlFile::new(file);
            tracing::debug!(
                path = page.path(),
                placeholders = page.placeholders.len(),
                "scanned page"
            );
            site.pages.push(page);
        } else {
            site.assets.push(file);
        }
    }

    tracing::debug!(
        pages = site.pages.len(),
        assets = site.assets.len(),
        "loaded site from {}",
        root.display()
    );

    Ok(site)
}

fn is_skipped(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || (entry.file_type().is_dir() && SKIPPED_DIRS.contains(&name.as_ref()))
}

/// Site-relative path with `/` separators, whatever the platform
fn relative_path(root: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(root).map_err(|_| {
        Error::InvalidData(format!("{} is outside the site folder", path.display()))
    })?;

    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();

    Ok(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_load_site_splits_pages_and_assets() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "index.html", "<h1>[[title]]</h1>");
        write(dir.path(), "about.HTM", "<p>about</p>");
        write(dir.path(), "css/style.css", "body {}");
        write(dir.path(), "img/logo.svg", "<svg/>");

        let site = load_site(dir.path()).unwrap();
        let pages: Vec<_> = site.pages.iter().map(|p| p.path()).collect();
        let assets: Vec<_> = site.assets.iter().map(|a| a.path.as_str()).collect();

        assert_eq!(pages, vec!["about.HTM", "index.html"]);
        assert_eq!(assets, vec!["css/style.css", "img/logo.svg"]);
        assert_eq!(site.page("index.html").unwrap().placeholders, vec!["title"]);
    }

    #[test]
    fn test_load_site_nested_paths_use_forward_slashes() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "blog/2024/post.html", "<p>post</p>");

        let site = load_site(dir.path()).unwrap();
        assert_eq!(site.pages[0].path(), "blog/2024/post.html");
        assert_eq!(site.pages[0].file.name, "post.html");
        assert_eq!(site.pages[0].file.dir(), "blog/2024");
    }

    #[test]
    fn test_load_site_skips_hidden_and_node_modules() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "index.html", "");
        write(dir.path(), ".sitepack.toml", "main = \"index.html\"");
        write(dir.path(), ".git/config", "");
        write(dir.path(), "node_modules/pkg/index.js", "");
        write(dir.path(), "js/.DS_Store", "");

        let site = load_site(dir.path()).unwrap();
        assert_eq!(site.pages.len(), 1);
        assert!(site.assets.is_empty());
    }

    #[test]
    fn test_load_site_keeps_binary_assets() {
        let dir = TempDir::new().unwrap();
        let bytes = vec![0x89, b'P', b'N', b'G', 0xff, 0x00];
        fs::write(dir.path().join("logo.png"), &bytes).unwrap();

        let site = load_site(dir.path()).unwrap();
        assert_eq!(site.assets[0].content, bytes);
        assert_eq!(site.assets[0].mime, "image/png");
    }

    #[test]
    fn test_load_site_reads_non_utf8_pages_lossily() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("latin1.html"), b"<h1>Caf\xe9 [[title]]</h1>").unwrap();

        let site = load_site(dir.path()).unwrap();
        let page = site.page("latin1.html").unwrap();
        assert_eq!(page.placeholders, vec!["title"]);
        assert_eq!(page.source(), "<h1>Caf\u{FFFD} [[title]]</h1>");
        assert_eq!(page.file.content, b"<h1>Caf\xe9 [[title]]</h1>");
    }

    #[test]
    fn test_load_site_missing_dir() {
        let dir = TempDir::new().unwrap();
        let result = load_site(dir.path().join("nope"));
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("does not exist")
        );
    }

    #[test]
    fn test_load_site_empty_dir() {
        let dir = TempDir::new().unwrap();
        let site = load_site(dir.path()).unwrap();
        assert!(site.pages.is_empty());
        assert!(site.assets.is_empty());
    }
}
