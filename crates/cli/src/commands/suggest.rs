use anyhow::Result;
use sitepack_assistant::{FilenameSuggestion, suggest_all, suggest_local};
use std::path::PathBuf;

use super::ai;
use super::project::Project;
use super::rename;

/// Suggest a filename for every page, renaming them with `apply`.
///
/// Suggestions are requested concurrently. A page whose request fails is
/// reported and left alone.
pub async fn run(path: PathBuf, apply: bool, local: bool) -> Result<()> {
    let mut project = Project::open(&path)?;
    let pages = project.page_sources(None)?;

    let results: Vec<(String, sitepack_assistant::Result<FilenameSuggestion>)> = if local {
        pages
            .iter()
            .map(|(path, html)| (path.clone(), Ok(suggest_local(path, html))))
            .collect()
    } else {
        let client = ai::client()?;
        println!("🤖 Asking the assistant about {} pages...", pages.len());
        suggest_all(&client, &pages).await
    };

    let applied = report(&mut project, results, apply);

    if apply && applied > 0 {
        project.save()?;
        println!();
        println!("✅ Renamed {} pages", applied);
    } else if !apply {
        println!();
        println!("💡 Run again with --apply to rename, or pick names with 'sitepack rename'");
    }

    Ok(())
}

/// Print every suggestion and apply the usable ones; returns how many were applied
fn report(
    project: &mut Project,
    results: Vec<(String, sitepack_assistant::Result<FilenameSuggestion>)>,
    apply: bool,
) -> usize {
    let mut applied = 0;

    for (page, result) in results {
        let suggestion = match result {
            Ok(s) => s,
            Err(e) => {
                println!("   ✗ {}: {}", page, e);
                continue;
            }
        };

        let current = project
            .site
            .page(&page)
            .map(|p| p.target_name.clone())
            .unwrap_or_default();
        if current == suggestion.filename {
            println!("   = {} (keeps {})", page, current);
            continue;
        }

        match &suggestion.reason {
            Some(reason) => println!("   {} -> {} ({})", page, suggestion.filename, reason),
            None => println!("   {} -> {}", page, suggestion.filename),
        }

        if apply {
            match rename::apply(project, &page, &suggestion.filename) {
                Ok(()) => applied += 1,
                Err(e) => println!("     ⚠ not applied: {}", e),
            }
        }
    }

    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitepack_assistant::AssistantError;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.html"), "<title>Welcome</title>").unwrap();
        fs::write(dir.path().join("p1.html"), "<title>Our Work</title>").unwrap();
        fs::write(dir.path().join("p2.html"), "<h1>Our Work</h1>").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_suggest_local_apply_skips_collisions() {
        let dir = fixture();
        let root = dir.path().to_path_buf();

        run(root.clone(), true, true).await.unwrap();

        let project = Project::open(&root).unwrap();
        assert_eq!(project.site.page("index.html").unwrap().target_name, "index.html");
        assert_eq!(project.site.page("p1.html").unwrap().target_name, "our-work.html");
        // Same suggestion as p1, so it keeps its name
        assert_eq!(project.site.page("p2.html").unwrap().target_name, "p2.html");
    }

    #[tokio::test]
    async fn test_suggest_without_apply_changes_nothing() {
        let dir = fixture();
        let root = dir.path().to_path_buf();

        run(root.clone(), false, true).await.unwrap();
        assert!(!Project::is_initialized(&root));
    }

    #[test]
    fn test_report_skips_failed_pages() {
        let dir = fixture();
        let mut project = Project::open(dir.path()).unwrap();

        let results = vec![
            (
                "p1.html".to_string(),
                Err(AssistantError::MalformedResponse("bad".to_string())),
            ),
            (
                "p2.html".to_string(),
                Ok(FilenameSuggestion {
                    filename: "work.html".to_string(),
                    reason: Some("heading".to_string()),
                }),
            ),
        ];

        assert_eq!(report(&mut project, results, true), 1);
        assert_eq!(project.site.page("p1.html").unwrap().target_name, "p1.html");
        assert_eq!(project.site.page("p2.html").unwrap().target_name, "work.html");
    }
}
