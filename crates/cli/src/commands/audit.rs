use anyhow::Result;
use sitepack_assistant::audit_all;
use sitepack_core::Finding;
use sitepack_generator::{plan, render_page};
use sitepack_validator::audit_html;
use std::path::PathBuf;

use super::ai;
use super::project::Project;

/// Review the markup of every page (or one) as it will be exported.
///
/// The local checks always run; `use_ai` adds the assistant's review,
/// requested for all pages at once.
pub async fn run(path: PathBuf, use_ai: bool, page: Option<String>) -> Result<()> {
    let project = Project::open(&path)?;
    let pages = rendered_pages(&project, page.as_deref())?;

    println!("🔍 Auditing {} page(s)", pages.len());
    let mut total = 0;
    for (path, html) in &pages {
        let findings = audit_html(html);
        total += findings.len();
        print_findings(path, "local", &findings);
    }

    if use_ai {
        let client = ai::client()?;
        println!();
        println!("🤖 Asking the assistant...");
        for (path, result) in audit_all(&client, &pages).await {
            match result {
                Ok(findings) => {
                    total += findings.len();
                    print_findings(&path, "assistant", &findings);
                }
                Err(e) => println!("\n{}\n  ✗ assistant: {}", path, e),
            }
        }
    }

    println!();
    println!("{} finding(s)", total);
    Ok(())
}

/// `(source path, html)` with links rewritten and placeholders filled.
/// Pages that cannot be rendered yet are audited as written.
fn rendered_pages(project: &Project, only: Option<&str>) -> Result<Vec<(String, String)>> {
    let sources = project.page_sources(only)?;
    let Ok(plan) = plan(&project.site) else {
        return Ok(sources);
    };

    Ok(sources
        .into_iter()
        .map(|(path, source)| {
            let html = project
                .site
                .page(&path)
                .and_then(|page| render_page(page, &plan).ok())
                .unwrap_or(source);
            (path, html)
        })
        .collect())
}

fn print_findings(path: &str, source: &str, findings: &[Finding]) {
    println!();
    println!("{} ({})", path, source);
    if findings.is_empty() {
        println!("  ✓ no issues");
    }
    for finding in findings {
        println!("  {}", finding);
    }
}
