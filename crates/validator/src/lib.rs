//! Checks run before a site is exported.
//!
//! [`validate_site`] looks at the project as a whole (home page, links,
//! placeholders); [`audit_html`] looks at the markup quality of one page.

use scraper::{Html, Node, Selector};
use sitepack_core::{Finding, INDEX_FILE, Severity, Site, placeholder, validate_target_name};
use sitepack_generator::links::resolve_link;
use serde::Serialize;
use std::sync::LazyLock;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub info: Vec<String>,
}

impl ValidationReport {
    /// No errors; warnings do not block an export
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check project-level invariants of a site
pub fn validate_site(site: &Site) -> ValidationReport {
    let mut report = ValidationReport::default();

    let main_pages: Vec<&str> = site
        .pages
        .iter()
        .filter(|p| p.is_main)
        .map(|p| p.path())
        .collect();
    if main_pages.len() > 1 {
        report.errors.push(format!(
            "More than one home page selected: {}",
            main_pages.join(", ")
        ));
    }
    if main_pages.is_empty() && site.page(INDEX_FILE).is_none() {
        report.warnings.push(
            "No home page selected and no index.html in the site root".to_string(),
        );
    }

    for page in &site.pages {
        if let Err(e) = validate_target_name(&page.target_name) {
            report.errors.push(format!("{}: {}", page.path(), e));
        }

        for (name, target) in &page.links {
            if !site.contains(target) {
                report.errors.push(format!(
                    "{}: placeholder '{}' links to missing file '{}'",
                    page.path(),
                    name,
                    target
                ));
            }
        }

        let unfilled = page.unfilled();
        if !unfilled.is_empty() {
            report.warnings.push(format!(
                "{}: unfilled placeholders: {}",
                page.path(),
                unfilled.join(", ")
            ));
        }

        for href in sitepack_generator::links::link_values(&page.source()) {
            // Links built from placeholders only exist after substitution.
            if !placeholder::scan(&href).is_empty() {
                continue;
            }
            if let Some(link) = resolve_link(page.path(), &href)
                && !site.contains(&link.path)
            {
                report
                    .warnings
                    .push(format!("{}: broken link '{}'", page.path(), href));
            }
        }
    }

    if let Err(e) = sitepack_generator::plan(site) {
        report.errors.push(e.to_string());
    }

    report.info.push(format!(
        "{} pages, {} assets, {} placeholders",
        site.pages.len(),
        site.assets.len(),
        site.placeholder_count()
    ));
    if let Some(main) = site.main_page() {
        report.info.push(format!("Home page: {}", main.path()));
    }

    tracing::debug!(
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "validated site"
    );

    report
}

fn selector(css: &'static str) -> Selector {
    Selector::parse(css).unwrap()
}

static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("title"));
static META_CHARSET: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"meta[charset], meta[http-equiv="Content-Type"]"#));
static META_VIEWPORT: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"meta[name="viewport"]"#));
static META_DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"meta[name="description"]"#));
static IMG_WITHOUT_ALT: LazyLock<Selector> = LazyLock::new(|| selector("img:not([alt])"));
static H1: LazyLock<Selector> = LazyLock::new(|| selector("h1"));
static EMPTY_LINK: LazyLock<Selector> = LazyLock::new(|| selector(r#"a[href=""]"#));

/// Local markup quality audit of one page, most serious findings first
pub fn audit_html(html: &str) -> Vec<Finding> {
    let document = Html::parse_document(html);
    let mut findings = Vec::new();

    let has_doctype = document.tree.root().children().any(|node| {
        matches!(node.value(), Node::Doctype(doctype) if doctype.name().eq_ignore_ascii_case("html"))
    });
    if !has_doctype {
        findings.push(Finding::new(Severity::Warning, "Missing <!DOCTYPE html> declaration"));
    }

    if document.root_element().value().attr("lang").is_none() {
        findings.push(Finding::new(
            Severity::Warning,
            "Missing lang attribute on <html>",
        ));
    }

    let title = document
        .select(&TITLE)
        .next()
        .map(|t| t.text().collect::<String>());
    match title {
        None => findings.push(Finding::new(Severity::Error, "Missing <title>")),
        Some(t) if t.trim().is_empty() => {
            findings.push(Finding::new(Severity::Error, "Empty <title>"))
        }
        Some(_) => {}
    }

    if document.select(&META_CHARSET).next().is_none() {
        findings.push(Finding::new(Severity::Warning, "Missing <meta charset>"));
    }

    if document.select(&META_VIEWPORT).next().is_none() {
        findings.push(Finding::new(
            Severity::Warning,
            "Missing <meta name=\"viewport\">, page will not scale on mobile",
        ));
    }

    if document.select(&META_DESCRIPTION).next().is_none() {
        findings.push(Finding::new(
            Severity::Info,
            "Missing <meta name=\"description\">",
        ));
    }

    let missing_alt = document.select(&IMG_WITHOUT_ALT).count();
    if missing_alt > 0 {
        findings.push(Finding::new(
            Severity::Warning,
            format!("{} <img> element(s) without alt text", missing_alt),
        ));
    }

    match document.select(&H1).count() {
        0 => findings.push(Finding::new(Severity::Warning, "No <h1> heading")),
        1 => {}
        n => findings.push(Finding::new(
            Severity::Info,
            format!("{} <h1> headings, one is recommended", n),
        )),
    }

    let empty_links = document.select(&EMPTY_LINK).count();
    if empty_links > 0 {
        findings.push(Finding::new(
            Severity::Warning,
            format!("{} link(s) with an empty href", empty_links),
        ));
    }

    findings.sort_by_key(|f| f.severity);
    findings
}
