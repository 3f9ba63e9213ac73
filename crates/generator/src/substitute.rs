use crate::export::ExportPlan;
use crate::links::relative_url;
use anyhow::Result;
use sitepack_core::placeholder;
use sitepack_core::{Error, HtmlFile};

/// Fill the placeholders of `html`, the (possibly link-rewritten) source
/// of `page`.
///
/// A placeholder mapped to another file becomes the relative URL from
/// the page's export path to that file's export path. Otherwise a text
/// value is inserted verbatim, so values may carry markup. Placeholders
/// without either are left in place.
pub fn substitute(page: &HtmlFile, html: &str, plan: &ExportPlan) -> Result<String> {
    let from = plan.final_path(page.path()).unwrap_or(page.path());

    for (name, target) in &page.links {
        if plan.final_path(target).is_none() {
            return Err(Error::InvalidData(format!(
                "Placeholder '{}' in '{}' links to missing file '{}'",
                name,
                page.path(),
                target
            ))
            .into());
        }
    }

    Ok(placeholder::replace_with(html, |name, _kind| {
        if let Some(target) = page.links.get(name) {
            plan.final_path(target).map(|to| relative_url(from, to))
        } else {
            page.values.get(name).cloned()
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::plan;
    use sitepack_core::{Site, SiteFile};
    use std::path::PathBuf;

    fn site() -> Site {
        let pages = [
            ("index.html", r#"<title>[[title]]</title><a href="{{ next }}">{{label}}</a>"#),
            ("blog/post.html", r#"<a href="[[home]]">home</a> [[missing]]"#),
        ];
        Site {
            root: PathBuf::from("."),
            pages: pages
                .iter()
                .map(|(p, html)| HtmlFile::new(SiteFile::new(*p, html.as_bytes().to_vec())))
                .collect(),
            assets: vec![SiteFile::new("img/logo.png", Vec::new())],
        }
    }

    fn render(site: &Site, path: &str) -> Result<String> {
        let plan = plan(site)?;
        let page = site.page(path).unwrap();
        substitute(page, &page.source(), &plan)
    }

    #[test]
    fn test_substitute_text_values() {
        let mut site = site();
        let page = site.page_mut("index.html").unwrap();
        page.set_value("title", "Acme & Co").unwrap();
        page.set_value("label", "<b>Next</b>").unwrap();

        let html = render(&site, "index.html").unwrap();
        assert!(html.contains("<title>Acme & Co</title>"));
        assert!(html.contains("<b>Next</b>"));
        assert!(html.contains(r#"href="{{ next }}""#));
    }

    #[test]
    fn test_substitute_link_uses_relative_export_path() {
        let mut site = site();
        site.set_link("index.html", "next", "blog/post.html").unwrap();
        site.set_link("blog/post.html", "home", "index.html").unwrap();

        let html = render(&site, "index.html").unwrap();
        assert!(html.contains(r#"href="blog/post.html""#));

        let html = render(&site, "blog/post.html").unwrap();
        assert!(html.contains(r#"href="../index.html""#));
        assert!(html.contains("[[missing]]"));
    }

    #[test]
    fn test_substitute_link_follows_renames() {
        let mut site = site();
        site.set_link("blog/post.html", "home", "index.html").unwrap();
        site.page_mut("blog/post.html")
            .unwrap()
            .rename("first.html")
            .unwrap();
        site.page_mut("index.html").unwrap().rename("start.html").unwrap();

        let html = render(&site, "blog/post.html").unwrap();
        assert!(html.contains(r#"href="../start.html""#));
    }

    #[test]
    fn test_substitute_link_wins_over_value() {
        let mut site = site();
        site.page_mut("index.html")
            .unwrap()
            .set_value("next", "ignored.html")
            .unwrap();
        site.set_link("index.html", "next", "img/logo.png").unwrap();

        let html = render(&site, "index.html").unwrap();
        assert!(html.contains(r#"href="img/logo.png""#));
        assert!(!html.contains("ignored.html"));
    }

    #[test]
    fn test_substitute_rejects_link_to_missing_file() {
        let mut site = site();
        site.page_mut("index.html")
            .unwrap()
            .links
            .insert("next".to_string(), "gone.html".to_string());

        let result = render(&site, "index.html");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("gone.html"));
    }
}
