use crate::export::ExportPlan;
use sitepack_core::Site;
use std::collections::BTreeMap;

/// Preview URL of every page, keyed by source path.
///
/// `base_url` is where the rendered site is served, e.g.
/// `http://localhost:8080`. Each page maps to its export path under it.
pub fn preview_urls(site: &Site, plan: &ExportPlan, base_url: &str) -> BTreeMap<String, String> {
    let base = base_url.trim_end_matches('/');

    site.pages
        .iter()
        .filter_map(|page| {
            let exported = plan.final_path(page.path())?;
            let encoded: Vec<String> = exported
                .split('/')
                .map(|s| urlencoding::encode(s).into_owned())
                .collect();
            Some((
                page.path().to_string(),
                format!("{}/{}", base, encoded.join("/")),
            ))
        })
        .collect()
}
