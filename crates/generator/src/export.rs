use anyhow::{Result, bail};
use sitepack_core::{INDEX_FILE, Site};
use std::collections::{BTreeMap, BTreeSet};

/// Stem given to a page pushed out of `index.html` by the home page
pub const DISPLACED_INDEX_STEM: &str = "index-original";

/// Where every file of a site ends up in the export
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportPlan {
    paths: BTreeMap<String, String>,
}

impl ExportPlan {
    /// Export path of the file at site path `source`
    pub fn final_path(&self, source: &str) -> Option<&str> {
        self.paths.get(source).map(String::as_str)
    }

    /// `(source, export)` pairs in source path order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.paths.iter().map(|(s, f)| (s.as_str(), f.as_str()))
    }

    /// Files whose export path differs from their source path
    pub fn renamed(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter().filter(|(s, f)| s != f)
    }
}

/// Decide the export path of every file.
///
/// The home page is exported as the root `index.html`. A different page
/// that would also land on the root `index.html` moves to
/// `index-original.html` (or `index-original-2.html`, ...). Every other
/// page keeps its directory and uses its target name; assets never move.
pub fn plan(site: &Site) -> Result<ExportPlan> {
    let main = site.main_page().map(|p| p.path().to_string());

    let mut entries: Vec<(String, String)> = site
        .assets
        .iter()
        .map(|a| (a.path.clone(), a.path.clone()))
        .collect();

    for page in &site.pages {
        let target = if main.as_deref() == Some(page.path()) {
            INDEX_FILE.to_string()
        } else {
            page.target_path()
        };
        entries.push((page.path().to_string(), target));
    }

    if let Some(main) = &main {
        let mut taken: BTreeSet<String> = entries.iter().map(|(_, f)| f.clone()).collect();
        for (source, target) in entries.iter_mut() {
            if source.as_str() != main.as_str() && target.as_str() == INDEX_FILE {
                let displaced = displaced_name(&taken);
                tracing::debug!(page = source.as_str(), to = displaced.as_str(), "moving page out of the home page's way");
                taken.insert(displaced.clone());
                *target = displaced;
            }
        }
    }

    let mut owners: BTreeMap<&str, &str> = BTreeMap::new();
    for (source, target) in &entries {
        if let Some(other) = owners.insert(target.as_str(), source.as_str()) {
            bail!(
                "Export path collision: '{}' and '{}' would both be written to '{}'",
                other,
                source,
                target
            );
        }
    }

    Ok(ExportPlan {
        paths: entries.into_iter().collect(),
    })
}

fn displaced_name(taken: &BTreeSet<String>) -> String {
    let mut candidate = format!("{}.html", DISPLACED_INDEX_STEM);
    let mut n = 2;
    while taken.contains(&candidate) {
        candidate = format!("{}-{}.html", DISPLACED_INDEX_STEM, n);
        n += 1;
    }
    candidate
}
