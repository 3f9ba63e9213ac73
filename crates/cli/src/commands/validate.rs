use anyhow::Result;
use sitepack_validator::{ValidationReport, validate_site};
use std::path::PathBuf;

use super::project::Project;

pub async fn run(path: PathBuf, json: bool) -> Result<()> {
    let project = Project::open(&path)?;
    let report = validate_site(&project.site);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validating site at: {}", path.display());
        print_report(&report);
    }

    if !report.is_ok() {
        anyhow::bail!("Validation failed with {} error(s)", report.errors.len());
    }
    Ok(())
}

pub fn print_report(report: &ValidationReport) {
    for error in &report.errors {
        println!("  ✗ {}", error);
    }
    for warning in &report.warnings {
        println!("  ⚠ {}", warning);
    }
    for info in &report.info {
        println!("  ✓ {}", info);
    }
}
