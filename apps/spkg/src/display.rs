//! Result rendering for the CLI

use spkg_install::InstallReport;
use spkg_patch::PatchOutcome;

/// Renders final results either as human-readable text or JSON.
pub struct OutputRenderer {
    json: bool,
}

impl OutputRenderer {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn render_install(&self, report: &InstallReport) {
        if self.json {
            match serde_json::to_string_pretty(report) {
                Ok(json) => println!("{json}"),
                Err(e) => eprintln!("failed to serialize report: {e}"),
            }
            return;
        }

        println!("Installed {}", report.package);
        if report.patches_applied > 0 {
            println!("  patches applied: {}", report.patches_applied);
        }
        for artifact in &report.purged {
            println!("  purged stale artifact: {artifact}");
        }
        println!("  took {}ms", report.duration_ms);
    }

    pub fn render_patch(&self, outcome: &PatchOutcome) {
        if self.json {
            let json = serde_json::json!({
                "patch": outcome.patch_path.display().to_string(),
                "files": outcome.files.iter().map(|f| f.display().to_string()).collect::<Vec<_>>(),
                "hunks": outcome.hunks,
            });
            println!("{json:#}");
            return;
        }

        println!(
            "Applied {} ({} hunks across {} files)",
            outcome.patch_path.display(),
            outcome.hunks,
            outcome.files.len()
        );
    }
}
