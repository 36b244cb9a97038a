use std::fs;
use std::path::Path;

use scriptmatch::Report;

pub fn write_report(path: &Path, report: &Report) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| {
            format!(
                "Failed to create report output directory '{}': {err}",
                parent.display()
            )
        })?;
    }

    let mut payload = serde_json::to_vec_pretty(report).map_err(|err| {
        format!(
            "Failed to serialize report JSON '{}': {err}",
            path.display()
        )
    })?;
    payload.push(b'\n');
    fs::write(path, payload)
        .map_err(|err| format!("Failed to write report file '{}': {err}", path.display()))?;
    Ok(())
}
