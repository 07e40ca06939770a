// JSON export

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use impound_recon::ImpoundResult;

/// Export the whole run (meta, summary, anomalies, both tables) as one
/// pretty-printed document. Unknown values are `null`.
pub fn export(result: &ImpoundResult, path: &Path) -> Result<(), String> {
    let file = File::create(path).map_err(|e| format!("{}: {e}", path.display()))?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, result).map_err(|e| e.to_string())?;

    Ok(())
}
