// CSV input decoding and table export

use std::io::{Read, Write};
use std::path::Path;

use impound_recon::tables::{Cell, TableRow};

/// Timestamp layout used for every written timestamp cell.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = std::fs::File::open(path).map_err(|e| format!("{}: {e}", path.display()))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| format!("{}: {e}", path.display()))?;

    let text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            // Shelter exports from Excel are often Windows-1252
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    };

    Ok(match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    })
}

/// Text of one cell, with unknown written as `na_rep`.
pub fn format_cell(cell: &Cell<'_>, na_rep: &str) -> String {
    match cell {
        Cell::Text(Some(s)) => (*s).to_string(),
        Cell::Integer(Some(n)) => n.to_string(),
        Cell::Timestamp(Some(ts)) => ts.format(TIMESTAMP_FORMAT).to_string(),
        Cell::Text(None) | Cell::Integer(None) | Cell::Timestamp(None) => na_rep.to_string(),
    }
}

/// Write a header row then one record per row.
pub fn write_table<R: TableRow, W: Write>(rows: &[R], out: W, na_rep: &str) -> Result<(), String> {
    let mut writer = csv::WriterBuilder::new().from_writer(out);

    writer.write_record(R::COLUMNS).map_err(|e| e.to_string())?;
    for row in rows {
        let record: Vec<String> = row.cells().iter().map(|c| format_cell(c, na_rep)).collect();
        writer.write_record(&record).map_err(|e| e.to_string())?;
    }

    writer.flush().map_err(|e| e.to_string())?;
    Ok(())
}

pub fn export<R: TableRow>(rows: &[R], path: &Path, na_rep: &str) -> Result<(), String> {
    let file = std::fs::File::create(path).map_err(|e| format!("{}: {e}", path.display()))?;
    write_table(rows, std::io::BufWriter::new(file), na_rep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use impound_recon::model::{ImpoundRecord, IntakeEvent, Individual};
    use impound_recon::tables::{AnimalRow, ImpoundRow};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn cells_render_with_na_rep() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        assert_eq!(format_cell(&Cell::Text(Some("Rex")), "NA"), "Rex");
        assert_eq!(format_cell(&Cell::Text(Some("")), "NA"), "");
        assert_eq!(format_cell(&Cell::Text(None), "NA"), "NA");
        assert_eq!(format_cell(&Cell::Integer(Some(-7)), ""), "-7");
        assert_eq!(format_cell(&Cell::Integer(None), ""), "");
        assert_eq!(format_cell(&Cell::Timestamp(Some(ts)), "NA"), "2024-01-02 03:04:05");
    }

    #[test]
    fn write_impound_table() {
        let at = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let intake = IntakeEvent {
            intake_type: Some("Stray, injured".into()),
            ..IntakeEvent::at(at)
        };
        let rows = vec![ImpoundRow::from(&ImpoundRecord::in_custody("A1", intake))];

        let mut out = Vec::new();
        write_table(&rows, &mut out, "NA").unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines[0], ImpoundRow::COLUMNS.join(","));
        assert_eq!(
            lines[1],
            "A1,2024-01-01 09:00:00,\"Stray, injured\",NA,NA,NA,NA,NA,NA,NA,NA,NA,NA,NA,NA,NA"
        );
    }

    #[test]
    fn export_animals_to_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("animals.csv");
        let at = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let rows = vec![AnimalRow::from(&Individual::new("A1", at))];

        export(&rows, &path, "").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "animal_id,kind,name,gender,color_1,color_2,breed_1,breed_2\nA1,,,,,,,\n"
        );
    }

    #[test]
    fn windows_1252_input_is_decoded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("intakes.csv");
        // "Jos\xe9" is "José" in Windows-1252
        fs::write(&path, b"animal_id,name\nA1,Jos\xe9\n").unwrap();

        let text = read_file_as_utf8(&path).unwrap();
        assert_eq!(text, "animal_id,name\nA1,José\n");
    }

    #[test]
    fn utf8_bom_is_stripped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bom.csv");
        fs::write(&path, "\u{feff}animal_id\nA1\n").unwrap();

        assert_eq!(read_file_as_utf8(&path).unwrap(), "animal_id\nA1\n");
    }

    #[test]
    fn missing_file_names_path() {
        let err = read_file_as_utf8(Path::new("/nonexistent/impounds.csv")).unwrap_err();
        assert!(err.contains("impounds.csv"));
    }
}
