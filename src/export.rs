use crate::api_client::{ExportFormat, ScoreRange, SolarApiClient};
use anyhow::Result;
use chrono::{Local, NaiveDate};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Destination for a fetched export. Injected so the fetch path can be
/// exercised without touching the real filesystem.
pub trait ExportSink {
    fn save(&self, filename: &str, contents: &[u8]) -> Result<PathBuf>;
}

/// Sink that writes exports into a directory, creating it on demand.
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Sink for the current working directory.
    pub fn current_dir() -> Self {
        Self::new(".")
    }
}

impl ExportSink for DirectorySink {
    fn save(&self, filename: &str, contents: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(filename);
        let mut file = File::create(&path)?;
        file.write_all(contents)?;
        Ok(path)
    }
}

/// Export filename for today, `solar_sites_<YYYY-MM-DD>.<ext>`.
pub fn export_filename(format: ExportFormat) -> String {
    export_filename_on(Local::now().date_naive(), format)
}

pub fn export_filename_on(date: NaiveDate, format: ExportFormat) -> String {
    format!(
        "solar_sites_{}.{}",
        date.format("%Y-%m-%d"),
        format.extension()
    )
}

/// Fetch the CSV export and hand it to the sink. The sink is only
/// touched after the fetch succeeds, so a failed call leaves no file
/// behind. Returns the written path.
pub async fn download_csv(
    client: &SolarApiClient,
    sink: &dyn ExportSink,
    range: &ScoreRange,
) -> Result<PathBuf> {
    let bytes = client.export_csv(range).await?;
    let path = sink.save(&export_filename(ExportFormat::Csv), &bytes)?;
    tracing::info!(target: "export", "saved CSV export to {}", path.display());
    Ok(path)
}

/// Fetch the JSON export, pretty-print it and hand it to the sink.
pub async fn download_json(
    client: &SolarApiClient,
    sink: &dyn ExportSink,
    range: &ScoreRange,
) -> Result<PathBuf> {
    let value = client.export_json(range).await?;
    let pretty = serde_json::to_vec_pretty(&value)?;
    let path = sink.save(&export_filename(ExportFormat::Json), &pretty)?;
    tracing::info!(target: "export", "saved JSON export to {}", path.display());
    Ok(path)
}

/// Resolve the sink directory from an explicit override or the
/// configured default, falling back to the current directory.
pub fn resolve_sink(cli_dir: Option<&Path>, configured: Option<&Path>) -> DirectorySink {
    match cli_dir.or(configured) {
        Some(dir) => DirectorySink::new(dir),
        None => DirectorySink::current_dir(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_carries_date_and_extension() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(
            export_filename_on(date, ExportFormat::Csv),
            "solar_sites_2024-01-15.csv"
        );
        assert_eq!(
            export_filename_on(date, ExportFormat::Json),
            "solar_sites_2024-01-15.json"
        );
    }

    #[test]
    fn directory_sink_creates_missing_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(tmp.path().join("exports/nested"));
        let path = sink.save("solar_sites_2024-01-15.csv", b"id,name\n").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"id,name\n");
    }

    #[test]
    fn resolve_sink_prefers_explicit_directory() {
        let sink = resolve_sink(Some(Path::new("/tmp/a")), Some(Path::new("/tmp/b")));
        let path = sink.dir;
        assert_eq!(path, PathBuf::from("/tmp/a"));
    }
}
