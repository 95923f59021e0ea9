use crate::domain::dataset::{Cell, Dataset};
use crate::domain::schema::ColumnSchema;
use crate::error::ScreenerError;
use crate::ingest::builder::build_dataset;
use crate::ingest::provider::ScreenerSource;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// `dir/YYYY-MM-DD.csv`: one snapshot per calendar day.
pub fn cache_path_for(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("{}.csv", date.format("%Y-%m-%d")))
}

/// Reads the snapshot at `path`, or fetches, builds and persists it when absent.
///
/// An existing file is returned as-is; its columns are not checked against the
/// current schema.
pub async fn load_or_build(
    path: &Path,
    source: &dyn ScreenerSource,
    schema: &ColumnSchema,
) -> Result<Dataset, ScreenerError> {
    let exists = path
        .try_exists()
        .map_err(|err| storage_error(path, "stat", err))?;

    if exists {
        let dataset = run_blocking(path, read_dataset).await?;
        tracing::debug!(path = %path.display(), rows = dataset.len(), "screener cache hit");
        return Ok(dataset);
    }

    let payload = source.fetch().await?;
    let dataset = build_dataset(&payload, schema)?;
    let dataset = run_blocking(path, move |path| {
        write_dataset(path, &dataset).map(|()| dataset)
    })
    .await?;

    tracing::info!(
        path = %path.display(),
        provider = source.provider_name(),
        rows = dataset.len(),
        "screener cache built"
    );
    Ok(dataset)
}

/// Runs snapshot file I/O on tokio's blocking pool.
async fn run_blocking<T, F>(path: &Path, f: F) -> Result<T, ScreenerError>
where
    T: Send + 'static,
    F: FnOnce(&Path) -> Result<T, ScreenerError> + Send + 'static,
{
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || f(&path))
        .await
        .map_err(|err| ScreenerError::Storage(format!("cache task failed: {err}")))?
}

pub fn read_dataset(path: &Path) -> Result<Dataset, ScreenerError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;

    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(Cell::parse_field).collect());
    }

    Dataset::new(columns, rows)
}

/// Writes the full snapshot to a uniquely named sibling temp file, then
/// persists it over `path`. Concurrent writers each replace the whole file.
pub fn write_dataset(path: &Path, dataset: &Dataset) -> Result<(), ScreenerError> {
    let dir = match path.parent().filter(|d| !d.as_os_str().is_empty()) {
        Some(dir) => {
            fs::create_dir_all(dir).map_err(|err| storage_error(dir, "create directory", err))?;
            dir
        }
        None => Path::new("."),
    };

    // Dropped (and removed) on any error before `persist`.
    let mut tmp =
        NamedTempFile::new_in(dir).map_err(|err| storage_error(dir, "create temp file", err))?;
    {
        let mut writer = csv::Writer::from_writer(tmp.as_file_mut());
        writer.write_record(dataset.columns())?;
        for row in dataset.rows() {
            writer.write_record(row.iter().map(Cell::to_string))?;
        }
        writer
            .flush()
            .map_err(|err| storage_error(path, "flush", err))?;
    }
    tmp.persist(path)
        .map_err(|err| storage_error(path, "persist", err.error))?;
    Ok(())
}

fn storage_error(path: &Path, op: &str, err: std::io::Error) -> ScreenerError {
    ScreenerError::Storage(format!("{op} {}: {err}", path.display()))
}
