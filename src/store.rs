//! Append-only row stores, one ordered sheet per feedback category.
//!
//! The only mutation is `append`. Rows come back from `fetch_all` in append order.
//! Callers must treat both operations as fallible and as at-least-once: a retried
//! append may leave a duplicate row behind.

use crate::config::StoreConfig;
use crate::error::{FeedbackError, StoreError};
use crate::normalizer::Row;
use crate::schema::FeedbackCategory;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::io::SeekFrom;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

/// Contract of a row-oriented feedback store
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Append one complete row to the category's sheet
    async fn append(&self, category: FeedbackCategory, row: Row) -> Result<(), StoreError>;

    /// Fetch every row of the category's sheet in append order
    async fn fetch_all(&self, category: FeedbackCategory) -> Result<Vec<Row>, StoreError>;
}

/// Process-local store, used in tests and for throwaway deployments
#[derive(Debug, Default)]
pub struct MemoryStore {
    sheets: Mutex<HashMap<FeedbackCategory, Vec<Row>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<FeedbackCategory, Vec<Row>>>, StoreError> {
        self.sheets
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl RowStore for MemoryStore {
    async fn append(&self, category: FeedbackCategory, row: Row) -> Result<(), StoreError> {
        self.lock()?.entry(category).or_default().push(row);
        Ok(())
    }

    async fn fetch_all(&self, category: FeedbackCategory) -> Result<Vec<Row>, StoreError> {
        Ok(self.lock()?.get(&category).cloned().unwrap_or_default())
    }
}

/// Directory-backed store with one JSON-lines file per category
///
/// Each row is written as a single line (`["2025-...","a@b.co",...]`) with one
/// `write_all` call while holding the store's write lock. An interrupted write can
/// still leave a torn last line: the next append starts on a fresh line, and
/// `fetch_all` logs and skips any line that does not parse.
pub struct FileStore {
    dir: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl FileStore {
    /// Open (and create if needed) a store directory
    ///
    /// # Arguments
    /// * `dir` - Directory that holds one `<category>.jsonl` file per sheet
    ///
    /// # Returns
    /// * `Result<FileStore, StoreError>` - The store, or the I/O error creating the directory
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(FileStore {
            dir,
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Path of a category's sheet file
    pub fn sheet_path(&self, category: FeedbackCategory) -> PathBuf {
        self.dir.join(format!("{}.jsonl", category.as_str()))
    }
}

#[async_trait]
impl RowStore for FileStore {
    async fn append(&self, category: FeedbackCategory, row: Row) -> Result<(), StoreError> {
        let mut line =
            serde_json::to_string(&row).map_err(|e| StoreError::Malformed(e.to_string()))?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let path = self.sheet_path(category);
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .await?;
        if file.metadata().await?.len() > 0 {
            file.seek(SeekFrom::End(-1)).await?;
            if file.read_u8().await? != b'\n' {
                log::warn!("{} ends in a torn row; starting a new line", path.display());
                line.insert(0, '\n');
            }
        }
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn fetch_all(&self, category: FeedbackCategory) -> Result<Vec<Row>, StoreError> {
        let path = self.sheet_path(category);
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            // Nothing submitted yet
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let rows = contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .filter_map(|(n, line)| match serde_json::from_str::<Row>(line) {
                Ok(row) => Some(row),
                Err(e) => {
                    log::warn!("Skipping unreadable row {}:{}: {e}", path.display(), n + 1);
                    None
                }
            })
            .collect();
        Ok(rows)
    }
}

/// Build the row store named by the configuration
///
/// # Arguments
/// * `config` - Store section of the process configuration
///
/// # Returns
/// * `Result<Arc<dyn RowStore>, FeedbackError>` - The store, or the reason it cannot be opened
pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn RowStore>, FeedbackError> {
    match config {
        StoreConfig::File { dir } => {
            log::info!("Using file store at {}", dir.display());
            Ok(Arc::new(FileStore::open(dir)?))
        }
        #[cfg(feature = "web")]
        StoreConfig::Sheets {
            spreadsheet_id,
            access_token,
        } => {
            log::info!("Using spreadsheet store {spreadsheet_id}");
            Ok(Arc::new(crate::sheets::SheetsStore::new(
                spreadsheet_id.as_str(),
                access_token.as_str(),
            )))
        }
        #[cfg(not(feature = "web"))]
        StoreConfig::Sheets { .. } => Err(FeedbackError::Configuration(
            "the spreadsheet store requires the 'web' feature".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[tokio::test]
    async fn memory_store_keeps_sheets_apart() {
        let store = MemoryStore::new();
        store.append(FeedbackCategory::Oral, row(&["t1", "a"])).await.unwrap();
        store.append(FeedbackCategory::Poster, row(&["t2", "b"])).await.unwrap();
        store.append(FeedbackCategory::Oral, row(&["t3", "c"])).await.unwrap();

        let oral = store.fetch_all(FeedbackCategory::Oral).await.unwrap();
        assert_eq!(oral, vec![row(&["t1", "a"]), row(&["t3", "c"])]);
        assert!(store.fetch_all(FeedbackCategory::Catering).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn file_store_round_trips_rows_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        assert!(store.fetch_all(FeedbackCategory::Overall).await.unwrap().is_empty());

        store
            .append(FeedbackCategory::Overall, row(&["t1", "comma, inside", ""]))
            .await
            .unwrap();
        store
            .append(FeedbackCategory::Overall, row(&["t2", "quote \" inside", "x"]))
            .await
            .unwrap();

        let rows = store.fetch_all(FeedbackCategory::Overall).await.unwrap();
        assert_eq!(
            rows,
            vec![row(&["t1", "comma, inside", ""]), row(&["t2", "quote \" inside", "x"])]
        );
        assert!(store.sheet_path(FeedbackCategory::Overall).ends_with("overall.jsonl"));
    }

    #[tokio::test]
    async fn file_store_skips_corrupt_lines() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        std::fs::write(store.sheet_path(FeedbackCategory::Poster), "[\"ok\"]\nnot json\n").unwrap();

        let rows = store.fetch_all(FeedbackCategory::Poster).await.unwrap();
        assert_eq!(rows, vec![row(&["ok"])]);
    }

    #[tokio::test]
    async fn append_after_a_torn_write_keeps_the_sheet_readable() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.append(FeedbackCategory::Overall, row(&["t1", "a"])).await.unwrap();

        let path = store.sheet_path(FeedbackCategory::Overall);
        let mut contents = std::fs::read_to_string(&path).unwrap();
        contents.push_str("[\"t2\",\"x");
        std::fs::write(&path, contents).unwrap();

        store.append(FeedbackCategory::Overall, row(&["t3", "c"])).await.unwrap();

        let rows = store.fetch_all(FeedbackCategory::Overall).await.unwrap();
        assert_eq!(rows, vec![row(&["t1", "a"]), row(&["t3", "c"])]);
        assert!(std::fs::read_to_string(&path).unwrap().ends_with("[\"t3\",\"c\"]\n"));
    }

    #[tokio::test]
    async fn open_store_builds_a_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&StoreConfig::File {
            dir: dir.path().join("sheets"),
        })
        .unwrap();
        store.append(FeedbackCategory::Exhibition, row(&["t"])).await.unwrap();
        assert!(dir.path().join("sheets").join("exhibition.jsonl").exists());
    }
}
