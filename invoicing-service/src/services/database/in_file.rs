use async_trait::async_trait;
use chrono::NaiveDate;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use super::{search, Database, StoreError};
use crate::models::Invoice;
use crate::services::metrics::STORE_OPERATION_DURATION;

/// Flat-file invoice store.
///
/// Invoices live one JSON document per line in `database_file`; the last
/// assigned id is kept as decimal text in `id_file`. Nothing is cached:
/// every read re-loads the data file. Mutations in this process are
/// serialized by `write_lock`; other processes sharing the files are not
/// coordinated with.
pub struct InFileDatabase {
    database_file: PathBuf,
    id_file: PathBuf,
    write_lock: Mutex<()>,
}

impl InFileDatabase {
    pub fn new(database_file_path: &str, id_file_path: &str) -> Result<Self, StoreError> {
        if database_file_path.is_empty() {
            return Err(StoreError::InvalidPath("Database filepath can't be empty"));
        }
        if id_file_path.is_empty() {
            return Err(StoreError::InvalidPath("ID filepath can't be empty"));
        }

        let db = Self {
            database_file: PathBuf::from(database_file_path),
            id_file: PathBuf::from(id_file_path),
            write_lock: Mutex::new(()),
        };
        if db.id_file == db.database_file || db.id_file == db.rewrite_file() {
            return Err(StoreError::InvalidPath(
                "ID filepath must differ from the database files",
            ));
        }
        Ok(db)
    }

    pub fn database_file(&self) -> &Path {
        &self.database_file
    }

    pub fn id_file(&self) -> &Path {
        &self.id_file
    }

    /// Scratch file used while rewriting: `invoices.jsonl` -> `invoices.jsonl.tmp`.
    fn rewrite_file(&self) -> PathBuf {
        let mut name = self.database_file.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }

    async fn read_invoices(&self) -> Result<Vec<Invoice>, StoreError> {
        let contents = match fs::read_to_string(&self.database_file).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(StoreError::from))
            .collect()
    }

    /// Read-increment-write of the id counter. Caller holds `write_lock`.
    async fn next_id(&self) -> Result<u64, StoreError> {
        let last_id = match fs::read_to_string(&self.id_file).await {
            Ok(contents) => {
                let trimmed = contents.trim();
                if trimmed.is_empty() {
                    0
                } else {
                    trimmed
                        .parse::<u64>()
                        .map_err(|_| StoreError::CorruptIdFile(trimmed.to_string()))?
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => 0,
            Err(e) => return Err(e.into()),
        };

        let next_id = last_id
            .checked_add(1)
            .ok_or(StoreError::IdsExhausted(last_id))?;
        ensure_parent(&self.id_file).await?;
        fs::write(&self.id_file, next_id.to_string()).await?;
        Ok(next_id)
    }

    async fn append_invoice(&self, invoice: &Invoice) -> Result<(), StoreError> {
        let mut line = serde_json::to_string(invoice)?;
        line.push('\n');

        ensure_parent(&self.database_file).await?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.database_file)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    /// Replace the data file with `invoices` via a temporary sibling file.
    async fn write_invoices(&self, invoices: &[Invoice]) -> Result<(), StoreError> {
        let mut contents = String::new();
        for invoice in invoices {
            contents.push_str(&serde_json::to_string(invoice)?);
            contents.push('\n');
        }

        ensure_parent(&self.database_file).await?;
        let tmp = self.rewrite_file();
        fs::write(&tmp, contents).await?;
        fs::rename(&tmp, &self.database_file).await?;
        Ok(())
    }
}

async fn ensure_parent(path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    Ok(())
}

/// A missing file is fine (it is created on first save); anything else at the
/// path must be a regular file we can open.
async fn check_readable(path: &Path) -> Result<(), StoreError> {
    match fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => Err(std::io::Error::new(
            ErrorKind::InvalidInput,
            format!("{} is a directory", path.display()),
        )
        .into()),
        Ok(_) => {
            fs::File::open(path).await?;
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl Database for InFileDatabase {
    #[instrument(skip(self, invoice), fields(identifier = ?invoice.identifier))]
    async fn save_invoice(&self, invoice: &Invoice) -> Result<u64, StoreError> {
        let timer = STORE_OPERATION_DURATION
            .with_label_values(&["save"])
            .start_timer();
        let _guard = self.write_lock.lock().await;

        // An id is consumed even if the append below fails.
        let id = self.next_id().await?;
        let to_write = invoice.clone().with_id(id);
        self.append_invoice(&to_write).await?;

        timer.observe_duration();
        info!(invoice_id = id, "Invoice saved");
        Ok(id)
    }

    #[instrument(skip(self, invoice), fields(invoice_id = ?invoice.id))]
    async fn update_invoice(&self, invoice: &Invoice) -> Result<(), StoreError> {
        let id = invoice.id.ok_or(StoreError::MissingId)?;
        let timer = STORE_OPERATION_DURATION
            .with_label_values(&["update"])
            .start_timer();
        let _guard = self.write_lock.lock().await;

        let mut invoices = self.read_invoices().await?;
        let slot = invoices
            .iter_mut()
            .find(|stored| stored.id == Some(id))
            .ok_or(StoreError::NotFound(id))?;
        *slot = invoice.clone();
        self.write_invoices(&invoices).await?;

        timer.observe_duration();
        info!(invoice_id = id, "Invoice updated");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove_invoice(&self, id: u64) -> Result<(), StoreError> {
        let timer = STORE_OPERATION_DURATION
            .with_label_values(&["remove"])
            .start_timer();
        let _guard = self.write_lock.lock().await;

        let mut invoices = self.read_invoices().await?;
        let before = invoices.len();
        invoices.retain(|stored| stored.id != Some(id));
        if invoices.len() == before {
            return Err(StoreError::NotFound(id));
        }
        self.write_invoices(&invoices).await?;

        timer.observe_duration();
        info!(invoice_id = id, "Invoice removed");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(&self, id: u64) -> Result<Option<Invoice>, StoreError> {
        let timer = STORE_OPERATION_DURATION
            .with_label_values(&["get"])
            .start_timer();
        let invoice = self
            .read_invoices()
            .await?
            .into_iter()
            .find(|stored| stored.id == Some(id));
        timer.observe_duration();
        Ok(invoice)
    }

    #[instrument(skip(self, search_params))]
    async fn find(
        &self,
        search_params: Option<&Invoice>,
        issued_date_from: Option<NaiveDate>,
        issued_date_to: Option<NaiveDate>,
    ) -> Result<Vec<Invoice>, StoreError> {
        let timer = STORE_OPERATION_DURATION
            .with_label_values(&["find"])
            .start_timer();
        let invoices = self.read_invoices().await?;
        let scanned = invoices.len();
        let found = search::filter_invoices(invoices, search_params);
        timer.observe_duration();

        debug!(
            scanned,
            found = found.len(),
            ?issued_date_from,
            ?issued_date_to,
            "Invoice search completed"
        );
        Ok(found)
    }

    #[instrument(skip(self))]
    async fn get_all(&self) -> Result<Vec<Invoice>, StoreError> {
        let timer = STORE_OPERATION_DURATION
            .with_label_values(&["get_all"])
            .start_timer();
        let invoices = self.read_invoices().await?;
        timer.observe_duration();
        Ok(invoices)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        ensure_parent(&self.database_file).await?;
        ensure_parent(&self.id_file).await?;
        check_readable(&self.database_file).await?;
        check_readable(&self.id_file).await?;
        Ok(())
    }
}
