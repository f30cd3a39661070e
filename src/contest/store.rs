use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use super::domain::{SubmissionRecord, VoteCategory, VoteTally};

const STORE_FILE: &str = "submissions.csv";

/// Column order of the durable file. The header row is authoritative for
/// readers; rows are written in this order.
const COLUMNS: [&str; 12] = [
    "ts",
    "equipo",
    "participantes",
    "departamento",
    "hashtag",
    "lema",
    "dato",
    "filename",
    "ip",
    "votes_creatividad",
    "votes_mensaje",
    "votes_equipo",
];

static STAGING_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Durable store for submission records, backed by a single CSV file.
///
/// Every mutation runs under `write_lock` and rewrites the whole file through
/// an atomic rename, so concurrent increments are never lost and readers
/// never observe a half-written file. Reads take no lock.
pub struct SubmissionStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("submission {0} already exists")]
    Duplicate(String),
    #[error("submission {0} not found")]
    NotFound(String),
    #[error("submission store unavailable: {0}")]
    Unavailable(String),
    #[error("stored submissions are malformed: {0}")]
    Malformed(String),
}

impl StoreError {
    fn io(err: std::io::Error) -> Self {
        Self::Unavailable(err.to_string())
    }
}

impl From<csv::Error> for StoreError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            Self::Unavailable(err.to_string())
        } else {
            Self::Malformed(err.to_string())
        }
    }
}

impl SubmissionStore {
    /// Open the store rooted at `data_dir`, creating the directory and an
    /// empty file with the canonical header when absent.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir).map_err(StoreError::io)?;

        let store = Self {
            path: data_dir.join(STORE_FILE),
            write_lock: Mutex::new(()),
        };
        store.ensure_file()?;
        Ok(store)
    }

    /// Read the full record set as of this call, in insertion order. Each
    /// call re-reads the file; no cursor state survives between calls.
    pub fn load_all(&self) -> Result<Vec<SubmissionRecord>, StoreError> {
        self.ensure_file()?;

        let file = File::open(&self.path).map_err(StoreError::io)?;
        let mut reader = csv::Reader::from_reader(file);
        let mut records = Vec::new();
        for row in reader.deserialize::<StoredRow>() {
            records.push(row?.into());
        }
        Ok(records)
    }

    /// Insert a new record. The stored filename must be unique.
    pub fn append(&self, record: SubmissionRecord) -> Result<(), StoreError> {
        let _guard = self.write_guard()?;

        let mut records = self.load_all()?;
        if records
            .iter()
            .any(|existing| existing.filename == record.filename)
        {
            return Err(StoreError::Duplicate(record.filename));
        }

        debug!(filename = %record.filename, "appending submission");
        records.push(record);
        self.replace_with(&records)
    }

    /// Increment one category counter by exactly one and persist the result,
    /// returning the updated record.
    pub fn update_vote(
        &self,
        filename: &str,
        category: VoteCategory,
    ) -> Result<SubmissionRecord, StoreError> {
        let _guard = self.write_guard()?;

        let mut records = self.load_all()?;
        let target = records
            .iter_mut()
            .find(|record| record.filename == filename)
            .ok_or_else(|| StoreError::NotFound(filename.to_string()))?;

        target.votes = target.votes.incremented(category);
        let updated = target.clone();
        self.replace_with(&records)?;
        Ok(updated)
    }

    fn write_guard(&self) -> Result<MutexGuard<'_, ()>, StoreError> {
        self.write_lock
            .lock()
            .map_err(|_| StoreError::Unavailable("store write lock poisoned".to_string()))
    }

    fn ensure_file(&self) -> Result<(), StoreError> {
        if self.path.is_file() {
            return Ok(());
        }
        self.replace_with(&[])
    }

    /// Serialize the full set next to the live file, then rename over it, so
    /// readers see either the old contents or the new, never a mix. On any
    /// failure the live file is untouched and the mutation is discarded.
    fn replace_with(&self, records: &[SubmissionRecord]) -> Result<(), StoreError> {
        let sequence = STAGING_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let staging = self
            .path
            .with_extension(format!("csv.staging-{sequence}"));

        let result = self.write_records(&staging, records).and_then(|()| {
            fs::rename(&staging, &self.path).map_err(StoreError::io)
        });
        if result.is_err() {
            let _ = fs::remove_file(&staging);
        }
        result
    }

    fn write_records(&self, staging: &Path, records: &[SubmissionRecord]) -> Result<(), StoreError> {
        let file = File::create(staging).map_err(StoreError::io)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        writer.write_record(COLUMNS)?;
        for record in records {
            writer.serialize(StoredRow::from(record))?;
        }
        writer.flush().map_err(StoreError::io)?;

        let file = writer
            .into_inner()
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        file.sync_all().map_err(StoreError::io)
    }
}

/// Serde mapping between a record and one row of the durable file. Counter
/// columns that are missing or malformed read as zero.
#[derive(Debug, Serialize, Deserialize)]
struct StoredRow {
    ts: String,
    equipo: String,
    #[serde(default)]
    participantes: String,
    #[serde(default)]
    departamento: String,
    #[serde(default)]
    hashtag: String,
    #[serde(default)]
    lema: String,
    #[serde(default)]
    dato: String,
    filename: String,
    #[serde(default)]
    ip: String,
    #[serde(default, deserialize_with = "count_or_zero")]
    votes_creatividad: u64,
    #[serde(default, deserialize_with = "count_or_zero")]
    votes_mensaje: u64,
    #[serde(default, deserialize_with = "count_or_zero")]
    votes_equipo: u64,
}

impl From<&SubmissionRecord> for StoredRow {
    fn from(record: &SubmissionRecord) -> Self {
        Self {
            ts: record.submitted_at.clone(),
            equipo: record.team.clone(),
            participantes: record.participants.clone(),
            departamento: record.department.clone(),
            hashtag: record.hashtag.clone(),
            lema: record.slogan.clone(),
            dato: record.fact.clone(),
            filename: record.filename.clone(),
            ip: record.origin.clone(),
            votes_creatividad: record.votes.creatividad,
            votes_mensaje: record.votes.mensaje,
            votes_equipo: record.votes.equipo,
        }
    }
}

impl From<StoredRow> for SubmissionRecord {
    fn from(row: StoredRow) -> Self {
        Self {
            submitted_at: row.ts,
            team: row.equipo,
            participants: row.participantes,
            department: row.departamento,
            hashtag: row.hashtag,
            slogan: row.lema,
            fact: row.dato,
            filename: row.filename,
            origin: row.ip,
            votes: VoteTally {
                creatividad: row.votes_creatividad,
                mensaje: row.votes_mensaje,
                equipo: row.votes_equipo,
            },
        }
    }
}

fn count_or_zero<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(0))
}
