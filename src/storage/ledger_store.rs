use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use csv::StringRecord;

use crate::domain::{parse_canonical_cents, parse_canonical_date, Entry, LedgerContents};

use super::{LedgerConfig, StorageError, LEDGER_HEADER};

/// Append-only CSV ledger. Owns the file location and its schema.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    config: LedgerConfig,
}

impl LedgerStore {
    pub fn new(config: LedgerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Full path of the ledger file.
    pub fn path(&self) -> PathBuf {
        self.config.ledger_path()
    }

    /// Make sure the data directory and the ledger file exist.
    /// A newly created (or zero-byte) file gets the header record; an existing
    /// ledger is never truncated.
    pub fn ensure_ready(&self) -> Result<(), StorageError> {
        let dir = self.config.data_dir();
        fs::create_dir_all(dir)
            .map_err(|err| StorageError::io("create data directory", dir, err))?;

        let path = self.path();
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => write_header(&mut file, &path),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                let len = fs::metadata(&path)
                    .map_err(|err| StorageError::io("inspect", &path, err))?
                    .len();
                if len == 0 {
                    let mut file = OpenOptions::new()
                        .append(true)
                        .open(&path)
                        .map_err(|err| StorageError::io("open", &path, err))?;
                    write_header(&mut file, &path)?;
                }
                Ok(())
            }
            Err(err) => Err(StorageError::io("create", &path, err)),
        }
    }

    /// Append one entry and flush it to disk before returning.
    /// On failure the file is cut back to its previous length.
    pub fn append(&self, entry: &Entry) -> Result<(), StorageError> {
        self.ensure_ready()?;

        let mut record = encode_record(entry)?;
        let path = self.path();
        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .open(&path)
            .map_err(|err| StorageError::io("open", &path, err))?;

        let len_before = file
            .metadata()
            .map_err(|err| StorageError::io("inspect", &path, err))?
            .len();

        // A hand-edited ledger may have lost its final line terminator
        if len_before > 0
            && !ends_with_newline(&mut file, len_before)
                .map_err(|err| StorageError::io("read", &path, err))?
        {
            record.insert(0, b'\n');
        }

        if let Err(err) = file.write_all(&record).and_then(|()| file.sync_data()) {
            return Err(match file.set_len(len_before) {
                Ok(()) => StorageError::io("append to", &path, err),
                Err(rollback) => StorageError::PartialAppend {
                    path,
                    source: err,
                    rollback,
                },
            });
        }

        Ok(())
    }

    /// Read every entry in file order.
    ///
    /// Returns [`LedgerContents::Missing`] when the ledger was never created.
    /// Any record that fails to decode aborts the whole read with
    /// [`StorageError::Corrupt`].
    pub fn read_all(&self) -> Result<LedgerContents, StorageError> {
        let path = self.path();
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(LedgerContents::Missing);
            }
            Err(err) => return Err(StorageError::io("open", &path, err)),
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(BufReader::new(file));
        let mut records = reader.records();

        match records.next() {
            None => return Ok(LedgerContents::Entries(Vec::new())),
            Some(header) => {
                let header = header.map_err(|err| read_error(&path, err))?;
                if !header.iter().eq(LEDGER_HEADER) {
                    return Err(StorageError::Corrupt {
                        line: 1,
                        reason: format!(
                            "unexpected header '{}', expected '{}'",
                            header.iter().collect::<Vec<_>>().join(","),
                            LEDGER_HEADER.join(",")
                        ),
                    });
                }
            }
        }

        let mut entries = Vec::new();
        for result in records {
            let record = result.map_err(|err| read_error(&path, err))?;
            entries.push(decode_entry(&record)?);
        }

        Ok(LedgerContents::Entries(entries))
    }

    /// Modification time of the ledger file, if it exists.
    pub fn last_modified(&self) -> Result<Option<DateTime<Local>>, StorageError> {
        let path = self.path();
        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StorageError::io("inspect", &path, err)),
        };
        let modified = metadata
            .modified()
            .map_err(|err| StorageError::io("read modification time of", &path, err))?;
        Ok(Some(DateTime::<Local>::from(modified)))
    }
}

fn encode_fields<I, T>(fields: I) -> Result<Vec<u8>, StorageError>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(fields)?;
    writer
        .into_inner()
        .map_err(|err| StorageError::Encode(err.into_error().into()))
}

fn encode_record(entry: &Entry) -> Result<Vec<u8>, StorageError> {
    let date = entry.date_string();
    let amount = entry.amount_string();
    encode_fields([
        date.as_str(),
        amount.as_str(),
        entry.category.as_str(),
        entry.note.as_str(),
    ])
}

fn write_header(file: &mut File, path: &Path) -> Result<(), StorageError> {
    let header = encode_fields(LEDGER_HEADER)?;
    file.write_all(&header)
        .and_then(|()| file.sync_data())
        .map_err(|err| StorageError::io("write header to", path, err))
}

fn ends_with_newline(file: &mut File, len: u64) -> io::Result<bool> {
    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

fn read_error(path: &Path, err: csv::Error) -> StorageError {
    let line = err.position().map_or(0, |pos| pos.line());
    let reason = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(source) => StorageError::io("read", path, source),
        _ => StorageError::Corrupt { line, reason },
    }
}

fn decode_entry(record: &StringRecord) -> Result<Entry, StorageError> {
    let line = record.position().map_or(0, |pos| pos.line());
    let corrupt = |reason: String| StorageError::Corrupt { line, reason };

    if record.len() != LEDGER_HEADER.len() {
        return Err(corrupt(format!(
            "expected {} fields, found {}",
            LEDGER_HEADER.len(),
            record.len()
        )));
    }

    let date = parse_canonical_date(&record[0])
        .ok_or_else(|| corrupt(format!("malformed date '{}'", &record[0])))?;

    let amount_cents = parse_canonical_cents(&record[1])
        .ok_or_else(|| corrupt(format!("malformed amount '{}'", &record[1])))?;

    let category = record[2].trim();
    if category.is_empty() {
        return Err(corrupt("empty category".to_string()));
    }

    Ok(Entry {
        date,
        amount_cents,
        category: category.to_string(),
        note: record[3].trim().to_string(),
    })
}
