//! Whole-document JSON persistence with fs2 file locks.
//!
//! Readers take a shared lock, writers an exclusive one. Documents are always
//! rewritten in full; there is no append path.

use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{self, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Read a JSON document, falling back to `T::default()` when the file is
/// absent. Unreadable or malformed documents are logged and also yield the
/// default so a damaged store never takes the host down.
pub fn read_json_or_default<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    let mut f = match fs::OpenOptions::new().read(true).open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => return T::default(),
        Err(e) => {
            log::warn!("store: unable to open {:?}: {}", path, e);
            return T::default();
        }
    };
    let _ = f.lock_shared();
    let mut s = String::new();
    let read = f.read_to_string(&mut s);
    let _ = f.unlock();
    if let Err(e) = read {
        log::warn!("store: failed reading {:?}: {}", path, e);
        return T::default();
    }
    let cleaned = s.trim_start_matches('\0');
    if cleaned.trim().is_empty() {
        return T::default();
    }
    match serde_json::from_str(cleaned) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("store: ignoring malformed {:?}: {}", path, e);
            T::default()
        }
    }
}

/// Serialize `value` pretty-printed and replace the document at `path`.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir_all(dir)?;
        }
    }
    let data = serde_json::to_string_pretty(value)?;
    let mut f = fs::OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(path)?;
    f.lock_exclusive()?;
    let result = (|| {
        f.seek(SeekFrom::Start(0))?;
        f.set_len(0)?;
        f.write_all(data.as_bytes())?;
        f.flush()?;
        f.sync_all()
    })();
    let _ = f.unlock();
    result
}
