use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use flate2::{read::GzDecoder, write::GzEncoder, Compression};

use crate::raw::{ObjectStore, ObjectStoreError};

/// Object store keeping every object as a gzip-compressed file; keys are paths
/// relative to the store root.
#[derive(Debug)]
pub struct FileBackedObjectStore {
    base_dir: PathBuf,
}

impl FileBackedObjectStore {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.base_dir.join(key)
    }
}

fn open_error(key: &str, source: io::Error) -> ObjectStoreError {
    if source.kind() == io::ErrorKind::NotFound {
        ObjectStoreError::KeyNotFound {
            key: key.to_owned(),
        }
    } else {
        ObjectStoreError::Io {
            key: key.to_owned(),
            source,
        }
    }
}

/// Streams the file through the gzip decoder; only the decompressed output is buffered.
fn read_gzipped(path: &Path, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
    let file = File::open(path).map_err(|err| open_error(key, err))?;
    let mut decoder = GzDecoder::new(BufReader::new(file));
    let mut bytes = vec![];
    decoder
        .read_to_end(&mut bytes)
        .map_err(|source| match source.kind() {
            io::ErrorKind::InvalidInput
            | io::ErrorKind::InvalidData
            | io::ErrorKind::UnexpectedEof => ObjectStoreError::Decompression {
                key: key.to_owned(),
                source,
            },
            _ => ObjectStoreError::Io {
                key: key.to_owned(),
                source,
            },
        })?;
    Ok(bytes)
}

fn write_gzipped(path: &Path, value: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    encoder.write_all(value)?;
    encoder.finish()?.flush()
}

fn join_error(key: &str, err: tokio::task::JoinError) -> ObjectStoreError {
    ObjectStoreError::Io {
        key: key.to_owned(),
        source: io::Error::new(io::ErrorKind::Other, err),
    }
}

#[async_trait]
impl ObjectStore for FileBackedObjectStore {
    async fn get_raw(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        let path = self.path(key);
        let owned_key = key.to_owned();
        olaos_logs::debug!("Reading object `{key}` from {}", path.display());
        tokio::task::spawn_blocking(move || read_gzipped(&path, &owned_key))
            .await
            .map_err(|err| join_error(key, err))?
    }

    async fn put_raw(&self, key: &str, value: Vec<u8>) -> Result<(), ObjectStoreError> {
        let path = self.path(key);
        tokio::task::spawn_blocking(move || write_gzipped(&path, &value))
            .await
            .map_err(|err| join_error(key, err))?
            .map_err(|source| ObjectStoreError::Io {
                key: key.to_owned(),
                source,
            })
    }
}
