use std::io::{Cursor, Read};

use log::debug;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::rules::errors::Error;
use crate::rules::Result;

/// Reads the UTF-8 text of `entry` from a zipped pipeline artifact.
pub fn read_entry(archive: &[u8], entry: &str) -> Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(archive))?;
    debug!("Artifact archive holds {} entries", archive.len());
    let mut file = match archive.by_name(entry) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => {
            return Err(Error::InvalidArchive(format!(
                "artifact does not contain `{entry}`"
            )))
        }
        Err(e) => return Err(e.into()),
    };
    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| Error::InvalidArchive(format!("`{entry}` is not readable text: {e}")))?;
    Ok(content)
}
