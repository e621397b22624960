use super::ExtractError;
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// Text of the first file entry (archive order) whose name ends in `.txt`.
pub fn first_text_entry(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() || !entry.name().ends_with(".txt") {
            continue;
        }
        log::debug!("reading zip entry {}", entry.name());
        let mut buf = Vec::new();
        entry.read_to_end(&mut buf)?;
        return Ok(String::from_utf8(buf)?);
    }
    Err(ExtractError::NoTextEntry)
}
