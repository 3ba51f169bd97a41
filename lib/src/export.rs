//! Writing documents for the renderer.
use crate::{check_extension, file_exists};
use qu::ick_use::*;
use serde::Serialize;
use std::{
    fs,
    io::{BufWriter, Write},
    path::Path,
};

/// Write `value` as pretty JSON, creating parent directories as needed.
///
/// An existing file is replaced (with a warning).
pub fn write_json<T: Serialize + ?Sized>(path: impl AsRef<Path>, value: &T) -> Result {
    fn inner<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result {
        check_extension(path, "json")?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("creating output directory")?;
        }
        if file_exists(path)? {
            event!(Level::WARN, "overwriting \"{}\"", path.display());
        }
        let mut file = BufWriter::new(fs::File::create(path)?);
        serde_json::to_writer_pretty(&mut file, value).context("serializing output")?;
        file.flush()?;
        Ok(())
    }
    let path = path.as_ref();
    inner(path, value).with_context(|| format!("writing \"{}\"", path.display()))
}
