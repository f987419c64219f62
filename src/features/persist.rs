use anyhow::Context;
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

const TMP_SUFFIX: &str = "tmp";

/// Reads a JSON document from `path`.
///
/// A missing file or malformed content yields `T::default()`, so first run and
/// a corrupt file both start empty. Any other I/O failure is returned.
pub(crate) fn load_or_default<T>(path: &Path) -> anyhow::Result<T>
where
    T: DeserializeOwned + Default,
{
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("{} does not exist, starting empty", path.display());
            return Ok(T::default());
        }
        Err(e) => return Err(e).with_context(|| format!("Unable to read {}", path.display())),
    };

    match serde_json::from_slice(&data) {
        Ok(value) => Ok(value),
        Err(e) => {
            warn!("{} is malformed ({e}), starting empty", path.display());
            Ok(T::default())
        }
    }
}

/// Overwrites `path` with `value` as pretty JSON. The document is written to a
/// sibling temp file and renamed into place.
pub(crate) fn save<T>(path: &Path, value: &T) -> anyhow::Result<()>
where
    T: Serialize + ?Sized,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Unable to create {}", parent.display()))?;
    }

    let tmp = tmp_path(path);
    let file =
        File::create(&tmp).with_context(|| format!("Unable to create {}", tmp.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("Unable to serialize {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Unable to write {}", tmp.display()))?;
    drop(writer);

    fs::rename(&tmp, path).with_context(|| format!("Unable to replace {}", path.display()))?;
    debug!("saved {}", path.display());
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(TMP_SUFFIX);
    path.with_file_name(name)
}
