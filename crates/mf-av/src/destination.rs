//! Destination file lifecycle for engine outputs.
//!
//! A [`Destination`] clears the requested output path before the engine runs,
//! redirects the engine to a compatible file name when the requested extension
//! cannot be written directly, and renames the result into place afterwards.
//! [`copy_file`] is the no-engine fast path for passthrough mixes.

use std::path::{Path, PathBuf};

use mf_core::{Error, Result};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

/// Extensions the engine cannot mux by name, and the extension it should
/// write instead. The file is renamed back once the engine finishes.
const SUBSTITUTED_EXTENSIONS: &[(&str, &str)] = &[("m4r", "m4a")];

/// Output location of one engine run.
///
/// # Example
///
/// ```no_run
/// use mf_av::Destination;
/// use std::path::Path;
///
/// let dest = Destination::prepare(Path::new("/ringtones/intro.m4r")).unwrap();
/// assert!(dest.path().ends_with("intro.m4r.m4a"));
/// // ... engine writes to dest.path() ...
/// dest.finalize().unwrap();
/// ```
#[derive(Debug)]
pub struct Destination {
    requested: PathBuf,
    working: PathBuf,
}

impl Destination {
    /// Clear stale output at the requested path (and the working path, if it
    /// differs) so a failed run never leaves an old file looking current.
    ///
    /// # Errors
    ///
    /// [`Error::File`] if an existing file cannot be removed. A missing file
    /// is not an error.
    pub fn prepare(requested: &Path) -> Result<Self> {
        let working = working_path(requested);

        remove_if_exists(requested)?;
        if working != requested {
            remove_if_exists(&working)?;
        }

        Ok(Self {
            requested: requested.to_path_buf(),
            working,
        })
    }

    /// Where the engine should write.
    pub fn path(&self) -> &Path {
        &self.working
    }

    /// The path the caller asked for.
    pub fn requested(&self) -> &Path {
        &self.requested
    }

    /// Move the engine's output to the requested path and return it.
    ///
    /// # Errors
    ///
    /// [`Error::File`] if the rename fails.
    pub fn finalize(self) -> Result<PathBuf> {
        if self.working != self.requested {
            std::fs::rename(&self.working, &self.requested)
                .map_err(|e| Error::file(&self.working, e))?;
            tracing::debug!(
                "renamed {} -> {}",
                self.working.display(),
                self.requested.display()
            );
        }
        Ok(self.requested)
    }
}

fn working_path(requested: &Path) -> PathBuf {
    let ext = requested
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase());

    match SUBSTITUTED_EXTENSIONS
        .iter()
        .find(|(from, _)| ext.as_deref() == Some(*from))
    {
        Some((_, to)) => {
            let mut name = requested.as_os_str().to_os_string();
            name.push(".");
            name.push(to);
            PathBuf::from(name)
        }
        None => requested.to_path_buf(),
    }
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!("removed stale output {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::file(path, e)),
    }
}

/// Chunk size for [`copy_file`]; cancellation is checked between chunks.
const COPY_CHUNK: usize = 256 * 1024;

/// Copy `src` to `dst`, giving up when `cancel` fires.
///
/// The copy runs chunk by chunk on this task, so once it returns nothing is
/// still writing to `dst`. A cancelled copy removes the partial destination.
///
/// # Errors
///
/// - [`Error::File`] if reading `src` or writing `dst` fails.
/// - [`Error::Cancelled`] if `cancel` fired first.
pub async fn copy_file(src: &Path, dst: &Path, cancel: &CancellationToken) -> Result<()> {
    tracing::debug!("copy {} -> {}", src.display(), dst.display());

    if cancel.is_cancelled() {
        return Err(Error::copy_cancelled(dst));
    }

    let mut reader = File::open(src).await.map_err(|e| Error::file(src, e))?;
    let mut writer = File::create(dst).await.map_err(|e| Error::file(dst, e))?;

    let copied = copy_chunks(&mut reader, &mut writer, src, dst, cancel).await;

    // Wait for any write still in flight before the file can be removed.
    let flushed = writer.flush().await.map_err(|e| Error::file(dst, e));
    drop(writer);

    match copied.and_then(|done| flushed.map(|()| done)) {
        Ok(true) => Ok(()),
        Ok(false) => {
            if let Err(e) = remove_if_exists(dst) {
                tracing::warn!("failed to remove partial copy: {e}");
            }
            Err(Error::copy_cancelled(dst))
        }
        Err(e) => Err(e),
    }
}

/// Returns `false` if `cancel` fired before the end of `reader`.
async fn copy_chunks(
    reader: &mut File,
    writer: &mut File,
    src: &Path,
    dst: &Path,
    cancel: &CancellationToken,
) -> Result<bool> {
    let mut buf = vec![0u8; COPY_CHUNK];
    loop {
        if cancel.is_cancelled() {
            return Ok(false);
        }
        let n = reader.read(&mut buf).await.map_err(|e| Error::file(src, e))?;
        if n == 0 {
            return Ok(true);
        }
        writer
            .write_all(&buf[..n])
            .await
            .map_err(|e| Error::file(dst, e))?;
    }
}
