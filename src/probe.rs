//! Direct filesystem access to the backing mount.
//!
//! The probe is the second protocol of the dual-access contract: it
//! reads and mutates the object tree as plain files, with no HTTP in
//! between, so scenarios can assert that both views agree. All access is
//! read-or-rewrite of individual files; nothing here creates containers
//! or coordinates with the gateway.

use crate::errors::{Error, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

/// Maximum directory depth a traversal will follow before treating the
/// hierarchy as malformed.
pub const MAX_DEPTH: usize = 10;

/// Relative paths found by [`MountProbe::walk`], split by kind.
#[derive(Debug, Default)]
pub struct WalkReport {
    /// Files, as container-relative paths with `/` separators.
    pub files: Vec<String>,
    /// Directories, same form.
    pub dirs: Vec<String>,
}

/// A view of one account's directory on the mount.
#[derive(Debug, Clone)]
pub struct MountProbe {
    root: PathBuf,
}

impl MountProbe {
    /// `root` is the account directory: `<mount_root>/<device>`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The account directory this probe reads.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_of(&self, container: &str, rel: &str) -> PathBuf {
        let mut path = self.root.join(container);
        for segment in rel.split('/').filter(|s| !s.is_empty()) {
            path.push(segment);
        }
        path
    }

    /// Recursively enumerate files and directories under a container.
    /// Traversal deeper than [`MAX_DEPTH`] levels is a hard error.
    pub fn walk(&self, container: &str) -> Result<WalkReport> {
        let base = self.root.join(container);
        let mut report = WalkReport::default();
        self.recurse(&base, &base, 0, &mut report)?;
        report.files.sort();
        report.dirs.sort();
        Ok(report)
    }

    fn recurse(
        &self,
        base: &Path,
        dir: &Path,
        depth: usize,
        report: &mut WalkReport,
    ) -> Result<()> {
        if depth > MAX_DEPTH {
            return Err(Error::TooDeep {
                path: dir.to_path_buf(),
            });
        }
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let rel = match path.strip_prefix(base) {
                Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
                Err(_) => continue,
            };
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                self.recurse(base, &path, depth + 1, report)?;
                report.dirs.push(rel);
            } else if file_type.is_file() {
                report.files.push(rel);
            }
            // Anything else (sockets, fifos) is not part of the object tree.
        }
        Ok(())
    }

    /// Read a file by its container-relative path.
    pub fn read(&self, container: &str, rel: &str) -> Result<Vec<u8>> {
        Ok(fs::read(self.path_of(container, rel))?)
    }

    /// MD5 of a file's content, lowercase hex, for comparison against the
    /// HTTP ETag.
    pub fn md5(&self, container: &str, rel: &str) -> Result<String> {
        let data = self.read(container, rel)?;
        Ok(format!("{:x}", md5::compute(&data)))
    }

    /// Append bytes to a file on the mount, bypassing the gateway.
    pub fn append(&self, container: &str, rel: &str, data: &[u8]) -> Result<()> {
        let mut file = OpenOptions::new()
            .append(true)
            .open(self.path_of(container, rel))?;
        file.write_all(data)?;
        Ok(())
    }

    /// Truncate a file on the mount and rewrite it with `data`.
    pub fn rewrite(&self, container: &str, rel: &str, data: &[u8]) -> Result<()> {
        fs::write(self.path_of(container, rel), data)?;
        Ok(())
    }
}
