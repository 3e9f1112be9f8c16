//! GatewayStore — Swift-flavored container/object operations backed by a
//! plain directory tree. The tree layout is the mount layout: payloads
//! live at `root/{container}/{key}` with no sharding, so the filesystem
//! view *is* the object tree. Length, ETag, and mtime are derived from
//! the filesystem at request time; only content types, manifest
//! prefixes, and versions locations live in an in-memory side table
//! (objects written out-of-band get defaults).

use crate::collate::Collation;
use crate::models::{ContainerInfo, ContainerSummary, ObjectInfo, ObjectRecord};
use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use futures::{Stream, StreamExt, pin_mut};
use md5::Context;
use std::{
    collections::HashMap,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicU64, Ordering},
    },
};
use thiserror::Error;
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::debug;
use uuid::Uuid;

const MAX_OBJECT_KEY_LEN: usize = 1024;
const MAX_CONTAINER_NAME_LEN: usize = 255;

/// Maximum directory depth a listing walk will follow.
pub const MAX_LIST_DEPTH: usize = 10;

const DIRECTORY_CONTENT_TYPE: &str = "application/directory";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("container `{0}` not found")]
    ContainerNotFound(String),
    #[error("container `{0}` is not empty")]
    ContainerNotEmpty(String),
    #[error("container `{name}` invalid: {reason}")]
    InvalidContainerName { name: String, reason: String },
    #[error("object `{key}` not found in container `{container}`")]
    ObjectNotFound { container: String, key: String },
    #[error("directory marker `{0}` still has children")]
    DirectoryNotEmpty(String),
    #[error("invalid object key")]
    InvalidObjectKey,
    #[error("versions container `{0}` not found")]
    VersionsContainerMissing(String),
    #[error("listing recursion exceeded {MAX_LIST_DEPTH} levels")]
    TooDeep,
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Per-object metadata the filesystem cannot carry.
#[derive(Default)]
struct Meta {
    /// `(container, key)` → content type declared at PUT time.
    content_types: HashMap<(String, String), String>,
    /// `(container, key)` → `container/prefix` from `X-Object-Manifest`.
    manifests: HashMap<(String, String), String>,
    /// Container → versions container name from `X-Versions-Location`.
    versions_locations: HashMap<String, String>,
}

/// One entry found by a container walk.
struct WalkEntry {
    key: String,
    path: PathBuf,
    is_dir: bool,
    len: u64,
    modified: DateTime<Utc>,
}

/// How a GET should produce the object's bytes.
pub enum ReadPlan {
    /// Zero-length body (directory marker, manifest with no segments).
    Empty,
    /// Stream one file.
    Whole(PathBuf),
    /// Concatenate these files in order.
    Segments(Vec<PathBuf>),
}

/// GatewayStore provides the Swift-shaped operations the surface needs:
/// container create/delete/stat, listings with `path`/`prefix`, streamed
/// object writes, manifest-aware reads, and version retention.
#[derive(Clone)]
pub struct GatewayStore {
    /// The account directory; containers are its immediate children.
    root: PathBuf,
    collation: Collation,
    meta: Arc<Mutex<Meta>>,
    version_seq: Arc<AtomicU64>,
}

impl GatewayStore {
    /// `root` is the account directory, `<data_root>/<account>`. It must
    /// exist before the first request.
    pub fn new(root: impl Into<PathBuf>, collation: Collation) -> Self {
        Self {
            root: root.into(),
            collation,
            meta: Arc::new(Mutex::new(Meta::default())),
            version_seq: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn meta_lock(&self) -> MutexGuard<'_, Meta> {
        self.meta.lock().unwrap_or_else(|err| err.into_inner())
    }

    /// Basic key validation to avoid trivial path traversal vectors.
    fn ensure_key_safe(key: &str) -> StoreResult<()> {
        if key.is_empty() || key.len() > MAX_OBJECT_KEY_LEN {
            return Err(StoreError::InvalidObjectKey);
        }
        if key.starts_with('/') || key.ends_with('/') || key.contains("..") {
            return Err(StoreError::InvalidObjectKey);
        }
        if key
            .bytes()
            .any(|b| b.is_ascii_control() || b == b'\\' || b == b'\0')
        {
            return Err(StoreError::InvalidObjectKey);
        }
        Ok(())
    }

    /// Container names map to single directories, so they may not carry
    /// path structure of their own.
    fn ensure_container_name_safe(name: &str) -> StoreResult<()> {
        let reason = if name.is_empty() {
            Some("cannot be empty")
        } else if name.len() > MAX_CONTAINER_NAME_LEN {
            Some("longer than 255 characters")
        } else if name.contains('/') {
            Some("cannot contain `/`")
        } else if name == "." || name == ".." {
            Some("cannot be a dot segment")
        } else if name.bytes().any(|b| b.is_ascii_control() || b == b'\\') {
            Some("contains control characters")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(StoreError::InvalidContainerName {
                name: name.to_string(),
                reason: reason.into(),
            }),
            None => Ok(()),
        }
    }

    fn container_root(&self, container: &str) -> PathBuf {
        self.root.join(container)
    }

    /// Payload path for a key; each `/` segment becomes a directory level.
    fn object_path(&self, container: &str, key: &str) -> PathBuf {
        let mut path = self.container_root(container);
        for segment in key.split('/') {
            path.push(segment);
        }
        path
    }

    /// Create the container directory. Returns `true` when it was
    /// created, `false` when it already existed.
    pub async fn create_container(
        &self,
        name: &str,
        versions_location: Option<String>,
    ) -> StoreResult<bool> {
        Self::ensure_container_name_safe(name)?;
        let root = self.container_root(name);
        let created = !fs::try_exists(&root).await?;
        fs::create_dir_all(&root).await?;
        if let Some(location) = versions_location {
            Self::ensure_container_name_safe(&location)?;
            self.meta_lock()
                .versions_locations
                .insert(name.to_string(), location);
        }
        Ok(created)
    }

    /// Remove an empty container.
    pub async fn delete_container(&self, name: &str) -> StoreResult<()> {
        Self::ensure_container_name_safe(name)?;
        let root = self.container_root(name);
        if !fs::try_exists(&root).await? {
            return Err(StoreError::ContainerNotFound(name.to_string()));
        }
        let mut entries = fs::read_dir(&root).await?;
        if entries.next_entry().await?.is_some() {
            return Err(StoreError::ContainerNotEmpty(name.to_string()));
        }
        fs::remove_dir(&root).await?;

        let mut meta = self.meta_lock();
        meta.versions_locations.remove(name);
        meta.content_types.retain(|(c, _), _| c != name);
        meta.manifests.retain(|(c, _), _| c != name);
        Ok(())
    }

    /// Containers in listing order with their object counts.
    pub async fn list_containers(&self) -> StoreResult<Vec<ContainerSummary>> {
        let mut names = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        self.collation.sort(&mut names);

        let mut summaries = Vec::with_capacity(names.len());
        for name in names {
            let info = self.container_stat(&name).await?;
            summaries.push(ContainerSummary {
                name,
                count: info.object_count,
                bytes: info.bytes_used,
            });
        }
        Ok(summaries)
    }

    /// Object count and byte total. Counts files only: for a live
    /// container that is the set of current objects, for a versions
    /// container the set of retained versions (its prefix directories
    /// are bookkeeping, not objects).
    pub async fn container_stat(&self, name: &str) -> StoreResult<ContainerInfo> {
        let entries = self.walk_container(name).await?;
        let mut info = ContainerInfo {
            object_count: 0,
            bytes_used: 0,
        };
        for entry in entries.iter().filter(|e| !e.is_dir) {
            info.object_count += 1;
            info.bytes_used += entry.len;
        }
        Ok(info)
    }

    /// Listing with Swift's `path` (direct children of one hierarchy
    /// level) and `prefix` filters, sorted by locale collation.
    pub async fn list_objects(
        &self,
        container: &str,
        path: Option<&str>,
        prefix: Option<&str>,
    ) -> StoreResult<Vec<ObjectRecord>> {
        let entries = self.walk_container(container).await?;
        let mut records = Vec::new();
        for entry in entries {
            if let Some(path) = path {
                if parent_of(&entry.key) != path {
                    continue;
                }
            }
            if let Some(prefix) = prefix {
                if !entry.key.starts_with(prefix) {
                    continue;
                }
            }
            records.push(self.record_for(container, entry).await?);
        }
        records.sort_by(|a, b| self.collation.compare(&a.name, &b.name));
        Ok(records)
    }

    async fn record_for(&self, container: &str, entry: WalkEntry) -> StoreResult<ObjectRecord> {
        let hash = if entry.is_dir {
            empty_md5()
        } else {
            file_md5(&entry.path).await?
        };
        Ok(ObjectRecord {
            content_type: self.content_type_of(container, &entry.key, entry.is_dir),
            name: entry.key,
            hash,
            bytes: entry.len,
            // Listing records use Swift's RFC 3339 microsecond form;
            // GET/HEAD stamp `Last-Modified` as an RFC 2822 HTTP date.
            last_modified: entry.modified.to_rfc3339_opts(SecondsFormat::Micros, true),
        })
    }

    fn content_type_of(&self, container: &str, key: &str, is_dir: bool) -> String {
        if let Some(ct) = self
            .meta_lock()
            .content_types
            .get(&(container.to_string(), key.to_string()))
        {
            return ct.clone();
        }
        if is_dir {
            DIRECTORY_CONTENT_TYPE.to_string()
        } else {
            DEFAULT_CONTENT_TYPE.to_string()
        }
    }

    /// Walk the container tree, bounded at [`MAX_LIST_DEPTH`] levels.
    async fn walk_container(&self, container: &str) -> StoreResult<Vec<WalkEntry>> {
        Self::ensure_container_name_safe(container)?;
        let base = self.container_root(container);
        if !fs::try_exists(&base).await? {
            return Err(StoreError::ContainerNotFound(container.to_string()));
        }

        let mut found = Vec::new();
        let mut stack = vec![(base.clone(), 0usize)];
        while let Some((dir, depth)) = stack.pop() {
            if depth > MAX_LIST_DEPTH {
                return Err(StoreError::TooDeep);
            }
            let mut entries = fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let metadata = entry.metadata().await?;
                let key = path
                    .strip_prefix(&base)
                    .map_err(|_| {
                        StoreError::Io(io::Error::new(
                            ErrorKind::Other,
                            "walk entry outside container root",
                        ))
                    })?
                    .to_string_lossy()
                    .replace('\\', "/");
                let modified = metadata.modified().map(DateTime::<Utc>::from)?;
                if metadata.is_dir() {
                    stack.push((path.clone(), depth + 1));
                    found.push(WalkEntry {
                        key,
                        path,
                        is_dir: true,
                        len: 0,
                        modified,
                    });
                } else if metadata.is_file() {
                    // In-flight writes park under dot-tmp names.
                    if entry.file_name().to_string_lossy().starts_with(".tmp-") {
                        continue;
                    }
                    found.push(WalkEntry {
                        key,
                        path,
                        is_dir: false,
                        len: metadata.len(),
                        modified,
                    });
                }
            }
        }
        Ok(found)
    }

    /// Stream-write an object.
    ///
    /// - A `Content-Type: application/directory` write materializes a
    ///   real directory (the marker the mount view shows).
    /// - In a container with a versions location, the current payload is
    ///   retained in the versions container before being replaced.
    /// - Bytes stream to a temp file computing MD5, then fsync and an
    ///   atomic rename into place.
    ///
    /// Returns the payload ETag.
    pub async fn put_object<S>(
        &self,
        container: &str,
        key: &str,
        content_type: Option<String>,
        manifest: Option<String>,
        stream: S,
    ) -> StoreResult<String>
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        Self::ensure_key_safe(key)?;
        Self::ensure_container_name_safe(container)?;
        if !fs::try_exists(self.container_root(container)).await? {
            return Err(StoreError::ContainerNotFound(container.to_string()));
        }

        let file_path = self.object_path(container, key);

        if content_type.as_deref() == Some(DIRECTORY_CONTENT_TYPE) {
            fs::create_dir_all(&file_path).await?;
            self.remember(container, key, content_type, manifest);
            return Ok(empty_md5());
        }

        self.snapshot_if_versioned(container, key, &file_path)
            .await?;

        let parent = file_path.parent().map(Path::to_path_buf).ok_or_else(|| {
            StoreError::Io(io::Error::new(
                ErrorKind::Other,
                "object path missing parent directory",
            ))
        })?;
        fs::create_dir_all(&parent).await?;
        let tmp_path = parent.join(format!(".tmp-{}", Uuid::new_v4()));
        let mut file = File::create(&tmp_path).await?;

        let mut digest = Context::new();
        pin_mut!(stream);
        while let Some(chunk_res) = stream.next().await {
            let chunk = match chunk_res {
                Ok(chunk) => chunk,
                Err(err) => {
                    let _ = fs::remove_file(&tmp_path).await;
                    return Err(StoreError::Io(err));
                }
            };
            digest.consume(&chunk);
            if let Err(err) = file.write_all(&chunk).await {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(StoreError::Io(err));
            }
        }
        if let Err(err) = file.flush().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StoreError::Io(err));
        }
        if let Err(err) = file.sync_all().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StoreError::Io(err));
        }

        if let Err(err) = fs::rename(&tmp_path, &file_path).await {
            if err.kind() == ErrorKind::AlreadyExists {
                fs::remove_file(&file_path).await?;
                fs::rename(&tmp_path, &file_path).await?;
            } else {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(StoreError::Io(err));
            }
        }

        self.remember(container, key, content_type, manifest);
        Ok(format!("{:x}", digest.compute()))
    }

    fn remember(
        &self,
        container: &str,
        key: &str,
        content_type: Option<String>,
        manifest: Option<String>,
    ) {
        let slot = (container.to_string(), key.to_string());
        let mut meta = self.meta_lock();
        match content_type {
            Some(ct) => {
                meta.content_types.insert(slot.clone(), ct);
            }
            None => {
                meta.content_types.remove(&slot);
            }
        }
        match manifest {
            Some(prefix) => {
                meta.manifests.insert(slot, prefix);
            }
            None => {
                meta.manifests.remove(&slot);
            }
        }
    }

    /// Retain the current payload in the versions container before an
    /// overwrite. Version copies live under
    /// `<%03x key-len><key>/<zero-padded sequence>` so lexicographic
    /// order is retention order.
    async fn snapshot_if_versioned(
        &self,
        container: &str,
        key: &str,
        current: &Path,
    ) -> StoreResult<()> {
        let location = self.meta_lock().versions_locations.get(container).cloned();
        let Some(location) = location else {
            return Ok(());
        };
        let metadata = match fs::metadata(current).await {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(StoreError::Io(err)),
        };
        if metadata.is_dir() {
            return Ok(());
        }
        if !fs::try_exists(self.container_root(&location)).await? {
            return Err(StoreError::VersionsContainerMissing(location));
        }

        let seq = self.version_seq.fetch_add(1, Ordering::SeqCst);
        let version_key = format!("{}/{:020}", version_prefix(key), seq);
        let version_path = self.object_path(&location, &version_key);
        let parent = version_path.parent().map(Path::to_path_buf).ok_or_else(|| {
            StoreError::Io(io::Error::new(
                ErrorKind::Other,
                "version path missing parent directory",
            ))
        })?;
        fs::create_dir_all(&parent).await?;
        fs::rename(current, &version_path).await?;
        debug!(container, key, version = %version_key, "retained version");

        // The retained copy keeps its declared content type.
        let mut meta = self.meta_lock();
        if let Some(ct) = meta
            .content_types
            .remove(&(container.to_string(), key.to_string()))
        {
            meta.content_types.insert((location, version_key), ct);
        }
        Ok(())
    }

    /// Resolve a GET: metadata plus a plan for producing the bytes.
    /// Manifest objects resolve to their segment files; directory
    /// markers resolve to an empty body.
    pub async fn read_object(
        &self,
        container: &str,
        key: &str,
    ) -> StoreResult<(ObjectInfo, ReadPlan)> {
        Self::ensure_key_safe(key)?;

        let manifest = self
            .meta_lock()
            .manifests
            .get(&(container.to_string(), key.to_string()))
            .cloned();
        if let Some(manifest) = manifest {
            return self.read_manifest(container, key, &manifest).await;
        }

        let path = self.object_path(container, key);
        let metadata = match fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(StoreError::ObjectNotFound {
                    container: container.to_string(),
                    key: key.to_string(),
                });
            }
            Err(err) => return Err(StoreError::Io(err)),
        };
        let modified = metadata.modified().map(DateTime::<Utc>::from)?;

        if metadata.is_dir() {
            let info = ObjectInfo {
                etag: empty_md5(),
                content_length: 0,
                content_type: DIRECTORY_CONTENT_TYPE.to_string(),
                // `Last-Modified` is an HTTP date, unlike the RFC 3339
                // listing form.
                last_modified: modified.to_rfc2822(),
            };
            return Ok((info, ReadPlan::Empty));
        }

        let info = ObjectInfo {
            etag: file_md5(&path).await?,
            content_length: metadata.len(),
            content_type: self.content_type_of(container, key, false),
            last_modified: modified.to_rfc2822(),
        };
        Ok((info, ReadPlan::Whole(path)))
    }

    /// Dynamic large object: concatenate every object in the declared
    /// container whose name carries the declared prefix, in ascending
    /// name order, excluding the manifest marker itself. The aggregate
    /// ETag is the MD5 of the concatenated segment ETag hexes.
    async fn read_manifest(
        &self,
        container: &str,
        key: &str,
        manifest: &str,
    ) -> StoreResult<(ObjectInfo, ReadPlan)> {
        let (seg_container, seg_prefix) = manifest.split_once('/').unwrap_or((manifest, ""));

        let mut segments: Vec<WalkEntry> = self
            .walk_container(seg_container)
            .await?
            .into_iter()
            .filter(|entry| {
                !entry.is_dir
                    && entry.key.starts_with(seg_prefix)
                    && !(seg_container == container && entry.key == key)
            })
            .collect();
        segments.sort_by(|a, b| a.key.cmp(&b.key));

        let marker_path = self.object_path(container, key);
        let marker_modified = match fs::metadata(&marker_path).await {
            Ok(metadata) => metadata.modified().map(DateTime::<Utc>::from)?,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(StoreError::ObjectNotFound {
                    container: container.to_string(),
                    key: key.to_string(),
                });
            }
            Err(err) => return Err(StoreError::Io(err)),
        };

        let mut total = 0u64;
        let mut etags = String::new();
        let mut paths = Vec::with_capacity(segments.len());
        for segment in &segments {
            total += segment.len;
            etags.push_str(&file_md5(&segment.path).await?);
            paths.push(segment.path.clone());
        }

        let info = ObjectInfo {
            etag: format!("{:x}", md5::compute(etags.as_bytes())),
            content_length: total,
            content_type: self.content_type_of(container, key, false),
            last_modified: marker_modified.to_rfc2822(),
        };
        let plan = if paths.is_empty() {
            ReadPlan::Empty
        } else {
            ReadPlan::Segments(paths)
        };
        Ok((info, plan))
    }

    /// HEAD: same resolution as a GET without the bytes.
    pub async fn head_object(&self, container: &str, key: &str) -> StoreResult<ObjectInfo> {
        self.read_object(container, key).await.map(|(info, _)| info)
    }

    /// Delete an object. In a container with a versions location the
    /// newest retained version becomes current again (strict LIFO).
    pub async fn delete_object(&self, container: &str, key: &str) -> StoreResult<()> {
        Self::ensure_key_safe(key)?;
        let path = self.object_path(container, key);
        let metadata = match fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(StoreError::ObjectNotFound {
                    container: container.to_string(),
                    key: key.to_string(),
                });
            }
            Err(err) => return Err(StoreError::Io(err)),
        };

        if metadata.is_dir() {
            match fs::remove_dir(&path).await {
                Ok(()) => {}
                Err(err) if err.kind() == ErrorKind::DirectoryNotEmpty => {
                    return Err(StoreError::DirectoryNotEmpty(key.to_string()));
                }
                Err(err) => return Err(StoreError::Io(err)),
            }
        } else {
            fs::remove_file(&path).await?;
        }

        {
            let slot = (container.to_string(), key.to_string());
            let mut meta = self.meta_lock();
            meta.content_types.remove(&slot);
            meta.manifests.remove(&slot);
        }

        self.restore_latest_version(container, key).await
    }

    async fn restore_latest_version(&self, container: &str, key: &str) -> StoreResult<()> {
        let location = self.meta_lock().versions_locations.get(container).cloned();
        let Some(location) = location else {
            return Ok(());
        };
        let prefix_key = version_prefix(key);
        let prefix_dir = self.object_path(&location, &prefix_key);

        let mut names: Vec<String> = Vec::new();
        let mut entries = match fs::read_dir(&prefix_dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(StoreError::Io(err)),
        };
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        // Zero-padded sequence numbers: lexicographic max is the newest.
        names.sort();
        let Some(newest) = names.pop() else {
            let _ = fs::remove_dir(&prefix_dir).await;
            return Ok(());
        };

        let live_path = self.object_path(container, key);
        fs::rename(prefix_dir.join(&newest), &live_path).await?;
        debug!(container, key, version = %newest, "restored version");
        if names.is_empty() {
            let _ = fs::remove_dir(&prefix_dir).await;
        }

        let version_key = format!("{prefix_key}/{newest}");
        let mut meta = self.meta_lock();
        if let Some(ct) = meta.content_types.remove(&(location, version_key)) {
            meta.content_types
                .insert((container.to_string(), key.to_string()), ct);
        }
        Ok(())
    }
}

/// Swift-style version prefix: three hex digits of key length, then the
/// key itself.
fn version_prefix(key: &str) -> String {
    format!("{:03x}{}", key.len(), key)
}

/// Parent path of a key within the virtual hierarchy; the top level is
/// the empty string.
fn parent_of(key: &str) -> &str {
    key.rfind('/').map(|i| &key[..i]).unwrap_or("")
}

fn empty_md5() -> String {
    format!("{:x}", md5::compute(b""))
}

async fn file_md5(path: &Path) -> io::Result<String> {
    let data = fs::read(path).await?;
    Ok(format!("{:x}", md5::compute(&data)))
}
