//! Functional Test Harness
//!
//! Provides `TestEnv` for spinning up an in-process gateway (or
//! targeting an external one via `SWIFT_TEST_*`) plus the shared
//! object-hierarchy fixture the path scenarios populate.

use swift_conformance::client::{Account, Connection, Container, CreateOptions, WriteOptions};
use swift_conformance::collate::Collation;
use swift_conformance::config::{GatewayConfig, HarnessConfig};
use swift_conformance::gateway::{self, GatewayHandle};
use swift_conformance::probe::MountProbe;
use tempfile::TempDir;
use uuid::Uuid;

/// Size of every regular file in the hierarchy fixture.
pub const FILE_SIZE: usize = 8;

/// Directory markers of the hierarchy fixture.
pub const DIRS: [&str; 8] = [
    "dir1",
    "dir2",
    "dir1/subdir1",
    "dir1/subdir2",
    "dir1/subdir1/subsubdir1",
    "dir1/subdir1/subsubdir2",
    "dir1/subdir with spaces",
    "dir1/subdir+with{whatever",
];

/// Regular files of the hierarchy fixture.
pub const FILES: [&str; 14] = [
    "file1",
    "file A",
    "dir1/file2",
    "dir1/subdir1/file2",
    "dir1/subdir1/file3",
    "dir1/subdir1/file4",
    "dir1/subdir1/subsubdir1/file5",
    "dir1/subdir1/subsubdir1/file6",
    "dir1/subdir1/subsubdir1/file7",
    "dir1/subdir1/subsubdir1/file8",
    "dir1/subdir1/subsubdir2/file9",
    "dir1/subdir1/subsubdir2/file0",
    "dir1/subdir with spaces/file B",
    "dir1/subdir+with{whatever/file D",
];

/// Test environment owning the connection and, in fixture mode, the
/// in-process gateway and its temp directory.
pub struct TestEnv {
    pub config: HarnessConfig,
    pub conn: Connection,
    pub collation: Collation,
    _gateway: Option<GatewayHandle>,
    _root: Option<TempDir>,
}

impl TestEnv {
    /// Authenticate against a fresh, empty account.
    pub async fn new() -> Self {
        let mut config = HarnessConfig::from_env().expect("harness configuration");

        let (gateway, root) = if config.auth_url.is_some() {
            (None, None)
        } else {
            let root = TempDir::new().expect("fixture root");
            let user = config
                .username
                .split(':')
                .nth(1)
                .unwrap_or("tester")
                .to_string();
            let gw_config = GatewayConfig {
                host: "127.0.0.1".into(),
                port: 0,
                root: root.path().to_path_buf(),
                account: config.account.clone(),
                user,
                key: config.key.clone(),
                locale: config.locale.clone(),
            };
            let handle = gateway::spawn(&gw_config).await.expect("gateway spawn");
            config.auth_url = Some(handle.auth_url.clone());
            config.mount_root = Some(handle.data_root.clone());
            (Some(handle), Some(root))
        };

        let auth_url = config.auth_url.clone().expect("auth URL");
        let mut conn = Connection::new(auth_url, config.username.clone(), config.key.clone());
        conn.authenticate().await.expect("authentication");
        let collation = Collation::new(&config.locale).expect("collation");

        let env = Self {
            config,
            conn,
            collation,
            _gateway: gateway,
            _root: root,
        };
        Account::new(&env.conn)
            .delete_containers()
            .await
            .expect("account reset");
        env
    }

    pub fn account(&self) -> Account<'_> {
        Account::new(&self.conn)
    }

    /// The probe view of the account's mount directory, or `None` when
    /// no mount root is configured.
    pub fn probe(&self) -> Option<MountProbe> {
        let root = self.config.mount_root.as_ref()?;
        let device = self.conn.device().ok()?;
        Some(MountProbe::new(root.join(device)))
    }

    /// Create a fresh container and return its handle.
    pub async fn container(&self, name: &str) -> Container<'_> {
        let container = self.account().container(name);
        let status = container
            .create(&CreateOptions::default())
            .await
            .expect("container create");
        assert!(status.is_success(), "container create returned {status}");
        container
    }
}

/// Unique object/container name.
pub fn create_name() -> String {
    format!("conf-{}", Uuid::new_v4().simple())
}

pub fn md5_hex(data: &[u8]) -> String {
    format!("{:x}", md5::compute(data))
}

/// Write the directory-marker + file hierarchy shared by the path,
/// listing, and multiprotocol scenarios. Returns the stored file keys,
/// sorted.
pub async fn populate_hierarchy(container: &Container<'_>) -> Vec<String> {
    for dir in DIRS {
        container
            .object(dir)
            .write(b"", &WriteOptions::content_type("application/directory"))
            .await
            .expect("marker write");
    }
    for file in FILES {
        container
            .object(file)
            .write_random(
                FILE_SIZE,
                &WriteOptions::content_type("application/octet-stream"),
            )
            .await
            .expect("file write");
    }
    let mut stored: Vec<String> = FILES.iter().map(|s| s.to_string()).collect();
    stored.sort();
    stored
}

/// Every key the hierarchy fixture stores, markers and files alike.
pub fn all_objects() -> Vec<String> {
    DIRS.iter()
        .chain(FILES.iter())
        .map(|s| s.to_string())
        .collect()
}
