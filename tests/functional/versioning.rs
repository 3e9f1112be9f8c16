//! `X-Versions-Location` retention scenarios.

use crate::{TestEnv, md5_hex};
use rand::Rng;
use reqwest::StatusCode;
use swift_conformance::client::{CreateOptions, WriteOptions};

/// V writes to one key retain V−1 versions; each delete of the current
/// object re-surfaces the newest retained version (strict LIFO) and
/// answers 204.
#[tokio::test]
async fn versioned_writes_retain_history_and_deletes_restore_lifo() {
    let env = TestEnv::new().await;
    let account = env.account();

    let live = account.container("object");
    let versions = account.container("versions");
    let status = live
        .create(&CreateOptions {
            versions_location: Some("versions".into()),
            ..CreateOptions::default()
        })
        .await
        .expect("live container create");
    assert!(status.is_success());
    let status = versions
        .create(&CreateOptions::default())
        .await
        .expect("versions container create");
    assert!(status.is_success());

    let version_count = rand::thread_rng().gen_range(2..10);
    let mut payloads = Vec::with_capacity(version_count);
    for i in 0..version_count {
        let data = live
            .object("object")
            .write_random(10_000 * (i + 1), &WriteOptions::default())
            .await
            .expect("versioned write");
        payloads.push(data);
    }

    let info = versions.info().await.expect("versions container info");
    assert_eq!(info.object_count, (version_count - 1) as u64);

    // Newest first: the i-th delete exposes the (V-i)-th payload.
    for payload in payloads.iter().rev() {
        let object = live.object("object");
        let current = object.read().await.expect("current version read");
        assert_eq!(md5_hex(&current), md5_hex(payload));
        assert_eq!(current, *payload);
        let status = object.delete().await.expect("versioned delete");
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
}
