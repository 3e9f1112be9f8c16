//! HTTP-vs-mount consistency scenarios.
//!
//! The gateway must present the same object state whether it is
//! mutated over HTTP or directly on the backing filesystem, with no
//! explicit synchronization step in between.

use crate::{DIRS, TestEnv, create_name, md5_hex, populate_hierarchy};
use reqwest::StatusCode;
use swift_conformance::client::WriteOptions;

/// Walking the mount finds every stored file as a file and every
/// directory marker as a real directory.
#[tokio::test]
async fn mount_traversal_matches_stored_objects() {
    let env = TestEnv::new().await;
    let Some(probe) = env.probe() else {
        eprintln!("skipping multiprotocol scenario: no mount root configured");
        return;
    };
    let container = env.container(&create_name()).await;
    let stored_files = populate_hierarchy(&container).await;

    let report = probe.walk(container.name()).expect("mount walk");
    for file in &stored_files {
        assert!(report.files.contains(file), "`{file}` missing on mount");
        assert!(
            !report.dirs.contains(file),
            "`{file}` is a directory on mount"
        );
    }
    for dir in DIRS {
        assert!(
            report.dirs.contains(&dir.to_string()),
            "marker `{dir}` is not a directory on mount"
        );
    }
}

/// A file read straight off the mount has the bytes and MD5 the HTTP
/// side advertises as content and ETag.
#[tokio::test]
async fn mount_read_md5_matches_http_etag() {
    let env = TestEnv::new().await;
    let Some(probe) = env.probe() else {
        eprintln!("skipping multiprotocol scenario: no mount root configured");
        return;
    };
    let container = env.container(&create_name()).await;

    let name = create_name();
    let object = container.object(&name);
    let data = object
        .write_random(8, &WriteOptions::default())
        .await
        .expect("object write");
    let info = object.info().await.expect("object info");

    let disk = probe.read(container.name(), &name).expect("mount read");
    assert_eq!(disk, data);
    assert_eq!(
        probe.md5(container.name(), &name).expect("mount md5"),
        info.etag
    );
}

/// Out-of-band filesystem writes show up in HTTP reads and HEADs
/// immediately: append, then truncate-and-rewrite.
#[tokio::test]
async fn http_metadata_tracks_out_of_band_file_modification() {
    let env = TestEnv::new().await;
    let Some(probe) = env.probe() else {
        eprintln!("skipping multiprotocol scenario: no mount root configured");
        return;
    };
    let container = env.container(&create_name()).await;

    let data = b"I'm whatever Gotham needs me to be ";
    let name = create_name();
    let object = container.object(&name);
    let status = object
        .write(data, &WriteOptions::default())
        .await
        .expect("object write");
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(object.read().await.expect("initial read"), data);
    assert_eq!(object.info().await.expect("initial info").etag, md5_hex(data));

    // Extend the file from the filesystem interface.
    let more = b"- Batman";
    probe
        .append(container.name(), &name, more)
        .expect("append on mount");
    let total = [data.as_slice(), more.as_slice()].concat();
    assert_eq!(object.read().await.expect("read after append"), total);
    let metadata = object.info().await.expect("info after append");
    assert_eq!(metadata.etag, md5_hex(&total));
    assert_eq!(metadata.content_length, total.len() as u64);

    // Re-write the file to be shorter.
    let new_data = b"I am Batman";
    probe
        .rewrite(container.name(), &name, new_data)
        .expect("rewrite on mount");
    assert_eq!(object.read().await.expect("read after rewrite"), new_data);
    let metadata = object.info().await.expect("info after rewrite");
    assert_eq!(metadata.etag, md5_hex(new_data));
    assert_eq!(metadata.content_length, new_data.len() as u64);
}
