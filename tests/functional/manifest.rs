//! Dynamic large object scenarios.

use crate::{TestEnv, create_name};
use rand::{Rng, RngCore};
use reqwest::StatusCode;
use swift_conformance::client::{ListParams, WriteOptions};
use swift_conformance::config::FrontEnd;

/// A zero-length object with `X-Object-Manifest` reads back as the
/// concatenation of every segment sharing the declared prefix, in
/// ascending name order — never as the marker body itself.
#[tokio::test]
async fn manifest_read_returns_concatenated_segments() {
    let env = TestEnv::new().await;
    if env.config.front_end == FrontEnd::Apache2 {
        eprintln!("skipping manifest scenario: apache2 front end");
        return;
    }
    let container = env.container(&create_name()).await;

    let mut data = vec![0u8; 10_000];
    rand::thread_rng().fill_bytes(&mut data);
    // Fewer than ten segments, so name order and numeric order coincide.
    let parts = rand::thread_rng().gen_range(2..10);
    let chunk = data.len() / parts;

    let manifest = container.object("objectmanifest");
    let opts = WriteOptions {
        manifest: Some(format!("{}/objectmanifest", container.name())),
        ..WriteOptions::default()
    };
    let status = manifest.write(b"", &opts).await.expect("manifest write");
    assert_eq!(status, StatusCode::CREATED);
    assert!(
        container
            .files(&ListParams::default())
            .await
            .expect("listing")
            .contains(&"objectmanifest".to_string())
    );
    // No segments yet: the manifest reads as empty.
    assert!(
        manifest
            .read()
            .await
            .expect("empty manifest read")
            .is_empty()
    );

    for i in 1..=parts {
        let segment = if i == parts {
            &data[(i - 1) * chunk..]
        } else {
            &data[(i - 1) * chunk..i * chunk]
        };
        let status = container
            .object(format!("objectmanifest-{i}"))
            .write(segment, &WriteOptions::default())
            .await
            .expect("segment write");
        assert_eq!(status, StatusCode::CREATED);
    }

    // Content must match the original data; the manifest's own ETag is
    // an aggregate and deliberately not compared.
    assert_eq!(manifest.read().await.expect("manifest read"), data);
}

/// 2 MiB single-object round trip.
#[tokio::test]
async fn two_megabyte_object_roundtrip() {
    let env = TestEnv::new().await;
    let container = env.container(&create_name()).await;

    let mut data = vec![0u8; 2 * 1024 * 1024];
    rand::thread_rng().fill_bytes(&mut data);

    let object = container.object(create_name());
    let status = object
        .write(&data, &WriteOptions::default())
        .await
        .expect("large write");
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(object.read().await.expect("large read"), data);
}
