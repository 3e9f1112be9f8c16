//! Listing format scenarios: plain, json, and xml must agree.

use crate::{DIRS, FILE_SIZE, TestEnv, all_objects, create_name, populate_hierarchy};
use chrono::{DateTime, NaiveDateTime};
use swift_conformance::client::{ListFormat, ListParams, WriteOptions};

/// All three formats return every stored key, in the same collation
/// order.
#[tokio::test]
async fn listing_formats_agree_on_names_and_order() {
    let env = TestEnv::new().await;
    let container = env.container(&create_name()).await;
    populate_hierarchy(&container).await;

    let expected = env.collation.sorted(&all_objects());
    for format in [ListFormat::Plain, ListFormat::Json, ListFormat::Xml] {
        let files = container
            .files(&ListParams::format(format))
            .await
            .expect("listing");
        assert!(!files.is_empty());
        assert_eq!(files, expected, "{format:?} listing order");
    }
}

/// Detailed records carry sizes, timestamps, and the right content
/// types: `application/directory` for markers, the declared type for
/// files.
#[tokio::test]
async fn detailed_records_carry_sizes_timestamps_and_types() {
    let env = TestEnv::new().await;
    let container = env.container(&create_name()).await;
    populate_hierarchy(&container).await;

    for format in [ListFormat::Json, ListFormat::Xml] {
        let records = container
            .files_detailed(&ListParams::format(format))
            .await
            .expect("detailed listing");
        assert_eq!(records.len(), all_objects().len());
        for record in records {
            assert!(
                parses_as_listing_timestamp(&record.last_modified),
                "{} last_modified `{}` is not a listing timestamp",
                record.name,
                record.last_modified
            );
            if DIRS.contains(&record.name.as_str()) {
                assert!(record.is_directory(), "{} is not a marker", record.name);
                assert_eq!(record.bytes, 0, "{} marker has bytes", record.name);
            } else {
                assert_eq!(record.content_type, "application/octet-stream");
                assert_eq!(record.bytes, FILE_SIZE as u64);
                assert_eq!(record.hash.len(), 32, "{} hash not md5 hex", record.name);
            }
        }
    }
}

/// Object HEADs stamp `Last-Modified` as an HTTP date while listing
/// records keep the RFC 3339 form; the two must not collapse into one
/// format.
#[tokio::test]
async fn head_and_listing_timestamps_use_distinct_formats() {
    let env = TestEnv::new().await;
    let container = env.container(&create_name()).await;

    let name = create_name();
    let object = container.object(&name);
    object
        .write_random(FILE_SIZE, &WriteOptions::default())
        .await
        .expect("object write");

    let info = object.info().await.expect("object info");
    assert!(
        DateTime::parse_from_rfc2822(&info.last_modified).is_ok(),
        "Last-Modified `{}` is not an HTTP date",
        info.last_modified
    );
    assert!(
        DateTime::parse_from_rfc3339(&info.last_modified).is_err(),
        "Last-Modified `{}` uses the listing format",
        info.last_modified
    );

    let records = container
        .files_detailed(&ListParams::format(ListFormat::Json))
        .await
        .expect("detailed listing");
    let record = records
        .iter()
        .find(|r| r.name == name)
        .expect("written object listed");
    assert!(
        parses_as_listing_timestamp(&record.last_modified),
        "listing last_modified `{}` is not RFC 3339",
        record.last_modified
    );
    assert!(
        DateTime::parse_from_rfc2822(&record.last_modified).is_err(),
        "listing last_modified `{}` uses the header format",
        record.last_modified
    );
}

/// Listing timestamps are RFC 3339 with microseconds; some gateways
/// emit them without an offset.
fn parses_as_listing_timestamp(value: &str) -> bool {
    DateTime::parse_from_rfc3339(value).is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
}
