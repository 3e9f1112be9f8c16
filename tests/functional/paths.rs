//! Hierarchical `path` traversal scenarios.

use crate::{DIRS, TestEnv, create_name, populate_hierarchy};
use swift_conformance::client::ListParams;

/// Recursing into every directory returned by `path` listings
/// reconstructs the full stored set, with no duplicates and no
/// omissions, within the ten-level depth bound.
#[tokio::test]
async fn traverse_container_visits_every_stored_file() {
    let env = TestEnv::new().await;
    let container = env.container(&create_name()).await;
    let stored_files = populate_hierarchy(&container).await;

    let mut found_files: Vec<String> = Vec::new();
    let mut found_dirs: Vec<String> = Vec::new();
    let mut pending: Vec<(String, usize)> = vec![(String::new(), 0)];
    while let Some((path, depth)) = pending.pop() {
        assert!(depth <= 10, "too deep recursion at `{path}`");
        let listing = container
            .files(&ListParams::path(path.clone()))
            .await
            .expect("path listing");
        for name in listing {
            assert!(name.starts_with(&path), "`{name}` outside `{path}`");
            if DIRS.contains(&name.as_str()) {
                pending.push((name.clone(), depth + 1));
                found_dirs.push(name);
            } else {
                found_files.push(name);
            }
        }
    }

    for file in &stored_files {
        assert!(found_files.contains(file), "missing `{file}`");
        assert!(!found_dirs.contains(file), "`{file}` listed as directory");
    }
    assert_eq!(found_files.len(), stored_files.len(), "duplicate entries");
}

/// Each `path` listing returns exactly the direct children of that
/// level, in collation order.
#[tokio::test]
async fn listing_under_each_path_returns_direct_children_in_order() {
    let env = TestEnv::new().await;
    let container = env.container(&create_name()).await;
    populate_hierarchy(&container).await;

    let cases: [(&str, &[&str]); 5] = [
        ("", &["file1", "dir1", "dir2", "file A"]),
        (
            "dir1",
            &[
                "dir1/file2",
                "dir1/subdir1",
                "dir1/subdir2",
                "dir1/subdir with spaces",
                "dir1/subdir+with{whatever",
            ],
        ),
        (
            "dir1/subdir1",
            &[
                "dir1/subdir1/file4",
                "dir1/subdir1/subsubdir2",
                "dir1/subdir1/file2",
                "dir1/subdir1/file3",
                "dir1/subdir1/subsubdir1",
            ],
        ),
        (
            "dir1/subdir1/subsubdir1",
            &[
                "dir1/subdir1/subsubdir1/file7",
                "dir1/subdir1/subsubdir1/file5",
                "dir1/subdir1/subsubdir1/file8",
                "dir1/subdir1/subsubdir1/file6",
            ],
        ),
        (
            "dir1/subdir with spaces",
            &["dir1/subdir with spaces/file B"],
        ),
    ];

    for (path, expected) in cases {
        let files = container
            .files(&ListParams::path(path))
            .await
            .expect("path listing");
        assert_eq!(
            files,
            env.collation.sorted(expected),
            "children of `{path}`"
        );
    }
}
