//! Debug runs leave CPU and heap profiles behind

mod support;

use ipfs_cli::lifecycle::{ExitStatus, CPU_PROFILE, HEAP_PROFILE};
use ipfs_cli::Cli;

#[tokio::test]
async fn test_debug_run_writes_profiles() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = support::init_root(dir.path(), None);
    let profiles = dir.path().join("profiles");
    std::fs::create_dir(&profiles).unwrap();

    let cli = Cli::system().with_profile_dir(&profiles);
    let outcome = support::run(
        &cli,
        &["--debug", "-c", root.to_str().unwrap(), "version", "--number"],
    )
    .await;

    assert_eq!(outcome.status, ExitStatus::Success, "{:?}", outcome);
    assert!(profiles.join(HEAP_PROFILE).exists());
    let heap = std::fs::read_to_string(profiles.join(HEAP_PROFILE)).unwrap();
    assert!(heap.starts_with("heap profile:"), "{}", heap);
    #[cfg(unix)]
    assert!(profiles.join(CPU_PROFILE).exists());
}

#[tokio::test]
async fn test_profiles_skipped_without_debug() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = support::init_root(dir.path(), None);
    let profiles = dir.path().join("profiles");
    std::fs::create_dir(&profiles).unwrap();

    let cli = Cli::system().with_profile_dir(&profiles);
    let outcome = support::run(&cli, &["-c", root.to_str().unwrap(), "version"]).await;

    assert_eq!(outcome.status, ExitStatus::Success);
    assert!(!profiles.join(CPU_PROFILE).exists());
    assert!(!profiles.join(HEAP_PROFILE).exists());
}
