use std::fs;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::{aggregator_with, listing_order, RecordingRunner};
use crate::aggregator::Aggregator;
use crate::metrics::Metrics;

fn touch(path: &std::path::Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, b"x").unwrap();
}

#[tokio::test]
async fn concatenates_audio_files_of_each_subdirectory() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let album = root.join("album");
    touch(&album.join("a.mp3"));
    touch(&album.join("b.wav"));
    touch(&album.join("c.txt"));
    touch(&album.join("clip.mp4"));

    let runner = RecordingRunner::new();
    let (agg, metrics) = aggregator_with(root, runner.clone(), 2);
    agg.aggregate_root().await;

    let calls = runner.calls();
    assert_eq!(calls.len(), 1);
    let (inputs, output) = &calls[0];
    assert_eq!(output, &root.join("album.mp3"));

    // Listing order, audio only
    let expected: Vec<PathBuf> = listing_order(&album)
        .into_iter()
        .filter(|n| n == "a.mp3" || n == "b.wav")
        .map(|n| album.join(n))
        .collect();
    assert_eq!(inputs, &expected);
    assert!(root.join("album.mp3").is_file());
    assert_eq!(metrics.jobs_succeeded.load(Ordering::Relaxed), 1);
    assert_eq!(metrics.aggregation_passes.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn root_files_are_not_concatenated_by_the_page_pass() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    touch(&root.join("loose.mp3"));
    touch(&root.join("other.flac"));

    let runner = RecordingRunner::new();
    let (agg, _) = aggregator_with(root, runner.clone(), 1);
    agg.aggregate_root().await;

    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn second_pass_does_no_work() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    touch(&root.join("one/a.mp3"));
    touch(&root.join("two/b.flac"));

    let runner = RecordingRunner::new();
    let (agg, metrics) = aggregator_with(root, runner.clone(), 4);
    agg.aggregate_root().await;
    assert_eq!(runner.calls().len(), 2);

    agg.aggregate_root().await;
    assert_eq!(runner.calls().len(), 2);
    assert_eq!(metrics.dirs_skipped.load(Ordering::Relaxed), 2);
}

#[tokio::test]
async fn existing_track_skips_the_whole_subtree() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    touch(&root.join("artist/a.mp3"));
    touch(&root.join("artist/album/b.mp3"));
    touch(&root.join("artist.mp3"));

    let runner = RecordingRunner::new();
    let (agg, metrics) = aggregator_with(root, runner.clone(), 1);
    agg.aggregate_root().await;

    assert!(runner.calls().is_empty());
    assert!(!root.join("album.mp3").exists());
    assert_eq!(metrics.dirs_visited.load(Ordering::Relaxed), 0);
}

#[tokio::test]
async fn children_finish_before_their_parent() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    touch(&root.join("artist/y.mp3"));
    touch(&root.join("artist/album/x.mp3"));
    touch(&root.join("artist/album/disc/z.flac"));

    let runner = RecordingRunner::new();
    let (agg, _) = aggregator_with(root, runner.clone(), 4);
    agg.aggregate_root().await;

    let outputs: Vec<PathBuf> = runner.calls().into_iter().map(|(_, out)| out).collect();
    assert_eq!(outputs, vec![root.join("disc.mp3"), root.join("album.mp3"), root.join("artist.mp3")]);

    // Child tracks land in the served root, so the parent only sees its own files
    let calls = runner.calls();
    assert_eq!(calls[2].0, vec![root.join("artist/y.mp3")]);
}

#[tokio::test]
async fn aggregating_the_root_itself_includes_child_tracks() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    touch(&root.join("sub/x.mp3"));
    touch(&root.join("sub/y.mp3"));
    touch(&root.join("top.mp3"));

    let runner = RecordingRunner::new();
    let (agg, _) = aggregator_with(root, runner.clone(), 2);
    agg.aggregate(root.to_path_buf()).await;

    let calls = runner.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].1, root.join("sub.mp3"));

    let root_track = agg.output_path(root).unwrap();
    assert_eq!(calls[1].1, root_track);
    let inputs = &calls[1].0;
    assert!(inputs.contains(&root.join("sub.mp3")));
    assert!(inputs.contains(&root.join("top.mp3")));
    assert!(!inputs.contains(&root_track));
}

#[tokio::test]
async fn directory_without_audio_produces_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    touch(&root.join("photos/cover.jpg"));
    touch(&root.join("photos/clip.mkv"));
    fs::create_dir_all(root.join("empty")).unwrap();

    let runner = RecordingRunner::new();
    let (agg, _) = aggregator_with(root, runner.clone(), 1);
    agg.aggregate_root().await;

    assert!(runner.calls().is_empty());
    assert!(!root.join("photos.mp3").exists());
    assert!(!root.join("empty.mp3").exists());
}

#[tokio::test]
async fn failed_job_leaves_no_output_and_is_retried() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    touch(&root.join("broken/a.mp3"));

    let runner = RecordingRunner::failing();
    let (agg, metrics) = aggregator_with(root, runner.clone(), 1);
    agg.aggregate_root().await;

    assert!(!root.join("broken.mp3").exists());
    assert_eq!(metrics.jobs_failed.load(Ordering::Relaxed), 1);

    agg.aggregate_root().await;
    assert_eq!(runner.calls().len(), 2);
}

#[tokio::test]
async fn unreadable_directory_is_logged_and_skipped() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();

    let runner = RecordingRunner::new();
    let (agg, metrics) = aggregator_with(root, runner.clone(), 1);
    agg.aggregate(root.join("missing")).await;

    assert!(runner.calls().is_empty());
    assert_eq!(metrics.unreadable_dirs.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn missing_root_ends_the_pass_quietly() {
    let tmp = tempfile::tempdir().unwrap();
    let runner = RecordingRunner::new();
    let (agg, metrics) = aggregator_with(&tmp.path().join("gone"), runner.clone(), 1);
    agg.aggregate_root().await;

    assert!(runner.calls().is_empty());
    assert_eq!(metrics.unreadable_dirs.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn concurrent_passes_encode_each_track_once() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    touch(&root.join("album/a.mp3"));
    touch(&root.join("album/b.mp3"));

    let runner = RecordingRunner::slow(Duration::from_millis(50));
    let (agg, _) = aggregator_with(root, runner.clone(), 4);
    tokio::join!(agg.aggregate_root(), agg.aggregate_root(), agg.aggregate_root());

    assert_eq!(runner.calls().len(), 1);
    assert!(root.join("album.mp3").is_file());
    assert_eq!(agg.locks().in_flight(), 0);
}

#[tokio::test]
async fn job_limit_caps_running_processes() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    for name in ["a", "b", "c", "d"] {
        touch(&root.join(name).join("track.mp3"));
    }

    let runner = RecordingRunner::slow(Duration::from_millis(20));
    let (agg, _) = aggregator_with(root, runner.clone(), 1);
    agg.aggregate_root().await;

    assert_eq!(runner.calls().len(), 4);
    assert_eq!(runner.max_running(), 1);
}

#[tokio::test]
async fn cancelled_aggregator_starts_no_jobs() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    touch(&root.join("album/a.mp3"));

    let runner = RecordingRunner::new();
    let cancel = CancellationToken::new();
    let agg = Aggregator::with_runner(root.to_path_buf(), runner.clone(), 1, Metrics::new(), cancel.clone());
    cancel.cancel();
    agg.aggregate_root().await;

    assert!(runner.calls().is_empty());
    assert!(!root.join("album.mp3").exists());
}

#[tokio::test]
async fn is_concatenated_requires_a_regular_file() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    fs::create_dir_all(root.join("album")).unwrap();
    // A directory named like the track does not count
    fs::create_dir_all(root.join("album.mp3")).unwrap();

    let (agg, _) = aggregator_with(root, RecordingRunner::new(), 1);
    assert!(!agg.is_concatenated(&root.join("album")).await);

    fs::remove_dir(root.join("album.mp3")).unwrap();
    touch(&root.join("album.mp3"));
    assert!(agg.is_concatenated(&root.join("album")).await);
}
