//! Assertions on the job store and the log stream

use history_sync::LogLine;
use std::path::Path;
use tokio::sync::broadcast;

/// Assert that a job directory is complete and holds exactly `images` plus metadata
pub fn assert_job_completed(jobs_dir: &Path, id: &str, images: &[&str]) {
    let dir = jobs_dir.join(id);
    assert!(dir.join("job.json").is_file(), "job.json missing in {}", dir.display());
    assert!(dir.join("completed").is_file(), "sentinel missing in {}", dir.display());
    assert_eq!(
        std::fs::metadata(dir.join("completed")).unwrap().len(),
        0,
        "sentinel is zero-length"
    );
    for image in images {
        assert!(dir.join(image).is_file(), "{image} missing in {}", dir.display());
    }

    let mut names: Vec<String> = std::fs::read_dir(&dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    let mut expected: Vec<String> = images.iter().map(|s| s.to_string()).collect();
    expected.push("completed".to_string());
    expected.push("job.json".to_string());
    expected.sort();
    assert_eq!(names, expected);
}

/// Every line currently buffered for `rx`, rendered as `[code] message`
pub fn drain_lines(rx: &mut broadcast::Receiver<LogLine>) -> Vec<String> {
    let mut lines = Vec::new();
    while let Ok(line) = rx.try_recv() {
        lines.push(line.to_string());
    }
    lines
}
