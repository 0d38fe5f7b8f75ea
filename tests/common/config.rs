//! Test configuration: a scratch job store, credential files and a mock endpoint

use history_sync::{Config, HistorySync};
use std::path::PathBuf;
use tempfile::TempDir;
use wiremock::MockServer;

/// User id written to the credential file
pub const TEST_USER_ID: &str = "user-42";

/// Session token written to the credential file
pub const TEST_TOKEN: &str = "session-token-abc";

/// User agent sent by test services
pub const TEST_USER_AGENT: &str = "history-sync-test/1.0";

/// Path of the listing endpoint on the mock server
pub const RECENT_JOBS_PATH: &str = "/api/app/recent-jobs/";

/// Scratch environment for one test (keep it alive for the test duration)
pub struct TestEnv {
    /// Owns every file the test touches
    pub temp: TempDir,
    /// Configuration pointing at the temp dir and the mock server
    pub config: Config,
}

impl TestEnv {
    /// Build a config that walks `page_ceiling` pages of `server`
    pub fn new(server: &MockServer, page_ceiling: u32) -> Self {
        let temp = tempfile::tempdir().unwrap();

        let mut config = Config::default();
        config.store.jobs_dir = temp.path().join("jobs");
        config.api.recent_jobs_url = format!("{}{}", server.uri(), RECENT_JOBS_PATH);
        config.api.user_agent = TEST_USER_AGENT.to_string();
        config.sync.page_ceiling = page_ceiling;
        config.credentials.user_id_file = temp.path().join("userid.txt");
        config.credentials.session_token_file = temp.path().join("sessiontoken.txt");

        std::fs::write(&config.credentials.user_id_file, format!("{TEST_USER_ID}\n")).unwrap();
        std::fs::write(&config.credentials.session_token_file, format!("{TEST_TOKEN}\n")).unwrap();

        Self { temp, config }
    }

    /// The job store root
    pub fn jobs_dir(&self) -> PathBuf {
        self.config.store.jobs_dir.clone()
    }

    /// A service using real HTTP clients against the mock server
    pub fn service(&self) -> HistorySync {
        HistorySync::new(self.config.clone()).unwrap()
    }
}
