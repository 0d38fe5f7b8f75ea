//! Listing pages and image mocks

use super::config::RECENT_JOBS_PATH;
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Canonical job id used across scenarios
pub const JOB_ID: &str = "11111111-1111-1111-1111-111111111111";

/// Stand-in image bytes
pub const IMAGE_BYTES: &[u8] = b"\x89PNG\r\n\x1a\ntest image";

/// One listing entry as the remote endpoint returns it
pub fn job_entry(id: &str, enqueue_time: &str, image_paths: &[String]) -> Value {
    json!({
        "id": id,
        "enqueue_time": enqueue_time,
        "image_paths": image_paths,
        "prompt": "not mirrored",
    })
}

/// Serve `body` as listing page `page`
pub async fn mount_page(server: &MockServer, page: u32, body: Value) {
    Mock::given(method("GET"))
        .and(path(RECENT_JOBS_PATH))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Serve an image at `image_path`, expecting exactly `times` requests
pub async fn mount_image(server: &MockServer, image_path: &str, times: u64) {
    Mock::given(method("GET"))
        .and(path(image_path))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(IMAGE_BYTES))
        .expect(times)
        .mount(server)
        .await;
}
