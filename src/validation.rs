//! Identifier and filename safety checks
//!
//! Both checks are pure predicates. Deciding what a `false` means (kill switch,
//! fatal abort) and logging it is left to the caller.

use regex::Regex;
use std::sync::LazyLock;

// Patterns are literals, so compilation cannot fail at runtime.
#[allow(clippy::expect_used)]
static JOB_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
        .expect("job id pattern is valid")
});

#[allow(clippy::expect_used)]
static IMAGE_FILENAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9_]+\.(png|jpg|jpeg|webp)$").expect("image filename pattern is valid")
});

/// Returns true if `id` is a canonical lowercase UUID (8-4-4-4-12 hex groups)
///
/// # Examples
///
/// ```
/// use history_sync::validation::validate_job_id;
///
/// assert!(validate_job_id("0f8fad5b-d9cb-469f-a165-70867728950e"));
/// assert!(!validate_job_id("0F8FAD5B-D9CB-469F-A165-70867728950E"));
/// assert!(!validate_job_id("../0f8fad5b"));
/// ```
#[must_use]
pub fn validate_job_id(id: &str) -> bool {
    JOB_ID_PATTERN.is_match(id)
}

/// Returns true if `name` is digits/underscores followed by an image extension
///
/// # Examples
///
/// ```
/// use history_sync::validation::validate_image_filename;
///
/// assert!(validate_image_filename("0_3.webp"));
/// assert!(!validate_image_filename("../../etc/passwd"));
/// ```
#[must_use]
pub fn validate_image_filename(name: &str) -> bool {
    IMAGE_FILENAME_PATTERN.is_match(name)
}

/// The final `/`-separated segment of an image URL
///
/// No URL decoding or query stripping happens here: whatever follows the last
/// slash is what gets validated and used as the filename on disk.
#[must_use]
pub fn image_filename(url: &str) -> &str {
    url.rsplit_once('/').map_or(url, |(_, name)| name)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_canonical_uuids() {
        for id in [
            "11111111-1111-1111-1111-111111111111",
            "0f8fad5b-d9cb-469f-a165-70867728950e",
            "00000000-0000-0000-0000-000000000000",
            "ffffffff-ffff-ffff-ffff-ffffffffffff",
        ] {
            assert!(validate_job_id(id), "{id} should be accepted");
        }
    }

    #[test]
    fn rejects_malformed_ids() {
        for id in [
            "",
            "11111111-1111-1111-1111-11111111111",   // short last group
            "11111111-1111-1111-1111-1111111111111", // long last group
            "0F8FAD5B-D9CB-469F-A165-70867728950E",  // uppercase hex
            "0f8fad5bd9cb469fa16570867728950e",      // no hyphens
            "0f8fad5b-d9cb-469f-a165-70867728950g",  // non-hex
            "{0f8fad5b-d9cb-469f-a165-70867728950e}",
            " 0f8fad5b-d9cb-469f-a165-70867728950e",
            "0f8fad5b-d9cb-469f-a165-70867728950e\n",
            "../../etc/passwd",
            "0f8fad5b-d9cb-469f-a165-70867728950e/..",
        ] {
            assert!(!validate_job_id(id), "{id:?} should be rejected");
        }
    }

    #[test]
    fn accepts_numeric_image_names() {
        for name in ["0_0.png", "1_2.png", "123.jpg", "_.jpeg", "0_3.webp"] {
            assert!(validate_image_filename(name), "{name} should be accepted");
        }
    }

    #[test]
    fn rejects_unsafe_image_names() {
        for name in [
            "",
            ".png",
            "0_0.gif",
            "0_0.PNG",
            "0_0.png.exe",
            "abc.png",
            "0-0.png",
            "../../etc/passwd",
            "..",
            "0_0.png/",
            "0_0.png\n",
            "0_0.png?width=100",
        ] {
            assert!(!validate_image_filename(name), "{name:?} should be rejected");
        }
    }

    #[test]
    fn image_filename_takes_last_segment() {
        assert_eq!(image_filename("https://cdn.example/abc/0_0.png"), "0_0.png");
        assert_eq!(image_filename("0_0.png"), "0_0.png");
        assert_eq!(image_filename("https://cdn.example/abc/"), "");
        assert_eq!(image_filename("https://x/../../etc/passwd"), "passwd");
    }

    #[test]
    fn letters_in_filename_are_rejected_even_when_url_looks_harmless() {
        // "1_a.png" contains a letter, so it fails the digits/underscore rule.
        assert!(!validate_image_filename(image_filename("https://x/1_a.png")));
    }
}
