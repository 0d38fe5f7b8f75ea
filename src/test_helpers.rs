//! Shared scripted collaborators for unit tests.

use crate::catalog::CatalogSource;
use crate::credentials::Credentials;
use crate::error::{Error, Result};
use crate::images::ImageFetcher;
use crate::types::{Job, OrderingMode};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use tokio::sync::Notify;

/// Build a job with enqueue time "t0"
pub(crate) fn job(id: &str, images: &[&str]) -> Job {
    Job {
        id: id.to_string(),
        enqueue_time: "t0".to_string(),
        image_paths: images.iter().map(|s| s.to_string()).collect(),
    }
}

/// Serialize jobs the way the listing endpoint returns them
pub(crate) fn page_body(jobs: &[Job]) -> Vec<u8> {
    serde_json::to_vec(jobs).unwrap()
}

/// What a [`ScriptedCatalog`] does for one page
#[derive(Clone)]
pub(crate) enum PageScript {
    Body(Vec<u8>),
    Fail,
}

/// Catalog returning scripted bodies per page; unscripted pages are `[]`
#[derive(Default)]
pub(crate) struct ScriptedCatalog {
    pages: HashMap<u32, PageScript>,
    calls: Mutex<Vec<(OrderingMode, u32)>>,
}

impl ScriptedCatalog {
    pub(crate) fn with_jobs(mut self, page: u32, jobs: &[Job]) -> Self {
        self.pages.insert(page, PageScript::Body(page_body(jobs)));
        self
    }

    pub(crate) fn with_body(mut self, page: u32, body: &[u8]) -> Self {
        self.pages.insert(page, PageScript::Body(body.to_vec()));
        self
    }

    pub(crate) fn failing_at(mut self, page: u32) -> Self {
        self.pages.insert(page, PageScript::Fail);
        self
    }

    /// Pages requested so far, in order
    pub(crate) fn pages_requested(&self) -> Vec<u32> {
        self.calls.lock().unwrap().iter().map(|(_, p)| *p).collect()
    }

    pub(crate) fn orderings_requested(&self) -> Vec<OrderingMode> {
        self.calls.lock().unwrap().iter().map(|(o, _)| *o).collect()
    }
}

#[async_trait]
impl CatalogSource for ScriptedCatalog {
    async fn fetch_page(
        &self,
        _credentials: &Credentials,
        ordering: OrderingMode,
        page: u32,
    ) -> Result<Vec<u8>> {
        self.calls.lock().unwrap().push((ordering, page));
        match self.pages.get(&page) {
            Some(PageScript::Body(body)) => Ok(body.clone()),
            Some(PageScript::Fail) => Err(Error::CatalogFetch {
                page,
                reason: "scripted failure".to_string(),
            }),
            None => Ok(b"[]".to_vec()),
        }
    }
}

/// Catalog that parks inside `fetch_page` until released; every page is `[]`
#[derive(Default)]
pub(crate) struct GatedCatalog {
    pub(crate) entered: Notify,
    pub(crate) release: Notify,
    pages: Mutex<Vec<u32>>,
}

impl GatedCatalog {
    pub(crate) fn pages_requested(&self) -> Vec<u32> {
        self.pages.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogSource for GatedCatalog {
    async fn fetch_page(
        &self,
        _credentials: &Credentials,
        _ordering: OrderingMode,
        page: u32,
    ) -> Result<Vec<u8>> {
        self.pages.lock().unwrap().push(page);
        self.entered.notify_one();
        self.release.notified().await;
        Ok(b"[]".to_vec())
    }
}

/// Image fetcher writing the URL itself as the file body
#[derive(Default)]
pub(crate) struct RecordingImages {
    fail_on: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl RecordingImages {
    pub(crate) fn failing_on(url: &str) -> Self {
        Self {
            fail_on: Some(url.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageFetcher for RecordingImages {
    async fn download_image(&self, url: &str, dest: &Path) -> Result<()> {
        self.calls.lock().unwrap().push(url.to_string());
        if self.fail_on.as_deref() == Some(url) {
            return Err(Error::ImageDownload {
                url: url.to_string(),
                reason: "scripted failure".to_string(),
            });
        }
        tokio::fs::write(dest, url.as_bytes())
            .await
            .map_err(|source| Error::ImageWrite {
                path: dest.to_path_buf(),
                source,
            })
    }
}
