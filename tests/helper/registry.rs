//! Registry test utilities

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use image_release::version::error::RegistryError;
use image_release::version::registry::TagRegistry;
use image_release::version::types::{RegistryKind, TagRecord};

/// In-memory registry; unknown images fail with `InvalidResponse`
pub struct MockRegistry {
    kind: RegistryKind,
    tags: HashMap<String, Vec<String>>,
    requested: Mutex<Vec<String>>,
}

impl MockRegistry {
    pub fn new(kind: RegistryKind) -> Self {
        Self {
            kind,
            tags: HashMap::new(),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn with_tags(mut self, image: &str, tags: Vec<&str>) -> Self {
        self.tags.insert(
            image.to_string(),
            tags.into_iter().map(|t| t.to_string()).collect(),
        );
        self
    }

    /// Image names requested so far, in request order
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl TagRegistry for MockRegistry {
    fn kind(&self) -> RegistryKind {
        self.kind
    }

    async fn fetch_tags(&self, image_name: &str) -> Result<Vec<TagRecord>, RegistryError> {
        self.requested.lock().unwrap().push(image_name.to_string());
        match self.tags.get(image_name) {
            Some(tags) => Ok(tags
                .iter()
                .map(|tag| TagRecord::new(image_name, tag.as_str(), self.kind))
                .collect()),
            None => Err(RegistryError::InvalidResponse(format!(
                "no such image: {}",
                image_name
            ))),
        }
    }
}

/// Tag records for `image` as DockerHub would report them
pub fn records(image: &str, tags: &[&str]) -> Vec<TagRecord> {
    tags.iter()
        .map(|tag| TagRecord::new(image, *tag, RegistryKind::DockerHub))
        .collect()
}
