//! Object storage endpoints (`/storage/v1`).

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::types::{BaasError, FileStore};
use super::{BaasClient, send, send_json};

const LIST_LIMIT: u32 = 100;

#[derive(Serialize)]
struct ListRequest<'a> {
    prefix: &'a str,
    limit: u32,
    offset: u32,
}

#[derive(Deserialize)]
struct ListedObject {
    name: String,
}

#[derive(Serialize)]
struct RemoveRequest<'a> {
    prefixes: &'a [String],
}

impl BaasClient {
    /// Public URL of an object in a public bucket.
    #[must_use]
    pub fn public_object_url(&self, bucket: &str, path: &str) -> String {
        self.storage_url(&format!("object/public/{bucket}/{path}"))
    }
}

#[async_trait::async_trait]
impl FileStore for BaasClient {
    async fn list(&self, access_token: &str, bucket: &str, prefix: &str) -> Result<Vec<String>, BaasError> {
        let request = self
            .request(Method::POST, &self.storage_url(&format!("object/list/{bucket}")), Some(access_token))
            .json(&ListRequest { prefix, limit: LIST_LIMIT, offset: 0 });
        let objects: Vec<ListedObject> = send_json(request).await?;
        Ok(objects.into_iter().map(|o| o.name).collect())
    }

    async fn remove(&self, access_token: &str, bucket: &str, paths: &[String]) -> Result<(), BaasError> {
        if paths.is_empty() {
            return Ok(());
        }
        let request = self
            .request(Method::DELETE, &self.storage_url(&format!("object/{bucket}")), Some(access_token))
            .json(&RemoveRequest { prefixes: paths });
        send(request).await.map(|_| ())
    }

    async fn upload(
        &self,
        access_token: &str,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, BaasError> {
        let request = self
            .request(Method::POST, &self.storage_url(&format!("object/{bucket}/{path}")), Some(access_token))
            .header("content-type", content_type)
            .header("cache-control", "max-age=0")
            .header("x-upsert", "true")
            .body(bytes);
        send(request).await?;
        Ok(self.public_object_url(bucket, path))
    }
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;
