// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
//! Object store and rsync publishing utilities.
//!
//! Thin helpers over the AWS S3 SDK for the operations the exporters need
//! (content and directory uploads, conditional package-resource uploads,
//! website redirects, bucket emptying, site-relative keys) plus a wrapper
//! around the `rsync` binary for trusted-host publishing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Errors from publishing operations.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// S3 API failure.
    #[error(transparent)]
    S3(#[from] Box<aws_sdk_s3::Error>),

    /// A local path could not be read or was outside the site root.
    #[error("publish io failure: {0}")]
    Io(#[from] std::io::Error),

    /// A path could not be converted to an object key.
    #[error("path is not relative to the site root: {0}")]
    KeyOutsideRoot(String),

    /// The rsync subprocess failed.
    #[error("rsync failed with status {status}: {stderr}")]
    Rsync {
        status: i32,
        stderr: String,
    },
}

fn s3_err<E>(error: aws_sdk_s3::error::SdkError<E>) -> PublishError
where
    aws_sdk_s3::Error: From<aws_sdk_s3::error::SdkError<E>>,
{
    PublishError::S3(Box::new(aws_sdk_s3::Error::from(error)))
}

/// Guess a content type from a file name.
///
/// Known site extensions map through `mime_guess`; anything unknown falls
/// back to a binary stream.
pub fn guess_content_type(name: &str) -> String {
    mime_guess::from_path(name)
        .first_raw()
        .unwrap_or("application/octet-stream")
        .to_owned()
}

/// Build an S3 client from static credentials.
pub async fn init_s3_client(access_id: &str, access_secret: &str) -> Client {
    let credentials = Credentials::new(access_id, access_secret, None, None, "carta-config");
    let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("eu-west-1"))
        .credentials_provider(credentials)
        .load()
        .await;
    Client::new(&config)
}

/// Build an S3 client without consulting the ambient AWS environment.
///
/// Used by tests and anywhere a deterministic client is needed.
pub fn client_from_static(access_id: &str, access_secret: &str) -> Client {
    let config = aws_sdk_s3::Config::builder()
        .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
        .region(Region::new("eu-west-1"))
        .credentials_provider(Credentials::new(
            access_id,
            access_secret,
            None,
            None,
            "carta-static",
        ))
        .build();
    Client::from_conf(config)
}

/// S3 helpers scoped to one bucket and a local site root.
///
/// Object keys are site-root-relative: `calc_key` maps a local output path
/// under `relative_base` to its key in the bucket.
#[derive(Clone, Debug)]
pub struct S3Utils {
    client: Client,
    bucket: String,
    relative_base: PathBuf,
}

impl S3Utils {
    pub fn new(client: Client, bucket: impl Into<String>, relative_base: impl Into<PathBuf>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            relative_base: relative_base.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Object key for a local site output path.
    pub fn calc_key(&self, path: &Path) -> Result<String, PublishError> {
        let relative = path
            .strip_prefix(&self.relative_base)
            .map_err(|_| PublishError::KeyOutsideRoot(path.display().to_string()))?;
        let key = relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        Ok(key)
    }

    /// Upload in-memory content as an object.
    ///
    /// `meta` becomes S3 user metadata; `redirect` sets the
    /// `x-amz-website-redirect-location` for alias objects.
    pub async fn upload_content(
        &self,
        key: &str,
        content_type: &str,
        body: Vec<u8>,
        meta: Option<&HashMap<String, String>>,
        redirect: Option<&str>,
    ) -> Result<(), PublishError> {
        debug!(target: "carta.s3", %key, "uploading object");
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body));
        if let Some(meta) = meta {
            for (name, value) in meta {
                request = request.metadata(name, value);
            }
        }
        if let Some(redirect) = redirect {
            request = request.website_redirect_location(redirect);
        }
        request.send().await.map_err(s3_err)?;
        Ok(())
    }

    /// Whether an object already exists under a key.
    pub async fn object_exists(&self, key: &str) -> Result<bool, PublishError> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(error) => {
                if error
                    .as_service_error()
                    .map(|service| service.is_not_found())
                    .unwrap_or(false)
                {
                    Ok(false)
                } else {
                    Err(s3_err(error))
                }
            }
        }
    }

    /// Upload a directory tree under a base key.
    ///
    /// Content types are auto-detected per file.
    pub async fn upload_directory(&self, src: &Path, base_key: &str) -> Result<(), PublishError> {
        for entry in WalkDir::new(src) {
            let entry = entry.map_err(|e| {
                PublishError::Io(e.into_io_error().unwrap_or_else(|| {
                    std::io::Error::new(std::io::ErrorKind::Other, "walkdir failure")
                }))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(src)
                .map_err(|_| PublishError::KeyOutsideRoot(entry.path().display().to_string()))?;
            let key = format!(
                "{base_key}/{}",
                relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/")
            );
            let body = std::fs::read(entry.path())?;
            let content_type = guess_content_type(&entry.file_name().to_string_lossy());
            self.upload_content(&key, &content_type, body, None, None)
                .await?;
        }
        Ok(())
    }

    /// Upload a directory of static package resources, skipping keys that
    /// already exist.
    ///
    /// Used for assets that never change once deployed (fonts, images).
    pub async fn upload_package_resources(
        &self,
        src: &Path,
        base_key: &str,
    ) -> Result<(), PublishError> {
        for entry in WalkDir::new(src) {
            let entry = entry.map_err(|e| {
                PublishError::Io(e.into_io_error().unwrap_or_else(|| {
                    std::io::Error::new(std::io::ErrorKind::Other, "walkdir failure")
                }))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(src)
                .map_err(|_| PublishError::KeyOutsideRoot(entry.path().display().to_string()))?;
            let key = format!(
                "{base_key}/{}",
                relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/")
            );
            if self.object_exists(&key).await? {
                debug!(target: "carta.s3", %key, "object exists, skipping");
                continue;
            }
            let body = std::fs::read(entry.path())?;
            let content_type = guess_content_type(&entry.file_name().to_string_lossy());
            self.upload_content(&key, &content_type, body, None, None)
                .await?;
        }
        Ok(())
    }

    /// Delete all objects in the bucket, page by page.
    pub async fn empty_bucket(&self) -> Result<(), PublishError> {
        info!(target: "carta.s3", bucket = %self.bucket, "emptying bucket");
        loop {
            let listing = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .send()
                .await
                .map_err(s3_err)?;
            let keys: Vec<ObjectIdentifier> = listing
                .contents()
                .iter()
                .filter_map(|object| object.key())
                .filter_map(|key| ObjectIdentifier::builder().key(key).build().ok())
                .collect();
            if keys.is_empty() {
                return Ok(());
            }
            let delete = Delete::builder()
                .set_objects(Some(keys))
                .build()
                .map_err(|e| {
                    PublishError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
                })?;
            self.client
                .delete_objects()
                .bucket(&self.bucket)
                .delete(delete)
                .send()
                .await
                .map_err(s3_err)?;
        }
    }
}

/// Wrapper around the `rsync` binary for trusted-host publishing.
#[derive(Clone, Copy, Debug, Default)]
pub struct RsyncUtils;

impl RsyncUtils {
    /// Synchronise a directory to a target path, optionally on a remote host.
    ///
    /// Without a host the target is created locally; with a host the target
    /// is `host:target` over SSH. Errors surface to the caller.
    pub async fn put(
        &self,
        src: &Path,
        target: &Path,
        host: Option<&str>,
    ) -> Result<(), PublishError> {
        let src_arg = format!("{}/", src.display());
        let target_arg = match host {
            Some(host) => format!("{host}:{}", target.display()),
            None => {
                if let Some(parent) = target.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                target.display().to_string()
            }
        };

        info!(target: "carta.rsync", src = %src_arg, target = %target_arg, "rsync put");
        let output = tokio::process::Command::new("rsync")
            .arg("-a")
            .arg(&src_arg)
            .arg(&target_arg)
            .output()
            .await?;
        if !output.status.success() {
            return Err(PublishError::Rsync {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(())
    }
}
