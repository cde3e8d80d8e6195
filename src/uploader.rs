use std::sync::Arc;

use log::{info, warn};
use serde::Deserialize;
use url::Url;

use crate::correlation::CorrelationIdGenerator;
use crate::encoder::encode_with;
use crate::error::{TransportError, UploadError};
use crate::http::{HttpRequest, Method, Transport};
use crate::multipart::MultipartForm;
use crate::network_log::{LogSink, LoggedTransport, NetworkLogger};
use crate::options::{UploadLocation, UploadOptions};
use crate::parser;
use crate::waypoint::Waypoint;

type Result<T> = std::result::Result<T, UploadError>;

/// Collector reply to an upload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub download_url: String,
}

/// Sends waypoint batches to a collector. Every call is logged as a
/// correlated request/response pair.
#[derive(Debug)]
pub struct Uploader<T> {
    transport: LoggedTransport<T>,
    options: UploadOptions,
}

impl<T: Transport + Send + Sync> Uploader<T> {
    pub fn new(transport: T, ids: Arc<CorrelationIdGenerator>, sink: Arc<dyn LogSink>) -> Self {
        Self::with_options(transport, ids, sink, UploadOptions::default())
    }

    pub fn with_options(
        transport: T,
        ids: Arc<CorrelationIdGenerator>,
        sink: Arc<dyn LogSink>,
        options: UploadOptions,
    ) -> Self {
        let logger = NetworkLogger::new(ids, sink).with_target(options.log_target.clone());
        Self {
            transport: LoggedTransport::new(transport, logger),
            options,
        }
    }

    pub fn options(&self) -> &UploadOptions {
        &self.options
    }

    /// Build the multipart POST carrying the encoded waypoints.
    pub fn build_request(&self, waypoints: &[Waypoint], destination: &str) -> Result<HttpRequest> {
        let url = parse_destination(destination)?;
        let xml = encode_with(waypoints, &self.options.encode);
        let form = MultipartForm::new().file_part(
            &self.options.field_name,
            &self.options.file_name,
            &self.options.mime_type,
            xml.as_bytes(),
        );

        Ok(HttpRequest::new(Method::Post, url)
            .header("Content-Type", form.content_type())
            .body(form.finish()))
    }

    /// Upload `waypoints` and return the collector's download URL.
    pub async fn upload(&self, waypoints: &[Waypoint], destination: &str) -> Result<String> {
        match self.try_upload(waypoints, destination).await {
            Ok(res) => {
                info!("upload succeeded, downloadUrl: {}", res.download_url);
                Ok(res.download_url)
            }
            Err(e) => {
                warn!("upload failed: {e}");
                Err(e)
            }
        }
    }

    pub async fn upload_to(&self, waypoints: &[Waypoint], location: &UploadLocation) -> Result<String> {
        self.upload(waypoints, location.uri()).await
    }

    async fn try_upload(&self, waypoints: &[Waypoint], destination: &str) -> Result<UploadResponse> {
        let request = self.build_request(waypoints, destination)?;
        let response = self.transport.send(&request).await?;

        if !response.is_success() {
            return Err(TransportError::Status {
                status: response.status,
                body: String::from_utf8_lossy(&response.body).into_owned(),
            }
            .into());
        }

        Ok(serde_json::from_slice(&response.body)?)
    }

    /// Download a GPX document and decode it fail-soft.
    pub async fn fetch_waypoints(&self, source: &str) -> Result<Vec<Waypoint>> {
        let url = parse_destination(source)?;
        let request = HttpRequest::new(Method::Get, url);

        match self.transport.send(&request).await {
            Ok(response) if response.is_success() => {
                let waypoints = parser::decode(&response.body);
                info!("fetched GPX from {source}, count: {}", waypoints.len());
                Ok(waypoints)
            }
            Ok(response) => {
                let err = TransportError::Status {
                    status: response.status,
                    body: String::from_utf8_lossy(&response.body).into_owned(),
                };
                warn!("fetching GPX from {source} failed: {err}");
                Err(err.into())
            }
            Err(e) => {
                warn!("fetching GPX from {source} failed: {e}");
                Err(e.into())
            }
        }
    }
}

fn parse_destination(destination: &str) -> Result<Url> {
    Url::parse(destination).map_err(|reason| UploadError::InvalidDestination {
        destination: destination.to_string(),
        reason,
    })
}
