use serde::Deserialize;

/// Options for GPX encoding.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodeOptions {
    /// XML-escape `name`/`desc` text (default: true).
    /// `false` writes the text verbatim, matching legacy collector output
    /// byte for byte at the cost of well-formedness for `<`, `&` and friends.
    #[serde(default = "default_true")]
    pub escape_text: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self { escape_text: true }
    }
}

/// Options for uploading a waypoint batch to a collector.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOptions {
    /// Form field of the file part (default: "file")
    #[serde(default = "default_field_name")]
    pub field_name: String,

    /// Filename of the file part (default: "sample.gpx")
    #[serde(default = "default_file_name")]
    pub file_name: String,

    /// Content-Type of the file part (default: "text/plain")
    #[serde(default = "default_mime_type")]
    pub mime_type: String,

    /// Target handed to the log sink for request/response records (default: "network")
    #[serde(default = "default_log_target")]
    pub log_target: String,

    #[serde(default)]
    pub encode: EncodeOptions,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            field_name: default_field_name(),
            file_name: default_file_name(),
            mime_type: default_mime_type(),
            log_target: default_log_target(),
            encode: EncodeOptions::default(),
        }
    }
}

/// Known collector endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadLocation {
    Localhost,
    Custom(String),
}

impl UploadLocation {
    pub fn uri(&self) -> &str {
        match self {
            Self::Localhost => "http://localhost:3206/gpx",
            Self::Custom(uri) => uri,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_field_name() -> String {
    "file".to_string()
}

fn default_file_name() -> String {
    "sample.gpx".to_string()
}

fn default_mime_type() -> String {
    "text/plain".to_string()
}

fn default_log_target() -> String {
    "network".to_string()
}
