use wasm_bindgen::JsValue;

/// Failures reported by the strict decoder and file loading.
/// The default decode path is fail-soft and never produces these.
#[derive(Debug)]
pub enum GpxError {
    XmlParse(quick_xml::Error),
    Truncated { open_elements: usize },
    Io(std::io::Error),
}

impl std::fmt::Display for GpxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::XmlParse(e) => write!(f, "XML parse error: {e}"),
            Self::Truncated { open_elements } => write!(
                f,
                "Malformed document: {open_elements} element(s) left open at end of input"
            ),
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for GpxError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::XmlParse(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::Truncated { .. } => None,
        }
    }
}

impl From<quick_xml::Error> for GpxError {
    fn from(e: quick_xml::Error) -> Self {
        Self::XmlParse(e)
    }
}

impl From<std::io::Error> for GpxError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Failure of the HTTP collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    Connect(String),
    Timeout,
    /// The in-flight call was dropped before the transport completed.
    Cancelled,
    /// The collector answered with a non-2xx status.
    Status { status: u16, body: String },
    Other(String),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connect(msg) => write!(f, "could not connect: {msg}"),
            Self::Timeout => write!(f, "request timed out"),
            Self::Cancelled => write!(f, "request cancelled"),
            Self::Status { status, body } if body.is_empty() => {
                write!(f, "collector responded with HTTP {status}")
            }
            Self::Status { status, body } => {
                write!(f, "collector responded with HTTP {status}: {body}")
            }
            Self::Other(msg) => write!(f, "transport error: {msg}"),
        }
    }
}

impl std::error::Error for TransportError {}

#[derive(Debug)]
pub enum UploadError {
    /// The destination does not form a valid URL. Raised before any network attempt.
    InvalidDestination {
        destination: String,
        reason: url::ParseError,
    },
    Transport(TransportError),
    /// The collector's body is not JSON or lacks `downloadUrl`.
    ResponseDecode(serde_json::Error),
}

impl std::fmt::Display for UploadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDestination {
                destination,
                reason,
            } => write!(f, "Invalid destination '{destination}': {reason}"),
            Self::Transport(e) => write!(f, "Upload failed: {e}"),
            Self::ResponseDecode(e) => write!(f, "Could not decode collector response: {e}"),
        }
    }
}

impl std::error::Error for UploadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidDestination { reason, .. } => Some(reason),
            Self::Transport(e) => Some(e),
            Self::ResponseDecode(e) => Some(e),
        }
    }
}

impl From<TransportError> for UploadError {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

impl From<serde_json::Error> for UploadError {
    fn from(e: serde_json::Error) -> Self {
        Self::ResponseDecode(e)
    }
}

impl From<GpxError> for JsValue {
    fn from(e: GpxError) -> Self {
        JsValue::from_str(&e.to_string())
    }
}
