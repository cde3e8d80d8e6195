use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single geolocated, timestamped sample (GPX `<wpt>`).
///
/// Every optional field may be absent independently of the others, and an
/// absent value is never conflated with zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Waypoint {
    pub latitude: f64,
    pub longitude: f64,
    pub time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation: Option<f64>,
    /// GPX `hdop`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizontal_accuracy: Option<f64>,
    /// GPX `vdop`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical_accuracy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
}

impl Waypoint {
    pub fn new(latitude: f64, longitude: f64, time: DateTime<Utc>) -> Self {
        Self {
            latitude,
            longitude,
            time,
            name: None,
            description: None,
            elevation: None,
            horizontal_accuracy: None,
            vertical_accuracy: None,
            speed: None,
        }
    }

    pub fn with_name(self, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..self
        }
    }

    pub fn with_description(self, description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..self
        }
    }

    pub fn with_elevation(self, elevation: f64) -> Self {
        Self {
            elevation: Some(elevation),
            ..self
        }
    }

    pub fn with_horizontal_accuracy(self, hdop: f64) -> Self {
        Self {
            horizontal_accuracy: Some(hdop),
            ..self
        }
    }

    pub fn with_vertical_accuracy(self, vdop: f64) -> Self {
        Self {
            vertical_accuracy: Some(vdop),
            ..self
        }
    }

    pub fn with_speed(self, speed: f64) -> Self {
        Self {
            speed: Some(speed),
            ..self
        }
    }
}
