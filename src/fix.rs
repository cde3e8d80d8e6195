use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::waypoint::Waypoint;

/// Sentinel used by location sources for an unknown value.
pub const UNKNOWN: f64 = -1.0;

/// A position fix as reported by a location source.
///
/// Accuracies and speed are negative when the source could not determine
/// them; altitude uses [`UNKNOWN`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub horizontal_accuracy: f64,
    pub vertical_accuracy: f64,
    pub speed: f64,
    pub speed_accuracy: f64,
    pub timestamp: DateTime<Utc>,
}

impl From<&LocationFix> for Waypoint {
    /// Speed accuracy has no GPX element, so it travels in `desc` as JSON.
    fn from(fix: &LocationFix) -> Self {
        Waypoint {
            latitude: fix.latitude,
            longitude: fix.longitude,
            time: fix.timestamp,
            name: None,
            description: Some(json!({ "speedAccuracy": fix.speed_accuracy }).to_string()),
            elevation: Some(fix.altitude),
            horizontal_accuracy: Some(fix.horizontal_accuracy),
            vertical_accuracy: Some(fix.vertical_accuracy),
            speed: Some(fix.speed),
        }
    }
}

impl From<&Waypoint> for LocationFix {
    fn from(wpt: &Waypoint) -> Self {
        LocationFix {
            latitude: wpt.latitude,
            longitude: wpt.longitude,
            altitude: wpt.elevation.unwrap_or(UNKNOWN),
            horizontal_accuracy: wpt.horizontal_accuracy.unwrap_or(UNKNOWN),
            vertical_accuracy: wpt.vertical_accuracy.unwrap_or(UNKNOWN),
            speed: wpt.speed.unwrap_or(UNKNOWN),
            speed_accuracy: UNKNOWN,
            timestamp: wpt.time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fix() -> LocationFix {
        LocationFix {
            latitude: 37.5,
            longitude: 127.0,
            altitude: 42.0,
            horizontal_accuracy: 5.0,
            vertical_accuracy: 3.0,
            speed: 1.5,
            speed_accuracy: 0.5,
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_fix_to_waypoint() {
        let wpt = Waypoint::from(&fix());
        assert_eq!(wpt.name, None);
        assert_eq!(wpt.elevation, Some(42.0));
        assert_eq!(wpt.horizontal_accuracy, Some(5.0));
        assert_eq!(wpt.vertical_accuracy, Some(3.0));
        assert_eq!(wpt.speed, Some(1.5));
        let desc: serde_json::Value =
            serde_json::from_str(wpt.description.as_deref().unwrap()).unwrap();
        assert_eq!(desc["speedAccuracy"], 0.5);
    }

    #[test]
    fn test_waypoint_to_fix_uses_sentinels() {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let wpt = Waypoint::new(1.0, 2.0, t).with_speed(3.0);
        let fix = LocationFix::from(&wpt);
        assert_eq!(fix.speed, 3.0);
        assert_eq!(fix.altitude, UNKNOWN);
        assert_eq!(fix.horizontal_accuracy, UNKNOWN);
        assert_eq!(fix.vertical_accuracy, UNKNOWN);
        assert_eq!(fix.speed_accuracy, UNKNOWN);
        assert_eq!(fix.timestamp, t);
    }
}
