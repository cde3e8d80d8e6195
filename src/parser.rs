use std::path::Path;

use chrono::{DateTime, Utc};
use log::debug;
use quick_xml::Reader;
use quick_xml::events::{BytesRef, BytesStart, Event};

use crate::error::GpxError;
use crate::waypoint::Waypoint;

type Result<T> = std::result::Result<T, GpxError>;

/// Decode a GPX document into waypoints, in document order.
///
/// Fail-soft: a document that is not well-formed XML yields an empty list,
/// `<wpt>` elements without numeric `lat`/`lon` are skipped, and unparseable
/// child values are left absent.
pub fn decode(bytes: &[u8]) -> Vec<Waypoint> {
    GpxDecoder::new().decode(bytes)
}

pub fn decode_str(xml: &str) -> Vec<Waypoint> {
    decode(xml.as_bytes())
}

/// Like [`decode`], but reports a malformed document instead of discarding it.
pub fn decode_strict(bytes: &[u8]) -> Result<Vec<Waypoint>> {
    GpxDecoder::new().decode_strict(bytes)
}

/// Read and fail-soft decode a GPX file. Only I/O failures are reported.
pub fn decode_file<P: AsRef<Path>>(path: P) -> Result<Vec<Waypoint>> {
    let bytes = std::fs::read(path)?;
    Ok(decode(&bytes))
}

/// Recognized `<wpt>` children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Time,
    Desc,
    Ele,
    Hdop,
    Vdop,
    Speed,
}

impl Field {
    fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"name" => Some(Self::Name),
            b"time" => Some(Self::Time),
            b"desc" => Some(Self::Desc),
            b"ele" => Some(Self::Ele),
            b"hdop" => Some(Self::Hdop),
            b"vdop" => Some(Self::Vdop),
            b"speed" => Some(Self::Speed),
            _ => None,
        }
    }
}

/// Values collected for the `<wpt>` currently being read.
#[derive(Debug)]
struct PendingWaypoint {
    latitude: f64,
    longitude: f64,
    time: Option<DateTime<Utc>>,
    name: Option<String>,
    description: Option<String>,
    elevation: Option<f64>,
    horizontal_accuracy: Option<f64>,
    vertical_accuracy: Option<f64>,
    speed: Option<f64>,
    /// Child element whose text is being captured, with the text so far.
    capture: Option<(Field, String)>,
}

impl PendingWaypoint {
    fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            time: None,
            name: None,
            description: None,
            elevation: None,
            horizontal_accuracy: None,
            vertical_accuracy: None,
            speed: None,
            capture: None,
        }
    }

    /// Store a captured value. A field that already holds a value keeps it.
    fn commit(&mut self, field: Field, raw: &str) {
        let value = raw.trim();
        match field {
            Field::Name => fill(&mut self.name, || Some(value.to_string())),
            Field::Desc => fill(&mut self.description, || Some(value.to_string())),
            Field::Time => fill(&mut self.time, || parse_time(value)),
            Field::Ele => fill(&mut self.elevation, || value.parse().ok()),
            Field::Hdop => fill(&mut self.horizontal_accuracy, || value.parse().ok()),
            Field::Vdop => fill(&mut self.vertical_accuracy, || value.parse().ok()),
            Field::Speed => fill(&mut self.speed, || value.parse().ok()),
        }
    }

    fn into_waypoint(self, fallback_time: DateTime<Utc>) -> Waypoint {
        Waypoint {
            latitude: self.latitude,
            longitude: self.longitude,
            time: self.time.unwrap_or(fallback_time),
            name: self.name,
            description: self.description,
            elevation: self.elevation,
            horizontal_accuracy: self.horizontal_accuracy,
            vertical_accuracy: self.vertical_accuracy,
            speed: self.speed,
        }
    }
}

fn fill<T>(slot: &mut Option<T>, value: impl FnOnce() -> Option<T>) {
    if slot.is_none() {
        *slot = value();
    }
}

fn parse_time(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[derive(Debug)]
enum State {
    Idle,
    InsideWpt(PendingWaypoint),
}

/// Event-driven GPX waypoint decoder.
///
/// `Idle -> InsideWpt` on a `<wpt>` start tag with valid `lat`/`lon`,
/// `InsideWpt -> Idle` on `</wpt>`, which emits one waypoint. A `<wpt>`
/// start tag seen while a waypoint is already open is treated like any
/// other unrecognized child, so the first `</wpt>` closes the open waypoint.
///
/// Waypoints without a usable `<time>` all receive the same fallback
/// instant, captured when the decoder is created.
#[derive(Debug)]
pub struct GpxDecoder {
    fallback_time: DateTime<Utc>,
    state: State,
    waypoints: Vec<Waypoint>,
}

impl Default for GpxDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl GpxDecoder {
    pub fn new() -> Self {
        Self::with_fallback_time(Utc::now())
    }

    pub fn with_fallback_time(fallback_time: DateTime<Utc>) -> Self {
        Self {
            fallback_time,
            state: State::Idle,
            waypoints: Vec::new(),
        }
    }

    pub fn fallback_time(&self) -> DateTime<Utc> {
        self.fallback_time
    }

    pub fn on_start(&mut self, e: &BytesStart<'_>) {
        let tag = e.local_name();
        if let State::InsideWpt(pending) = &mut self.state {
            if let Some(field) = Field::from_tag(tag.as_ref()) {
                pending.capture = Some((field, String::new()));
            }
            return;
        }

        if tag.as_ref() == b"wpt" {
            if let Some((lat, lon)) = parse_lat_lon(e) {
                self.state = State::InsideWpt(PendingWaypoint::new(lat, lon));
            }
        }
    }

    pub fn on_text(&mut self, text: &str) {
        if let State::InsideWpt(PendingWaypoint {
            capture: Some((_, buf)),
            ..
        }) = &mut self.state
        {
            buf.push_str(text);
        }
    }

    pub fn on_end(&mut self, local_name: &[u8]) {
        let State::InsideWpt(pending) = &mut self.state else {
            return;
        };

        if local_name == b"wpt" {
            if let State::InsideWpt(pending) = std::mem::replace(&mut self.state, State::Idle) {
                self.waypoints.push(pending.into_waypoint(self.fallback_time));
            }
            return;
        }

        let closes_capture = matches!(
            &pending.capture,
            Some((field, _)) if Field::from_tag(local_name) == Some(*field)
        );
        if closes_capture {
            if let Some((field, text)) = pending.capture.take() {
                pending.commit(field, &text);
            }
        }
    }

    /// Waypoints emitted so far. An unterminated `<wpt>` is dropped.
    pub fn finish(self) -> Vec<Waypoint> {
        self.waypoints
    }

    pub fn decode(self, bytes: &[u8]) -> Vec<Waypoint> {
        match self.decode_strict(bytes) {
            Ok(waypoints) => waypoints,
            Err(e) => {
                debug!("discarding malformed GPX document: {e}");
                Vec::new()
            }
        }
    }

    pub fn decode_strict(mut self, bytes: &[u8]) -> Result<Vec<Waypoint>> {
        let mut reader = Reader::from_reader(bytes);
        let mut depth = 0usize;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    depth += 1;
                    self.on_start(&e);
                }
                Event::Empty(e) => {
                    self.on_start(&e);
                    self.on_end(e.local_name().as_ref());
                }
                Event::End(e) => {
                    depth = depth.saturating_sub(1);
                    self.on_end(e.local_name().as_ref());
                }
                Event::Text(e) => {
                    self.on_text(std::str::from_utf8(e.as_ref()).unwrap_or_default());
                }
                Event::CData(e) => {
                    self.on_text(std::str::from_utf8(e.as_ref()).unwrap_or_default());
                }
                Event::GeneralRef(e) => {
                    if let Some(ch) = resolve_reference(&e) {
                        let mut utf8 = [0u8; 4];
                        self.on_text(ch.encode_utf8(&mut utf8));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if depth > 0 {
            return Err(GpxError::Truncated {
                open_elements: depth,
            });
        }
        Ok(self.finish())
    }
}

/// Read numeric `lat`/`lon` attributes. `None` if either is missing or invalid.
fn parse_lat_lon(e: &BytesStart<'_>) -> Option<(f64, f64)> {
    let mut lat: Option<f64> = None;
    let mut lon: Option<f64> = None;

    for attr in e.attributes() {
        let attr = attr.ok()?;
        let val = std::str::from_utf8(&attr.value).ok()?;
        match attr.key.local_name().as_ref() {
            b"lat" => lat = Some(val.parse().ok()?),
            b"lon" => lon = Some(val.parse().ok()?),
            _ => {}
        }
    }

    Some((lat?, lon?))
}

/// Character references (`&#60;`, `&#x3C;`) and the predefined XML entities.
fn resolve_reference(e: &BytesRef<'_>) -> Option<char> {
    if let Ok(Some(ch)) = e.resolve_char_ref() {
        return Some(ch);
    }
    match std::str::from_utf8(e.as_ref()).unwrap_or_default() {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => None,
    }
}
