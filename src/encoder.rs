use std::io::Write;

use chrono::SecondsFormat;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::options::EncodeOptions;
use crate::waypoint::Waypoint;

/// Encode waypoints into a GPX document, escaping text content.
pub fn encode(waypoints: &[Waypoint]) -> String {
    encode_with(waypoints, &EncodeOptions::default())
}

/// Encode waypoints into a GPX document.
pub fn encode_with(waypoints: &[Waypoint], opts: &EncodeOptions) -> String {
    let mut buf = Vec::new();
    encode_to_writer(waypoints, opts, &mut buf).expect("writing to a Vec cannot fail");
    String::from_utf8_lossy(&buf).into_owned()
}

/// Stream a GPX document into `out`. One `<wpt>` per waypoint, in input order.
pub fn encode_to_writer<W: Write>(
    waypoints: &[Waypoint],
    opts: &EncodeOptions,
    out: W,
) -> std::io::Result<()> {
    let mut w = Writer::new_with_indent(out, b' ', 4);
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    w.write_event(Event::Start(BytesStart::new("gpx")))?;

    for wpt in waypoints {
        write_waypoint(&mut w, wpt, opts)?;
    }

    w.write_event(Event::End(BytesEnd::new("gpx")))?;
    w.get_mut().write_all(b"\n")
}

fn write_waypoint<W: Write>(
    w: &mut Writer<W>,
    wpt: &Waypoint,
    opts: &EncodeOptions,
) -> std::io::Result<()> {
    let mut start = BytesStart::new("wpt");
    start.push_attribute(("lat", format_number(wpt.latitude).as_str()));
    start.push_attribute(("lon", format_number(wpt.longitude).as_str()));
    w.write_event(Event::Start(start))?;

    let time = wpt.time.to_rfc3339_opts(SecondsFormat::AutoSi, true);
    write_text_element(w, "time", &time, true)?;

    if let Some(name) = &wpt.name {
        write_text_element(w, "name", name, opts.escape_text)?;
    }
    if let Some(desc) = &wpt.description {
        write_text_element(w, "desc", desc, opts.escape_text)?;
    }

    let numeric = [
        ("ele", wpt.elevation),
        ("hdop", wpt.horizontal_accuracy),
        ("vdop", wpt.vertical_accuracy),
        ("speed", wpt.speed),
    ];
    for (tag, value) in numeric {
        if let Some(v) = value {
            write_text_element(w, tag, &format_number(v), true)?;
        }
    }

    w.write_event(Event::End(BytesEnd::new("wpt")))
}

fn write_text_element<W: Write>(
    w: &mut Writer<W>,
    tag: &str,
    text: &str,
    escape: bool,
) -> std::io::Result<()> {
    let content = if escape {
        BytesText::new(text)
    } else {
        BytesText::from_escaped(text)
    };
    w.write_event(Event::Start(BytesStart::new(tag)))?;
    w.write_event(Event::Text(content))?;
    w.write_event(Event::End(BytesEnd::new(tag)))
}

/// Shortest decimal text that parses back to the same value; `.` separator, no grouping.
fn format_number(v: f64) -> String {
    format!("{v}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn t0() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn trimmed_lines(xml: &str) -> Vec<&str> {
        xml.lines().map(str::trim).filter(|l| !l.is_empty()).collect()
    }

    #[test]
    fn test_empty_document() {
        let xml = encode(&[]);
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains("<gpx>"));
        assert!(xml.contains("</gpx>"));
        assert!(!xml.contains("<wpt"));
    }

    #[test]
    fn test_child_order_and_omission() {
        let wpt = Waypoint::new(37.1, -122.1, t0())
            .with_name("A")
            .with_elevation(10.5)
            .with_speed(2.3);
        let xml = encode(&[wpt]);
        assert_eq!(
            trimmed_lines(&xml),
            vec![
                r#"<?xml version="1.0" encoding="UTF-8"?>"#,
                "<gpx>",
                r#"<wpt lat="37.1" lon="-122.1">"#,
                "<time>2024-01-01T00:00:00Z</time>",
                "<name>A</name>",
                "<ele>10.5</ele>",
                "<speed>2.3</speed>",
                "</wpt>",
                "</gpx>",
            ]
        );
    }

    #[test]
    fn test_all_fields_in_fixed_order() {
        let wpt = Waypoint::new(1.0, 2.0, t0())
            .with_speed(6.0)
            .with_vertical_accuracy(5.0)
            .with_horizontal_accuracy(4.0)
            .with_elevation(3.0)
            .with_description("d")
            .with_name("n");
        let xml = encode(&[wpt]);
        let tags = ["<time>", "<name>", "<desc>", "<ele>", "<hdop>", "<vdop>", "<speed>"];
        let positions: Vec<usize> = tags.iter().map(|t| xml.find(t).unwrap()).collect();
        assert!(positions.windows(2).all(|p| p[0] < p[1]));
    }

    #[test]
    fn test_fractional_seconds_kept() {
        let t = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap()
            + chrono::Duration::milliseconds(250);
        let xml = encode(&[Waypoint::new(0.0, 0.0, t)]);
        assert!(xml.contains("<time>2024-05-06T07:08:09.250Z</time>"));
    }

    #[test]
    fn test_text_escaped_by_default() {
        let wpt = Waypoint::new(0.0, 0.0, t0()).with_name("Fish & <Chips>");
        let xml = encode(&[wpt]);
        assert!(xml.contains("<name>Fish &amp; &lt;Chips&gt;</name>"));
    }

    #[test]
    fn test_verbatim_text_when_escaping_disabled() {
        let wpt = Waypoint::new(0.0, 0.0, t0()).with_description(r#"{"speedAccuracy": 1}"#);
        let xml = encode_with(&[wpt], &EncodeOptions { escape_text: false });
        assert!(xml.contains(r#"<desc>{"speedAccuracy": 1}</desc>"#));
    }

    #[test]
    fn test_numbers_are_locale_independent() {
        let wpt = Waypoint::new(1234567.25, -0.5, t0()).with_elevation(1000000.0);
        let xml = encode(&[wpt]);
        assert!(xml.contains(r#"lat="1234567.25""#));
        assert!(xml.contains(r#"lon="-0.5""#));
        assert!(xml.contains("<ele>1000000</ele>"));
    }

    #[test]
    fn test_string_output_matches_writer_output() {
        let wpts = vec![Waypoint::new(1.0, 2.0, t0()).with_name("Café <1>")];
        let mut buf = Vec::new();
        encode_to_writer(&wpts, &EncodeOptions::default(), &mut buf).unwrap();
        assert_eq!(encode(&wpts).into_bytes(), buf);
    }
}
