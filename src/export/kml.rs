//! KML visualization document.
//!
//! Layout: a document-wide default style, then per device (sorted by device
//! id) a colour style and a folder holding one `LineString` placemark for the
//! whole path followed by one `Point` placemark per sample.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use quick_xml::escape::escape;

use super::format_timestamp;
use crate::error::{IoResultExt, Result};
use crate::geo_utils::polyline_length;
use crate::DerivedSample;

/// Line/icon colours (KML `aabbggrr`): red, green, blue, yellow, magenta.
const COLORS: [&str; 5] = ["ff0000ff", "ff00ff00", "ffff0000", "ff00ffff", "ffff00ff"];

const DEFAULT_COLOR: &str = "ff0000ff";

/// Write the KML document to a file.
pub fn write_kml(path: &Path, samples: &[DerivedSample]) -> Result<()> {
    let file = File::create(path).with_path(path)?;
    let mut out = BufWriter::new(file);
    write_kml_to(&mut out, samples).with_path(path)?;
    out.flush().with_path(path)?;
    log::info!(
        "[Export] Wrote {} placemarks to {}",
        samples.len(),
        path.display()
    );
    Ok(())
}

/// Write the KML document to any sink.
///
/// Samples are regrouped by device and each group re-sorted by timestamp
/// (stable) before rendering, whatever order they arrive in.
pub fn write_kml_to<W: Write>(out: &mut W, samples: &[DerivedSample]) -> io::Result<()> {
    let mut groups: BTreeMap<&str, Vec<&DerivedSample>> = BTreeMap::new();
    for sample in samples {
        groups.entry(sample.device_id()).or_default().push(sample);
    }

    writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(out, r#"<kml xmlns="http://www.opengis.net/kml/2.2">"#)?;
    writeln!(out, "<Document>")?;
    writeln!(out, "  <name>GPS Trajectories</name>")?;
    writeln!(out, "  <description>GPS data processed by track-processor</description>")?;
    write_style(out, "defaultStyle", DEFAULT_COLOR)?;

    for (index, (device_id, mut group)) in groups.into_iter().enumerate() {
        group.sort_by_key(|s| s.timestamp());
        let style_id = format!("style_{}", index + 1);
        write_style(out, &style_id, COLORS[index % COLORS.len()])?;

        writeln!(out, "  <Folder>")?;
        writeln!(out, "    <name>Device {}</name>", escape(device_id))?;
        write_path(out, device_id, &style_id, &group)?;
        for (i, sample) in group.iter().enumerate() {
            write_point(out, device_id, &style_id, i + 1, sample)?;
        }
        writeln!(out, "  </Folder>")?;
    }

    writeln!(out, "</Document>")?;
    writeln!(out, "</kml>")?;
    Ok(())
}

fn write_style<W: Write>(out: &mut W, id: &str, color: &str) -> io::Result<()> {
    writeln!(out, r#"  <Style id="{}">"#, id)?;
    writeln!(out, "    <LineStyle>")?;
    writeln!(out, "      <color>{}</color>", color)?;
    writeln!(out, "      <width>4</width>")?;
    writeln!(out, "    </LineStyle>")?;
    writeln!(out, "    <IconStyle>")?;
    writeln!(out, "      <color>{}</color>", color)?;
    writeln!(out, "      <scale>0.5</scale>")?;
    writeln!(out, "    </IconStyle>")?;
    writeln!(out, "  </Style>")
}

fn write_path<W: Write>(
    out: &mut W,
    device_id: &str,
    style_id: &str,
    group: &[&DerivedSample],
) -> io::Result<()> {
    // Groups come from non-empty buckets
    let (Some(first), Some(last)) = (group.first(), group.last()) else {
        return Ok(());
    };
    let points: Vec<_> = group.iter().map(|s| s.sample.point()).collect();

    writeln!(out, "    <Placemark>")?;
    writeln!(out, "      <name>Trajectory of Device {}</name>", escape(device_id))?;
    writeln!(out, "      <description><![CDATA[")?;
    writeln!(out, "Number of points: {}<br>", group.len())?;
    writeln!(out, "Start time: {}<br>", format_timestamp(&first.timestamp()))?;
    writeln!(out, "End time: {}<br>", format_timestamp(&last.timestamp()))?;
    writeln!(out, "Path length: {:.3} km<br>", polyline_length(&points))?;
    writeln!(out, "      ]]></description>")?;
    writeln!(out, "      <styleUrl>#{}</styleUrl>", style_id)?;
    writeln!(out, "      <LineString>")?;
    writeln!(out, "        <extrude>1</extrude>")?;
    writeln!(out, "        <tessellate>1</tessellate>")?;
    writeln!(out, "        <altitudeMode>clampToGround</altitudeMode>")?;
    writeln!(out, "        <coordinates>")?;
    for p in &points {
        writeln!(out, "          {:.6},{:.6},0", p.longitude, p.latitude)?;
    }
    writeln!(out, "        </coordinates>")?;
    writeln!(out, "      </LineString>")?;
    writeln!(out, "    </Placemark>")
}

fn write_point<W: Write>(
    out: &mut W,
    device_id: &str,
    style_id: &str,
    number: usize,
    derived: &DerivedSample,
) -> io::Result<()> {
    let s = &derived.sample;

    writeln!(out, "    <Placemark>")?;
    writeln!(out, "      <name>Point {} (Device {})</name>", number, escape(device_id))?;
    writeln!(out, "      <description><![CDATA[")?;
    writeln!(out, "ID: {}<br>", cdata_safe(&s.device_id))?;
    writeln!(out, "Latitude: {:.6}<br>", s.latitude)?;
    writeln!(out, "Longitude: {:.6}<br>", s.longitude)?;
    writeln!(out, "Timestamp: {}<br>", format_timestamp(&s.timestamp))?;
    writeln!(out, "Original Row: {}<br>", s.row)?;
    writeln!(out, "Previous Row: {}<br>", derived.predecessor_row())?;
    if let Some(prev) = &derived.predecessor {
        writeln!(out, "Previous Latitude: {:.6}<br>", prev.latitude)?;
        writeln!(out, "Previous Longitude: {:.6}<br>", prev.longitude)?;
        writeln!(out, "Previous Timestamp: {}<br>", format_timestamp(&prev.timestamp))?;
        writeln!(out, "Time Difference: {:.2} seconds<br>", derived.elapsed_seconds)?;
        writeln!(out, "Distance: {:.6} km<br>", derived.distance_km)?;
        writeln!(out, "Speed: {:.2} km/h<br>", derived.speed_kmh)?;
    }
    writeln!(out, "      ]]></description>")?;
    writeln!(out, "      <styleUrl>#{}</styleUrl>", style_id)?;
    writeln!(out, "      <Point>")?;
    writeln!(out, "        <coordinates>")?;
    writeln!(out, "          {:.6},{:.6},0", s.longitude, s.latitude)?;
    writeln!(out, "        </coordinates>")?;
    writeln!(out, "      </Point>")?;
    writeln!(out, "    </Placemark>")
}

/// Split any `]]>` so free text cannot terminate a CDATA section early.
fn cdata_safe(text: &str) -> String {
    text.replace("]]>", "]]]]><![CDATA[>")
}
