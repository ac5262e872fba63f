//! Parsing of `identify -verbose` output (ImageMagick and GraphicsMagick).
//!
//! The output is an indented tree:
//!
//! ```text
//! Image: a.png
//!   Format: PNG (Portable Network Graphics)
//!   Geometry: 100x100+0+0
//!   Channel depth:
//!     red: 8-bit
//!     green: 8-bit
//! ```
//!
//! Nested entries are flattened by joining the section names with `:`, so the
//! tree above yields `Format`, `Geometry`, `Channel depth:red` and
//! `Channel depth:green`.

use crate::metadata::MetadataMap;

pub const FORMAT: &str = "Format";
pub const GEOMETRY: &str = "Geometry";
pub const WIDTH: &str = "Width";
pub const HEIGHT: &str = "Height";
pub const RESOLUTION: &str = "Resolution";
pub const UNITS: &str = "Units";
pub const COLORSPACE: &str = "Colorspace";

/// GIF files carry no resolution. This is what they are reported with instead.
pub const GIF_RESOLUTION: &str = "72x72";

const INDENT_WIDTH: usize = 2;

pub fn parse_verbose(output: &str) -> MetadataMap {
    let mut map = MetadataMap::new();
    let mut sections: Vec<&str> = Vec::new();

    for line in output.lines() {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        let level = (line.len() - line.trim_start().len()) / INDENT_WIDTH;

        let (name, value) = if let Some((name, value)) = text.split_once(": ") {
            (name.trim(), value.trim())
        } else if let Some(name) = text.strip_suffix(':') {
            (name.trim(), "")
        } else {
            continue;
        };

        // Top level is the "Image:" line that starts each frame.
        if level == 0 {
            sections.clear();
            continue;
        }

        sections.truncate(level - 1);
        if value.is_empty() {
            sections.push(name);
            continue;
        }

        let key = if sections.is_empty() {
            name.to_string()
        } else {
            format!("{}:{}", sections.join(":"), name)
        };
        map.insert(key, value);
    }

    add_dimensions(&mut map);
    map
}

/// Adds `Width` and `Height` taken from a `WxH+X+Y` geometry.
fn add_dimensions(map: &mut MetadataMap) {
    let Some((width, height)) = map.get(GEOMETRY).and_then(parse_geometry) else {
        return;
    };
    if !map.contains_key(WIDTH) {
        map.insert(WIDTH, width);
    }
    if !map.contains_key(HEIGHT) {
        map.insert(HEIGHT, height);
    }
}

fn parse_geometry(geometry: &str) -> Option<(String, String)> {
    let size = geometry.split('+').next()?;
    let (width, height) = size.split_once('x')?;
    let width = width.trim();
    let height = height.trim();
    if width.is_empty() || height.is_empty() {
        return None;
    }
    Some((width.to_string(), height.to_string()))
}

/// Whether a `Format` value names GIF, e.g. `GIF (CompuServe graphics interchange format)`.
pub fn is_gif_format(format: &str) -> bool {
    format
        .trim_start()
        .get(..3)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("gif"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_VERBOSE: &str = "Image: a.png
  Format: PNG (Portable Network Graphics)
  Mime type: image/png
  Class: DirectClass
  Geometry: 100x100+0+0
  Resolution: 37.79x37.79
  Print size: 2.64619x2.64619
  Units: PixelsPerCentimeter
  Type: TrueColor
  Colorspace: sRGB
  Channel depth:
    red: 8-bit
    green: 8-bit
    blue: 8-bit
  Channel statistics:
    Red:
      min: 0 (0)
      max: 255 (1)
  Properties:
    date:create: 2014-10-08T15:32:01+02:00
  Page geometry: 100x100+0+0
  Filesize: 2.4KB
";

    #[test]
    fn test_top_level_entries() {
        let map = parse_verbose(PNG_VERBOSE);
        assert_eq!(map.get(FORMAT), Some("PNG (Portable Network Graphics)"));
        assert_eq!(map.get(RESOLUTION), Some("37.79x37.79"));
        assert_eq!(map.get(UNITS), Some("PixelsPerCentimeter"));
        assert_eq!(map.get(COLORSPACE), Some("sRGB"));
        assert_eq!(map.get("Page geometry"), Some("100x100+0+0"));
        assert_eq!(map.get("Image"), None);
    }

    #[test]
    fn test_nested_entries_are_flattened() {
        let map = parse_verbose(PNG_VERBOSE);
        assert_eq!(map.get("Channel depth:green"), Some("8-bit"));
        assert_eq!(map.get("Channel statistics:Red:max"), Some("255 (1)"));
        assert_eq!(
            map.get("Properties:date:create"),
            Some("2014-10-08T15:32:01+02:00")
        );
        // Leaving a section goes back to top-level names.
        assert_eq!(map.get("Filesize"), Some("2.4KB"));
    }

    #[test]
    fn test_dimensions_from_geometry() {
        let map = parse_verbose(PNG_VERBOSE);
        assert_eq!(map.get(WIDTH), Some("100"));
        assert_eq!(map.get(HEIGHT), Some("100"));
        assert_eq!(parse_geometry("1597x232+0+0"), Some(("1597".into(), "232".into())));
        assert_eq!(parse_geometry("garbage"), None);
    }

    #[test]
    fn test_keeps_tool_order() {
        let map = parse_verbose(PNG_VERBOSE);
        let keys: Vec<&str> = map.keys().take(3).collect();
        assert_eq!(keys, ["Format", "Mime type", "Class"]);
    }

    #[test]
    fn test_later_frames_replace_values() {
        let output = "Image: anim.gif[0]\n  Format: GIF\n  Geometry: 10x10+0+0\nImage: anim.gif[1]\n  Format: GIF\n  Geometry: 5x5+2+2\n";
        let map = parse_verbose(output);
        assert_eq!(map.get(GEOMETRY), Some("5x5+2+2"));
        assert_eq!(map.len(), 4);
    }

    #[test]
    fn test_gif_format() {
        assert!(is_gif_format("GIF (CompuServe graphics interchange format)"));
        assert!(is_gif_format("gif"));
        assert!(!is_gif_format("PNG (Portable Network Graphics)"));
        assert!(!is_gif_format("GI"));
        assert!(!is_gif_format(""));
    }
}
