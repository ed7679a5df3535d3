use image::Rgba;
use roxmltree::{Document, Node};
use std::error::Error;
use std::fs;
use std::path::Path;

const BUILTIN_SVG: &str = include_str!("../assets/claw.svg");

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewBox {
    pub min_x: f32,
    pub min_y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClawPart {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub fill: Rgba<u8>,
}

impl ClawPart {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }

    /// Top-centre point the arm swings around.
    pub fn hinge(&self) -> (f32, f32) {
        (self.x + self.width * 0.5, self.y)
    }
}

/// Claw artwork: a crossbar and two arms, each arm swinging inward by up to
/// `swing_degrees` as the claw closes.
#[derive(Clone, Debug, PartialEq)]
pub struct ClawShape {
    pub viewbox: ViewBox,
    pub top: ClawPart,
    pub left: ClawPart,
    pub right: ClawPart,
    pub swing_degrees: f32,
}

impl Default for ClawShape {
    fn default() -> Self {
        let grey = Rgba([153, 153, 153, 255]);
        Self {
            viewbox: ViewBox {
                min_x: 0.0,
                min_y: 0.0,
                width: 100.0,
                height: 100.0,
            },
            top: ClawPart {
                x: 10.0,
                y: 0.0,
                width: 80.0,
                height: 20.0,
                fill: Rgba([85, 85, 85, 255]),
            },
            left: ClawPart {
                x: 10.0,
                y: 20.0,
                width: 14.0,
                height: 70.0,
                fill: grey,
            },
            right: ClawPart {
                x: 76.0,
                y: 20.0,
                width: 14.0,
                height: 70.0,
                fill: grey,
            },
            swing_degrees: 25.0,
        }
    }
}

impl ClawShape {
    pub fn builtin() -> Result<Self, Box<dyn Error>> {
        Self::parse(BUILTIN_SVG)
    }

    pub fn from_file(path: &Path) -> Result<Self, Box<dyn Error>> {
        let xml = fs::read_to_string(path)
            .map_err(|err| format!("failed to read {}: {err}", path.display()))?;
        Self::parse(&xml).map_err(|err| format!("{}: {err}", path.display()).into())
    }

    pub fn parse(xml: &str) -> Result<Self, Box<dyn Error>> {
        let doc = Document::parse(xml)?;
        let svg_node = doc
            .descendants()
            .find(|node| node.has_tag_name("svg"))
            .ok_or("no <svg> element found")?;

        let viewbox = parse_viewbox(svg_node.attribute("viewBox").ok_or("missing viewBox")?)?;
        let swing_degrees = parse_number(svg_node.attribute("data-swing-degrees"), "data-swing-degrees")?;

        Ok(Self {
            viewbox,
            top: parse_part(&doc, "top")?,
            left: parse_part(&doc, "left")?,
            right: parse_part(&doc, "right")?,
            swing_degrees,
        })
    }
}

fn parse_viewbox(raw: &str) -> Result<ViewBox, Box<dyn Error>> {
    let parts: Vec<f32> = raw
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<f32>())
        .collect::<Result<Vec<_>, _>>()?;

    if parts.len() != 4 {
        return Err(format!("expected 4 numbers in viewBox, got {}", parts.len()).into());
    }
    if parts[2] <= 0.0 || parts[3] <= 0.0 {
        return Err("viewBox must have a positive size".into());
    }

    Ok(ViewBox {
        min_x: parts[0],
        min_y: parts[1],
        width: parts[2],
        height: parts[3],
    })
}

fn parse_part(doc: &Document, id: &str) -> Result<ClawPart, Box<dyn Error>> {
    let node = doc
        .descendants()
        .find(|node| node.has_tag_name("rect") && node.attribute("id") == Some(id))
        .ok_or_else(|| format!("no <rect id=\"{id}\"> found"))?;
    parse_rect(node, id)
}

fn parse_rect(node: Node, id: &str) -> Result<ClawPart, Box<dyn Error>> {
    let fill_raw = node.attribute("fill").unwrap_or("black");
    let fill = parse_color(fill_raw)
        .ok_or_else(|| format!("unsupported fill {fill_raw:?} on rect {id}"))?;

    Ok(ClawPart {
        x: parse_number(node.attribute("x").or(Some("0")), "rect x")?,
        y: parse_number(node.attribute("y").or(Some("0")), "rect y")?,
        width: parse_number(node.attribute("width"), "rect width")?,
        height: parse_number(node.attribute("height"), "rect height")?,
        fill,
    })
}

fn parse_number(raw: Option<&str>, label: &str) -> Result<f32, Box<dyn Error>> {
    let value = raw.ok_or_else(|| format!("missing {label} attribute"))?;
    value
        .trim()
        .parse::<f32>()
        .map_err(|err| format!("bad {label} {value:?}: {err}").into())
}

fn parse_color(raw: &str) -> Option<Rgba<u8>> {
    let value = raw.trim().to_lowercase();
    match value.as_str() {
        "black" => Some(Rgba([0, 0, 0, 255])),
        "white" => Some(Rgba([255, 255, 255, 255])),
        "gray" | "grey" => Some(Rgba([128, 128, 128, 255])),
        "silver" => Some(Rgba([192, 192, 192, 255])),
        "red" => Some(Rgba([255, 0, 0, 255])),
        _ if value.starts_with('#') => parse_hex_color(&value),
        _ => None,
    }
}

fn parse_hex_color(raw: &str) -> Option<Rgba<u8>> {
    let digits = raw.trim_start_matches('#');
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(digits.get(range)?, 16).ok();
    let (r, g, b) = match digits.len() {
        3 => (channel(0..1)? * 17, channel(1..2)? * 17, channel(2..3)? * 17),
        6 => (channel(0..2)?, channel(2..4)?, channel(4..6)?),
        _ => return None,
    };

    Some(Rgba([r, g, b, 255]))
}
