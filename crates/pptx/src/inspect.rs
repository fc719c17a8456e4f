//! Read-back of a generated package.
//!
//! [`PackageReader`] opens PPTX bytes and answers the questions a caller
//! asks when checking an export: which slides exist and in what order,
//! what a part's relationships point at, and what text a slide shows.

use deckgen_core::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// One `Relationship` entry of a `.rels` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    /// `TargetMode="External"`.
    pub external: bool,
}

/// Text of one shape and its offset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapeText {
    pub text: String,
    pub x: i64,
    pub y: i64,
}

/// Reader over an in-memory PPTX archive.
pub struct PackageReader {
    archive: ZipArchive<Cursor<Vec<u8>>>,
}

impl PackageReader {
    /// Open archive bytes.
    pub fn open(bytes: Vec<u8>) -> Result<Self> {
        let archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;
        Ok(Self { archive })
    }

    /// Every part name in archive order.
    pub fn part_names(&self) -> Vec<String> {
        self.archive.file_names().map(str::to_string).collect()
    }

    /// Whether a part exists.
    pub fn contains(&self, path: &str) -> bool {
        self.archive.file_names().any(|name| name == path)
    }

    /// Raw bytes of a part.
    pub fn read_bytes(&mut self, path: &str) -> Result<Vec<u8>> {
        let mut file = self
            .archive
            .by_name(path)
            .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;
        let mut content = Vec::new();
        file.read_to_end(&mut content)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;
        Ok(content)
    }

    /// A part as text.
    pub fn read_part(&mut self, path: &str) -> Result<String> {
        let bytes = self.read_bytes(path)?;
        String::from_utf8(bytes)
            .map_err(|e| Error::XmlError(format!("'{}' is not UTF-8: {}", path, e)))
    }

    /// Relationships of a part, e.g. `ppt/slides/slide1.xml`.
    pub fn relationships(&mut self, part: &str) -> Result<Vec<Relationship>> {
        let content = self.read_part(&rels_path(part))?;
        let mut reader = Reader::from_str(&content);
        reader.trim_text(true);

        let mut relationships = Vec::new();
        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                    if e.name().as_ref() == b"Relationship" =>
                {
                    relationships.push(Relationship {
                        id: attribute(e, b"Id").unwrap_or_default(),
                        rel_type: attribute(e, b"Type").unwrap_or_default(),
                        target: attribute(e, b"Target").unwrap_or_default(),
                        external: attribute(e, b"TargetMode").as_deref() == Some("External"),
                    });
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!(
                        "Error parsing relationships of {}: {}",
                        part, e
                    )));
                }
                _ => {}
            }
        }
        Ok(relationships)
    }

    /// Slide part paths in presentation order.
    pub fn slide_paths(&mut self) -> Result<Vec<String>> {
        let mut slides: Vec<(String, Option<usize>)> = self
            .relationships("ppt/presentation.xml")?
            .into_iter()
            .filter(|r| r.rel_type.ends_with("/slide"))
            .map(|r| {
                let order = trailing_number(&r.id);
                (resolve_target("ppt", &r.target), order)
            })
            .collect();

        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });
        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }

    /// Text of every shape on a slide, paragraphs joined by `\n`.
    pub fn slide_text(&mut self, slide_path: &str) -> Result<Vec<ShapeText>> {
        let content = self.read_part(slide_path)?;
        let mut reader = Reader::from_str(&content);
        reader.trim_text(false);

        let mut shapes = Vec::new();
        let mut current: Option<ShapeText> = None;
        let mut in_text = false;
        let mut paragraphs = 0;

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                    b"sp" | b"graphicFrame" => current = Some(ShapeText::default()),
                    b"p" => {
                        if let Some(shape) = current.as_mut() {
                            if paragraphs > 0 {
                                shape.text.push('\n');
                            }
                            paragraphs += 1;
                        }
                    }
                    b"t" => in_text = true,
                    _ => {}
                },
                Ok(Event::Empty(ref e)) if local_name(e.name().as_ref()) == b"off" => {
                    if let Some(shape) = current.as_mut() {
                        shape.x = attribute(e, b"x").and_then(|v| v.parse().ok()).unwrap_or(0);
                        shape.y = attribute(e, b"y").and_then(|v| v.parse().ok()).unwrap_or(0);
                    }
                }
                Ok(Event::Text(ref e)) if in_text => {
                    if let Some(shape) = current.as_mut() {
                        shape.text.push_str(&e.unescape().unwrap_or_default());
                    }
                }
                Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                    b"sp" | b"graphicFrame" => {
                        if let Some(shape) = current.take() {
                            shapes.push(shape);
                        }
                        paragraphs = 0;
                    }
                    b"t" => in_text = false,
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!(
                        "Error parsing {}: {}",
                        slide_path, e
                    )));
                }
                _ => {}
            }
        }
        Ok(shapes)
    }
}

fn attribute(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).to_string())
}

/// `ppt/slides/slide1.xml` → `ppt/slides/_rels/slide1.xml.rels`.
fn rels_path(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relative Target against the directory of its source part.
fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut parts: Vec<&str> = base_dir.split('/').filter(|p| !p.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            ".." => {
                parts.pop();
            }
            "." | "" => {}
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Strip a namespace prefix.
fn local_name(name: &[u8]) -> &[u8] {
    match name.iter().position(|&b| b == b':') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

/// Number at the end of `rId2` or `slide3.xml`.
fn trailing_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml");
    let start = s.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    s[start..].parse().ok()
}
