//! Archive output: "write named byte blob into package".

use deckgen_core::{Error, Result};
use std::collections::HashSet;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Destination of generated parts.
pub trait PackageSink {
    /// Write one part. Writing the same path twice keeps the first copy.
    fn write_part(&mut self, path: &str, content: &[u8]) -> Result<()>;

    /// Write a text part.
    fn write_text(&mut self, path: &str, content: &str) -> Result<()> {
        self.write_part(path, content.as_bytes())
    }

    /// Whether a path has already been written.
    fn contains(&self, path: &str) -> bool;
}

/// In-memory ZIP archive with deflate compression.
pub struct ZipSink {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    written: HashSet<String>,
}

impl ZipSink {
    /// Start an empty archive.
    pub fn new() -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            written: HashSet::new(),
        }
    }

    /// Number of parts written.
    pub fn len(&self) -> usize {
        self.written.len()
    }

    /// Whether nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.written.is_empty()
    }

    /// Finalize the archive and return its bytes.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        let cursor = self
            .writer
            .finish()
            .map_err(|e| Error::ZipError(format!("Failed to finish ZIP: {}", e)))?;
        Ok(cursor.into_inner())
    }
}

impl Default for ZipSink {
    fn default() -> Self {
        Self::new()
    }
}

impl PackageSink for ZipSink {
    fn write_part(&mut self, path: &str, content: &[u8]) -> Result<()> {
        if !self.written.insert(path.to_string()) {
            log::debug!("Skipping duplicate part {}", path);
            return Ok(());
        }

        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        self.writer
            .start_file(path, options)
            .map_err(|e| Error::ZipError(format!("Failed to start {}: {}", path, e)))?;
        self.writer.write_all(content)?;
        Ok(())
    }

    fn contains(&self, path: &str) -> bool {
        self.written.contains(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    #[test]
    fn test_round_trip_through_archive() {
        let mut sink = ZipSink::new();
        sink.write_text("ppt/presProps.xml", "<p/>").unwrap();
        sink.write_part("ppt/media/image1.png", &[1, 2, 3]).unwrap();
        assert_eq!(sink.len(), 2);

        let bytes = sink.finish().unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);

        let mut content = String::new();
        archive
            .by_name("ppt/presProps.xml")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "<p/>");
    }

    #[test]
    fn test_duplicate_paths_are_written_once() {
        let mut sink = ZipSink::new();
        sink.write_part("ppt/media/media1.mp4", b"first").unwrap();
        sink.write_part("ppt/media/media1.mp4", b"second").unwrap();
        assert!(sink.contains("ppt/media/media1.mp4"));

        let bytes = sink.finish().unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 1);

        let mut content = Vec::new();
        archive
            .by_name("ppt/media/media1.mp4")
            .unwrap()
            .read_to_end(&mut content)
            .unwrap();
        assert_eq!(content, b"first");
    }
}
