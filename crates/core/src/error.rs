//! Error types for presentation generation.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or exporting a presentation.
///
/// The first group are usage errors: they abort the single element being
/// constructed and leave the rest of the presentation untouched.
#[derive(Error, Debug)]
pub enum Error {
    /// An image was added without a `path` or `data` source.
    #[error("Image requires either `path` or `data`")]
    MissingImageSource,

    /// A media element was added without a `path` or `data` source.
    #[error("Media requires either `path` or `data`")]
    MissingMediaSource,

    /// An online video was added without a `link`.
    #[error("Online video requires a `link` value")]
    MissingOnlineLink,

    /// Inline data lacks the `base64,` header.
    #[error("`data` value lacks a base64 header (ex: 'image/png;base64,iVBOR...'): {0}")]
    MissingBase64Header(String),

    /// Hyperlink options with neither a URL nor a slide reference.
    #[error("Hyperlink requires either `url` or `slide`")]
    InvalidHyperlink,

    /// A table was added without any rows.
    #[error("Table requires at least one row")]
    EmptyTable,

    /// Unknown layout preset name.
    #[error("Unknown presentation layout: {0}")]
    UnknownLayout(String),

    /// A slide index that does not exist.
    #[error("Slide {0} does not exist")]
    UnknownSlide(usize),

    /// Filesystem failure while reading payloads or writing output.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to write the ZIP container.
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// Failed to serialize an XML part.
    #[error("XML writing error: {0}")]
    XmlError(String),

    /// A media payload could not be decoded or read.
    #[error("Payload error: {0}")]
    PayloadError(String),

    /// Chart part or embedded workbook generation failed.
    #[error("Chart error: {0}")]
    ChartError(String),
}
