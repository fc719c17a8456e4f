//! PPTX (Office Open XML) presentation writer.
//!
//! Build a [`Presentation`], add slides and elements, then export it with
//! [`Presentation::write`] or [`Presentation::write_file`].

pub mod chart;
pub mod content_types;
pub mod elements;
pub mod inspect;
pub mod media;
pub mod package;
pub mod presentation;
pub mod rels;
pub mod schema;
pub mod slide;
pub mod templates;
pub mod xml;

pub use inspect::PackageReader;
pub use presentation::Presentation;
pub use rels::RelationshipRegistry;
pub use slide::{Container, ContainerKind};
