//! Presentation-wide sequence numbers for part file names.
//!
//! `image7.png` or `chart3.xml` must be unique across every slide, layout and
//! master, so the counters live above the individual containers. One
//! [`ResourceCounters`] is owned by the presentation and shared into every
//! container's relationship registry.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Shared handle to the counters.
pub type SharedCounters = Arc<ResourceCounters>;

/// Monotonic counters for image, media and chart file names.
#[derive(Debug, Default)]
pub struct ResourceCounters {
    image: AtomicU32,
    media: AtomicU32,
    chart: AtomicU32,
}

impl ResourceCounters {
    /// Fresh counters, all starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh counters behind an `Arc`.
    pub fn shared() -> SharedCounters {
        Arc::new(Self::new())
    }

    /// Next image number (first call returns 1).
    pub fn next_image(&self) -> u32 {
        self.image.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Next audio/video number (first call returns 1).
    pub fn next_media(&self) -> u32 {
        self.media.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Next chart number (first call returns 1).
    pub fn next_chart(&self) -> u32 {
        self.chart.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Number of chart numbers handed out so far.
    pub fn charts_issued(&self) -> u32 {
        self.chart.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_are_independent() {
        let c = ResourceCounters::new();
        assert_eq!(c.next_image(), 1);
        assert_eq!(c.next_image(), 2);
        assert_eq!(c.next_media(), 1);
        assert_eq!(c.next_chart(), 1);
        assert_eq!(c.next_image(), 3);
        assert_eq!(c.charts_issued(), 1);
    }

    #[test]
    fn test_shared_handle_sees_same_sequence() {
        let c = ResourceCounters::shared();
        let other = Arc::clone(&c);
        assert_eq!(c.next_image(), 1);
        assert_eq!(other.next_image(), 2);
    }
}
