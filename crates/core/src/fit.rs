//! Object-fit geometry: how an image's aspect ratio is reconciled with the
//! box it is placed into.
//!
//! Results are expressed as `a:srcRect` insets in thousandths of a percent
//! (100000 = 100%). Negative insets or insets above 100000 are legal and are
//! passed through untouched: they letterbox or over-crop the picture.

use crate::types::Layout;
use crate::units::{round_half_up, Length};
use serde::{Deserialize, Serialize};

/// Fit policy for pictures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitPolicy {
    /// Stretch to the box.
    #[default]
    Fill,
    /// No fit directive at all.
    None,
    /// Scale to cover the box, cropping the overflow symmetrically.
    Cover,
    /// Scale to sit inside the box, padding symmetrically.
    Contain,
    /// Show the region of the source addressed by the box position.
    Crop,
}

impl FitPolicy {
    /// Name as accepted in options.
    pub fn as_str(&self) -> &'static str {
        match self {
            FitPolicy::Fill => "fill",
            FitPolicy::None => "none",
            FitPolicy::Cover => "cover",
            FitPolicy::Contain => "contain",
            FitPolicy::Crop => "crop",
        }
    }
}

/// Dimensions of the source asset, in any consistent unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceSize {
    /// Source width.
    pub width: f64,
    /// Source height.
    pub height: f64,
}

impl SourceSize {
    /// Create a source size.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Zero or NaN in either dimension counts as "not supplied".
    pub fn is_complete(&self) -> bool {
        let usable = |v: f64| v != 0.0 && !v.is_nan();
        usable(self.width) && usable(self.height)
    }

    fn ratio(&self) -> f64 {
        self.height / self.width
    }
}

/// Placement box of a picture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitBox {
    /// Left offset.
    pub x: Length,
    /// Top offset.
    pub y: Length,
    /// Width.
    pub w: Length,
    /// Height.
    pub h: Length,
}

/// The directive a picture's `p:blipFill` receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitDirective {
    /// `<a:stretch><a:fillRect/></a:stretch>`
    Stretch,
    /// Nothing is emitted.
    Nothing,
    /// `<a:srcRect l r t b/><a:stretch/>`
    SourceRect {
        /// Left inset.
        left: i64,
        /// Right inset.
        right: i64,
        /// Top inset.
        top: i64,
        /// Bottom inset.
        bottom: i64,
    },
}

/// Object-fit calculator, built once per render.
#[derive(Debug, Clone)]
pub struct ObjectFit {
    policy: FitPolicy,
    frame: FitBox,
    source: Option<SourceSize>,
}

impl ObjectFit {
    /// Build a calculator.
    ///
    /// Every policy, `fill` and `none` included, is checked for source
    /// dimensions; when they are missing the policy resolves to `fill`.
    pub fn new(policy: Option<FitPolicy>, frame: FitBox, source: Option<SourceSize>) -> Self {
        let requested = policy.unwrap_or_default();
        let source = source.filter(SourceSize::is_complete);

        let policy = if source.is_none() {
            log::warn!(
                "Source width and height are required for objectFit \"{}\"; using \"fill\"",
                requested.as_str()
            );
            FitPolicy::Fill
        } else {
            requested
        };

        Self {
            policy,
            frame,
            source,
        }
    }

    /// The effective policy after the source check.
    pub fn policy(&self) -> FitPolicy {
        self.policy
    }

    /// Compute the directive for the given page layout.
    pub fn render(&self, layout: &Layout) -> FitDirective {
        match (self.policy, self.source) {
            (FitPolicy::Cover, Some(src)) => self.render_cover(layout, src),
            (FitPolicy::Contain, Some(src)) => self.render_contain(layout, src),
            (FitPolicy::Crop, Some(src)) => self.render_crop(layout, src),
            (FitPolicy::None, _) => FitDirective::Nothing,
            _ => FitDirective::Stretch,
        }
    }

    fn box_size(&self, layout: &Layout) -> (f64, f64) {
        (self.frame.w.to_emu_x(layout), self.frame.h.to_emu_y(layout))
    }

    fn render_cover(&self, layout: &Layout, src: SourceSize) -> FitDirective {
        let (w, h) = self.box_size(layout);
        let img_ratio = src.ratio();

        let box_based = h / w > img_ratio;
        let width = if box_based { h / img_ratio } else { w };
        let height = if box_based { h } else { w * img_ratio };

        symmetric(w, h, width, height)
    }

    fn render_contain(&self, layout: &Layout, src: SourceSize) -> FitDirective {
        let (w, h) = self.box_size(layout);
        let img_ratio = src.ratio();

        let width_based = h / w > img_ratio;
        let width = if width_based { w } else { h / img_ratio };
        let height = if width_based { w * img_ratio } else { h };

        symmetric(w, h, width, height)
    }

    fn render_crop(&self, layout: &Layout, src: SourceSize) -> FitDirective {
        let image_w = Length::Auto(src.width).to_emu_x(layout);
        let image_h = Length::Auto(src.height).to_emu_y(layout);

        let l = self.frame.x.to_emu_x(layout);
        let r = image_w - (l + self.frame.w.to_emu_x(layout));
        let t = self.frame.y.to_emu_y(layout);
        let b = image_h - (t + self.frame.h.to_emu_y(layout));

        FitDirective::SourceRect {
            left: percent(l / image_w),
            right: percent(r / image_w),
            top: percent(t / image_h),
            bottom: percent(b / image_h),
        }
    }
}

fn symmetric(w: f64, h: f64, width: f64, height: f64) -> FitDirective {
    let horizontal = percent(0.5 * (1.0 - w / width));
    let vertical = percent(0.5 * (1.0 - h / height));
    FitDirective::SourceRect {
        left: horizontal,
        right: horizontal,
        top: vertical,
        bottom: vertical,
    }
}

fn percent(fraction: f64) -> i64 {
    round_half_up(100_000.0 * fraction) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> Layout {
        Layout::new("test", 9_144_000, 5_143_500)
    }

    fn frame(x: f64, y: f64, w: f64, h: f64) -> FitBox {
        FitBox {
            x: Length::Auto(x),
            y: Length::Auto(y),
            w: Length::Auto(w),
            h: Length::Auto(h),
        }
    }

    fn insets(d: FitDirective) -> (i64, i64, i64, i64) {
        match d {
            FitDirective::SourceRect {
                left,
                right,
                top,
                bottom,
            } => (left, right, top, bottom),
            other => panic!("expected a source rect, got {:?}", other),
        }
    }

    #[test]
    fn test_cover_wide_box_crops_vertically() {
        let fit = ObjectFit::new(
            Some(FitPolicy::Cover),
            frame(0.0, 0.0, 200.0, 100.0),
            Some(SourceSize::new(100.0, 100.0)),
        );
        let (l, r, t, b) = insets(fit.render(&layout()));
        assert_eq!((l, r), (0, 0));
        assert_eq!((t, b), (25_000, 25_000));
    }

    #[test]
    fn test_contain_wide_box_pads_horizontally() {
        let fit = ObjectFit::new(
            Some(FitPolicy::Contain),
            frame(0.0, 0.0, 200.0, 100.0),
            Some(SourceSize::new(100.0, 100.0)),
        );
        let (l, r, t, b) = insets(fit.render(&layout()));
        assert_eq!((l, r), (-50_000, -50_000));
        assert_eq!((t, b), (0, 0));
    }

    #[test]
    fn test_cover_and_contain_bind_opposite_dimensions_for_tall_box() {
        // Box ratio 2.0 > image ratio 1.0
        let src = Some(SourceSize::new(100.0, 100.0));
        let cover = ObjectFit::new(Some(FitPolicy::Cover), frame(0.0, 0.0, 100.0, 200.0), src);
        let contain =
            ObjectFit::new(Some(FitPolicy::Contain), frame(0.0, 0.0, 100.0, 200.0), src);

        // cover keeps height and crops left/right
        assert_eq!(insets(cover.render(&layout())), (25_000, 25_000, 0, 0));
        // contain keeps width and pads top/bottom
        assert_eq!(insets(contain.render(&layout())), (0, 0, -50_000, -50_000));
    }

    #[test]
    fn test_crop_insets() {
        let fit = ObjectFit::new(
            Some(FitPolicy::Crop),
            frame(100.0, 50.0, 200.0, 100.0),
            Some(SourceSize::new(400.0, 200.0)),
        );
        assert_eq!(insets(fit.render(&layout())), (25_000, 25_000, 25_000, 25_000));
    }

    #[test]
    fn test_crop_outside_source_is_not_clamped() {
        let fit = ObjectFit::new(
            Some(FitPolicy::Crop),
            frame(300.0, 0.0, 200.0, 200.0),
            Some(SourceSize::new(400.0, 200.0)),
        );
        let (l, r, _, _) = insets(fit.render(&layout()));
        assert_eq!(l, 75_000);
        assert_eq!(r, -25_000);
    }

    #[test]
    fn test_missing_source_falls_back_to_fill() {
        for policy in [
            FitPolicy::Cover,
            FitPolicy::Contain,
            FitPolicy::Crop,
            FitPolicy::None,
        ] {
            let fit = ObjectFit::new(Some(policy), frame(0.0, 0.0, 1.0, 1.0), None);
            assert_eq!(fit.policy(), FitPolicy::Fill);
            assert_eq!(fit.render(&layout()), FitDirective::Stretch);
        }
    }

    #[test]
    fn test_zero_source_dimension_counts_as_missing() {
        let fit = ObjectFit::new(
            Some(FitPolicy::Cover),
            frame(0.0, 0.0, 1.0, 1.0),
            Some(SourceSize::new(0.0, 10.0)),
        );
        assert_eq!(fit.policy(), FitPolicy::Fill);
    }

    #[test]
    fn test_none_with_source_emits_nothing() {
        let fit = ObjectFit::new(
            Some(FitPolicy::None),
            frame(0.0, 0.0, 1.0, 1.0),
            Some(SourceSize::new(10.0, 10.0)),
        );
        assert_eq!(fit.render(&layout()), FitDirective::Nothing);
    }
}
