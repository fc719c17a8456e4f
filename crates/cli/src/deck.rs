//! JSON deck descriptions.

use deckgen_core::{DocumentInfo, Layout, MasterOptions, Result, SlideSpec, ThemeOptions};
use deckgen_pptx::Presentation;
use serde::Deserialize;

/// Page size in inches.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomLayout {
    pub width: f64,
    pub height: f64,
}

/// A whole presentation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeckSpec {
    /// Layout preset (`LAYOUT_16x9` when absent).
    pub layout: Option<String>,
    /// User page size; wins over `layout`.
    pub custom_layout: Option<CustomLayout>,
    pub info: DocumentInfo,
    pub theme: ThemeOptions,
    pub rtl_mode: bool,
    /// Slide layouts, referenced by title from slides.
    pub masters: Vec<MasterOptions>,
    pub slides: Vec<SlideSpec>,
}

impl DeckSpec {
    /// Build the presentation this deck describes.
    pub fn build(self) -> Result<Presentation> {
        let layout = match (self.custom_layout, self.layout.as_deref()) {
            (Some(custom), _) => Layout::custom(custom.width, custom.height),
            (None, Some(name)) => Layout::preset(name)?,
            (None, None) => Layout::default(),
        };

        let mut pres = Presentation::with_layout(layout);
        pres.set_info(self.info);
        pres.set_theme(self.theme);
        pres.set_rtl(self.rtl_mode);

        for master in self.masters {
            pres.define_master(master)?;
        }
        for slide in self.slides {
            pres.add_slide_from_spec(slide)?;
        }
        Ok(pres)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckgen_core::Error;

    #[test]
    fn test_build_deck() {
        let deck: DeckSpec = serde_json::from_str(
            r#"{
                "layout": "LAYOUT_4x3",
                "info": {"title": "Demo", "author": "Team"},
                "masters": [{"title": "PLAIN", "background": "FFFFFF"}],
                "slides": [
                    {"master": "PLAIN", "elements": [{"type": "text", "text": "Hi"}]},
                    {"elements": [{"type": "table", "rows": [["a", "b"]]}]}
                ]
            }"#,
        )
        .unwrap();
        let pres = deck.build().unwrap();
        assert_eq!(pres.layout().height, 6_858_000);
        assert_eq!(pres.slides().len(), 2);
        assert_eq!(pres.slides()[0].layout_number(), 2);
        assert_eq!(pres.info().title, "Demo");
    }

    #[test]
    fn test_custom_layout_wins() {
        let deck = DeckSpec {
            layout: Some("LAYOUT_4x3".into()),
            custom_layout: Some(CustomLayout { width: 8.0, height: 4.0 }),
            ..DeckSpec::default()
        };
        let pres = deck.build().unwrap();
        assert_eq!(pres.layout().width, 7_315_200);
        assert_eq!(pres.layout().name, "custom");
    }

    #[test]
    fn test_unknown_preset() {
        let deck = DeckSpec {
            layout: Some("LAYOUT_A4".into()),
            ..DeckSpec::default()
        };
        assert!(matches!(deck.build(), Err(Error::UnknownLayout(_))));
    }
}
