//! Audio and video (`p:pic` with a media file reference).

use super::image::stretch;
use super::{Frame, RenderContext};
use crate::rels::{rid, MediaRef, Payload, RelationshipRegistry};
use crate::schema::{namespace, MEDIA_EXT_URI};
use crate::xml::XmlNode;
use deckgen_core::classify::{media_extension, require_base64_header};
use deckgen_core::{Error, Length, MediaKind, MediaOptions, Result};

/// An embedded or linked media element.
#[derive(Debug, Clone)]
pub struct MediaElement {
    options: MediaOptions,
    media: MediaRef,
}

impl MediaElement {
    /// Validate the source and register the media records.
    pub fn new(options: MediaOptions, registry: &mut RelationshipRegistry) -> Result<Self> {
        let kind = options.media_type;
        if kind == MediaKind::Online {
            if options.link.as_deref().map_or(true, str::is_empty) {
                return Err(Error::MissingOnlineLink);
            }
        } else if options.path.is_none() && options.data.is_none() {
            return Err(Error::MissingMediaSource);
        }

        let payload = match (&options.data, &options.path) {
            _ if kind == MediaKind::Online => Payload::External,
            (Some(data), _) => {
                require_base64_header(data)?;
                Payload::Inline(data.clone())
            }
            (None, Some(path)) => Payload::File(path.clone()),
            (None, None) => return Err(Error::MissingMediaSource),
        };

        let extension = if kind == MediaKind::Online {
            "mp4".to_string()
        } else {
            media_extension(options.data.as_deref(), options.path.as_deref())
        };
        let media = registry.register_media(kind, payload, &extension, options.link.as_deref());
        Ok(Self { options, media })
    }

    /// Registered ids.
    pub fn media_ref(&self) -> MediaRef {
        self.media
    }

    /// Render `p:pic`.
    pub fn render(&self, idx: usize, ctx: &RenderContext) -> XmlNode {
        let o = &self.options;
        let frame = Frame::new(o.x, o.y, o.w, o.h).or_defaults(
            Length::Auto(0.0),
            Length::Auto(0.0),
            Length::Auto(2.0),
            Length::Auto(2.0),
        );

        let file_tag = match o.media_type {
            MediaKind::Audio => "a:audioFile",
            MediaKind::Video | MediaKind::Online => "a:videoFile",
        };
        let mut nv_pr = XmlNode::new("p:nvPr")
            .child(XmlNode::new(file_tag).attr("r:link", rid(self.media.media_id)));
        if let Some(alt_id) = self.media.alt_id {
            nv_pr.push(
                XmlNode::new("p:extLst").child(
                    XmlNode::new("p:ext").attr("uri", MEDIA_EXT_URI).child(
                        XmlNode::new("p14:media")
                            .attr("xmlns:p14", namespace::P14)
                            .attr("r:embed", rid(alt_id)),
                    ),
                ),
            );
        }

        let nv_pic_pr = XmlNode::new("p:nvPicPr")
            .child(
                XmlNode::new("p:cNvPr")
                    .attr("id", idx + 2)
                    .attr("name", format!("Media {}", idx + 1)),
            )
            .child(XmlNode::new("p:cNvPicPr"))
            .child(nv_pr);

        let blip_fill = XmlNode::new("p:blipFill")
            .child(XmlNode::new("a:blip").attr("r:embed", rid(self.media.preview_id)))
            .child(stretch());

        let sp_pr = XmlNode::new("p:spPr")
            .child(frame.xfrm("a:xfrm", ctx.layout))
            .child(
                XmlNode::new("a:prstGeom")
                    .attr("prst", "rect")
                    .child(XmlNode::new("a:avLst")),
            );

        XmlNode::new("p:pic")
            .child(nv_pic_pr)
            .child(blip_fill)
            .child(sp_pr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckgen_core::{Layout, ResourceCounters};

    fn render(el: &MediaElement) -> String {
        let layout = Layout::default();
        let ctx = RenderContext { layout: &layout, rtl: false };
        el.render(2, &ctx).to_xml().unwrap()
    }

    #[test]
    fn test_usage_errors() {
        let mut reg = RelationshipRegistry::new(ResourceCounters::shared());
        assert!(matches!(
            MediaElement::new(MediaOptions::default(), &mut reg),
            Err(Error::MissingMediaSource)
        ));
        let online = MediaOptions {
            media_type: MediaKind::Online,
            ..MediaOptions::default()
        };
        assert!(matches!(
            MediaElement::new(online, &mut reg),
            Err(Error::MissingOnlineLink)
        ));
        let bad = MediaOptions {
            media_type: MediaKind::Video,
            data: Some("video/mp4;AAAA".into()),
            ..MediaOptions::default()
        };
        assert!(matches!(
            MediaElement::new(bad, &mut reg),
            Err(Error::MissingBase64Header(_))
        ));
    }

    #[test]
    fn test_video_references() {
        let mut reg = RelationshipRegistry::new(ResourceCounters::shared());
        let el = MediaElement::new(
            MediaOptions {
                media_type: MediaKind::Video,
                path: Some("clip.mp4".into()),
                ..MediaOptions::default()
            },
            &mut reg,
        )
        .unwrap();
        let xml = render(&el);
        assert!(xml.contains(r#"<p:cNvPr id="4" name="Media 3"/>"#));
        assert!(xml.contains(r#"<a:videoFile r:link="rId1"/>"#));
        assert!(xml.contains(r#"r:embed="rId2"/></p:ext>"#));
        assert!(xml.contains(r#"<a:blip r:embed="rId3"/>"#));
        assert!(xml.contains(r#"<a:ext cx="1828800" cy="1828800"/>"#));
    }

    #[test]
    fn test_online_video_references() {
        let mut reg = RelationshipRegistry::new(ResourceCounters::shared());
        let el = MediaElement::new(
            MediaOptions {
                media_type: MediaKind::Online,
                link: Some("https://www.youtube.com/embed/abc".into()),
                ..MediaOptions::default()
            },
            &mut reg,
        )
        .unwrap();
        let xml = render(&el);
        assert!(xml.contains(r#"<a:videoFile r:link="rId1"/>"#));
        assert!(!xml.contains("p14:media"));
        assert!(xml.contains(r#"<a:blip r:embed="rId2"/>"#));
    }

    #[test]
    fn test_audio_uses_audio_file() {
        let mut reg = RelationshipRegistry::new(ResourceCounters::shared());
        let el = MediaElement::new(
            MediaOptions {
                path: Some("sound.mp3".into()),
                ..MediaOptions::default()
            },
            &mut reg,
        )
        .unwrap();
        assert!(render(&el).contains(r#"<a:audioFile r:link="rId1"/>"#));
    }
}
