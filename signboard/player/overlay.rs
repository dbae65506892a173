use crate::player::playlist::Slide;
use serde::Serialize;

const DEFAULT_TEXT_COLOR: &str = "#ffffff";
const DEFAULT_BACKGROUND: &str = "rgba(0, 0, 0, 0.4)";

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    Normal,
    Bold,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SizeClass {
    Small,
    Medium,
    Large,
    XLarge,
}

impl SizeClass {
    /// Unknown names fall back to `Large`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "small" | "sm" => SizeClass::Small,
            "medium" | "md" => SizeClass::Medium,
            "xlarge" | "xl" => SizeClass::XLarge,
            _ => SizeClass::Large,
        }
    }

    /// Font size in pixels on a 1080p surface.
    pub fn pixels(self) -> u32 {
        match self {
            SizeClass::Small => 24,
            SizeClass::Medium => 36,
            SizeClass::Large => 48,
            SizeClass::XLarge => 72,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ResolvedStyle {
    pub text_color: String,
    pub background_color: String,
    pub font_weight: FontWeight,
    pub size: SizeClass,
    pub font_px: u32,
}

pub fn resolve(slide: &Slide) -> ResolvedStyle {
    let style = slide.style.clone().unwrap_or_default();
    let size = style
        .size
        .as_deref()
        .map_or(SizeClass::Large, SizeClass::from_name);
    ResolvedStyle {
        text_color: non_blank(style.text_color).unwrap_or_else(|| DEFAULT_TEXT_COLOR.to_string()),
        background_color: non_blank(style.background_color)
            .unwrap_or_else(|| DEFAULT_BACKGROUND.to_string()),
        font_weight: if style.bold.unwrap_or(true) {
            FontWeight::Bold
        } else {
            FontWeight::Normal
        },
        size,
        font_px: size.pixels(),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::playlist::{MediaKind, OverlayStyle};

    fn slide(style: Option<OverlayStyle>) -> Slide {
        Slide {
            kind: MediaKind::Image,
            source: None,
            duration: 5,
            overlay_text: Some("Welcome".to_string()),
            style,
            footer_message: None,
            audio_enabled: false,
        }
    }

    #[test]
    fn defaults_without_style() {
        let style = resolve(&slide(None));
        assert_eq!(style.text_color, "#ffffff");
        assert_eq!(style.background_color, "rgba(0, 0, 0, 0.4)");
        assert_eq!(style.font_weight, FontWeight::Bold);
        assert_eq!(style.size, SizeClass::Large);
        assert_eq!(style.font_px, 48);
    }

    #[test]
    fn explicit_fields_override_defaults() {
        let style = resolve(&slide(Some(OverlayStyle {
            text_color: Some("#ffcc00".to_string()),
            background_color: Some("transparent".to_string()),
            bold: Some(false),
            size: Some("small".to_string()),
        })));
        assert_eq!(style.text_color, "#ffcc00");
        assert_eq!(style.background_color, "transparent");
        assert_eq!(style.font_weight, FontWeight::Normal);
        assert_eq!(style.size, SizeClass::Small);
    }

    #[test]
    fn unknown_size_falls_back_to_large() {
        let style = resolve(&slide(Some(OverlayStyle {
            size: Some("gigantic".to_string()),
            ..OverlayStyle::default()
        })));
        assert_eq!(style.size, SizeClass::Large);
        assert_eq!(style.text_color, "#ffffff");
    }

    #[test]
    fn size_classes_ascend() {
        let sizes = ["small", "medium", "large", "xlarge"].map(|n| SizeClass::from_name(n).pixels());
        assert!(sizes.windows(2).all(|pair| pair[0] < pair[1]));
    }
}
