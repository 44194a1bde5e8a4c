//! Element styling with scoped application onto a drawing surface.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::surface::{DrawingSurface, SurfaceStyle};

/// Horizontal text anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Anchor at the left edge.
    #[default]
    Left,
    /// Anchor at the horizontal centre.
    Center,
    /// Anchor at the right edge.
    Right,
}

impl TextAlign {
    /// The CSS keyword for this alignment.
    #[must_use]
    pub const fn as_css(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }
}

/// How a shape's interior is painted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum FillStyle {
    /// A CSS colour.
    Solid(String),
    /// A named pattern. Not implemented: renders as no fill.
    Pattern(String),
    /// A stipple fill. Not implemented: renders as no fill.
    Stipple,
}

impl FillStyle {
    /// The colour to fill with, or `None` for unsupported fills.
    #[must_use]
    pub fn solid_color(&self) -> Option<&str> {
        match self {
            Self::Solid(color) => Some(color),
            Self::Pattern(_) | Self::Stipple => None,
        }
    }
}

/// Style properties that emit change notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum StyleProperty {
    FillColor,
    StrokeColor,
    StrokeWidth,
    FontFamily,
    FontSize,
    FontVariant,
    TextAlign,
    Font,
}

impl StyleProperty {
    /// Whether a change to this property alters the font string.
    #[must_use]
    pub const fn affects_font(self) -> bool {
        matches!(
            self,
            Self::FontFamily | Self::FontSize | Self::FontVariant | Self::Font
        )
    }
}

/// Handle returned by [`ElementStyle::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StyleListenerId(u64);

type StyleListener = Box<dyn FnMut(StyleProperty)>;

struct Subscription {
    id: StyleListenerId,
    property: Option<StyleProperty>,
    listener: StyleListener,
}

/// Mutable style record owned by one element.
///
/// [`ElementStyle::set_style`] snapshots the surface's ambient style
/// before applying this one; [`ElementStyle::restore_style`] puts the
/// snapshot back. Every `set_style` must be paired with a
/// `restore_style`.
pub struct ElementStyle {
    fill: Option<FillStyle>,
    stroke_color: Option<String>,
    stroke_width: f64,
    font_family: String,
    font_size: f64,
    font_variant: String,
    text_align: TextAlign,
    font: Option<String>,
    saved: Option<SurfaceStyle>,
    subscriptions: Vec<Subscription>,
    next_listener: u64,
    changes: Vec<StyleProperty>,
}

impl Default for ElementStyle {
    fn default() -> Self {
        Self {
            fill: Some(FillStyle::Solid("#000000".to_string())),
            stroke_color: None,
            stroke_width: 1.0,
            font_family: "sans-serif".to_string(),
            font_size: 12.0,
            font_variant: String::new(),
            text_align: TextAlign::Left,
            font: None,
            saved: None,
            subscriptions: Vec::new(),
            next_listener: 0,
            changes: Vec::new(),
        }
    }
}

/// Clones carry the visual properties only; listeners and any pending
/// snapshot stay with the original.
impl Clone for ElementStyle {
    fn clone(&self) -> Self {
        Self {
            fill: self.fill.clone(),
            stroke_color: self.stroke_color.clone(),
            stroke_width: self.stroke_width,
            font_family: self.font_family.clone(),
            font_size: self.font_size,
            font_variant: self.font_variant.clone(),
            text_align: self.text_align,
            font: self.font.clone(),
            ..Self::default()
        }
    }
}

impl fmt::Debug for ElementStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementStyle")
            .field("fill", &self.fill)
            .field("stroke_color", &self.stroke_color)
            .field("stroke_width", &self.stroke_width)
            .field("font", &self.font_string())
            .field("text_align", &self.text_align)
            .field("listeners", &self.subscriptions.len())
            .finish_non_exhaustive()
    }
}

impl ElementStyle {
    /// Default style: solid black fill, no stroke, 12px sans-serif.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interior fill, if any.
    #[must_use]
    pub fn fill(&self) -> Option<&FillStyle> {
        self.fill.as_ref()
    }

    /// Solid fill colour, if the fill is a supported solid colour.
    #[must_use]
    pub fn fill_color(&self) -> Option<&str> {
        self.fill.as_ref().and_then(FillStyle::solid_color)
    }

    /// Outline colour, if stroking is enabled.
    #[must_use]
    pub fn stroke_color(&self) -> Option<&str> {
        self.stroke_color.as_deref()
    }

    /// Outline width in absolute units.
    #[must_use]
    pub fn stroke_width(&self) -> f64 {
        self.stroke_width
    }

    /// Font family list.
    #[must_use]
    pub fn font_family(&self) -> &str {
        &self.font_family
    }

    /// Font size in absolute units.
    #[must_use]
    pub fn font_size(&self) -> f64 {
        self.font_size
    }

    /// Font variant keyword (may be empty).
    #[must_use]
    pub fn font_variant(&self) -> &str {
        &self.font_variant
    }

    /// Horizontal text anchor.
    #[must_use]
    pub fn text_align(&self) -> TextAlign {
        self.text_align
    }

    /// Explicit font shorthand overriding family/size/variant.
    #[must_use]
    pub fn font_override(&self) -> Option<&str> {
        self.font.as_deref()
    }

    /// Set a solid fill colour.
    pub fn set_fill_color(&mut self, color: impl Into<String>) {
        self.fill = Some(FillStyle::Solid(color.into()));
        self.notify(StyleProperty::FillColor);
    }

    /// Set or clear the fill.
    pub fn set_fill(&mut self, fill: Option<FillStyle>) {
        self.fill = fill;
        self.notify(StyleProperty::FillColor);
    }

    /// Set or clear the outline colour.
    pub fn set_stroke_color(&mut self, color: Option<String>) {
        self.stroke_color = color;
        self.notify(StyleProperty::StrokeColor);
    }

    /// Set the outline width.
    pub fn set_stroke_width(&mut self, width: f64) {
        self.stroke_width = width;
        self.notify(StyleProperty::StrokeWidth);
    }

    /// Set the font family.
    pub fn set_font_family(&mut self, family: impl Into<String>) {
        self.font_family = family.into();
        self.notify(StyleProperty::FontFamily);
    }

    /// Set the font size.
    pub fn set_font_size(&mut self, size: f64) {
        self.font_size = size;
        self.notify(StyleProperty::FontSize);
    }

    /// Set the font variant keyword.
    pub fn set_font_variant(&mut self, variant: impl Into<String>) {
        self.font_variant = variant.into();
        self.notify(StyleProperty::FontVariant);
    }

    /// Set the text anchor.
    pub fn set_text_align(&mut self, align: TextAlign) {
        self.text_align = align;
        self.notify(StyleProperty::TextAlign);
    }

    /// Set or clear the explicit font shorthand.
    pub fn set_font(&mut self, font: Option<String>) {
        self.font = font;
        self.notify(StyleProperty::Font);
    }

    /// CSS font shorthand at the style's own size.
    #[must_use]
    pub fn font_string(&self) -> String {
        self.font_string_at(self.font_size)
    }

    /// CSS font shorthand at `size` pixels. An explicit font override is
    /// returned unchanged.
    #[must_use]
    pub fn font_string_at(&self, size: f64) -> String {
        if let Some(font) = &self.font {
            return font.clone();
        }
        if self.font_variant.is_empty() {
            format!("{size}px {}", self.font_family)
        } else {
            format!("{} {size}px {}", self.font_variant, self.font_family)
        }
    }

    /// The ambient style this element draws with, falling back to `base`
    /// for anything the element leaves unset.
    #[must_use]
    pub fn to_surface_style(&self, base: &SurfaceStyle) -> SurfaceStyle {
        SurfaceStyle {
            fill_style: self
                .fill_color()
                .map_or_else(|| base.fill_style.clone(), str::to_string),
            stroke_style: self
                .stroke_color
                .clone()
                .unwrap_or_else(|| base.stroke_style.clone()),
            line_width: self.stroke_width,
            font: self.font_string(),
            text_align: self.text_align,
        }
    }

    /// Snapshot the surface's ambient style, then apply this style.
    pub fn set_style(&mut self, surface: &mut dyn DrawingSurface) {
        let before = surface.style();
        surface.set_style(&self.to_surface_style(&before));
        self.saved = Some(before);
    }

    /// Re-apply the snapshot taken by the last [`ElementStyle::set_style`].
    pub fn restore_style(&mut self, surface: &mut dyn DrawingSurface) {
        if let Some(before) = self.saved.take() {
            surface.set_style(&before);
        } else {
            tracing::warn!("restore_style called without a matching set_style");
        }
    }

    /// Register a listener for one property, or for all when `property`
    /// is `None`.
    pub fn subscribe<F>(&mut self, property: Option<StyleProperty>, listener: F) -> StyleListenerId
    where
        F: FnMut(StyleProperty) + 'static,
    {
        let id = StyleListenerId(self.next_listener);
        self.next_listener += 1;
        self.subscriptions.push(Subscription {
            id,
            property,
            listener: Box::new(listener),
        });
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: StyleListenerId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Properties changed since the last call, in change order.
    pub fn take_changes(&mut self) -> Vec<StyleProperty> {
        std::mem::take(&mut self.changes)
    }

    fn notify(&mut self, property: StyleProperty) {
        if !self.changes.contains(&property) {
            self.changes.push(property);
        }
        for subscription in &mut self.subscriptions {
            if subscription.property.map_or(true, |p| p == property) {
                (subscription.listener)(property);
            }
        }
    }
}
