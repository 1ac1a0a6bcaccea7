//! Circular-image icon rendering.

use crate::category_color;

/// Icon edge length in CSS pixels.
pub const ICON_SIZE: u32 = 48;

/// Ring stroke width.
const BORDER_WIDTH: u32 = 3;

/// Renders the circular-image icon for a marker as a standalone SVG
/// document.
///
/// The image is clipped to a circle and surrounded by a ring colored for
/// the category. The viewport is drawn at 2x for crisper rendering on
/// high-DPI displays, like the canvas path it replaces. A marker whose
/// image fails to load simply shows the ring (the `<image>` element
/// renders nothing on error).
#[must_use]
pub fn render_circular_icon(image_url: &str, marker_category: &str) -> String {
    let color = category_color(marker_category);
    let size = ICON_SIZE * 2;
    let center = size / 2;
    let radius = center - BORDER_WIDTH;
    let inner = radius - BORDER_WIDTH;
    let stroke = BORDER_WIDTH * 2;
    let href = escape_attribute(image_url);

    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" "#,
            r#"width="{icon}" height="{icon}" viewBox="0 0 {size} {size}">"#,
            r#"<defs><clipPath id="c"><circle cx="{center}" cy="{center}" r="{inner}"/></clipPath></defs>"#,
            r#"<image href="{href}" xlink:href="{href}" x="0" y="0" width="{size}" height="{size}" "#,
            r#"preserveAspectRatio="xMidYMid slice" clip-path="url(#c)"/>"#,
            r#"<circle cx="{center}" cy="{center}" r="{radius}" fill="none" stroke="{color}" stroke-width="{stroke}"/>"#,
            r"</svg>"
        ),
        icon = ICON_SIZE,
        size = size,
        center = center,
        inner = inner,
        radius = radius,
        color = color,
        stroke = stroke,
        href = href,
    )
}

/// Escapes a string for use inside an XML attribute value.
fn escape_attribute(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}
