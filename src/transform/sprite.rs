//! Inline SVG sprite assembly.
//!
//! Each icon's root `<svg>` becomes a `<symbol>` carrying the icon's
//! `viewBox`, identified by the icon's file stem:
//!
//! ```text
//! <svg xmlns="http://www.w3.org/2000/svg">
//!   <symbol id="menu" viewBox="0 0 24 24">...</symbol>
//!   <symbol id="close" viewBox="0 0 24 24">...</symbol>
//! </svg>
//! ```

use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};

use super::TransformError;

/// An icon ready to be embedded.
#[derive(Debug, Clone)]
pub struct Icon {
    pub id: String,
    pub svg: String,
}

/// Root attributes and inner markup of one SVG document.
#[derive(Debug, PartialEq)]
struct Parts<'a> {
    view_box: Option<String>,
    body: &'a str,
}

/// Build the sprite document from icons, in the given order.
pub fn build(icons: &[Icon]) -> Result<String, TransformError> {
    let mut out = String::from(
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink">"#,
    );

    for icon in icons {
        let parts = split_root(&icon.svg)
            .map_err(|message| TransformError::Sprite(format!("{}: {message}", icon.id)))?;

        out.push_str(r#"<symbol id=""#);
        out.push_str(&escape(icon.id.as_str()));
        out.push('"');
        if let Some(view_box) = &parts.view_box {
            out.push_str(r#" viewBox=""#);
            out.push_str(&escape(view_box.as_str()));
            out.push('"');
        }
        out.push('>');
        out.push_str(parts.body);
        out.push_str("</symbol>");
    }

    out.push_str("</svg>");
    Ok(out)
}

/// Locate the root element and the markup between its tags.
fn split_root(svg: &str) -> Result<Parts<'_>, String> {
    let mut reader = Reader::from_str(svg);
    let mut depth = 0usize;
    let mut body_start = None;
    let mut view_box = None;

    loop {
        let before = reader.buffer_position() as usize;
        let event = reader.read_event().map_err(|err| err.to_string())?;
        match event {
            Event::Start(start) => {
                if depth == 0 {
                    check_root(&start)?;
                    view_box = root_view_box(&start);
                    body_start = Some(reader.buffer_position() as usize);
                }
                depth += 1;
            }
            Event::Empty(start) if depth == 0 => {
                check_root(&start)?;
                return Ok(Parts {
                    view_box: root_view_box(&start),
                    body: "",
                });
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    let start = body_start.unwrap_or(before);
                    return Ok(Parts {
                        view_box,
                        body: svg[start..before].trim(),
                    });
                }
            }
            Event::Eof => return Err("no root <svg> element".into()),
            _ => {}
        }
    }
}

fn check_root(start: &BytesStart<'_>) -> Result<(), String> {
    if start.local_name().as_ref() == b"svg" {
        Ok(())
    } else {
        Err(format!(
            "root element is <{}>, expected <svg>",
            String::from_utf8_lossy(start.name().as_ref())
        ))
    }
}

/// The root `viewBox`, or one synthesized from `width`/`height`.
fn root_view_box(start: &BytesStart<'_>) -> Option<String> {
    let mut view_box = None;
    let mut width = None;
    let mut height = None;

    for attr in start.attributes().flatten() {
        let value = String::from_utf8_lossy(&attr.value).into_owned();
        match attr.key.as_ref() {
            b"viewBox" => view_box = Some(value),
            b"width" => width = Some(value),
            b"height" => height = Some(value),
            _ => {}
        }
    }

    view_box.or_else(|| {
        let w = length(width.as_deref()?)?;
        let h = length(height.as_deref()?)?;
        Some(format!("0 0 {w} {h}"))
    })
}

/// Numeric part of a length such as `24` or `24px`.
fn length(value: &str) -> Option<f32> {
    value.trim().trim_end_matches("px").parse().ok()
}
