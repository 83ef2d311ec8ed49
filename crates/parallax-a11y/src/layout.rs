//! Layout
//!
//! Places a node's projected element: scene bounds are taken to global
//! space, normalized, made relative to the parent's global origin and
//! scaled from device pixels to CSS pixels.

use parallax_dom::{Point, Rect};
use serde::{Deserialize, Serialize};

use crate::scene::{ObjectId, SceneGraph};

/// Rendering surface size in device and CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Surface {
    pub device_width: f64,
    pub device_height: f64,
    pub css_width: f64,
    pub css_height: f64,
}

impl Default for Surface {
    fn default() -> Self {
        Self { device_width: 1.0, device_height: 1.0, css_width: 1.0, css_height: 1.0 }
    }
}

impl Surface {
    pub fn new(device_width: f64, device_height: f64, css_width: f64, css_height: f64) -> Self {
        Self { device_width, device_height, css_width, css_height }
    }

    /// CSS pixels per device pixel, per axis
    pub fn scale(&self) -> (f64, f64) {
        let axis = |css: f64, device: f64| {
            let s = css / device;
            if s.is_finite() && s > 0.0 { s } else { 1.0 }
        };
        (axis(self.css_width, self.device_width), axis(self.css_height, self.device_height))
    }
}

/// Computed placement of one element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Rectangle relative to the parent element, CSS pixels
    pub rect: Rect,
    /// Global origin in device pixels, handed down to children
    pub origin: Point,
    /// Bounds were unavailable and a placeholder was used
    pub fallback: bool,
}

/// Place `object` inside a parent whose global origin is `parent_origin`
///
/// Missing or non-finite bounds fall back to a `placeholder`-sized square
/// at the parent's origin.
pub fn place(
    scene: &dyn SceneGraph,
    object: ObjectId,
    parent_origin: Point,
    surface: &Surface,
    placeholder: f64,
) -> Placement {
    let global = scene.local_bounds(object).map(|local| {
        let a = scene.to_global(object, local.origin());
        let b = scene.to_global(object, Point::new(local.right(), local.bottom()));
        Rect::from_corners(a, b).normalized()
    });

    match global.filter(is_finite) {
        Some(global) => {
            let (sx, sy) = surface.scale();
            let relative = global.translate(-parent_origin.x, -parent_origin.y);
            Placement { rect: relative.scale(sx, sy), origin: global.origin(), fallback: false }
        }
        None => Placement {
            rect: Rect::from_xywh(0.0, 0.0, placeholder, placeholder),
            origin: parent_origin,
            fallback: true,
        },
    }
}

fn is_finite(r: &Rect) -> bool {
    r.x.is_finite() && r.y.is_finite() && r.width.is_finite() && r.height.is_finite()
}

/// Inline style for an absolutely positioned element
pub fn style_for(rect: &Rect, focus_outline: bool) -> String {
    let mut style = format!(
        "position:absolute;left:{}px;top:{}px;width:{}px;height:{}px;margin:0;padding:0",
        px(rect.x),
        px(rect.y),
        px(rect.width),
        px(rect.height)
    );
    if !focus_outline {
        style.push_str(";outline:none");
    }
    style
}

/// Round to hundredths and drop trailing zeros
fn px(v: f64) -> String {
    let rounded = (v * 100.0).round() / 100.0;
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    crate::attributes::format_number(rounded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{MemoryScene, Transform};

    #[test]
    fn test_relative_to_parent() {
        let mut scene = MemoryScene::new();
        let parent = scene.add(None, Rect::from_xywh(0.0, 0.0, 100.0, 100.0));
        let child = scene.add(Some(parent), Rect::from_xywh(10.0, 20.0, 30.0, 40.0));
        scene.set_transform(parent, Transform::translate(50.0, 50.0));

        let p = place(&scene, parent, Point::ORIGIN, &Surface::default(), 1.0);
        let c = place(&scene, child, p.origin, &Surface::default(), 1.0);
        assert_eq!(p.rect, Rect::from_xywh(50.0, 50.0, 100.0, 100.0));
        assert_eq!(c.rect, Rect::from_xywh(10.0, 20.0, 30.0, 40.0));
        assert_eq!(c.origin, Point::new(60.0, 70.0));
    }

    #[test]
    fn test_flipped_is_normalized() {
        let mut scene = MemoryScene::new();
        let parent = scene.add(None, Rect::from_xywh(0.0, 0.0, 100.0, 100.0));
        let child = scene.add(Some(parent), Rect::from_xywh(10.0, 10.0, 20.0, 30.0));
        // mirror the child around its own origin
        scene.set_transform(child, Transform::translate(60.0, 60.0).with_scale(-1.0, -1.0));

        let p = place(&scene, parent, Point::ORIGIN, &Surface::default(), 1.0);
        let c = place(&scene, child, p.origin, &Surface::default(), 1.0);
        assert_eq!(c.rect, Rect::from_xywh(30.0, 20.0, 20.0, 30.0));
        assert!(p.rect.contains_rect(&c.rect));
    }

    #[test]
    fn test_surface_scale() {
        let mut scene = MemoryScene::new();
        let obj = scene.add(None, Rect::from_xywh(20.0, 40.0, 200.0, 100.0));
        let surface = Surface::new(800.0, 600.0, 400.0, 600.0);
        let p = place(&scene, obj, Point::ORIGIN, &surface, 1.0);
        assert_eq!(p.rect, Rect::from_xywh(10.0, 40.0, 100.0, 100.0));
    }

    #[test]
    fn test_missing_bounds_placeholder() {
        let mut scene = MemoryScene::new();
        let obj = scene.add(None, Rect::default());
        scene.set_bounds(obj, None);
        let origin = Point::new(5.0, 5.0);
        let p = place(&scene, obj, origin, &Surface::default(), 1.0);
        assert!(p.fallback);
        assert_eq!(p.rect, Rect::from_xywh(0.0, 0.0, 1.0, 1.0));
        assert_eq!(p.origin, origin);
    }

    #[test]
    fn test_style() {
        let style = style_for(&Rect::from_xywh(1.0, 2.5, 3.333, 4.0), false);
        assert_eq!(
            style,
            "position:absolute;left:1px;top:2.5px;width:3.33px;height:4px;margin:0;padding:0;outline:none"
        );
    }
}
