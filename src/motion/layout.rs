//! Bounds readers over a rendering surface
//!
//! The host (DOM, native toolkit, test fixture) implements [`LayoutSurface`];
//! these helpers turn its rectangles into [`Bounds`].

use serde::{Deserialize, Serialize};

use super::position::Bounds;

/// A laid-out rectangle in viewport coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Read access to the host's layout
pub trait LayoutSurface {
    /// Handle to a rendered element
    type Element;

    /// Bounding rectangle of an element
    fn bounding_rect(&self, element: &Self::Element) -> Rect;

    /// Viewport width and height
    fn viewport_size(&self) -> (f64, f64);

    /// Positioned ancestor of an element, `None` when that is the document body
    fn offset_parent(&self, element: &Self::Element) -> Option<Self::Element>;
}

/// Bounds of an element in viewport coordinates
pub fn get_element_bounds<S: LayoutSurface>(surface: &S, element: &S::Element) -> Bounds {
    let rect = surface.bounding_rect(element);
    Bounds::new(rect.left, rect.right(), rect.top, rect.bottom())
}

/// Bounds of the whole viewport, anchored at the origin
pub fn get_viewport_bounds<S: LayoutSurface>(surface: &S) -> Bounds {
    let (width, height) = surface.viewport_size();
    Bounds::new(0.0, width, 0.0, height)
}

/// Container-relative bounds of an element's positioned ancestor.
///
/// Falls back to the viewport when the element has no offset parent other
/// than the body.
pub fn get_container_bounds<S: LayoutSurface>(surface: &S, element: &S::Element) -> Bounds {
    match surface.offset_parent(element) {
        Some(parent) => {
            let rect = surface.bounding_rect(&parent);
            Bounds::new(0.0, rect.width, 0.0, rect.height)
        }
        None => get_viewport_bounds(surface),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FakeSurface {
        rects: HashMap<u32, Rect>,
        parents: HashMap<u32, u32>,
    }

    impl LayoutSurface for FakeSurface {
        type Element = u32;

        fn bounding_rect(&self, element: &u32) -> Rect {
            self.rects.get(element).copied().unwrap_or_default()
        }

        fn viewport_size(&self) -> (f64, f64) {
            (1280.0, 720.0)
        }

        fn offset_parent(&self, element: &u32) -> Option<u32> {
            self.parents.get(element).copied()
        }
    }

    fn surface() -> FakeSurface {
        let mut rects = HashMap::new();
        rects.insert(1, Rect::new(100.0, 50.0, 400.0, 300.0));
        rects.insert(2, Rect::new(120.0, 70.0, 40.0, 20.0));
        rects.insert(3, Rect::new(10.0, 10.0, 5.0, 5.0));
        let mut parents = HashMap::new();
        parents.insert(2, 1);
        FakeSurface { rects, parents }
    }

    #[test]
    fn test_element_bounds() {
        let bounds = get_element_bounds(&surface(), &2);
        assert_eq!(bounds, Bounds::new(120.0, 160.0, 70.0, 90.0));
    }

    #[test]
    fn test_viewport_bounds() {
        assert_eq!(
            get_viewport_bounds(&surface()),
            Bounds::new(0.0, 1280.0, 0.0, 720.0)
        );
    }

    #[test]
    fn test_container_bounds_uses_offset_parent() {
        let bounds = get_container_bounds(&surface(), &2);
        assert_eq!(bounds, Bounds::new(0.0, 400.0, 0.0, 300.0));
    }

    #[test]
    fn test_container_bounds_falls_back_to_viewport() {
        let bounds = get_container_bounds(&surface(), &3);
        assert_eq!(bounds, Bounds::new(0.0, 1280.0, 0.0, 720.0));
    }
}
