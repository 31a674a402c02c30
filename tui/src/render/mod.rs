pub(crate) mod highlight;
pub(crate) mod line_utils;
pub(crate) mod renderable;

use ratatui::layout::Rect;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Insets {
    pub top: u16,
    pub left: u16,
    pub bottom: u16,
    pub right: u16,
}

impl Insets {
    pub fn tlbr(top: u16, left: u16, bottom: u16, right: u16) -> Self {
        Self {
            top,
            left,
            bottom,
            right,
        }
    }
}

pub(crate) trait RectExt {
    fn inset(self, insets: Insets) -> Rect;
}

impl RectExt for Rect {
    fn inset(self, insets: Insets) -> Rect {
        let horizontal = insets.left.saturating_add(insets.right);
        let vertical = insets.top.saturating_add(insets.bottom);
        Rect {
            x: self.x.saturating_add(insets.left),
            y: self.y.saturating_add(insets.top),
            width: self.width.saturating_sub(horizontal),
            height: self.height.saturating_sub(vertical),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn inset_shrinks_from_every_side() {
        let area = Rect::new(0, 0, 10, 5);
        let inner = area.inset(Insets::tlbr(1, 2, 1, 1));
        assert_eq!(inner, Rect::new(2, 1, 7, 3));
    }

    #[test]
    fn inset_saturates_on_tiny_areas() {
        let area = Rect::new(0, 0, 2, 1);
        let inner = area.inset(Insets::tlbr(1, 2, 1, 1));
        assert_eq!(inner.width, 0);
        assert_eq!(inner.height, 0);
    }
}
