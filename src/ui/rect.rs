use ratatui::layout::{Margin, Rect};

/// A `width` x `height` box in the middle of `r`, clamped to `r`. Zero keeps that axis full.
pub fn centered(width: u16, height: u16, r: Rect) -> Rect {
    let horizontal = if width == 0 {
        0
    } else {
        r.width.saturating_sub(width) / 2
    };
    let vertical = if height == 0 {
        0
    } else {
        r.height.saturating_sub(height) / 2
    };
    r.inner(&Margin {
        horizontal,
        vertical,
    })
}

/// The last `height` rows of `r`, above the footer line when `r` is the whole screen.
pub fn bottom(height: u16, r: Rect) -> Rect {
    let height = height.min(r.height);
    Rect {
        x: r.x,
        y: r.y + r.height - height,
        width: r.width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_box_is_clamped() {
        let area = Rect::new(0, 0, 100, 40);
        assert_eq!(centered(50, 10, area), Rect::new(25, 15, 50, 10));
        assert_eq!(centered(200, 0, area), area);
    }

    #[test]
    fn bottom_never_leaves_the_area() {
        let area = Rect::new(0, 1, 80, 10);
        assert_eq!(bottom(4, area), Rect::new(0, 7, 80, 4));
        assert_eq!(bottom(40, area), area);
    }
}
