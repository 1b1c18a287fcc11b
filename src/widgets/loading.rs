use std::sync::atomic::{AtomicU8, Ordering};

use bevy_ecs::{prelude::Component, system::Resource};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    widgets::{Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

/// Spinner frame counter; each render advances it.
#[derive(Debug, Default, Resource, Component)]
pub struct Loading {
    index: AtomicU8,
}

#[derive(Copy, Clone, Debug, Default)]
pub struct LoadingWidget {
    index: u8,
}

impl From<&Loading> for LoadingWidget {
    fn from(loading: &Loading) -> Self {
        Self {
            index: loading.index.fetch_add(1, Ordering::AcqRel),
        }
    }
}

impl LoadingWidget {
    fn text(self) -> String {
        let (glyph, dots) = match self.index % 6 {
            1 => ('◰', ".  "),
            2 => ('◳', ".. "),
            3 => ('◲', "..."),
            4 => ('◲', " .."),
            5 => ('◱', "  ."),
            _ => ('◰', "   "),
        };
        format!("{glyph} {}{dots}", t!("Loading"))
    }
}

impl Widget for LoadingWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let text = self.text();
        let width = u16::try_from(text.width()).unwrap_or(area.width);
        let area = crate::ui::rect::centered(width, 1, area);
        Paragraph::new(text).render(area, buf);
    }
}
