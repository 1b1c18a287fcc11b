use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Margin},
    text::{Line, Span, Text},
    widgets::{Paragraph, Widget, Wrap},
};

use crate::data::Slot;

/// A heading plus a few lines of text, centred in the area. Used for the error page and
/// for panels whose data is missing.
#[derive(Clone, Debug, Default)]
pub struct Content<'a> {
    heading: Text<'a>,
    content: Text<'a>,
}

impl<'a> Content<'a> {
    pub fn new(heading: impl Into<Text<'a>>, content: impl Into<Text<'a>>) -> Self {
        Self {
            heading: heading.into(),
            content: content.into(),
        }
    }

    pub fn empty() -> Self {
        Self::new(
            Span::styled(t!("Slot.Empty"), super::styles::gray()),
            Text::default(),
        )
    }

    pub fn loading() -> Self {
        Self::new(
            Span::styled(t!("Slot.Loading"), super::styles::dark_gray()),
            Text::default(),
        )
    }

    /// Failure notice with the retry hint.
    pub fn failed(message: &str) -> Self {
        Self::new(
            Span::styled(t!("Slot.Failed"), super::styles::error()),
            vec![
                Line::from(Span::styled(message.to_string(), super::styles::dark_gray())),
                Line::from(Span::styled(t!("Slot.Retry"), super::styles::gray())),
            ],
        )
    }

    /// Placeholder for a slot that has nothing to show; `None` once it is ready.
    pub fn for_slot<T>(slot: &Slot<T>) -> Option<Self> {
        match slot {
            Slot::Ready(_) => None,
            Slot::Idle | Slot::Loading => Some(Self::loading()),
            Slot::Empty => Some(Self::empty()),
            Slot::Failed(message) => Some(Self::failed(message)),
        }
    }
}

impl Widget for Content<'_> {
    fn render(self, rect: ratatui::layout::Rect, buf: &mut ratatui::buffer::Buffer) {
        // make vertical center
        let heading_len = u16::try_from(self.heading.lines.len()).unwrap_or(5);
        let content_len = u16::try_from(self.content.lines.len()).unwrap_or(10);
        let rect = rect
            .height
            .checked_sub(heading_len + content_len + 1)
            .map_or(rect, |h| {
                rect.inner(&Margin {
                    vertical: h / 2,
                    horizontal: 0,
                })
            });

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(heading_len),
                Constraint::Length(1),
                Constraint::Min(content_len),
            ])
            .split(rect);

        let heading = Paragraph::new(self.heading).alignment(Alignment::Center);
        let content = Paragraph::new(self.content)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });

        heading.render(chunks[0], buf);
        content.render(chunks[2], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_slots_need_no_placeholder() {
        assert!(Content::for_slot(&Slot::Ready(1)).is_none());
        assert!(Content::for_slot::<u8>(&Slot::Empty).is_some());
        assert!(Content::for_slot::<u8>(&Slot::Failed("boom".into())).is_some());
    }
}
