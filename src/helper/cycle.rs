//! Moving a selection through a list.
//!
//! Tables wrap at both ends. Search popups and the news source selector also have a
//! position outside the list (the query line, or "Any"), reached by stepping past
//! either end.

use ratatui::widgets::TableState;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Back,
    Forward,
}

/// Position after `step` in a list of `len` that wraps at both ends. With nothing
/// selected, forward lands on the first row and back on the last.
pub fn wrapping(current: Option<usize>, len: usize, step: Step) -> Option<usize> {
    let last = len.checked_sub(1)?;
    let idx = match (current, step) {
        (Some(i), Step::Forward) if i < last => i + 1,
        (_, Step::Forward) => 0,
        (Some(i), Step::Back) if i > 0 => (i - 1).min(last),
        (_, Step::Back) => last,
    };
    Some(idx)
}

/// Like [`wrapping`], except that stepping past either end leaves the list (`None`)
/// and the next step re-enters it from the matching end.
pub fn through_outside(current: Option<usize>, len: usize, step: Step) -> Option<usize> {
    match (current, step) {
        (None, Step::Forward) => (len > 0).then_some(0),
        (None, Step::Back) => len.checked_sub(1),
        (Some(i), Step::Forward) => (i + 1 < len).then_some(i + 1),
        (Some(i), Step::Back) => i.checked_sub(1).filter(|i| *i < len),
    }
}

pub trait SelectionExt {
    /// Wrapping move over `len` rows.
    fn step(&mut self, len: usize, step: Step);
    /// Move that can leave the rows for the input line above them.
    fn step_outside(&mut self, len: usize, step: Step);
}

impl SelectionExt for TableState {
    fn step(&mut self, len: usize, step: Step) {
        self.select(wrapping(self.selected(), len, step));
    }

    fn step_outside(&mut self, len: usize, step: Step) {
        self.select(through_outside(self.selected(), len, step));
    }
}
