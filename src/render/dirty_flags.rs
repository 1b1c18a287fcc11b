use bitflags::bitflags;

use crate::app::AppState;

bitflags! {
    /// Flags to track which UI components need re-rendering
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DirtyFlags: u32 {
        const NONE = 0;
        /// Screener table (page loaded, selection moved)
        const SCREENER = 0b0000_0001;
        /// News list or its filter bar
        const NEWS = 0b0000_0010;
        /// Profile panels
        const PROFILE = 0b0000_0100;
        /// Price chart on the profile page
        const CHART = 0b0000_1000;
        /// Footer tips and status line
        const FOOTER = 0b0001_0000;
        const POPUP_HELP = 0b0010_0000;
        const POPUP_SEARCH = 0b0100_0000;
        /// Local search over screener rows
        const POPUP_FIND = 0b1000_0000;
        /// Ticker input of the news filter
        const POPUP_TICKER = 0b0001_0000_0000;
        const LOADING = 0b0010_0000_0000;
        const ERROR = 0b0100_0000_0000;
        const LOG_PANEL = 0b1000_0000_0000;
        /// All components need rendering (full redraw)
        const ALL = 0xFFFF_FFFF;
    }
}

impl DirtyFlags {
    #[inline]
    pub fn needs_render(self) -> bool {
        !self.is_empty()
    }

    /// Components showing data owned by `state`.
    #[inline]
    #[must_use]
    pub fn mark_page_update(mut self, state: AppState) -> Self {
        self.insert(match state {
            AppState::Screener => Self::SCREENER,
            AppState::News => Self::NEWS,
            AppState::Profile => Self::PROFILE | Self::CHART,
            AppState::Loading => Self::LOADING,
            AppState::Error => Self::ERROR,
        });
        self
    }

    #[inline]
    #[must_use]
    pub fn mark_state_change(mut self) -> Self {
        self.insert(Self::ALL);
        self
    }

    #[inline]
    #[must_use]
    pub fn mark_popup_change(mut self, popup: u8) -> Self {
        if popup & crate::app::POPUP_HELP != 0 {
            self.insert(Self::POPUP_HELP);
        }
        if popup & crate::app::POPUP_SEARCH != 0 {
            self.insert(Self::POPUP_SEARCH);
        }
        if popup & crate::app::POPUP_FIND != 0 {
            self.insert(Self::POPUP_FIND);
        }
        if popup & crate::app::POPUP_TICKER != 0 {
            self.insert(Self::POPUP_TICKER | Self::NEWS);
        }
        self
    }
}

/// Manages rendering state and tracks which components need updates
#[derive(Debug)]
pub struct RenderState {
    dirty: DirtyFlags,
    render_count: u64,
    /// Ticks skipped because nothing was dirty
    skip_count: u64,
}

impl Default for RenderState {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderState {
    pub fn new() -> Self {
        Self {
            dirty: DirtyFlags::NONE,
            render_count: 0,
            skip_count: 0,
        }
    }

    #[inline]
    pub fn needs_render(&self) -> bool {
        self.dirty.needs_render()
    }

    #[inline]
    pub fn mark_dirty(&mut self, flags: DirtyFlags) {
        self.dirty.insert(flags);
    }

    #[inline]
    pub fn mark_all_dirty(&mut self) {
        self.dirty = DirtyFlags::ALL;
    }

    /// Clear all dirty flags after successful render
    #[inline]
    pub fn clear(&mut self) {
        self.dirty = DirtyFlags::NONE;
        self.render_count += 1;
    }

    #[inline]
    pub fn skip(&mut self) {
        self.skip_count += 1;
    }

    #[inline]
    pub fn dirty(&self) -> DirtyFlags {
        self.dirty
    }

    /// Percentage of ticks that were skipped
    pub fn efficiency(&self) -> f64 {
        let total = self.render_count + self.skip_count;
        if total == 0 {
            0.0
        } else {
            (self.skip_count as f64 / total as f64) * 100.0
        }
    }

    pub fn stats(&self) -> String {
        format!(
            "renders: {}, skipped: {}, skip rate: {:.1}%",
            self.render_count,
            self.skip_count,
            self.efficiency()
        )
    }
}
