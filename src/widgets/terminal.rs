use std::io::Stdout;

use bevy_ecs::prelude::*;
use crossterm::{cursor, terminal};
use ratatui::{backend::CrosstermBackend, Frame};

/// The ratatui terminal, shared by every render system.
#[derive(Resource)]
pub struct Terminal {
    inner: ratatui::Terminal<CrosstermBackend<Stdout>>,
    health: DrawHealth,
}

/// Set while draws keep failing, so a broken pipe is logged once and not every tick.
#[derive(Debug, Default)]
struct DrawHealth {
    failing: bool,
}

impl DrawHealth {
    /// Records one draw; returns whether the outcome changed since the last one.
    fn record<T>(&mut self, result: &std::io::Result<T>) -> bool {
        match result {
            Ok(_) if self.failing => {
                self.failing = false;
                tracing::info!("terminal drawing recovered");
                true
            }
            Err(err) if !self.failing => {
                self.failing = true;
                tracing::error!(error = %err, "failed to draw frame");
                true
            }
            _ => false,
        }
    }
}

impl Terminal {
    pub fn new() -> std::io::Result<Self> {
        let mut stdout = std::io::stdout();
        // Leftovers from the shell would otherwise show through cells ratatui never touches.
        crossterm::execute!(stdout, terminal::Clear(terminal::ClearType::All))?;
        let inner = ratatui::Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self {
            inner,
            health: DrawHealth::default(),
        })
    }

    /// Draws one frame. Failures are logged, and rendering carries on with the next tick.
    pub fn render(&mut self, draw: impl FnOnce(&mut Frame)) {
        let result = self.inner.draw(draw);
        self.health.record(&result);
    }

    pub fn enter_full_screen() {
        _ = terminal::enable_raw_mode();
        _ = crossterm::execute!(
            std::io::stdout(),
            terminal::EnterAlternateScreen,
            terminal::Clear(terminal::ClearType::All),
            terminal::Clear(terminal::ClearType::Purge),
            cursor::MoveTo(0, 0),
            cursor::Hide
        );
    }

    /// Safe to call more than once; the panic hook and the normal shutdown path both do.
    pub fn exit_full_screen() {
        _ = crossterm::execute!(std::io::stdout(), cursor::Show, terminal::LeaveAlternateScreen);
        _ = terminal::disable_raw_mode();
    }

    /// Ctrl-C inside the TUI: raw mode swallows SIGINT, so restore the shell and leave.
    pub fn graceful_exit(code: i32) -> ! {
        tracing::info!(code, "exiting on request");
        Self::exit_full_screen();
        std::process::exit(code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn repeated_failures_are_reported_once() {
        let broken = || Err::<(), _>(Error::from(ErrorKind::BrokenPipe));
        let mut health = DrawHealth::default();
        assert!(!health.record(&Ok(())));
        assert!(health.record(&broken()));
        assert!(!health.record(&broken()));
        assert!(health.failing);
        assert!(health.record(&Ok(())));
        assert!(!health.failing);
    }
}
