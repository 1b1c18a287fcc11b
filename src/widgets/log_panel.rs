use ratatui::{
    layout::Rect,
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use std::fs;
use std::path::{Path, PathBuf};

/// Lines kept from the tail of the log file.
const TAIL_LINES: usize = 200;

pub fn is_log_file_name(name: &str) -> bool {
    name.starts_with(crate::logger::LOG_FILE_PREFIX)
        && Path::new(name)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("log"))
}

/// Newest `marketdesk*.log` in `log_dir` by modification time.
pub fn latest_log_file_in(log_dir: &Path) -> Option<PathBuf> {
    let mut log_files: Vec<(PathBuf, Option<std::time::SystemTime>)> = fs::read_dir(log_dir)
        .ok()?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(is_log_file_name)
        })
        .map(|path| {
            let modified = fs::metadata(&path).and_then(|m| m.modified()).ok();
            (path, modified)
        })
        .collect();

    // newest first, files without a timestamp last
    log_files.sort_by(|(_, a), (_, b)| match (a, b) {
        (Some(ta), Some(tb)) => tb.cmp(ta),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    log_files.into_iter().next().map(|(path, _)| path)
}

fn read_last_lines(path: &Path, count: usize) -> Vec<String> {
    match fs::read_to_string(path) {
        Ok(content) => {
            let lines: Vec<&str> = content.lines().collect();
            let start = lines.len().saturating_sub(count);
            lines[start..].iter().map(|l| (*l).to_string()).collect()
        }
        Err(_) => vec![],
    }
}

fn level_style(line: &str) -> Style {
    if line.contains("ERROR") {
        Style::default().fg(Color::Red)
    } else if line.contains("WARN") {
        Style::default().fg(Color::Yellow)
    } else if line.contains("INFO") {
        Style::default().fg(Color::Green)
    } else if line.contains("DEBUG") {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

/// Overlay tailing the newest log file, toggled with the backtick key.
#[derive(Debug, Default)]
pub struct LogPanel {
    lines: Vec<String>,
    log_dir: Option<PathBuf>,
}

impl LogPanel {
    pub fn new(log_dir: PathBuf) -> Self {
        Self {
            lines: Vec::new(),
            log_dir: Some(log_dir),
        }
    }

    pub fn refresh(&mut self) {
        let log_dir = self
            .log_dir
            .get_or_insert_with(crate::logger::active_log_dir);
        if let Some(log_file) = latest_log_file_in(log_dir) {
            self.lines = read_last_lines(&log_file, TAIL_LINES);
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        // the watcher task only wakes the loop, the read happens here
        self.refresh();

        frame.render_widget(Clear, area);
        let block = Block::default()
            .title(format!(" {} ", t!("Keyboard.Console")))
            .bg(Color::Black)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow));

        let inner_area = block.inner(area);
        frame.render_widget(block, area);

        let skip = self.lines.len().saturating_sub(usize::from(inner_area.height));
        let display_lines: Vec<Line> = self.lines[skip..]
            .iter()
            .map(|line| Line::from(Span::styled(line.clone(), level_style(line))))
            .collect();

        let paragraph = Paragraph::new(display_lines).style(Style::default().bg(Color::Black));
        frame.render_widget(paragraph, inner_area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    struct TempDirGuard {
        path: PathBuf,
    }

    impl TempDirGuard {
        fn new(tag: &str) -> Self {
            let unique = format!(
                "marketdesk-log-tests-{tag}-{}",
                SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_nanos())
                    .unwrap_or_default()
            );
            let path = std::env::temp_dir().join(unique);
            fs::create_dir_all(&path).expect("failed to create temp dir");
            Self { path }
        }
    }

    impl Drop for TempDirGuard {
        fn drop(&mut self) {
            _ = fs::remove_dir_all(&self.path);
        }
    }

    #[test]
    fn accepts_expected_log_filenames() {
        assert!(is_log_file_name("marketdesk.log"));
        assert!(is_log_file_name("marketdesk.2026-02-12.log"));
        assert!(!is_log_file_name("marketdesk.txt"));
        assert!(!is_log_file_name("other.log"));
    }

    #[test]
    fn returns_latest_log_file() {
        let temp_dir = TempDirGuard::new("latest");

        let old_log = temp_dir.path.join("marketdesk.old.log");
        let new_log = temp_dir.path.join("marketdesk.new.log");

        fs::write(&old_log, "old").expect("failed to write old log");
        std::thread::sleep(Duration::from_millis(20));
        fs::write(&new_log, "new").expect("failed to write new log");
        fs::write(temp_dir.path.join("unrelated.log"), "x").expect("failed to write");

        let selected = latest_log_file_in(&temp_dir.path).expect("latest log not found");
        assert_eq!(selected, new_log);
    }

    #[test]
    fn panel_keeps_only_the_tail() {
        let temp_dir = TempDirGuard::new("tail");
        let content: String = (0..TAIL_LINES + 50).map(|i| format!("line {i}\n")).collect();
        fs::write(temp_dir.path.join("marketdesk.log"), content).expect("failed to write log");

        let mut panel = LogPanel::new(temp_dir.path.clone());
        panel.refresh();
        assert_eq!(panel.lines().len(), TAIL_LINES);
        assert_eq!(panel.lines().last().map(String::as_str), Some(format!("line {}", TAIL_LINES + 49)).as_deref());
    }

    #[test]
    fn level_colors() {
        assert_eq!(level_style("2024 ERROR boom").fg, Some(Color::Red));
        assert_eq!(level_style("plain").fg, None);
    }
}
