mod gadget;
mod loading;
mod log_panel;
mod search;
mod terminal;

pub use gadget::Carousel;
pub use loading::{Loading, LoadingWidget};
pub use log_panel::{latest_log_file_in, LogPanel};
pub use search::{LocalSearch, Search, SearchOutcome};
pub use terminal::Terminal;
