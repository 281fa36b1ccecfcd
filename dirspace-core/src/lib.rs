pub mod error;

pub mod config;

pub mod fs {
    pub mod entry_info;
    pub use entry_info::{EntryInfo, EntryKind};

    pub mod size_calc;
    pub use size_calc::{SizeOutcome, compute_size};
}

pub mod model {
    pub mod listing;
    pub use listing::{Listing, Row, SizeState};

    pub mod navigator;
    pub use navigator::Navigator;
}

pub mod tasks {
    pub mod size_task;
    pub use size_task::{DirectoryTask, SizeUpdate};
}

pub mod util {
    pub mod humanize;
}

pub mod logging;
pub use logging::Logger;

pub use config::Config;
pub use error::AppError;
pub use model::{Listing, Navigator, Row, SizeState};
