pub mod output;
pub mod progress;

pub use output::{OutputFormatter, OutputMode, ProgressAwareOutput};
pub use progress::{select_progress, BarProgress, NoopProgress, ProgressReporter};
