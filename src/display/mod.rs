pub mod progress;
pub mod table;

pub use progress::{OperationStatus, ProgressSpinner, display_status, format_status};
pub use table::TableDisplay;
