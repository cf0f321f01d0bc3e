pub mod change;
pub mod snapshot;

pub use change::{ChangeType, Classification, Priority};
pub use snapshot::Snapshot;
