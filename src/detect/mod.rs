pub mod classifier;
pub mod diff;
pub mod forms;
pub mod hash;
pub mod keywords;
pub mod normalize;

pub use classifier::classify;
pub use diff::generate_diff;
pub use forms::detect_forms;
pub use hash::content_hash;
pub use keywords::detect_keywords;
pub use normalize::normalize_html;
