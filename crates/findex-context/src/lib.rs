#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

//! Context derivation: topic/category classification and previews.

mod builder;
mod classifier;

pub use builder::{ContextBuilder, PREVIEW_LEN};
pub use classifier::{Rule, RuleBasedClassifier, DEFAULT_CATEGORY, DEFAULT_TOPIC};
