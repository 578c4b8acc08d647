pub mod checks;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod resolver;
pub mod ruleset;

pub use config::{DeprelLanguagePolicy, ValidationConfig, MAX_LEVEL, MIN_LEVEL};
pub use context::ValidationContext;
pub use dispatch::{validate_str, Validator};
pub use error::ValidatorError;
pub use resolver::{Resolved, RulesetResolver};
pub use ruleset::{LabelStatus, LanguageRuleset};
