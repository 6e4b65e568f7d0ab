//! Domain logic - pure release rules independent of git operations

pub mod commit;
pub mod tag;
pub mod version;

pub use commit::{MergeCommit, MergeRules};
pub use tag::{Tag, TagKind};
pub use version::{BumpRequest, Version, VersionBump};
