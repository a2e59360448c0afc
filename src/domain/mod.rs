//! Domain logic - pure business rules independent of git operations

pub mod pre_tag;
pub mod tag;
pub mod version;

pub use pre_tag::PreTagCommand;
pub use tag::Tag;
pub use version::{ReleaseLevel, VersionNumber};
