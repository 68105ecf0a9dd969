//! Validators inspect Instance/Context data and raise a descriptive error
//! when an invariant is violated. They are pure reads, and a violation
//! message enumerates every offending instance/value — never just the
//! first — so a human can fix all problems in one pass.

mod app_version;
mod files_exist;
mod scene_saved;
mod sequence;
mod unique_subsets;

pub use app_version::ValidateAppVersion;
pub use files_exist::ValidateFilesExist;
pub use scene_saved::ValidateSceneSaved;
pub use sequence::ValidateSequence;
pub use unique_subsets::ValidateUniqueSubsets;
