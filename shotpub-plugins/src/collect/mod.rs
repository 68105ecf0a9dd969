//! Collectors populate Instance/Context data that downstream plug-ins
//! depend on. They are idempotent, and each documents the keys it reads
//! and writes so dependency order can be audited.

mod active_toggle;
mod animation_output;
mod current_file;
mod destination;
mod instances;
mod post_collect;
mod project;
mod render_products;

pub use active_toggle::CollectForcedActivation;
pub use animation_output::CollectAnimationOutput;
pub use current_file::CollectCurrentFile;
pub use destination::{CollectDestination, DEFAULT_PUBLISH_TEMPLATE};
pub use instances::CollectInstances;
pub use post_collect::RefreshActiveState;
pub use project::CollectProject;
pub use render_products::CollectRenderProducts;
