//! Extractors perform the externally visible work: invoking the host's
//! render command and writing export files to a staging location. They
//! are safe to call multiple times and fail loudly when the underlying
//! command reports failure.

mod alembic;
mod render_local;

pub use alembic::ExtractAlembic;
pub use render_local::ExtractRenderLocal;
