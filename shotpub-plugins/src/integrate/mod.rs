//! Integrators move extracted output into the published locations. Both
//! are safe to run twice: copies overwrite, they never append, and
//! failures from the underlying copy are raised, never swallowed.

mod master;
mod transfers;

pub use master::IntegrateMaster;
pub use transfers::IntegrateTransfers;
