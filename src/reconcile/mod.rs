//! Post-fetch hash reconciliation and record projection

mod projection;
mod reconciler;

pub use projection::{project, PublicRecord};
pub use reconciler::HashReconciler;
