//! Analysis services: runtime abstraction, the external script runtime,
//! task dispatch, and the static catalog export.

pub mod analysis;
pub mod dispatch;
pub mod export;
pub mod runtimes;
