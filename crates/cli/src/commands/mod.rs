pub mod analysis;
pub mod catalog;
pub mod export;
pub mod project;
pub mod serve;
pub mod util;

pub use analysis::*;
pub use catalog::*;
pub use export::*;
pub use project::*;
pub use serve::*;
pub use util::*;
