pub mod interview;
pub mod scoring;
pub mod summary;
pub mod transition;

pub use interview::*;
pub use scoring::*;
pub use summary::*;
pub use transition::*;
