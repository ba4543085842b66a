pub mod conversation;
pub mod intent;
pub mod phase;
pub mod profile;

pub use conversation::*;
pub use intent::*;
pub use phase::*;
pub use profile::*;
