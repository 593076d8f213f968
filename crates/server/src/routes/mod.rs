mod health;
mod me;
pub mod projects;
pub mod stages;

pub use health::*;
pub use me::*;
pub use projects::*;
pub use stages::*;
