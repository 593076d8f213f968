mod project;
mod stage;
mod stage_record;
mod user;

pub use project::*;
pub use stage::*;
pub use stage_record::*;
pub use user::*;
