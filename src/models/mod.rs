mod analytics;
mod certification;
mod contact;
mod experience;
mod media;
mod project;
mod skill;
mod user;

pub use analytics::*;
pub use certification::*;
pub use contact::*;
pub use experience::*;
pub use media::*;
pub use project::*;
pub use skill::*;
pub use user::*;
