pub mod conversation;
pub mod entity;
pub mod profile;
pub mod schedule;

pub use conversation::{ConversationKey, ConversationState, DialogState, Selection};
pub use entity::{Entity, EntityKind};
pub use profile::Profile;
pub use schedule::ScheduleEntry;
