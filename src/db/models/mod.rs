mod mute_record;
mod mute_role_config;

pub use mute_record::{MuteRecord, NewMute};
pub use mute_role_config::MuteRoleConfig;
