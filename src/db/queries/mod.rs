pub mod mute;
pub mod mute_role;
