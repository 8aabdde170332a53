pub mod mute_channels;
pub mod mute_service;
pub mod outcome;
pub mod platform;
pub mod policy;
pub mod scheduler;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use mute_channels::{prepare_channels, ChannelSetup};
pub use mute_service::{BatchMode, MuteKind, MuteService, UnmuteTrigger};
pub use outcome::{FailReason, Outcome, SkipReason, TargetResult};
pub use platform::{GuildInfo, MemberInfo, Platform, SerenityPlatform};
pub use policy::{Capability, DenyReason, Hierarchy, MutePolicy, PolicyContext, Verdict};
pub use scheduler::ExpiryScheduler;
pub use store::{MuteStore, MuteStoreError, PgMuteStore};
