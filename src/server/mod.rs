mod launcher;
pub use launcher::{Launcher, State};

pub mod mounts;
pub use mounts::{StreamUrl, MOUNT_PATH};

pub use crate::utils::resolve_local_address;
