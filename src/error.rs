// Raspberry Pi Camera RTSP Server
//
// Copyright (C) 2020-2021 Sebastian Dröge <sebastian@centricular.com>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// <https://mozilla.org/MPL/2.0/>.
//
// SPDX-License-Identifier: MPL-2.0

use std::any::{Any, TypeId};
use std::sync::Arc;
use std::{error, fmt, ops};

use crate::server::State;

/// Exit code for a missing or broken GStreamer installation.
pub const EXIT_ENVIRONMENT: i32 = 1;
/// Exit code for configuration values that can't be used.
pub const EXIT_CONFIG: i32 = 2;
/// Exit code for failures while setting up the server.
pub const EXIT_SETUP: i32 = 3;

#[derive(Debug, Clone)]
pub struct Error(Arc<dyn LaunchError>);

impl ops::Deref for Error {
    type Target = dyn LaunchError;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl Error {
    pub fn is<T: LaunchError>(&self) -> bool {
        <dyn LaunchError as Any>::type_id(&*self.0) == TypeId::of::<T>()
    }

    pub fn downcast<T: LaunchError>(&self) -> Option<&T> {
        if self.is::<T>() {
            unsafe { Some(&*(&*self.0 as *const dyn LaunchError as *const T)) }
        } else {
            None
        }
    }
}

/// Errors that end the launcher, each mapped to a process exit code.
pub trait LaunchError: Any + std::error::Error + Send + Sync {
    fn exit_code(&self) -> i32;
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, fmt)
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        error::Error::source(&*self.0)
    }
}

impl<T: LaunchError + 'static> From<T> for Error {
    fn from(v: T) -> Error {
        Error(Arc::new(v))
    }
}

/// GStreamer or one of the required plugins is not usable.
#[derive(Debug)]
pub enum EnvironmentError {
    Framework(glib::Error),
    MissingElement(String),
}

impl fmt::Display for EnvironmentError {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvironmentError::Framework(err) => {
                write!(fmt, "GStreamer 1.0 could not be initialized: {}", err)
            }
            EnvironmentError::MissingElement(name) => {
                write!(fmt, "GStreamer element '{}' is not installed", name)
            }
        }
    }
}

impl error::Error for EnvironmentError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            EnvironmentError::Framework(err) => Some(err),
            EnvironmentError::MissingElement(_) => None,
        }
    }
}

impl LaunchError for EnvironmentError {
    fn exit_code(&self) -> i32 {
        EXIT_ENVIRONMENT
    }
}

#[derive(Debug)]
pub struct InvalidConfig {
    field: &'static str,
    reason: String,
}

impl InvalidConfig {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        InvalidConfig {
            field,
            reason: reason.into(),
        }
    }

    pub fn field(&self) -> &'static str {
        self.field
    }
}

impl fmt::Display for InvalidConfig {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "Invalid {}: {}", self.field, self.reason)
    }
}

impl error::Error for InvalidConfig {}

impl LaunchError for InvalidConfig {
    fn exit_code(&self) -> i32 {
        EXIT_CONFIG
    }
}

/// Step of the server setup that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStage {
    Parse,
    Mount,
    Bind,
    Url,
}

impl fmt::Display for SetupStage {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SetupStage::Parse => "parsing pipeline",
            SetupStage::Mount => "mounting media factory",
            SetupStage::Bind => "binding server",
            SetupStage::Url => "building stream URL",
        };
        fmt.write_str(s)
    }
}

#[derive(Debug)]
pub struct SetupError {
    stage: SetupStage,
    reason: String,
}

impl SetupError {
    pub fn new(stage: SetupStage, reason: impl fmt::Display) -> Self {
        SetupError {
            stage,
            reason: reason.to_string(),
        }
    }

    pub fn stage(&self) -> SetupStage {
        self.stage
    }
}

impl fmt::Display for SetupError {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "Failed {}: {}", self.stage, self.reason)
    }
}

impl error::Error for SetupError {}

impl LaunchError for SetupError {
    fn exit_code(&self) -> i32 {
        EXIT_SETUP
    }
}

/// `start()` was called on a launcher that already ran.
#[derive(Debug)]
pub struct InvalidState(pub State);

impl fmt::Display for InvalidState {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "Launcher can't be started in state {:?}", self.0)
    }
}

impl error::Error for InvalidState {}

impl LaunchError for InvalidState {
    fn exit_code(&self) -> i32 {
        EXIT_SETUP
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downcast_to_concrete_type() {
        let err = Error::from(SetupError::new(SetupStage::Bind, "address in use"));

        assert!(err.is::<SetupError>());
        assert!(!err.is::<InvalidConfig>());
        assert_eq!(
            err.downcast::<SetupError>().map(SetupError::stage),
            Some(SetupStage::Bind)
        );
        assert!(err.downcast::<EnvironmentError>().is_none());
    }

    #[test]
    fn exit_codes_per_category() {
        let missing = Error::from(EnvironmentError::MissingElement("rpicamsrc".into()));
        let config = Error::from(InvalidConfig::new("width", "must be positive"));
        let setup = Error::from(SetupError::new(SetupStage::Parse, "no element \"foo\""));
        let state = Error::from(InvalidState(State::Stopped));

        assert_eq!(missing.exit_code(), EXIT_ENVIRONMENT);
        assert_eq!(config.exit_code(), EXIT_CONFIG);
        assert_eq!(setup.exit_code(), EXIT_SETUP);
        assert_eq!(state.exit_code(), EXIT_SETUP);
    }

    #[test]
    fn display_names_the_cause() {
        let err = Error::from(SetupError::new(SetupStage::Bind, "address already in use"));
        assert_eq!(
            err.to_string(),
            "Failed binding server: address already in use"
        );

        let err = Error::from(EnvironmentError::MissingElement("x264enc".into()));
        assert_eq!(err.to_string(), "GStreamer element 'x264enc' is not installed");
    }
}
