// Raspberry Pi Camera RTSP Server
//
// Copyright (C) 2020-2021 Sebastian Dröge <sebastian@centricular.com>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// <https://mozilla.org/MPL/2.0/>.
//
// SPDX-License-Identifier: MPL-2.0

//! Session configuration.

use crate::error::{Error, InvalidConfig};

pub const DEFAULT_PORT: u16 = 8554;
pub const DEFAULT_WIDTH: u32 = 640;
pub const DEFAULT_HEIGHT: u32 = 480;
pub const DEFAULT_FRAMERATE: u32 = 25;

/// Where the video frames come from.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceMode {
    /// Raspberry Pi camera with hardware encoding.
    #[default]
    Camera,
    /// Generated test pattern with software encoding, for machines without a camera.
    TestSource,
}

/// Immutable configuration of one streaming session.
///
/// Built once at startup via [`SessionConfig::builder`], which checks that the port is non-zero
/// and that resolution and framerate are positive. Whether the port can actually be bound is
/// only known once the server is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    port: u16,
    width: u32,
    height: u32,
    framerate: u32,
    source: SourceMode,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            port: DEFAULT_PORT,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            framerate: DEFAULT_FRAMERATE,
            source: SourceMode::default(),
        }
    }
}

impl SessionConfig {
    pub fn builder() -> Builder {
        Builder {
            config: SessionConfig::default(),
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn framerate(&self) -> u32 {
        self.framerate
    }

    pub fn source(&self) -> SourceMode {
        self.source
    }
}

pub struct Builder {
    config: SessionConfig,
}

impl Builder {
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn resolution(mut self, width: u32, height: u32) -> Self {
        self.config.width = width;
        self.config.height = height;
        self
    }

    pub fn framerate(mut self, framerate: u32) -> Self {
        self.config.framerate = framerate;
        self
    }

    pub fn source(mut self, source: SourceMode) -> Self {
        self.config.source = source;
        self
    }

    /// Shortcut for choosing between [`SourceMode::TestSource`] and [`SourceMode::Camera`].
    pub fn mock(self, mock: bool) -> Self {
        self.source(if mock {
            SourceMode::TestSource
        } else {
            SourceMode::Camera
        })
    }

    pub fn build(self) -> Result<SessionConfig, Error> {
        let config = self.config;

        if config.port == 0 {
            return Err(InvalidConfig::new("port", "must be between 1 and 65535").into());
        }

        for (field, value) in [
            ("width", config.width),
            ("height", config.height),
            ("framerate", config.framerate),
        ] {
            if value == 0 {
                return Err(InvalidConfig::new(field, "must be positive").into());
            }
        }

        Ok(config)
    }
}
