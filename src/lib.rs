// Raspberry Pi Camera RTSP Server
//
// Copyright (C) 2020-2021 Sebastian Dröge <sebastian@centricular.com>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// <https://mozilla.org/MPL/2.0/>.
//
// SPDX-License-Identifier: MPL-2.0

//! # Raspberry Pi Camera RTSP Server
//!
//! Serves a Raspberry Pi camera, or a generated test pattern, as an H.264 RTSP stream at
//! `rtsp://<host>:<port>/stream`. Capturing, encoding, payloading and the RTSP protocol itself
//! are all handled by GStreamer and `gst-rtsp-server`, this crate only wires them up.
//!
//! ## Overview of the components
//!
//! ### `SessionConfig`
//!
//! [`config::SessionConfig`] holds the port, resolution, framerate and [`config::SourceMode`] of
//! the stream. It is built once at startup and never changes afterwards.
//!
//! ### Pipeline description
//!
//! [`pipeline::build`] turns a configuration into the `gst-launch` style description of the
//! pipeline that produces the RTP stream. There is one fixed template per source mode.
//!
//! ### `Launcher`
//!
//! The [`server::Launcher`] mounts the pipeline at [`server::MOUNT_PATH`] as a single media shared
//! by all clients, attaches the RTSP server to its own GLib main context and runs the main loop
//! until [`server::Launcher::stop`] is called.
//!
//! ### Signals
//!
//! [`signal::install`] hooks SIGINT and SIGTERM up to [`server::Launcher::stop`].

pub mod config;
pub mod error;
pub mod pipeline;
pub mod server;
pub mod signal;
pub(crate) mod utils;

pub use config::{SessionConfig, SourceMode};
pub use error::Error;
pub use server::{Launcher, State};
