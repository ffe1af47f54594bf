// Raspberry Pi Camera RTSP Server
//
// Copyright (C) 2020-2021 Sebastian Dröge <sebastian@centricular.com>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// <https://mozilla.org/MPL/2.0/>.
//
// SPDX-License-Identifier: MPL-2.0

use std::fmt;
use std::net::Ipv4Addr;

use gst_rtsp_server::prelude::*;
use log::debug;

use crate::error::{Error, SetupError, SetupStage};
use crate::pipeline::PipelineDescription;

/// Server path under which the stream is mounted.
pub const MOUNT_PATH: &str = "/stream";

/// URL under which clients can reach the stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StreamUrl(url::Url);

impl StreamUrl {
    pub fn new(address: Ipv4Addr, port: u16, path: &str) -> Result<StreamUrl, url::ParseError> {
        url::Url::parse(&format!("rtsp://{}:{}{}", address, port, path)).map(StreamUrl)
    }
}

impl AsRef<url::Url> for StreamUrl {
    fn as_ref(&self) -> &url::Url {
        &self.0
    }
}

impl std::ops::Deref for StreamUrl {
    type Target = url::Url;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for StreamUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        <url::Url as fmt::Display>::fmt(&self.0, f)
    }
}

/// Mount `description` at [`MOUNT_PATH`] as a single media shared by all clients.
pub(super) fn mount_shared(
    server: &gst_rtsp_server::RTSPServer,
    description: &PipelineDescription,
) -> Result<(), Error> {
    let mounts = server
        .mount_points()
        .ok_or_else(|| SetupError::new(SetupStage::Mount, "server has no mount points"))?;

    let factory = gst_rtsp_server::RTSPMediaFactory::new();
    factory.set_launch(description.as_str());
    factory.set_shared(true);

    factory.connect_media_configure(|_factory, _media| {
        debug!("Shared media pipeline for {} constructed", MOUNT_PATH);
    });

    mounts.add_factory(MOUNT_PATH, factory);
    debug!("Mounted media factory at {}", MOUNT_PATH);

    Ok(())
}
