// Raspberry Pi Camera RTSP Server
//
// Copyright (C) 2020-2021 Sebastian Dröge <sebastian@centricular.com>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// <https://mozilla.org/MPL/2.0/>.
//
// SPDX-License-Identifier: MPL-2.0

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};

use log::debug;

/// Runs a closure on drop.
#[must_use]
pub struct RunOnDrop(Option<Box<dyn FnOnce() + Send>>);

impl RunOnDrop {
    pub fn new<F: FnOnce() + Send + 'static>(func: F) -> RunOnDrop {
        RunOnDrop(Some(Box::new(func)))
    }
}

impl Drop for RunOnDrop {
    fn drop(&mut self) {
        if let Some(func) = self.0.take() {
            func();
        }
    }
}

/// Non-routable address used to find the interface of the default route.
const ROUTE_PROBE: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(10, 255, 255, 255)), 1);

/// Best-effort local IPv4 address of the outward facing interface.
///
/// Only used for logging the stream URL, the server itself binds to all interfaces. Falls back
/// to `127.0.0.1` if there is no route.
pub fn resolve_local_address() -> Ipv4Addr {
    resolve_with(ROUTE_PROBE)
}

fn resolve_with(target: SocketAddr) -> Ipv4Addr {
    match probe_local_address(target) {
        Ok(addr) => addr,
        Err(err) => {
            debug!("Can't determine local address, using loopback: {}", err);
            Ipv4Addr::LOCALHOST
        }
    }
}

// Connecting a UDP socket only selects a route and sends nothing.
fn probe_local_address(target: SocketAddr) -> io::Result<Ipv4Addr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
    socket.connect(target)?;

    match socket.local_addr()?.ip() {
        IpAddr::V4(addr) if !addr.is_unspecified() => Ok(addr),
        addr => Err(io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!("no usable local address ({})", addr),
        )),
    }
}
