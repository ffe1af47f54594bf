// Raspberry Pi Camera RTSP Server
//
// Copyright (C) 2020-2021 Sebastian Dröge <sebastian@centricular.com>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// <https://mozilla.org/MPL/2.0/>.
//
// SPDX-License-Identifier: MPL-2.0

//! Shutdown on SIGINT and SIGTERM.
//!
//! The handlers are GLib unix signal sources attached to the launcher's main context. They are
//! dispatched from the main loop like any other source and not from the signal handler itself,
//! so calling [`Launcher::stop`] from them is fine.

use std::fmt;

use log::info;

use crate::server::Launcher;

/// Signals that shut the server down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    /// SIGINT, usually Ctrl+C.
    Interrupt,
    /// SIGTERM.
    Terminate,
}

impl ShutdownSignal {
    pub const ALL: [ShutdownSignal; 2] = [ShutdownSignal::Interrupt, ShutdownSignal::Terminate];

    /// Signal number, the same on all unix platforms.
    pub fn signum(self) -> i32 {
        match self {
            ShutdownSignal::Interrupt => 2,
            ShutdownSignal::Terminate => 15,
        }
    }
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownSignal::Interrupt => f.write_str("interrupt"),
            ShutdownSignal::Terminate => f.write_str("termination"),
        }
    }
}

/// Removes the installed signal sources when dropped.
#[must_use]
pub struct SignalGuard(Vec<glib::Source>);

impl Drop for SignalGuard {
    fn drop(&mut self) {
        for source in self.0.drain(..) {
            source.destroy();
        }
    }
}

fn handle(launcher: &Launcher, signal: ShutdownSignal) -> glib::ControlFlow {
    info!("Received {} signal, shutting down...", signal);
    launcher.stop();
    glib::ControlFlow::Continue
}

/// Stops `launcher` on SIGINT and SIGTERM.
#[cfg(unix)]
pub fn install(launcher: &Launcher) -> SignalGuard {
    let sources = ShutdownSignal::ALL
        .iter()
        .map(|&signal| {
            let handler_launcher = launcher.clone();
            let source = glib::source::unix_signal_source_new(
                signal.signum(),
                Some("rpicam-rtsp-server shutdown"),
                glib::Priority::DEFAULT,
                move || handle(&handler_launcher, signal),
            );
            source.attach(Some(launcher.context()));
            source
        })
        .collect();

    SignalGuard(sources)
}

#[cfg(not(unix))]
pub fn install(_launcher: &Launcher) -> SignalGuard {
    log::warn!("Signal handling is not supported on this platform");
    SignalGuard(Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::SessionConfig;
    use crate::server::State;

    #[test]
    fn signal_numbers() {
        assert_eq!(ShutdownSignal::Interrupt.signum(), 2);
        assert_eq!(ShutdownSignal::Terminate.signum(), 15);
        assert_eq!(ShutdownSignal::Interrupt.to_string(), "interrupt");
    }

    #[test]
    fn handler_keeps_source_when_idle() {
        let launcher = Launcher::new(SessionConfig::default());

        assert_eq!(
            handle(&launcher, ShutdownSignal::Terminate),
            glib::ControlFlow::Continue
        );
        assert_eq!(launcher.state(), State::Idle);
    }

    #[cfg(unix)]
    #[test]
    fn installs_both_handlers() {
        let launcher = Launcher::new(SessionConfig::default());

        let guard = install(&launcher);
        assert_eq!(guard.0.len(), ShutdownSignal::ALL.len());
        drop(guard);
    }
}
