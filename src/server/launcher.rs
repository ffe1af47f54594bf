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
use std::sync::Arc;

use gst_rtsp_server::prelude::*;
use log::{debug, error, info};
use parking_lot::Mutex;

use crate::config::SessionConfig;
use crate::error::{Error, InvalidState, SetupError, SetupStage};
use crate::pipeline;
use crate::utils::{resolve_local_address, RunOnDrop};

use super::mounts::{self, StreamUrl, MOUNT_PATH};

/// Launcher lifecycle.
///
/// `Idle` → `Running` once the server is attached and the main loop is about to run,
/// `Running` → `Stopped` on [`Launcher::stop`]. A failed setup goes straight from `Idle` to
/// `Stopped`. There is no way back from `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Running,
    Stopped,
}

/// Launcher handle.
///
/// Cheap to clone. All clones refer to the same session, so a clone can be moved into signal
/// handlers or other threads to call [`Launcher::stop`].
#[derive(Clone)]
pub struct Launcher(Arc<LauncherInner>);

struct LauncherInner {
    config: SessionConfig,
    context: glib::MainContext,
    main_loop: glib::MainLoop,
    state: Mutex<State>,
}

impl fmt::Debug for Launcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Launcher")
            .field("config", &self.0.config)
            .field("state", &self.state())
            .finish()
    }
}

impl Launcher {
    pub fn new(config: SessionConfig) -> Self {
        let context = glib::MainContext::new();
        let main_loop = glib::MainLoop::new(Some(&context), false);

        Launcher(Arc::new(LauncherInner {
            config,
            context,
            main_loop,
            state: Mutex::new(State::Idle),
        }))
    }

    pub fn config(&self) -> &SessionConfig {
        &self.0.config
    }

    pub fn state(&self) -> State {
        *self.0.state.lock()
    }

    /// Main context the server and the signal handlers are attached to.
    pub fn context(&self) -> &glib::MainContext {
        &self.0.context
    }

    /// Sets up the RTSP server and serves the stream until [`Launcher::stop`] is called.
    ///
    /// Requires GStreamer to be initialized. Setup errors are logged here, leave the launcher
    /// `Stopped` and are returned to the caller.
    pub fn start(&self) -> Result<(), Error> {
        let state = self.state();
        if state != State::Idle {
            return Err(InvalidState(state).into());
        }

        let res = self.serve();
        if let Err(ref err) = res {
            error!("Failed to start RTSP server: {}", err);
        }
        *self.0.state.lock() = State::Stopped;

        res
    }

    /// Stops a running server. Does nothing if the server isn't running.
    pub fn stop(&self) {
        {
            let mut state = self.0.state.lock();
            if *state != State::Running {
                debug!("Server not running in state {:?}", *state);
                return;
            }
            *state = State::Stopped;
        }

        // Quit from inside the loop so a quit right before `run()` is not lost.
        let main_loop = self.0.main_loop.clone();
        self.0.context.invoke(move || main_loop.quit());

        info!("Server stopped");
    }

    fn serve(&self) -> Result<(), Error> {
        let config = &self.0.config;

        let description = pipeline::build(config);
        info!("Pipeline: {}", description);
        description.preflight()?;

        let server = gst_rtsp_server::RTSPServer::new();
        server.set_service(&config.port().to_string());

        mounts::mount_shared(&server, &description)?;

        server.connect_client_connected(|_server, _client| {
            info!("Client connected to {}", MOUNT_PATH);
        });

        let source_id = server
            .attach(Some(&self.0.context))
            .map_err(|err| SetupError::new(SetupStage::Bind, err))?;
        let context = self.0.context.clone();
        let _detach = RunOnDrop::new(move || {
            if let Some(source) = context.find_source_by_id(&source_id) {
                source.destroy();
            }
        });
        debug!("RTSP server listening on port {}", server.bound_port());

        let url = StreamUrl::new(resolve_local_address(), config.port(), MOUNT_PATH)
            .map_err(|err| SetupError::new(SetupStage::Url, err))?;
        info!("RTSP server started at: {}", url);
        info!("Press Ctrl+C to stop the server");

        {
            let mut state = self.0.state.lock();
            if *state != State::Idle {
                return Err(InvalidState(*state).into());
            }
            *state = State::Running;
        }

        self.0.main_loop.run();
        debug!("Main loop finished");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::thread;
    use std::time::Duration;

    fn launcher() -> Launcher {
        Launcher::new(SessionConfig::builder().mock(true).build().unwrap())
    }

    #[test]
    fn stop_before_start_is_noop() {
        let launcher = launcher();

        launcher.stop();
        launcher.stop();
        assert_eq!(launcher.state(), State::Idle);
    }

    #[test]
    fn stop_twice_while_running() {
        let launcher = launcher();
        *launcher.0.state.lock() = State::Running;

        launcher.stop();
        assert_eq!(launcher.state(), State::Stopped);
        launcher.stop();
        assert_eq!(launcher.state(), State::Stopped);
    }

    #[test]
    fn start_after_stop_is_rejected() {
        let launcher = launcher();
        *launcher.0.state.lock() = State::Running;
        launcher.stop();

        let err = launcher.start().unwrap_err();
        assert_eq!(
            err.downcast::<InvalidState>().map(|s| s.0),
            Some(State::Stopped)
        );
    }

    #[test]
    fn stop_from_other_thread_ends_loop() {
        let launcher = launcher();
        *launcher.0.state.lock() = State::Running;

        let stopper = {
            let launcher = launcher.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                launcher.stop();
            })
        };

        launcher.0.main_loop.run();
        stopper.join().unwrap();
        assert_eq!(launcher.state(), State::Stopped);
    }

    #[test]
    fn stop_before_loop_runs_is_not_lost() {
        let launcher = launcher();
        *launcher.0.state.lock() = State::Running;

        launcher.stop();
        launcher.0.main_loop.run();
        assert_eq!(launcher.state(), State::Stopped);
    }
}
