// Raspberry Pi Camera RTSP Server
//
// Copyright (C) 2020-2021 Sebastian Dröge <sebastian@centricular.com>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// <https://mozilla.org/MPL/2.0/>.
//
// SPDX-License-Identifier: MPL-2.0

use clap::Parser;
use log::error;

use rpicam_rtsp_server::config::{self, SessionConfig};
use rpicam_rtsp_server::error::{EnvironmentError, Error};
use rpicam_rtsp_server::{signal, Launcher};

const INSTALL_HINT: &str = "Please install with sudo apt-get install libgstreamer1.0-dev \
    gstreamer1.0-plugins-base gstreamer1.0-plugins-good gstreamer1.0-plugins-bad \
    gstreamer1.0-plugins-ugly libgstrtspserver-1.0-dev";

#[derive(Parser, Debug)]
#[command(
    name = "rpicam-rtsp-server",
    about = "RTSP camera server for Raspberry Pi"
)]
struct Args {
    /// RTSP server port
    #[arg(long, default_value_t = config::DEFAULT_PORT, value_parser = clap::value_parser!(u16).range(1..))]
    port: u16,

    /// Video width
    #[arg(long, default_value_t = config::DEFAULT_WIDTH, value_parser = clap::value_parser!(u32).range(1..))]
    width: u32,

    /// Video height
    #[arg(long, default_value_t = config::DEFAULT_HEIGHT, value_parser = clap::value_parser!(u32).range(1..))]
    height: u32,

    /// Video framerate
    #[arg(long, default_value_t = config::DEFAULT_FRAMERATE, value_parser = clap::value_parser!(u32).range(1..))]
    framerate: u32,

    /// Use test video source instead of camera
    #[arg(long)]
    mock: bool,
}

impl Args {
    fn session_config(&self) -> Result<SessionConfig, Error> {
        SessionConfig::builder()
            .port(self.port)
            .resolution(self.width, self.height)
            .framerate(self.framerate)
            .mock(self.mock)
            .build()
    }
}

fn environment_error(err: glib::Error) -> Error {
    let err = Error::from(EnvironmentError::Framework(err));
    error!("{}. {}", err, INSTALL_HINT);
    err
}

fn run(args: Args) -> Result<(), Error> {
    let config = args.session_config().map_err(|err| {
        error!("{}", err);
        err
    })?;

    gst::init().map_err(environment_error)?;

    let launcher = Launcher::new(config);
    let _signals = signal::install(&launcher);

    launcher.start()
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => (),
        Err(err) => std::process::exit(err.exit_code()),
    }
}
