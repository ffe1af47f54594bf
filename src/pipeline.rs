// Raspberry Pi Camera RTSP Server
//
// Copyright (C) 2020-2021 Sebastian Dröge <sebastian@centricular.com>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// <https://mozilla.org/MPL/2.0/>.
//
// SPDX-License-Identifier: MPL-2.0

//! Pipeline descriptions handed to the RTSP media factory.
//!
//! Both pipelines are a fixed linear chain:
//!
//! ```text
//! source ! raw video caps ! converter ! H.264 encoder ! h264parse ! rtph264pay name=pay0
//! ```
//!
//! Only the source, converter and encoder differ between [`SourceMode`]s. The resolution and
//! framerate end up in the caps stage. The payloader has to be called `pay0` so that the media
//! factory picks it up as the first stream.

use std::fmt;

use gst::prelude::*;
use log::debug;

use crate::config::{SessionConfig, SourceMode};
use crate::error::{EnvironmentError, Error, SetupError, SetupStage};

/// Name of the payloader element the RTSP media factory looks for.
pub const PAYLOADER_NAME: &str = "pay0";

/// A single GStreamer element with its fixed properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementSpec {
    pub factory: &'static str,
    pub properties: &'static [(&'static str, &'static str)],
}

impl fmt::Display for ElementSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.factory)?;
        for (name, value) in self.properties {
            write!(f, " {}={}", name, value)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Element(ElementSpec),
    /// Raw video caps filter.
    Caps {
        width: u32,
        height: u32,
        framerate: u32,
    },
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Element(element) => fmt::Display::fmt(element, f),
            Stage::Caps {
                width,
                height,
                framerate,
            } => write!(
                f,
                "video/x-raw,width={},height={},framerate={}/1",
                width, height, framerate
            ),
        }
    }
}

struct Template {
    source: ElementSpec,
    converter: ElementSpec,
    encoder: ElementSpec,
}

const TEST_SOURCE_TEMPLATE: Template = Template {
    source: ElementSpec {
        factory: "videotestsrc",
        properties: &[("is-live", "true")],
    },
    converter: ElementSpec {
        factory: "videoconvert",
        properties: &[],
    },
    encoder: ElementSpec {
        factory: "x264enc",
        properties: &[
            ("tune", "zerolatency"),
            ("speed-preset", "superfast"),
            ("bitrate", "500"),
            ("key-int-max", "15"),
        ],
    },
};

const CAMERA_TEMPLATE: Template = Template {
    source: ElementSpec {
        factory: "rpicamsrc",
        properties: &[("bitrate", "1000000")],
    },
    converter: ElementSpec {
        factory: "v4l2convert",
        properties: &[],
    },
    encoder: ElementSpec {
        factory: "v4l2h264enc",
        properties: &[(
            "extra-controls",
            "\"controls,video_bitrate=1000000,video_bitrate_mode=1,h264_profile=1,h264_level=10\"",
        )],
    },
};

const PARSER: ElementSpec = ElementSpec {
    factory: "h264parse",
    properties: &[],
};

const PAYLOADER: ElementSpec = ElementSpec {
    factory: "rtph264pay",
    properties: &[("name", PAYLOADER_NAME), ("pt", "96"), ("config-interval", "1")],
};

impl Template {
    fn for_mode(mode: SourceMode) -> &'static Template {
        match mode {
            SourceMode::Camera => &CAMERA_TEMPLATE,
            SourceMode::TestSource => &TEST_SOURCE_TEMPLATE,
        }
    }
}

/// Textual launch description of the streaming pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineDescription {
    mode: SourceMode,
    stages: Vec<Stage>,
    launch: String,
}

/// Builds the pipeline description for `config`.
///
/// Pure and deterministic. The description is not validated here, see
/// [`PipelineDescription::preflight`].
pub fn build(config: &SessionConfig) -> PipelineDescription {
    let template = Template::for_mode(config.source());

    let stages = vec![
        Stage::Element(template.source),
        Stage::Caps {
            width: config.width(),
            height: config.height(),
            framerate: config.framerate(),
        },
        Stage::Element(template.converter),
        Stage::Element(template.encoder),
        Stage::Element(PARSER),
        Stage::Element(PAYLOADER),
    ];

    let launch = stages
        .iter()
        .map(Stage::to_string)
        .collect::<Vec<_>>()
        .join(" ! ");

    PipelineDescription {
        mode: config.source(),
        stages,
        launch,
    }
}

impl PipelineDescription {
    pub fn as_str(&self) -> &str {
        &self.launch
    }

    pub fn source_mode(&self) -> SourceMode {
        self.mode
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Names of all element factories used, in pipeline order.
    pub fn element_factories(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.stages.iter().filter_map(|stage| match stage {
            Stage::Element(element) => Some(element.factory),
            Stage::Caps { .. } => None,
        })
    }

    /// Checks that GStreamer can build this pipeline.
    ///
    /// Requires GStreamer to be initialized. Fails with an [`EnvironmentError`] if an element
    /// isn't installed and with a [`SetupError`] if the description doesn't parse. The parsed
    /// pipeline is dropped again without changing its state, so no device is opened.
    pub fn preflight(&self) -> Result<(), Error> {
        for factory in self.element_factories() {
            if gst::ElementFactory::find(factory).is_none() {
                return Err(EnvironmentError::MissingElement(factory.to_owned()).into());
            }
        }

        let pipeline = gst::parse::launch(&self.launch)
            .map_err(|err| SetupError::new(SetupStage::Parse, err))?;
        debug!("Pipeline description parsed into {}", pipeline.name());

        Ok(())
    }
}

impl AsRef<str> for PipelineDescription {
    fn as_ref(&self) -> &str {
        &self.launch
    }
}

impl fmt::Display for PipelineDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.launch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(mock: bool) -> SessionConfig {
        SessionConfig::builder().mock(mock).build().unwrap()
    }

    #[test]
    fn test_source_description() {
        let description = build(&config(true));

        assert_eq!(
            description.as_str(),
            "videotestsrc is-live=true ! video/x-raw,width=640,height=480,framerate=25/1 ! \
             videoconvert ! x264enc tune=zerolatency speed-preset=superfast bitrate=500 \
             key-int-max=15 ! h264parse ! rtph264pay name=pay0 pt=96 config-interval=1"
        );
        assert_eq!(description.source_mode(), SourceMode::TestSource);
    }

    #[test]
    fn camera_description() {
        let config = SessionConfig::builder()
            .resolution(1280, 720)
            .framerate(30)
            .build()
            .unwrap();
        let description = build(&config);

        assert_eq!(
            description.as_str(),
            "rpicamsrc bitrate=1000000 ! video/x-raw,width=1280,height=720,framerate=30/1 ! \
             v4l2convert ! v4l2h264enc extra-controls=\"controls,video_bitrate=1000000,\
             video_bitrate_mode=1,h264_profile=1,h264_level=10\" ! h264parse ! \
             rtph264pay name=pay0 pt=96 config-interval=1"
        );
    }

    #[test]
    fn camera_never_uses_software_encoder() {
        let description = build(&config(false));
        let factories = description.element_factories().collect::<Vec<_>>();

        assert!(factories.contains(&"rpicamsrc"));
        assert!(factories.contains(&"v4l2h264enc"));
        assert!(!factories.contains(&"x264enc"));
        assert!(!factories.contains(&"videotestsrc"));
    }

    #[test]
    fn deterministic() {
        for mock in [false, true] {
            assert_eq!(build(&config(mock)), build(&config(mock)));
        }
    }

    #[test]
    fn ends_with_named_payloader() {
        for mock in [false, true] {
            let description = build(&config(mock));
            assert_eq!(description.stages().last(), Some(&Stage::Element(PAYLOADER)));
            assert!(description
                .as_str()
                .ends_with("rtph264pay name=pay0 pt=96 config-interval=1"));
        }
    }

    #[test]
    fn element_factories_in_order() {
        let description = build(&config(true));
        assert_eq!(
            description.element_factories().collect::<Vec<_>>(),
            vec![
                "videotestsrc",
                "videoconvert",
                "x264enc",
                "h264parse",
                "rtph264pay"
            ]
        );
    }

    #[test]
    fn preflight_reports_missing_element() {
        gst::init().unwrap();

        let description = PipelineDescription {
            mode: SourceMode::TestSource,
            stages: vec![
                Stage::Element(ElementSpec {
                    factory: "nosuchelement",
                    properties: &[],
                }),
                Stage::Element(PAYLOADER),
            ],
            launch: "nosuchelement ! rtph264pay name=pay0 pt=96 config-interval=1".into(),
        };

        let err = description.preflight().unwrap_err();
        assert!(err.is::<EnvironmentError>());
        assert_eq!(err.exit_code(), crate::error::EXIT_ENVIRONMENT);
        assert_eq!(
            err.to_string(),
            "GStreamer element 'nosuchelement' is not installed"
        );
    }
}

