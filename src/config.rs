// Copyright The Tessera Authors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fs::File;
use std::io::Read;
use std::ops::Range;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub fn settings_path_default() -> PathBuf {
    dirs::home_dir().unwrap().join(".tessera.toml")
}

/// Engine tunables. Unknown keys are rejected so a typo in the settings file
/// surfaces instead of silently reverting to a default.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
#[serde(default)]
pub struct Settings {
    /// Smallest extent, in container units, a panel may be squeezed to on
    /// either axis. Splits and edge moves clamp against it.
    pub min_panel_extent: f64,
    /// Re-validate the whole graph after every mutation even outside debug
    /// builds, rolling back any mutation that breaks an invariant.
    pub validate_after_mutation: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            min_panel_extent: 50.0,
            validate_after_mutation: false,
        }
    }
}

impl Settings {
    pub fn load(custom_path: Option<&Path>) -> anyhow::Result<Settings> {
        let mut buf = String::new();
        let default = settings_path_default();
        let (mut file, path) = match custom_path {
            Some(path) => (File::open(path)?, path),
            None => match File::open(&default) {
                Ok(file) => (file, &*default),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Ok(Settings::default());
                }
                Err(e) => return Err(e.into()),
            },
        };
        file.read_to_string(&mut buf)?;
        Self::parse(&buf).map_err(|e| anyhow::anyhow!("{}", format_toml_error(e, &buf, path)))
    }

    fn parse(buf: &str) -> Result<Settings, SpannedError> {
        let settings: Settings = toml::from_str(buf)?;
        if !(settings.min_panel_extent > 0.0) {
            return Err(SpannedError {
                message: "min_panel_extent must be positive".to_owned(),
                span: None,
            });
        }
        Ok(settings)
    }
}

fn format_toml_error(error: SpannedError, input: &str, path: &Path) -> String {
    use annotate_snippets::{AnnotationKind, Level, Renderer, Snippet};

    let message = error.message;
    let Some(span) = error.span else {
        return format!("could not parse settings: {}", message);
    };

    let snippet = Snippet::source(input)
        .path(path.to_string_lossy())
        .annotation(AnnotationKind::Primary.span(span.start..span.end).label(message));

    let report = Level::ERROR.primary_title("could not parse settings").element(snippet);

    let renderer = Renderer::styled();
    format!("{}", renderer.render(&[report]))
}

#[derive(Debug)]
struct SpannedError {
    message: String,
    span: Option<Range<usize>>,
}

impl From<toml::de::Error> for SpannedError {
    fn from(e: toml::de::Error) -> Self {
        Self {
            message: e.message().to_owned(),
            span: e.span(),
        }
    }
}
