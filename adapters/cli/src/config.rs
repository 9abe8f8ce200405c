//! TOML configuration for the editor binary.

use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use wflop_editor_core::{grid::Viewport, Problem};
use wflop_editor_evaluation::ServerSettings;

const DEFAULT_VIEWPORT_WIDTH: f64 = 1280.0;
const DEFAULT_VIEWPORT_HEIGHT: f64 = 1000.0;

/// Settings loaded from the optional configuration file.
///
/// Every section may be omitted; missing sections and keys take their defaults.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct EditorConfig {
    /// Evaluation service location.
    pub(crate) server: ServerSection,
    /// Surface the canvas is fitted into.
    pub(crate) viewport: ViewportSection,
    /// Problem edited when the session starts.
    pub(crate) problem: Problem,
}

/// `[server]` section.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ServerSection {
    pub(crate) base_url: String,
    pub(crate) timeout_secs: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        let settings = ServerSettings::default();
        Self {
            base_url: settings.base_url,
            timeout_secs: settings.timeout.as_secs(),
        }
    }
}

/// `[viewport]` section.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ViewportSection {
    pub(crate) width: f64,
    pub(crate) height: f64,
}

impl Default for ViewportSection {
    fn default() -> Self {
        Self {
            width: DEFAULT_VIEWPORT_WIDTH,
            height: DEFAULT_VIEWPORT_HEIGHT,
        }
    }
}

impl EditorConfig {
    /// Loads the configuration file, or the defaults when no path is given.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read configuration at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("invalid configuration in {}", path.display()))
    }

    /// Parses configuration from TOML text.
    pub(crate) fn parse(contents: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(contents).context("failed to parse configuration toml contents")?;
        if config.server.timeout_secs == 0 {
            bail!("server timeout must be at least one second");
        }
        Ok(config)
    }

    pub(crate) fn server_settings(&self) -> ServerSettings {
        ServerSettings {
            base_url: self.server.base_url.clone(),
            timeout: Duration::from_secs(self.server.timeout_secs),
        }
    }

    pub(crate) fn viewport(&self) -> Viewport {
        Viewport::new(self.viewport.width, self.viewport.height)
    }
}

/// Parses a `WIDTHxHEIGHT` viewport override.
pub(crate) fn parse_viewport(value: &str) -> Result<Viewport, String> {
    let invalid = || format!("expected WIDTHxHEIGHT in pixels, got '{value}'");
    let (width, height) = value.split_once(['x', 'X']).ok_or_else(invalid)?;
    let width = width.trim().parse::<f64>().map_err(|_| invalid())?;
    let height = height.trim().parse::<f64>().map_err(|_| invalid())?;
    if !(width > 0.0 && height > 0.0) {
        return Err(invalid());
    }
    Ok(Viewport::new(width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = EditorConfig::parse("").expect("empty config parses");

        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.server_settings(), ServerSettings::default());
        assert_eq!(config.viewport(), Viewport::new(1280.0, 1000.0));
        assert_eq!(config.problem, Problem::default());
    }

    #[test]
    fn sections_override_defaults() {
        let config = EditorConfig::parse(
            r#"
                [server]
                base_url = "http://solver.internal:9000/api/wflop"
                timeout_secs = 5

                [viewport]
                width = 800.0

                [problem]
                dimension = 6
                gridWidth = 150.0
                windProfiles = [{ speed = 8.0, angle = 270.0 }]
            "#,
        )
        .expect("config parses");

        let settings = config.server_settings();
        assert_eq!(settings.base_url, "http://solver.internal:9000/api/wflop");
        assert_eq!(settings.timeout, Duration::from_secs(5));
        assert_eq!(config.viewport(), Viewport::new(800.0, 1000.0));
        assert_eq!(config.problem.dimension, 6);
        assert_eq!(config.problem.grid_width, 150.0);
        assert_eq!(config.problem.wind_profiles.len(), 1);
        assert_eq!(config.problem.rotor_radius, Problem::default().rotor_radius);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let error = EditorConfig::parse("[server]\nurl = \"http://localhost\"\n")
            .expect_err("unknown key");

        assert!(error.to_string().contains("toml"));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let error = EditorConfig::parse("[server]\ntimeout_secs = 0\n").expect_err("zero timeout");

        assert!(error.to_string().contains("timeout"));
    }

    #[test]
    fn missing_file_reports_path() {
        let path = Path::new("/nonexistent/wflop-editor.toml");
        let error = EditorConfig::load(Some(path)).expect_err("missing file");

        assert!(error.to_string().contains("wflop-editor.toml"));
    }

    #[test]
    fn viewport_override_parses_dimensions() {
        assert_eq!(parse_viewport("1024x768"), Ok(Viewport::new(1024.0, 768.0)));
        assert_eq!(parse_viewport("640X480"), Ok(Viewport::new(640.0, 480.0)));
        assert!(parse_viewport("1024").is_err());
        assert!(parse_viewport("0x768").is_err());
        assert!(parse_viewport("widexhigh").is_err());
    }
}
