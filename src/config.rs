use serde::{Deserialize, Serialize};
use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use crate::core::{InputParameters, ZeroRatePolicy};

/// Range and step the input widgets offer for one field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldBounds {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl FieldBounds {
    pub const fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }

    fn is_well_formed(&self) -> bool {
        self.min.is_finite()
            && self.max.is_finite()
            && self.step.is_finite()
            && self.min <= self.max
            && self.step > 0.0
    }

    fn check(&self, field: &'static str, value: f64) -> Result<(), InputError> {
        if !value.is_finite() {
            return Err(InputError::NotFinite { field });
        }
        if value < self.min || value > self.max {
            return Err(InputError::OutOfRange {
                field,
                value,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

// Read from TOML (kebab-case keys), served to the web UI as JSON (camelCase).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(
    default,
    rename_all(serialize = "camelCase", deserialize = "kebab-case")
)]
pub struct InputBounds {
    pub lumpsum: FieldBounds,
    pub monthly_contribution: FieldBounds,
    pub annual_return_rate_percent: FieldBounds,
    pub horizon_years: FieldBounds,
}

impl Default for InputBounds {
    fn default() -> Self {
        Self {
            lumpsum: FieldBounds::new(0.0, 100_000_000.0, 1_000.0),
            monthly_contribution: FieldBounds::new(0.0, 1_000_000.0, 100.0),
            annual_return_rate_percent: FieldBounds::new(0.0, 100.0, 0.1),
            horizon_years: FieldBounds::new(0.0, 100.0, 1.0),
        }
    }
}

impl InputBounds {
    /// Rejects values the input widgets could never produce. Step is not
    /// enforced: typed values between steps are accepted as-is.
    pub fn check(&self, inputs: &InputParameters) -> Result<(), InputError> {
        self.lumpsum.check("lumpsum", inputs.lumpsum)?;
        self.monthly_contribution
            .check("monthlyContribution", inputs.monthly_contribution)?;
        self.annual_return_rate_percent
            .check("annualReturnRatePercent", inputs.annual_return_rate_percent)?;
        self.horizon_years
            .check("horizonYears", inputs.horizon_years)?;
        Ok(())
    }

    fn fields(&self) -> [(&'static str, FieldBounds); 4] {
        [
            ("lumpsum", self.lumpsum),
            ("monthly-contribution", self.monthly_contribution),
            ("annual-return-rate-percent", self.annual_return_rate_percent),
            ("horizon-years", self.horizon_years),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: IpAddr,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Settings {
    pub server: ServerSettings,
    pub zero_rate_policy: ZeroRatePolicy,
    pub defaults: InputParameters,
    pub bounds: InputBounds,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error(
        "bounds.{field} needs finite values with min <= max and step > 0, \
         got min={min}, max={max}, step={step}"
    )]
    Bounds {
        field: &'static str,
        min: f64,
        max: f64,
        step: f64,
    },
    #[error("default inputs are outside the configured bounds: {0}")]
    Defaults(#[from] InputError),
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw, path)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Self::parse(raw, Path::new("<inline>"))
    }

    fn parse(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        for (field, bounds) in settings.bounds.fields() {
            if !bounds.is_well_formed() {
                return Err(ConfigError::Bounds {
                    field,
                    min: bounds.min,
                    max: bounds.max,
                    step: bounds.step,
                });
            }
        }
        settings.bounds.check(&settings.defaults)?;
        Ok(settings)
    }

    /// Loads `path` when given, otherwise the built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
