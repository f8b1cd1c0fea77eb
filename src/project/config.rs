use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::compiler::{expander::FixedPoint, layout::MIN_ROW_WIDTH};

/// Settings shared by the spatial backend, the expander and the emulator.
/// Missing keys take their default value, so a config file only needs to
/// name what it changes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Cells per grid row, including the two turn marker columns.
    pub row_width: usize,

    /// Number of registers, `R0` to `R{registers - 1}`.
    pub registers: usize,

    /// Number of nested calls the runtime stack can hold.
    pub stack_depth: usize,

    /// Fixed point scale factor.  Must be a power of ten.
    pub scale: i32,

    /// Delay per emulated tick, in milliseconds.  Zero runs at full speed.
    pub tick_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            row_width: 40,
            registers: 8,
            stack_depth: 15,
            scale: 10000,
            tick_ms: 0,
        }
    }
}

impl Config {
    /// Loads a configuration from the given file.
    pub fn read(file: &mut std::fs::File) -> Result<Config, serde_yaml::Error> {
        let config: Config = serde_yaml::from_reader(file)?;
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Config, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// Writes the configuration to the given file
    pub fn write(&self, file: &mut std::fs::File) -> Result<(), serde_yaml::Error> {
        serde_yaml::to_writer(file, self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.row_width < MIN_ROW_WIDTH {
            return Err(ConfigError::RowWidth(self.row_width));
        }
        if self.registers == 0 {
            return Err(ConfigError::NoRegisters);
        }
        if self.fixed_point().is_none() {
            return Err(ConfigError::Scale(self.scale));
        }
        Ok(())
    }

    /// The fixed point format for `scale`, if it is a power of ten between
    /// 10 and 10^9.
    pub fn fixed_point(&self) -> Option<FixedPoint> {
        FixedPoint::from_scale(self.scale)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    RowWidth(usize),
    NoRegisters,
    Scale(i32),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::RowWidth(w) => write!(
                f,
                "row_width must be at least {}, got {}",
                MIN_ROW_WIDTH, w
            ),
            ConfigError::NoRegisters => f.write_str("At least one register is required"),
            ConfigError::Scale(s) => write!(
                f,
                "scale must be a power of ten between 10 and 1000000000, got {}",
                s
            ),
        }
    }
}
