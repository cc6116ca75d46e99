//! `KEY=VALUE` argument parsing for the host command surface
//!
//! The host's scripting layer hands commands over as a single text line,
//! e.g. `START_SWEEP ACTUATOR=exhaust STEPS=20`. Parsing is zero-allocation:
//! the pairs borrow from the input line.

use heapless::Vec;

use crate::constants::MAX_COMMAND_ARGS;
use crate::errors::{MeasureError, MeasureResult};

/// Parsed argument list for one command invocation
#[derive(Debug)]
pub struct CommandArgs<'a> {
    pairs: Vec<(&'a str, &'a str), MAX_COMMAND_ARGS>,
}

impl<'a> CommandArgs<'a> {
    /// Parse whitespace-separated `KEY=VALUE` tokens.
    ///
    /// A token without `=` or more than [`MAX_COMMAND_ARGS`] pairs is a
    /// parameter error; the caller reports it and the command never runs.
    pub fn parse(line: &'a str) -> MeasureResult<Self> {
        let mut pairs = Vec::new();
        for token in line.split_whitespace() {
            let (key, value) = token
                .split_once('=')
                .ok_or(MeasureError::InvalidParam { param: "ARGS" })?;
            pairs
                .push((key, value))
                .map_err(|_| MeasureError::InvalidParam { param: "ARGS" })?;
        }
        Ok(Self { pairs })
    }

    /// Raw value for `key`, if given
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
    }

    /// String value with a default
    pub fn get_str(&self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Integer value with a default
    pub fn get_u32(&self, key: &'static str, default: u32) -> MeasureResult<u32> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw
                .parse()
                .map_err(|_| MeasureError::InvalidParam { param: key }),
        }
    }

    /// Float value with a default
    pub fn get_f32(&self, key: &'static str, default: f32) -> MeasureResult<f32> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw
                .parse()
                .map_err(|_| MeasureError::InvalidParam { param: key }),
        }
    }

    /// Flag value: absent or `0` is false, anything else is true
    pub fn get_flag(&self, key: &str) -> bool {
        match self.get(key) {
            None => false,
            Some("0") => false,
            Some(_) => true,
        }
    }
}
