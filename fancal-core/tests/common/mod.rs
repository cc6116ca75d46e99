//! Shared mock host for integration tests
//!
//! Mirrors the collaborator surface a real firmware host provides: a device
//! registry, a firmware command sink that actually applies fan power, a
//! response recorder, and a config staging recorder. The command sink and
//! the mock fan share the "applied power" cell, so tachometer curves react
//! to the commands the engine issues - the closest thing to hardware a unit
//! test can get.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use fancal_core::host::{
    CommandSink, ConfigWriter, DeviceRegistry, FanDevice, HostContext, Responder,
};
use fancal_core::time::FixedClock;
use fancal_core::{FanProtocol, RunController, Timestamp, Wake};

/// How a mock fan's tachometer behaves
pub enum Tach {
    /// RPM derived from the currently applied wire power (0..255)
    Curve(fn(u8) -> Option<f32>),
    /// Scripted readings; the last entry repeats once exhausted
    Script(Vec<Option<f32>>),
}

pub struct MockFan {
    protocol: FanProtocol,
    power: Rc<Cell<u8>>,
    tach: Tach,
    next_reading: Cell<usize>,
}

impl FanDevice for MockFan {
    fn protocol(&self) -> FanProtocol {
        self.protocol
    }

    fn rpm(&self, _at: Timestamp) -> Option<f32> {
        match &self.tach {
            Tach::Curve(f) => f(self.power.get()),
            Tach::Script(readings) => {
                if readings.is_empty() {
                    return None;
                }
                let i = self.next_reading.get().min(readings.len() - 1);
                self.next_reading.set(i + 1);
                readings[i]
            }
        }
    }
}

#[derive(Default)]
pub struct MockRegistry {
    devices: HashMap<String, MockFan>,
}

impl DeviceRegistry for MockRegistry {
    fn lookup(&self, name: &str) -> Option<&dyn FanDevice> {
        self.devices.get(name).map(|fan| fan as &dyn FanDevice)
    }
}

/// Records every script and applies power commands to the shared power cell
pub struct MockGcode {
    pub scripts: Vec<String>,
    power: Rc<Cell<u8>>,
}

impl CommandSink for MockGcode {
    fn run_script(&mut self, cmd: &str) {
        if let Some(raw) = cmd.strip_prefix("M106 S") {
            if let Ok(value) = raw.parse() {
                self.power.set(value);
            }
        } else if let Some(pos) = cmd.find("SPEED=") {
            if let Ok(value) = cmd[pos + "SPEED=".len()..].parse() {
                self.power.set(value);
            }
        }
        self.scripts.push(cmd.to_string());
    }
}

#[derive(Default)]
pub struct MockResponder {
    pub infos: Vec<String>,
    pub errors: Vec<String>,
}

impl Responder for MockResponder {
    fn info(&mut self, line: &str) {
        self.infos.push(line.to_string());
    }

    fn error(&mut self, line: &str) {
        self.errors.push(line.to_string());
    }
}

#[derive(Default)]
pub struct MockConfig {
    pub staged: Vec<(String, String, String)>,
}

impl ConfigWriter for MockConfig {
    fn set(&mut self, section: &str, key: &str, value: &str) {
        self.staged
            .push((section.to_string(), key.to_string(), value.to_string()));
    }
}

/// Everything a run needs, wired together
pub struct TestHost {
    pub registry: MockRegistry,
    pub gcode: MockGcode,
    pub responder: MockResponder,
    pub config: MockConfig,
    pub clock: FixedClock,
    power: Rc<Cell<u8>>,
}

impl TestHost {
    /// Host with an empty registry
    pub fn new() -> Self {
        let power = Rc::new(Cell::new(0));
        Self {
            registry: MockRegistry::default(),
            gcode: MockGcode {
                scripts: Vec::new(),
                power: Rc::clone(&power),
            },
            responder: MockResponder::default(),
            config: MockConfig::default(),
            clock: FixedClock::new(0),
            power,
        }
    }

    /// Register a fan under `key` (e.g. `"fan"` or `"fan_generic cooler"`)
    pub fn add_fan(&mut self, key: &str, protocol: FanProtocol, tach: Tach) {
        let power = Rc::clone(&self.power);
        self.devices_mut().insert(
            key.to_string(),
            MockFan {
                protocol,
                power,
                tach,
                next_reading: Cell::new(0),
            },
        );
    }

    /// Pre-set the applied power, as if a previous state left the fan running
    pub fn set_applied_power(&self, wire: u8) {
        self.power.set(wire);
    }

    /// Currently applied wire power
    pub fn applied_power(&self) -> u8 {
        self.power.get()
    }

    /// Borrow all collaborators as a `HostContext`
    pub fn ctx(&mut self) -> HostContext<'_> {
        HostContext {
            registry: &self.registry,
            gcode: &mut self.gcode,
            responder: &mut self.responder,
            config: &mut self.config,
            clock: &self.clock,
        }
    }

    fn devices_mut(&mut self) -> &mut HashMap<String, MockFan> {
        &mut self.registry.devices
    }
}

/// Run the controller's timer loop until terminal or `max_steps` firings.
///
/// Advances the mock clock to each requested wake time, exactly as the
/// host's reactor would. Returns the number of timer firings and the last
/// wake instruction.
pub fn drive(
    controller: &mut RunController,
    host: &mut TestHost,
    mut wake: Wake,
    max_steps: usize,
) -> (usize, Wake) {
    let mut steps = 0;
    while steps < max_steps {
        match wake {
            Wake::Never => break,
            Wake::Immediately => {}
            Wake::At(t) => host.clock.set(t),
        }
        wake = controller.on_timer(&mut host.ctx());
        steps += 1;
    }
    (steps, wake)
}

/// Wire values from every `M106` / `SET_FAN_SPEED` command, in issue order
pub fn commanded_wire_values(scripts: &[String]) -> Vec<u8> {
    scripts
        .iter()
        .filter_map(|cmd| {
            if let Some(raw) = cmd.strip_prefix("M106 S") {
                raw.parse().ok()
            } else if let Some(pos) = cmd.find("SPEED=") {
                cmd[pos + "SPEED=".len()..].parse().ok()
            } else {
                None
            }
        })
        .collect()
}
