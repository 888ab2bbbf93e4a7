//! Machine context.
//!
//! The [`Machine`] bundles the architectural state of one simulated system and is passed
//! explicitly to whatever drives it. It owns:
//! 1. **Layouts:** The memory configuration registry and current selection.
//! 2. **State:** Memory, the three register files and the reservation tables.
//! 3. **Undo:** The optional backstepper, shared by every component that records restores.
//!
//! Switching configuration clears memory, re-homes the `sp`, `gp` and PC reset values and
//! resets every register.

use std::fmt;
use std::mem;
use std::sync::Arc;

use tracing::{debug, info};

use crate::common::AddressError;
use crate::config::{Config, ConfigError};
use crate::core::arch::{ControlAndStatusRegisterFile, FloatingPointRegisterFile, RegisterFile};
use crate::core::backstep::{Backstepper, RestoreLog, RestoreRecord};
use crate::core::units::lsu::ReservationTables;
use crate::isa::symbol::SymbolTable;
use crate::soc::memory::Memory;
use crate::soc::memory::configuration::{MemoryConfiguration, MemoryConfigurations};

/// Architectural state of one simulated machine.
pub struct Machine {
    configurations: MemoryConfigurations,
    memory: Memory,
    registers: RegisterFile,
    fp_registers: FloatingPointRegisterFile,
    csrs: ControlAndStatusRegisterFile,
    reservations: ReservationTables,
    backstepper: Option<Arc<dyn Backstepper>>,
    restore_log: Option<Arc<RestoreLog>>,
    start_at_main: bool,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Machine {
    /// Creates a machine with the `Default` layout and `harts` reservation tables.
    pub fn new(harts: usize) -> Self {
        let configurations = MemoryConfigurations::new();
        let current = Arc::clone(configurations.get_current_configuration());
        Self {
            registers: RegisterFile::new(&current),
            memory: Memory::new(current),
            configurations,
            fp_registers: FloatingPointRegisterFile::new(),
            csrs: ControlAndStatusRegisterFile::new(),
            reservations: ReservationTables::new(harts),
            backstepper: None,
            restore_log: None,
            start_at_main: false,
        }
    }

    /// Builds a machine from `config`.
    ///
    /// Extra layouts are registered, the requested layout is selected, self-modifying code
    /// is applied and, when enabled, a [`RestoreLog`] is attached as the backstepper.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        if config.reservations.harts == 0 {
            return Err(ConfigError::NoHarts);
        }
        let mut machine = Self::new(config.reservations.harts);
        for layout in &config.memory.layouts {
            let _ = machine.register_configuration(layout.clone())?;
        }
        let _ = machine.set_current_configuration(&config.memory.configuration)?;
        machine
            .memory
            .set_self_modifying_code(config.general.self_modifying_code);
        machine.start_at_main = config.general.start_at_main;
        if config.general.backstep {
            let log = Arc::new(RestoreLog::new(config.general.backstep_limit));
            machine.restore_log = Some(Arc::clone(&log));
            machine.set_backstepper(Some(log));
        }
        info!(
            configuration = machine.current_configuration().identifier(),
            harts = config.reservations.harts,
            backstep = config.general.backstep,
            "machine built"
        );
        Ok(machine)
    }

    /// Returns the memory.
    pub const fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Returns the general-purpose register file.
    pub const fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    /// Returns the floating-point register file.
    pub const fn fp_registers(&self) -> &FloatingPointRegisterFile {
        &self.fp_registers
    }

    /// Returns the control and status register file.
    pub const fn csrs(&self) -> &ControlAndStatusRegisterFile {
        &self.csrs
    }

    /// Returns the reservation tables.
    pub const fn reservations(&self) -> &ReservationTables {
        &self.reservations
    }

    /// Returns the layout registry.
    pub const fn configurations(&self) -> &MemoryConfigurations {
        &self.configurations
    }

    /// Returns the selected layout.
    pub fn current_configuration(&self) -> Arc<MemoryConfiguration> {
        Arc::clone(self.configurations.get_current_configuration())
    }

    /// Adds a layout to the registry without selecting it.
    pub fn register_configuration(
        &mut self,
        configuration: MemoryConfiguration,
    ) -> Result<Arc<MemoryConfiguration>, ConfigError> {
        self.configurations.register(configuration)
    }

    /// Selects the layout called `identifier`.
    ///
    /// # Returns
    ///
    /// `Ok(true)` if the layout changed: memory is then re-laid out and cleared, the
    /// register reset values re-homed and every register and reservation reset.
    pub fn set_current_configuration(&mut self, identifier: &str) -> Result<bool, ConfigError> {
        if !self.configurations.set_current_configuration(identifier)? {
            return Ok(false);
        }
        let current = self.current_configuration();
        self.memory.set_configuration(Arc::clone(&current));
        self.registers.apply_configuration(&current);
        self.registers.reset_registers();
        self.fp_registers.reset_registers();
        self.csrs.reset_registers();
        self.reservations.reset();
        info!(identifier, "memory configuration switched");
        Ok(true)
    }

    /// Attaches or detaches the undo sink on memory and every register file.
    pub fn set_backstepper(&mut self, backstepper: Option<Arc<dyn Backstepper>>) {
        self.memory.set_backstepper(backstepper.clone());
        self.registers.set_backstepper(backstepper.clone());
        self.fp_registers.set_backstepper(backstepper.clone());
        self.csrs.set_backstepper(backstepper.clone());
        self.backstepper = backstepper;
    }

    /// Returns the attached undo sink.
    pub const fn backstepper(&self) -> Option<&Arc<dyn Backstepper>> {
        self.backstepper.as_ref()
    }

    /// Installs `memory` and returns the previous instance.
    ///
    /// The attached backstepper moves to the new memory.
    pub fn swap_memory(&mut self, memory: Memory) -> Memory {
        memory.set_backstepper(self.backstepper.clone());
        memory.set_self_modifying_code(self.memory.self_modifying_code());
        let previous = mem::replace(&mut self.memory, memory);
        previous.set_backstepper(None);
        debug!("memory swapped");
        previous
    }

    /// Sets whether the PC starts at `main`.
    pub fn set_start_at_main(&mut self, enabled: bool) {
        self.start_at_main = enabled;
    }

    /// Points the PC at the program entry: `main` when enabled and inside the text
    /// segment, otherwise the text base.
    pub fn initialize_program_counter(&self, symbols: &dyn SymbolTable) -> u32 {
        self.registers
            .initialize_program_counter_at_main(self.start_at_main, symbols, |address| {
                self.memory.in_text_segment(address)
            })
    }

    /// Writes a previous value back without recording a new undo step.
    pub fn restore(&self, record: RestoreRecord) -> Result<(), AddressError> {
        match record {
            RestoreRecord::Register { number, value } => {
                self.registers.restore_register(number, value);
            }
            RestoreRecord::FloatingPointRegister { number, value } => {
                self.fp_registers.restore_register(number, value);
            }
            RestoreRecord::ControlAndStatusRegister { number, value } => {
                let _ = self.csrs.update_register_backdoor(number, value);
            }
            RestoreRecord::ProgramCounter { value } => {
                self.registers.restore_program_counter(value);
            }
            RestoreRecord::MemoryWord { .. }
            | RestoreRecord::MemoryHalf { .. }
            | RestoreRecord::MemoryByte { .. }
            | RestoreRecord::MemoryRawWord { .. }
            | RestoreRecord::MemoryDoubleWord { .. } => self.memory.restore(record)?,
        }
        Ok(())
    }

    /// Undoes the newest step of the built-in [`RestoreLog`].
    ///
    /// # Returns
    ///
    /// `Ok(false)` if no log is attached or it is empty.
    pub fn backstep(&self) -> Result<bool, AddressError> {
        let Some(record) = self.restore_log.as_ref().and_then(|log| log.pop()) else {
            return Ok(false);
        };
        self.restore(record)?;
        Ok(true)
    }

    /// Clears memory, registers, reservations and the undo log.
    pub fn reset(&self) {
        self.memory.clear();
        self.registers.reset_registers();
        self.fp_registers.reset_registers();
        self.csrs.reset_registers();
        self.reservations.reset();
        if let Some(log) = &self.restore_log {
            log.clear();
        }
    }
}

impl fmt::Debug for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("configuration", &self.current_configuration().identifier())
            .field("memory", &self.memory)
            .field("reservations", &self.reservations)
            .field("backstep", &self.backstepper.is_some())
            .field("start_at_main", &self.start_at_main)
            .finish_non_exhaustive()
    }
}
