//! Atari 2600 cartridge handling and bank switching
//!
//! Bank switching on the Atari 2600 is triggered by reads or writes to specific
//! "hotspot" addresses inside the $1000-$1FFF cartridge window; the value
//! read/written at the hotspot itself is irrelevant, only the access matters.
//! Cartridges are loaded as a raw ROM image plus a variant tag supplied by the
//! caller (there is no header), so construction is fallible: a tag the
//! cartridge layer doesn't recognize, or a ROM size that doesn't match what the
//! tag expects, is a fatal, caller-visible error rather than a silent guess.
//!
//! Bank selection is stored in `Cell`s rather than plain fields: a hotspot
//! *read* must switch banks as a side effect, and the `Memory6502::read`
//! contract this cartridge feeds into takes `&self`, not `&mut self`.

use std::cell::{Cell, RefCell};

use emu_core::log;
use emu_core::logging::{LogCategory, LogLevel};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when constructing or operating on a cartridge.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CartridgeError {
    #[error("ROM size {actual} bytes does not match the {bytes_per_bank}-byte bank layout required by cartridge type '{tag}'")]
    MalformedRom {
        tag: String,
        actual: usize,
        bytes_per_bank: usize,
    },
    #[error("unknown cartridge type tag: '{0}'")]
    UnknownCartridgeType(String),
}

/// Bank-switching variant, identified by the tag string the caller supplies
/// alongside the raw ROM image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CartridgeKind {
    /// 2-4 KB, one bank, no hotspots at all.
    SingleBank,
    /// `default` / `f8`: 8 KB, 2 banks of 4 KB, hotspots $1FF8-$1FF9.
    F8,
    /// `super` / `f6`: 16 KB, 4 banks of 4 KB, hotspots $1FF6-$1FF9.
    F6,
    /// `f4`: 32 KB, 8 banks of 4 KB, hotspots $1FF4-$1FFB.
    F4,
    /// `cbs` / `fa`: 12 KB, 3 banks of 4 KB, hotspots $1FF8-$1FFA, plus 256 B
    /// of RAM: write port at $1000-$10FF, read port at $1100-$11FF (same
    /// underlying bytes, two address windows so code running out of the
    /// bank above can't be corrupted by a stray RAM write).
    Fa,
    /// `e` (Parker Bros alternate scheme): 8 KB, 2 banks of 4 KB, hotspot pair
    /// at offset $FF8/$FF9 within the window.
    E,
    /// `pb`: 16 KB organized as 16 1 KB segments grouped into 4 fixed 1 KB
    /// windows of 4 choices each, selected by 16 hotspots at $1FE0-$1FEF.
    Pb,
    /// `fe`: 8 KB, 2 banks of 4 KB, switched by the data-bus value sampled
    /// when the CPU stores to the stack page near $01FE/$01FF (real hardware
    /// inspects the data bus, not cartridge-space addresses).
    Fe,
    /// `mnet` (M-Network): 16 KB organized as 8 selectable 2 KB banks mapped
    /// to $1000-$17FF, plus 2 KB fixed at $1800-$1FFF, and a 4x256-byte RAM
    /// window at $1000-$10FF.
    MNetwork,
}

/// Atari 2600 cartridge: ROM image plus bank-switching state.
#[derive(Debug, Serialize, Deserialize)]
pub struct Cartridge {
    kind: CartridgeKind,
    rom: Vec<u8>,
    bank_size: usize,
    bank_count: usize,
    current_bank: Cell<usize>,
    /// Segment selection for `Pb`: one selected bank (0-3) per 1 KB window.
    pb_segments: Cell<[usize; 4]>,
    /// Selected 2 KB bank (0-7) for `MNetwork`'s switched $1000-$17FF window.
    mnet_bank: Cell<usize>,
    /// On-cartridge RAM, used by `Fa` (256 B) and `MNetwork` (4 x 256 B).
    ram: RefCell<Vec<u8>>,
}

impl Clone for Cartridge {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            rom: self.rom.clone(),
            bank_size: self.bank_size,
            bank_count: self.bank_count,
            current_bank: Cell::new(self.current_bank.get()),
            pb_segments: Cell::new(self.pb_segments.get()),
            mnet_bank: Cell::new(self.mnet_bank.get()),
            ram: RefCell::new(self.ram.borrow().clone()),
        }
    }
}

impl Cartridge {
    /// Build a cartridge from a raw ROM image and a variant tag.
    ///
    /// Tags follow the table documented on [`CartridgeKind`]: `single_bank`,
    /// `default`/`f8`, `super`/`f6`, `f4`, `cbs`/`fa`, `e`, `pb`, `fe`, `mnet`.
    pub fn new(rom: Vec<u8>, tag: &str) -> Result<Self, CartridgeError> {
        let kind = match tag {
            "single_bank" => CartridgeKind::SingleBank,
            "default" | "f8" => CartridgeKind::F8,
            "super" | "f6" => CartridgeKind::F6,
            "f4" => CartridgeKind::F4,
            "cbs" | "fa" => CartridgeKind::Fa,
            "e" => CartridgeKind::E,
            "pb" => CartridgeKind::Pb,
            "fe" => CartridgeKind::Fe,
            "mnet" => CartridgeKind::MNetwork,
            other => return Err(CartridgeError::UnknownCartridgeType(other.to_string())),
        };

        let (bank_size, bank_count): (usize, usize) = match kind {
            CartridgeKind::SingleBank => (rom.len().max(1), 1),
            CartridgeKind::F8 | CartridgeKind::E => (4096, 2),
            CartridgeKind::F6 => (4096, 4),
            CartridgeKind::F4 => (4096, 8),
            CartridgeKind::Fa => (4096, 3),
            CartridgeKind::Pb => (1024, 16),
            CartridgeKind::Fe => (4096, 2),
            CartridgeKind::MNetwork => (2048, 8),
        };

        if kind == CartridgeKind::SingleBank {
            if rom.len() != 2048 && rom.len() != 4096 {
                return Err(CartridgeError::MalformedRom {
                    tag: tag.to_string(),
                    actual: rom.len(),
                    bytes_per_bank: rom.len(),
                });
            }
        } else {
            let expected = bank_size * bank_count;
            if rom.len() != expected {
                return Err(CartridgeError::MalformedRom {
                    tag: tag.to_string(),
                    actual: rom.len(),
                    bytes_per_bank: bank_size,
                });
            }
        }

        let ram_size = match kind {
            CartridgeKind::Fa => 256,
            CartridgeKind::MNetwork => 256 * 4,
            _ => 0,
        };

        Ok(Self {
            kind,
            rom,
            bank_size,
            bank_count,
            current_bank: Cell::new(0),
            pb_segments: Cell::new([0, 1, 2, 3]),
            mnet_bank: Cell::new(0),
            ram: RefCell::new(vec![0; ram_size]),
        })
    }

    /// Build a cartridge from a raw ROM image alone, inferring a tag from
    /// its size. Mount interfaces that only carry a byte stream (no header,
    /// no out-of-band tag) have no way to tell `f8`/`e`/`fe` apart at 8 KB,
    /// or `f6`/`pb`/`mnet` apart at 16 KB; this resolves each size to the
    /// most common scheme for that size, matching the fallback precedence
    /// real-world loaders use when no database entry exists for a ROM.
    pub fn from_rom_size(rom: Vec<u8>) -> Result<Self, CartridgeError> {
        let tag = match rom.len() {
            2048 | 4096 => "single_bank",
            8192 => "f8",
            12288 => "fa",
            16384 => "f6",
            32768 => "f4",
            other => {
                return Err(CartridgeError::MalformedRom {
                    tag: "auto".to_string(),
                    actual: other,
                    bytes_per_bank: 0,
                })
            }
        };
        Self::new(rom, tag)
    }

    /// Current banking scheme.
    pub fn kind(&self) -> CartridgeKind {
        self.kind
    }

    /// Currently selected bank for the simple single-switch schemes.
    pub fn current_bank(&self) -> usize {
        self.current_bank.get()
    }

    /// Total ROM size in bytes.
    pub fn size(&self) -> usize {
        self.rom.len()
    }

    fn switch_bank(&self, bank: usize) {
        if self.current_bank.get() != bank {
            log!(
                LogCategory::Bus,
                LogLevel::Debug,
                "cartridge: {:?} switched to bank {}",
                self.kind,
                bank
            );
        }
        self.current_bank.set(bank);
    }

    fn apply_hotspot(&self, addr: u16) {
        match self.kind {
            CartridgeKind::SingleBank => {}
            CartridgeKind::F8 => match addr {
                0x1FF8 => self.switch_bank(0),
                0x1FF9 => self.switch_bank(1),
                _ => {}
            },
            CartridgeKind::F6 => match addr {
                0x1FF6 => self.switch_bank(0),
                0x1FF7 => self.switch_bank(1),
                0x1FF8 => self.switch_bank(2),
                0x1FF9 => self.switch_bank(3),
                _ => {}
            },
            CartridgeKind::F4 => {
                if (0x1FF4..=0x1FFB).contains(&addr) {
                    self.switch_bank((addr - 0x1FF4) as usize);
                }
            }
            CartridgeKind::Fa => match addr {
                0x1FF8 => self.switch_bank(0),
                0x1FF9 => self.switch_bank(1),
                0x1FFA => self.switch_bank(2),
                _ => {}
            },
            CartridgeKind::E => match addr {
                0x1FF8 => self.switch_bank(0),
                0x1FF9 => self.switch_bank(1),
                _ => {}
            },
            CartridgeKind::Pb => {
                if (0x1FE0..=0x1FEF).contains(&addr) {
                    let idx = (addr - 0x1FE0) as usize;
                    let window = idx / 4;
                    let choice = idx % 4;
                    let mut segments = self.pb_segments.get();
                    segments[window] = choice;
                    self.pb_segments.set(segments);
                }
            }
            CartridgeKind::Fe => {
                // Handled out-of-band via `snoop_stack_write`, not by address decode.
            }
            CartridgeKind::MNetwork => {
                if (0x1FE0..=0x1FE7).contains(&addr) {
                    self.mnet_bank.set((addr - 0x1FE0) as usize);
                }
            }
        }
    }

    /// Read a byte from cartridge space. `addr` is a 12-bit offset within
    /// $1000-$1FFF (i.e. already masked by the caller). Hotspot reads switch
    /// banks as a side effect before the byte is computed, so the returned
    /// byte reflects the new bank.
    pub fn read(&self, addr: u16) -> u8 {
        self.apply_hotspot(addr);

        match self.kind {
            CartridgeKind::SingleBank => {
                let mask = (self.bank_size - 1) as u16;
                self.rom[(addr & mask) as usize]
            }
            CartridgeKind::Fa => {
                if (0x0100..=0x01FF).contains(&addr) {
                    self.ram.borrow()[(addr - 0x0100) as usize]
                } else {
                    let offset = (addr & 0x0FFF) as usize;
                    self.rom[self.current_bank.get() * self.bank_size + offset]
                }
            }
            CartridgeKind::F8 | CartridgeKind::F6 | CartridgeKind::F4 | CartridgeKind::E => {
                let offset = (addr & 0x0FFF) as usize;
                self.rom[self.current_bank.get() * self.bank_size + offset]
            }
            CartridgeKind::Pb => {
                let window = (addr >> 10) as usize & 0x3;
                let within = (addr & 0x03FF) as usize;
                let segment_base = window * 4 + self.pb_segments.get()[window];
                self.rom[segment_base * 1024 + within]
            }
            CartridgeKind::Fe => {
                let offset = (addr & 0x0FFF) as usize;
                self.rom[self.current_bank.get() * self.bank_size + offset]
            }
            CartridgeKind::MNetwork => {
                if addr < 0x0800 {
                    if addr < 0x0100 {
                        self.ram.borrow()[addr as usize]
                    } else {
                        let offset = addr as usize;
                        self.rom[self.mnet_bank.get() * 2048 + offset]
                    }
                } else {
                    let offset = (addr - 0x0800) as usize;
                    self.rom[(self.bank_count - 1) * 2048 + offset]
                }
            }
        }
    }

    /// Write to cartridge space. For pure-ROM variants this only drives bank
    /// switching; for variants with embedded RAM it services the RAM window.
    pub fn write(&self, addr: u16, val: u8) {
        match self.kind {
            CartridgeKind::Fa => {
                if (0x000..=0x0FF).contains(&addr) {
                    self.ram.borrow_mut()[addr as usize] = val;
                    return;
                }
            }
            CartridgeKind::MNetwork => {
                if addr < 0x0100 {
                    self.ram.borrow_mut()[addr as usize] = val;
                    return;
                }
            }
            _ => {}
        }
        self.apply_hotspot(addr);
    }

    /// Sample the data-bus value written near the top of the stack page
    /// ($01FE/$01FF). Only `Fe` cartridges react; real `fe` hardware decodes
    /// the return address pushed by a cross-bank JSR off the data bus rather
    /// than from a cartridge-space address.
    pub fn snoop_stack_write(&self, stack_addr: u16, val: u8) {
        if self.kind != CartridgeKind::Fe {
            return;
        }
        if stack_addr == 0x01FE || stack_addr == 0x01FF {
            self.switch_bank(if (val & 0x20) != 0 { 1 } else { 0 });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_bank_2k_mirrors_across_window() {
        let rom = vec![0x42; 2048];
        let cart = Cartridge::new(rom, "single_bank").unwrap();
        assert_eq!(cart.read(0x0000), 0x42);
        assert_eq!(cart.read(0x0FFF), 0x42);
    }

    #[test]
    fn f8_banking_switches_on_hotspot_read() {
        let mut rom = vec![0x00; 8192];
        rom[0] = 0x11;
        rom[4096] = 0x22;
        let cart = Cartridge::new(rom, "f8").unwrap();

        assert_eq!(cart.current_bank(), 0);
        assert_eq!(cart.read(0x0000), 0x11);

        assert_eq!(cart.read(0x0FF9), 0x22); // hotspot read switches, then reflects new bank
        assert_eq!(cart.current_bank(), 1);
        assert_eq!(cart.read(0x0000), 0x22);
    }

    #[test]
    fn f6_banking_covers_all_four_banks() {
        let mut rom = vec![0x00; 16384];
        for i in 0..4 {
            rom[i * 4096] = (0x10 + i) as u8;
        }
        let cart = Cartridge::new(rom, "super").unwrap();
        for bank in 0..4u16 {
            cart.read(0x0FF6 + bank);
            assert_eq!(cart.current_bank(), bank as usize);
        }
    }

    #[test]
    fn f4_banking_covers_all_eight_banks() {
        let rom = vec![0x00; 32768];
        let cart = Cartridge::new(rom, "f4").unwrap();
        for bank in 0..8u16 {
            cart.read(0x0FF4 + bank);
            assert_eq!(cart.current_bank(), bank as usize);
        }
    }

    #[test]
    fn fa_cartridge_has_ram_window() {
        let rom = vec![0x00; 4096 * 3];
        let cart = Cartridge::new(rom, "cbs").unwrap();
        cart.write(0x0000, 0xAB);
        assert_eq!(cart.read(0x0100), 0xAB);
    }

    #[test]
    fn mnet_cartridge_ram_round_trips() {
        let rom = vec![0x00; 2048 * 8];
        let cart = Cartridge::new(rom, "mnet").unwrap();
        cart.write(0x0000, 0xCD);
        assert_eq!(cart.read(0x0000), 0xCD);
        cart.write(0x00FF, 0x12);
        assert_eq!(cart.read(0x00FF), 0x12);
    }

    #[test]
    fn malformed_rom_size_is_rejected() {
        let rom = vec![0x00; 1000];
        let err = Cartridge::new(rom, "f8").unwrap_err();
        assert!(matches!(err, CartridgeError::MalformedRom { .. }));
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let rom = vec![0x00; 4096];
        let err = Cartridge::new(rom, "not_a_real_scheme").unwrap_err();
        assert!(matches!(err, CartridgeError::UnknownCartridgeType(_)));
    }

    #[test]
    fn fe_cartridge_switches_on_stack_snoop() {
        let rom = vec![0x00; 8192];
        let cart = Cartridge::new(rom, "fe").unwrap();
        assert_eq!(cart.current_bank(), 0);
        cart.snoop_stack_write(0x01FE, 0x20);
        assert_eq!(cart.current_bank(), 1);
        cart.snoop_stack_write(0x01FE, 0x00);
        assert_eq!(cart.current_bank(), 0);
    }

    #[test]
    fn pb_cartridge_selects_segment_per_window() {
        let mut rom = vec![0u8; 1024 * 16];
        // Window 1 covers segments 4..8; mark segment 6 (choice 2) distinctly.
        rom[6 * 1024] = 0x99;
        let cart = Cartridge::new(rom, "pb").unwrap();
        cart.read(0x1FE0 + 4 + 2); // window 1, choice 2 -> segment 6
        assert_eq!(cart.read(0x0400), 0x99);
    }
}
