//! An implementation of the CHIP 8 virtual machine in Rust.
//!
//! The [`Emulator`] owns memory, registers, the stack, both timers, the display
//! and the keyboard latch. A driver loop outside this crate calls
//! [`Emulator::step`] at its chosen clock rate and [`Emulator::timer`] at 60 Hz,
//! then reads the display and the sound timer to render a frame and play a tone.
//!
//! ```
//! use chip8vm::Emulator;
//!
//! let mut emulator = Emulator::new(None);
//! // V0 = 0x2A, then jump back to the start
//! emulator.init(&[0x60, 0x2A, 0x12, 0x00]).unwrap();
//! emulator.step().unwrap();
//! assert_eq!(emulator.register(0), 0x2A);
//! ```
#[macro_use]
extern crate slog;

use std::convert::TryFrom;
use std::fs;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use slog::{Discard, Logger};

pub mod clock;
pub mod config;
pub mod error;
pub mod graphics;
pub mod keyboard;
pub mod op;


pub use crate::config::Config;
pub use crate::error::{ConfigError, InitError, RuntimeError};
pub use crate::graphics::{Graphics, FONT_SET, HEIGHT, WIDTH};
pub use crate::keyboard::{AsKeyboard, Key, KeyLatch, KeyWait, Keyboard};
pub use crate::op::Op;

// # Interpreter
// * 4096 (0x1000) bytes of memory
// * the font lives in the first 512 (0x200) bytes, programs start at 0x200
// * 16 8-bit registers: V0 - VF
// * VF if used is the carry flag in addition operations, "no borrow" flag in subtraction, in draw
// operation the VF flag is set to denote pixel collision
// * the address register I is 16 bits wide
// * the stack is only used to store return addresses when subroutines are called

pub const MEMORY_SIZE: usize = 4096;

/// Where programs are loaded, and where the program counter starts
pub const STARTING_MEMORY_BYTE: usize = 0x200;

/// Largest program image that fits between 0x200 and the end of memory
pub const MAX_PROGRAM_SIZE: usize = MEMORY_SIZE - STARTING_MEMORY_BYTE;

/// CHIP 8 can hold up to 16 return addresses
pub const STACK_SIZE: usize = 16;

const FLAG: usize = 0xF;

/// Where the program counter goes after an instruction
enum Next {
    Advance,
    Skip,
    Jump(usize),
    Stay,
}

pub struct Emulator {
    memory: [u8; MEMORY_SIZE], // 4k of RAM

    stack: [usize; STACK_SIZE], // program stack
    sp: usize,                  // stack pointer

    addr: u16, // address register I
    pc: usize, // program counter

    // 16 8-bit registers. VF is used as a flag by several of the opcodes (see @Op)
    v: [u8; 16],

    graphics: Graphics, // 64x32 pixel monochrome screen

    delay_timer: u8, // 60 Hz timer that can be set and read
    sound_timer: u8, // 60 Hz timer that beeps whenever it is nonzero

    keyboard: Keyboard,

    rng: StdRng,
    logger: Logger,
}

impl Emulator {
    /// Creates an Emulator with the font loaded and an empty program. A None
    /// logger discards every record
    pub fn new(logger: Option<Logger>) -> Self {
        Self::with_rng(logger, StdRng::from_entropy())
    }

    /// Like `new`, but the random op produces the same sequence on every run
    pub fn with_seed(logger: Option<Logger>, seed: u64) -> Self {
        Self::with_rng(logger, StdRng::seed_from_u64(seed))
    }

    fn with_rng(logger: Option<Logger>, rng: StdRng) -> Self {
        let logger = logger.unwrap_or_else(|| Logger::root(Discard, o!()));
        let mut emulator = Emulator {
            memory: [0; MEMORY_SIZE],
            stack: [0; STACK_SIZE],
            sp: 0,
            addr: 0,
            pc: STARTING_MEMORY_BYTE,
            v: [0; 16],
            graphics: Graphics::new(),
            delay_timer: 0,
            sound_timer: 0,
            keyboard: Keyboard::new(),
            rng,
            logger,
        };
        emulator.memory[..FONT_SET.len()].copy_from_slice(&FONT_SET);
        emulator
    }

    /// Creates an Emulator and loads the program stored at `path`
    pub fn with_game_file<P: AsRef<Path>>(path: P, logger: Option<Logger>) -> Result<Self, InitError> {
        let program = read_program(path.as_ref())?;
        let mut emulator = Emulator::new(logger);
        emulator.init(&program)?;
        Ok(emulator)
    }

    /// Reset the machine and load `program` at 0x200 with the built-in font
    pub fn init(&mut self, program: &[u8]) -> Result<(), InitError> {
        self.init_with_font(&FONT_SET, program)
    }

    /// Reset the machine, load `font` at address 0 and `program` at 0x200.
    /// Nothing changes if either image is rejected
    pub fn init_with_font(&mut self, font: &[u8], program: &[u8]) -> Result<(), InitError> {
        if font.len() != FONT_SET.len() {
            return Err(InitError::InvalidFont { len: font.len() });
        }
        if program.len() > MAX_PROGRAM_SIZE {
            return Err(InitError::ProgramTooLarge {
                size: program.len(),
                max: MAX_PROGRAM_SIZE,
            });
        }

        self.memory = [0; MEMORY_SIZE];
        self.memory[..font.len()].copy_from_slice(font);
        self.memory[STARTING_MEMORY_BYTE..STARTING_MEMORY_BYTE + program.len()]
            .copy_from_slice(program);

        self.stack = [0; STACK_SIZE];
        self.sp = 0;
        self.addr = 0;
        self.pc = STARTING_MEMORY_BYTE;
        self.v = [0; 16];
        self.graphics.clear();
        self.delay_timer = 0;
        self.sound_timer = 0;
        self.keyboard = Keyboard::new();

        info!(self.logger, "loaded program"; "bytes" => program.len());
        Ok(())
    }

    /// Read an 80 byte font from `path` and reinitialize with it and `program`
    pub fn load_font_file<P: AsRef<Path>>(&mut self, path: P, program: &[u8]) -> Result<(), InitError> {
        let path = path.as_ref();
        let font = fs::read(path).map_err(|source| InitError::FontNotFound {
            path: path.to_path_buf(),
            source,
        })?;
        self.init_with_font(&font, program)
    }

    /// Fetch, decode and execute the instruction at the program counter.
    /// On error nothing about the machine has changed
    pub fn step(&mut self) -> Result<Op, RuntimeError> {
        let opcode = self.fetch()?;
        let op = Op::decode(opcode).ok_or(RuntimeError::IllegalInstruction {
            pc: self.pc as u16,
            opcode,
        })?;

        trace!(self.logger, "executing"; "pc" => format!("{:#05X}", self.pc), "opcode" => format!("{:#06X}", opcode), "op" => ?op);

        self.execute(op)?;
        Ok(op)
    }

    /// Decrement both timers by one, stopping at zero. Meant to be called at
    /// 60 Hz; calling faster simply counts down faster
    pub fn timer(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }

    fn fetch(&self) -> Result<u16, RuntimeError> {
        let hi = self.read_byte(self.pc)?;
        let lo = self.read_byte(self.pc + 1)?;
        Ok(u16::from(hi) << 8 | u16::from(lo))
    }

    fn read_byte(&self, addr: usize) -> Result<u8, RuntimeError> {
        self.memory.get(addr).copied().ok_or(self.fault(addr))
    }

    /// Check that `len` bytes starting at I are inside memory
    fn i_range(&self, len: usize) -> Result<std::ops::Range<usize>, RuntimeError> {
        let start = self.addr as usize;
        let end = start + len;
        if end > MEMORY_SIZE {
            return Err(self.fault(end - 1));
        }
        Ok(start..end)
    }

    fn fault(&self, addr: usize) -> RuntimeError {
        RuntimeError::MemoryFault {
            pc: self.pc as u16,
            addr,
        }
    }

    fn key(&self, x: u8) -> Result<Key, RuntimeError> {
        let value = self.v[x as usize];
        Key::try_from(value).map_err(|key| RuntimeError::InvalidKey {
            pc: self.pc as u16,
            key,
        })
    }

    fn execute(&mut self, op: Op) -> Result<(), RuntimeError> {
        // an op that falls through needs a next instruction inside memory,
        // checked before it changes anything
        let after = self.pc + 2;
        if after >= MEMORY_SIZE && self.falls_through(op) {
            return Err(self.fault(after));
        }

        let next = match op {
            Op::DispClear => {
                self.graphics.clear();
                Next::Advance
            }
            Op::Return => {
                if self.sp == 0 {
                    return Err(RuntimeError::StackUnderflow { pc: self.pc as u16 });
                }
                self.sp -= 1;
                Next::Jump(self.stack[self.sp])
            }
            Op::Goto(nnn) => Next::Jump(nnn as usize),
            Op::GotoSubRtn(nnn) => {
                if self.sp == STACK_SIZE {
                    return Err(RuntimeError::StackOverflow { pc: self.pc as u16 });
                }
                self.stack[self.sp] = self.pc + 2;
                self.sp += 1;
                Next::Jump(nnn as usize)
            }
            Op::CondVxEq(x, kk) => skip_if(self.v[x as usize] == kk),
            Op::CondVxNe(x, kk) => skip_if(self.v[x as usize] != kk),
            Op::CondVxVyEq(x, y) => skip_if(self.v[x as usize] == self.v[y as usize]),
            Op::ConstSetVx(x, kk) => {
                self.v[x as usize] = kk;
                Next::Advance
            }
            Op::ConstAddVx(x, kk) => {
                self.v[x as usize] = self.v[x as usize].wrapping_add(kk);
                Next::Advance
            }
            Op::AssignVyToVx(x, y) => {
                self.v[x as usize] = self.v[y as usize];
                Next::Advance
            }
            Op::BitOpOr(x, y) => {
                self.v[x as usize] |= self.v[y as usize];
                Next::Advance
            }
            Op::BitOpAnd(x, y) => {
                self.v[x as usize] &= self.v[y as usize];
                Next::Advance
            }
            Op::BitOpXor(x, y) => {
                self.v[x as usize] ^= self.v[y as usize];
                Next::Advance
            }
            Op::MathVxAddVy(x, y) => {
                let (sum, carry) = self.v[x as usize].overflowing_add(self.v[y as usize]);
                self.v[x as usize] = sum;
                self.v[FLAG] = carry as u8;
                Next::Advance
            }
            Op::MathVxMinusVy(x, y) => {
                let (vx, vy) = (self.v[x as usize], self.v[y as usize]);
                self.v[x as usize] = vx.wrapping_sub(vy);
                self.v[FLAG] = (vx > vy) as u8;
                Next::Advance
            }
            Op::BitOpRtShift(x) => {
                let vx = self.v[x as usize];
                self.v[x as usize] = vx >> 1;
                self.v[FLAG] = vx & 0x01;
                Next::Advance
            }
            Op::MathVyMinusVx(x, y) => {
                let (vx, vy) = (self.v[x as usize], self.v[y as usize]);
                self.v[x as usize] = vy.wrapping_sub(vx);
                self.v[FLAG] = (vy > vx) as u8;
                Next::Advance
            }
            Op::BitOpLftShift(x) => {
                // VF gets the raw high bit (0x80 or 0), not a normalized 1
                let vx = self.v[x as usize];
                self.v[x as usize] = vx << 1;
                self.v[FLAG] = vx & 0x80;
                Next::Advance
            }
            Op::CondVxVyNe(x, y) => skip_if(self.v[x as usize] != self.v[y as usize]),
            Op::MemSetI(nnn) => {
                self.addr = nnn;
                Next::Advance
            }
            Op::GotoPlusV0(nnn) => {
                let target = nnn as usize + self.v[0] as usize;
                if target >= MEMORY_SIZE {
                    return Err(self.fault(target));
                }
                Next::Jump(target)
            }
            Op::Rand(x, kk) => {
                let byte: u8 = self.rng.gen();
                self.v[x as usize] = byte & kk;
                Next::Advance
            }
            Op::DispDraw(x, y, n) => {
                let rows = self.i_range(n as usize)?;
                let (vx, vy) = (self.v[x as usize], self.v[y as usize]);

                let mut collision = false;
                for (i, addr) in rows.enumerate() {
                    let py = ((vy as usize + i) % HEIGHT) as u8;
                    collision |= self.graphics.draw_row(vx, py, self.memory[addr]);
                }
                self.v[FLAG] = collision as u8;
                Next::Advance
            }
            Op::KeyOpEqVx(x) => {
                let key = self.key(x)?;
                skip_if(self.keyboard.get_key_state(key))
            }
            Op::KeyOpNeVx(x) => {
                let key = self.key(x)?;
                skip_if(!self.keyboard.get_key_state(key))
            }
            Op::DelayGet(x) => {
                self.v[x as usize] = self.delay_timer;
                Next::Advance
            }
            Op::KeyOpGet(x) => {
                let before = self.keyboard.key_wait();
                match self.keyboard.poll_key_wait() {
                    Some(key) => {
                        debug!(self.logger, "key wait satisfied"; "key" => ?key, "register" => x);
                        self.v[x as usize] = key.into();
                        Next::Advance
                    }
                    None => {
                        if before == KeyWait::Idle {
                            debug!(self.logger, "waiting for key"; "register" => x);
                        }
                        Next::Stay
                    }
                }
            }
            Op::DelaySet(x) => {
                self.delay_timer = self.v[x as usize];
                Next::Advance
            }
            Op::SoundSet(x) => {
                self.sound_timer = self.v[x as usize];
                Next::Advance
            }
            Op::MemIPlusEqVx(x) => {
                self.addr = self.addr.wrapping_add(u16::from(self.v[x as usize]));
                Next::Advance
            }
            Op::MemISetSprite(x) => {
                self.addr = u16::from(self.v[x as usize]) * u16::from(graphics::NUM_BYTES_IN_FONT_CHAR);
                Next::Advance
            }
            Op::Bcd(x) => {
                let range = self.i_range(3)?;
                let vx = self.v[x as usize];
                self.memory[range].copy_from_slice(&[vx / 100, (vx / 10) % 10, vx % 10]);
                Next::Advance
            }
            Op::RegDump(x) => {
                let count = x as usize + 1;
                let range = self.i_range(count)?;
                self.memory[range].copy_from_slice(&self.v[..count]);
                Next::Advance
            }
            Op::RegLoad(x) => {
                let count = x as usize + 1;
                let range = self.i_range(count)?;
                self.v[..count].copy_from_slice(&self.memory[range]);
                Next::Advance
            }
        };

        let pc = match next {
            Next::Advance => self.pc + 2,
            Next::Skip => self.pc + 4,
            Next::Jump(addr) => addr,
            Next::Stay => self.pc,
        };
        // only a taken skip can get here out of range, and skips change nothing else
        if pc >= MEMORY_SIZE {
            return Err(self.fault(pc));
        }
        self.pc = pc;
        Ok(())
    }

    /// True if executing `op` now moves the PC to the following instruction
    /// (or pushes it as a return address)
    fn falls_through(&self, op: Op) -> bool {
        match op {
            Op::Goto(_) | Op::Return | Op::GotoPlusV0(_) => false,
            Op::KeyOpGet(_) => matches!(self.keyboard.key_wait(), KeyWait::Satisfied(_)),
            _ => true,
        }
    }

    /// Mark `key` as held down
    pub fn key_down(&mut self, key: Key) {
        self.keyboard.handle_key_down(key);
    }

    /// Mark `key` as released
    pub fn key_up(&mut self, key: Key) {
        self.keyboard.handle_key_up(key);
    }

    /// Poll the host keyboard and update which keys are up or down. Presses
    /// the host reports are applied first, so a key that was tapped and
    /// released since the last poll still satisfies a pending key wait
    pub fn handle_key_input(&mut self, keyboard: &impl AsKeyboard) {
        for key in keyboard.keys_pressed() {
            self.keyboard.handle_key_down(key);
        }
        let keys = keyboard.keys_down();
        self.keyboard.update_keyboard_with_vec(&keys);
    }

    pub fn key_wait(&self) -> KeyWait {
        self.keyboard.key_wait()
    }

    pub fn graphics(&self) -> &Graphics {
        &self.graphics
    }

    /// The display as a row major buffer of 0RGB pixels
    pub fn get_pixels(&self) -> &[u32] {
        self.graphics.get_pixels()
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    /// True while the sound timer is running, i.e. while a tone should play
    pub fn is_beeping(&self) -> bool {
        self.sound_timer > 0
    }

    pub fn pc(&self) -> u16 {
        self.pc as u16
    }

    /// Value of register V`x`. Only the low nibble of `x` is used
    pub fn register(&self, x: u8) -> u8 {
        self.v[(x & 0xF) as usize]
    }

    /// The address register I
    pub fn index(&self) -> u16 {
        self.addr
    }

    pub fn memory(&self) -> &[u8] {
        &self.memory
    }
}

fn skip_if(condition: bool) -> Next {
    if condition {
        Next::Skip
    } else {
        Next::Advance
    }
}

fn read_program(path: &Path) -> Result<Vec<u8>, InitError> {
    fs::read(path).map_err(|source| InitError::ProgramNotFound {
        path: path.to_path_buf(),
        source,
    })
}
