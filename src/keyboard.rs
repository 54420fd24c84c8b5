use std::collections::HashSet;
use std::convert::TryFrom;
use std::iter::FromIterator;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

pub const NUM_KEYS: usize = 16;

/// Key's variants are the 16 keys from the CHIP-8's hexadecimal keyboard.
/// The recommended key mapping is:
///
/// Keypad                   Keyboard
/// +-+-+-+-+                +-+-+-+-+
/// |1|2|3|C|                |1|2|3|4|
/// +-+-+-+-+                +-+-+-+-+
/// |4|5|6|D|                |Q|W|E|R|
/// +-+-+-+-+       =>       +-+-+-+-+
/// |7|8|9|E|                |A|S|D|F|
/// +-+-+-+-+                +-+-+-+-+
/// |A|0|B|F|                |Z|X|C|V|
/// +-+-+-+-+                +-+-+-+-+
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Key {
    Key0,
    Key1,
    Key2,
    Key3,
    Key4,
    Key5,
    Key6,
    Key7,
    Key8,
    Key9,
    A,
    B,
    C,
    D,
    E,
    F,
}

const ALL_KEYS: [Key; NUM_KEYS] = [
    Key::Key0,
    Key::Key1,
    Key::Key2,
    Key::Key3,
    Key::Key4,
    Key::Key5,
    Key::Key6,
    Key::Key7,
    Key::Key8,
    Key::Key9,
    Key::A,
    Key::B,
    Key::C,
    Key::D,
    Key::E,
    Key::F,
];

impl From<Key> for u8 {
    fn from(key: Key) -> u8 {
        key as u8
    }
}

impl TryFrom<u8> for Key {
    type Error = u8;

    /// Fails with the rejected value if it is not a hex digit
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        ALL_KEYS.get(value as usize).copied().ok_or(value)
    }
}

/// Anything that can report which of the 16 keys are currently held down.
/// The Emulator polls this once per `handle_key_input` call
pub trait AsKeyboard {
    fn keys_down(&self) -> Vec<Key>;

    /// Keys that went down since the last call, in order, including any that
    /// were released again before the poll. Sources that only know the
    /// current state can leave this empty
    fn keys_pressed(&self) -> Vec<Key> {
        Vec::new()
    }
}

/// Progress of the FX0A (wait for key) instruction
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum KeyWait {
    /// No FX0A instruction is pending
    Idle,
    /// An FX0A instruction has run and no key has been pressed since
    Waiting,
    /// A key was pressed while waiting; the next step stores it and moves on
    Satisfied(Key),
}

impl Default for KeyWait {
    fn default() -> Self {
        KeyWait::Idle
    }
}

/// Contains the state (up or down) of the CHIP-8's 16 keys, as well as any
/// state related to keyboard input
pub struct Keyboard {
    key_input: [bool; NUM_KEYS], // true while the key is held down
    last_key_pressed: Option<Key>,
    key_wait: KeyWait, // used to store state for instruction FX0A
}

impl Keyboard {
    pub fn new() -> Self {
        Keyboard {
            key_input: [false; NUM_KEYS],
            last_key_pressed: None,
            key_wait: KeyWait::Idle,
        }
    }

    /// Handle the key down event for one of the 16 possible keys. If an FX0A
    /// instruction is waiting, the key satisfies it
    pub fn handle_key_down(&mut self, key: Key) {
        self.key_input[key as usize] = true;
        self.last_key_pressed = Some(key);

        if self.key_wait == KeyWait::Waiting {
            self.key_wait = KeyWait::Satisfied(key);
        }
    }

    /// Handle the key up event for one of the 16 possible keys
    pub fn handle_key_up(&mut self, key: Key) {
        self.key_input[key as usize] = false;
    }

    /// Given the keys pressed down on the system keyboard, fire the
    /// appropriate key_up and key_down handlers
    pub fn update_keyboard_with_vec(&mut self, keys: &[Key]) {
        let set: HashSet<Key> = HashSet::from_iter(keys.iter().cloned());

        // check each of the 16 keys to see which have changed from up to down or vice versa
        for key in ALL_KEYS.iter() {
            let system_key_is_down = set.contains(key);
            let interpreter_key_is_down = self.get_key_state(*key);

            if system_key_is_down && !interpreter_key_is_down {
                self.handle_key_down(*key);
            } else if !system_key_is_down && interpreter_key_is_down {
                self.handle_key_up(*key);
            }
        }
    }

    /// Return true if the key is currently held down
    pub fn get_key_state(&self, key: Key) -> bool {
        self.key_input[key as usize]
    }

    /// The most recent key to go down, if any key has been pressed yet
    pub fn last_key_pressed(&self) -> Option<Key> {
        self.last_key_pressed
    }

    pub fn key_wait(&self) -> KeyWait {
        self.key_wait
    }

    /// Called when the KeyOpGet Op is executed. Moves Idle to Waiting, and
    /// consumes the key once one has been pressed. Returns the key the op
    /// should store, or None if it must keep waiting
    pub fn poll_key_wait(&mut self) -> Option<Key> {
        match self.key_wait {
            KeyWait::Idle => {
                self.key_wait = KeyWait::Waiting;
                None
            }
            KeyWait::Waiting => None,
            KeyWait::Satisfied(key) => {
                self.key_wait = KeyWait::Idle;
                Some(key)
            }
        }
    }
}

impl Default for Keyboard {
    fn default() -> Self {
        Self::new()
    }
}

/// Key state that can be shared between an input thread, which presses and
/// releases keys, and the thread driving the Emulator, which reads it through
/// `AsKeyboard` before each batch of steps. Presses are remembered until read,
/// so a tap that ends between two polls still reaches the Emulator
#[derive(Clone, Default)]
pub struct KeyLatch {
    state: Arc<Mutex<LatchState>>,
}

#[derive(Default)]
struct LatchState {
    down: [bool; NUM_KEYS],
    pressed: Vec<Key>,
}

impl KeyLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&self, key: Key) {
        let mut state = self.lock();
        if !state.down[key as usize] {
            state.pressed.push(key);
        }
        state.down[key as usize] = true;
    }

    pub fn release(&self, key: Key) {
        self.lock().down[key as usize] = false;
    }

    fn lock(&self) -> MutexGuard<'_, LatchState> {
        // a writer that panicked cannot leave the state half written
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl AsKeyboard for KeyLatch {
    fn keys_down(&self) -> Vec<Key> {
        let state = self.lock();
        ALL_KEYS
            .iter()
            .filter(|key| state.down[**key as usize])
            .copied()
            .collect()
    }

    fn keys_pressed(&self) -> Vec<Key> {
        std::mem::take(&mut self.lock().pressed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn key_u8_conversions() {
        assert_eq!(u8::from(Key::Key0), 0x0);
        assert_eq!(u8::from(Key::Key9), 0x9);
        assert_eq!(u8::from(Key::A), 0xA);
        assert_eq!(u8::from(Key::F), 0xF);

        assert_eq!(Key::try_from(0xC), Ok(Key::C));
        assert_eq!(Key::try_from(0x10), Err(0x10));
    }

    #[test]
    fn key_down_and_up() {
        let mut keyboard = Keyboard::new();
        assert!(!keyboard.get_key_state(Key::Key1));

        keyboard.handle_key_down(Key::Key1);
        assert!(keyboard.get_key_state(Key::Key1));
        assert_eq!(keyboard.last_key_pressed(), Some(Key::Key1));

        keyboard.handle_key_up(Key::Key1);
        assert!(!keyboard.get_key_state(Key::Key1));
        assert_eq!(keyboard.last_key_pressed(), Some(Key::Key1));
    }

    #[test]
    fn update_with_vec_fires_transitions() {
        let mut keyboard = Keyboard::new();

        keyboard.update_keyboard_with_vec(&[Key::A, Key::Key3]);
        assert!(keyboard.get_key_state(Key::A));
        assert!(keyboard.get_key_state(Key::Key3));

        keyboard.update_keyboard_with_vec(&[Key::Key3]);
        assert!(!keyboard.get_key_state(Key::A));
        assert!(keyboard.get_key_state(Key::Key3));

        keyboard.update_keyboard_with_vec(&[]);
        assert!(!keyboard.get_key_state(Key::Key3));
    }

    #[test]
    fn key_wait_state_machine() {
        let mut keyboard = Keyboard::new();
        assert_eq!(keyboard.key_wait(), KeyWait::Idle);

        // a key pressed before the wait started does not count
        keyboard.handle_key_down(Key::B);
        assert_eq!(keyboard.poll_key_wait(), None);
        assert_eq!(keyboard.key_wait(), KeyWait::Waiting);

        assert_eq!(keyboard.poll_key_wait(), None);
        assert_eq!(keyboard.key_wait(), KeyWait::Waiting);

        keyboard.handle_key_down(Key::Key7);
        assert_eq!(keyboard.key_wait(), KeyWait::Satisfied(Key::Key7));

        // later presses do not replace the latched key
        keyboard.handle_key_down(Key::Key8);
        assert_eq!(keyboard.key_wait(), KeyWait::Satisfied(Key::Key7));

        assert_eq!(keyboard.poll_key_wait(), Some(Key::Key7));
        assert_eq!(keyboard.key_wait(), KeyWait::Idle);
    }

    #[test]
    fn key_latch_across_threads() {
        let latch = KeyLatch::new();
        let writer = latch.clone();

        thread::spawn(move || {
            writer.press(Key::D);
            writer.press(Key::Key2);
            writer.release(Key::Key2);
        })
        .join()
        .expect("input thread panicked");

        assert_eq!(latch.keys_down(), vec![Key::D]);
        assert_eq!(latch.keys_pressed(), vec![Key::D, Key::Key2]);
        assert!(latch.keys_pressed().is_empty());

        let mut keyboard = Keyboard::new();
        keyboard.update_keyboard_with_vec(&latch.keys_down());
        assert!(keyboard.get_key_state(Key::D));
    }

    #[test]
    fn key_latch_ignores_held_key_repeats() {
        let latch = KeyLatch::new();

        latch.press(Key::A);
        latch.press(Key::A);
        assert_eq!(latch.keys_pressed(), vec![Key::A]);

        latch.release(Key::A);
        latch.press(Key::A);
        assert_eq!(latch.keys_pressed(), vec![Key::A]);
    }
}
