use chip8vm::clock::Pacer;
use chip8vm::{AsKeyboard, Config, Emulator, Key, HEIGHT, WIDTH};
use device_query::{DeviceQuery, DeviceState, Keycode};
use minifb::{Scale, ScaleMode, Window, WindowOptions};
use std::error::Error;
use std::time::{Duration, Instant};

struct Keyboard(pub DeviceState);

impl AsKeyboard for Keyboard {
    fn keys_down(&self) -> Vec<Key> {
        self.0
            .get_keys()
            .iter()
            .filter_map(|key: &Keycode| match key {
                Keycode::Key1 => Some(Key::Key1),
                Keycode::Key2 => Some(Key::Key2),
                Keycode::Key3 => Some(Key::Key3),
                Keycode::Key4 => Some(Key::C),
                Keycode::Q => Some(Key::Key4),
                Keycode::W => Some(Key::Key5),
                Keycode::E => Some(Key::Key6),
                Keycode::R => Some(Key::D),
                Keycode::A => Some(Key::Key7),
                Keycode::S => Some(Key::Key8),
                Keycode::D => Some(Key::Key9),
                Keycode::F => Some(Key::E),
                Keycode::Z => Some(Key::A),
                Keycode::X => Some(Key::Key0),
                Keycode::C => Some(Key::B),
                Keycode::V => Some(Key::F),
                _ => None,
            })
            .collect()
    }
}

fn window_scale(scale: u32) -> Scale {
    match scale {
        1 => Scale::X1,
        2 => Scale::X2,
        4 => Scale::X4,
        16 => Scale::X16,
        32 => Scale::X32,
        _ => Scale::X8,
    }
}

// cargo run --example pong -- path/to/PONG [config.json]
fn main() -> Result<(), Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let rom = args.next().unwrap_or_else(|| "games/PONG".to_string());
    let config = match args.next() {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    };
    let logger = config.logger()?;

    let mut window: Window = Window::new(
        "Chip 8 Emulator (In Rust!)",
        WIDTH,
        HEIGHT,
        WindowOptions {
            resize: true,
            scale: window_scale(config.scale),
            scale_mode: ScaleMode::UpperLeft,
            ..WindowOptions::default()
        },
    )?;

    // Limit to max update rate. This only needs about 60 Hz, which is 16ms
    window.limit_update_rate(Some(Duration::from_millis(16)));

    // create the emulator and load the pong game file, with the configured seed and font
    let program = std::fs::read(&rom)?;
    let mut emulator = match config.seed {
        Some(seed) => Emulator::with_seed(Some(logger), seed),
        None => Emulator::new(Some(logger)),
    };
    match &config.font {
        Some(font) => emulator.load_font_file(font, &program)?,
        None => emulator.init(&program)?,
    }
    let mut pacer = Pacer::new(config.clock_hz);

    // setup keyboard
    let keyboard = Keyboard(DeviceState::new());

    let mut last = Instant::now();
    while window.is_open() {
        // check for key press changes and update the Emulator with which keys are up or down
        emulator.handle_key_input(&keyboard);

        let now = Instant::now();
        let ticks = pacer.advance(now - last);
        last = now;

        let mut redraw = false;
        for _ in 0..ticks.steps {
            redraw |= emulator.step()?.is_display_op();
        }
        for _ in 0..ticks.timers {
            emulator.timer();
        }

        if emulator.is_beeping() {
            window.set_title("Chip 8 Emulator (In Rust!) *beep*");
        } else {
            window.set_title("Chip 8 Emulator (In Rust!)");
        }

        // draw the display if it changed, otherwise just pump window events
        if redraw {
            window.update_with_buffer(emulator.get_pixels(), WIDTH, HEIGHT)?;
        } else {
            window.update();
        }
    }
    Ok(())
}
