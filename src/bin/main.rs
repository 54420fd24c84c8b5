#[macro_use]
extern crate slog;

use std::fs;
use std::path::PathBuf;
use std::process;
use std::thread;
use std::time::{Duration, Instant};

use chip8vm::clock::Pacer;
use chip8vm::{Config, Emulator};
use clap::Parser;

/// Run a CHIP-8 program without a window and print the final display
#[derive(Parser, Debug)]
#[command(name = "chip8vm", version)]
struct Args {
    /// Program image to load at 0x200
    #[arg(value_name = "PROGRAM")]
    program: PathBuf,

    /// JSON config file; flags below override its values
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Instructions executed per second
    #[arg(long)]
    clock: Option<u32>,

    /// Seed for the random op
    #[arg(long)]
    seed: Option<u64>,

    /// 80 byte font file to use instead of the built-in font
    #[arg(long, value_name = "PATH")]
    font: Option<PathBuf>,

    /// Stop after this many instructions (0 = run until an error)
    #[arg(long, default_value_t = 0)]
    steps: u64,

    /// Run as fast as possible instead of at the configured clock
    #[arg(long)]
    unthrottled: bool,
}

fn load_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    };
    if let Some(clock) = args.clock {
        config.clock_hz = clock;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if args.font.is_some() {
        config.font = args.font.clone();
    }
    config.validate()?;
    Ok(config)
}

fn main() {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ConfigError: {}", e);
            process::exit(2);
        }
    };
    let logger = match config.logger() {
        Ok(logger) => logger,
        Err(e) => {
            eprintln!("ConfigError: {}", e);
            process::exit(2);
        }
    };

    let program = match fs::read(&args.program) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("InitError: {} not found ({})", args.program.display(), e);
            process::exit(1);
        }
    };

    let mut emulator = match config.seed {
        Some(seed) => Emulator::with_seed(Some(logger.clone()), seed),
        None => Emulator::new(Some(logger.clone())),
    };
    let loaded = match &config.font {
        Some(font) => emulator.load_font_file(font, &program),
        None => emulator.init(&program),
    };
    if let Err(e) = loaded {
        eprintln!("InitError: {}", e);
        process::exit(1);
    }

    info!(logger, "running"; "program" => %args.program.display(), "clock_hz" => config.clock_hz);

    let mut pacer = Pacer::new(config.clock_hz);
    let mut executed: u64 = 0;
    let mut last = Instant::now();
    let mut beeping = false;

    'run: loop {
        let now = Instant::now();
        let mut ticks = pacer.advance(now - last);
        last = now;

        if args.unthrottled {
            ticks.steps = ticks.steps.max(1);
        }

        for _ in 0..ticks.steps {
            if let Err(e) = emulator.step() {
                error!(logger, "halting"; "error" => %e);
                eprintln!("RuntimeError: {}", e);
                print!("{}", emulator.graphics().to_ascii());
                process::exit(1);
            }
            executed += 1;
            if args.steps != 0 && executed >= args.steps {
                break 'run;
            }
        }

        for _ in 0..ticks.timers {
            emulator.timer();
        }

        if emulator.is_beeping() != beeping {
            beeping = emulator.is_beeping();
            debug!(logger, "tone"; "on" => beeping);
        }

        if !args.unthrottled {
            thread::sleep(pacer.step_interval().min(Duration::from_millis(1)));
        }
    }

    info!(logger, "finished"; "instructions" => executed);
    print!("{}", emulator.graphics().to_ascii());
}
