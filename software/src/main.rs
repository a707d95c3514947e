//! Red/green/yellow LED blinker driven through pigpiod.
//!
//! LEDs (on = high) on connector pins 11 (red), 13 (green) and 22 (yellow).
//! Runs until SIGINT or SIGTERM, then switches the LEDs back to inputs.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use embedded_hal::digital::v2::OutputPin;
use log::{info, warn};
use signal_hook::consts::{SIGINT, SIGTERM};

use pigpiod_common::board::{gpio_may_output, gpio_name, Board};
use pigpiod_common::diagnostics::{log_command, log_if_bad};
use pigpiod_common::hal::gpio::{GpioMode, Pull};
use pigpiod_common::timing::Ticker;
use pigpiod_common::{Device, Pigpiod, RemotePin};

const LED_RED_PIN: u32 = 11;
const LED_GREEN_PIN: u32 = 13;
const LED_YELLOW_PIN: u32 = 22;

const TICK: Duration = Duration::from_millis(100);
const PAD_STRENGTH_MA: u32 = 14;

#[derive(Parser)]
#[command(name = "pigpiod-blink", about = "Blink three LEDs through a pigpiod daemon")]
struct Args {
    /// TOML file with host, port, timeout and board
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    /// pi1 (26 pin connector) or pi3 (40 pins: Pi 0, 3, 4)
    #[arg(long)]
    board: Option<Board>,

    /// Stop after this many blink cycles
    #[arg(long)]
    cycles: Option<u64>,
}

fn led_gpio(board: Board, pin: u32, label: &str) -> Result<u32> {
    let gpio = board.gpio_for_pin(pin);
    if !gpio_may_output(gpio) {
        bail!("pin {} for {} LED is {}", pin, label, gpio_name(gpio));
    }
    Ok(gpio)
}

fn wait_ticks(ticker: &mut Ticker, ticks: u32) {
    for _ in 0..ticks {
        ticker.wait_period();
    }
}

fn set_led(led: &mut RemotePin<'_>, on: bool) {
    let res = if on { led.set_high() } else { led.set_low() };
    log_if_bad(&res);
}

fn blink(pi: &Pigpiod, board: Board, cycles: Option<u64>, term: &AtomicBool) -> Result<()> {
    let red = led_gpio(board, LED_RED_PIN, "red")?;
    let green = led_gpio(board, LED_GREEN_PIN, "green")?;
    let yellow = led_gpio(board, LED_YELLOW_PIN, "yellow")?;

    for &gpio in [red, green, yellow].iter() {
        let res = pi.set_mode(gpio, GpioMode::Output);
        log_command(&res);
        res.with_context(|| format!("can't make {} an output", gpio_name(gpio)))?;
    }
    log_command(&pi.set_pull(green, Pull::Down));
    log_command(&pi.set_pad_strength(0, PAD_STRENGTH_MA));

    let mut red_led = pi.pin(red);
    let mut green_led = pi.pin(green);
    let mut yellow_led = pi.pin(yellow);
    let mut yellow_on = true;
    let mut ticker = Ticker::new(TICK);
    let mut done = 0;

    info!("blinking {}, {}, {}", gpio_name(red), gpio_name(green), gpio_name(yellow));
    while !term.load(Ordering::Relaxed) && cycles.map_or(true, |n| done < n) {
        set_led(&mut red_led, true);
        wait_ticks(&mut ticker, 2);
        yellow_on = !yellow_on;
        set_led(&mut yellow_led, yellow_on);
        set_led(&mut green_led, true);
        wait_ticks(&mut ticker, 1);
        set_led(&mut red_led, false);
        wait_ticks(&mut ticker, 1);
        set_led(&mut green_led, false);
        wait_ticks(&mut ticker, 2);
        done += 1;
    }
    info!("{} cycles, {} periods overrun", done, ticker.overruns());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut device = Device::load(args.config.as_deref())?;
    if let Some(host) = args.host {
        device.host = host;
    }
    if let Some(port) = args.port {
        device.port = port;
    }
    if let Some(board) = args.board {
        device.board = board;
    }

    let term = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(SIGINT, Arc::clone(&term))?;
    signal_hook::flag::register(SIGTERM, Arc::clone(&term))?;

    let board = device.board;
    let pi = Pigpiod::open(device.clone())
        .with_context(|| format!("can't connect to pigpiod at {}:{}", device.host, device.port))?;
    if let Ok(version) = pi.pigpio_version() {
        info!("pigpio version {}, board {}", version, board);
    }

    let result = blink(&pi, board, args.cycles, &term);

    match pi.release_outputs() {
        Ok(released) => info!("released outputs {:#010x}", released),
        Err(err) => warn!("releasing outputs failed: {}", err),
    }
    pi.disconnect();
    result
}
