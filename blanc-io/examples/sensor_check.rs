//! Sensor probe
//!
//! Opens the microcontroller port, sends the trigger a few times and prints
//! every raw reply next to its parsed reading. Useful when wiring up a new
//! board before starting the relay.
//!
//! Usage: `cargo run --example sensor_check -- [port] [baud] [count]`

use blanc_io::sensor::TRIGGER;
use blanc_io::sensor::parser::parse_line;
use blanc_io::transport::{SerialTransport, Transport};
use std::env;
use std::time::{Duration, Instant};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().collect();
    let port = args.get(1).map(String::as_str).unwrap_or("/dev/ttyACM0");
    let baud: u32 = args.get(2).map(|s| s.parse()).transpose()?.unwrap_or(9600);
    let count: usize = args.get(3).map(|s| s.parse()).transpose()?.unwrap_or(10);

    log::info!("=== Sensor Probe ===");
    log::info!("Opening {} at {} baud...", port, baud);
    let mut transport = SerialTransport::open(port, baud)?;

    // Board resets when the port opens
    std::thread::sleep(Duration::from_secs(2));

    let mut buffer = [0u8; 256];
    let mut parsed = 0;

    for i in 0..count {
        transport.write_all(TRIGGER)?;
        transport.flush()?;

        let start = Instant::now();
        let mut line = Vec::new();
        while start.elapsed() < Duration::from_secs(1) && !line.contains(&b'\n') {
            let n = transport.read(&mut buffer)?;
            line.extend_from_slice(&buffer[..n]);
        }

        let text = String::from_utf8_lossy(&line);
        let hex: String = line
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(" ");
        println!("[{:02}] {:?} ({} bytes: {})", i, text.trim_end(), line.len(), hex);

        match parse_line(&text) {
            Ok(reading) => {
                parsed += 1;
                println!("     -> {}", reading);
            }
            Err(e) => println!("     -> {}", e),
        }
    }

    log::info!("=== Probe Complete ===");
    log::info!("Parsed {}/{} replies", parsed, count);
    Ok(())
}
