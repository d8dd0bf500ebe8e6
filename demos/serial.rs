use std::env;

use inquire::Select;
use tenma_psu::port::{self, SerialConfig};

// Configuration constants - adjust these for your setup
const CHANNEL: u8 = 1;
const OUTPUT_VOLTAGE_MV: u32 = 5000; // 5V
const CURRENT_LIMIT_MA: u32 = 100; // 0.1A
const STABILIZATION_DELAY_MS: u64 = 1000;

fn main() {
    env_logger::init();

    // Get serial port from command line arg or interactive selection
    let port_name = env::args().nth(1).unwrap_or_else(|| {
        let ports = serialport::available_ports().expect("Failed to enumerate serial ports");

        if ports.is_empty() {
            eprintln!("No serial ports found!");
            std::process::exit(1);
        }

        let port_names: Vec<String> = ports.iter().map(|p| p.port_name.clone()).collect();

        Select::new("Select a serial port:", port_names)
            .prompt()
            .expect("Failed to select port")
    });

    println!("Using port: {}", port_name);

    // Probe the unit and reopen the port for the detected model
    let (mut psu, found) =
        port::connect(&port_name, &SerialConfig::default()).expect("Failed to connect to PSU");

    println!("Identity: {}", found.identity);
    if found.is_fallback() {
        println!("Unknown model, treating it as a {}", psu.model().name);
    } else {
        println!("Model: {}", psu.model().name);
    }

    let volts = psu.set_voltage(CHANNEL, OUTPUT_VOLTAGE_MV).unwrap();
    println!("Set CH{} voltage to {}V", CHANNEL, volts);

    let amps = psu.set_current(CHANNEL, CURRENT_LIMIT_MA).unwrap();
    println!("Set CH{} current limit to {}A", CHANNEL, amps);

    psu.on(None).unwrap();
    println!("Output enabled");

    // Wait for output to stabilize
    std::thread::sleep(std::time::Duration::from_millis(STABILIZATION_DELAY_MS));

    println!(
        "Measured: {:.2}V {:.3}A",
        psu.running_voltage(CHANNEL).unwrap(),
        psu.running_current(CHANNEL).unwrap()
    );

    println!("\n--- Status ---");
    println!("{:#?}", psu.status().unwrap());

    psu.off(None).unwrap();
    println!("Output disabled");

    psu.close();
}
