//! Minimal echo server: accepts one client and sends every value back.
//!
//! Run with:
//!   cargo run --example echo-server
//!
//! In another terminal:
//!   cargo run --features cli -- send 127.0.0.1:5544 \
//!     --json '["hjk", 23, 34.7]' --wait

use tagwire::peer::ValueListener;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let addr = std::env::var("TAGWIRE_ADDR").unwrap_or_else(|_| "127.0.0.1:5544".to_string());
    let listener = ValueListener::bind(&addr)?;
    eprintln!("Listening on {}", listener.local_addr());

    let (mut channel, peer) = listener.accept()?;
    eprintln!("Client connected: {peer} ({})", channel.id());

    loop {
        match channel.recv_value() {
            Ok(value) => {
                eprintln!("Received {}: {value:?}", value.type_name());
                channel.send_value(&value)?;
            }
            Err(e) => {
                eprintln!("Client disconnected: {e}");
                break;
            }
        }
    }

    Ok(())
}
