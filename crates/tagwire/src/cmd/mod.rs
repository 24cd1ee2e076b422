use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::{ArgGroup, Args, Subcommand};
use tagwire_codec::CodecError;
use tagwire_peer::PeerError;

use crate::exit::{is_disconnect, peer_error, CliError, CliResult, INTERNAL};
use crate::output::OutputFormat;

pub mod echo;
pub mod listen;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send every received value back to its sender.
    Echo(EchoArgs),
    /// Send a single value.
    Send(SendArgs),
    /// Listen and print received values.
    Listen(ListenArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Echo(args) => echo::run(args),
        Command::Send(args) => send::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct EchoArgs {
    /// Address to listen on (host:port, or :port for all interfaces).
    #[arg(env = "TAGWIRE_ADDR")]
    pub addr: String,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("value").required(true)))]
pub struct SendArgs {
    /// Address to connect to (host:port).
    #[arg(env = "TAGWIRE_ADDR")]
    pub addr: String,
    /// Send a string.
    #[arg(long = "str", value_name = "TEXT", group = "value")]
    pub text: Option<String>,
    /// Send a non-negative 32-bit integer.
    #[arg(long, value_name = "N", group = "value", allow_negative_numbers = true)]
    pub int: Option<i64>,
    /// Send a signed 64-bit integer.
    #[arg(long, value_name = "N", group = "value", allow_negative_numbers = true)]
    pub sint: Option<i64>,
    /// Send a double-precision float.
    #[arg(long, value_name = "X", group = "value", allow_negative_numbers = true)]
    pub float: Option<f64>,
    /// Send a boolean (true or false).
    #[arg(long = "bool", value_name = "BOOL", group = "value")]
    pub flag: Option<bool>,
    /// Send a value described as JSON (arrays become lists).
    #[arg(long, value_name = "JSON", group = "value")]
    pub json: Option<String>,
    /// Wait for one value in reply and print it.
    #[arg(long)]
    pub wait: bool,
    /// Maximum time to wait for the reply when --wait is set (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub wait_timeout: String,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Address to listen on (host:port, or :port for all interfaces).
    #[arg(env = "TAGWIRE_ADDR")]
    pub addr: String,
    /// Exit after receiving N values.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show build details and registered tags.
    #[arg(long)]
    pub extended: bool,
}

/// What a server loop does after a failed receive.
pub(crate) enum RecvErrorDisposition {
    /// The client went away; accept the next one.
    Disconnected,
    /// The message arrived whole but did not decode; the stream is still in sync.
    Skip(CodecError),
    Fatal(CliError),
}

pub(crate) fn classify_recv_error(err: PeerError) -> RecvErrorDisposition {
    if is_disconnect(&err) {
        return RecvErrorDisposition::Disconnected;
    }
    match err {
        PeerError::Codec(err) => RecvErrorDisposition::Skip(err),
        other => RecvErrorDisposition::Fatal(peer_error("receive failed", other)),
    }
}

/// Clear `running` on Ctrl-C. Blocking accepts and reads finish first.
pub(crate) fn install_ctrlc_handler() -> CliResult<Arc<AtomicBool>> {
    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    ctrlc::set_handler(move || {
        flag.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))?;
    Ok(running)
}
