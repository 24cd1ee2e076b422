use std::sync::atomic::Ordering;

use tagwire_peer::ValueListener;

use crate::cmd::{classify_recv_error, install_ctrlc_handler, ListenArgs, RecvErrorDisposition};
use crate::exit::{peer_error, CliResult, SUCCESS};
use crate::output::{print_value, OutputFormat};

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let listener = ValueListener::bind(&args.addr).map_err(|err| peer_error("bind failed", err))?;
    tracing::info!(addr = %listener.local_addr(), "listening for values");

    let running = install_ctrlc_handler()?;
    let mut printed = 0usize;

    while running.load(Ordering::SeqCst) {
        let (mut channel, peer) = listener
            .accept()
            .map_err(|err| peer_error("accept failed", err))?;
        tracing::debug!(%peer, id = channel.id(), "client connected");

        while running.load(Ordering::SeqCst) {
            let value = match channel.recv_value() {
                Ok(value) => value,
                Err(err) => match classify_recv_error(err) {
                    RecvErrorDisposition::Disconnected => break,
                    RecvErrorDisposition::Skip(err) => {
                        tracing::warn!(
                            error = %err,
                            id = channel.id(),
                            "dropping undecodable value"
                        );
                        continue;
                    }
                    RecvErrorDisposition::Fatal(cli_err) => return Err(cli_err),
                },
            };

            print_value(&value, channel.id(), format);
            printed = printed.saturating_add(1);

            if args.count.is_some_and(|count| printed >= count) {
                return Ok(SUCCESS);
            }
        }
    }

    Ok(SUCCESS)
}
