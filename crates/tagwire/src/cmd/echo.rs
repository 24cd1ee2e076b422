use std::sync::atomic::Ordering;

use tagwire_peer::ValueListener;

use crate::cmd::{classify_recv_error, install_ctrlc_handler, EchoArgs, RecvErrorDisposition};
use crate::exit::{peer_error, CliResult, SUCCESS};

pub fn run(args: EchoArgs) -> CliResult<i32> {
    let listener = ValueListener::bind(&args.addr).map_err(|err| peer_error("bind failed", err))?;
    tracing::info!(addr = %listener.local_addr(), "echo server listening");

    let running = install_ctrlc_handler()?;

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
                            "not echoing undecodable value"
                        );
                        continue;
                    }
                    RecvErrorDisposition::Fatal(cli_err) => return Err(cli_err),
                },
            };

            tracing::info!(
                id = channel.id(),
                value_type = %value.type_name(),
                "echoing value"
            );

            if let Err(err) = channel.send_value(&value) {
                tracing::warn!(error = %err, id = channel.id(), "echo send failed");
                break;
            }
        }
    }

    Ok(SUCCESS)
}
