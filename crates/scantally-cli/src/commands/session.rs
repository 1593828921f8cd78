use std::path::Path;
use std::time::Duration;

use scantally_core::models::normalize_sku;
use scantally_core::sync::{ChannelTrigger, SyncEngine, SyncTransport};
use scantally_core::util::unix_millis_now;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::oneshot;

use crate::commands::common::{build_transport, open_log, ServerOptions};
use crate::error::CliError;

/// Record one scan per stdin line until EOF or Ctrl-C.
///
/// Syncs are registered with a background worker so a burst of scans goes
/// out as one batch once input pauses for `delay`.
pub async fn run_session(
    delay: Duration,
    offline: bool,
    db_path: &Path,
    server: &ServerOptions,
) -> Result<(), CliError> {
    let log = open_log(db_path).await?;
    let transport = build_transport(server)?;
    let (trigger, worker) = ChannelTrigger::channel(delay);
    let engine = SyncEngine::new(log, transport).with_deferred_trigger(trigger);
    if offline {
        engine.set_online(false);
    }

    let mut recorded = 0;
    let (stop, stopped) = oneshot::channel::<()>();
    let reading = async {
        let result = tokio::select! {
            result = read_scans(&engine, BufReader::new(tokio::io::stdin()), &mut recorded) => result,
            _ = tokio::signal::ctrl_c() => Ok(()),
        };
        stop.send(()).ok();
        result
    };
    let serving = worker.run(&engine, async {
        stopped.await.ok();
    });

    let (read, attempts) = tokio::join!(reading, serving);
    read?;
    tracing::debug!(recorded, attempts, "Scan session finished");

    let pending = engine.log().pending_count().await?;
    eprintln!(
        "Session ended: {recorded} scans recorded, {pending} pending ({})",
        engine.state().label()
    );
    Ok(())
}

/// Append one scan per non-blank line, counting each into `recorded`.
///
/// The count lives with the caller so it survives the read being cancelled.
/// A full local disk is reported and the line skipped; other storage errors
/// end the session.
pub async fn read_scans<T, R>(
    engine: &SyncEngine<T>,
    reader: R,
    recorded: &mut usize,
) -> Result<(), CliError>
where
    T: SyncTransport,
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        let Some(sku) = normalize_sku(&line) else {
            continue;
        };

        match engine.record_scan(&sku, 1, unix_millis_now()).await {
            Ok(local_id) => {
                *recorded += 1;
                println!("{local_id}\t{sku}");
            }
            Err(error) if error.is_storage_full() => {
                eprintln!("Error: {error}; scan of {sku} was not recorded");
            }
            Err(error) => return Err(error.into()),
        }
    }

    Ok(())
}
