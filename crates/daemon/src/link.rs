//! Line-delimited link to the board controller

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tracing::{debug, info};

use chess_rig_core::{OpponentMoveSource, RulesOracle, SnapshotSource, SyncController};

/// Serves one connection until the controller hangs up.
///
/// Waits are unbounded while the human is thinking and bounded by the pacing
/// timeout while an `ASK_*` token is owed. A missed deadline or a hang-up
/// resets the session.
pub async fn serve<R, W, O, S, V>(
    controller: &mut SyncController<O, S, V>,
    reader: R,
    mut writer: W,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    O: RulesOracle,
    S: OpponentMoveSource,
    V: SnapshotSource,
{
    let mut lines = reader.lines();

    loop {
        let next = match controller.pacing_deadline() {
            Some(limit) => match timeout(limit, lines.next_line()).await {
                Ok(line) => line,
                Err(_) => {
                    controller.stall();
                    continue;
                }
            },
            None => lines.next_line().await,
        };

        let line = match next {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("controller disconnected");
                controller.reset();
                return Ok(());
            }
            Err(e) => {
                controller.reset();
                return Err(e);
            }
        };

        // engine searches and snapshot reads block
        let replies = tokio::task::block_in_place(|| controller.handle_line(&line));
        for reply in replies {
            debug!(%reply, "sending");
            writer.write_all(format!("{}\n", reply).as_bytes()).await?;
        }
        writer.flush().await?;
    }
}
