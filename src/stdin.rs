use tokio::select;
use tokio::{
    io::{stdin, AsyncBufReadExt, AsyncRead, BufReader},
    sync::{mpsc, oneshot},
};
use tracing::warn;

use crate::block::BlockStorage;
use crate::hash_file::HashFile;
use crate::repl::*;
use crate::setup::*;

pub async fn process_from_stdin(config: CliConfig) -> std::io::Result<()> {
    process_from_reader(BufReader::new(stdin()), config).await
}

/// Runs every line from `reader` as a command, in order, on a single
/// hash file context
pub(crate) async fn process_from_reader<R>(
    reader: BufReader<R>,
    config: CliConfig,
) -> std::io::Result<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut db = setup_db(&config)?;
    let (send, mut recv) = mpsc::channel::<String>(100);
    let (ctlrs, mut ctlrc) = oneshot::channel::<()>();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = ctlrs.send(());
        }
    });

    let read_task = tokio::spawn(async move {
        if let Err(err) = read_lines(reader, send).await {
            warn!("Stopped reading commands: {}", err);
        }
    });

    process_lines(&mut db, &mut recv, &mut ctlrc).await;
    read_task.abort();
    Ok(())
}

async fn process_lines<S: BlockStorage>(
    db: &mut HashFile<S>,
    reciever: &mut mpsc::Receiver<String>,
    ctlrc_signal: &mut oneshot::Receiver<()>,
) {
    let mut listening = true;
    loop {
        select! {
            signal = &mut *ctlrc_signal, if listening => {
                if signal.is_ok() {
                    break;
                }
                listening = false;
            }
            line = reciever.recv() => match line {
                Some(line) => {
                    if execute_user_input(db, &line) {
                        return;
                    }
                }
                None => break,
            }
        }
    }
    execute_user_input(db, "EXIT");
}

async fn read_lines<R: AsyncRead + Unpin>(
    reader: BufReader<R>,
    send: mpsc::Sender<String>,
) -> std::io::Result<()> {
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if send.send(line).await.is_err() {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_storage::FileBlockStorage;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_lines_run_in_order_and_exit_closes() {
        let dir = TempDir::new().unwrap();
        let mut db = HashFile::new(FileBlockStorage::with_root(dir.path()));
        let (send, mut recv) = mpsc::channel::<String>(10);
        let (_ctlrs, mut ctlrc) = oneshot::channel::<()>();

        let script = "CREATE piped.db 3\nOPEN piped.db\nINSERT 0 1 \"a\" \"b\" \"c\"\n";
        read_lines(BufReader::new(script.as_bytes()), send)
            .await
            .unwrap();

        process_lines(&mut db, &mut recv, &mut ctlrc).await;
        assert!(db.open_files().is_empty());

        let desc = db.open_index("piped.db").unwrap();
        assert_eq!(db.find_entry(desc, 1).unwrap().city(), "c");
    }
}
