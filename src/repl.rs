use std::io::Write;

use tokio::io::{stdin, AsyncBufReadExt, BufReader};
use tokio::select;
use tokio::sync::oneshot::channel;

use crate::block::BlockStorage;
use crate::execute::execute_command;
use crate::hash_file::HashFile;
use crate::setup::{setup_db, CliConfig};

use super::command::*;

pub async fn run_repl(config: CliConfig) -> std::io::Result<()> {
    let mut db = setup_db(&config)?;

    // Send the sender to another task awaiting ctrl-c, the input loop
    // selects between it and the next line
    let (sender, mut receiver) = channel::<()>();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = sender.send(());
        }
    });

    println!("Welcome to the static hash file shell!");
    let mut lines = BufReader::new(stdin()).lines();
    let mut listening = true;
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let should_quit = select! {
            signal = &mut receiver, if listening => match signal {
                Ok(()) => {
                    println!("Received ctrl-c");
                    execute_user_input(&mut db, "EXIT")
                }
                // No ctrl-c handler could be installed
                Err(_) => {
                    listening = false;
                    false
                }
            },
            input = lines.next_line() => match input? {
                Some(line) => execute_user_input(&mut db, &line),
                None => execute_user_input(&mut db, "EXIT"),
            }
        };
        if should_quit {
            break;
        }
    }
    println!("Goodbye!");
    Ok(())
}

/// Parses and runs one line, printing its output. Returns true once the
/// session should end.
pub fn execute_user_input<S: BlockStorage>(db: &mut HashFile<S>, input: &str) -> bool {
    let input = input.trim();
    if input.is_empty() || input.starts_with('#') {
        return false;
    }

    let cmd = match input.parse::<Command>() {
        Ok(cmd) => cmd,
        Err(err) => {
            println!("Error: {}", err);
            return false;
        }
    };

    let should_quit = cmd == Command::Exit;
    match execute_command(db, cmd) {
        Ok(output) if output.is_empty() => {}
        Ok(output) => println!("{}", output),
        Err(err) => println!("Error: {}", err),
    }
    should_quit
}
