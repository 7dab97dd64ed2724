//! Terminal front-end for the chesslink client.
//!
//! Renders the synchronizer's view of the board and feeds it gestures typed
//! as coordinate moves ("e2e4"). Useful for development and for playing over
//! a plain terminal.

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use chesslink_client::{ClientSynchronizer, Connection, DropOutcome};
use chesslink_core::{ClientMessage, ServerMessage};

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Relay URL
    #[clap(short, long, default_value = "ws://127.0.0.1:8080")]
    url: String,

    /// Join an existing session by code instead of creating one
    #[clap(short, long)]
    join: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();

    let mut conn = Connection::connect(&args.url).await?;
    let mut sync = ClientSynchronizer::new();

    match &args.join {
        Some(code) => {
            conn.send(ClientMessage::Join {
                session_id: code.clone(),
            })
            .await?;
        }
        None => conn.send(ClientMessage::Create).await?,
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            msg = conn.recv() => {
                let Some(msg) = msg else {
                    println!("connection closed");
                    break;
                };
                sync.handle_message(msg.clone());
                report(&msg, &mut sync);
            }
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) if !line.trim().is_empty() => {
                        handle_gesture(line.trim(), &mut sync, &conn).await;
                    }
                    Ok(Some(_)) => {}
                    _ => break,
                }
            }
        }
    }

    Ok(())
}

/// Print what just changed, the way a board surface would show it.
fn report(msg: &ServerMessage, sync: &mut ClientSynchronizer) {
    match msg {
        ServerMessage::SessionCreated { session_id } => {
            println!("session created: share code {session_id} with your opponent");
        }
        ServerMessage::GameStart { color, .. } => {
            println!("game started, you play {color}");
            render(&sync.fen());
        }
        ServerMessage::Move { status, move_history, .. } => {
            render(&sync.fen());
            println!("status: {status}  moves: {}", move_history.join(" "));
        }
        ServerMessage::Error { .. } => {}
        ServerMessage::OpponentDisconnected => {
            println!("opponent disconnected; create or join a new session");
        }
    }

    if let Some(error) = sync.take_error() {
        println!("error: {error}");
    }
}

/// Treat a typed move as a drag-and-drop gesture pair.
async fn handle_gesture(line: &str, sync: &mut ClientSynchronizer, conn: &Connection) {
    if line.len() != 4 || !line.is_ascii() {
        println!("type moves as from+to squares, e.g. e2e4");
        return;
    }

    let (from, to) = line.split_at(2);

    if !sync.on_drag_start(from) {
        println!("no piece of yours on {from}");
        return;
    }

    match sync.on_drop(from, to) {
        DropOutcome::Snapback => {
            println!("{line} is not legal here");
        }
        DropOutcome::Intent(uci) => {
            render(&sync.fen());
            let intent = ClientMessage::Move {
                uci: uci.to_string(),
            };
            if conn.send(intent).await.is_err() {
                println!("connection closed");
            }
        }
    }
}

/// Print the piece-placement field of a FEN as an 8x8 grid.
fn render(fen: &str) {
    let Some(placement) = fen.split_whitespace().next() else {
        return;
    };

    for (i, rank) in placement.split('/').enumerate() {
        print!("{} ", 8 - i);
        for c in rank.chars() {
            match c.to_digit(10) {
                Some(n) => {
                    for _ in 0..n {
                        print!(". ");
                    }
                }
                None => print!("{c} "),
            }
        }
        println!();
    }
    println!("  a b c d e f g h");
}
