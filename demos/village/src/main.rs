use std::sync::Arc;

use lycan::prelude::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

const USAGE: &str = "usage: village serve [addr] | village offline <name> <name> <name> <name>...";

// ---------------------------------------------------------------------------
// Console lines
// ---------------------------------------------------------------------------

/// What a line typed at the offline table means.
#[derive(Debug, PartialEq, Eq)]
enum ConsoleLine<'a> {
    /// `.as <name>`: speak as someone else from now on.
    As(&'a str),
    /// `.exit`
    Exit,
    /// Anything else is said by the current speaker.
    Say(&'a str),
}

fn parse_console_line(line: &str) -> ConsoleLine<'_> {
    let trimmed = line.trim();
    if trimmed == ".exit" {
        return ConsoleLine::Exit;
    }
    match trimmed.strip_prefix(".as ") {
        Some(name) if !name.trim().is_empty() => ConsoleLine::As(name.trim()),
        _ => ConsoleLine::Say(trimmed),
    }
}

// ---------------------------------------------------------------------------
// Offline table
// ---------------------------------------------------------------------------

/// Every participant played from one terminal.
struct Table {
    session: Session,
    seats: Vec<(Player, mpsc::UnboundedReceiver<Outbound>)>,
    speaker: usize,
}

impl Table {
    fn new(names: &[String]) -> Result<Self, LycanError> {
        let messenger = Arc::new(ChannelMessenger::new());
        let seats: Vec<_> = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let player = Player::new(ParticipantId(i as u64 + 1), name.as_str());
                let inbox = messenger.inbox(player.id);
                (player, inbox)
            })
            .collect();

        let admin = seats[0].0.clone();
        let mut session = Session::new("village", admin, messenger, SessionOptions::default());
        for (player, _) in &seats[1..] {
            session.add_player(player.clone())?;
        }

        Ok(Self {
            session,
            seats,
            speaker: 0,
        })
    }

    fn speaker(&self) -> &Player {
        &self.seats[self.speaker].0
    }

    fn switch_to(&mut self, name: &str) -> bool {
        match self.seats.iter().position(|(p, _)| p.name.eq_ignore_ascii_case(name)) {
            Some(seat) => {
                self.speaker = seat;
                true
            }
            None => false,
        }
    }

    /// Prints everything the narrator said since the last call.
    fn print_mail(&mut self) {
        for (player, inbox) in &mut self.seats {
            while let Ok(message) = inbox.try_recv() {
                println!("<To @{}> {message}", player.name);
            }
        }
    }
}

async fn offline(names: Vec<String>) -> Result<(), LycanError> {
    let mut table = Table::new(&names)?;
    table.session.launch().await?;
    table.print_mail();
    println!("-- logged as {} (.as <name> to switch, .exit to quit)", table.speaker().name);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        match parse_console_line(&line) {
            ConsoleLine::Exit => break,
            ConsoleLine::As(name) => {
                if table.switch_to(name) {
                    println!("-- logged as {}", table.speaker().name);
                } else {
                    println!("-- nobody called {name} at this table");
                }
            }
            ConsoleLine::Say("") => {}
            ConsoleLine::Say(text) => {
                let speaker = table.speaker().id;
                if let Err(e) = table.session.react(speaker, text).await {
                    println!("-- {e}");
                }
                table.print_mail();
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        Some("serve") => {
            lycan::init_logging("info");
            let addr = args.get(1).map(String::as_str).unwrap_or("0.0.0.0:8080");
            tracing::info!(%addr, "starting village server");
            let server = LycanServer::builder().bind(addr).build().await?;
            server.run().await?;
        }
        Some("offline") if args.len() > 1 => {
            lycan::init_logging("warn");
            offline(args[1..].to_vec()).await?;
        }
        _ => eprintln!("{USAGE}"),
    }
    Ok(())
}
