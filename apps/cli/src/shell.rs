use std::io::Write as _;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use shared::domain::PlaceId;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{
    commands::{PlaceCommand, Session},
    render::render_place,
};

#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand, Debug)]
enum ShellCommand {
    #[command(flatten)]
    Place(PlaceCommand),
    /// Focus a place, or clear the focus when no id is given.
    Select { id: Option<String> },
    /// Replace the list with the server's copy.
    Load,
    /// Wait for pending changes to reach the server.
    Sync,
    #[command(alias = "exit")]
    Quit,
}

pub async fn run(session: &mut Session) -> Result<()> {
    println!(
        "{} places loaded. Type 'help' for commands, 'quit' to leave.",
        session.store.len()
    );
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("placebook> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let words = match split_line(&line) {
            Ok(words) if words.is_empty() => continue,
            Ok(words) => words,
            Err(err) => {
                eprintln!("error: {err}");
                continue;
            }
        };
        let parsed = match ShellLine::try_parse_from(words) {
            Ok(parsed) => parsed,
            Err(err) => {
                let _ = err.print();
                continue;
            }
        };

        match parsed.command {
            ShellCommand::Quit => break,
            ShellCommand::Load => {
                session.store.load().await;
                println!("{} places", session.store.len());
            }
            ShellCommand::Sync => match session.flush().await {
                Ok(()) => println!("all changes saved"),
                Err(err) => eprintln!("error: {err:#}"),
            },
            ShellCommand::Select { id: None } => session.store.select(None),
            ShellCommand::Select { id: Some(id) } => {
                let id = session
                    .find_id(&id)
                    .ok()
                    .flatten()
                    .unwrap_or_else(|| PlaceId::new(id.trim()));
                match session.store.get(&id) {
                    Some(place) => println!("selected {}", render_place(place)),
                    None => println!("selected {id} (not listed yet)"),
                }
                session.store.select(Some(id));
            }
            ShellCommand::Place(command) => {
                if let Err(err) = session.run(command).await {
                    eprintln!("error: {err:#}");
                }
            }
        }
    }

    session.flush().await
}

/// Splits on whitespace, keeping single- or double-quoted runs together.
fn split_line(line: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for ch in line.chars() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => current.push(c),
            (None, '"' | '\'') => {
                quote = Some(ch);
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if quote.is_some() {
        bail!("unterminated quote");
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}
