//! Interactive menu for poking at a `FixedMap<String>` from a terminal.
//!
//! Run with: `cargo run -- --capacity 16`

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use clap::Parser;
use fsmap::FixedMap;

#[derive(Parser, Debug)]
#[command(name = "fsmap", about = "Interactive fixed-capacity map demo")]
struct Args {
    /// Number of slots; prompted for when omitted
    #[arg(long, short, allow_negative_numbers = true)]
    capacity: Option<i64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut console = Console::new(stdin.lock(), stdout.lock());
    run(&mut console, args.capacity)
}

struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Prints `prompt` and reads one line without its terminator.
    /// Returns `None` at end of input.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line).context("reading stdin")? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn say(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{text}")?;
        Ok(())
    }

    fn confirm(&mut self) -> Result<Option<bool>> {
        Ok(self
            .read_line("Is this correct? (yes/no) ")?
            .map(|a| a.trim_start().to_lowercase().starts_with('y')))
    }
}

/// Accepts what `^[1-9]\d*$` accepts.
fn is_positive_integer(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some('1'..='9')) && chars.all(|c| c.is_ascii_digit())
}

fn create_map<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    capacity: Option<i64>,
) -> Result<Option<FixedMap<String>>> {
    if let Some(capacity) = capacity {
        let map = FixedMap::<String>::try_from(capacity).context("invalid --capacity")?;
        return Ok(Some(map));
    }

    let mut prompt = "Enter a positive integer for your desired map capacity: ";
    loop {
        let Some(input) = console.read_line(prompt)? else {
            return Ok(None);
        };
        prompt = "Try again: ";
        if !is_positive_integer(&input) {
            console.say(&format!("'{input}' is not a positive integer."))?;
            continue;
        }
        match input.parse::<usize>().map(FixedMap::<String>::new) {
            Ok(Ok(map)) => return Ok(Some(map)),
            Ok(Err(e)) => console.say(&e.to_string())?,
            Err(_) => console.say(&format!("'{input}' is too large."))?,
        }
    }
}

fn print_menu<R: BufRead, W: Write>(console: &mut Console<R, W>) -> Result<()> {
    console.say("")?;
    console.say("What would you like to do?")?;
    console.say("(1) Insert a key and value")?;
    console.say("(2) Get the value associated with a key")?;
    console.say("(3) Delete a key")?;
    console.say("(4) Show the load factor")?;
    console.say("(5) Exit")
}

fn run<R: BufRead, W: Write>(console: &mut Console<R, W>, capacity: Option<i64>) -> Result<()> {
    let Some(mut map) = create_map(console, capacity)? else {
        return Ok(());
    };
    console.say(&format!(
        "Created a String map with capacity {}.",
        map.capacity()
    ))?;

    loop {
        let choice = loop {
            print_menu(console)?;
            let Some(input) = console.read_line("Please enter your selection: ")? else {
                return Ok(());
            };
            if let Ok(choice @ 1..=5) = input.trim().parse::<u8>() {
                break choice;
            }
        };

        match choice {
            1 => loop {
                let Some(key) = console.read_line("Enter a key: ")? else {
                    return Ok(());
                };
                let Some(value) = console.read_line("Enter a value: ")? else {
                    return Ok(());
                };
                console.say(&format!("Set key '{key}' to be associated with '{value}'."))?;
                match console.confirm()? {
                    None => return Ok(()),
                    Some(false) => continue,
                    Some(true) => {}
                }
                if map.set(&key, value.clone()) {
                    console.say(&format!("\n'{key}' successfully associated with '{value}'."))?;
                } else {
                    console.say("\nUh oh. Something went wrong.")?;
                    console.say(&format!(
                        "Either '{key}' is already associated with another String, or the map is full."
                    ))?;
                }
                break;
            },
            2 => loop {
                let Some(key) = console.read_line("Enter a key: ")? else {
                    return Ok(());
                };
                console.say(&format!("Get the value associated with '{key}'."))?;
                match console.confirm()? {
                    None => return Ok(()),
                    Some(false) => continue,
                    Some(true) => {}
                }
                let line = match map.get(&key) {
                    Some(value) => format!("\n'{value}' is the value associated with '{key}'."),
                    None => format!("\n'{key}' was not found."),
                };
                console.say(&line)?;
                break;
            },
            3 => loop {
                let Some(key) = console.read_line("Enter a key: ")? else {
                    return Ok(());
                };
                console.say(&format!("Delete '{key}' from the map."))?;
                match console.confirm()? {
                    None => return Ok(()),
                    Some(false) => continue,
                    Some(true) => {}
                }
                let line = match map.delete(&key) {
                    Some(value) => format!(
                        "\n'{key}' was deleted from the map. It was associated with '{value}'."
                    ),
                    None => format!("\n'{key}' was not found."),
                };
                console.say(&line)?;
                break;
            },
            4 => console.say(&format!("\nThe current load factor is {:.3}.", map.load()))?,
            _ => {
                console.say("Thank you.")?;
                return Ok(());
            }
        }
    }
}
