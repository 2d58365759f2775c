//! Terminal front end for the inventory API.
//!
//! Renders the form and the item list as one page, reads a command per line
//! from stdin, and routes it to the controller. Logs go to stderr.

mod dispatch;
mod transport;
mod view;

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use inventory_core::{Config, Controller, InventoryClient, ItemForm};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::dispatch::{dispatch, is_yes, sync_form, Step};
use crate::transport::UreqTransport;
use crate::view::{parse_command, render_page};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn prompt(out: &mut impl Write, text: &str) -> Result<()> {
    write!(out, "{text}").context("writing to stdout")?;
    out.flush().context("flushing stdout")
}

fn main() -> Result<()> {
    init_tracing();
    let config = Config::from_env();
    info!(base_url = %config.base_url, "starting inventory app");

    let controller = Controller::new(InventoryClient::new(&config.base_url), UreqTransport::new());
    let mut form = ItemForm::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut out = io::stdout();

    // Failures land in the session and are shown on the page.
    let _ = controller.load();

    loop {
        sync_form(&controller, &mut form);
        writeln!(out, "\n{}\n", render_page(&controller.session(), &form)).context("writing to stdout")?;
        prompt(&mut out, "> ")?;

        let Some(line) = lines.next() else { break };
        let line = line.context("reading stdin")?;
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(message) => {
                writeln!(out, "{message}").context("writing to stdout")?;
                continue;
            }
        };
        debug!(?command, "dispatching");

        let step = dispatch(&controller, &mut form, command, |question| {
            prompt(&mut out, &format!("{question} [y/N] ")).is_ok() && is_yes(lines.next())
        });
        match step {
            Step::Continue(Some(message)) => writeln!(out, "{message}").context("writing to stdout")?,
            Step::Continue(None) => {}
            Step::Quit => break,
        }
    }
    Ok(())
}
