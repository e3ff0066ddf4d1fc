/*
[INPUT]:  stdin lines, page view updates, CancellationToken
[OUTPUT]: Executed commands and re-rendered pages on stdout
[POS]:    Console layer - line-oriented control loop
[UPDATE]: When changing console interaction or rendering triggers
*/

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use valar_refresh::{RefreshRoute, Route};

use crate::app::{App, CommandOutcome};
use crate::command::{Command, CommandError, HELP};

#[derive(Debug, Clone, Copy)]
pub struct ConsoleOptions {
    /// Print the current page whenever its view changes
    pub render_on_change: bool,
}

/// Run until `quit`, or until `shutdown` fires. End of input only stops reading.
pub async fn run_console(app: &App, options: ConsoleOptions, shutdown: CancellationToken) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut dashboard = app.dashboard().subscribe();
    let mut positions = app.positions().subscribe();
    let mut orders = app.orders().subscribe();
    let render = options.render_on_change;

    println!("{HELP}");
    println!("{}", app.status_line());

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            line = lines.next_line(), if stdin_open => {
                match line.context("read console input")? {
                    Some(line) => {
                        if handle_line(app, &line) {
                            info!("quit requested from console");
                            shutdown.cancel();
                            break;
                        }
                    }
                    None => {
                        debug!("console input closed; waiting for shutdown signal");
                        stdin_open = false;
                    }
                }
            }
            Ok(()) = dashboard.changed(), if render => print_if_current(app, RefreshRoute::Dashboard),
            Ok(()) = positions.changed(), if render => print_if_current(app, RefreshRoute::Positions),
            Ok(()) = orders.changed(), if render => print_if_current(app, RefreshRoute::Orders),
        }
    }
    Ok(())
}

/// Execute one input line; true when the console should quit.
fn handle_line(app: &App, line: &str) -> bool {
    match line.parse::<Command>() {
        Ok(command) => match app.execute(command) {
            CommandOutcome::Continue(output) => {
                println!("{output}");
                false
            }
            CommandOutcome::Quit => true,
        },
        Err(CommandError::Empty) => false,
        Err(err) => {
            println!("{err}");
            false
        }
    }
}

fn print_if_current(app: &App, route: RefreshRoute) {
    if app.coordinator().current_page() == Some(Route::from(route)) {
        println!("{}", app.render(route));
    }
}
