//!
//! signup_client console
//! ---------------------
//! Interactive terminal front end for the activity signup service. Validates any persisted
//! session, loads the roster, then reads commands from stdin until `quit` or EOF.

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use signup_client::cli::{self, ConsoleAction};
use signup_client::{App, ClientConfig, Outcome};

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--api <url>] [--session-file <path>] [--timeout-ms <n>] [--no-persist]\n\nFlags:\n  --api <url>             Signup API base URL (env SIGNUP_API_URL, default http://127.0.0.1:8000)\n  --session-file <path>   Where the session is persisted (env SIGNUP_SESSION_FILE)\n  --timeout-ms <n>        HTTP request timeout in milliseconds (env SIGNUP_HTTP_TIMEOUT_MS)\n  --no-persist            Keep the session in memory only\n  -h, --help              Show this help\n\n{}",
        cli::HELP
    );
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("invalid RUST_LOG filter")?;
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let (program, args) = cli::split_program(std::env::args());
    let mut config = ClientConfig::from_env()?;
    match config.apply_args(&args) {
        Ok(true) => {}
        Ok(false) => { print_usage(&program); return Ok(()); }
        Err(e) => {
            eprintln!("{}", e);
            print_usage(&program);
            std::process::exit(2);
        }
    }

    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    info!(
        target: "signup",
        "signup_client starting: RUST_LOG='{}', api='{}', session_file={:?}, timeout_ms={}",
        rust_log, config.api_base, config.session_file, config.request_timeout.as_millis()
    );

    let app = App::new(&config).context("failed to build HTTP client")?;
    app.start().await;
    cli::print_ui(&app.snapshot());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else { break };
        let action = match cli::parse_line(&line) {
            Ok(a) => a,
            Err(msg) => { eprintln!("{}", msg); continue; }
        };
        let command = match action {
            ConsoleAction::Quit => break,
            ConsoleAction::Help => { println!("{}", cli::HELP); continue; }
            ConsoleAction::Show => { cli::print_ui(&app.snapshot()); continue; }
            ConsoleAction::Dispatch(c) => c,
            ConsoleAction::Remove(n) => match cli::affordance_command(&app.snapshot(), n) {
                Some(c) => c,
                None => { eprintln!("no participant [{}] to remove", n); continue; }
            },
        };
        match app.dispatch(command).await {
            Outcome::RefreshFailed(e) => eprintln!("refresh failed: {}", e),
            other => tracing::debug!(target: "signup", outcome = ?other, "dispatched"),
        }
        cli::print_ui(&app.snapshot());
    }
    Ok(())
}
