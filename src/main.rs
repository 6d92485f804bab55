use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::{error, info};
use menu_pdf::cdp::CdpRenderer;
use menu_pdf::delivery::{self, FILENAME};
use menu_pdf::server::{self, MenuServer};
use menu_pdf::{document, render_menu, RendererConfig, ServiceConfig, REMEDIATION};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "menu-pdf", version, about = "Render the house menu to PDF")]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Browser executable (default: search the usual locations)
    #[arg(long, global = true)]
    chrome: Option<PathBuf>,

    /// Run the browser without its sandbox (needed in some containers)
    #[arg(long, global = true)]
    no_sandbox: bool,

    /// Load and print timeout in milliseconds
    #[arg(long, default_value_t = 30000, global = true)]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the menu over HTTP
    Serve {
        #[arg(long, default_value = "127.0.0.1:8080")]
        listen: String,
    },
    /// Answer a single CGI request (reads QUERY_STRING, writes to stdout)
    Cgi,
    /// Write the PDF to a file, or to stdout with `-`
    Render {
        #[arg(long, short, default_value = FILENAME)]
        output: PathBuf,
    },
}

impl Cli {
    fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            renderer: RendererConfig {
                chrome_path: self.chrome.clone(),
                sandbox: !self.no_sandbox,
                timeout_ms: self.timeout_ms,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // stdout carries the CGI response and `render -o -` output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_writer(io::stderr)
        .init();

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<ExitCode> {
    let config = cli.service_config();
    match &cli.command {
        Command::Serve { listen } => {
            MenuServer::bind(listen, config)?.run::<CdpRenderer>()?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Cgi => {
            let query = std::env::var("QUERY_STRING").ok();
            let response = render_menu::<CdpRenderer>(query.as_deref(), &config);
            server::write_cgi(&response, io::stdout().lock()).context("writing CGI response")?;
            Ok(if response.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Render { output } => {
            match delivery::render_with::<CdpRenderer>(document::menu_html(), &config) {
                Ok(bytes) => {
                    write_output(output, &bytes)?;
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) if e.is_missing_dependency() => {
                    error!("{}", e);
                    eprint!("{}", REMEDIATION);
                    Ok(ExitCode::FAILURE)
                }
                Err(e) => Err(e.into()),
            }
        }
    }
}

fn write_output(output: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if output.as_os_str() == "-" {
        let mut stdout = io::stdout().lock();
        stdout.write_all(bytes)?;
        stdout.flush()?;
    } else {
        std::fs::write(output, bytes)
            .with_context(|| format!("writing {}", output.display()))?;
        info!("wrote {} ({} bytes)", output.display(), bytes.len());
    }
    Ok(())
}
