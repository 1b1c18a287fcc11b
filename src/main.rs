use crate::widgets::Terminal;
use std::io::{IsTerminal, Write};

#[macro_use]
mod macros;

pub mod api;
pub mod app;
pub mod candles;
pub mod chart;
pub mod cli;
pub mod config;
pub mod data;
pub mod eps;
pub mod filter;
pub mod helper;
pub mod logger;
pub mod metrics;
pub mod path_env;
pub mod provider;
pub mod render;
pub mod system;
pub mod ui;
pub mod widgets;

mod views;

#[macro_use]
extern crate rust_i18n;
i18n!("locales");

#[tokio::main]
async fn main() {
    let bin_name = std::env::args()
        .next()
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string());

    let command = match cli::parse_args(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("{}", err.message);
            std::process::exit(err.code);
        }
    };

    let args = match command {
        cli::Command::Help => {
            println!("{}", cli::help_text(&bin_name));
            return;
        }
        cli::Command::Version => {
            println!("{}", cli::version_text());
            return;
        }
        cli::Command::Run(args) => args,
    };

    dotenvy::dotenv().ok();

    let _guard = match logger::init() {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("logging disabled: {err:#}");
            None
        }
    };

    let config = match config::Config::from_env() {
        Ok(config) => config.with_args(&args),
        Err(err) => {
            config::print_config_guide();
            eprintln!("\ninvalid configuration: {err}");
            std::process::exit(2);
        }
    };
    rust_i18n::set_locale(&config.locale);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = std::process::id(),
        locale = %config.locale,
        source = config.source.as_str(),
        log_dir = %logger::active_log_dir().display(),
        "starting"
    );

    if !std::io::stdout().is_terminal() {
        eprintln!("{}", t!("NeedsTty"));
        std::process::exit(1);
    }

    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        Terminal::exit_full_screen();
        hook(info);
    }));

    let _ = std::io::stdout().write_all(b"\n");
    let _ = std::io::stdout().flush();

    Terminal::enter_full_screen();
    let outcome = tokio::select! {
        result = app::run(config) => result,
        _ = wait_for_shutdown_signal() => {
            tracing::warn!("shutdown signal received");
            Ok(())
        }
    };
    Terminal::exit_full_screen();

    if let Err(err) = outcome {
        tracing::error!(error = %err, "event loop failed");
        eprintln!("{err:#}");
        std::process::exit(1);
    }
    tracing::info!("event loop exited");
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use std::future::pending;
    use tokio::signal::unix::{signal, Signal, SignalKind};

    async fn recv_or_pending(signal: Option<Signal>) {
        let mut signal = signal;
        if let Some(sig) = signal.as_mut() {
            let _ = sig.recv().await;
            return;
        }
        pending::<()>().await;
    }

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = recv_or_pending(signal(SignalKind::terminate()).ok()) => {}
        _ = recv_or_pending(signal(SignalKind::hangup()).ok()) => {}
        _ = recv_or_pending(signal(SignalKind::interrupt()).ok()) => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
