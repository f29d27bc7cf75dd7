// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The `sentrystream` binary (§6.1). `serve` is the only command that
//! builds and owns a live `EngineService`: it hosts the control socket,
//! the metrics endpoint, the feedback-loop controller and the bypass
//! channel, all wired to that one instance. Every other command is a
//! thin client that sends a single request over the control socket and
//! prints the reply, since there is nothing else in this process for
//! them to talk to.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use sentrystream::application::EngineService;
use sentrystream::bypass::{BypassAction, BypassChannel};
use sentrystream::config::EngineConfig;
use sentrystream::control::{self, ControlRequest, ControlResponse, ControlServer};
use sentrystream::feedback::{default_loops, FeedbackController, ScalarMetrics};
use sentrystream::manager::StreamManager;
use sentrystream::metrics::{MetricsEndpoint, MetricsService};

use sentrystream_bootstrap::exit_code::ExitCode;
use sentrystream_bootstrap::shutdown::ShutdownCoordinator;
use sentrystream_bootstrap::{bootstrap_cli, ValidatedCommand};
use sentrystream_domain::entities::stream_config::{StreamConfig, StreamKind};
use sentrystream_domain::services::PatternRegistry;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = match bootstrap_cli() {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("error: {e}");
            return std::process::ExitCode::from(ExitCode::UsageError.as_i32() as u8);
        }
    };

    sentrystream::logging::init_logging(false);

    let config_path = cli.config.clone();
    match cli.command {
        ValidatedCommand::Serve { metrics_port } => run_serve(config_path.as_deref(), metrics_port).await,
        command => run_client_command(command).await,
    }
}

async fn run_serve(config_path: Option<&Path>, metrics_port_override: Option<u16>) -> std::process::ExitCode {
    let config = match EngineConfig::load(config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("error loading configuration: {e}");
            return std::process::ExitCode::from(ExitCode::Config.as_i32() as u8);
        }
    };

    let metrics_port = metrics_port_override.unwrap_or(config.metrics.port);

    let metrics = match MetricsService::new() {
        Ok(m) => Arc::new(m),
        Err(e) => {
            eprintln!("error initializing metrics: {e}");
            return std::process::ExitCode::from(ExitCode::Software.as_i32() as u8);
        }
    };

    let registry = match PatternRegistry::with_default_patterns() {
        Ok(r) => Arc::new(r),
        Err(e) => {
            eprintln!("error loading attack patterns: {e}");
            return std::process::ExitCode::from(ExitCode::Software.as_i32() as u8);
        }
    };

    let manager = Arc::new(StreamManager::new(config.default_rate_limit_per_second));

    let engine = Arc::new(EngineService::new(
        manager,
        registry,
        metrics.clone(),
        config.entropy_threshold,
        true,
        config.default_rate_limit_per_second,
    ));

    let control_server = match ControlServer::bind(control::socket_path()) {
        Ok(server) => server,
        Err(e) => {
            eprintln!("error binding control socket: {e}");
            return std::process::ExitCode::from(ExitCode::Unavailable.as_i32() as u8);
        }
    };

    let shutdown = ShutdownCoordinator::default();
    let serve_cancel = CancellationToken::new();

    let control_handle = {
        let engine = engine.clone();
        let cancel = serve_cancel.clone();
        tokio::spawn(async move {
            control_server.serve(engine, cancel).await;
        })
    };

    let metrics_handle = config.metrics.enabled.then(|| {
        let endpoint = MetricsEndpoint::new(metrics.clone(), metrics_port);
        let cancel = serve_cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = endpoint.serve(cancel).await {
                error!("metrics endpoint error: {e}");
            }
        })
    });

    let feedback_cancelled = Arc::new(AtomicBool::new(false));
    let feedback_handle = {
        let scalars = Arc::new(ScalarMetrics::new());
        let controller = FeedbackController::new(scalars, default_loops(), config.feedback.tick_hz);
        let cancelled = feedback_cancelled.clone();
        tokio::spawn(async move { controller.run(cancelled).await })
    };

    // Nothing in the pipeline fires a bypass signal yet, but the channel
    // has to stay open for the lifetime of the process for when something
    // does; dropping the writer immediately would let the consumer loop
    // below return on the first tick.
    let (bypass_writer, bypass_channel) = BypassChannel::new(metrics.clone());
    let bypass_action: BypassAction = Arc::new(|signal| {
        info!("bypass signal fired: {}", signal.as_str());
        Ok(())
    });
    let bypass_handle = tokio::spawn(bypass_channel.run(bypass_action));

    info!("sentrystream serve: control socket ready, metrics on 127.0.0.1:{metrics_port}");

    let signal_exit = wait_for_interrupt_or_terminate().await;

    shutdown.initiate_shutdown();
    serve_cancel.cancel();
    feedback_cancelled.store(true, Ordering::SeqCst);
    drop(bypass_writer);

    let shutdown_for_cleanup = shutdown.clone();
    let engine_for_cleanup = engine.clone();
    tokio::spawn(async move {
        for (stream_id, e) in engine_for_cleanup.manager().stop_all(Duration::from_secs(5)).await {
            error!("error stopping stream {stream_id}: {e}");
        }
        shutdown_for_cleanup.complete_shutdown();
    });

    if !shutdown.wait_for_shutdown().await {
        error!("shutdown grace period exceeded, exiting anyway");
    }

    let _ = tokio::time::timeout(Duration::from_secs(2), bypass_handle).await;
    let _ = tokio::time::timeout(Duration::from_secs(2), control_handle).await;
    if let Some(handle) = metrics_handle {
        let _ = tokio::time::timeout(Duration::from_secs(2), handle).await;
    }
    let _ = tokio::time::timeout(Duration::from_secs(2), feedback_handle).await;

    std::process::ExitCode::from(signal_exit.as_i32() as u8)
}

/// Distinguishes SIGINT from SIGTERM so the exit code matches which one
/// fired (130 vs 143); the shared bootstrap signal handler collapses both
/// into one callback and loses that identity, so this is handled directly.
async fn wait_for_interrupt_or_terminate() -> ExitCode {
    let mut sigterm = signal(SignalKind::terminate()).expect("failed to register SIGTERM handler");
    let mut sigint = signal(SignalKind::interrupt()).expect("failed to register SIGINT handler");

    tokio::select! {
        _ = sigterm.recv() => {
            info!("received SIGTERM, stopping all streams");
            ExitCode::Terminated
        }
        _ = sigint.recv() => {
            info!("received SIGINT, stopping all streams");
            ExitCode::Interrupted
        }
    }
}

async fn run_client_command(command: ValidatedCommand) -> std::process::ExitCode {
    let request = match command {
        ValidatedCommand::Create { source, capacity_bytes, sink, format } => {
            let config = StreamConfig { kind: StreamKind::Stdio, source, capacity_bytes, filters: vec![], metadata: Default::default() };
            ControlRequest::Create { config, sink, format }
        }
        ValidatedCommand::Destroy { stream_id } => ControlRequest::Destroy { stream_id },
        ValidatedCommand::List => ControlRequest::List,
        ValidatedCommand::Start { stream_id } => ControlRequest::Start { stream_id },
        ValidatedCommand::Stop { stream_id } => ControlRequest::Stop { stream_id },
        ValidatedCommand::AttachFilter { stream_id, filter } => ControlRequest::AttachFilter { stream_id, filter },
        ValidatedCommand::Stats { stream_id } => ControlRequest::Stats { stream_id },
        ValidatedCommand::Serve { .. } => unreachable!("serve is dispatched before run_client_command is reached"),
    };

    match control::send_request(&request).await {
        Ok(ControlResponse::Error { message }) => {
            eprintln!("error: {message}");
            // The control response only carries a string: the original
            // `DomainError` variant identity doesn't survive the socket,
            // so the exit code is recovered by sniffing the message rather
            // than matching on a variant.
            let as_error = std::io::Error::other(message);
            std::process::ExitCode::from(ExitCode::from_error(&as_error).as_i32() as u8)
        }
        Ok(response) => {
            print_response(&response);
            std::process::ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            std::process::ExitCode::from(ExitCode::Unavailable.as_i32() as u8)
        }
    }
}

fn print_response(response: &ControlResponse) {
    match response {
        ControlResponse::Created { stream_id } => println!("{stream_id}"),
        ControlResponse::Ok => println!("ok"),
        ControlResponse::List { streams } => {
            for stream_id in streams {
                println!("{stream_id}");
            }
        }
        ControlResponse::Stats { stats } => match serde_json::to_string_pretty(stats) {
            Ok(json) => println!("{json}"),
            Err(_) => println!("{stats:?}"),
        },
        ControlResponse::Error { .. } => unreachable!("errors are handled before printing"),
    }
}
