//! KeySub console host.
//!
//! Loads the configuration, installs the substitution hook and keeps it
//! alive until Ctrl-C.  While running, single-letter commands on stdin
//! control the engine:
//!
//! ```text
//! t  toggle substitution on/off
//! r  re-probe the keyboard layout (after switching input language)
//! d  print diagnostics
//! q  quit
//! ```

use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use keysub_core::SubstitutionTarget;
use keysub_engine::application::engine::InterceptionEngine;
use keysub_engine::application::policy::SubstitutionPolicy;
use keysub_engine::infrastructure::logging::init_logging;
use keysub_engine::infrastructure::platform::platform_engine;
use keysub_engine::infrastructure::storage::config::{load_config, AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (config, config_error) = match load_config() {
        Ok(cfg) => (cfg, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    // Initialise structured logging.  `RUST_LOG` overrides the configured level.
    let _log_guard = init_logging(&config.general.log_level);

    if let Some(e) = config_error {
        warn!("using default configuration: {e}");
    }
    info!("KeySub starting");

    let target = SubstitutionTarget::default();
    let policy = Arc::new(SubstitutionPolicy::new(config.general.start_enabled));
    let mut engine = platform_engine(target, &config.hook, policy.clone())
        .context("cannot create the interception engine")?;

    if let Err(e) = engine.install() {
        error!("{e}");
        return Err(e).context(
            "keyboard hook rejected; security software may block global hooks, \
             or the target window runs elevated (try running KeySub as administrator)",
        );
    }

    println!("{}", engine.diagnostic_info());
    println!(
        "Typing {:?} now types {:?} ({}). Commands: t=toggle r=re-probe d=diagnostics q=quit",
        target.source(),
        target.replacement(),
        state_label(policy.is_enabled()),
    );

    run_console(&mut engine, &policy).await;

    engine.uninstall();
    info!("KeySub stopped");
    Ok(())
}

/// Serves stdin commands until Ctrl-C, `q` or end of input.
async fn run_console(engine: &mut InterceptionEngine, policy: &SubstitutionPolicy) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                return;
            }
            line = lines.next_line() => {
                let command = match line {
                    Ok(Some(line)) => line,
                    // stdin closed or unreadable: keep running until Ctrl-C.
                    Ok(None) | Err(_) => {
                        let _ = tokio::signal::ctrl_c().await;
                        info!("shutdown signal received");
                        return;
                    }
                };
                match command.trim() {
                    "t" => {
                        let enabled = policy.toggle();
                        println!("Substitution {}", state_label(enabled));
                    }
                    "r" => println!("{}", engine.refresh_layout()),
                    "d" => println!("{}", engine.diagnostic_info()),
                    "q" => return,
                    "" => {}
                    other => println!("Unknown command {other:?}. Use t, r, d or q."),
                }
            }
        }
    }
}

fn state_label(enabled: bool) -> &'static str {
    if enabled {
        "enabled"
    } else {
        "disabled"
    }
}
