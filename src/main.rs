use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use voxcall::audio_route::{CallAudioRouter, NoopAudioRouter, PactlAudioRouter};
use voxcall::cli::{Cli, Commands, ConfigAction};
use voxcall::config::Config;
use voxcall::contacts::FileContactStore;
use voxcall::controller::dispatch::Controller;
use voxcall::controller::machine::CallStateMachine;
use voxcall::controller::state::CallFlags;
use voxcall::controller::worker::CallWorkerConfig;
use voxcall::modem::channel::ModemChannel;
use voxcall::modem::port::SerialModemPort;
use voxcall::speech::{EspeakSpeaker, NullSpeaker, Speaker, StdinUtteranceSource};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Some(Commands::Probe) => probe(&config),
        Some(Commands::Config { action }) => match action {
            ConfigAction::Show => {
                let toml = toml::to_string_pretty(&config)?;
                print!("{toml}");
                Ok(())
            }
            ConfigAction::Path => {
                println!(
                    "{}",
                    cli.config.unwrap_or_else(Config::default_path).display()
                );
                Ok(())
            }
        },
        None => run(config, cli.quiet, cli.no_audio_routing),
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_default(&path)
        .with_context(|| format!("failed to load config from {}", path.display()))?
        .with_env_overrides();

    // CLI overrides win over config file and environment
    if let Some(port) = &cli.port {
        config.modem.port = port.clone();
    }
    if let Some(baud) = cli.baud {
        config.modem.baud = baud;
    }
    if let Some(contacts) = &cli.contacts {
        config.contacts.path = contacts.clone();
    }
    if let Some(code) = &cli.country_code {
        config.call.country_code = code.clone();
    }
    Ok(config)
}

fn open_channel(config: &Config) -> Result<Arc<ModemChannel>> {
    let port = SerialModemPort::open(&config.modem.port, config.modem.baud)?;
    Ok(Arc::new(ModemChannel::new(
        Box::new(port),
        Duration::from_millis(config.modem.response_window_ms),
        Duration::from_millis(config.modem.call_window_ms),
    )))
}

/// Liveness probe plus SIM status, reported on stdout.
fn probe(config: &Config) -> Result<()> {
    let channel = open_channel(config)?;
    channel.probe(&config.modem.port)?;
    println!("modem: OK ({})", config.modem.port);
    match channel.sim_status() {
        Ok(status) if !status.is_empty() => println!("sim: {status}"),
        Ok(_) => println!("sim: no response"),
        Err(e) => println!("sim: query failed: {e}"),
    }
    Ok(())
}

fn run(config: Config, quiet: bool, no_audio_routing: bool) -> Result<()> {
    let channel = open_channel(&config)?;

    // Fatal precondition: an unresponsive modem means nothing downstream
    // can work, so refuse to start rather than limp along.
    channel
        .probe(&config.modem.port)
        .context("modem liveness probe failed")?;

    match channel.sim_status() {
        Ok(status) if !status.is_empty() => eprintln!("voxcall: SIM status: {status}"),
        Ok(_) => eprintln!("voxcall: SIM status query got no response"),
        Err(e) => eprintln!("voxcall: SIM status query failed: {e}"),
    }

    let router: Arc<dyn CallAudioRouter> = if no_audio_routing {
        Arc::new(NoopAudioRouter::new())
    } else {
        Arc::new(PactlAudioRouter::new(config.audio.clone()))
    };
    let speaker: Arc<dyn Speaker> = if quiet {
        Arc::new(NullSpeaker)
    } else {
        Arc::new(EspeakSpeaker::new())
    };
    let store = Arc::new(FileContactStore::new(config.contacts.path.clone()));
    let flags = Arc::new(CallFlags::new());

    let machine = CallStateMachine::new(
        channel.clone(),
        router,
        store,
        speaker,
        flags.clone(),
        config.call.country_code.clone(),
        CallWorkerConfig {
            ceiling: Duration::from_secs(config.call.max_call_secs),
            ..CallWorkerConfig::default()
        },
    );

    eprintln!("voxcall: listening on stdin (one utterance per line)");
    let controller = Controller::new(machine, channel, flags);
    controller.start(Box::new(StdinUtteranceSource::new())).wait();
    Ok(())
}
