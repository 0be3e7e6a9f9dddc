use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use dialoguer::Input;
use tracing_subscriber::EnvFilter;

use aria_gateway::voice::{EspeakSynthesizer, Synthesizer};
use aria_gateway::{Settings, VoiceAgent};

/// Aria - Voice chat assistant gateway
#[derive(Parser)]
#[command(name = "aria", version, about)]
struct Cli {
    /// Path to a settings file (YAML or JSON)
    #[arg(short, long, global = true, env = "ARIA_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API server
    Serve {
        /// Address to bind
        #[arg(long, env = "ARIA_HOST", default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(long, env = "ARIA_PORT", default_value = "8000")]
        port: u16,
    },
    /// Interactive text conversation with spoken replies
    Chat {
        /// Skip eager transcriber initialization at startup
        #[arg(long)]
        no_eager: bool,

        /// Print replies without speaking them
        #[arg(long)]
        mute: bool,
    },
    /// Speak a line of text and exit
    Say {
        /// Text to speak
        text: String,
    },
    /// Print the resolved settings
    Settings,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Settings load first so the configured log level can seed the
    // default filter; verbosity flags override it.
    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("fatal: {e}");
            return ExitCode::FAILURE;
        }
    };

    let filter = match cli.verbose {
        0 => format!("{level},aria_gateway={level}", level = settings.logging_level),
        1 => "info,aria_gateway=debug".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli, settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, settings: Settings) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve { host, port } => {
            settings.validate()?;
            tracing::info!(%host, port, "starting aria gateway");
            aria_gateway::api::serve(settings, &host, port).await?;
            Ok(())
        }
        Command::Chat { no_eager, mute } => run_chat(settings, no_eager, mute).await,
        Command::Say { text } => {
            let synthesizer = EspeakSynthesizer::from_settings(&settings)?;
            synthesizer.speak(&text).await?;
            Ok(())
        }
        Command::Settings => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
            Ok(())
        }
    }
}

/// Interactive chat loop: read a line, run a turn, repeat
async fn run_chat(settings: Settings, no_eager: bool, mute: bool) -> anyhow::Result<()> {
    settings.validate()?;
    let mut agent = VoiceAgent::from_settings(settings, mute)?;

    if !no_eager {
        agent.ensure_ready()?;
    }

    println!(
        "{} ready ({} chat). Type 'exit' or 'quit' to leave.",
        agent.persona_name(),
        agent.chat_provider()
    );

    loop {
        let line: String = Input::new().with_prompt("you").interact_text()?;
        let line = line.trim();

        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        match agent.process_text(line).await {
            Ok(reply) => println!("{}: {reply}", agent.persona_name()),
            Err(e) => {
                // keep the session alive across failed turns
                eprintln!("error: {e}");
            }
        }
    }

    Ok(())
}
