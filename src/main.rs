use std::io::{self, BufRead, IsTerminal, Write};

use clap::{CommandFactory, Parser};
use colored::*;
use tracing_subscriber::EnvFilter;

use narrator_stream::cli::Args;
use narrator_stream::config::Config;
use narrator_stream::{
    HttpEndpoint, JsonOutput, OutputFormat, OutputSink, Policy, SaveControl, StreamRenderer,
    TerminalOutput,
};

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn confirm_save() -> io::Result<bool> {
    print!("{} ", "Save conversation? [y/N]".bright_yellow());
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes" | "s" | "si" | "sí"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if let Some(shell) = args.completions {
        clap_complete::generate(shell, &mut Args::command(), "narrator-stream", &mut io::stdout());
        return Ok(());
    }

    let config = Config::resolve(&args)?;
    init_tracing(&config.log_filter);

    let endpoint = HttpEndpoint::new(
        config.base_url.clone(),
        config.start_path.clone(),
        config.save_path.clone(),
        config.connect_timeout(),
    )?;
    let output: Box<dyn OutputSink> = match config.format {
        OutputFormat::Terminal => Box::new(TerminalOutput::new(io::stdout())),
        OutputFormat::Json => Box::new(JsonOutput::new(io::stdout())),
    };
    let policy = Policy::from_kind(config.policy, config.prefixes.clone());

    let mut renderer =
        StreamRenderer::new(endpoint, output, policy).with_idle_timeout(config.idle_timeout());

    let form = args.form();
    let cancel = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    let report = match renderer.submit_until(&form, cancel).await {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{} {}", "error:".bright_red().bold(), e);
            std::process::exit(1);
        }
    };

    // Each sentinel offers its own control; the latest one covers the whole conversation.
    if let Some(mut control) = report.save_controls.into_iter().last() {
        let interactive = config.format == OutputFormat::Terminal
            && !args.no_prompt
            && io::stdin().is_terminal();
        if args.save || (interactive && confirm_save()?) {
            save(&mut renderer, &mut control).await;
        }
    }

    Ok(())
}

async fn save<E, O>(renderer: &mut StreamRenderer<E, O>, control: &mut SaveControl)
where
    E: narrator_stream::GameEndpoint,
    O: OutputSink,
{
    if let Err(e) = renderer.activate_save(control).await {
        eprintln!("{} {}", "save failed:".bright_red().bold(), e);
    }
}
