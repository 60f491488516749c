use autotest::config::{Config, ConfigLoader};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

/// Run the autotest self-test suite and print its report
#[derive(Parser, Debug)]
#[command(name = "autotest")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to a standalone autotest.toml
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the suite and print the report
    Run {
        /// Only show failing tests
        #[arg(short, long, conflicts_with = "all")]
        quiet: bool,

        /// Show passing tests too
        #[arg(short, long)]
        all: bool,

        /// Header shown on the first report line
        #[arg(long, value_name = "TEXT")]
        header: Option<String>,
    },

    /// Serve the report page (requires the `web` feature)
    Serve {
        /// Address to bind, overrides the configured one
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,

        /// Header shown on the first report line
        #[arg(long, value_name = "TEXT")]
        header: Option<String>,
    },

    /// Print the effective configuration and active environment overrides
    Check,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            init_tracing(cli.verbose);
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(cli.verbose || config.verbose);

    match run(cli.command, config) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "autotest=debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(path: Option<&PathBuf>) -> autotest::Result<Config> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = path {
        loader = loader.config_file(path);
    }
    loader.load()
}

fn run(command: Command, config: Config) -> autotest::Result<ExitCode> {
    match command {
        Command::Run { quiet, all, header } => {
            let quiet = if quiet {
                Some(true)
            } else if all {
                Some(false)
            } else {
                None
            };

            let runner = autotest::builder().with_config(config).build()?;
            let suite = autotest::selftest::suite();
            let output = runner.execute(&suite);
            println!("{}", runner.render(&output, quiet, header.as_deref()));

            Ok(if output.overall_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }

        Command::Serve { bind, header } => serve(config, bind, header),

        Command::Check => {
            print_check(&config)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[cfg(feature = "web")]
fn serve(mut config: Config, bind: Option<String>, header: Option<String>) -> autotest::Result<ExitCode> {
    if let Some(bind) = bind {
        config.web.bind = bind;
    }
    let bind = config.web.bind.clone();
    let runner = autotest::builder().with_config(config).build()?;

    let Some(router) = autotest::TestPage::mount_runner(autotest::selftest::suite(), runner, header.as_deref())
    else {
        return Err(autotest::Error::web(
            "test page is disabled: the environment must be tagged 'debug' and the app id must match web.static-app-id",
        ));
    };

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(autotest::web::serve(router, &bind))?;
    Ok(ExitCode::SUCCESS)
}

#[cfg(not(feature = "web"))]
fn serve(_config: Config, _bind: Option<String>, _header: Option<String>) -> autotest::Result<ExitCode> {
    Err(autotest::Error::feature_not_enabled("web"))
}

fn print_check(config: &Config) -> autotest::Result<()> {
    println!("Effective configuration:\n");
    println!("{}", toml::to_string_pretty(config).map_err(|e| autotest::Error::config(e.to_string()))?);

    let overrides = autotest::config::env::detect_active_overrides();
    if overrides.is_empty() {
        println!("No AUTOTEST_* overrides active.");
    } else {
        println!("Active environment overrides:");
        for (key, value) in overrides {
            println!("  {key}={value}");
        }
    }
    Ok(())
}
