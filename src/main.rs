//! phpup - PHP-FPM provisioning and version switching for Linux.

use std::env;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use phpup::config::Settings;
use phpup::error::PhpupResult;
use phpup::executor::{CommandRunner, SystemRunner};
use phpup::filesystem::RealFilesystem;
use phpup::fpm::PhpFpm;
use phpup::{pm, sm};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const NAME: &str = env!("CARGO_PKG_NAME");

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return ExitCode::SUCCESS;
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("{} {}", NAME, VERSION);
        return ExitCode::SUCCESS;
    }

    let config_path = get_config_path(&args);
    let settings = match Settings::load(&config_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(&settings);

    match run(&args, settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String], settings: Settings) -> PhpupResult<()> {
    let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner::new());
    let fs = Arc::new(RealFilesystem::new());

    let pm = pm::detect(Arc::clone(&runner))?;
    let sm = sm::detect(Arc::clone(&runner))?;
    let mut fpm = PhpFpm::new(pm, sm, fs, Arc::clone(&runner), settings)?;

    let command = args.get(1).map(String::as_str).unwrap_or("status");
    match command {
        "install" => {
            fpm.install()?;
            println!("PHP {} FPM installed and running.", fpm.current_version());
            Ok(())
        }
        "uninstall" => {
            fpm.uninstall()?;
            println!("Managed FPM pool removed.");
            Ok(())
        }
        "use" => {
            let target = args
                .get(2)
                .filter(|a| !a.starts_with("--"))
                .map(String::as_str);
            let update_cli = args.iter().any(|a| a == "--cli");
            let install_exts = args.iter().any(|a| a == "--extensions");

            if let Some(version) = target.filter(|v| *v != "default") {
                fpm.validate_version(version)?;
            }

            let switch = fpm.change_version(target, update_cli, install_exts)?;
            match switch.error {
                // The switch rolled back; bookkeeping ran, now surface it.
                Some(err) => {
                    eprintln!(
                        "Switch to the requested version failed; still on PHP {}.",
                        switch.version
                    );
                    Err(err)
                }
                None => {
                    info!(from = %switch.old_version, to = %switch.version, "Version switch complete");
                    println!("Now using PHP {}.", switch.version);
                    Ok(())
                }
            }
        }
        "restart" => {
            fpm.restart()?;
            println!("PHP {} FPM restarted.", fpm.current_version());
            Ok(())
        }
        "which" => {
            println!("{}", fpm.get_version(false)?);
            Ok(())
        }
        "status" => {
            println!("PHP version:     {}", fpm.current_version());
            println!("Available:       {}", fpm.supported_php_versions().join(", "));
            println!("Package manager: {}", fpm.package_manager_name());
            println!("Service manager: {}", fpm.service_manager_name());
            println!("FPM service:     {}", fpm.fpm_service_name()?);
            fpm.print_status()
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_help();
            Ok(())
        }
    }
}

/// Print help message.
fn print_help() {
    println!(
        r#"{} {}
PHP-FPM provisioning and version switching for Linux.

USAGE:
    {} [COMMAND] [OPTIONS]

COMMANDS:
    install            Install PHP-FPM for the current version
    uninstall          Remove the managed FPM pool and stop the service
    use [VERSION]      Switch PHP versions ("default" tracks the system php)
        --cli          Also point the php CLI alias at the new version
        --extensions   Also (re)install the common extension set
    restart            Restart the current FPM service
    which              Print the resolved PHP version
    status             Show version, managers, and FPM service status

OPTIONS:
    -c, --config <PATH>    Path to configuration file
                           [default: ~/.phpup/phpup.toml]
    -h, --help             Print help information
    -V, --version          Print version information
"#,
        NAME, VERSION, NAME
    );
}

/// Get configuration file path from command line arguments.
fn get_config_path(args: &[String]) -> String {
    for (i, arg) in args.iter().enumerate() {
        if (arg == "--config" || arg == "-c") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
        if let Some(path) = arg.strip_prefix("--config=") {
            return path.to_string();
        }
    }
    let home = env::var("HOME").unwrap_or_else(|_| "/root".to_string());
    Path::new(&home)
        .join(".phpup/phpup.toml")
        .to_string_lossy()
        .into_owned()
}

/// Initialize logging based on settings.
fn init_logging(settings: &Settings) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    match settings.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }
}
