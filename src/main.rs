use autopsarc::{Action, AutoPsarc, AutoPsarcError, Cli, OutputFormatter, OutputMode};
use clap::Parser;
use std::process;

fn main() {
    setup_logging();
    let exit_code = run(Cli::parse());
    process::exit(exit_code);
}

fn run(cli: Cli) -> i32 {
    // Work out what was asked for; missing paths still check the tool first
    let action = match cli.action() {
        Ok(action) => action,
        Err(AutoPsarcError::MissingArgument { .. }) => return handle_missing_arguments(&cli),
        Err(e) => {
            print_startup_error(&e);
            return e.exit_code();
        }
    };

    // Handle special commands first
    if action == Action::FullHelp {
        print!("{}", autopsarc::cli::full_help());
        return 0;
    }

    // Load the saved configuration
    let mut app = match load_app(&cli) {
        Ok(app) => app,
        Err(code) => return code,
    };

    // Execute the requested command
    let result = match action {
        Action::SetToolPath(path) => handle_set_tool_path(&mut app, path),
        Action::Extract { input, output } => app
            .extract(&input, &output, cli.workers, cli.log)
            .map(|summary| {
                log::info!(
                    "batch done: {} extracted, {} skipped, {} failed",
                    summary.extracted,
                    summary.skipped,
                    summary.failed_count()
                );
            }),
        Action::FullHelp => Ok(()),
    };

    // Per-archive failures do not change the exit code
    match result {
        Ok(()) => 0,
        Err(e) => {
            app.handle_error(&e);
            e.exit_code()
        }
    }
}

fn load_app(cli: &Cli) -> Result<AutoPsarc, i32> {
    AutoPsarc::from_cli(cli).map_err(|e| {
        print_startup_error(&e);
        e.exit_code()
    })
}

fn handle_set_tool_path(
    app: &mut AutoPsarc,
    path: Option<std::path::PathBuf>,
) -> autopsarc::Result<()> {
    let path = match path {
        Some(path) => path,
        None => AutoPsarc::prompt_tool_path()?,
    };
    app.set_tool_path(&path).map(|_| ())
}

/// Without `--input`/`--output` the tool must still be configured; if it is,
/// fall back to usage help.
fn handle_missing_arguments(cli: &Cli) -> i32 {
    let mut app = match load_app(cli) {
        Ok(app) => app,
        Err(code) => return code,
    };

    if let Err(e) = app.resolve_tool() {
        app.handle_error(&e);
        return e.exit_code();
    }

    Cli::print_usage();
    2
}

fn print_startup_error(error: &AutoPsarcError) {
    // Create a basic formatter for startup errors
    let formatter = OutputFormatter::new(OutputMode::Human, 0, false);
    formatter.print_user_friendly_error(error);
}

fn setup_logging() {
    // RUST_LOG overrides the default filter
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("autopsarc=warn"))
        .format_timestamp(None)
        .init();
}
