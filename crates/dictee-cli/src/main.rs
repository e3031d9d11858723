//! CLI entry point - the composition root.
//!
//! Infrastructure is wired once via bootstrap; command dispatch routes to
//! handlers which drive the exam engine.

use clap::{CommandFactory, Parser};

use dictee_cli::handlers::run::RunArgs;
use dictee_cli::{Cli, CliConfig, CliError, Commands, bootstrap, handlers, init_logging};
use dictee_core::ExamError;

async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    // Dispatch to appropriate handler
    let Some(command) = cli.command.as_ref() else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let ctx = bootstrap(CliConfig::from_cli(&cli))?;

    match command {
        Commands::List => handlers::list::execute(&ctx)?,
        Commands::Health => handlers::health::execute(&ctx).await?,
        Commands::Rules { id } => handlers::rules::execute(&ctx, *id)?,
        Commands::Run {
            id,
            speed,
            silent,
            no_pregen,
        } => {
            let args = RunArgs {
                id: *id,
                speed: *speed,
                silent: *silent,
                no_pregen: *no_pregen,
            };
            handlers::run::execute(&ctx, args).await?;
        }
        Commands::Preview { word, silent } => {
            handlers::preview::execute(&ctx, word, *silent).await?;
        }
        Commands::Score { id, transcript } => handlers::score::execute(&ctx, *id, transcript)?,
    }
    Ok(())
}

fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        cli_err.exit_code()
    } else if let Some(exam_err) = err.downcast_ref::<ExamError>() {
        CliError::Exam(exam_err.clone()).exit_code()
    } else {
        1
    }
}

#[tokio::main]
async fn main() {
    // Load environment variables before clap reads its env fallbacks
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let code = match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("Error: {err:#}");
            exit_code(&err)
        }
    };

    // Stdin is read by a blocking thread that cannot be cancelled; exit
    // without waiting on it during runtime shutdown.
    std::process::exit(code);
}
