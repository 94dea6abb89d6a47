use mysql_detect::cli::Cli;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    mysql_detect::init_tracing(cli.verbose);

    match mysql_detect::run(cli).await {
        Ok(summary) if summary.all_detected() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}
