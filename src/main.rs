use std::io::Write;
use std::process::ExitCode;

use clap::Parser;

use crate::config::Settings;
use crate::dataflow::RestClient;
use crate::dataflow::auth::Authenticator;
use crate::error::WorkerCountError;

mod cli;
mod config;
mod dataflow;
mod error;
mod reducer;
mod report;
mod run;

async fn invoke(settings: &Settings) -> error::Result<reducer::DesiredWorkerResult> {
    let auth = Authenticator::from_environment(settings.credentials_path.as_deref()).await?;
    let client = RestClient::new(&settings.endpoint, auth)?;

    let mut print = |line: String| println!("{line}");
    let work = run::desired_workers(&client, settings, chrono::Utc::now(), &mut print);
    match settings.deadline {
        Some(deadline) => tokio::time::timeout(deadline, work).await.map_err(|_| {
            WorkerCountError::Api(format!(
                "deadline of {}s exceeded",
                deadline.as_secs()
            ))
        })?,
        None => work.await,
    }
}

fn main() -> ExitCode {
    // Initialize the logger
    env_logger::init();

    // Process-wide rustls provider for every TLS client built afterwards.
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let args = cli::Args::parse();
    let outcome = Settings::try_from(args).and_then(|settings| {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| WorkerCountError::Api(format!("cannot start runtime: {e}")))?;
        let result = runtime.block_on(invoke(&settings))?;
        Ok((settings, result))
    });

    match outcome {
        Ok((settings, result)) => {
            let mut stdout = std::io::stdout().lock();
            if let Err(e) = stdout
                .write_all(report::render(&settings, &result).as_bytes())
                .and_then(|_| stdout.flush())
            {
                log::error!("Failed to write report: {e}");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            e.exit_code()
        }
    }
}
