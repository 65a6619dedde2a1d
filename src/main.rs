use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match soccer_agent::run_with_config().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "agent stopped");
            ExitCode::FAILURE
        }
    }
}
