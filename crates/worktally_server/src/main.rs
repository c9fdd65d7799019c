use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match worktally_server::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("worktally-server: {err}");
            ExitCode::FAILURE
        }
    }
}
