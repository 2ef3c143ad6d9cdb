mod cli;
mod infra;
mod preview;
mod routes;
mod server;

use course_staffing::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
