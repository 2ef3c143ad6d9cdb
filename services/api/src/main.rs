use course_staffing_api::run;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("course staffing error: {err}");
        std::process::exit(1);
    }
}
