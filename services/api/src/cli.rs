use crate::preview::{run_email_preview, EmailPreviewArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use course_staffing::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Course Staffing Service",
    about = "Run the course staffing application service from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Work with applicant status e-mails
    Email {
        #[command(subcommand)]
        command: EmailCommand,
    },
}

#[derive(Subcommand, Debug)]
enum EmailCommand {
    /// Render a status e-mail to stdout without sending it
    Preview(EmailPreviewArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Email {
            command: EmailCommand::Preview(args),
        } => run_email_preview(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["course-staffing-api"]).expect("parses");
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["course-staffing-api", "serve", "--port", "8080"])
            .expect("parses");
        match cli.command {
            Some(Command::Serve(args)) => assert_eq!(args.port, Some(8080)),
            other => panic!("expected serve command, got {other:?}"),
        }
    }

    #[test]
    fn email_preview_requires_template_fields() {
        assert!(Cli::try_parse_from(["course-staffing-api", "email", "preview"]).is_err());

        let cli = Cli::try_parse_from([
            "course-staffing-api",
            "email",
            "preview",
            "--status",
            "pending",
            "--fname",
            "Ada",
            "--course",
            "Data Structures",
        ])
        .expect("parses");
        match cli.command {
            Some(Command::Email {
                command: EmailCommand::Preview(args),
            }) => {
                assert_eq!(args.status, "pending");
                assert_eq!(args.email, "applicant@example.edu");
            }
            other => panic!("expected email preview, got {other:?}"),
        }
    }
}
