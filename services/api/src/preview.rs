use clap::Args;
use course_staffing::applications::{StatusEmail, StatusNotice};
use course_staffing::config::AppConfig;
use course_staffing::error::AppError;

#[derive(Args, Debug)]
pub(crate) struct EmailPreviewArgs {
    /// Application status to render (pending, selected, rejected)
    #[arg(long)]
    pub(crate) status: String,
    /// Applicant first name used in the greeting
    #[arg(long)]
    pub(crate) fname: String,
    /// Course name the position belongs to
    #[arg(long)]
    pub(crate) course: String,
    /// Recipient address shown in the preview
    #[arg(long, default_value = "applicant@example.edu")]
    pub(crate) email: String,
}

pub(crate) fn run_email_preview(args: EmailPreviewArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let email = render_preview(args, &config.mail.signature)?;

    println!("To: {} <{}>", email.recipient_name, email.to);
    println!("Subject: {}", email.subject);
    println!();
    print!("{}", email.body);
    Ok(())
}

fn render_preview(args: EmailPreviewArgs, signature: &str) -> Result<StatusEmail, AppError> {
    let notice = StatusNotice {
        email: Some(args.email),
        fname: Some(args.fname),
        course: Some(args.course),
        status: Some(args.status),
    };
    Ok(StatusEmail::compose(notice, signature)?)
}
