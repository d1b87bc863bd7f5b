use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};

#[derive(Debug, Parser)]
#[command(name = "gpt")]
#[command(version)]
#[command(about = "Ask a question to GPT-4", long_about = None)]
pub struct Args {
    /// The question to ask
    #[arg(value_name = "QUESTION")]
    pub question: Option<String>,

    /// Write an example configuration file and exit
    #[arg(long = "config-example")]
    pub config_example: bool,
}

impl Args {
    // The positional is optional so --config-example can stand alone;
    // the missing-question case keeps clap's usage-error exit code.
    pub fn missing_question_error() -> clap::Error {
        Args::command().error(
            ErrorKind::MissingRequiredArgument,
            "Question is required unless --config-example is given",
        )
    }
}
