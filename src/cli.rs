use clap::Parser;

#[derive(Parser)]
#[command(name = "unidesk")]
#[command(author, version, about = "University help-desk Telegram bot", long_about = None)]
pub struct Cli {
    /// Load environment variables from this file instead of `.env`
    #[arg(long, value_name = "PATH")]
    pub env_file: Option<String>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
