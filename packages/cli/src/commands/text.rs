use anyhow::Result;
use clap::Args;
use raqam_engine::to_persian_digits;

#[derive(Debug, Args)]
pub struct TextArgs {
    /// Strings to convert, printed one per line
    #[arg(required = true)]
    pub text: Vec<String>,
}

pub fn text(args: TextArgs) -> Result<()> {
    for line in &args.text {
        println!("{}", to_persian_digits(line));
    }
    Ok(())
}
