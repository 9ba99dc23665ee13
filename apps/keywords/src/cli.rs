use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Generate grouped ATS keyword lists for job roles.
#[derive(Debug, Parser)]
#[command(name = "ats-keywords", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the keyword pipeline for one role (default).
    Generate(GenerateArgs),
    /// Scrape the careers site into the corpus directory.
    Scrape(ScrapeArgs),
    /// Serve the keyword pipeline over HTTP.
    Serve(ServeArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct GenerateArgs {
    /// Role to generate keywords for. Asked interactively when omitted.
    #[arg(long)]
    pub role: Option<String>,

    /// Number of keywords requested from the first stage (before clustering).
    #[arg(long)]
    pub num_keywords: Option<u32>,

    /// Also write the run's intermediate outputs next to the plan.
    #[arg(long)]
    pub emit_intermediates: bool,
}

#[derive(Debug, Clone, Args)]
pub struct ScrapeArgs {
    /// Directory the career text files are written to.
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Port to listen on (overrides PORT).
    #[arg(long)]
    pub port: Option<u16>,
}

impl Cli {
    pub fn command(self) -> Command {
        self.command
            .unwrap_or_else(|| Command::Generate(GenerateArgs::default()))
    }
}

/// Asks for the role on `output` and reads one line from `input`.
pub fn prompt_for_role<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> std::io::Result<String> {
    write!(output, "What is the role? ")?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_defaults_to_generate() {
        let cli = Cli::parse_from(["ats-keywords"]);
        assert!(matches!(
            cli.command(),
            Command::Generate(GenerateArgs { role: None, .. })
        ));
    }

    #[test]
    fn test_generate_flags() {
        let cli = Cli::parse_from([
            "ats-keywords",
            "generate",
            "--role",
            "Data Scientist",
            "--num-keywords",
            "40",
            "--emit-intermediates",
        ]);
        match cli.command() {
            Command::Generate(args) => {
                assert_eq!(args.role.as_deref(), Some("Data Scientist"));
                assert_eq!(args.num_keywords, Some(40));
                assert!(args.emit_intermediates);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_scrape_default_data_dir() {
        let cli = Cli::parse_from(["ats-keywords", "scrape"]);
        match cli.command() {
            Command::Scrape(args) => assert_eq!(args.data_dir, PathBuf::from("data")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_prompt_for_role_trims_input() {
        let mut input = std::io::Cursor::new("  Data Scientist \n");
        let mut output = Vec::new();
        let role = prompt_for_role(&mut input, &mut output).unwrap();
        assert_eq!(role, "Data Scientist");
        assert_eq!(String::from_utf8(output).unwrap(), "What is the role? ");
    }
}
