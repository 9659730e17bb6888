use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    Yaml,
}

/// Print `payload` as JSON/YAML, or run `human` for the human format.
pub fn emit<T, F>(payload: &T, output: OutputFormat, human: F) -> Result<()>
where
    T: Serialize,
    F: FnOnce(&T),
{
    match output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(payload)?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yaml::to_string(payload)?);
        }
        OutputFormat::Human => human(payload),
    }
    Ok(())
}
