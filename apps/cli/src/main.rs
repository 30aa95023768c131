//! Command-line FHIR toolkit: FHIRPath evaluation, format conversion, and
//! wire-format validation.

use std::io::Read;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

use aurum_fhirpath::{Collection, Context, FhirPath, Value, ValueData};

#[derive(Parser)]
#[command(name = "aurum", version, about = "FHIR resources and FHIRPath from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate a FHIRPath expression against a resource
    Eval {
        /// The FHIRPath expression
        expression: String,
        /// Resource file, or - for stdin
        #[arg(long, default_value = "-")]
        input: String,
        /// Wire format of the input; sniffed from the content when omitted
        #[arg(long, value_enum)]
        format: Option<Format>,
        /// How to print the result collection
        #[arg(long, value_enum, default_value_t = OutputMode::Text)]
        output: OutputMode,
        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
        /// Environment variable binding, NAME=VALUE (repeatable)
        #[arg(long = "var", value_name = "NAME=VALUE")]
        vars: Vec<String>,
    },
    /// Convert a resource between JSON and XML
    Convert {
        /// Target format
        #[arg(long, value_enum)]
        to: Format,
        /// Resource file, or - for stdin
        #[arg(long, default_value = "-")]
        input: String,
        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Parse a resource strictly and report the first violation
    Validate {
        /// Wire format of the input; sniffed from the content when omitted
        #[arg(long, value_enum)]
        format: Option<Format>,
        /// Resource file, or - for stdin
        #[arg(long, default_value = "-")]
        input: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Xml,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputMode {
    /// One rendered value per line
    Text,
    /// A JSON array of the result collection
    Json,
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command {
        Command::Eval {
            expression,
            input,
            format,
            output,
            pretty,
            vars,
        } => {
            let text = read_input(&input)?;
            let resource = parse_resource(&text, format)?;
            let mut context = Context::new(Value::element(Arc::new(resource)));
            for binding in &vars {
                let (name, value) = binding
                    .split_once('=')
                    .with_context(|| format!("--var {binding:?} is not NAME=VALUE"))?;
                context.set_variable(name, parse_variable(value));
            }
            let engine = FhirPath::new();
            let compiled = engine
                .compile(&expression)
                .context("invalid FHIRPath expression")?;
            let result = engine.evaluate_expr(&compiled, &context)?;
            print_collection(&result, output, pretty)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Convert { to, input, pretty } => {
            let text = read_input(&input)?;
            let resource = parse_resource(&text, None)?;
            let converted = match (to, pretty) {
                (Format::Json, false) => aurum_format::to_json_string(&resource)?,
                (Format::Json, true) => aurum_format::to_json_string_pretty(&resource)?,
                (Format::Xml, _) => aurum_format::write_xml(&resource)?,
            };
            println!("{converted}");
            Ok(ExitCode::SUCCESS)
        }
        Command::Validate { format, input } => {
            let text = read_input(&input)?;
            match parse_resource(&text, format) {
                Ok(resource) => {
                    let name = resource.resource_type().unwrap_or("resource");
                    println!("valid: {name}");
                    Ok(ExitCode::SUCCESS)
                }
                Err(error) => {
                    eprintln!("invalid: {error:#}");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}

fn read_input(path: &str) -> anyhow::Result<String> {
    if path == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))
    }
}

fn parse_resource(
    text: &str,
    format: Option<Format>,
) -> anyhow::Result<aurum_element::Element> {
    let format = format.unwrap_or_else(|| sniff_format(text));
    let resource = match format {
        Format::Json => aurum_format::parse_json(text).context("failed to parse JSON resource")?,
        Format::Xml => aurum_format::parse_xml(text).context("failed to parse XML resource")?,
    };
    Ok(resource)
}

fn sniff_format(text: &str) -> Format {
    if text.trim_start().starts_with('<') {
        Format::Xml
    } else {
        Format::Json
    }
}

/// `--var` values: booleans and integers bind as their System type,
/// everything else as a string.
fn parse_variable(value: &str) -> Value {
    match value {
        "true" => Value::boolean(true),
        "false" => Value::boolean(false),
        _ => match value.parse::<i64>() {
            Ok(i) => Value::integer(i),
            Err(_) => Value::string(value),
        },
    }
}

fn print_collection(
    collection: &Collection,
    output: OutputMode,
    pretty: bool,
) -> anyhow::Result<()> {
    match output {
        OutputMode::Text => {
            for value in collection.iter() {
                println!("{}", value.render());
            }
        }
        OutputMode::Json => {
            let items = collection
                .iter()
                .map(value_to_json)
                .collect::<anyhow::Result<Vec<_>>>()?;
            let array = serde_json::Value::Array(items);
            let rendered = if pretty {
                serde_json::to_string_pretty(&array)?
            } else {
                serde_json::to_string(&array)?
            };
            println!("{rendered}");
        }
    }
    Ok(())
}

fn value_to_json(value: &Value) -> anyhow::Result<serde_json::Value> {
    Ok(match value.data() {
        ValueData::Boolean(b) => serde_json::Value::Bool(*b),
        ValueData::Integer(i) => serde_json::Value::from(*i),
        ValueData::Decimal(d) => {
            serde_json::Value::Number(serde_json::from_str(&d.to_string())?)
        }
        ValueData::String(s) => serde_json::Value::String(s.to_string()),
        ValueData::Element(element) => aurum_format::write_json(element)?,
        ValueData::Primitive(_) => match value.system() {
            Some(system) => value_to_json(&system)?,
            None => serde_json::Value::Null,
        },
        // Dates, times, quantities, and type infos have no JSON shape of
        // their own; print their canonical rendering.
        _ => serde_json::Value::String(value.render()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_sniffing() {
        assert_eq!(sniff_format("  <Patient/>"), Format::Xml);
        assert_eq!(sniff_format("{\"resourceType\":\"Patient\"}"), Format::Json);
    }

    #[test]
    fn test_variable_parsing() {
        assert!(matches!(parse_variable("true").data(), ValueData::Boolean(true)));
        assert!(matches!(parse_variable("42").data(), ValueData::Integer(42)));
        assert!(matches!(parse_variable("final").data(), ValueData::String(_)));
    }
}
