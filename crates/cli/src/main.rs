use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use fhir::{RecordKind, VitalRecord};
use messaging::Envelope;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;

use config::CliConfig;

#[derive(Parser)]
#[command(name = "vrx")]
#[command(about = "Vital records conversion and messaging CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Kind {
    Birth,
    FetalDeath,
}

impl From<Kind> for RecordKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Birth => RecordKind::Birth,
            Kind::FetalDeath => RecordKind::FetalDeath,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the named fields and their fixed-width positions
    Fields,
    /// Convert a fixed-width line into a record document
    IjeToFhir {
        /// File holding the line (stdin when omitted)
        input: Option<PathBuf>,
        /// Kind of record the line describes
        #[arg(long, value_enum, default_value = "birth")]
        kind: Kind,
        /// Fail on the first pass with problems instead of logging them
        #[arg(long)]
        validate: bool,
    },
    /// Convert a record document into a fixed-width line
    FhirToIje {
        /// File holding the document (stdin when omitted)
        input: Option<PathBuf>,
        /// Fail when any field cannot be encoded
        #[arg(long)]
        validate: bool,
    },
    /// Show the raw value at every fixed-width position
    InspectIje {
        /// File holding the line (stdin when omitted)
        input: Option<PathBuf>,
    },
    /// Wrap a record document in a submission message
    Submit {
        /// File holding the document (stdin when omitted)
        input: Option<PathBuf>,
        /// Send as an update to an earlier submission
        #[arg(long)]
        update: bool,
    },
    /// Build a void message for a record's certificate number
    Void {
        /// File holding the document (stdin when omitted)
        input: Option<PathBuf>,
        /// Number of consecutive certificate numbers to void
        #[arg(long)]
        block_count: Option<u32>,
    },
    /// Acknowledge a message, or answer it with an error if it cannot be read
    Acknowledge {
        /// File holding the message (stdin when omitted)
        input: Option<PathBuf>,
    },
    /// Summarise a message
    ParseMessage {
        /// File holding the message (stdin when omitted)
        input: Option<PathBuf>,
        /// Print the carried record instead of the summary
        #[arg(long)]
        record: bool,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(log_filter(tracing_subscriber::EnvFilter::from_default_env())?)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = CliConfig::from_env()?;
    let cli = Cli::parse();

    match cli.command {
        Some(command) => {
            let input = read_input(command.input())?;
            print!("{}", run(&command, &config, &input)?);
        }
        None => {
            println!("Use 'vrx --help' for commands");
        }
    }

    Ok(())
}

/// Adds the default directives: CLI progress at info, library warnings always shown.
fn log_filter(
    filter: tracing_subscriber::EnvFilter,
) -> anyhow::Result<tracing_subscriber::EnvFilter> {
    ["vrx=info", "fhir=warn", "ije=warn", "messaging=warn"]
        .into_iter()
        .try_fold(filter, |filter, directive| Ok(filter.add_directive(directive.parse()?)))
}

impl Commands {
    fn input(&self) -> Option<Option<&Path>> {
        match self {
            Commands::Fields => None,
            Commands::IjeToFhir { input, .. }
            | Commands::FhirToIje { input, .. }
            | Commands::InspectIje { input }
            | Commands::Submit { input, .. }
            | Commands::Void { input, .. }
            | Commands::Acknowledge { input }
            | Commands::ParseMessage { input, .. } => Some(input.as_deref()),
        }
    }
}

/// Reads a command's input from its file, or stdin when no file is named.
fn read_input(source: Option<Option<&Path>>) -> anyhow::Result<String> {
    match source {
        None => Ok(String::new()),
        Some(Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display())),
        Some(None) => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("reading stdin")?;
            Ok(text)
        }
    }
}

/// Runs one command against already-read input and returns what to print.
fn run(command: &Commands, config: &CliConfig, input: &str) -> anyhow::Result<String> {
    let output = match command {
        Commands::Fields => list_fields(),
        Commands::IjeToFhir { kind, validate, .. } => {
            let record = ije::decode(ije_line(input), (*kind).into(), *validate)?;
            record.render(config.format())?
        }
        Commands::FhirToIje { validate, .. } => {
            let record = VitalRecord::parse(input, config.mode())?;
            if *validate {
                ije::encode_strict(&record)?
            } else {
                let encoded = ije::encode(&record);
                for issue in &encoded.issues {
                    tracing::warn!(issue = %issue, "fixed-width encoding issue");
                }
                encoded.line
            }
        }
        Commands::InspectIje { .. } => ije::fields_of(ije_line(input))
            .into_iter()
            .map(|(mnemonic, raw)| format!("{mnemonic:<12} [{raw}]\n"))
            .collect(),
        Commands::Submit { update, .. } => {
            let record = VitalRecord::parse(input, config.mode())?;
            let message = if *update {
                Envelope::update(&record)
            } else {
                Envelope::submission(&record)
            };
            route(message, config)?.render(config.format())?
        }
        Commands::Void { block_count, .. } => {
            let record = VitalRecord::parse(input, config.mode())?;
            route(Envelope::void(&record, *block_count)?, config)?.render(config.format())?
        }
        Commands::Acknowledge { .. } => match Envelope::parse(input, config.mode()) {
            Ok(message) => Envelope::acknowledge(&message)?.render(config.format())?,
            Err(err) => {
                tracing::warn!(error = %err, "answering unreadable message with an error");
                err.error_response().render(config.format())?
            }
        },
        Commands::ParseMessage { record, .. } => {
            let message = Envelope::parse(input, config.mode())?;
            if *record {
                match message.record() {
                    Some(carried) => carried.render(config.format())?,
                    None => anyhow::bail!("{:?} messages carry no record", message.kind()),
                }
            } else {
                summarise(&message)
            }
        }
    };
    Ok(with_newline(output))
}

fn route(message: Envelope, config: &CliConfig) -> anyhow::Result<Envelope> {
    let message = message.with_source(config.source())?;
    Ok(match config.destination() {
        Some(destination) => message.with_destinations([destination])?,
        None => message,
    })
}

fn list_fields() -> String {
    let mut out = String::new();
    for field in fhir::fields::all() {
        let positions: Vec<String> = field
            .flat
            .iter()
            .map(|f| format!("{}@{}+{}", f.mnemonic, f.offset, f.length))
            .collect();
        out.push_str(&format!(
            "{:<40} {:<40} {}\n",
            field.name,
            positions.join(","),
            field.description
        ));
    }
    out
}

fn summarise(message: &Envelope) -> String {
    let header = message.header();
    let ids = message.ids();
    let mut lines = vec![
        format!("type:        {}", message.message_type().uri()),
        format!("id:          {}", header.id),
        format!("timestamp:   {}", header.timestamp),
        format!("source:      {}", header.source),
        format!("destination: {}", header.destinations.join(", ")),
    ];
    if let Some(id) = &header.response_to {
        lines.push(format!("responds to: {id}"));
    }
    let mut optional = |label: &str, value: Option<String>| {
        if let Some(value) = value {
            lines.push(format!("{label:<13}{value}"));
        }
    };
    optional("cert_no:", ids.certificate_number.clone());
    optional("jurisdiction:", ids.jurisdiction_id.clone());
    optional("aux id:", ids.state_auxiliary_id.clone());
    optional("event year:", ids.event_year.map(|y| y.to_string()));
    optional("block count:", message.block_count().map(|n| n.to_string()));
    if let messaging::MessageBody::Status { status } = message.body() {
        lines.push(format!("status:      {}", status.as_code()));
    }
    for issue in message.issues() {
        lines.push(format!(
            "issue:       {} {} {}",
            issue.severity.as_code(),
            issue.code.as_code(),
            issue.description
        ));
    }
    if message.record().is_some() {
        lines.push("record:      present".to_string());
    }
    lines.join("\n")
}

/// Strips the line terminator a file or pipe adds after a fixed-width line.
fn ije_line(input: &str) -> &str {
    input.trim_end_matches(['\n', '\r'])
}

fn with_newline(mut output: String) -> String {
    if !output.ends_with('\n') {
        output.push('\n');
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use fhir::{FieldValue, ParseMode};
    use messaging::{MessageBody, MessageKind};
    use vrx_types::Component;

    fn config() -> CliConfig {
        CliConfig::resolve(|_| None).expect("defaults")
    }

    fn record_json() -> String {
        let mut record = VitalRecord::new(RecordKind::Birth);
        record.set_certificate_number(Some("77"));
        record.set_jurisdiction_id(Some("MA"));
        record
            .set("birthYear", FieldValue::Number(Component::Known(2023)))
            .expect("valid year");
        record.to_json().expect("serialises")
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn library_warnings_are_shown_by_default() {
        let filter = log_filter(tracing_subscriber::EnvFilter::new("")).expect("valid directives");
        let rendered = filter.to_string();
        for directive in ["vrx=info", "fhir=warn", "ije=warn", "messaging=warn"] {
            assert!(rendered.contains(directive), "{directive} missing from {rendered}");
        }
    }

    #[test]
    fn documents_convert_to_lines_and_back() {
        let line = run(
            &Commands::FhirToIje {
                input: None,
                validate: false,
            },
            &config(),
            &record_json(),
        )
        .expect("encodes");
        assert_eq!(line.len(), ije::LINE_LENGTH + 1);
        assert_eq!(&line[6..12], "000077");

        let document = run(
            &Commands::IjeToFhir {
                input: None,
                kind: Kind::Birth,
                validate: false,
            },
            &config(),
            &line,
        )
        .expect("decodes");
        let record = VitalRecord::parse(&document, ParseMode::Strict).expect("valid document");
        assert_eq!(record.certificate_number().as_deref(), Some("77"));
    }

    #[test]
    fn submissions_are_routed_by_configuration() {
        let config = CliConfig::resolve(|name| match name {
            "VRX_DESTINATION_ENDPOINT" => Some("http://example.org/nchs".into()),
            _ => None,
        })
        .expect("valid");
        let output = run(
            &Commands::Submit {
                input: None,
                update: true,
            },
            &config,
            &record_json(),
        )
        .expect("builds");
        let message = Envelope::parse(&output, ParseMode::Strict).expect("parses");
        assert_eq!(message.kind(), MessageKind::Update);
        assert_eq!(
            message.header().destinations,
            vec!["http://example.org/nchs".to_string()]
        );
    }

    #[test]
    fn unreadable_messages_are_answered_with_errors() {
        let output = run(&Commands::Acknowledge { input: None }, &config(), "{}")
            .expect("answers");
        let answer = Envelope::parse(&output, ParseMode::Strict).expect("parses");
        assert_eq!(answer.kind(), MessageKind::Error);
        assert_eq!(answer.issues().len(), 1);
    }

    #[test]
    fn voids_are_acknowledged_and_summarised() {
        let void = run(
            &Commands::Void {
                input: None,
                block_count: Some(3),
            },
            &config(),
            &record_json(),
        )
        .expect("void");
        let ack = run(&Commands::Acknowledge { input: None }, &config(), &void).expect("ack");
        let parsed = Envelope::parse(&ack, ParseMode::Strict).expect("parses");
        assert_eq!(parsed.body(), &MessageBody::Acknowledgement { block_count: Some(3) });

        let summary = run(
            &Commands::ParseMessage {
                input: None,
                record: false,
            },
            &config(),
            &ack,
        )
        .expect("summary");
        assert!(summary.contains("http://nchs.cdc.gov/bfdr_acknowledgement"));
        assert!(summary.contains("block count: 3"));
        assert!(summary.contains("cert_no:     77"));

        let err = run(
            &Commands::ParseMessage {
                input: None,
                record: true,
            },
            &config(),
            &ack,
        )
        .expect_err("acks carry no record");
        assert!(err.to_string().contains("no record"));
    }

    #[test]
    fn inspection_lists_every_position() {
        let line = " ".repeat(ije::LINE_LENGTH);
        let output = run(&Commands::InspectIje { input: None }, &config(), &line).expect("lists");
        assert_eq!(
            output.lines().count(),
            ije::Layout::natality().slots().len()
        );
        assert!(list_fields().contains("birthWeight"));
    }
}
