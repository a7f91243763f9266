use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::sync::Arc;

use event_classifier::{
    logging, ClassifierConfig, EntryType, EventClassifier, EventDescriptor, TracingNotifier,
};

const USAGE: &str = "\
Usage: event-classifier <command> [args]

Commands:
  classify <event_type> <event_subtype> [--counterparty NAME] [--entry-type TYPE]
           [--exit] [--no-fallback-label] [--json]
  types                 List event types
  subtypes              List event subtypes
  accounting [KEY]      Show accounting event types (or one of them)
  dump                  Print the mapping table as JSON

Mappings come from the backend (EVENT_CLASSIFIER_BACKEND_URL) unless
EVENT_CLASSIFIER_MAPPINGS points at a local JSON file.";

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();

    let Some(command) = args.first() else {
        println!("{}", USAGE);
        return Ok(());
    };

    if command == "help" || command == "--help" || command == "-h" {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = ClassifierConfig::load()?;
    logging::init(&config.log_filter);

    let classifier = EventClassifier::new(config.fetcher(), Arc::new(TracingNotifier), config.translator()?);
    classifier
        .refresh()
        .await
        .context("Could not load history event mappings")?;

    match command.as_str() {
        "classify" => run_classify(&classifier, &args[1..]),
        "types" => {
            for entry in classifier.event_types_data() {
                println!("{:<24} {}", entry.identifier, entry.label);
            }
            Ok(())
        }
        "subtypes" => {
            for entry in classifier.event_subtypes_data() {
                println!("{:<24} {}", entry.identifier, entry.label);
            }
            Ok(())
        }
        "accounting" => {
            match args.get(1) {
                Some(key) => {
                    let detail = classifier.accounting_event_data(key);
                    println!("{} ({}) {}", detail.label, detail.identifier, detail.icon);
                }
                None => {
                    for entry in classifier.accounting_events_data() {
                        println!(
                            "{:<24} {:<28} {}",
                            entry.identifier,
                            entry.label,
                            entry.icon.unwrap_or_default()
                        );
                    }
                }
            }
            Ok(())
        }
        "dump" => {
            println!("{}", serde_json::to_string_pretty(classifier.snapshot().as_ref())?);
            Ok(())
        }
        other => bail!("Unknown command: {}\n\n{}", other, USAGE),
    }
}

fn run_classify(classifier: &EventClassifier, args: &[String]) -> Result<()> {
    let request = ClassifyRequest::parse(args)?;
    let result = classifier.event_type_data(&request.descriptor, request.show_fallback_label);

    if request.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if result.is_fallback() {
        println!("? {} (unmapped)", result.label);
    } else {
        println!("✓ {} [{}]", result.label, result.identifier);
    }
    println!("  icon:      {}", result.icon);
    println!("  color:     {}", result.color.as_deref().unwrap_or("-"));
    println!("  direction: {}", result.direction);

    Ok(())
}

#[derive(Debug)]
struct ClassifyRequest {
    descriptor: EventDescriptor,
    show_fallback_label: bool,
    json: bool,
}

impl ClassifyRequest {
    fn parse(args: &[String]) -> Result<Self> {
        let mut positional = Vec::new();
        let mut counterparty = None;
        let mut entry_type = None;
        let mut is_exit = false;
        let mut show_fallback_label = true;
        let mut json = false;

        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--counterparty" => {
                    counterparty = Some(iter.next().ok_or_else(|| anyhow!("--counterparty needs a value"))?.clone());
                }
                "--entry-type" => {
                    let raw = iter.next().ok_or_else(|| anyhow!("--entry-type needs a value"))?;
                    entry_type = Some(raw.parse::<EntryType>().map_err(|e| anyhow!(e))?);
                }
                "--exit" => is_exit = true,
                "--no-fallback-label" => show_fallback_label = false,
                "--json" => json = true,
                flag if flag.starts_with("--") => bail!("Unknown option: {}", flag),
                value => positional.push(value.to_string()),
            }
        }

        let [event_type, event_subtype]: [String; 2] = positional
            .try_into()
            .map_err(|_| anyhow!("classify needs <event_type> <event_subtype>"))?;

        let mut descriptor = EventDescriptor::new(event_type, event_subtype).exiting(is_exit);
        descriptor.counterparty = counterparty;
        descriptor.entry_type = entry_type;

        Ok(ClassifyRequest {
            descriptor,
            show_fallback_label,
            json,
        })
    }
}
