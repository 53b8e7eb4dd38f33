use std::collections::BTreeMap;

use anyhow::{bail, Context};
use colored::Colorize;
use serde_json::json;

use edmio_format::{collection_table, write_sample, ColumnReader, SampleSpec};
use edmio_source::{EventSource, FetchStatus, SourceConfig};
use edmio_store::Event;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Info(args) => cmd_info(args, cli.format),
        Command::Dump(args) => cmd_dump(args, cli.format),
        Command::Generate(args) => cmd_generate(args, cli.format),
    }
}

fn cmd_info(args: InfoArgs, format: OutputFormat) -> anyhow::Result<()> {
    let reader = ColumnReader::open(&args.file)
        .with_context(|| format!("opening {}", args.file.display()))?;

    match format {
        OutputFormat::Json => {
            let collections: Vec<_> = reader
                .collections()
                .iter()
                .map(|c| {
                    json!({
                        "id": c.id,
                        "name": c.name,
                        "type": c.type_name,
                        "kind": format!("{:?}", c.kind),
                    })
                })
                .collect();
            let out = json!({
                "path": args.file.display().to_string(),
                "version": reader.version().to_string(),
                "events": reader.num_events(),
                "collections": collections,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            println!("{} {}", "File:".bold(), args.file.display());
            println!("{} {}", "Schema version:".bold(), reader.version().to_string().cyan());
            println!("{} {}", "Events:".bold(), reader.num_events().to_string().yellow());
            println!();
            print!("{}", collection_table(&reader));
        }
    }
    Ok(())
}

fn source_config(args: &DumpArgs) -> anyhow::Result<SourceConfig> {
    let mut config = match &args.config {
        Some(path) => SourceConfig::load(path)?,
        None => SourceConfig::default(),
    };
    if !args.include.is_empty() {
        config = config.with_include(args.include.iter().cloned());
    }
    if !args.exclude.is_empty() {
        config = config.with_exclude(args.exclude.iter().cloned());
    }
    if args.recycle {
        config = config.with_recycle(true);
    }
    Ok(config)
}

fn cmd_dump(args: DumpArgs, format: OutputFormat) -> anyhow::Result<()> {
    let config = source_config(&args)?;
    if config.recycle_forever && args.limit.is_none() {
        bail!("--recycle streams forever; pass --limit");
    }

    let mut source = EventSource::new(args.file.to_string_lossy(), config);
    source.open()?;

    let mut event = Event::new();
    let mut count = 0u64;
    while args.limit.map_or(true, |limit| count < limit) {
        if source.get_event(&mut event)? == FetchStatus::EndOfStream {
            break;
        }
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string(&event_json(&event, args.records))?),
            OutputFormat::Text => print_event(&event, count, args.records),
        }
        source.finish_event(&mut event);
        count += 1;
    }

    if format == OutputFormat::Text {
        println!(
            "{} {} event(s) from {}",
            "✓".green().bold(),
            count,
            args.file.display()
        );
    }
    Ok(())
}

fn print_event(event: &Event, index: u64, records: usize) {
    println!(
        "{} {}  run {}  event {}",
        "event".bold(),
        index.to_string().yellow(),
        event.run_number(),
        event.event_number()
    );
    let width = event.collection_names().map(str::len).max().unwrap_or(0);
    for name in event.collection_names() {
        let views = event.get(name).unwrap_or_default();
        println!("  {:<width$}  {}", name.cyan(), views.len());
        for view in views.iter().take(records) {
            let Some(obj) = event.resolve(view) else { continue };
            let fields: Vec<String> = obj
                .fields()
                .into_iter()
                .map(|(field, value)| format!("{field}={value}"))
                .collect();
            println!("    {} {}", format!("[{}]", view.id()).dimmed(), fields.join(" "));
        }
    }
}

fn event_json(event: &Event, records: usize) -> serde_json::Value {
    let mut collections = BTreeMap::new();
    for name in event.collection_names() {
        let views = event.get(name).unwrap_or_default();
        let sample: Vec<_> = views
            .iter()
            .take(records)
            .filter_map(|view| event.resolve(view))
            .map(|obj| {
                let fields: serde_json::Map<String, serde_json::Value> = obj
                    .fields()
                    .into_iter()
                    .map(|(field, value)| (field.to_string(), json!(value.to_string())))
                    .collect();
                json!({ "id": obj.id().to_string(), "fields": fields })
            })
            .collect();
        collections.insert(name.to_string(), json!({ "count": views.len(), "records": sample }));
    }
    json!({
        "run": event.run_number(),
        "event": event.event_number(),
        "collections": collections,
    })
}

fn cmd_generate(args: GenerateArgs, format: OutputFormat) -> anyhow::Result<()> {
    let layout = SampleSpec {
        events: args.events,
        particles: args.particles,
        hits: args.hits,
        run_number: args.run,
        seed: args.seed,
    };
    let summary = write_sample(&args.file, &layout)
        .with_context(|| format!("writing {}", args.file.display()))?;

    match format {
        OutputFormat::Json => {
            let out = json!({
                "path": summary.path.display().to_string(),
                "events": summary.event_count,
                "collections": summary.collection_count,
                "checksum": hex::encode(summary.checksum),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            println!(
                "{} Wrote {} event(s), {} collection(s) to {}",
                "✓".green().bold(),
                summary.event_count,
                summary.collection_count,
                summary.path.display().to_string().bold()
            );
            println!("  TOC checksum: {}", hex::encode(&summary.checksum[..8]).dimmed());
        }
    }
    Ok(())
}
