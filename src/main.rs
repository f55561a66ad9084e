use std::process;

use bytes::Bytes;
use clap::Parser;
use serde::Serialize;

use staticpress::cache::{CacheConfig, PathOutcome, Publisher, Resource};
use staticpress::config::{self, CliArgs, Command, PublishArgs};
use staticpress::telemetry;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    let settings = match config::load(&args) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("configuration error: {err}");
            process::exit(2);
        }
    };

    if let Err(err) = telemetry::init(&settings.logging) {
        eprintln!("{err}");
        process::exit(2);
    }

    let publisher = match Publisher::new(CacheConfig::from(&settings.cache)) {
        Ok(publisher) => publisher,
        Err(err) => {
            eprintln!("{err}");
            process::exit(2);
        }
    };

    let outcomes = match &args.command {
        Command::Publish(cmd) => run_publish(&publisher, cmd).await,
        Command::Delete(cmd) => publisher.delete_all(to_resources(&cmd.paths)).await,
        Command::RecursiveDelete(cmd) => {
            publisher
                .recursive_delete_all(to_resources(&cmd.paths))
                .await
        }
    };

    report(&outcomes, args.json);
    if outcomes.iter().any(|outcome| outcome.result.is_err()) {
        process::exit(1);
    }
}

async fn run_publish(publisher: &Publisher, cmd: &PublishArgs) -> Vec<PathOutcome> {
    match cmd.content_file.as_ref() {
        Some(file) => {
            if cmd.paths.len() != 1 {
                eprintln!("--content-file requires exactly one path");
                process::exit(2);
            }
            let path = cmd.paths[0].clone();
            let content = match tokio::fs::read(file).await {
                Ok(content) => Bytes::from(content),
                Err(err) => {
                    eprintln!("could not read {}: {err}", file.display());
                    process::exit(2);
                }
            };
            let result = publisher.publish_content(&path, content).await;
            vec![PathOutcome { path, result }]
        }
        None => publisher.publish_all(to_resources(&cmd.paths)).await,
    }
}

fn to_resources(paths: &[String]) -> Vec<Resource> {
    paths.iter().cloned().map(Resource::from).collect()
}

#[derive(Serialize)]
struct ReportEntry<'a> {
    path: &'a str,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn report(outcomes: &[PathOutcome], json: bool) {
    if json {
        let entries: Vec<ReportEntry<'_>> = outcomes
            .iter()
            .map(|outcome| ReportEntry {
                path: &outcome.path,
                ok: outcome.result.is_ok(),
                error: outcome.result.as_ref().err().map(ToString::to_string),
            })
            .collect();
        match serde_json::to_string_pretty(&entries) {
            Ok(rendered) => println!("{rendered}"),
            Err(err) => eprintln!("could not serialize report: {err}"),
        }
        return;
    }

    for outcome in outcomes {
        match &outcome.result {
            Ok(()) => println!("ok    {}", outcome.path),
            Err(err) => println!("fail  {}: {err}", outcome.path),
        }
    }
}
