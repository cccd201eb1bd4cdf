use clap::Parser;
use console::style;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};

use autodiscovery::config::AppConfig;
use autodiscovery::contracts::TextFileContracts;
use autodiscovery::discoverer::DefaultDiscovererFactory;
use autodiscovery::domain::RegistryEntry;
use autodiscovery::error::AppError;
use autodiscovery::http::ReqwestHttpClient;
use autodiscovery::mirror::{HttpRemoteMirror, LocalMirror};
use autodiscovery::registry::JsonFileRegistry;
use autodiscovery::usecase::DiscoveryUseCase;

use super::{Cli, Command};

pub async fn run() -> anyhow::Result<i32> {
    let cli = Cli::parse();
    let config = AppConfig::from_env();

    let http = ReqwestHttpClient::new(
        &config.user_agent,
        config.http_head_timeout,
        config.http_get_timeout,
        config.http_retries,
        config.ssl_verify,
    );
    let contracts = TextFileContracts::new(config.contracts_path.clone());
    let registry = JsonFileRegistry::new(config.registry_path.clone());
    let factory = DefaultDiscovererFactory;

    let remote = if config.remote_mirror_enabled() {
        Some(HttpRemoteMirror::new(
            config.remote_endpoint.clone().unwrap(),
            config.remote_token.clone(),
        ))
    } else {
        None
    };
    let mut mirror = LocalMirror::new(config.mirror_root.clone(), &http);
    if let Some(remote) = remote.as_ref() {
        mirror = mirror.with_remote(remote);
    }
    if let Ok(swept) = mirror.sweep_stray_temp_files().await {
        if swept > 0 {
            tracing::info!(swept, "removed stray temp files from a previous run");
        }
    }

    let use_case = DiscoveryUseCase::new(&contracts, &registry, &http, &factory, &mirror);

    match cli.command {
        Command::Discover { key, mirror, no_mirror, fast, json } => {
            let mirror_flag = resolve_mirror_flag(mirror, no_mirror);
            run_discover(&use_case, &key, mirror_flag, fast, json).await
        }
        Command::Sync { all, key, fast, json } => run_sync(&use_case, &contracts, all, key, fast, json, config.sync_concurrency).await,
        Command::Validate { key } => run_validate(&use_case, &key).await,
        Command::Show { key, json } => run_show(&registry, key, json).await,
        Command::List => run_list(&contracts),
    }
}

fn resolve_mirror_flag(mirror: bool, no_mirror: bool) -> Option<bool> {
    match (mirror, no_mirror) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

async fn run_discover(
    use_case: &DiscoveryUseCase<'_>,
    key: &str,
    mirror_flag: Option<bool>,
    fast: bool,
    json: bool,
) -> anyhow::Result<i32> {
    match use_case.execute(key, mirror_flag, fast).await {
        Ok(entry) => {
            print_entry(&entry, json);
            Ok(0)
        }
        Err(err) => {
            print_error(&err, json);
            Ok(1)
        }
    }
}

async fn run_sync(
    use_case: &DiscoveryUseCase<'_>,
    contracts: &TextFileContracts,
    all: bool,
    keys: Vec<String>,
    fast: bool,
    json: bool,
    concurrency: usize,
) -> anyhow::Result<i32> {
    use autodiscovery::ports::ContractsPort;

    let targets = if all { contracts.all_keys()? } else { keys };
    if targets.is_empty() {
        eprintln!("{}", style("no keys to sync (pass --all or --key K)").red());
        return Ok(1);
    }

    let pb = ProgressBar::new(targets.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let results: Vec<(String, Result<RegistryEntry, AppError>)> = stream::iter(targets.into_iter())
        .map(|key| {
            let pb = &pb;
            async move {
                let result = use_case.execute(&key, None, fast).await;
                pb.inc(1);
                (key, result)
            }
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;
    pb.finish_and_clear();

    if json {
        let rendered: Vec<serde_json::Value> = results
            .iter()
            .map(|(key, result)| match result {
                Ok(entry) => serde_json::json!({"key": key, "ok": true, "entry": entry}),
                Err(err) => serde_json::json!({"key": key, "ok": false, "error": err.to_string()}),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rendered)?);
    } else {
        for (key, result) in &results {
            match result {
                Ok(entry) => println!("{} {key} -> {} ({})", style("\u{2713}").green(), entry.version, entry.status_label()),
                Err(err) => {
                    println!("{} {key} -> {err}", style("\u{2717}").red());
                }
            }
        }
    }

    let any_failed = results.iter().any(|(_, r)| r.is_err());
    Ok(if any_failed { 1 } else { 0 })
}

async fn run_validate(use_case: &DiscoveryUseCase<'_>, key: &str) -> anyhow::Result<i32> {
    match use_case.validate_source(key).await {
        Ok(entry) => {
            print_entry(&entry, false);
            Ok(if entry.status_label() == "ok" { 0 } else { 1 })
        }
        Err(err) => {
            print_error(&err, false);
            Ok(1)
        }
    }
}

async fn run_show(registry: &JsonFileRegistry, key: Option<String>, json: bool) -> anyhow::Result<i32> {
    use autodiscovery::ports::RegistryPort;

    match key {
        Some(key) => match registry.get(&key).await? {
            Some(entry) => print_entry(&entry, json),
            None => println!("no registry entry for '{key}'"),
        },
        None => {
            let all = registry.all().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&all)?);
            } else {
                for entry in &all {
                    println!("{:<24} {:<14} {}", entry.key, entry.version, entry.status_label());
                }
            }
        }
    }
    Ok(0)
}

fn run_list(contracts: &TextFileContracts) -> anyhow::Result<i32> {
    use autodiscovery::ports::ContractsPort;
    for key in contracts.all_keys()? {
        println!("{key}");
    }
    Ok(0)
}

fn print_entry(entry: &RegistryEntry, json: bool) {
    if json {
        println!("{}", serde_json::to_string_pretty(entry).expect("registry entry always serializes"));
    } else {
        println!(
            "{} {} {} {} ({})",
            entry.key,
            entry.version,
            entry.filename,
            style(format!("{:.1}KB", entry.size_kb)).dim(),
            entry.status_label()
        );
    }
}

fn print_error(err: &AppError, json: bool) {
    if json {
        println!("{}", serde_json::json!({"ok": false, "error": err.to_string(), "kind": err.kind()}));
    } else {
        eprintln!("{} {err}", style("error:").red().bold());
    }
}
