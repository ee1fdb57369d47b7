//! Scripted session against in-process backends.
//!
//! Exercises the application cache (queries, preload, realtime invalidation)
//! and the interception layer (install, activate, every strategy, offline).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use contabil_cache::cache::{
    cache_key, BroadcastChangeFeed, CacheOptions, CacheService, ChangeEvent, ChangeOperation,
    Priority, Table,
};
use contabil_cache::worker::{
    FetchOutcome, InMemoryNetwork, MemoryCacheStorage, MemoryClientRegistry, Request, Response,
    ServiceWorker, WorkerConfig,
};
use serde_json::json;
use tracing::info;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Run both scripted sessions.
pub async fn run(user: &str, verbose: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(verbose)?;
    runner.log_startup("demo");

    application_cache_session(&runner, user).await?;
    println!();
    interception_session(runner.config().worker_config()).await?;

    Ok(())
}

async fn application_cache_session(runner: &CliRunner, user: &str) -> Result<(), CliError> {
    println!("Application cache");
    println!("=================");

    let feed = Arc::new(BroadcastChangeFeed::new());
    let service = CacheService::start(runner.config().cache_config(user), feed.clone()).await?;
    let cache = service.cache();
    let backend_calls = Arc::new(AtomicUsize::new(0));

    let empresas_key = cache_key(user, "empresas", "list");
    for _ in 0..2 {
        let calls = Arc::clone(&backend_calls);
        let empresas = cache
            .cached_query(
                &empresas_key,
                || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(json!([{"cnpj": "12.345.678/0001-90", "nome": "ACME Ltda"}]))
                },
                CacheOptions::new().with_priority(Priority::High),
            )
            .await
            .map_err(CliError::Config)?;
        println!("  {} -> {}", empresas_key, empresas);
    }
    println!(
        "  backend called {} time(s) for two queries",
        backend_calls.load(Ordering::SeqCst)
    );

    let failed = cache
        .cached_query(
            &cache_key(user, "relatorios", "anual"),
            || async { Err::<serde_json::Value, _>("backend indisponível".to_string()) },
            CacheOptions::new(),
        )
        .await;
    if let Err(e) = failed {
        println!("  failed query propagated: {} (nothing cached)", e);
    }

    let report = service
        .preload_defaults(|key| {
            let key = key.to_string();
            async move { Ok::<_, String>(json!({ "preloaded": key })) }
        })
        .await;
    println!(
        "  preloaded {} key(s), {} failure(s), {} discarded",
        report.loaded.len(),
        report.failed.len(),
        report.discarded.len()
    );

    let recent_docs = format!("{}:documentos:recent", user);
    let row_id = "nfe-000123";
    feed.publish(
        user,
        ChangeEvent::new(Table::Documents, ChangeOperation::Insert, row_id),
    );
    info!(table = %Table::Documents, row_id, "Published change event");

    let invalidated = tokio::time::timeout(Duration::from_secs(2), async {
        while cache.contains(&recent_docs) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .is_ok();
    println!(
        "  documentos insert {} {}",
        if invalidated { "invalidated" } else { "did not invalidate" },
        recent_docs
    );

    println!();
    print!("{}", cache.stats().format());
    service.shutdown().await;
    Ok(())
}

async fn interception_session(config: WorkerConfig) -> Result<(), CliError> {
    println!("Network interception layer");
    println!("==========================");

    let network = Arc::new(InMemoryNetwork::new());
    for url in config
        .static_assets
        .iter()
        .chain(&config.optional_assets)
        .chain(&config.app_routes)
    {
        network.route(url.clone(), Response::ok(format!("<{}>", url)));
    }
    network.route("/app.js", Response::ok("console.log('app')"));
    network.route("/api/empresas", Response::ok(r#"[{"nome":"ACME Ltda"}]"#));

    let clients = Arc::new(MemoryClientRegistry::new());
    clients.open("tab-1");
    let worker = ServiceWorker::new(
        config,
        Arc::clone(&network),
        Arc::new(MemoryCacheStorage::new()),
        clients,
    )?;

    let report = worker.install().await;
    println!(
        "  install: static batch {}, {} optional, {} routes, complete={}",
        if report.static_batch_cached { "cached" } else { "dropped" },
        report.optional_cached.len(),
        report.routes_cached.len(),
        report.is_complete()
    );
    let removed = worker.activate().await;
    println!("  activate: removed {} old bucket(s)", removed.len());

    show(&worker, Request::get("/app.js")).await;
    show(&worker, Request::get("/app.js")).await;
    show(&worker, Request::get("/api/empresas")).await;
    network.route("/api/empresas", Response::ok(r#"[{"nome":"ACME Ltda"},{"nome":"Nova"}]"#));
    show(&worker, Request::get("/api/empresas")).await;
    worker.settle().await;
    show(&worker, Request::get("/api/empresas")).await;
    worker.settle().await;

    network.set_online(false);
    println!("  -- network offline --");
    show(&worker, Request::navigation("/dashboard")).await;
    show(&worker, Request::get("/relatorio.pdf")).await;

    println!();
    println!("  {}", worker.stats().format());
    Ok(())
}

async fn show(worker: &ServiceWorker<InMemoryNetwork>, request: Request) {
    match worker.handle_fetch(&request).await {
        FetchOutcome::Passthrough => println!("  {:<16} passthrough", request.url),
        FetchOutcome::Handled {
            kind,
            strategy,
            served,
        } => println!(
            "  {:<16} {:<12} {:<28} {:?} ({} bytes, status {})",
            request.url,
            kind.to_string(),
            strategy.to_string(),
            served.source,
            served.response.body.len(),
            served.response.status
        ),
    }
}
