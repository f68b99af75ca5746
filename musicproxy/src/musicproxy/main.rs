use anyhow::{anyhow, Result};
use clap::value_parser;
use clap::{Arg, ArgAction, ArgMatches, Command};
use log::*;
use migration::Migrator;
use musicproxy::cli;
use musicproxy::config::*;
use musicproxy::music_rpc::db_ops::DbOpsImpl;
use musicproxy::music_rpc::rpc;
use musicproxy::music_rpc::service::MusicWorkflowService;
use musicproxy::music_rpc::syncer::MusicSyncer;
use musicproxy::provider::{HttpFetcher, SunoClient};
use musicproxy::resource;
use musicproxy::utils::ensure_db_file;
use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::migrator::MigratorTrait;
use simplelog::*;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::ctrl_c;
use tokio::signal::unix::{signal, SignalKind};

#[tokio::main()]
async fn main() {
    let app_m = Command::new("musicproxy")
        .version("0.1.0")
        .args(&[
            Arg::new("url")
                .long("url")
                .env("MUSICPROXY_URL")
                .global(true)
                .default_value("127.0.0.1:18888")
                .required(false)
                .help("specify url for provide service api service"),
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .env("MUSICPROXY_LOG_LEVEL")
                .default_value("info")
                .help("set log level for application"),
        ])
        .arg_required_else_help(true)
        .subcommand(
            Command::new("run")
                .about("run daemon for provide service")
                .args(&[
                    Arg::new("db-dsn")
                        .long("db-dsn")
                        .env("MUSICPROXY_DSN")
                        .default_value("sqlite://musicproxy.db")
                        .help("specify sqlite or mysql dsn to store music tasks"),
                    Arg::new("debug-sql")
                        .long("debug-sql")
                        .env("MUSICPROXY_DEBUG_SQL")
                        .required(false)
                        .action(ArgAction::SetTrue)
                        .help("print sql to debug"),
                    Arg::new("provider-url")
                        .long("provider-url")
                        .env("MUSICPROXY_PROVIDER_URL")
                        .default_value("http://127.0.0.1:3000")
                        .help("base url of the suno-api compatible provider"),
                    Arg::new("provider-token")
                        .long("provider-token")
                        .env("MUSICPROXY_PROVIDER_TOKEN")
                        .default_value("")
                        .help("bearer token sent to the provider, empty for none"),
                    Arg::new("platform")
                        .long("platform")
                        .env("MUSICPROXY_PLATFORM")
                        .default_value(DEFAULT_PLATFORM)
                        .help("platform recorded on tasks that do not name one"),
                    Arg::new("resource-type")
                        .long("resource-type")
                        .env("MUSICPROXY_RESOURCE_TYPE")
                        .default_value("fs")
                        .help("where re-hosted media is kept (db, fs)"),
                    Arg::new("fs-resource-path")
                        .long("fs-resource-path")
                        .env("MUSICPROXY_FS_RESOURCE_PATH")
                        .default_value("resources")
                        .help("when resource type is fs, media files are written under this path"),
                    Arg::new("sync-interval")
                        .long("sync-interval")
                        .env("MUSICPROXY_SYNC_INTERVAL")
                        .default_value(DEFAULT_SYNC_INTERVAL)
                        .help("how often in-progress tasks are synced, e.g. 30s, 5m"),
                    Arg::new("sync-batch-size")
                        .long("sync-batch-size")
                        .env("MUSICPROXY_SYNC_BATCH_SIZE")
                        .value_parser(value_parser!(usize))
                        .default_value("36")
                        .help("task ids per provider status lookup"),
                    Arg::new("disable-sync")
                        .long("disable-sync")
                        .env("MUSICPROXY_DISABLE_SYNC")
                        .required(false)
                        .takes_value(false)
                        .action(ArgAction::SetTrue)
                        .help("do not sync in-progress tasks periodically"),
                ]),
        )
        .subcommand(cli::music_cmds())
        .get_matches();

    let exec_result: Result<()> = match app_m.subcommand() {
        Some(("run", sub_m)) => start_server(sub_m).await,
        Some(("music", sub_m)) => cli::music_command(sub_m).await,
        _ => Ok(()),
    };

    if let Err(e) = exec_result {
        println!("{:?}", e);
    }
}

fn string_arg(sub_m: &ArgMatches, name: &str) -> Result<String> {
    sub_m
        .get_one::<String>(name)
        .cloned()
        .ok_or_else(|| anyhow!("{} flag not found", name))
}

async fn start_server(sub_m: &ArgMatches) -> Result<()> {
    let debug_sql = *sub_m
        .get_one::<bool>("debug-sql")
        .ok_or_else(|| anyhow!("debug-sql flag not found"))?;
    let disable_sync = *sub_m
        .get_one::<bool>("disable-sync")
        .ok_or_else(|| anyhow!("disable-sync flag not found"))?;
    let sync_batch_size = *sub_m
        .get_one::<usize>("sync-batch-size")
        .ok_or_else(|| anyhow!("sync-batch-size flag not found"))?;
    let token = string_arg(sub_m, "provider-token")?;

    let cfg = ServiceConfig::new(
        string_arg(sub_m, "url")?,
        string_arg(sub_m, "db-dsn")?,
        debug_sql,
        string_arg(sub_m, "log-level")?,
        string_arg(sub_m, "resource-type")?,
        string_arg(sub_m, "fs-resource-path")?,
        ProviderConfig {
            url: string_arg(sub_m, "provider-url")?,
            token: Some(token).filter(|t| !t.is_empty()),
            platform: string_arg(sub_m, "platform")?,
        },
        disable_sync,
        string_arg(sub_m, "sync-interval")?,
        sync_batch_size,
    )?;

    let lv = LevelFilter::from_str(cfg.log_level.as_str())?;
    TermLogger::init(
        lv,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;

    ensure_db_file(&cfg.db_dsn).await?;
    let mut opt = ConnectOptions::new(cfg.db_dsn.clone());
    opt.max_connections(10)
        .min_connections(5)
        .sqlx_logging(cfg.debug_sql)
        .max_lifetime(Duration::from_secs(120))
        .connect_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(8));

    let db_conn = Database::connect(opt).await?;
    Migrator::up(&db_conn, None).await?;
    let arc_pool = Arc::new(DbOpsImpl::new(db_conn));

    let resource: Arc<dyn resource::ResourceOp + Send + Sync> = match cfg.resource {
        Resource::Db => Arc::new(resource::DbResource::new(arc_pool.clone())),
        Resource::FS(ref path) => Arc::new(resource::FileResource::new(path.clone())),
    };
    let provider = Arc::new(SunoClient::new(
        cfg.provider.url.clone(),
        cfg.provider.token.clone(),
    )?);
    info!("use provider {} on platform {}", cfg.provider.url, cfg.provider.platform);

    let service = Arc::new(
        MusicWorkflowService::new(
            arc_pool,
            provider,
            Arc::new(HttpFetcher::new()),
            resource,
            cfg.provider.platform.clone(),
        )
        .with_sync_batch_size(cfg.sync_batch_size),
    );

    let rpc_module = rpc::register(service.clone());
    let (server_addr, handle) = rpc::start_api(cfg.url.as_str(), rpc_module)?;
    info!("starting listening {}", server_addr);

    let syncer = if cfg.disable_sync {
        info!("periodic sync disabled");
        None
    } else {
        Some(MusicSyncer::new(service, cfg.sync_interval).start())
    };

    let mut sig_int = signal(SignalKind::interrupt())?;
    let mut sig_term = signal(SignalKind::terminate())?;

    tokio::select! {
        _ = sig_int.recv() => info!("receive SIGINT"),
        _ = sig_term.recv() => info!("receive SIGTERM"),
        _ = ctrl_c() => info!("receive Ctrl C"),
    }
    if let Some(syncer) = syncer {
        syncer.abort();
    }
    handle.stop()?;
    info!("Shutdown program");
    Ok(())
}
