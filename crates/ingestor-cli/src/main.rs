//! ingestor - ログインイベントの取り込みプロセス
//!
//! 1. 設定を読み込み（INGESTOR_*）、tracing を初期化
//! 2. 永続化先とキューを選ぶ（PostgreSQL / in-memory）
//! 3. ConsumerLoop を spawn し、SIGINT / SIGTERM で停止して合計をログに出す
//! 4. consumer のタスクが先に死んだら non-zero で終了する

mod demo;

use std::sync::Arc;

use anyhow::{Context, Result};
use ingestor_core::app::ConsumerLoopBuilder;
use ingestor_core::config::{IngestConfig, QueueBackend};
use ingestor_core::impls::{
    create_pool, ping, InMemoryDeliveryQueue, InMemoryLoginRepository, PgPool,
    PostgresDeliveryQueue, PostgresLoginRepository,
};
use ingestor_core::ports::{DeliveryQueue, LoginRepository};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(log_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm =
            signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.context("failed to listen for ctrl-c")?,
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = IngestConfig::from_env().context("failed to load configuration")?;
    init_tracing(&config.log_level);

    info!(
        queue_backend = ?config.queue_backend,
        batch_size = config.batch_size,
        max_receive_count = config.max_receive_count,
        "ingestor starting"
    );

    if !config.startup_delay().is_zero() {
        info!(seconds = config.startup_delay_secs, "waiting before first receive");
        tokio::time::sleep(config.startup_delay()).await;
    }

    let pool: Option<PgPool> = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url, config.db_max_connections, config.db_acquire_timeout())
                .context("invalid database_url")?;
            if let Err(err) = ping(&pool).await {
                // 起動時は失敗しても続行: persist ごとに再接続し、失敗は再配送に回る
                warn!(error = %err, "database not reachable yet");
            }
            Some(pool)
        }
        None => None,
    };

    let repository: Arc<dyn LoginRepository> = match &pool {
        Some(pool) => Arc::new(
            PostgresLoginRepository::new(pool.clone(), &config.table_name)
                .context("invalid table_name")?,
        ),
        None => {
            warn!("database_url not set; logins are kept in memory only");
            Arc::new(InMemoryLoginRepository::new())
        }
    };

    let (producer_tx, producer_rx) = watch::channel(false);
    let mut producer = None;

    let queue: Arc<dyn DeliveryQueue> = match (config.queue_backend, &pool) {
        (QueueBackend::Postgres, Some(pool)) => Arc::new(
            PostgresDeliveryQueue::new(
                pool.clone(),
                &config.queue_table,
                config.visibility_timeout(),
            )
            .context("invalid queue_table")?,
        ),
        (QueueBackend::Postgres, None) => {
            anyhow::bail!("queue_backend=postgres requires database_url")
        }
        (QueueBackend::Memory, _) => {
            let queue = Arc::new(InMemoryDeliveryQueue::with_visibility_timeout(
                config.visibility_timeout(),
            ));
            if let Some(interval_ms) = config.demo_interval_ms {
                producer = Some(tokio::spawn(demo::run_demo_producer(
                    queue.clone(),
                    interval_ms,
                    producer_rx,
                )));
            }
            queue
        }
    };

    let consumer = ConsumerLoopBuilder::from_config(&config)
        .queue(queue)
        .repository(repository)
        .build()
        .context("failed to build consumer loop")?;
    let mut handle = consumer.spawn();

    let exited_early = tokio::select! {
        signal = shutdown_signal() => {
            signal?;
            info!("shutdown requested");
            None
        }
        exited = handle.wait() => Some(exited),
    };

    let _ = producer_tx.send(true);
    if let Some(producer) = producer {
        let _ = producer.await;
    }

    let totals = match exited_early {
        None => handle
            .shutdown_and_join()
            .await
            .context("consumer task failed")?,
        Some(exited) => {
            let totals = exited.context("consumer task failed")?;
            error!(
                acknowledged = totals.acknowledged,
                "consumer loop stopped without a shutdown request"
            );
            anyhow::bail!("consumer loop stopped unexpectedly");
        }
    };
    info!(
        received = totals.received,
        acknowledged = totals.acknowledged,
        quarantined_invalid = totals.quarantined_invalid,
        quarantined_after_retries = totals.quarantined_after_retries,
        left_for_redelivery = totals.left_for_redelivery,
        delete_failures = totals.delete_failures,
        receive_failures = totals.receive_failures,
        "ingestor stopped"
    );

    if let Some(pool) = pool {
        pool.close().await;
    }
    Ok(())
}
