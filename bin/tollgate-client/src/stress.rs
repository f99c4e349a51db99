//! Fixed-budget user groups hammering the gateway.

use crate::{
    cli::{StressArgs, ThinkArgs},
    exchange,
};
use eyre::Result;
use reqwest::{Client, StatusCode};
use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};
use tokio::task::JoinSet;
use tracing::{info, warn};
use url::Url;

/// Group name and the bid every member sends.
const GROUPS: [(&str, u64); 3] = [("student", 10), ("engineer", 20), ("vip", 100)];

#[derive(Debug, Default)]
struct GroupStats {
    admitted: AtomicU64,
    rejected: AtomicU64,
    failed: AtomicU64,
}

impl GroupStats {
    fn record(&self, status: Option<StatusCode>) {
        let counter = match status {
            Some(status) if status.is_success() => &self.admitted,
            Some(StatusCode::TOO_MANY_REQUESTS) => &self.rejected,
            _ => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

pub(crate) async fn run(args: StressArgs) -> Result<()> {
    let client = Client::builder().build()?;
    let mut users = JoinSet::new();
    let mut stats = Vec::with_capacity(GROUPS.len());

    for (group, bid) in GROUPS {
        let group_stats = Arc::new(GroupStats::default());
        stats.push((group, bid, Arc::clone(&group_stats)));
        for user in 0..args.users_per_group {
            users.spawn(user_loop(
                client.clone(),
                args.target.clone(),
                group,
                user,
                bid,
                args.think,
                Arc::clone(&group_stats),
            ));
        }
    }

    info!(
        url = %args.target,
        users_per_group = args.users_per_group,
        duration_secs = ?args.duration_secs,
        "stress test started"
    );

    let limit = async {
        match args.duration_secs {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending().await,
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("interrupted"),
        _ = limit => info!("duration elapsed"),
    }
    users.shutdown().await;

    for (group, bid, stats) in stats {
        info!(
            group,
            bid,
            admitted = stats.admitted.load(Ordering::Relaxed),
            rejected = stats.rejected.load(Ordering::Relaxed),
            failed = stats.failed.load(Ordering::Relaxed),
            "group summary"
        );
    }
    Ok(())
}

async fn user_loop(
    client: Client,
    target: Url,
    group: &'static str,
    user: usize,
    bid: u64,
    think: ThinkArgs,
    stats: Arc<GroupStats>,
) {
    loop {
        match exchange::send(&client, &target, bid).await {
            Ok(exchange) => {
                stats.record(Some(exchange.status));
                info!(
                    group,
                    user,
                    bid,
                    status = exchange.status.as_u16(),
                    price = ?exchange.price,
                    elapsed_ms = exchange.elapsed.as_millis() as u64,
                    "request finished"
                );
            }
            Err(err) => {
                stats.record(None);
                warn!(group, user, %err, "request error");
            }
        }
        tokio::time::sleep(think.sample()).await;
    }
}
