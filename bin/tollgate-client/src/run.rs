//! A single bidding agent with a refilling wallet.

use crate::{cli::RunArgs, exchange};
use eyre::Result;
use reqwest::StatusCode;
use std::sync::Arc;
use tollgate_wallet::{BidDecision, BiddingAgent, TokenGenerator};
use tracing::{debug, error, info, warn};

#[derive(Debug, Default)]
struct Tally {
    completed: u64,
    rejected: u64,
    skipped: u64,
    failed: u64,
    tokens_used: u64,
}

pub(crate) async fn run(args: RunArgs) -> Result<()> {
    let wallet = Arc::new(args.wallet.build()?);
    let distribution = args.refill.distribution()?;
    let generator = TokenGenerator::spawn(Arc::clone(&wallet), distribution);
    let agent = BiddingAgent::new(wallet, args.bid.build());
    let client = reqwest::Client::builder().build()?;

    info!(
        url = %args.target,
        balance = agent.wallet().balance(),
        cap = agent.wallet().cap(),
        strategy = agent.strategy().name(),
        refill = distribution.name(),
        requests = args.requests,
        "starting client"
    );

    let mut tally = Tally::default();
    for request in 1..=args.requests {
        match agent.prepare_bid() {
            BidDecision::EmptyWallet => {
                tally.skipped += 1;
                debug!(request, "wallet empty, waiting for refill");
            }
            BidDecision::BelowLastPrice { bid, last_price } => {
                tally.skipped += 1;
                info!(request, bid, last_price, "bid below last price, not sending");
            }
            BidDecision::Submit(bid) => match exchange::send(&client, &args.target, bid).await {
                Ok(exchange) => {
                    if let Some(price) = exchange.price {
                        agent.observe_price(price);
                    }
                    match exchange.status {
                        StatusCode::TOO_MANY_REQUESTS => {
                            tally.rejected += 1;
                            warn!(
                                request,
                                bid,
                                price = ?exchange.price,
                                "rejected: price above bid"
                            );
                        }
                        status if status.is_success() => {
                            tally.completed += 1;
                            let total_tokens = exchange.usage.map(|usage| usage.total_tokens);
                            tally.tokens_used += total_tokens.unwrap_or_default();
                            info!(
                                request,
                                bid,
                                price = ?exchange.price,
                                messages = exchange.messages,
                                total_tokens = ?total_tokens,
                                elapsed_ms = exchange.elapsed.as_millis() as u64,
                                balance = agent.wallet().balance(),
                                "completed"
                            );
                        }
                        status => {
                            tally.failed += 1;
                            warn!(request, bid, %status, "request failed");
                        }
                    }
                }
                Err(err) => {
                    tally.failed += 1;
                    error!(request, %err, "request error");
                }
            },
        }

        if request < args.requests {
            tokio::time::sleep(args.think.sample()).await;
        }
    }

    generator.shutdown().await;
    info!(
        completed = tally.completed,
        rejected = tally.rejected,
        skipped = tally.skipped,
        failed = tally.failed,
        tokens_used = tally.tokens_used,
        balance = agent.wallet().balance(),
        "client finished"
    );
    Ok(())
}
