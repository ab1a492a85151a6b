use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use bank_account::config::AppConfig;
use bank_account::domain::account::{AccountCommand, AccountCommandHandler, AccountEvent, AccountId};
use bank_account::domain::{Clock, Money, SystemClock};
use bank_account::event_sourcing::InMemoryOutbox;
use bank_account::metrics::Metrics;
use bank_account::repository::{InMemoryAccountRepository, InMemoryOperationRepository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Missing .env is fine
    dotenv::dotenv().ok();

    let config = AppConfig::from_env().context("invalid configuration")?;

    // RUST_LOG wins over BANK_LOG_FILTER
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .init();

    tracing::info!("Starting bank account demo");

    // === 1. Wire in-memory adapters ===
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let operations = Arc::new(InMemoryOperationRepository::new());
    let accounts = Arc::new(InMemoryAccountRepository::new(operations.clone(), clock.clone()));
    let outbox = Arc::new(InMemoryOutbox::<AccountEvent>::new("bank-account-events"));
    let metrics = Arc::new(Metrics::new()?);

    let handler = AccountCommandHandler::new(accounts, operations, outbox.clone(), metrics.clone(), clock)
        .with_retry(config.retry.clone());

    // === 2. Run the scenarios ===
    savings_ceiling_scenario(&handler, &config).await?;
    overdraft_scenario(&handler, &config).await?;
    insufficient_funds_scenario(&handler, &config).await?;

    // === 3. Report ===
    for line in outbox.to_json_lines().await? {
        tracing::debug!(topic = outbox.topic_name(), payload = %line, "Outbox entry");
    }

    let published = outbox.drain().await;
    tracing::info!(events = published.len(), "Outbox drained");
    for envelope in &published {
        tracing::debug!(
            aggregate_id = %envelope.aggregate_id,
            sequence_number = envelope.sequence_number,
            event_type = %envelope.event_type,
            "Published event"
        );
    }

    println!("{}", metrics.encode_text()?);
    tracing::info!("Demo finished");
    Ok(())
}

/// Deposits up to the ceiling, then one more deposit that must be refused
async fn savings_ceiling_scenario(handler: &AccountCommandHandler, config: &AppConfig) -> anyhow::Result<()> {
    let opened = handler
        .handle(AccountCommand::OpenSavings { ceiling: config.demo_ceiling })
        .await?;
    let account_id = opened.account_id;

    let filled = handler
        .handle(AccountCommand::Deposit { account_id, amount: config.demo_ceiling })
        .await?;
    tracing::info!(account_id = %account_id, balance = %filled.balance, "Savings account filled to its ceiling");

    match handler
        .handle(AccountCommand::Deposit { account_id, amount: Money::parse("0.01")? })
        .await
    {
        Ok(_) => anyhow::bail!("deposit above the ceiling was accepted"),
        Err(error) => tracing::info!(
            account_id = %account_id,
            status = error.status_code(),
            error = %error,
            "Deposit above ceiling refused"
        ),
    }

    report_month(handler, account_id).await
}

/// Withdraws exactly down to the overdraft limit
async fn overdraft_scenario(handler: &AccountCommandHandler, config: &AppConfig) -> anyhow::Result<()> {
    let opened = handler
        .handle(AccountCommand::OpenCurrent { overdraft: config.demo_overdraft })
        .await?;
    let account_id = opened.account_id;

    let outcome = handler
        .handle(AccountCommand::Withdraw { account_id, amount: -config.demo_overdraft })
        .await;

    match outcome {
        Ok(outcome) => tracing::info!(
            account_id = %account_id,
            balance = %outcome.balance,
            "Withdrawal down to the overdraft limit accepted"
        ),
        // A zero overdraft makes the withdrawal amount zero
        Err(error) => tracing::warn!(account_id = %account_id, error = %error, "Withdrawal refused"),
    }

    report_month(handler, account_id).await
}

/// Withdraws one cent past the overdraft limit
async fn insufficient_funds_scenario(handler: &AccountCommandHandler, config: &AppConfig) -> anyhow::Result<()> {
    let opened = handler
        .handle(AccountCommand::OpenCurrent { overdraft: config.demo_overdraft })
        .await?;
    let account_id = opened.account_id;
    let amount = (-config.demo_overdraft).add(&Money::parse("0.01")?);

    match handler.handle(AccountCommand::Withdraw { account_id, amount }).await {
        Ok(_) => anyhow::bail!("withdrawal past the overdraft limit was accepted"),
        Err(error) => tracing::info!(
            account_id = %account_id,
            status = error.status_code(),
            error = %error,
            "Withdrawal past overdraft refused"
        ),
    }

    report_month(handler, account_id).await
}

async fn report_month(handler: &AccountCommandHandler, account_id: AccountId) -> anyhow::Result<()> {
    let operations = handler.monthly_operations(account_id).await?;
    for operation in &operations {
        tracing::info!(
            account_id = %account_id,
            kind = %operation.kind(),
            amount = %operation.amount(),
            at = %operation.at(),
            "Operation this month"
        );
    }
    Ok(())
}
