use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

// ============================================================================
// Metrics Module - Prometheus metrics for account activity
// ============================================================================
//
// Counts:
// - accepted deposits and withdrawals
// - rejected commands by reason
// - opened accounts by type
// - command latency
// - storage retries
//
// ============================================================================

/// Central metrics registry for the application
pub struct Metrics {
    registry: Registry,

    pub operations_total: IntCounterVec,
    pub operation_rejections_total: IntCounterVec,
    pub accounts_opened_total: IntCounterVec,
    pub command_duration: HistogramVec,
    pub retry_attempts_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let operations_total = IntCounterVec::new(
            Opts::new("bank_operations_total", "Deposits and withdrawals applied"),
            &["kind"],
        )?;
        registry.register(Box::new(operations_total.clone()))?;

        let operation_rejections_total = IntCounterVec::new(
            Opts::new("bank_operation_rejections_total", "Commands rejected by the domain"),
            &["reason"],
        )?;
        registry.register(Box::new(operation_rejections_total.clone()))?;

        let accounts_opened_total = IntCounterVec::new(
            Opts::new("bank_accounts_opened_total", "Accounts opened"),
            &["account_type"],
        )?;
        registry.register(Box::new(accounts_opened_total.clone()))?;

        let command_duration = HistogramVec::new(
            HistogramOpts::new("bank_command_duration_seconds", "Command handling duration")
                .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
            &["command"],
        )?;
        registry.register(Box::new(command_duration.clone()))?;

        let retry_attempts_total = IntCounterVec::new(
            Opts::new("bank_retry_attempts_total", "Storage attempts beyond the first"),
            &["operation"],
        )?;
        registry.register(Box::new(retry_attempts_total.clone()))?;

        Ok(Self {
            registry,
            operations_total,
            operation_rejections_total,
            accounts_opened_total,
            command_duration,
            retry_attempts_total,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_operation(&self, kind: &str) {
        self.operations_total.with_label_values(&[kind]).inc();
    }

    pub fn record_rejection(&self, reason: &str) {
        self.operation_rejections_total.with_label_values(&[reason]).inc();
    }

    pub fn record_account_opened(&self, account_type: &str) {
        self.accounts_opened_total.with_label_values(&[account_type]).inc();
    }

    pub fn observe_command(&self, command: &str, duration_secs: f64) {
        self.command_duration.with_label_values(&[command]).observe(duration_secs);
    }

    /// Called for every attempt after the first
    pub fn record_retry_attempt(&self, operation: &str) {
        self.retry_attempts_total.with_label_values(&[operation]).inc();
    }

    /// Prometheus text exposition of every registered metric
    pub fn encode_text(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
