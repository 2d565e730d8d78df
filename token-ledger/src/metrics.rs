//! Metrics collection for observability
//!
//! # Metrics
//!
//! - `token_records_total` - Total records appended to the log
//! - `token_mints_total` - Successful mint operations
//! - `token_burns_total` - Successful burn operations
//! - `token_transfers_total` - Successful transfer/transferFrom operations
//! - `token_approvals_total` - Successful approval operations
//! - `token_rejected_total` - Operations rejected by validation
//! - `token_total_supply` - Current total supply

use crate::types::TokenRecord;
use prometheus::{IntCounter, IntGauge, Opts, Registry};
use std::sync::Arc;

/// Metrics collector
///
/// Counters live in a crate-owned registry rather than the process default,
/// so constructing `Metrics` repeatedly (as tests do) never collides.
#[derive(Clone)]
pub struct Metrics {
    /// Total records appended
    pub records_total: IntCounter,

    /// Successful mints
    pub mints_total: IntCounter,

    /// Successful burns
    pub burns_total: IntCounter,

    /// Successful transfers (direct and delegated)
    pub transfers_total: IntCounter,

    /// Successful approvals
    pub approvals_total: IntCounter,

    /// Rejected operations
    pub rejected_total: IntCounter,

    /// Current total supply
    pub total_supply: IntGauge,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let records_total = IntCounter::with_opts(Opts::new(
            "token_records_total",
            "Total records appended to the log",
        ))?;
        registry.register(Box::new(records_total.clone()))?;

        let mints_total = IntCounter::with_opts(Opts::new(
            "token_mints_total",
            "Successful mint operations",
        ))?;
        registry.register(Box::new(mints_total.clone()))?;

        let burns_total = IntCounter::with_opts(Opts::new(
            "token_burns_total",
            "Successful burn operations",
        ))?;
        registry.register(Box::new(burns_total.clone()))?;

        let transfers_total = IntCounter::with_opts(Opts::new(
            "token_transfers_total",
            "Successful transfer operations",
        ))?;
        registry.register(Box::new(transfers_total.clone()))?;

        let approvals_total = IntCounter::with_opts(Opts::new(
            "token_approvals_total",
            "Successful approval operations",
        ))?;
        registry.register(Box::new(approvals_total.clone()))?;

        let rejected_total = IntCounter::with_opts(Opts::new(
            "token_rejected_total",
            "Operations rejected by validation",
        ))?;
        registry.register(Box::new(rejected_total.clone()))?;

        let total_supply = IntGauge::with_opts(Opts::new(
            "token_total_supply",
            "Current total supply",
        ))?;
        registry.register(Box::new(total_supply.clone()))?;

        Ok(Self {
            records_total,
            mints_total,
            burns_total,
            transfers_total,
            approvals_total,
            rejected_total,
            total_supply,
            registry,
        })
    }

    /// Record the outcome of a committed operation
    pub fn record_commit(&self, records: &[TokenRecord], total_supply: u64) {
        self.records_total.inc_by(records.len() as u64);
        self.total_supply.set(total_supply as i64);

        for record in records {
            match record {
                TokenRecord::Mint { .. } => self.mints_total.inc(),
                TokenRecord::Burn { .. } => self.burns_total.inc(),
                TokenRecord::Transfer { from, to, .. } => {
                    // Mint/burn already emit a paired transfer record;
                    // count only account-to-account moves here.
                    if !from.is_zero() && !to.is_zero() {
                        self.transfers_total.inc();
                    }
                }
                TokenRecord::Approval { .. } => self.approvals_total.inc(),
                _ => {}
            }
        }
    }

    /// Record a rejected operation
    pub fn record_rejection(&self) {
        self.rejected_total.inc();
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics")
    }
}
