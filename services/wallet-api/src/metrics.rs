use lazy_static::lazy_static;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"]
    ).expect("metric can be created");

    // Wallet metrics
    pub static ref WALLETS_CREATED: IntCounter = IntCounter::new(
        "wallets_created_total",
        "Total wallets created"
    ).expect("metric can be created");

    pub static ref STATUS_TRANSITIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("wallet_status_transitions_total", "Wallet status transitions by target status"),
        &["to"]
    ).expect("metric can be created");

    pub static ref MUTATIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("wallet_mutations_total", "Committed wallet mutations"),
        &["action"]
    ).expect("metric can be created");

    pub static ref MUTATIONS_REJECTED: IntCounterVec = IntCounterVec::new(
        Opts::new("wallet_mutations_rejected_total", "Rejected wallet mutations"),
        &["action", "reason"]
    ).expect("metric can be created");

    pub static ref MUTATION_AMOUNT: Histogram = Histogram::with_opts(
        HistogramOpts::new("wallet_mutation_amount", "Distribution of committed mutation amounts")
            .buckets(vec![1.0, 10.0, 100.0, 1000.0, 10000.0, 100000.0, 1000000.0])
    ).expect("metric can be created");
}

/// Register all metrics with the given registry. Safe to call more than once.
pub fn register_metrics(registry: &Registry) -> Result<(), prometheus::Error> {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(WALLETS_CREATED.clone()),
        Box::new(STATUS_TRANSITIONS.clone()),
        Box::new(MUTATIONS_TOTAL.clone()),
        Box::new(MUTATIONS_REJECTED.clone()),
        Box::new(MUTATION_AMOUNT.clone()),
    ];

    for collector in collectors {
        match registry.register(collector) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(e),
        }
    }

    Ok(())
}

/// Generate metrics output in Prometheus text format
pub fn metrics_handler() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = vec![];
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registration() {
        let registry = Registry::new();
        assert!(register_metrics(&registry).is_ok());
        assert!(register_metrics(&registry).is_ok());
    }

    #[test]
    fn test_metrics_output() {
        register_metrics(&REGISTRY).unwrap();
        WALLETS_CREATED.inc();
        MUTATIONS_TOTAL.with_label_values(&["deposit"]).inc();

        let output = metrics_handler().unwrap();
        assert!(output.contains("wallets_created_total"));
        assert!(output.contains("wallet_mutations_total"));
    }
}
