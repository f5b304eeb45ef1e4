use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub order_requests_total: IntCounter,
    pub order_outcomes_total: IntCounterVec,
    pub partner_blocks_total: IntCounter,
    pub delivery_earnings_total: IntCounter,
    pub notifications_pending: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let order_requests_total =
            IntCounter::new("order_requests_total", "Order requests offered to the partner")
                .expect("valid order_requests_total metric");

        let order_outcomes_total = IntCounterVec::new(
            Opts::new("order_outcomes_total", "Order requests and orders by outcome"),
            &["outcome"],
        )
        .expect("valid order_outcomes_total metric");

        let partner_blocks_total = IntCounter::new(
            "partner_blocks_total",
            "Temporary blocks imposed for repeated rejections",
        )
        .expect("valid partner_blocks_total metric");

        let delivery_earnings_total = IntCounter::new(
            "delivery_earnings_total",
            "Earnings credited by completed deliveries",
        )
        .expect("valid delivery_earnings_total metric");

        let notifications_pending =
            IntGauge::new("notifications_pending", "Notifications currently queued")
                .expect("valid notifications_pending metric");

        registry
            .register(Box::new(order_requests_total.clone()))
            .expect("register order_requests_total");
        registry
            .register(Box::new(order_outcomes_total.clone()))
            .expect("register order_outcomes_total");
        registry
            .register(Box::new(partner_blocks_total.clone()))
            .expect("register partner_blocks_total");
        registry
            .register(Box::new(delivery_earnings_total.clone()))
            .expect("register delivery_earnings_total");
        registry
            .register(Box::new(notifications_pending.clone()))
            .expect("register notifications_pending");

        Self {
            registry,
            order_requests_total,
            order_outcomes_total,
            partner_blocks_total,
            delivery_earnings_total,
            notifications_pending,
        }
    }

    pub fn outcome(&self, outcome: &str) {
        self.order_outcomes_total.with_label_values(&[outcome]).inc();
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
