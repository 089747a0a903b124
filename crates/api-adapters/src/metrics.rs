//! Prometheus registry for the HTTP surface.

use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

#[derive(Debug, Clone, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RequestLabels {
    pub method: String,
    /// Matched route template, e.g. `/api/topics/{id}`
    pub route: String,
    /// `2xx`, `4xx`, ...
    pub status: String,
}

pub struct Metrics {
    registry: Registry,
    requests: Family<RequestLabels, Counter>,
}

impl Default for Metrics {
    fn default() -> Self {
        let mut registry = Registry::with_prefix("alumni_hub");
        let requests = Family::<RequestLabels, Counter>::default();
        registry.register(
            "http_requests",
            "HTTP requests handled, by route and status class",
            requests.clone(),
        );
        Self { registry, requests }
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, method: &str, route: &str, status: u16) {
        self.requests
            .get_or_create(&RequestLabels {
                method: method.to_string(),
                route: route.to_string(),
                status: format!("{}xx", status / 100),
            })
            .inc();
    }

    /// OpenMetrics text exposition.
    pub fn render(&self) -> Result<String, std::fmt::Error> {
        let mut out = String::new();
        encode(&mut out, &self.registry)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_by_status_class() {
        let metrics = Metrics::new();
        metrics.record("GET", "/api/forums", 200);
        metrics.record("GET", "/api/forums", 204);
        metrics.record("POST", "/api/posts", 403);

        let text = metrics.render().unwrap();
        assert!(text.contains(
            r#"alumni_hub_http_requests_total{method="GET",route="/api/forums",status="2xx"} 2"#
        ));
        assert!(text.contains(r#"status="4xx""#));
    }
}
