//! Static list of logged outputs

use super::{TelemetrySink, TelemetryValue};

type Accessor<T> = Box<dyn Fn(&T) -> TelemetryValue + Send + Sync>;

/// Named accessors evaluated against one report per cycle
pub struct OutputRegistry<T> {
    outputs: Vec<(String, Accessor<T>)>,
}

impl<T> Default for OutputRegistry<T> {
    fn default() -> Self {
        OutputRegistry { outputs: Vec::new() }
    }
}

impl<T> OutputRegistry<T> {
    pub fn new() -> Self {
        OutputRegistry::default()
    }

    /// Register an output; a key registered twice keeps the first accessor
    pub fn output<V, F>(mut self, key: &str, accessor: F) -> Self
    where
        V: Into<TelemetryValue>,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        if self.outputs.iter().all(|(k, _)| k != key) {
            self.outputs
                .push((key.to_string(), Box::new(move |report| accessor(report).into())));
        }
        self
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.outputs.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Record every output for `report`
    pub fn emit(&self, report: &T, sink: &mut dyn TelemetrySink) {
        for (key, accessor) in &self.outputs {
            sink.record(key, accessor(report));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::MemorySink;

    struct Report {
        distance: f64,
        in_range: bool,
    }

    #[test]
    fn emits_every_output_in_order() {
        let registry = OutputRegistry::<Report>::new()
            .output("Shot/distance", |r| r.distance)
            .output("Shot/inRange", |r| r.in_range)
            .output("Shot/distance", |_| 0.0);
        assert_eq!(registry.len(), 2);

        let mut sink = MemorySink::new();
        registry.emit(
            &Report {
                distance: 3.5,
                in_range: false,
            },
            &mut sink,
        );
        assert_eq!(sink.number("Shot/distance"), Some(3.5));
        assert_eq!(sink.boolean("Shot/inRange"), Some(false));
    }
}
