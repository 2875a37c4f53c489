/*
Copyright 2024 San Francisco Compute Company

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

use crate::domain::{
    Collected, CollectionError, FailureReason, HardwareFacts, ProbeError, SectionKind,
};
use crate::ports::PlatformProbe;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

fn collected<T>(field: &str, result: Result<T, ProbeError>) -> Collected<T> {
    match result {
        Ok(value) => Collected::Value(value),
        Err(e) => {
            warn!("Hardware {field} unavailable: {e}");
            Collected::Unavailable(CollectionError::from_probe(SectionKind::Hardware, &e))
        }
    }
}

/// Collects the hardware section
///
/// Core counts, utilization and memory are independent fields. CPU
/// sampling is the only latency-bearing query and is bounded by the
/// caller's ceiling.
pub struct HardwareCollector {
    probe: Arc<dyn PlatformProbe>,
}

impl HardwareCollector {
    pub fn new(probe: Arc<dyn PlatformProbe>) -> Self {
        Self { probe }
    }

    pub async fn collect(
        &self,
        sample_interval: Duration,
        sample_ceiling: Duration,
    ) -> Collected<HardwareFacts> {
        let minimum = self.probe.capabilities().minimum_sample_interval;
        if sample_interval < minimum {
            debug!(
                "Raising CPU sample window from {} ms to the platform minimum of {} ms",
                sample_interval.as_millis(),
                minimum.as_millis()
            );
        }
        let sample_interval = sample_interval.max(minimum);

        let (physical, logical, utilization, memory) = tokio::join!(
            self.probe.query_physical_cores(),
            self.probe.query_logical_cores(),
            self.sample_cpu(sample_interval, sample_ceiling),
            self.probe.query_memory(),
        );

        let mut physical_cores = collected("physical core count", physical);
        let logical_cores = collected("logical core count", logical);

        if let (Some(&p), Some(&l)) = (physical_cores.value(), logical_cores.value()) {
            if p > l {
                warn!("Physical core count {p} exceeds logical core count {l}, discarding it");
                physical_cores = Collected::Unavailable(CollectionError::new(
                    SectionKind::Hardware,
                    FailureReason::ProbeUnavailable,
                    format!("physical core count {p} exceeds logical core count {l}"),
                ));
            }
        }

        let facts = HardwareFacts {
            physical_cores,
            logical_cores,
            per_core_utilization: collected("CPU utilization", utilization),
            sample_interval_ms: sample_interval.as_millis() as u64,
            memory: collected("memory totals", memory),
        };

        let errors = [
            facts.physical_cores.error(),
            facts.logical_cores.error(),
            facts.per_core_utilization.error(),
            facts.memory.error(),
        ];
        if let [Some(first), Some(_), Some(_), Some(_)] = errors {
            return Collected::Unavailable(CollectionError::new(
                SectionKind::Hardware,
                first.reason,
                format!("no hardware facts could be read: {}", first.detail),
            ));
        }

        info!(
            "Hardware: physical={:?} logical={:?} sampled_cores={:?}",
            facts.physical_cores.value(),
            facts.logical_cores.value(),
            facts.per_core_utilization.value().map(Vec::len)
        );
        Collected::Value(facts)
    }

    /// Sample CPU utilization, treating anything past `ceiling` as a timeout
    async fn sample_cpu(
        &self,
        interval: Duration,
        ceiling: Duration,
    ) -> Result<Vec<f32>, ProbeError> {
        debug!("Sampling CPU utilization over {} ms", interval.as_millis());
        match tokio::time::timeout(ceiling, self.probe.query_cpu_usage(interval)).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::Timeout(format!(
                "CPU sample did not finish within {} ms",
                ceiling.as_millis()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::SimulatedPlatformProbe;
    use crate::domain::MemoryTotals;

    const INTERVAL: Duration = Duration::from_millis(10);
    const CEILING: Duration = Duration::from_secs(1);

    async fn collect(probe: SimulatedPlatformProbe) -> Collected<HardwareFacts> {
        HardwareCollector::new(Arc::new(probe))
            .collect(INTERVAL, CEILING)
            .await
    }

    #[tokio::test]
    async fn test_all_fields_collected() {
        let hardware = collect(SimulatedPlatformProbe::new()).await;
        let facts = hardware.value().unwrap();

        assert_eq!(facts.physical_cores, Collected::Value(4));
        assert_eq!(facts.logical_cores, Collected::Value(8));
        assert_eq!(facts.per_core_utilization.value().map(Vec::len), Some(8));
        assert_eq!(facts.sample_interval_ms, 10);
        assert_eq!(
            facts.memory.value().map(|m| m.available_bytes),
            Some(9 * 1024 * 1024 * 1024)
        );
    }

    #[tokio::test]
    async fn test_physical_above_logical_is_discarded() {
        let probe = SimulatedPlatformProbe::new().with_core_counts(Ok(16), Ok(8));
        let hardware = collect(probe).await;
        let facts = hardware.value().unwrap();

        assert!(facts.physical_cores.error().is_some());
        assert_eq!(facts.logical_cores, Collected::Value(8));
    }

    #[tokio::test]
    async fn test_memory_failure_is_field_level() {
        let probe = SimulatedPlatformProbe::new()
            .with_memory(Err(ProbeError::PermissionDenied("meminfo".to_string())));
        let hardware = collect(probe).await;
        let facts = hardware.value().unwrap();

        assert_eq!(
            facts.memory.error().map(|e| e.reason),
            Some(FailureReason::PermissionDenied)
        );
        assert!(facts.per_core_utilization.is_value());
    }

    #[tokio::test]
    async fn test_every_field_failing_makes_section_unavailable() {
        let down = || ProbeError::Unavailable("counters".to_string());
        let probe = SimulatedPlatformProbe::new()
            .with_core_counts(Err(down()), Err(down()))
            .with_cpu_usage(Err(down()))
            .with_memory(Err(down()));

        let hardware = collect(probe).await;
        let err = hardware.error().unwrap();
        assert_eq!(err.section, SectionKind::Hardware);
        assert_eq!(err.reason, FailureReason::ProbeUnavailable);
    }

    #[tokio::test]
    async fn test_sample_window_raised_to_platform_minimum() {
        let probe =
            SimulatedPlatformProbe::new().with_minimum_sample_interval(Duration::from_millis(200));
        let started = std::time::Instant::now();
        let hardware = collect(probe).await;
        let elapsed = started.elapsed();

        let facts = hardware.value().unwrap();
        assert_eq!(facts.sample_interval_ms, 200);
        assert!(facts.per_core_utilization.is_value());
        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed < Duration::from_millis(600), "took {elapsed:?}");
    }

    #[tokio::test]
    async fn test_partial_memory_totals_pass_through() {
        let probe = SimulatedPlatformProbe::new().with_memory(Ok(MemoryTotals {
            total_bytes: 2048,
            available_bytes: 0,
        }));
        let hardware = collect(probe).await;
        assert_eq!(
            hardware.value().and_then(|f| f.memory.value().copied()),
            Some(MemoryTotals {
                total_bytes: 2048,
                available_bytes: 0,
            })
        );
    }
}
