// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Observation streams
//!
//! A discovery collector hands observations over through an
//! [`ObservationSource`]. [`classify_stream`] drains a source, matching
//! observations concurrently against a shared engine while emitting results
//! in input order.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::engine::MatchEngine;
use crate::model::{DeviceObservation, MatchResult};
use crate::Result;

/// Anything that yields device observations one at a time
#[async_trait]
pub trait ObservationSource: Send {
    /// Next observation, or `None` once the source is exhausted
    async fn next_observation(&mut self) -> Result<Option<DeviceObservation>>;
}

/// Reads one JSON observation per line.
///
/// Blank lines are ignored. Lines that do not decode are logged and skipped;
/// they are the collector's problem, not a reason to stop classifying.
pub struct JsonLinesSource<R> {
    lines: Lines<R>,
    line_number: usize,
    skipped: usize,
}

impl<R: AsyncBufRead + Unpin + Send> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
            skipped: 0,
        }
    }

    /// Number of lines dropped because they were not valid observations
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> ObservationSource for JsonLinesSource<R> {
    async fn next_observation(&mut self) -> Result<Option<DeviceObservation>> {
        while let Some(line) = self.lines.next_line().await? {
            self.line_number += 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str(line) {
                Ok(observation) => return Ok(Some(observation)),
                Err(e) => {
                    self.skipped += 1;
                    warn!("Skipping observation on line {}: {}", self.line_number, e);
                }
            }
        }
        Ok(None)
    }
}

/// In-memory source over already collected observations
pub struct IterSource<I> {
    inner: I,
}

impl<I> IterSource<I>
where
    I: Iterator<Item = DeviceObservation> + Send,
{
    pub fn new(observations: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            inner: observations.into_iter(),
        }
    }
}

#[async_trait]
impl<I> ObservationSource for IterSource<I>
where
    I: Iterator<Item = DeviceObservation> + Send,
{
    async fn next_observation(&mut self) -> Result<Option<DeviceObservation>> {
        Ok(self.inner.next())
    }
}

/// One classified observation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    /// Zero-based position in the source
    pub sequence: usize,
    pub observation: DeviceObservation,
    pub result: Option<MatchResult>,
}

/// Classify everything `source` yields, passing results to `emit` in order.
///
/// At most `max_in_flight` observations are being classified at once (a value
/// of zero is treated as one). Returns the number of observations classified.
pub async fn classify_stream<S, F>(
    engine: Arc<MatchEngine>,
    source: &mut S,
    max_in_flight: usize,
    mut emit: F,
) -> Result<usize>
where
    S: ObservationSource + ?Sized,
    F: FnMut(Classification) -> Result<()>,
{
    let max_in_flight = max_in_flight.max(1);
    let mut in_flight: VecDeque<JoinHandle<Classification>> = VecDeque::with_capacity(max_in_flight);
    let mut sequence = 0;

    while let Some(observation) = source.next_observation().await? {
        if in_flight.len() >= max_in_flight {
            if let Some(handle) = in_flight.pop_front() {
                emit(handle.await?)?;
            }
        }

        let engine = Arc::clone(&engine);
        let position = sequence;
        in_flight.push_back(tokio::spawn(async move {
            let result = engine.match_observation(&observation);
            Classification {
                sequence: position,
                observation,
                result,
            }
        }));
        sequence += 1;
    }

    while let Some(handle) = in_flight.pop_front() {
        emit(handle.await?)?;
    }

    debug!("Classified {} observations", sequence);
    Ok(sequence)
}

/// Classify a whole source and collect the results
pub async fn collect_classifications<S>(
    engine: Arc<MatchEngine>,
    source: &mut S,
    max_in_flight: usize,
) -> Result<Vec<Classification>>
where
    S: ObservationSource + ?Sized,
{
    let mut results = Vec::new();
    classify_stream(engine, source, max_in_flight, |c| {
        results.push(c);
        Ok(())
    })
    .await?;
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::IntegrationFingerprint;
    use crate::NetprintError;

    fn engine() -> Arc<MatchEngine> {
        Arc::new(
            MatchEngine::new(vec![
                IntegrationFingerprint::new("esphome").with_service_type("_esphomelib._tcp.local."),
                IntegrationFingerprint::new("samsung_tv").with_mac_prefix("445ce9"),
            ])
            .unwrap(),
        )
    }

    const LINES: &str = r#"{"mdns_service_type": "_esphomelib._tcp.local."}

not json at all
{"mac": "44:5C:E9:86:51:9C"}
{"hostname": "random-device"}
"#;

    #[tokio::test]
    async fn test_json_lines_source_skips_bad_lines() {
        let mut source = JsonLinesSource::new(LINES.as_bytes());
        let mut seen = Vec::new();
        while let Some(obs) = source.next_observation().await.unwrap() {
            seen.push(obs);
        }

        assert_eq!(seen.len(), 3);
        assert_eq!(source.skipped(), 1);
        assert_eq!(seen[1].mac_address.as_deref(), Some("44:5C:E9:86:51:9C"));
    }

    #[tokio::test]
    async fn test_classify_stream_keeps_input_order() {
        let mut source = JsonLinesSource::new(LINES.as_bytes());
        let results = collect_classifications(engine(), &mut source, 2).await.unwrap();

        let outcome: Vec<(usize, Option<&str>)> = results
            .iter()
            .map(|c| (c.sequence, c.result.as_ref().map(|m| m.integration_id())))
            .collect();
        assert_eq!(
            outcome,
            vec![(0, Some("esphome")), (1, Some("samsung_tv")), (2, None)]
        );
    }

    #[tokio::test]
    async fn test_zero_in_flight_still_progresses() {
        let observations: Vec<DeviceObservation> = (0..20)
            .map(|i| DeviceObservation::new().with_mac(format!("44:5C:E9:00:00:{:02x}", i)))
            .collect();
        let mut source = IterSource::new(observations);

        let results = collect_classifications(engine(), &mut source, 0).await.unwrap();
        assert_eq!(results.len(), 20);
        assert!(results.iter().enumerate().all(|(i, c)| c.sequence == i && c.result.is_some()));
    }

    #[test]
    fn test_emit_error_stops_stream() {
        let observations = vec![DeviceObservation::new(), DeviceObservation::new()];
        let mut source = IterSource::new(observations);
        let runtime = tokio::runtime::Runtime::new().unwrap();

        let result = runtime.block_on(classify_stream(engine(), &mut source, 1, |_| {
            Err(NetprintError::Observation("sink closed".to_string()))
        }));
        assert!(matches!(result, Err(NetprintError::Observation(_))));
    }

    #[test]
    fn test_empty_source_classifies_nothing() {
        let mut source = IterSource::new(Vec::<DeviceObservation>::new());
        let count = tokio_test::block_on(classify_stream(engine(), &mut source, 4, |_| Ok(()))).unwrap();
        assert_eq!(count, 0);
    }
}
