//! Per-snapshot analysis context.
//!
//! `AnalysisContext` lazily computes and caches each stage against one
//! immutable snapshot: property shapes, the project-wide usage map, and
//! the per-field verdicts. Because classification is a pure function of
//! the snapshot, the cache is sound for the snapshot's lifetime and is
//! discarded with it; a new stamp means a new context.

use std::sync::OnceLock;

use rayon::prelude::*;

use crate::adapter::Adapter;
use crate::cancel::{CancellationToken, Cancelled};
use crate::snapshot::{ProjectSnapshot, SymbolId};

use super::eligibility::{
    EligibilityVerdict, PropertyShape, classify_field, compute_property_shapes,
};
use super::usage::{UsageMap, collect_usages};
use super::TelemetryEvent;

/// Verdict for one discovered field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldAnalysis {
    pub field: SymbolId,
    pub verdict: EligibilityVerdict,
}

/// All classifications of one pass, with the telemetry recorded while
/// producing them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResults {
    pub analyses: Vec<FieldAnalysis>,
    pub telemetry: Vec<TelemetryEvent>,
}

pub struct AnalysisContext<'a> {
    pub snapshot: &'a ProjectSnapshot,
    pub adapter: Adapter,
    token: CancellationToken,
    usage_map: OnceLock<UsageMap>,
    shapes: OnceLock<Vec<PropertyShape>>,
    results: OnceLock<AnalysisResults>,
}

impl<'a> AnalysisContext<'a> {
    pub fn new(snapshot: &'a ProjectSnapshot, token: CancellationToken) -> Self {
        Self {
            snapshot,
            adapter: Adapter::for_language(snapshot.language),
            token,
            usage_map: OnceLock::new(),
            shapes: OnceLock::new(),
            results: OnceLock::new(),
        }
    }

    /// The project-wide usage map (lazy; parallel scan on first access).
    pub fn usage_map(&self) -> Result<&UsageMap, Cancelled> {
        if let Some(map) = self.usage_map.get() {
            return Ok(map);
        }
        let map = collect_usages(self.snapshot, &self.token)?;
        Ok(self.usage_map.get_or_init(|| map))
    }

    /// Shape-test results for every property (lazy).
    pub fn property_shapes(&self) -> &Vec<PropertyShape> {
        self.shapes
            .get_or_init(|| compute_property_shapes(self.snapshot, &self.adapter))
    }

    /// Classify every field in the snapshot (lazy).
    ///
    /// Fields are classified in parallel; host-contract failures degrade
    /// to a telemetry event for that field only, never an aborted pass.
    pub fn results(&self) -> Result<&AnalysisResults, Cancelled> {
        if let Some(results) = self.results.get() {
            return Ok(results);
        }

        let usages = self.usage_map()?;
        let shapes = self.property_shapes();
        self.token.checkpoint()?;

        let classified: Vec<(SymbolId, Result<EligibilityVerdict, super::HostContractError>)> =
            self.snapshot
                .field_symbols()
                .par_iter()
                .map(|&field| {
                    (
                        field,
                        classify_field(self.snapshot, &self.adapter, shapes, usages, field),
                    )
                })
                .collect();

        let mut analyses = Vec::with_capacity(classified.len());
        let mut telemetry = Vec::new();
        for (field, outcome) in classified {
            match outcome {
                Ok(verdict) => analyses.push(FieldAnalysis { field, verdict }),
                Err(err) => telemetry.push(TelemetryEvent {
                    field: Some(field),
                    message: err.to_string(),
                }),
            }
        }

        Ok(self
            .results
            .get_or_init(|| AnalysisResults { analyses, telemetry }))
    }
}
