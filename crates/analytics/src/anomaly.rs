use serde::{Deserialize, Serialize};

use stockscope_core::ShipmentId;
use stockscope_warehouse::Shipment;

use crate::stats::{mean, stddev_population};

/// Default number of standard deviations above the mean that flags a delivery.
pub const DEFAULT_SIGMA: f64 = 2.0;

/// A delivery whose transit time is unusually long.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAnomaly {
    pub id: ShipmentId,
    pub transit_secs: f64,
}

/// Baseline the anomalies were measured against.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitBaseline {
    pub samples: usize,
    pub mean_secs: f64,
    pub stddev_secs: f64,
    pub threshold_secs: f64,
}

impl TransitBaseline {
    /// Population mean/stddev over `transit_secs`, threshold at `mean + sigma * stddev`.
    ///
    /// A constant series measures exactly: mean equals the value and stddev is
    /// zero, whatever rounding the summation would have introduced.
    pub fn measure(transit_secs: &[f64], sigma: f64) -> Self {
        let (mean_secs, stddev_secs) = match transit_secs.split_first() {
            Some((first, rest)) if rest.iter().all(|t| t == first) => (*first, 0.0),
            _ => {
                let mean_secs = mean(transit_secs);
                (mean_secs, stddev_population(transit_secs, mean_secs))
            }
        };
        Self {
            samples: transit_secs.len(),
            mean_secs,
            stddev_secs,
            threshold_secs: mean_secs + sigma * stddev_secs,
        }
    }

    /// Strictly above the threshold; a value exactly at it is not anomalous.
    pub fn is_anomalous(&self, transit_secs: f64) -> bool {
        transit_secs > self.threshold_secs
    }
}

/// Flag delivered shipments whose transit time exceeds `mean + sigma * stddev`.
///
/// Model:
/// - transit time = `delivered_at - shipment_date`, in seconds
/// - shipments without a shipment date are ignored
/// - an empty set or a zero-variance series never flags anything
///
/// Results are ordered by transit time, longest first.
pub fn detect_delivery_anomalies(
    shipments: &[Shipment],
    sigma: f64,
) -> (TransitBaseline, Vec<DeliveryAnomaly>) {
    let samples: Vec<(ShipmentId, f64)> = shipments
        .iter()
        .filter_map(|s| s.transit_secs().map(|t| (s.id, t)))
        .collect();
    let transit: Vec<f64> = samples.iter().map(|(_, t)| *t).collect();
    let baseline = TransitBaseline::measure(&transit, sigma);

    // With zero spread nothing can sit strictly above the mean.
    if baseline.stddev_secs <= 0.0 {
        return (baseline, Vec::new());
    }

    let mut anomalies: Vec<DeliveryAnomaly> = samples
        .into_iter()
        .filter(|(_, t)| baseline.is_anomalous(*t))
        .map(|(id, transit_secs)| DeliveryAnomaly { id, transit_secs })
        .collect();
    anomalies.sort_by(|a, b| b.transit_secs.total_cmp(&a.transit_secs));

    (baseline, anomalies)
}
