//! Behavioral clustering of anomalous readings.
//!
//! Only readings whose minute matches a detected insight are clustered.
//! Each is assigned one of `CLUSTER_COUNT` groups by k-means over the raw
//! (temperature, vibration, pressure) vector, then projected to 2D with PCA
//! for visualization.
//!
//! K-means initialization is random. Pass a seed for reproducible cluster
//! ids; without one the labels may be permuted or regrouped between runs.

pub mod kmeans;
pub mod pca;

use std::collections::HashSet;

use tracing::debug;

use crate::analysis::{AnomalyInsight, Cluster2DPoint, ClusterPoint};
use crate::reading::SensorReading;
use crate::util::minute_key;

use kmeans::KMeans;
use pca::Pca;

pub const CLUSTER_COUNT: usize = 3;

/// Readings that fall in a minute with at least one insight, in input order.
pub fn anomalous_readings(
    readings: &[SensorReading],
    insights: &[AnomalyInsight],
) -> Vec<SensorReading> {
    let minutes: HashSet<i64> = insights.iter().map(|i| i.time).collect();
    readings
        .iter()
        .filter(|r| minutes.contains(&minute_key(r.timestamp)))
        .copied()
        .collect()
}

fn features(r: &SensorReading) -> Vec<f64> {
    vec![r.temperature, r.vibration, r.pressure]
}

pub fn cluster_anomalies(
    readings: &[SensorReading],
    seed: Option<u64>,
    max_iter: usize,
) -> Vec<ClusterPoint> {
    if readings.is_empty() {
        return Vec::new();
    }

    let data: Vec<Vec<f64>> = readings.iter().map(features).collect();
    let mut km = KMeans::new(CLUSTER_COUNT)
        .with_seed(seed)
        .with_max_iter(max_iter);
    km.fit(&data);

    debug!(
        points = data.len(),
        iterations = km.iterations(),
        inertia = km.inertia(),
        "k-means finished"
    );

    readings
        .iter()
        .zip(km.labels())
        .map(|(r, &cluster)| ClusterPoint {
            temperature: r.temperature,
            vibration: r.vibration,
            pressure: r.pressure,
            cluster,
            timestamp: r.timestamp,
        })
        .collect()
}

pub fn project_2d(points: &[ClusterPoint]) -> Vec<Cluster2DPoint> {
    let data: Vec<Vec<f64>> = points
        .iter()
        .map(|p| vec![p.temperature, p.vibration, p.pressure])
        .collect();
    let Some(pca) = Pca::fit(&data) else {
        return Vec::new();
    };

    points
        .iter()
        .zip(&data)
        .map(|(p, row)| {
            let xy = pca.project(row, 2);
            Cluster2DPoint {
                x: xy[0],
                y: xy[1],
                cluster: p.cluster,
                timestamp: p.timestamp,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::rules::all_rules;
    use crate::analysis::detector::detect;

    fn make_reading(
        timestamp: i64,
        temperature: f64,
        vibration: f64,
        pressure: f64,
    ) -> SensorReading {
        SensorReading {
            timestamp,
            temperature,
            vibration,
            pressure,
        }
    }

    #[test]
    fn empty_in_empty_out() {
        assert!(cluster_anomalies(&[], Some(1), 100).is_empty());
        assert!(project_2d(&[]).is_empty());
    }

    #[test]
    fn selects_readings_by_insight_minute() {
        let readings = vec![
            make_reading(0, 90.0, 0.0, 1000.0),
            make_reading(30, 20.0, 0.0, 1000.0), // same minute as a breach
            make_reading(60, 20.0, 0.0, 1000.0),
            make_reading(125, 20.0, 0.09, 1000.0),
        ];
        let insights = detect(&all_rules(), &readings);
        let selected = anomalous_readings(&readings, &insights);
        assert_eq!(
            selected.iter().map(|r| r.timestamp).collect::<Vec<_>>(),
            vec![0, 30, 125]
        );
    }

    #[test]
    fn labels_are_in_range_and_seeded_runs_agree() {
        let readings: Vec<SensorReading> = (0..30)
            .map(|i| {
                let f = i as f64;
                make_reading(
                    i * 60,
                    80.0 + (f * 7.0) % 20.0,
                    0.05 + (f * 3.0 % 7.0) / 100.0,
                    1010.0 + f % 9.0,
                )
            })
            .collect();

        let a = cluster_anomalies(&readings, Some(11), 100);
        let b = cluster_anomalies(&readings, Some(11), 100);
        assert_eq!(a.len(), readings.len());
        assert!(a.iter().all(|p| p.cluster < CLUSTER_COUNT));
        assert_eq!(a, b);

        let projected = project_2d(&a);
        assert_eq!(projected.len(), a.len());
        for (p2, p) in projected.iter().zip(&a) {
            assert_eq!(p2.cluster, p.cluster);
            assert_eq!(p2.timestamp, p.timestamp);
            assert!(p2.x.is_finite() && p2.y.is_finite());
        }
    }

    #[test]
    fn identical_feature_vectors() {
        let readings: Vec<SensorReading> =
            (0..10).map(|i| make_reading(i, 85.0, 0.08, 1020.0)).collect();
        let clusters = cluster_anomalies(&readings, None, 100);
        assert_eq!(clusters.len(), 10);
        assert!(clusters.iter().all(|p| p.cluster < CLUSTER_COUNT));
    }
}
