use rand::{Rng, SeedableRng, rngs::StdRng};

/// Parameters of the palette clustering
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansConfig {
    pub k: usize,
    pub max_iterations: usize,
    /// Stop once no centroid moves further than this
    pub epsilon: f64,
    /// Independent restarts; the one with the lowest inertia wins
    pub attempts: usize,
    pub seed: u64,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            k: 12,
            max_iterations: 10,
            epsilon: 1.0,
            attempts: 3,
            seed: 0x5EED_C0DE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    pub centers: Vec<[f64; 3]>,
    /// Cluster index of every input point
    pub labels: Vec<usize>,
    /// Sum of squared distances to the assigned centers
    pub inertia: f64,
}

impl Clustering {
    pub fn populations(&self) -> Vec<usize> {
        let mut counts = vec![0; self.centers.len()];
        for &label in &self.labels {
            counts[label] += 1;
        }
        counts
    }

    /// Centers with their populations, most populated first. Equal
    /// populations keep cluster order.
    pub fn ranked(&self) -> Vec<([f64; 3], usize)> {
        let mut ranked: Vec<([f64; 3], usize)> = self.centers
            .iter()
            .copied()
            .zip(self.populations())
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }
}

fn squared_distance(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)
}

/// Index of the nearest center; ties go to the lower index.
fn nearest_center(point: &[f64; 3], centers: &[[f64; 3]]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (index, center) in centers.iter().enumerate() {
        let distance = squared_distance(point, center);
        if distance < best.1 {
            best = (index, distance);
        }
    }
    best
}

/// k-means++ seeding: each further center is drawn with probability
/// proportional to its squared distance from the centers chosen so far.
fn seed_centers(points: &[[f64; 3]], k: usize, rng: &mut StdRng) -> Vec<[f64; 3]> {
    let mut centers = Vec::with_capacity(k);
    centers.push(points[rng.random_range(0..points.len())]);

    let mut distances: Vec<f64> = points
        .iter()
        .map(|p| squared_distance(p, &centers[0]))
        .collect();

    while centers.len() < k {
        let total: f64 = distances.iter().sum();
        let chosen = if total <= 0.0 {
            rng.random_range(0..points.len())
        } else {
            let target = rng.random::<f64>() * total;
            let mut cumulative = 0.0;
            distances
                .iter()
                .position(|&d| {
                    cumulative += d;
                    cumulative >= target && d > 0.0
                })
                .unwrap_or(points.len() - 1)
        };

        let center = points[chosen];
        for (distance, point) in distances.iter_mut().zip(points) {
            *distance = distance.min(squared_distance(point, &center));
        }
        centers.push(center);
    }

    centers
}

fn assign(points: &[[f64; 3]], centers: &[[f64; 3]], labels: &mut [usize]) -> f64 {
    let mut inertia = 0.0;
    for (label, point) in labels.iter_mut().zip(points) {
        let (index, distance) = nearest_center(point, centers);
        *label = index;
        inertia += distance;
    }
    inertia
}

fn single_run(points: &[[f64; 3]], config: &KMeansConfig, k: usize, rng: &mut StdRng) -> Clustering {
    let mut centers = seed_centers(points, k, rng);
    let mut labels = vec![0; points.len()];

    for _ in 0..config.max_iterations.max(1) {
        assign(points, &centers, &mut labels);

        let mut sums = vec![[0.0f64; 3]; k];
        let mut counts = vec![0usize; k];
        for (point, &label) in points.iter().zip(&labels) {
            for channel in 0..3 {
                sums[label][channel] += point[channel];
            }
            counts[label] += 1;
        }

        let mut max_shift: f64 = 0.0;
        for (index, center) in centers.iter_mut().enumerate() {
            // Empty clusters keep their previous position
            if counts[index] == 0 {
                continue;
            }
            let updated = sums[index].map(|s| s / counts[index] as f64);
            max_shift = max_shift.max(squared_distance(center, &updated).sqrt());
            *center = updated;
        }

        if max_shift <= config.epsilon {
            break;
        }
    }

    let inertia = assign(points, &centers, &mut labels);
    Clustering { centers, labels, inertia }
}

/// Cluster RGB points. Deterministic for a given configuration.
pub fn kmeans(points: &[[f64; 3]], config: &KMeansConfig) -> Clustering {
    let k = config.k.min(points.len());
    if k == 0 {
        return Clustering { centers: Vec::new(), labels: Vec::new(), inertia: 0.0 };
    }

    let mut best: Option<Clustering> = None;
    for attempt in 0..config.attempts.max(1) {
        let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(attempt as u64));
        let candidate = single_run(points, config, k, &mut rng);
        match &best {
            Some(current) if candidate.inertia >= current.inertia => {}
            _ => best = Some(candidate),
        }
    }

    best.unwrap_or(Clustering { centers: Vec::new(), labels: Vec::new(), inertia: 0.0 })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_blobs() -> Vec<[f64; 3]> {
        let mut points = Vec::new();
        for i in 0..300 {
            let jitter = (i % 5) as f64;
            points.push([10.0 + jitter, 10.0, 10.0]);
        }
        for i in 0..100 {
            let jitter = (i % 3) as f64;
            points.push([240.0, 200.0 + jitter, 30.0]);
        }
        points
    }

    #[test]
    fn test_separates_blobs_and_ranks_by_population() {
        let config = KMeansConfig { k: 2, ..Default::default() };
        let clustering = kmeans(&two_blobs(), &config);

        let ranked = clustering.ranked();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].1, 300);
        assert_eq!(ranked[1].1, 100);
        assert!((ranked[0].0[0] - 12.0).abs() < 1e-9);
        assert!((ranked[1].0[1] - 201.0).abs() < 0.05);
    }

    #[test]
    fn test_deterministic() {
        let points = two_blobs();
        let config = KMeansConfig::default();
        assert_eq!(kmeans(&points, &config), kmeans(&points, &config));
    }

    #[test]
    fn test_identical_points() {
        let points = vec![[50.0, 60.0, 70.0]; 64];
        let clustering = kmeans(&points, &KMeansConfig::default());
        assert_eq!(clustering.centers.len(), 12);
        assert_eq!(clustering.inertia, 0.0);
        assert_eq!(clustering.ranked()[0].1, 64);
        assert!(clustering.centers.iter().all(|c| *c == [50.0, 60.0, 70.0]));
    }

    #[test]
    fn test_fewer_points_than_clusters() {
        let points = vec![[0.0, 0.0, 0.0], [255.0, 255.0, 255.0]];
        let clustering = kmeans(&points, &KMeansConfig::default());
        assert_eq!(clustering.centers.len(), 2);
        assert_eq!(clustering.inertia, 0.0);
    }

    #[test]
    fn test_empty_input() {
        let clustering = kmeans(&[], &KMeansConfig::default());
        assert!(clustering.centers.is_empty());
    }
}
