//! Principal component projection for small, dense feature sets.
//!
//! Features are mean-centred, the sample covariance matrix is diagonalized
//! with cyclic Jacobi rotations, and rows are projected onto the leading
//! components. Each component's sign is fixed so that its largest-magnitude
//! coefficient is positive, which keeps projections stable across runs.

const JACOBI_MAX_SWEEPS: usize = 64;
const JACOBI_EPS: f64 = 1e-12;

pub struct Pca {
    means: Vec<f64>,
    /// Components sorted by descending explained variance, one row each.
    components: Vec<Vec<f64>>,
    variances: Vec<f64>,
}

impl Pca {
    /// Returns `None` for empty input or zero-width rows.
    pub fn fit(data: &[Vec<f64>]) -> Option<Self> {
        let n = data.len();
        let dim = data.first()?.len();
        if dim == 0 {
            return None;
        }

        let mut means = vec![0.0; dim];
        for row in data {
            for (m, v) in means.iter_mut().zip(row) {
                *m += v;
            }
        }
        for m in &mut means {
            *m /= n as f64;
        }

        let mut cov = vec![vec![0.0; dim]; dim];
        if n > 1 {
            for row in data {
                for i in 0..dim {
                    let di = row[i] - means[i];
                    for j in i..dim {
                        cov[i][j] += di * (row[j] - means[j]);
                    }
                }
            }
            for i in 0..dim {
                for j in i..dim {
                    cov[i][j] /= (n - 1) as f64;
                    cov[j][i] = cov[i][j];
                }
            }
        }

        let (eigenvalues, eigenvectors) = jacobi_eigen(cov);

        let mut order: Vec<usize> = (0..dim).collect();
        order.sort_by(|&a, &b| eigenvalues[b].total_cmp(&eigenvalues[a]).then(a.cmp(&b)));

        let mut components = Vec::with_capacity(dim);
        let mut variances = Vec::with_capacity(dim);
        for idx in order {
            let mut v: Vec<f64> = (0..dim).map(|row| eigenvectors[row][idx]).collect();
            let pivot = v
                .iter()
                .copied()
                .fold(0.0_f64, |acc, x| if x.abs() > acc.abs() { x } else { acc });
            if pivot < 0.0 {
                for x in &mut v {
                    *x = -*x;
                }
            }
            components.push(v);
            variances.push(eigenvalues[idx].max(0.0));
        }

        Some(Self {
            means,
            components,
            variances,
        })
    }

    /// Projects one row onto the first `n_components` components.
    pub fn project(&self, row: &[f64], n_components: usize) -> Vec<f64> {
        self.components
            .iter()
            .take(n_components)
            .map(|c| {
                c.iter()
                    .zip(row.iter().zip(&self.means))
                    .map(|(w, (x, m))| w * (x - m))
                    .sum()
            })
            .collect()
    }

    pub fn components(&self) -> &[Vec<f64>] {
        &self.components
    }

    pub fn explained_variance(&self) -> &[f64] {
        &self.variances
    }
}

/// Eigen-decomposition of a symmetric matrix. Returns eigenvalues and a
/// matrix whose columns are the matching unit eigenvectors.
fn jacobi_eigen(mut a: Vec<Vec<f64>>) -> (Vec<f64>, Vec<Vec<f64>>) {
    let n = a.len();
    let mut v = vec![vec![0.0; n]; n];
    for (i, row) in v.iter_mut().enumerate() {
        row[i] = 1.0;
    }

    for _ in 0..JACOBI_MAX_SWEEPS {
        let off: f64 = (0..n)
            .flat_map(|i| (0..n).filter(move |&j| j != i).map(move |j| (i, j)))
            .map(|(i, j)| a[i][j] * a[i][j])
            .sum();
        if off < JACOBI_EPS {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                if a[p][q].abs() < f64::MIN_POSITIVE {
                    continue;
                }
                let theta = (a[q][q] - a[p][p]) / (2.0 * a[p][q]);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let akp = a[k][p];
                    let akq = a[k][q];
                    a[k][p] = c * akp - s * akq;
                    a[k][q] = s * akp + c * akq;
                }
                for k in 0..n {
                    let apk = a[p][k];
                    let aqk = a[q][k];
                    a[p][k] = c * apk - s * aqk;
                    a[q][k] = s * apk + c * aqk;
                }
                for row in v.iter_mut() {
                    let vkp = row[p];
                    let vkq = row[q];
                    row[p] = c * vkp - s * vkq;
                    row[q] = s * vkp + c * vkq;
                }
            }
        }
    }

    let eigenvalues = (0..n).map(|i| a[i][i]).collect();
    (eigenvalues, v)
}
