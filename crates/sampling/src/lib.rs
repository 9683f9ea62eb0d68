#![cfg_attr(not(test), warn(unused_crate_dependencies))]

//! Generation of the random cell coordinates challenged for every block.

use std::collections::HashSet;

use lumos_primitives::Cell;
use rand::Rng;
use tracing::trace;

/// Controls how many cells are sampled per block and how they are picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingPolicy {
    /// Number of cells to sample per block. Capped by the size of the data matrix.
    pub sample_count: usize,
    /// Also sample the transpose `(col, row)` of every sampled off-diagonal cell.
    pub symmetric: bool,
}

impl SamplingPolicy {
    pub const fn new(sample_count: usize) -> Self {
        Self { sample_count, symmetric: false }
    }

    pub const fn symmetric(mut self, symmetric: bool) -> Self {
        self.symmetric = symmetric;
        self
    }

    /// Returns the number of cells that will be sampled from a `rows` x `cols` matrix.
    pub fn target_size(&self, rows: u32, cols: u32) -> usize {
        let area = rows as u64 * cols as u64;
        area.min(self.sample_count as u64) as usize
    }
}

/// A set of unique cells, kept in the order they were drawn.
///
/// The order matters: the node returns one proof segment per cell in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleSet {
    cells: Vec<Cell>,
}

impl SampleSet {
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn into_cells(self) -> Vec<Cell> {
        self.cells
    }
}

impl AsRef<[Cell]> for SampleSet {
    fn as_ref(&self) -> &[Cell] {
        &self.cells
    }
}

/// Samples cells of a `rows` x `cols` matrix using the thread-local random number generator.
pub fn generate_samples(rows: u32, cols: u32, policy: &SamplingPolicy) -> SampleSet {
    generate_samples_with(&mut rand::thread_rng(), rows, cols, policy)
}

/// Samples cells of a `rows` x `cols` matrix using the given random number generator.
///
/// Draws uniformly over `[0, rows) x [0, cols)` and rejects duplicates until the target size is
/// reached.
pub fn generate_samples_with<R: Rng + ?Sized>(
    rng: &mut R,
    rows: u32,
    cols: u32,
    policy: &SamplingPolicy,
) -> SampleSet {
    let target = policy.target_size(rows, cols);

    let mut seen = HashSet::with_capacity(target);
    let mut cells = Vec::with_capacity(target);

    while cells.len() < target {
        let cell = Cell::new(rng.gen_range(0..rows), rng.gen_range(0..cols));
        if !seen.insert(cell) {
            continue;
        }
        cells.push(cell);

        if policy.symmetric && !cell.is_diagonal() && cells.len() < target {
            let transposed = cell.transpose();
            if transposed.row < rows && transposed.col < cols && seen.insert(transposed) {
                cells.push(transposed);
            }
        }
    }

    trace!(target: "sampling", %rows, %cols, samples = cells.len(), "Generated sample set.");

    SampleSet { cells }
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use rstest::rstest;

    use super::*;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(0x5eed)
    }

    fn assert_unique(samples: &SampleSet) {
        let unique = samples.iter().collect::<HashSet<_>>();
        assert_eq!(unique.len(), samples.len(), "duplicate cell in {samples:?}");
    }

    #[rstest]
    #[case(4, 4, 10, 10)]
    #[case(2, 2, 10, 4)]
    #[case(1, 1, 10, 1)]
    #[case(0, 8, 10, 0)]
    #[case(8, 0, 10, 0)]
    #[case(256, 256, 0, 0)]
    #[case(3, 5, 15, 15)]
    fn sample_set_is_unique_and_capped(
        #[case] rows: u32,
        #[case] cols: u32,
        #[case] count: usize,
        #[case] expected: usize,
    ) {
        for symmetric in [false, true] {
            let policy = SamplingPolicy::new(count).symmetric(symmetric);
            let samples = generate_samples_with(&mut rng(), rows, cols, &policy);

            assert_eq!(samples.len(), expected);
            assert_unique(&samples);
            assert!(samples.iter().all(|c| c.row < rows && c.col < cols));
        }
    }

    #[test]
    fn symmetric_sampling_includes_transposes() {
        let policy = SamplingPolicy::new(21).symmetric(true);
        let samples = generate_samples_with(&mut rng(), 16, 16, &policy);

        assert_eq!(samples.len(), 21);
        assert_unique(&samples);

        let set = samples.iter().copied().collect::<HashSet<_>>();
        let missing = samples.iter().filter(|c| !set.contains(&c.transpose())).count();

        // only the last drawn cell can lose its transpose to the size cap
        assert!(missing <= 1, "{missing} cells without their transpose");
    }

    #[test]
    fn symmetric_sampling_skips_transposes_outside_matrix() {
        let policy = SamplingPolicy::new(6).symmetric(true);
        let samples = generate_samples_with(&mut rng(), 2, 3, &policy);

        assert_eq!(samples.len(), 6);
        assert!(samples.iter().all(|c| c.row < 2 && c.col < 3));
    }

    #[test]
    fn thread_rng_sampling() {
        let samples = generate_samples(64, 64, &SamplingPolicy::new(10));
        assert_eq!(samples.len(), 10);
        assert_unique(&samples);
    }
}
