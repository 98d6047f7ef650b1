//! Seeded train/evaluation partitioning.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Row indices of the two partitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub eval: Vec<usize>,
}

/// Shuffle `0..n` with `seed` and hold out `ceil(n * eval_fraction)` rows.
///
/// The training partition always keeps at least one row.
pub fn train_eval_split(n: usize, eval_fraction: f64, seed: u64) -> Result<SplitIndices, String> {
    if n == 0 {
        return Err("Cannot split an empty dataset".to_string());
    }
    if !(0.0..1.0).contains(&eval_fraction) {
        return Err(format!("Invalid evaluation fraction {eval_fraction}"));
    }
    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);

    let eval_n = ((n as f64) * eval_fraction).ceil() as usize;
    let eval_n = eval_n.min(n - 1);
    let train = order.split_off(eval_n);
    Ok(SplitIndices { train, eval: order })
}
