// Cross-validation of the loaded native library against the reference
// implementation on randomized inputs. When the cdylib cannot be found next
// to the test binary, the bridge falls back and the comparison still holds.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tessera_vector_ops::config::Settings;
use tessera_vector_ops::vector::{self, EmbeddingMatrix};
use tessera_vector_ops::{NativeBridge, hash_content};

const TOLERANCE: f32 = 1e-5;

fn bridge() -> NativeBridge {
    let bridge = NativeBridge::from_settings(&Settings::default());
    if bridge.is_available() {
        println!(
            "native library loaded from {:?}",
            bridge.loaded_path().map(|p| p.display().to_string())
        );
    } else {
        println!(
            "native library unavailable ({}), comparing fallback",
            bridge.unavailable_reason().unwrap_or("unknown")
        );
    }
    bridge
}

fn random_vector(rng: &mut StdRng, dim: usize) -> Vec<f32> {
    (0..dim).map(|_| rng.random_range(-1.0f32..1.0)).collect()
}

#[test]
fn cosine_agrees_on_random_vectors() {
    let bridge = bridge();
    let mut rng = StdRng::seed_from_u64(0x7e55e7a);

    for _ in 0..200 {
        let dim = rng.random_range(1..=97);
        let a = random_vector(&mut rng, dim);
        let b = random_vector(&mut rng, dim);

        let native = bridge.cosine_similarity(&a, &b);
        let reference = vector::cosine_similarity(&a, &b);
        assert!(
            (native - reference).abs() < TOLERANCE,
            "dim {dim}: native {native}, reference {reference}"
        );
    }
}

#[test]
fn batch_agrees_and_matches_pairwise_scores() {
    let bridge = bridge();
    let mut rng = StdRng::seed_from_u64(384);

    for rows in [1usize, 7, 64, 300] {
        let dim = 384;
        let query = random_vector(&mut rng, dim);
        let data: Vec<f32> = (0..rows * dim)
            .map(|_| rng.random_range(-1.0f32..1.0))
            .collect();
        let matrix = EmbeddingMatrix::from_slice(&data, dim).unwrap();

        let native = bridge.batch_cosine_similarity(&query, &matrix);
        assert_eq!(native.len(), rows);

        for (i, row) in matrix.iter_rows().enumerate() {
            let pairwise = vector::cosine_similarity(&query, row);
            assert!(
                (native[i] - pairwise).abs() < TOLERANCE,
                "row {i}: batch {}, pairwise {pairwise}",
                native[i]
            );
        }
    }
}

#[test]
fn threshold_agrees_with_reference_filter() {
    let bridge = bridge();
    let mut rng = StdRng::seed_from_u64(17);
    let dim = 17;
    let query = random_vector(&mut rng, dim);
    let data: Vec<f32> = (0..500 * dim)
        .map(|_| rng.random_range(-1.0f32..1.0))
        .collect();
    let matrix = EmbeddingMatrix::from_slice(&data, dim).unwrap();

    for threshold in [-0.5f32, 0.0, 0.2, 0.6] {
        let native = bridge.batch_similarity_with_threshold(&query, &matrix, threshold);
        let reference = vector::batch_similarity_with_threshold(&query, &matrix, threshold);

        assert_eq!(native.indices, reference.indices, "threshold {threshold}");
        assert!(native.indices.windows(2).all(|w| w[0] < w[1]));
        assert!(native.scores.iter().all(|&s| s > threshold));
        for (n, r) in native.scores.iter().zip(&reference.scores) {
            assert!((n - r).abs() < TOLERANCE);
        }
    }
}

#[test]
fn normalize_and_magnitude_agree() {
    let bridge = bridge();
    let mut rng = StdRng::seed_from_u64(99);

    for _ in 0..50 {
        let dim = rng.random_range(1..=64);
        let original = random_vector(&mut rng, dim);

        let native_mag = bridge.vector_magnitude(&original);
        let reference_mag = vector::vector_magnitude(&original);
        assert!((native_mag - reference_mag).abs() < TOLERANCE);

        let mut v = original.clone();
        bridge.normalize_vector(&mut v);
        assert!((vector::vector_magnitude(&v) - 1.0).abs() < 1e-3);
    }
}

#[test]
fn fingerprints_agree_with_reference() {
    let bridge = bridge();
    for content in ["", "a", "fn main() {}", "struct Point { x: f32, y: f32 }"] {
        assert_eq!(
            bridge.hash_content(content.as_bytes()),
            hash_content(content.as_bytes()),
            "content {content:?}"
        );
    }
}
