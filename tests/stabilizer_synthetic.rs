//! Synthetic jitter suite: a seeded classifier stream that mostly reports the
//! true class but now and then spikes on a wrong one. The raw argmax follows
//! every spike; the stabilized decision should not.

use prediction_stabilizer::{PredictionStabilizer, RawPrediction, NO_DECISION};
use rand::{rngs::StdRng, Rng, SeedableRng};

const CLASSES: usize = 3;
const SEGMENT: usize = 60;
// frames after a class switch where both sides are allowed to lag
const SETTLE: usize = 10;

fn noisy_frame(rng: &mut StdRng, truth: usize) -> Vec<f64> {
    let mut v = vec![0.0f64; CLASSES];
    if rng.random_bool(0.1) {
        let wrong = (truth + 1 + rng.random_range(0..CLASSES - 1)) % CLASSES;
        v[wrong] = 0.85;
        v[truth] = 0.1;
    } else {
        v[truth] = 0.92 + rng.random_range(-0.04f64..0.04);
    }
    let rest = (1.0 - v.iter().sum::<f64>()).max(0.0);
    let empty = v.iter().filter(|&&x| x == 0.0).count().max(1);
    for x in v.iter_mut().filter(|x| **x == 0.0) {
        *x = rest / empty as f64;
    }
    v
}

fn argmax(v: &[f64]) -> usize {
    let mut best = 0;
    for (i, &x) in v.iter().enumerate().skip(1) {
        if x > v[best] {
            best = i;
        }
    }
    best
}

#[test]
fn stabilized_stream_ignores_spikes() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut s = PredictionStabilizer::default();

    let schedule = [0usize, 1, 2, 0];
    let mut raw_wrong = 0;
    let mut stable_wrong = 0;
    let mut stable_seq = Vec::new();

    for &truth in &schedule {
        for i in 0..SEGMENT {
            let f = noisy_frame(&mut rng, truth);
            let decided = s.ingest(&RawPrediction::from_dense(&f)).class_index;
            stable_seq.push(decided);
            if i < SETTLE {
                continue;
            }
            if argmax(&f) != truth {
                raw_wrong += 1;
            }
            if decided != NO_DECISION && decided != truth as i32 {
                stable_wrong += 1;
            }
        }
    }

    eprintln!("raw wrong={raw_wrong}, stabilized wrong={stable_wrong}");
    assert!(raw_wrong > 0, "seeded stream should contain spikes");
    assert!(stable_wrong < raw_wrong);
    assert!(stable_wrong <= 2, "stabilized picked a wrong class {stable_wrong} times");

    // Late in each segment the decision should match the true class.
    for (seg, &truth) in schedule.iter().enumerate() {
        let tail = &stable_seq[seg * SEGMENT + 40..(seg + 1) * SEGMENT];
        let hits = tail.iter().filter(|&&c| c == truth as i32).count();
        assert!(hits >= 15, "segment {seg}: only {hits}/20 frames picked class {truth}");
    }
}

#[test]
fn pure_noise_mostly_abstains() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut s = PredictionStabilizer::default();
    let mut abstained = 0;
    for _ in 0..200 {
        let f: Vec<f64> = (0..CLASSES).map(|_| rng.random_range(0.0f64..1.0)).collect();
        let sum: f64 = f.iter().sum::<f64>().max(1e-6);
        let f: Vec<f64> = f.iter().map(|x| x / sum).collect();
        if s.ingest(&RawPrediction::from_dense(&f)).class_index == NO_DECISION {
            abstained += 1;
        }
    }
    assert!(abstained >= 190, "abstained only {abstained}/200 on uniform noise");
}
