use std::fs;
use std::path::Path;

use rand::Rng;
use wavedma_machines::registry;
use wavedma_validation::{PlaybackCase, generate_case, pattern_case, write_vectors};

const NUM_TESTS: usize = 500;

fn generate_random(rng: &mut impl Rng) -> Vec<PlaybackCase> {
    (0..NUM_TESTS)
        .map(|i| generate_case(rng, format!("random/{i:04}")))
        .collect()
}

fn generate_patterns(rng: &mut impl Rng) -> Vec<PlaybackCase> {
    let mut cases = Vec::new();
    for entry in registry::all() {
        for len in [1, 7, 60, 256, 1020] {
            let period = rng.gen_range(1..=16);
            let latency = rng.gen_range(0..=8);
            match pattern_case(entry, len, period, latency) {
                Ok(case) => cases.push(case),
                Err(e) => eprintln!("Skipping {}/{len}: {e}", entry.name),
            }
        }
    }
    cases
}

fn write_set(out_dir: &Path, name: &str, cases: &[PlaybackCase]) {
    let out_path = out_dir.join(format!("{name}.json.gz"));
    write_vectors(&out_path, cases).unwrap_or_else(|e| {
        eprintln!("Failed to write {}: {e}", out_path.display());
        std::process::exit(1);
    });
    println!(
        "Generated {} cases -> {}",
        cases.len(),
        out_path.display()
    );
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 || !matches!(args[1].as_str(), "random" | "patterns" | "all") {
        eprintln!("Usage: gen_playback_vectors <random | patterns | all>");
        std::process::exit(1);
    }

    let out_dir = Path::new("test_data/playback");
    fs::create_dir_all(out_dir).expect("Failed to create output directory");

    let mut rng = rand::thread_rng();

    if matches!(args[1].as_str(), "random" | "all") {
        write_set(out_dir, "random", &generate_random(&mut rng));
    }
    if matches!(args[1].as_str(), "patterns" | "all") {
        write_set(out_dir, "patterns", &generate_patterns(&mut rng));
    }
}
