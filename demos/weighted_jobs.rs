//! Weighted sampling of a job-posting stream.
//!
//! Filters a synthetic corpus down to two SOC major groups, then samples 100
//! postings per pass with group 13 weighted twice as heavily as group 11.

use std::collections::HashMap;

use jobsample::{FnSource, JobSampler, RecordFilter, SamplerConfig};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

#[derive(Debug, Clone)]
struct Posting {
    id: u32,
    soc_code: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Re-read on every pass, as a corpus loader would.
    let corpus = FnSource::new(|| {
        (0..2_000u32).map(|id| {
            Ok::<_, std::io::Error>(Posting {
                id,
                soc_code: format!("{}-1011.00", 11 + 2 * (id % 4)),
            })
        })
    });

    let major = |p: &Posting| p.soc_code[..2].to_string();
    let filtered = RecordFilter::pass_through(corpus).with(move |p| {
        let g = major(p);
        g == "11" || g == "13"
    });

    let config: SamplerConfig =
        serde_json::from_str(r#"{"k": 100, "weights": {"11": 1.0, "13": 2.0}}"#)?;
    let sampler = JobSampler::from_config_keyed(filtered, config, major)?;

    let mut totals: HashMap<String, usize> = HashMap::new();
    let passes = 50;
    for sample in sampler.passes_with_rng(ChaCha8Rng::seed_from_u64(7)).take(passes) {
        for posting in sample? {
            *totals.entry(major(&posting)).or_default() += 1;
        }
    }

    let first = sampler.sample_with_rng(&mut ChaCha8Rng::seed_from_u64(7))?;
    println!("first pass ids[0..5]: {:?}", first.iter().take(5).map(|p| p.id).collect::<Vec<_>>());
    println!("totals over {passes} passes: {totals:?}");
    if let (Some(a), Some(b)) = (totals.get("11"), totals.get("13")) {
        println!("ratio 13/11 = {:.2} (weights say 2.00)", *b as f64 / *a as f64);
    }

    Ok(())
}
