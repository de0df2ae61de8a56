//! Basic example of the condition counting pipeline.
//!
//! This example shows how to:
//! 1. Generate a synthetic recording
//! 2. Inspect the detector settings
//! 3. Run the pipeline
//! 4. Examine the per-condition counts

use epoch_spikes::prelude::*;

fn main() -> Result<()> {
    println!("=== Epoch Spikes Example ===\n");

    let config = RecordingConfig::default().with_dimensions(50_000, 5);
    let recording = generate_recording(&config)?;

    println!("Data dimensions:");
    println!("  Samples: {}", recording.table.n_rows());
    println!("  Neurons: {}", recording.table.neuron_columns().len());
    println!("  Injected spikes: {}", recording.total_spikes());
    println!();

    let detector = SpikeDetector::new(DetectorConfig::new(config.sample_rate, config.threshold))?;
    println!("=== Detector ===\n");
    println!("  Sample rate:      {} Hz", config.sample_rate);
    println!("  Threshold:        {}", config.threshold);
    println!("  Smoothing window: {} samples", detector.window());
    println!("  Min spike gap:    {} samples", detector.distance());
    println!();

    println!("=== Running Pipeline ===\n");
    let run = Pipeline::new()
        .name("demo")
        .execute(&recording.table, &recording.parameters)?;

    for ((name, detected), (_, injected)) in run.spikes_per_neuron.iter().zip(&recording.spike_times) {
        println!("  {:<10} detected {:>4}, injected {:>4}", name, detected, injected.len());
    }
    println!();

    println!("=== Spike Counts by Condition ===\n");
    print!("{}", run.counts);
    println!();

    // Rejected input produces an empty result rather than an error
    let mut broken = recording.parameters.clone();
    broken.insert("threshold", 0);
    let rejected = Pipeline::new().run(&recording.table, &broken)?;
    println!("Integer threshold accepted: {}", !rejected.is_empty());

    Ok(())
}
