// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `accel-mnist run` command: compile, infer all ten digits, verify.
//!
//! When the model or digit files cannot be found, falls back to a
//! synthetic template model generated in memory, exercising the same
//! pipeline path end to end.

use pipeline::{
    ascii_art, read_digit_image, synthetic, DigitImage, DigitOutcome, DigitPipeline,
    InferenceReport, PipelineError, SampleConfig,
};

pub fn execute(config: SampleConfig) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║          accel-mnist · Inference Runner             ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();
    println!("  Config:");
    println!("   Data dirs:  {:?}", config.data_dirs);
    println!("   Precision:  {}", config.precision());
    println!("   Partition:  {:?}", config.partition);
    println!("   Workspace:  {}", config.workspace);
    println!("   Input:      '{}' ({})", config.input_name, config.input_dims);
    println!("   Output:     '{}'", config.output_name);
    println!();

    // ── Build ──────────────────────────────────────────────────
    println!("  [1/3] Parsing the model and compiling the engine...");

    let built = match DigitPipeline::new(config.clone()).build() {
        Ok(built) => built,
        Err(PipelineError::DataFileNotFound { name, searched }) => {
            tracing::warn!("'{name}' not found in {searched:?}");
            println!("        Model files not found. Running synthetic demo...");
            println!();
            return run_synthetic_demo(config);
        }
        Err(e) => return Err(e.into()),
    };
    println!("        {}", built.engine().summary());
    println!();

    // ── Infer ──────────────────────────────────────────────────
    println!("  [2/3] Running {} verified inference passes...", pipeline::DIGITS);
    let report = built.infer()?;

    let width = built.input_dims().width;
    for outcome in &report.outcomes {
        let image = read_digit_image(outcome.digit, &config.data_dirs).ok();
        print_outcome(outcome, image.as_ref(), width);
    }
    print_summary(&report);

    // ── Teardown ───────────────────────────────────────────────
    println!("  [3/3] Tearing down.");
    built.teardown();

    if !report.all_correct() {
        anyhow::bail!("one or more predictions did not match their label");
    }
    Ok(())
}

/// Runs the whole pipeline against an in-memory template model.
fn run_synthetic_demo(config: SampleConfig) -> anyhow::Result<()> {
    let dims = config.input_dims;
    let graph = synthetic::template_graph(config.input_binding(), &config.output_name);
    println!("  Model: {}", graph.summary());

    let built = DigitPipeline::new(config).build_from_graph(&graph)?;
    println!("  {}", built.engine().summary());
    println!();

    let report = built.infer_with(|digit| Ok(synthetic::digit_image(digit, dims)))?;

    for outcome in &report.outcomes {
        let image = synthetic::digit_image(outcome.digit, dims);
        print_outcome(outcome, Some(&image), dims.width);
    }
    print_summary(&report);
    built.teardown();

    if !report.all_correct() {
        anyhow::bail!("one or more predictions did not match their label");
    }
    Ok(())
}

/// Prints one digit's input rendering and score table.
fn print_outcome(outcome: &DigitOutcome, image: Option<&DigitImage>, width: usize) {
    println!("  Input (digit {}):", outcome.digit);
    if let Some(image) = image {
        for line in ascii_art(image, width).lines() {
            println!("   {line}");
        }
    }
    println!("  Output:");
    for (class, score) in outcome.scores.iter().enumerate() {
        let marker = if class == outcome.predicted { " ***" } else { "" };
        println!("   {class} => {score:>10.6}{marker}");
    }
    println!(
        "   predicted {}: {} ({:.3} ms)",
        outcome.predicted,
        if outcome.correct { "correct" } else { "WRONG" },
        outcome.execute_duration.as_secs_f64() * 1000.0,
    );
    println!();
}

fn print_summary(report: &InferenceReport) {
    println!(
        "  Average over {} runs is {:.3} ms.",
        report.outcomes.len(),
        report.average_execute_ms(),
    );
    println!("  {}", report.summary());
    println!();
}
