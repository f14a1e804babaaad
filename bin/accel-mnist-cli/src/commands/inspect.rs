// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `accel-mnist inspect` command: display the model graph and the
//! compiled engine's binding table.

use graph_ir::GraphLoader;
use pipeline::{locate_file, DigitPipeline, SampleConfig};

pub fn execute(config: SampleConfig) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║          accel-mnist · Model Inspector              ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let manifest_path = locate_file("graph.json", &config.data_dirs)
        .map_err(|e| anyhow::anyhow!("cannot locate model: {e}"))?;
    let model_dir = manifest_path
        .parent()
        .map(std::path::Path::to_path_buf)
        .unwrap_or_else(|| std::path::PathBuf::from("."));

    let graph = GraphLoader::load(
        &model_dir,
        config.input_binding(),
        &config.output_name,
    )
    .map_err(|e| anyhow::anyhow!("failed to load model from '{}': {e}", model_dir.display()))?;

    // ── Graph ──────────────────────────────────────────────────
    println!("  {}", graph.summary());
    println!();
    println!("  {:<4} {:<16} {:<16} {:<14} {:<14} {:>4}", "Idx", "Name", "Kind", "Input", "Output", "#W");
    println!("  {}", "-".repeat(72));
    for op in graph.ops() {
        println!(
            "  {:<4} {:<16} {:<16} {:<14} {:<14} {:>4}",
            op.index,
            op.name,
            op.kind.as_str(),
            op.input,
            op.output,
            op.weight_names.len(),
        );
    }
    println!();

    // ── Engine ─────────────────────────────────────────────────
    // Compile with the configured precision to show the binding table
    // the buffer manager would size from.
    let built = DigitPipeline::new(config).build_from_graph(&graph)?;
    let engine = built.engine();

    println!("  {}", engine.summary());
    println!();
    println!("  {:<6} {:<12} {:<12} {:>10}", "Slot", "Binding", "Shape", "Elements");
    println!("  {}", "-".repeat(44));
    for (slot, binding) in engine.bindings().iter().enumerate() {
        println!(
            "  {:<6} {:<12} {:<12} {:>10}",
            slot,
            binding.name,
            format!("{}", binding.shape),
            binding.num_elements(),
        );
    }
    println!();

    built.teardown();
    Ok(())
}
