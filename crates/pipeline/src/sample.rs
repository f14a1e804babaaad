// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The digit classification pipeline with type-state–enforced ordering.
//!
//! ```text
//! DigitPipeline<Unbuilt>
//!     │  .build() / .build_from_graph()
//!     ▼
//! DigitPipeline<Built>
//!     │  .infer()        (ten digits, sequential, synchronous)
//!     ▼
//!   InferenceReport
//!     │  .teardown()     (consumes; terminal)
//! ```
//!
//! Each transition consumes the old value, so calling `infer()` before
//! `build()` or anything after `teardown()` is a compile error. The
//! pipeline owns a [`ParserLibrary`] guard for its whole lifetime, so
//! parser resources are released on failure paths exactly like on the
//! success path.

use crate::{
    classify, data, input, verify, write_normalized, DigitImage, DigitOutcome, InferenceReport,
    PipelineError, SampleConfig, DIGITS,
};
use accel_backend::{Accelerator, CompiledEngine, ReferenceAccelerator};
use buffer_manager::BufferManager;
use graph_ir::{ComputationGraph, GraphLoader, ParserLibrary};
use std::time::Instant;
use tensor_core::Dims3;

// ── Type-state markers ─────────────────────────────────────────

/// Pipeline is created but no engine exists yet.
#[derive(Debug)]
pub struct Unbuilt;

/// The engine is compiled and ready for inference.
#[derive(Debug)]
pub struct Built;

/// Sealed trait for pipeline states.
pub trait PipelineState: std::fmt::Debug {}
impl PipelineState for Unbuilt {}
impl PipelineState for Built {}

/// Uniform dynamic-range scale applied when quantized-integer precision
/// is requested, standing in for a calibration procedure.
const UNIFORM_INT8_SCALE: f32 = 127.0;

// ── Pipeline ───────────────────────────────────────────────────

/// The end-to-end sample pipeline.
///
/// `S` encodes the build state at compile time. The accelerator sits
/// behind the [`Accelerator`] trait, so tests can substitute a fake.
///
/// # Example
/// ```no_run
/// use pipeline::{DigitPipeline, SampleConfig};
///
/// # fn demo() -> Result<(), pipeline::PipelineError> {
/// let built = DigitPipeline::new(SampleConfig::default()).build()?;
/// let report = built.infer()?;
/// println!("{}", report.summary());
/// built.teardown();
/// # Ok(())
/// # }
/// ```
pub struct DigitPipeline<S: PipelineState = Unbuilt> {
    config: SampleConfig,
    accelerator: Box<dyn Accelerator>,
    // Held for the pipeline's lifetime; released on drop along every
    // exit path.
    _parser: ParserLibrary,
    _state: std::marker::PhantomData<S>,
    // Populated by the Unbuilt → Built transition:
    engine: Option<CompiledEngine>,
    input_dims: Option<Dims3>,
}

// ── Unbuilt → Built ────────────────────────────────────────────

impl DigitPipeline<Unbuilt> {
    /// Creates a pipeline over the reference accelerator.
    pub fn new(config: SampleConfig) -> Self {
        Self::with_accelerator(config, Box::new(ReferenceAccelerator::new()))
    }

    /// Creates a pipeline over an explicit accelerator implementation.
    pub fn with_accelerator(config: SampleConfig, accelerator: Box<dyn Accelerator>) -> Self {
        Self {
            config,
            accelerator,
            _parser: ParserLibrary::initialise(),
            _state: std::marker::PhantomData,
            engine: None,
            input_dims: None,
        }
    }

    /// Loads the model from the configured data directories and compiles
    /// it. Transitions to the `Built` state.
    ///
    /// One-shot and synchronous: this runs once at startup and is not
    /// cancellable.
    pub fn build(self) -> Result<DigitPipeline<Built>, PipelineError> {
        let model_dir = data::locate_model_dir(&self.config.data_dirs)?;
        tracing::info!("loading model from '{}'", model_dir.display());

        let mut graph = GraphLoader::load(
            &model_dir,
            self.config.input_binding(),
            &self.config.output_name,
        )?;
        self.finish_build(&mut graph)
    }

    /// Compiles an already-constructed graph (synthetic demo, tests).
    /// Transitions to the `Built` state.
    pub fn build_from_graph(
        self,
        graph: &ComputationGraph,
    ) -> Result<DigitPipeline<Built>, PipelineError> {
        let mut graph = graph.clone();
        self.finish_build(&mut graph)
    }

    fn finish_build(
        self,
        graph: &mut ComputationGraph,
    ) -> Result<DigitPipeline<Built>, PipelineError> {
        if self.config.int8 {
            graph.set_uniform_scale(UNIFORM_INT8_SCALE);
        }

        let builder_config = self.config.builder_config()?;
        tracing::info!(
            "compiling with precision {}, workspace {}, partition {:?}",
            builder_config.precision,
            builder_config.workspace,
            builder_config.partition,
        );

        let engine = self.accelerator.compile(graph, &builder_config)?;
        let input_dims = engine.input_dims()?;

        // The engine must report exactly the declared shape; a mismatch
        // is a configuration error, never something to silently reshape.
        if input_dims != self.config.input_dims {
            return Err(PipelineError::Config(format!(
                "engine reports input {input_dims}, declared {}",
                self.config.input_dims,
            )));
        }

        tracing::info!("{}", engine.summary());

        Ok(DigitPipeline {
            config: self.config,
            accelerator: self.accelerator,
            _parser: self._parser,
            _state: std::marker::PhantomData,
            engine: Some(engine),
            input_dims: Some(input_dims),
        })
    }
}

// ── Built: infer and teardown ──────────────────────────────────

impl DigitPipeline<Built> {
    /// The compiled engine.
    pub fn engine(&self) -> &CompiledEngine {
        self.engine.as_ref().expect("engine exists in Built state")
    }

    /// The engine's reported input shape.
    pub fn input_dims(&self) -> Dims3 {
        self.input_dims.expect("input dims exist in Built state")
    }

    /// Runs the ten per-digit inference passes over the digit files in
    /// the configured data directories.
    pub fn infer(&self) -> Result<InferenceReport, PipelineError> {
        let dirs = self.config.data_dirs.clone();
        self.infer_with(|digit| data::read_digit_image(digit, &dirs))
    }

    /// Runs the ten per-digit inference passes with a caller-supplied
    /// image source.
    ///
    /// One buffer manager and one execution context are created up front
    /// and reused sequentially across all ten calls; no two calls
    /// overlap. Any stage failure aborts the whole run immediately.
    pub fn infer_with(
        &self,
        mut load_image: impl FnMut(usize) -> Result<DigitImage, PipelineError>,
    ) -> Result<InferenceReport, PipelineError> {
        let engine = self.engine();
        let dims = self.input_dims();
        let batch_size = self.config.batch_size;

        let mut buffers = BufferManager::new(engine, batch_size)?;
        let mut context = engine.create_execution_context();
        let mut report = InferenceReport::new();

        let output_elements = engine
            .binding(&self.config.output_name)
            .map(|b| b.num_elements())
            .ok_or_else(|| {
                PipelineError::Config(format!(
                    "engine has no output binding '{}'",
                    self.config.output_name
                ))
            })?;

        for digit in 0..DIGITS {
            let image = load_image(digit)?;
            tracing::debug!("digit {digit} input:\n{}", input::ascii_art(&image, dims.width));

            let host_input = buffers
                .host_buffer_mut(&self.config.input_name)
                .ok_or_else(|| {
                    PipelineError::Config(format!(
                        "engine has no input binding '{}'",
                        self.config.input_name
                    ))
                })?;
            write_normalized(&image, dims, host_input)?;

            buffers.copy_inputs_to_device()?;

            let started = Instant::now();
            context.execute(batch_size, &buffers.device_binding_table())?;
            let execute_duration = started.elapsed();

            buffers.copy_outputs_to_host()?;

            let host_output = buffers
                .host_buffer(&self.config.output_name)
                .expect("output binding resolved above");
            let scores = host_output[..output_elements].to_vec();

            let predicted = classify(&scores);
            let correct = verify(&scores, digit);
            tracing::info!(
                "digit {digit}: predicted {predicted} ({}) in {:.3} ms",
                if correct { "correct" } else { "WRONG" },
                execute_duration.as_secs_f64() * 1000.0,
            );

            report.record(DigitOutcome {
                digit,
                scores,
                predicted,
                correct,
                execute_duration,
            });
        }

        report.finalise(buffers.stats());
        tracing::info!(
            "average over {DIGITS} runs: {:.3} ms",
            report.average_execute_ms(),
        );

        Ok(report)
    }

    /// Tears the pipeline down, releasing the engine and — if this was
    /// the last user — the parser library's shared state. Terminal: the
    /// pipeline value is consumed.
    pub fn teardown(self) {
        tracing::debug!("pipeline torn down");
        // Engine and parser guard drop here.
    }
}

impl<S: PipelineState> std::fmt::Debug for DigitPipeline<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DigitPipeline")
            .field("state", &std::any::type_name::<S>())
            .field("accelerator", &self.accelerator.name())
            .field("has_engine", &self.engine.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic;
    use tensor_core::TensorOrder;

    fn synthetic_config() -> SampleConfig {
        SampleConfig {
            input_dims: Dims3::new(1, 20, 20),
            ..Default::default()
        }
    }

    fn built_pipeline(config: SampleConfig) -> DigitPipeline<Built> {
        let graph = synthetic::template_graph(config.input_binding(), &config.output_name);
        DigitPipeline::new(config).build_from_graph(&graph).unwrap()
    }

    #[test]
    fn test_build_from_graph() {
        let pipeline = built_pipeline(synthetic_config());
        assert_eq!(pipeline.input_dims(), Dims3::new(1, 20, 20));
        assert_eq!(pipeline.engine().num_inputs(), 1);
    }

    #[test]
    fn test_infer_all_digits_correct() {
        let config = synthetic_config();
        let dims = config.input_dims;
        let pipeline = built_pipeline(config);

        let report = pipeline
            .infer_with(|digit| Ok(synthetic::digit_image(digit, dims)))
            .unwrap();

        assert_eq!(report.outcomes.len(), DIGITS);
        assert!(report.all_correct());
        for outcome in &report.outcomes {
            assert_eq!(outcome.predicted, outcome.digit);
            assert_eq!(outcome.scores.len(), DIGITS);
        }
        assert!(report.average_execute_ms() >= 0.0);
        assert_eq!(report.transfers.h2d_copies, DIGITS as u64);
        assert_eq!(report.transfers.d2h_copies, DIGITS as u64);
    }

    #[test]
    fn test_infer_wrong_size_image_aborts() {
        let pipeline = built_pipeline(synthetic_config());

        let mut calls = 0usize;
        let result = pipeline.infer_with(|_| {
            calls += 1;
            Ok(DigitImage::new(vec![0u8; 17]))
        });

        assert!(matches!(result, Err(PipelineError::Input(_))));
        // The first failure aborted the loop.
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_infer_image_load_failure_aborts() {
        let pipeline = built_pipeline(synthetic_config());

        let result = pipeline.infer_with(|digit| {
            if digit == 3 {
                Err(PipelineError::DataFileNotFound {
                    name: "3.raw".into(),
                    searched: vec![],
                })
            } else {
                Ok(synthetic::digit_image(digit, Dims3::new(1, 20, 20)))
            }
        });

        assert!(matches!(result, Err(PipelineError::DataFileNotFound { .. })));
    }

    #[test]
    fn test_declared_dims_must_match_engine() {
        // The graph (and therefore the engine) carries a 20x20 input,
        // but the config declares 28x28; the pipeline must refuse
        // rather than reshape.
        let config = SampleConfig::default(); // 1x28x28
        let graph = synthetic::template_graph(
            graph_ir::TensorBinding::new("in", Dims3::new(1, 20, 20), TensorOrder::Nchw),
            "out",
        );
        let result = DigitPipeline::new(config).build_from_graph(&graph);
        assert!(matches!(result, Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_int8_build_applies_scales() {
        let config = SampleConfig {
            int8: true,
            ..synthetic_config()
        };
        let dims = config.input_dims;
        let pipeline = built_pipeline(config);
        assert_eq!(
            pipeline.engine().precision(),
            accel_backend::PrecisionMode::QuantizedInt8
        );

        let report = pipeline
            .infer_with(|digit| Ok(synthetic::digit_image(digit, dims)))
            .unwrap();
        assert!(report.all_correct());
    }

    #[test]
    fn test_fp16_build() {
        let config = SampleConfig {
            fp16: true,
            ..synthetic_config()
        };
        let dims = config.input_dims;
        let pipeline = built_pipeline(config);
        assert_eq!(
            pipeline.engine().precision(),
            accel_backend::PrecisionMode::ReducedPrecision
        );

        let report = pipeline
            .infer_with(|digit| Ok(synthetic::digit_image(digit, dims)))
            .unwrap();
        assert!(report.all_correct());
    }

    #[test]
    fn test_teardown_consumes_pipeline() {
        let pipeline = built_pipeline(synthetic_config());
        // The guard count is global and other tests run in parallel, so
        // only assert liveness here; exact counting is covered by the
        // lifecycle tests in graph-ir.
        assert!(ParserLibrary::active_count() >= 1);
        pipeline.teardown();
    }

    #[test]
    fn test_build_missing_model_fails() {
        let config = SampleConfig {
            data_dirs: vec![std::path::PathBuf::from("/nonexistent")],
            ..Default::default()
        };
        let result = DigitPipeline::new(config).build();
        assert!(matches!(
            result,
            Err(PipelineError::DataFileNotFound { .. })
        ));
    }

    #[test]
    fn test_debug_format() {
        let pipeline = DigitPipeline::new(SampleConfig::default());
        let text = format!("{pipeline:?}");
        assert!(text.contains("DigitPipeline"));
        assert!(text.contains("reference"));
    }
}
