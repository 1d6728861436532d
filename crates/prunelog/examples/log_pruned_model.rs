//! Simulates gradual magnitude pruning of a small network and logs every
//! epoch to TensorBoard, the console and CSV files under `./logs`.

use ndarray::{ArrayD, IxDyn};
use prunelog::prelude::*;
use tracing_subscriber::EnvFilter;

fn ramp(shape: &[usize]) -> ArrayD<f32> {
    let n: usize = shape.iter().product();
    let values = (0..n)
        .map(|i| ((i as f32 * 0.37).sin()) * (1.0 + i as f32 / n as f32))
        .collect();
    ArrayD::from_shape_vec(IxDyn(shape), values).expect("shape matches length")
}

/// Zero every weight whose magnitude is below `threshold`.
fn prune(t: &ArrayD<f32>, threshold: f32) -> ArrayD<f32> {
    t.mapv(|v| if v.abs() < threshold { 0.0 } else { v })
}

fn build_model(threshold: f32) -> Module {
    Module::new()
        .with_child(
            "conv1",
            Module::new()
                .with_parameter("weight", Parameter::new(prune(&ramp(&[8, 3, 3, 3]), threshold)))
                .with_parameter("bias", Parameter::new(ramp(&[8]))),
        )
        .with_child(
            "bn1",
            Module::new()
                .with_parameter("weight", Parameter::new(ArrayD::ones(IxDyn(&[8]))))
                .with_buffer("running_mean", ramp(&[8])),
        )
        .with_child(
            "fc",
            Module::new()
                .with_parameter(
                    "weight",
                    Parameter::new(prune(&ramp(&[10, 32]), threshold))
                        .with_grad(ramp(&[10, 32]).mapv(|v| v * 0.01)),
                )
                .with_parameter("bias", Parameter::new(ramp(&[10]))),
        )
}

fn main() -> Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive("info".parse().expect("valid directive"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = LoggerConfig::new("logs")
        .comment("_pruning_demo")
        .fname_prefix("demo")
        .log_gradients(true);

    let mut loggers = CompositeLogger::new(vec![
        Box::new(ScalarHistogramLogger::tensorboard(&config)?),
        Box::new(TextLogger::new()),
        Box::new(TabularLogger::new(&config)),
    ]);

    let steps_per_epoch = 50;
    for epoch in 0..5u64 {
        let model = build_model(0.2 * epoch as f32);

        for step in (10..=steps_per_epoch).step_by(10) {
            let stats = StatsRecord::new("Performance/Training/")
                .with("Overall Loss", 2.0 / (1.0 + epoch as f64 + step as f64 / 50.0))
                .with("Samples", (step * 128) as i64);
            loggers.log_training_progress(&stats, Progress::new(epoch, step, steps_per_epoch))?;
        }

        loggers.log_weights_sparsity(&model, epoch)?;
        loggers.log_weights_filter_magnitude(&model, epoch)?;
        let params = model.named_parameters();
        loggers.log_weights_distribution(Some(params.as_slice()), epoch * steps_per_epoch)?;
        loggers.log_model_buffers(
            &model,
            &["running_mean"],
            "bn",
            Progress::new(epoch, steps_per_epoch, steps_per_epoch),
        )?;
        loggers.flush()?;
    }

    Ok(())
}
