use approx::assert_relative_eq;
use ndarray::{ArrayD, IxDyn};
use prunelog::prelude::*;
use prunelog::sink::SummaryEvent;
use std::fs;
use tempfile::tempdir;

fn arr(shape: &[usize], values: Vec<f32>) -> ArrayD<f32> {
    ArrayD::from_shape_vec(IxDyn(shape), values).unwrap()
}

/// 4x4 matrix with 6 non-zero entries.
fn sparse_4x4() -> ArrayD<f32> {
    let mut values = vec![0.0; 16];
    for (i, v) in [0, 3, 5, 6, 10, 15].iter().zip([1.0, -2.0, 0.5, 3.0, -1.0, 4.0]) {
        values[*i] = v;
    }
    arr(&[4, 4], values)
}

/// conv (4D), conv1d (3D), fc (2D) and 1D bias/batch-norm tensors.
fn small_net() -> Module {
    let mut conv = vec![0.0; 2 * 2 * 3 * 3];
    conv[0] = 1.0;
    conv[20] = -1.0;
    conv[35] = 2.0;

    Module::new()
        .with_child(
            "conv1",
            Module::new()
                .with_parameter("weight", Parameter::new(arr(&[2, 2, 3, 3], conv)))
                .with_parameter("bias", Parameter::new(arr(&[2], vec![0.1, 0.0]))),
        )
        .with_child(
            "bn1",
            Module::new()
                .with_parameter("weight", Parameter::new(arr(&[2], vec![1.0, 1.0])))
                .with_buffer("running_mean", arr(&[2], vec![0.2, -0.3])),
        )
        .with_child(
            "temporal",
            Module::new().with_parameter(
                "weight",
                Parameter::new(arr(&[2, 1, 2], vec![0.0, 1.0, 0.0, 0.0])),
            ),
        )
        .with_child(
            "fc",
            Module::new()
                .with_parameter("weight", Parameter::new(sparse_4x4()))
                .with_parameter("bias", Parameter::new(arr(&[4], vec![0.0; 4]))),
        )
}

fn memory_logger(config: &LoggerConfig) -> ScalarHistogramLogger<MemorySink> {
    ScalarHistogramLogger::new(MemorySink::new(), config)
}

#[test]
fn test_sparsity_writes_two_scalars_per_weight_and_total() {
    let model = small_net();
    let mut logger = memory_logger(&LoggerConfig::default());
    logger.log_weights_sparsity(&model, 5).unwrap();

    let events = logger.sink().events();
    let fine = events
        .iter()
        .filter(|e| {
            e.tag().starts_with("sparsity/weights/") && e.tag() != "sparsity/weights/total"
        })
        .count();
    let blocks = events
        .iter()
        .filter(|e| e.tag().starts_with("sparsity-2D/weights/"))
        .count();
    let totals = events
        .iter()
        .filter(|e| e.tag() == "sparsity/weights/total")
        .count();

    // conv1.weight, temporal.weight, fc.weight
    assert_eq!(fine, 3);
    assert_eq!(blocks, 3);
    assert_eq!(totals, 1);
    assert_eq!(events.len(), 7);
    assert!(events.iter().all(|e| e.step() == 5));

    // 100 * (1 - sum(nnz) / sum(numel))
    let expected = 100.0 * (1.0 - (3.0 + 1.0 + 6.0) / (36.0 + 4.0 + 16.0));
    assert_relative_eq!(
        logger.sink().scalar("sparsity/weights/total").unwrap(),
        expected as f32,
        epsilon = 1e-4
    );
    assert_relative_eq!(logger.sink().scalar("sparsity/weights/fc.weight").unwrap(), 62.5);
}

#[test]
fn test_sparsity_without_qualifying_weights_is_guarded() {
    let model = Module::new().with_child(
        "bn",
        Module::new().with_parameter("weight", Parameter::new(arr(&[3], vec![1.0; 3]))),
    );
    let mut logger = memory_logger(&LoggerConfig::default());
    logger.log_weights_sparsity(&model, 0).unwrap();

    assert!(logger.sink().events().is_empty());

    let dir = tempdir().unwrap();
    let mut csv = TabularLogger::new(&LoggerConfig::new(dir.path()));
    csv.log_weights_sparsity(&model, 0).unwrap();
    let contents = fs::read_to_string(csv.get_fname("weights_sparsity")).unwrap();
    assert_eq!(contents.lines().count(), 1);
}

#[test]
fn test_training_progress_global_step_and_key() {
    let mut logger = memory_logger(&LoggerConfig::default());
    let stats = StatsRecord::new("Performance/Validation/").with("Top 5", 98.25);
    logger
        .log_training_progress(&stats, Progress::new(3, 4, 10))
        .unwrap();

    assert_eq!(
        logger.sink().events(),
        &[SummaryEvent::Scalar {
            tag: "Performance/Validation/Top_5".to_string(),
            value: 98.25,
            step: 34,
        }]
    );
}

#[test]
fn test_distribution_without_params_writes_nothing() {
    let mut logger = memory_logger(&LoggerConfig::default().log_gradients(true));
    logger.log_weights_distribution(None, 10).unwrap();
    logger.log_weights_distribution(Some(&[][..]), 10).unwrap();
    assert!(logger.sink().events().is_empty());
}

#[test]
fn test_distribution_filters_by_name() {
    let weight = Parameter::new(arr(&[2, 2], vec![0.1, -0.2, 0.3, 0.0]))
        .with_grad(arr(&[2, 2], vec![0.01, 0.02, -0.01, 0.0]));
    let bias = Parameter::new(arr(&[2], vec![0.5, 0.5])).with_grad(arr(&[2], vec![0.1, 0.1]));
    let params = vec![
        ("layer1.weight".to_string(), &weight),
        ("layer1.bias".to_string(), &bias),
    ];

    let mut logger = memory_logger(&LoggerConfig::default());
    logger.log_weights_distribution(Some(params.as_slice()), 12).unwrap();
    let tags: Vec<_> = logger.sink().events().iter().map(|e| e.tag().to_string()).collect();
    assert_eq!(tags, vec!["layer1/weight"]);

    // Gradients of parameters outside the name filter are logged too
    let mut logger = memory_logger(&LoggerConfig::default().log_gradients(true));
    logger.log_weights_distribution(Some(params.as_slice()), 12).unwrap();
    let tags: Vec<_> = logger.sink().events().iter().map(|e| e.tag().to_string()).collect();
    assert_eq!(
        tags,
        vec!["layer1/weight", "layer1/weight/grad", "layer1/bias/grad"]
    );

    match &logger.sink().events()[0] {
        SummaryEvent::Histogram { histogram, step, .. } => {
            assert_eq!(*step, 12);
            assert_eq!(histogram.num, 4.0);
        }
        other => panic!("expected histogram, got {:?}", other),
    }
}

#[test]
fn test_distribution_gradient_requires_grad() {
    let weight = Parameter::new(arr(&[3], vec![1.0, 2.0, 3.0]));
    let params = vec![("fc.weight".to_string(), &weight)];
    let mut logger = memory_logger(&LoggerConfig::default().log_gradients(true));
    logger.log_weights_distribution(Some(params.as_slice()), 0).unwrap();
    assert_eq!(logger.sink().events().len(), 1);
}

#[test]
fn test_distribution_custom_filter() {
    let model = small_net();
    let params = model.named_parameters();
    let mut logger = memory_logger(&LoggerConfig::default().logged_params(["bias"]));
    logger.log_weights_distribution(Some(params.as_slice()), 0).unwrap();
    let tags: Vec<_> = logger.sink().events().iter().map(|e| e.tag().to_string()).collect();
    // fc.bias is all zeros and still gets a histogram
    assert_eq!(tags, vec!["conv1/bias", "fc/bias"]);
}

#[test]
fn test_model_buffers_leaf_modules_only() {
    let model = Module::new()
        .with_buffer("scale", arr(&[1], vec![9.0]))
        .with_child(
            "q1",
            Module::new()
                .with_buffer("scale", arr(&[2], vec![0.5, 0.25]))
                .with_buffer("zero_point", arr(&[1], vec![3.0])),
        )
        .with_child("q2", Module::new().with_buffer("other", arr(&[1], vec![1.0])));

    let mut logger = memory_logger(&LoggerConfig::default());
    logger
        .log_model_buffers(
            &model,
            &["scale", "zero_point", "absent"],
            "quant",
            Progress::new(2, 3, 10),
        )
        .unwrap();

    assert_eq!(
        logger.sink().events(),
        &[SummaryEvent::Scalars {
            main_tag: "quant/q1".to_string(),
            values: vec![0.5, 0.25, 3.0],
            step: 23,
        }]
    );
}

#[test]
fn test_csv_row_for_sparse_matrix() {
    let dir = tempdir().unwrap();
    let model = Module::new().with_parameter("name", Parameter::new(sparse_4x4()));
    let mut logger = TabularLogger::new(&LoggerConfig::new(dir.path()));
    logger.log_weights_sparsity(&model, 0).unwrap();

    // Readable as soon as the call returns
    let path = logger.get_fname("weights_sparsity");
    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec!["parameter", "shape", "volume", "sparse volume", "sparsity level"]
    );
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].iter().collect::<Vec<_>>(),
        vec!["name", "4x4", "16", "6", "62.5"]
    );

    fs::remove_file(&path).unwrap();
}

#[test]
fn test_composite_fans_out_to_all_backends() {
    let dir = tempdir().unwrap();
    let config = LoggerConfig::new(dir.path()).fname_prefix("lenet");
    let model = small_net();

    let mut loggers = CompositeLogger::new(vec![
        Box::new(memory_logger(&config)),
        Box::new(TextLogger::new()),
        Box::new(TabularLogger::new(&config)),
    ]);

    let stats = StatsRecord::new("Performance/Training/")
        .with("Loss", 1.25)
        .with("LR", 0.01);
    loggers
        .log_training_progress(&stats, Progress::new(0, 1, 10))
        .unwrap();
    loggers.log_weights_sparsity(&model, 0).unwrap();
    loggers.log_weights_filter_magnitude(&model, 0).unwrap();
    loggers
        .log_model_buffers(&model, &["running_mean"], "bn", Progress::new(0, 1, 10))
        .unwrap();
    loggers.flush().unwrap();

    assert!(dir.path().join("lenet_weights_sparsity.csv").exists());
    assert!(dir.path().join("lenet_running_mean.csv").exists());
}

#[cfg(feature = "tensorboard")]
#[test]
fn test_tensorboard_writes_event_file() {
    let dir = tempdir().unwrap();
    let config = LoggerConfig::new(dir.path().join("run"));
    let mut logger = ScalarHistogramLogger::tensorboard(&config).unwrap();
    assert_eq!(logger.sink().log_dir(), dir.path().join("run").as_path());

    let stats = StatsRecord::new("Performance/Training/").with("Loss", 0.5);
    logger
        .log_training_progress(&stats, Progress::new(0, 1, 1))
        .unwrap();
    logger.log_weights_sparsity(&small_net(), 0).unwrap();
    logger.flush().unwrap();

    // The event file is written by a background thread joined on drop
    let sink = logger.into_sink();
    let log_dir = sink.log_dir().to_path_buf();
    drop(sink);

    let files: Vec<String> = fs::read_dir(&log_dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(files.len(), 1);
    assert!(files[0].starts_with("events.out.tfevents."));
}

#[cfg(feature = "tensorboard")]
#[test]
fn test_tensorboard_unwritable_logdir_is_an_error() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("not_a_dir");
    fs::write(&file, "").unwrap();

    let config = LoggerConfig::new(file.join("run"));
    assert!(matches!(
        ScalarHistogramLogger::tensorboard(&config),
        Err(PruneLogError::IoError(_))
    ));
}
