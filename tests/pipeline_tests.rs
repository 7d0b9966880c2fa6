use std::sync::Arc;

use bundle_core::options::{EntryPoints, InputOptions, OutputFormat, OutputOptions};
use bundle_core::test_util::{FakeGraph, FakeModule, RecordingPlugin};

fn two_entry_graph() -> Box<dyn bundle_core::graph::Graph> {
    Box::new(FakeGraph::new(vec![
        FakeModule {
            id: "src/main.js".into(),
            is_entry: true,
            export_names: vec!["default".into()],
        },
        FakeModule {
            id: "src/other.js".into(),
            is_entry: true,
            export_names: vec!["named".into()],
        },
    ]))
}

#[tokio::test]
async fn build_then_generate_produces_one_chunk_per_entry() {
    let input = InputOptions::new(String::new());
    let mut input = input;
    input.input = EntryPoints::Multiple(vec!["src/main.js".into(), "src/other.js".into()]);

    let mut build = bundle_core::build(input, false, two_entry_graph()).await.unwrap();
    let output = OutputOptions::new(OutputFormat::Es).dir("dist");
    let bundle = bundle_core::generate::generate(&mut build, output).await.unwrap();

    assert_eq!(bundle.chunks.len(), 2);
    assert!(bundle.chunks.iter().all(|c| c.is_entry));
}

#[tokio::test]
async fn build_runs_the_same_build_for_multiple_generate_calls() {
    let mut input = InputOptions::new(String::new());
    input.input = EntryPoints::Single("src/main.js".into());

    let graph = Box::new(FakeGraph::new(vec![FakeModule {
        id: "src/main.js".into(),
        is_entry: true,
        export_names: vec!["default".into()],
    }]));
    let mut build = bundle_core::build(input, false, graph).await.unwrap();

    let es = bundle_core::generate::generate(&mut build, OutputOptions::new(OutputFormat::Es).dir("dist")).await.unwrap();
    let cjs = bundle_core::generate::generate(&mut build, OutputOptions::new(OutputFormat::Cjs).dir("dist")).await.unwrap();

    assert!(es.chunks[0].code.contains("(es)"));
    assert!(cjs.chunks[0].code.contains("(cjs)"));
}

#[tokio::test]
async fn build_start_and_build_end_fan_out_to_every_plugin() {
    let recorder = Arc::new(RecordingPlugin::new("recorder"));
    let mut input = InputOptions::new("src/main.js").plugin(recorder.clone());
    input.input = EntryPoints::Single("src/main.js".into());

    let graph = Box::new(FakeGraph::new(vec![FakeModule {
        id: "src/main.js".into(),
        is_entry: true,
        export_names: vec!["default".into()],
    }]));
    bundle_core::build(input, false, graph).await.unwrap();

    assert_eq!(recorder.calls(), vec!["buildStart", "buildEnd"]);
}

#[tokio::test]
async fn generate_bundle_fans_out_after_chunks_are_rendered() {
    let recorder = Arc::new(RecordingPlugin::new("recorder"));
    let mut input = InputOptions::new("src/main.js").plugin(recorder.clone());
    input.input = EntryPoints::Single("src/main.js".into());

    let graph = Box::new(FakeGraph::new(vec![FakeModule {
        id: "src/main.js".into(),
        is_entry: true,
        export_names: vec!["default".into()],
    }]));
    let mut build = bundle_core::build(input, false, graph).await.unwrap();
    bundle_core::generate::generate(&mut build, OutputOptions::new(OutputFormat::Es).dir("dist"))
        .await
        .unwrap();

    assert_eq!(recorder.calls(), vec!["buildStart", "buildEnd", "generateBundle"]);
}

#[tokio::test]
async fn chunk_optimization_runs_exactly_once_per_build() {
    let mut input = InputOptions::new("src/main.js");
    input.input = EntryPoints::Single("src/main.js".into());

    let fake = Arc::new(FakeGraph::new(vec![FakeModule {
        id: "src/main.js".into(),
        is_entry: true,
        export_names: vec!["default".into()],
    }]));

    // FakeGraph isn't Clone, so build two independent generate calls against
    // the same Build and assert the Graph-visible side effect only fires once.
    struct CountingGraph(Arc<FakeGraph>);

    #[async_trait::async_trait]
    impl bundle_core::graph::Graph for CountingGraph {
        async fn build(
            &mut self,
            _input: &InputOptions,
            _manual_chunks: bool,
            _inline_dynamic_imports: bool,
            _preserve_modules: bool,
        ) -> bundle_core::error::Result<Vec<Box<dyn bundle_core::graph::Chunk>>> {
            Ok(self.0.build_chunks())
        }

        fn optimize_chunks(
            &self,
            chunks: &mut [Box<dyn bundle_core::graph::Chunk>],
            output: &OutputOptions,
            chunk_grouping_size: usize,
            input_base: &str,
        ) -> bundle_core::error::Result<()> {
            self.0.optimize_chunks(chunks, output, chunk_grouping_size, input_base)
        }

        fn assets(&self) -> Arc<bundle_core::assets::AssetRegistry> {
            self.0.assets()
        }
    }

    let graph = Box::new(CountingGraph(fake.clone()));
    let mut build = bundle_core::build(input, false, graph).await.unwrap();

    bundle_core::generate::generate(&mut build, OutputOptions::new(OutputFormat::Es).dir("dist"))
        .await
        .unwrap();
    bundle_core::generate::generate(&mut build, OutputOptions::new(OutputFormat::Cjs).dir("dist"))
        .await
        .unwrap();

    assert_eq!(fake.optimize_call_count(), 1);
}

#[tokio::test]
async fn write_persists_chunks_to_the_output_directory() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut input = InputOptions::new("src/main.js");
    input.input = EntryPoints::Single("src/main.js".into());

    let graph = Box::new(FakeGraph::new(vec![FakeModule {
        id: "src/main.js".into(),
        is_entry: true,
        export_names: vec!["default".into()],
    }]));
    let mut build = bundle_core::build(input, false, graph).await.unwrap();

    let output = OutputOptions::new(OutputFormat::Es).dir(dir.path());
    bundle_core::write(&mut build, output).await.unwrap();

    let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert!(!entries.is_empty());
}

#[tokio::test]
async fn umd_format_rejects_multi_chunk_builds() {
    let mut input = InputOptions::new(String::new());
    input.input = EntryPoints::Multiple(vec!["src/main.js".into(), "src/other.js".into()]);

    let mut build = bundle_core::build(input, false, two_entry_graph()).await.unwrap();
    let err = bundle_core::generate::generate(&mut build, OutputOptions::new(OutputFormat::Umd).dir("dist"))
        .await
        .unwrap_err();
    assert_eq!(err.code().as_str(), "INVALID_OPTION");
}

#[tokio::test]
async fn timings_record_the_build_and_generate_phases() {
    let mut input = InputOptions::new("src/main.js");
    input.input = EntryPoints::Single("src/main.js".into());

    let graph = Box::new(FakeGraph::new(vec![FakeModule {
        id: "src/main.js".into(),
        is_entry: true,
        export_names: vec!["default".into()],
    }]));
    let mut build = bundle_core::build(input, false, graph).await.unwrap();
    bundle_core::generate::generate(&mut build, OutputOptions::new(OutputFormat::Es).dir("dist"))
        .await
        .unwrap();

    let labels: Vec<String> = build.get_timings().into_iter().map(|(label, _)| label).collect();
    assert!(labels.contains(&"# BUILD".to_string()));
    assert!(labels.contains(&"# GENERATE".to_string()));
}
