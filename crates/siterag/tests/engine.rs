//! End-to-end engine tests over mock capability providers

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use siterag::provider::{
    Embedder, EmbeddingProvider, GenerateOptions, Generator, GeneratorProvider, KnowledgeSource,
    ProgressEvent, ProgressFn, RenderOptions,
};
use siterag::{ChatTurn, Error, KnowledgeRecord, RagConfig, RagEngine, Result};

fn record(content: &str, embedding: Vec<f32>) -> KnowledgeRecord {
    KnowledgeRecord {
        content: content.to_string(),
        embedding,
        extra: Default::default(),
    }
}

struct MockSource {
    records: Vec<KnowledgeRecord>,
    fetches: AtomicUsize,
}

impl MockSource {
    fn new(records: Vec<KnowledgeRecord>) -> Arc<Self> {
        Arc::new(Self {
            records,
            fetches: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl KnowledgeSource for MockSource {
    async fn fetch(&self) -> Result<Vec<KnowledgeRecord>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.clone())
    }
}

/// Embeds every query as the same fixed vector
struct FixedEmbedder {
    vector: Vec<f32>,
}

#[async_trait]
impl Embedder for FixedEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(self.vector.clone())
    }
}

struct MockEmbeddingProvider {
    vector: Vec<f32>,
    loads: AtomicUsize,
}

impl MockEmbeddingProvider {
    fn new(vector: Vec<f32>) -> Arc<Self> {
        Arc::new(Self {
            vector,
            loads: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn load(&self, progress: ProgressFn) -> Result<Arc<dyn Embedder>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        progress(ProgressEvent::InProgress(40.0));
        progress(ProgressEvent::Done);
        Ok(Arc::new(FixedEmbedder {
            vector: self.vector.clone(),
        }))
    }
}

/// Deterministic generator: streams a fixed phrase word by word, then the
/// prompt length, and records every rendered prompt and options struct.
struct MockGenerator {
    prompts: Arc<Mutex<Vec<String>>>,
    options: Arc<Mutex<Vec<GenerateOptions>>>,
    fail_midstream: bool,
}

#[async_trait]
impl Generator for MockGenerator {
    fn render_chat(&self, turns: &[ChatTurn], opts: &RenderOptions) -> Result<String> {
        let mut prompt = turns
            .iter()
            .map(|t| format!("[{}]{}", t.role.as_str(), t.content))
            .collect::<Vec<_>>()
            .join("\n");
        if opts.add_generation_prompt {
            prompt.push_str("\n[assistant]");
        }
        Ok(prompt)
    }

    async fn generate(
        &self,
        prompt: &str,
        opts: &GenerateOptions,
        sink: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<()> {
        self.prompts.lock().push(prompt.to_string());
        self.options.lock().push(*opts);

        sink("grounded ");
        sink("answer ");
        if self.fail_midstream {
            return Err(Error::generation("device exhausted"));
        }
        sink(&format!("({} prompt chars)", prompt.len()));
        Ok(())
    }
}

struct MockGeneratorProvider {
    prompts: Arc<Mutex<Vec<String>>>,
    options: Arc<Mutex<Vec<GenerateOptions>>>,
    loads: AtomicUsize,
    fail_midstream: bool,
}

impl MockGeneratorProvider {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            prompts: Arc::new(Mutex::new(Vec::new())),
            options: Arc::new(Mutex::new(Vec::new())),
            loads: AtomicUsize::new(0),
            fail_midstream: false,
        })
    }

    fn failing_midstream() -> Arc<Self> {
        Arc::new(Self {
            prompts: Arc::new(Mutex::new(Vec::new())),
            options: Arc::new(Mutex::new(Vec::new())),
            loads: AtomicUsize::new(0),
            fail_midstream: true,
        })
    }
}

#[async_trait]
impl GeneratorProvider for MockGeneratorProvider {
    async fn load(&self, progress: ProgressFn) -> Result<Arc<dyn Generator>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        progress(ProgressEvent::Done);
        Ok(Arc::new(MockGenerator {
            prompts: Arc::clone(&self.prompts),
            options: Arc::clone(&self.options),
            fail_midstream: self.fail_midstream,
        }))
    }
}

fn default_store() -> Vec<KnowledgeRecord> {
    vec![
        record("first chunk", vec![1.0, 0.0]),
        record("second chunk", vec![0.8, 0.6]),
        record("third chunk", vec![0.0, 1.0]),
        record("far away", vec![-1.0, 0.0]),
    ]
}

fn engine_with(
    records: Vec<KnowledgeRecord>,
) -> (
    RagEngine,
    Arc<MockEmbeddingProvider>,
    Arc<MockGeneratorProvider>,
    Arc<MockSource>,
) {
    let embedding = MockEmbeddingProvider::new(vec![1.0, 0.0]);
    let generation = MockGeneratorProvider::new();
    let source = MockSource::new(records);
    let engine = RagEngine::new(
        RagConfig::default(),
        Arc::clone(&embedding) as Arc<dyn EmbeddingProvider>,
        Arc::clone(&generation) as Arc<dyn GeneratorProvider>,
        Arc::clone(&source) as Arc<dyn KnowledgeSource>,
    );
    (engine, embedding, generation, source)
}

#[tokio::test]
async fn search_ranks_by_similarity() {
    let (engine, ..) = engine_with(default_store());

    let results = engine.search("anything", 2).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].record.content, "first chunk");
    assert_eq!(results[1].record.content, "second chunk");
    assert!(results[0].score >= results[1].score);
}

#[tokio::test]
async fn search_on_empty_store_skips_the_embedder() {
    let (engine, embedding, ..) = engine_with(Vec::new());

    let results = engine.search("anything", 3).await.unwrap();
    assert!(results.is_empty());
    assert_eq!(embedding.loads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn ask_streams_monotonic_prefixes_and_returns_the_last() {
    let (engine, ..) = engine_with(default_store());

    let partials = Arc::new(Mutex::new(Vec::<String>::new()));
    let sink = Arc::clone(&partials);
    let answer = engine
        .ask_streaming("what is here?", move |partial| {
            sink.lock().push(partial.to_string());
        })
        .await
        .unwrap();

    let partials = partials.lock();
    assert!(!partials.is_empty());
    for pair in partials.windows(2) {
        assert!(pair[1].starts_with(&pair[0]), "stream regressed");
    }
    assert_eq!(&answer, partials.last().unwrap());
}

#[tokio::test]
async fn ask_grounds_the_prompt_in_rank_ordered_context() {
    let (engine, _, generation, _) = engine_with(default_store());

    engine.ask("tell me").await.unwrap();

    let prompts = generation.prompts.lock();
    assert_eq!(prompts.len(), 1);
    let prompt = &prompts[0];

    // Top 3 records, rank order, blank-line separated, inside the system turn
    assert!(prompt.contains("first chunk\n\nsecond chunk\n\nthird chunk"));
    assert!(!prompt.contains("far away"));
    assert!(prompt.starts_with("[system]You are the site's AI assistant."));
    assert!(prompt.contains("[user]tell me"));
    assert!(prompt.ends_with("[assistant]"));

    // Greedy decoding with the fixed token budget
    let options = generation.options.lock();
    assert_eq!(options[0].temperature, 0.0);
    assert_eq!(options[0].max_new_tokens, 256);
}

#[tokio::test]
async fn identical_asks_produce_identical_answers() {
    let (engine, ..) = engine_with(default_store());

    let first = engine.ask("repeat me").await.unwrap();
    let second = engine.ask("repeat me").await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn preload_loads_everything_once_and_reports_full_progress() {
    let (engine, embedding, generation, source) = engine_with(default_store());

    engine.preload().await.unwrap();
    assert_eq!(engine.load_progress(), 100.0);
    assert_eq!(embedding.loads.load(Ordering::SeqCst), 1);
    assert_eq!(generation.loads.load(Ordering::SeqCst), 1);
    assert_eq!(source.fetches.load(Ordering::SeqCst), 1);

    // Handles and records are cached; asking triggers no further loads
    engine.ask("cached?").await.unwrap();
    assert_eq!(embedding.loads.load(Ordering::SeqCst), 1);
    assert_eq!(generation.loads.load(Ordering::SeqCst), 1);
    assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn progress_listener_observes_both_model_loads() {
    let (engine, ..) = engine_with(default_store());

    let updates = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&updates);
    engine.set_on_progress_update(move |percent, _phase| sink.lock().push(percent));

    engine.preload().await.unwrap();

    let updates = updates.lock();
    assert_eq!(*updates.last().unwrap(), 100.0);
    for pair in updates.windows(2) {
        assert!(pair[1] >= pair[0], "published progress regressed");
    }
}

#[tokio::test]
async fn midstream_generation_failure_keeps_streamed_prefix() {
    let embedding = MockEmbeddingProvider::new(vec![1.0, 0.0]);
    let generation = MockGeneratorProvider::failing_midstream();
    let source = MockSource::new(default_store());
    let engine = RagEngine::new(
        RagConfig::default(),
        embedding as Arc<dyn EmbeddingProvider>,
        generation as Arc<dyn GeneratorProvider>,
        source as Arc<dyn KnowledgeSource>,
    );

    let last_seen = Arc::new(Mutex::new(String::new()));
    let sink = Arc::clone(&last_seen);
    let err = engine
        .ask_streaming("doomed", move |partial| {
            *sink.lock() = partial.to_string();
        })
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Generation(_)));
    // Whatever streamed before the failure stays the caller's last state
    assert_eq!(&*last_seen.lock(), "grounded answer ");
}
