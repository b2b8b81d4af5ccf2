//! Benchmarks for search operations (cosine scan, BM25, hybrid, rebuild).
//!
//! Run with: `cargo bench -p catalog-search-core --bench search`
//!
//! These benchmarks measure the performance of:
//! - Exact vector similarity search
//! - Keyword search (BM25)
//! - Weighted fusion in isolation
//! - Full hybrid search and full index rebuild
//!
//! All data comes from the feature-hashing encoder, so runs are reproducible.

use catalog_search_core::config::EngineConfig;
use catalog_search_core::embedding::{HashingEncoder, TextEncoder};
use catalog_search_core::search::engine::builder::build_index_pair;
use catalog_search_core::search::fusion::{weighted_fusion, FusionWeights};
use catalog_search_core::search::keyword::KeywordIndex;
use catalog_search_core::search::tokenizer::Tokenizer;
use catalog_search_core::search::vector::VectorIndex;
use catalog_search_core::search::{DocId, Document, HybridSearchEngine, SearchParams};
use catalog_search_core::storage::InMemoryDocumentStore;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;

// =============================================================================
// Test Data Generation
// =============================================================================

/// Generate a catalog item whose text varies by id.
fn sample_document(id: u64) -> Document {
    let materials = [
        ("Portland Cement", "Cement", "general purpose cement for foundations"),
        ("Steel Rebar", "Reinforcement", "deformed steel rods for concrete"),
        ("Roof Membrane", "Waterproofing", "self-adhesive waterproof sheet"),
        ("Concrete Block", "Masonry", "hollow load bearing block"),
        ("Acrylic Paint", "Paint", "weather resistant exterior coating"),
        ("Floor Tile", "Tiles", "glazed porcelain floor tile"),
        ("Wood Screws", "Fasteners", "countersunk zinc plated screws"),
        ("Copper Pipe", "Plumbing", "type L copper water pipe"),
    ];
    let (title, category, description) = materials[(id % materials.len() as u64) as usize];

    Document::new(
        format!("item-{:06}", id),
        format!("{} {}", title, id % 97),
        format!("{} batch {}", description, id),
        category,
    )
}

fn sample_catalog(size: usize) -> Vec<Document> {
    (0..size as u64).map(sample_document).collect()
}

fn build_vector_index(encoder: &HashingEncoder, size: usize) -> VectorIndex {
    let mut index = VectorIndex::new(encoder.embedding_dim());
    for doc in sample_catalog(size) {
        let vector = encoder.encode(&doc.index_text()).unwrap();
        index.upsert(doc.id, vector).unwrap();
    }
    index
}

fn build_keyword_index(size: usize) -> KeywordIndex {
    let mut index = KeywordIndex::new(Tokenizer::default());
    for doc in sample_catalog(size) {
        let text = doc.index_text();
        index.upsert_text(doc.id, &text);
    }
    index
}

// =============================================================================
// Vector Search Benchmarks
// =============================================================================

/// Benchmark: Cosine scan with varying index sizes
///
/// Exact search is O(n·d), so time should grow linearly.
fn bench_vector_search_varying_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("vector/search_by_size");
    group.sample_size(100);

    let encoder = HashingEncoder::default();
    let query = encoder.encode("steel rods for concrete").unwrap();

    for size in [100, 1000, 5000, 10000] {
        let index = build_vector_index(&encoder, size);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| index.search(black_box(&query), None).unwrap());
        });
    }
    group.finish();
}

// =============================================================================
// BM25 Keyword Search Benchmarks
// =============================================================================

/// Benchmark: BM25 search with varying index sizes
fn bench_bm25_search_varying_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("bm25/search_by_size");
    group.sample_size(100);

    let query = "portland cement foundations";

    for size in [100, 1000, 5000, 10000] {
        let index = build_keyword_index(size);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| index.search(black_box(query)));
        });
    }
    group.finish();
}

/// Benchmark: BM25 search with varying query lengths
fn bench_bm25_search_varying_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("bm25/search_by_query_length");
    group.sample_size(100);

    let index = build_keyword_index(5000);

    let queries = [
        ("1_word", "cement"),
        ("3_words", "portland cement foundations"),
        ("6_words", "steel rods for concrete block masonry"),
    ];

    for (name, query) in queries {
        group.bench_with_input(BenchmarkId::from_parameter(name), &query, |b, query| {
            b.iter(|| index.search(black_box(query)));
        });
    }
    group.finish();
}

// =============================================================================
// Fusion Benchmarks
// =============================================================================

/// Benchmark: Weighted fusion in isolation
fn bench_weighted_fusion(c: &mut Criterion) {
    let mut group = c.benchmark_group("fusion/weighted");
    group.sample_size(1000);

    for size in [10, 100, 1000] {
        let semantic: Vec<_> = (0..size)
            .map(|i| (DocId::new(format!("{:06}", i)), 1.0 - (i as f32 / size as f32)))
            .collect();
        let keyword: Vec<_> = (0..size)
            .rev()
            .map(|i| (DocId::new(format!("{:06}", i)), 10.0 - (i as f32 / size as f32)))
            .collect();
        let weights = FusionWeights {
            semantic: 0.6,
            keyword: 0.4,
            min_score: 0.3,
            top_k: 10,
        };

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| weighted_fusion(black_box(&semantic), black_box(&keyword), weights));
        });
    }
    group.finish();
}

// =============================================================================
// Hybrid Search Benchmarks
// =============================================================================

fn build_hybrid_engine(
    rt: &tokio::runtime::Runtime,
    size: usize,
) -> HybridSearchEngine<InMemoryDocumentStore> {
    let store = InMemoryDocumentStore::with_documents(sample_catalog(size));
    let engine = HybridSearchEngine::new(
        store,
        Arc::new(HashingEncoder::default()),
        EngineConfig::default(),
    )
    .unwrap();
    rt.block_on(engine.rebuild()).unwrap();
    engine
}

/// Benchmark: Full hybrid search pipeline
///
/// Query encoding, both scans, fusion and document hydration.
fn bench_hybrid_search(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    let mut group = c.benchmark_group("hybrid/search");
    group.sample_size(50);

    let params = SearchParams::new(10, 0.3, 0.6, 0.4);

    for size in [100, 1000, 5000] {
        let engine = build_hybrid_engine(&rt, size);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| engine.search(black_box("steel rods for concrete"), params).unwrap());
        });
    }
    group.finish();
}

/// Benchmark: Building a full index pair from scratch
fn bench_build_index_pair(c: &mut Criterion) {
    let mut group = c.benchmark_group("rebuild/build_index_pair");
    group.sample_size(10);

    let encoder = HashingEncoder::default();

    for size in [100, 1000, 5000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter_with_setup(
                || sample_catalog(size),
                |docs| build_index_pair(docs, &encoder, Tokenizer::default()).unwrap(),
            );
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_vector_search_varying_size,
    bench_bm25_search_varying_size,
    bench_bm25_search_varying_query,
    bench_weighted_fusion,
    bench_hybrid_search,
    bench_build_index_pair,
);
criterion_main!(benches);
