//! Request view benchmarks
//!
//! Measures raw parameter parsing and the cost of first versus cached access
//! to derived views.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use hostview_core::params::{parse, COOKIE_DELIMITERS, QUERY_DELIMITERS};
use hostview_core::{Environment, ServerRequest};
use serde::Deserialize;

const SHORT_QUERY: &str = "page=2&limit=20";
const LONG_QUERY: &str = "q=rust+web+framework&page=12&limit=50&sort=created_at&order=desc\
    &tag=async&tag=http&tag=tokio&filter=status%3Dactive&include=author;include=comments";
const COOKIE_HEADER: &str =
    "sid=8f14e45fceea167a5a36dedd4bea2543; theme=dark; lang=en-US, tz=Europe%2FBerlin; SID=ignored";

#[derive(Deserialize)]
struct ListQuery {
    page: Option<u32>,
    limit: Option<u32>,
    sort: Option<String>,
}

fn request(query: &str) -> ServerRequest {
    ServerRequest::new(
        Environment::builder()
            .scheme("https")
            .host("api.example.com")
            .path("/v1/items")
            .query_string(query)
            .header("Cookie", [COOKIE_HEADER])
            .header("Accept", ["application/json", "text/plain"])
            .header("User-Agent", ["criterion"])
            .build(),
    )
}

/// Benchmark the raw parser
fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    group.bench_function("short_query", |b| {
        b.iter(|| parse(black_box(SHORT_QUERY), QUERY_DELIMITERS).count())
    });

    group.bench_function("long_query", |b| {
        b.iter(|| parse(black_box(LONG_QUERY), QUERY_DELIMITERS).count())
    });

    group.bench_function("cookie_header", |b| {
        b.iter(|| parse(black_box(COOKIE_HEADER), COOKIE_DELIMITERS).count())
    });

    group.finish();
}

/// Benchmark first access, which parses and publishes, against cached access
fn bench_views(c: &mut Criterion) {
    let mut group = c.benchmark_group("views");

    group.bench_function("query_params_cold", |b| {
        b.iter_batched(
            || request(LONG_QUERY),
            |req| req.query_params().len(),
            BatchSize::SmallInput,
        )
    });

    group.bench_function("query_params_warm", |b| {
        let req = request(LONG_QUERY);
        req.query_params();
        b.iter(|| black_box(&req).query_params().len())
    });

    group.bench_function("cookies_cold", |b| {
        b.iter_batched(
            || request(SHORT_QUERY),
            |req| req.cookies().len(),
            BatchSize::SmallInput,
        )
    });

    group.bench_function("headers_cold", |b| {
        b.iter_batched(
            || request(SHORT_QUERY),
            |req| req.headers().len(),
            BatchSize::SmallInput,
        )
    });

    group.bench_function("url_cold", |b| {
        b.iter_batched(
            || request(LONG_QUERY),
            |req| req.url().map(|u| u.as_str().len()).unwrap_or(0),
            BatchSize::SmallInput,
        )
    });

    group.bench_function("query_as", |b| {
        let req = request(LONG_QUERY);
        b.iter(|| {
            black_box(&req)
                .query_as::<ListQuery>()
                .map(|q| (q.page, q.limit, q.sort.map(|s| s.len())))
                .ok()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_parse, bench_views);
criterion_main!(benches);
