//! Benchmarks for client-IP resolution on the access-guard hot path.
//!
//! Run with: cargo bench --bench client_ip

use axum::http::{HeaderMap, HeaderValue};
use commit_server::api::access::{client_ip, parse_ip, AccessGuard};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::net::SocketAddr;

fn headers_for(case: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    match case {
        "forwarded" => {
            headers.insert(
                "forwarded",
                HeaderValue::from_static(r#"for="[2001:db8::1]:8080";host=example.com"#),
            );
        }
        "x_forwarded_for" => {
            headers.insert(
                "x-forwarded-for",
                HeaderValue::from_static("garbage, 10.0.0.5:1234, 192.168.1.1"),
            );
        }
        _ => {}
    }
    headers
}

fn bench_client_ip(c: &mut Criterion) {
    let mut group = c.benchmark_group("client_ip");
    let remote = Some(SocketAddr::from(([127, 0, 0, 1], 40000)));

    for case in ["forwarded", "x_forwarded_for", "socket"] {
        let headers = headers_for(case);
        group.bench_with_input(BenchmarkId::from_parameter(case), &headers, |b, headers| {
            b.iter(|| client_ip(black_box(headers), black_box(remote)))
        });
    }

    group.finish();
}

fn bench_parse_ip(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_ip");

    for raw in ["10.0.0.5", "10.0.0.5:1234", "[2001:db8::1]:8080", "not-an-ip"] {
        group.bench_with_input(BenchmarkId::from_parameter(raw), raw, |b, raw| {
            b.iter(|| parse_ip(black_box(raw)))
        });
    }

    group.finish();
}

fn bench_allowlist(c: &mut Criterion) {
    let list = (0..64)
        .map(|i| format!("10.0.{}.{}", i / 16, i % 16))
        .collect::<Vec<_>>()
        .join(", ");
    let guard = AccessGuard::from_list(&list);

    c.bench_function("allowlist_lookup", |b| {
        b.iter(|| guard.is_allowed(black_box("10.0.3.15")))
    });
}

criterion_group!(benches, bench_client_ip, bench_parse_ip, bench_allowlist);
criterion_main!(benches);
