use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde::{Deserialize, Serialize};
use serde_envpath::{from_namespace, to_env_map, EnvMap};
use std::collections::HashMap;

#[derive(Serialize, Deserialize, Clone)]
struct Server {
    host: String,
    port: u16,
    tls: bool,
    workers: Vec<u32>,
    limits: Limits,
}

#[derive(Serialize, Deserialize, Clone)]
struct Limits {
    max_body: u64,
    rate: f64,
}

#[derive(Serialize, Deserialize, Clone)]
struct Upstream {
    host: String,
    max_conns: u32,
    labels: HashMap<String, String>,
}

fn server() -> Server {
    Server {
        host: "0.0.0.0".to_string(),
        port: 8080,
        tls: true,
        workers: (0..8).collect(),
        limits: Limits {
            max_body: 1 << 20,
            rate: 12.5,
        },
    }
}

fn upstreams(size: usize) -> HashMap<String, Upstream> {
    (0..size)
        .map(|i| {
            let labels = HashMap::from([
                ("team".to_string(), format!("team_{}", i % 4)),
                ("cost_center".to_string(), i.to_string()),
            ]);
            let upstream = Upstream {
                host: format!("10.0.{}.{}", i / 256, i % 256),
                max_conns: 64,
                labels,
            };
            (format!("eu_west_{i}"), upstream)
        })
        .collect()
}

fn benchmark_decode_struct(c: &mut Criterion) {
    let env = to_env_map(&server(), &["server"]).unwrap();

    c.bench_function("decode_struct", |b| {
        b.iter(|| from_namespace::<Server, _>(black_box(&env), &["server"]))
    });
}

fn benchmark_decode_comma_list(c: &mut Criterion) {
    let mut env = EnvMap::new();
    let list = (0..100).map(|i: u32| i.to_string()).collect::<Vec<_>>();
    env.insert("NUMBERS", list.join(","));

    c.bench_function("decode_comma_list", |b| {
        b.iter(|| from_namespace::<Vec<u32>, _>(black_box(&env), &["numbers"]))
    });
}

fn benchmark_decode_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_map");

    for size in [10, 50, 200].iter() {
        let env = to_env_map(&upstreams(*size), &["upstreams"]).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(size), &env, |b, env| {
            b.iter(|| {
                from_namespace::<HashMap<String, Upstream>, _>(black_box(env), &["upstreams"])
            })
        });
    }
    group.finish();
}

fn benchmark_decode_map_with_noise(c: &mut Criterion) {
    let mut env = to_env_map(&upstreams(50), &["upstreams"]).unwrap();
    for i in 0..500 {
        env.insert(format!("UNRELATED_VARIABLE_{i}"), "x");
    }

    c.bench_function("decode_map_with_noise", |b| {
        b.iter(|| {
            from_namespace::<HashMap<String, Upstream>, _>(black_box(&env), &["upstreams"])
        })
    });
}

fn benchmark_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    let server = server();
    group.bench_function("struct", |b| {
        b.iter(|| to_env_map(black_box(&server), &["server"]))
    });

    let upstreams = upstreams(50);
    group.bench_function("map", |b| {
        b.iter(|| to_env_map(black_box(&upstreams), &["upstreams"]))
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_decode_struct,
    benchmark_decode_comma_list,
    benchmark_decode_map,
    benchmark_decode_map_with_noise,
    benchmark_encode
);
criterion_main!(benches);
