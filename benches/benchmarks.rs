//! Performance benchmarks for wg-provision
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::net::IpAddr;
use wg_provision::config::ProvisionSettings;
use wg_provision::provision::{parse_dns_list, Endpoint};
use wg_provision::wireguard::{next_address, AddressAllocator, PrivateKey, WireguardConfig};
use wg_provision::{AppConfig, BuildParams};

fn bench_key_generation(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(1);

    c.bench_function("key_generation", |b| {
        b.iter(|| {
            let _key = PrivateKey::generate_from(&mut rng).unwrap();
        });
    });
}

fn bench_public_key_derivation(c: &mut Criterion) {
    let private_key = PrivateKey::generate().unwrap();

    c.bench_function("public_key_derivation", |b| {
        b.iter(|| {
            let _public = black_box(&private_key).public_key();
        });
    });
}

fn bench_allocation(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocation");
    let v4: IpAddr = "10.9.0.2".parse().unwrap();
    let v6: IpAddr = "fd00::2".parse().unwrap();
    let allocator = AddressAllocator::new("10.9.0.0/16".parse().unwrap());

    group.bench_function("next_address_v4", |b| {
        b.iter(|| next_address(black_box(v4)));
    });

    group.bench_function("next_address_v6", |b| {
        b.iter(|| next_address(black_box(v6)));
    });

    group.bench_function("next_after", |b| {
        b.iter(|| allocator.next_after(black_box(v4)).unwrap());
    });

    group.finish();
}

fn bench_settings_parsing(c: &mut Criterion) {
    let toml_data = r#"
subnet = "10.9.0.0/24"
endpoint = "vpn.example.com:51820"
dns = "8.8.8.8, 1.1.1.1"
mtu = 1420
allowed_ips = ["0.0.0.0/0"]
"#;

    c.bench_function("settings_parsing_toml", |b| {
        b.iter(|| {
            let _settings = ProvisionSettings::parse(black_box(toml_data)).unwrap();
        });
    });

    c.bench_function("dns_list_parsing", |b| {
        b.iter(|| parse_dns_list(black_box("8.8.8.8, not-an-ip, 1.1.1.1, ::1")));
    });
}

fn bench_rendering(c: &mut Criterion) {
    let mut group = c.benchmark_group("rendering");
    let params = BuildParams::new("10.9.0.0/16", Endpoint::new("vpn.example.com", 51820), 51820);

    for clients in [1usize, 10, 100].iter() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut app = AppConfig::provision(&params, &mut rng).unwrap();
        for _ in 1..*clients {
            app.add_client(&mut rng).unwrap();
        }

        group.bench_with_input(BenchmarkId::new("server_config", clients), &app, |b, app| {
            b.iter(|| app.server().render());
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_key_generation,
    bench_public_key_derivation,
    bench_allocation,
    bench_settings_parsing,
    bench_rendering
);
criterion_main!(benches);
