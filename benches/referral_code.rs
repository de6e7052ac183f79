//! 工具函数性能基准测试

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use waitlister::utils::email::{normalize_email, validate_email};
use waitlister::utils::{
    REFERRAL_CODE_LEN, generate_random_code, generate_referral_code, is_valid_slug, slugify,
};

// ============== generate_random_code 基准测试 ==============

fn bench_generate_random_code(c: &mut Criterion) {
    let mut group = c.benchmark_group("utils/generate_random_code");

    for length in [4, 8, 12, 20] {
        group.bench_with_input(BenchmarkId::new("length", length), &length, |b, &length| {
            b.iter(|| {
                let code = generate_random_code(length);
                assert_eq!(code.len(), length);
            });
        });
    }

    group.finish();
}

// ============== generate_referral_code 基准测试 ==============

fn bench_generate_referral_code(c: &mut Criterion) {
    let mut group = c.benchmark_group("utils/generate_referral_code");

    group.bench_function("default_length", |b| {
        b.iter(|| {
            let code = generate_referral_code();
            assert_eq!(code.len(), REFERRAL_CODE_LEN);
        });
    });

    group.finish();
}

// ============== slugify 基准测试 ==============

fn bench_slugify(c: &mut Criterion) {
    let mut group = c.benchmark_group("utils/slugify");

    group.bench_function("simple", |b| {
        b.iter(|| {
            assert_eq!(slugify("My Product Launch"), "my-product-launch");
        });
    });

    group.bench_function("messy_symbols", |b| {
        b.iter(|| {
            assert_eq!(slugify("  Beta!! 2026 __ Launch  "), "beta-2026-launch");
        });
    });

    let long_name = "word ".repeat(100);
    group.bench_function("long_name", |b| {
        b.iter(|| slugify(&long_name));
    });

    group.finish();
}

// ============== is_valid_slug 基准测试 ==============

fn bench_is_valid_slug(c: &mut Criterion) {
    let mut group = c.benchmark_group("utils/is_valid_slug");

    group.bench_function("valid_simple", |b| {
        b.iter(|| {
            assert!(is_valid_slug("spring-beta-wave"));
        });
    });

    group.bench_function("invalid_uppercase", |b| {
        b.iter(|| {
            assert!(!is_valid_slug("Spring-Beta"));
        });
    });

    // 长度边界测试
    let max_len_slug = "a".repeat(64);
    group.bench_function("valid_max_length", |b| {
        b.iter(|| {
            assert!(is_valid_slug(&max_len_slug));
        });
    });

    let too_long_slug = "a".repeat(65);
    group.bench_function("invalid_too_long", |b| {
        b.iter(|| {
            assert!(!is_valid_slug(&too_long_slug));
        });
    });

    group.finish();
}

// ============== email 校验基准测试 ==============

fn bench_email_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("utils/validate_email");

    group.bench_function("valid_simple", |b| {
        b.iter(|| {
            assert!(validate_email("ada@example.com").is_ok());
        });
    });

    group.bench_function("valid_subdomain", |b| {
        b.iter(|| {
            assert!(validate_email("ada.lovelace@mail.example.co.uk").is_ok());
        });
    });

    group.bench_function("invalid_no_at", |b| {
        b.iter(|| {
            assert!(validate_email("not-an-email").is_err());
        });
    });

    group.bench_function("invalid_double_at", |b| {
        b.iter(|| {
            assert!(validate_email("two@@example.com").is_err());
        });
    });

    group.bench_function("normalize", |b| {
        b.iter(|| {
            assert_eq!(normalize_email("  Ada@Example.COM  "), "ada@example.com");
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_generate_random_code,
    bench_generate_referral_code,
    bench_slugify,
    bench_is_valid_slug,
    bench_email_validation,
);
criterion_main!(benches);
