// Key derivation, hashing, and signing benchmarks for keystone.
//
// Covers secret-to-keypair derivation, address derivation, canonical
// hashing, and the full sign / second-sign / verify path of a signature
// registration transaction.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use keystone_protocol::config::{SIGNATURE_FEE, TOKEN_PREFIX};
use keystone_protocol::crypto::Keypair;
use keystone_protocol::identity::{derive_address, is_valid_address};
use keystone_protocol::transaction::{
    hash, second_sign, sign_in_place, verify, verify_second_signature, Asset, Transaction,
    TransactionBuilder, TransactionType,
};

fn registration(sender: &Keypair, second: &Keypair) -> Transaction {
    TransactionBuilder::new(TransactionType::Signature)
        .sender(&sender.public_key())
        .fee(SIGNATURE_FEE)
        .timestamp(1_000)
        .asset(Asset::Signature {
            public_key: second.public_key_hex(),
        })
        .build()
}

fn bench_keypair_from_secret(c: &mut Criterion) {
    let secret = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
    c.bench_function("keys/from_secret", |b| {
        b.iter(|| Keypair::from_secret(secret));
    });
}

fn bench_address(c: &mut Criterion) {
    let public_key = Keypair::from_secret("alpha").public_key();
    let address = derive_address(&public_key, TOKEN_PREFIX);

    c.bench_function("address/derive", |b| {
        b.iter(|| derive_address(&public_key, TOKEN_PREFIX));
    });
    c.bench_function("address/validate", |b| {
        b.iter(|| is_valid_address(&address, TOKEN_PREFIX));
    });
}

fn bench_canonical_hash(c: &mut Criterion) {
    let tx = registration(&Keypair::from_secret("alpha"), &Keypair::from_secret("beta"));
    c.bench_function("transaction/hash", |b| {
        b.iter(|| hash(&tx, false, false).unwrap());
    });
}

fn bench_sign_and_second_sign(c: &mut Criterion) {
    let sender = Keypair::from_secret("alpha");
    let second = Keypair::from_secret("beta");
    let unsigned = registration(&sender, &second);

    c.bench_function("transaction/sign_and_second_sign", |b| {
        b.iter(|| {
            let mut tx = unsigned.clone();
            sign_in_place(&mut tx, &sender).unwrap();
            second_sign(&mut tx, &second).unwrap();
            tx.finalize_id().unwrap();
            tx
        });
    });
}

fn bench_verify_both(c: &mut Criterion) {
    let mut group = c.benchmark_group("transaction/verify_both");

    for size in [1, 10, 100] {
        let second = Keypair::from_secret("beta");
        let txs: Vec<_> = (0..size)
            .map(|i| {
                let sender = Keypair::from_secret(&format!("sender-{}", i));
                let mut tx = registration(&sender, &second);
                sign_in_place(&mut tx, &sender).unwrap();
                second_sign(&mut tx, &second).unwrap();
                tx
            })
            .collect();
        let second_hex = second.public_key_hex();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &txs, |b, txs| {
            b.iter(|| {
                for tx in txs {
                    assert_eq!(verify(tx), Ok(true));
                    assert_eq!(verify_second_signature(tx, &second_hex), Ok(true));
                }
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_keypair_from_secret,
    bench_address,
    bench_canonical_hash,
    bench_sign_and_second_sign,
    bench_verify_both,
);
criterion_main!(benches);
