use criterion::{black_box, criterion_group, criterion_main, Criterion};

use arx_crypto::{derive_key_iv, Crypter, DerivationMethod};

fn kdf_25k_rounds_bench(c: &mut Criterion) {
    c.bench_function("kdf_sha512_25k_rounds", |b| {
        b.iter(|| {
            derive_key_iv(
                black_box(b"benchmark passphrase"),
                b"saltsalt",
                25_000,
                DerivationMethod::Sha512,
            )
        })
    });
}

fn aes_cbc_encrypt_bench(c: &mut Criterion) {
    let mut crypter = Crypter::new();
    crypter.set_key(&[0x42u8; 32], &[0x17u8; 16]).unwrap();
    let secret = [0xABu8; 32];

    c.bench_function("aes256cbc_encrypt_32B", |b| {
        b.iter(|| crypter.encrypt(black_box(&secret)))
    });
}

fn aes_cbc_decrypt_bench(c: &mut Criterion) {
    let mut crypter = Crypter::new();
    crypter.set_key(&[0x42u8; 32], &[0x17u8; 16]).unwrap();
    let ciphertext = crypter.encrypt(&[0xABu8; 32]).unwrap();

    c.bench_function("aes256cbc_decrypt_48B", |b| {
        b.iter(|| crypter.decrypt(black_box(&ciphertext)))
    });
}

fn blake2b_256_bench(c: &mut Criterion) {
    let data = [0xCDu8; 33];

    c.bench_function("blake2b_256_pubkey", |b| {
        b.iter(|| arx_crypto::blake2b_256(black_box(&data)))
    });
}

fn ledger_keypair_bench(c: &mut Criterion) {
    c.bench_function("ledger_keypair_generate", |b| {
        b.iter(arx_crypto::LedgerKeyPair::generate)
    });
}

fn identity_keypair_bench(c: &mut Criterion) {
    c.bench_function("identity_keypair_generate", |b| {
        b.iter(arx_crypto::IdentityKeyPair::generate)
    });
}

criterion_group!(
    benches,
    kdf_25k_rounds_bench,
    aes_cbc_encrypt_bench,
    aes_cbc_decrypt_bench,
    blake2b_256_bench,
    ledger_keypair_bench,
    identity_keypair_bench,
);
criterion_main!(benches);
