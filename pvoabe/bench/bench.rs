use criterion::measurement::Measurement;
use criterion::{criterion_group, criterion_main, BenchmarkGroup, Criterion};

use pvoabe::{
    decrypt_transformed, encrypt, generate_user_key, reconstruct, reconstruct_coefficients,
    setup, share, transform, transform_and_prove, verify_transformed, AccessMatrix,
    CrossGroupDleqProof, CurveScalar, G1Point, G2Point, GroupElement, GroupEncodedShares,
    KeyConsistencyProof, ServerSecretKey, VerifierSecretKey,
};

const POLICY: &str = "Doctor AND (Cardiology OR Oncology) AND (Senior OR Resident)";
const ATTRIBUTES: [&str; 3] = ["Doctor", "Oncology", "Senior"];
const UNIVERSE: [&str; 6] = [
    "Doctor",
    "Nurse",
    "Cardiology",
    "Oncology",
    "Senior",
    "Resident",
];

fn bench_lsss<'a, M: Measurement>(group: &mut BenchmarkGroup<'a, M>) {
    let matrix = AccessMatrix::from_policy(POLICY).unwrap();
    let secret = CurveScalar::from(1138u64);

    group.bench_function("share", |b| b.iter(|| share(&matrix, &secret).unwrap()));

    group.bench_function("reconstruct_coefficients", |b| {
        b.iter(|| reconstruct_coefficients(&matrix, ATTRIBUTES).unwrap())
    });

    let shares = share(&matrix, &secret).unwrap();
    let rows = matrix.rows_for(ATTRIBUTES);
    let encoded = shares.encode(&G1Point::generator());
    let encoded: GroupEncodedShares<G1Point> = encoded
        .into_iter()
        .filter(|(row, _)| rows.contains(row))
        .collect();

    group.bench_function("reconstruct in G1", |b| {
        b.iter(|| reconstruct(&matrix, &encoded).unwrap())
    });
}

fn bench_dleq<'a, M: Measurement>(group: &mut BenchmarkGroup<'a, M>) {
    let x = CurveScalar::from(5u64);
    let u = G1Point::generator();
    let v = G2Point::generator();
    let y1 = u.pow(&x);
    let y2 = v.pow(&x);

    group.bench_function("DLEQ prove", |b| {
        b.iter(|| CrossGroupDleqProof::prove(&x, &u, &y1, &v, &y2).unwrap())
    });

    let proof = CrossGroupDleqProof::prove(&x, &u, &y1, &v, &y2).unwrap();
    group.bench_function("DLEQ verify", |b| {
        b.iter(|| proof.verify(&u, &y1, &v, &y2))
    });
}

fn bench_abe<'a, M: Measurement>(group: &mut BenchmarkGroup<'a, M>) {
    let (pp, msk) = setup(UNIVERSE).unwrap();
    let pv_sk = VerifierSecretKey::random().unwrap();
    let pv_pk = pv_sk.public_key().unwrap();
    let matrix = AccessMatrix::from_policy(POLICY).unwrap();
    let plaintext = b"peace at dawn";

    // Encryption

    group.bench_function("encrypt", |b| {
        b.iter(|| encrypt(&pp, &pv_pk, &matrix, &plaintext[..]).unwrap())
    });

    let (intermediate, payload) = encrypt(&pp, &pv_pk, &matrix, plaintext).unwrap();
    group.bench_function("verify_shares", |b| {
        b.iter(|| intermediate.verify_shares(&pp).unwrap())
    });

    group.bench_function("complete", |b| {
        b.iter(|| intermediate.complete(&pp, &pv_pk).unwrap())
    });

    // Correctness proof

    let ciphertext = intermediate.complete(&pp, &pv_pk).unwrap();
    let (cloud_key, user_key) = generate_user_key(&pp, &msk, "alice", ATTRIBUTES).unwrap();

    group.bench_function("prove", |b| {
        b.iter(|| KeyConsistencyProof::prove(&pp, &cloud_key, &ciphertext, ATTRIBUTES).unwrap())
    });

    let proof = KeyConsistencyProof::prove(&pp, &cloud_key, &ciphertext, ATTRIBUTES).unwrap();
    group.bench_function("verify proof", |b| {
        b.iter(|| proof.verify(&pp, &ciphertext, "alice", ATTRIBUTES))
    });

    // Sanitization and decryption

    group.bench_function("sanitize", |b| {
        b.iter(|| ciphertext.sanitize(&pp, &pv_sk).unwrap())
    });

    let sanitized = ciphertext.sanitize(&pp, &pv_sk).unwrap();
    group.bench_function("transform", |b| {
        b.iter(|| transform(&sanitized, &cloud_key, ATTRIBUTES).unwrap())
    });

    let server_sk = ServerSecretKey::random().unwrap();
    let server_pk = server_sk.public_key();
    group.bench_function("transform_and_prove", |b| {
        b.iter(|| transform_and_prove(&server_sk, &sanitized, &cloud_key, ATTRIBUTES).unwrap())
    });

    let (transformed, transform_proof) =
        transform_and_prove(&server_sk, &sanitized, &cloud_key, ATTRIBUTES).unwrap();
    group.bench_function("verify_transformed", |b| {
        b.iter(|| {
            verify_transformed(
                &sanitized,
                &cloud_key,
                ATTRIBUTES,
                &server_pk,
                &transformed,
                &transform_proof,
            )
            .unwrap()
        })
    });

    group.bench_function("decrypt_transformed", |b| {
        b.iter(|| decrypt_transformed(&user_key, &sanitized, &transformed, &payload).unwrap())
    });
}

fn group_primitives(c: &mut Criterion) {
    let mut group = c.benchmark_group("primitives");
    bench_lsss(&mut group);
    bench_dleq(&mut group);
    group.finish();
}

fn group_abe(c: &mut Criterion) {
    let mut group = c.benchmark_group("ABE API");
    bench_abe(&mut group);
    group.finish();
}

criterion_group!(benches, group_primitives, group_abe);
criterion_main!(benches);
