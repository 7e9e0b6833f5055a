//! Generators and padders used from many threads at once.

use std::collections::HashSet;

use padkey_core::keygen::{
    generate_3des_key, generate_aes_key, generate_des_key, generate_iv, KeyMaterialGenerator,
};
use padkey_core::material::KeyMaterial;
use padkey_core::padding::{pkcs7_pad, pkcs7_unpad, Pkcs7Padder};

const THREADS: usize = 8;
const ROUNDS: usize = 200;

const fn assert_send_sync<T: Send + Sync>() {}

const _: () = {
    assert_send_sync::<KeyMaterial>();
    assert_send_sync::<Pkcs7Padder>();
    assert_send_sync::<KeyMaterialGenerator>();
};

#[test]
fn key_material_moves_across_threads() {
    let key = generate_aes_key(128).expect("aes");
    let expected = key.expose().to_vec();
    let returned = std::thread::spawn(move || key).join().unwrap();
    assert_eq!(returned.expose(), expected.as_slice());
}

#[test]
fn concurrent_generation_yields_correct_lengths_and_distinct_keys() {
    let keys: Vec<Vec<u8>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    let mut aes = Vec::with_capacity(ROUNDS);
                    for round in 0..ROUNDS {
                        assert_eq!(generate_des_key().unwrap().len(), 8);
                        assert_eq!(generate_3des_key(Some(2)).unwrap().len(), 16);
                        assert_eq!(generate_3des_key(Some(3)).unwrap().len(), 24);
                        let any = generate_3des_key(None).unwrap();
                        assert!(any.len() == 16 || any.len() == 24);
                        assert_eq!(generate_iv(round + 1).unwrap().len(), round + 1);

                        let key = generate_aes_key(256).unwrap();
                        assert_eq!(key.len(), 32);
                        aes.push(key.expose().to_vec());
                    }
                    aes
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    });

    assert_eq!(keys.len(), THREADS * ROUNDS);
    let distinct: HashSet<&Vec<u8>> = keys.iter().collect();
    assert_eq!(distinct.len(), keys.len(), "two threads produced the same key");
}

#[test]
fn concurrent_pad_unpad_roundtrip() {
    std::thread::scope(|scope| {
        for thread in 0..THREADS {
            scope.spawn(move || {
                for round in 0..ROUNDS {
                    let block_size = (thread * ROUNDS + round) % 255 + 1;
                    let message: Vec<u8> = (0..round).map(|i| (i ^ thread) as u8).collect();

                    let padded = pkcs7_pad(&message, block_size).unwrap();
                    assert_eq!(padded.len() % block_size, 0);
                    assert_eq!(pkcs7_unpad(&padded, block_size).unwrap(), message);
                }
            });
        }
    });
}

#[test]
fn shared_padder_is_usable_from_every_thread() {
    let padder = Pkcs7Padder::new(16).unwrap();
    std::thread::scope(|scope| {
        for thread in 0..THREADS {
            let padder = &padder;
            scope.spawn(move || {
                for len in 0..ROUNDS {
                    let message = vec![thread as u8; len];
                    let padded = padder.pad(&message);
                    assert_eq!(padder.unpad(padded.as_bytes()).unwrap(), message);
                }
            });
        }
    });
}
