#![no_main]
use libfuzzer_sys::fuzz_target;
use polypack::policy::{Algorithm, ContentCategory};
use polypack::{Engine, EngineOptions};

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    // Use first byte as control flags.
    let flags = data[0];
    let payload = &data[1..];
    let category = match flags & 3 {
        0 => ContentCategory::Text,
        1 => ContentCategory::Image,
        _ => ContentCategory::Other,
    };
    let use_previous = flags & 4 != 0;
    let chunk_size = 1 + (flags >> 3) as usize * 64;

    // Split payload into "previous" and "input".
    let split = payload.len() / 2;
    let (previous, input) = if use_previous {
        (Some(&payload[..split]), payload)
    } else {
        (None, payload)
    };

    let engine = Engine::new(EngineOptions {
        chunk_size,
        ..Default::default()
    });
    let encoded = engine.encode(input, category, previous).unwrap();
    assert_ne!(encoded.algorithm, Algorithm::LossyImage);

    // Decode and verify roundtrip.
    let decoded = engine.decode(&encoded.bytes, previous).unwrap();
    assert_eq!(decoded.bytes, input);
});
