#![no_main]
use libfuzzer_sys::fuzz_target;
use polypack::Engine;
use polypack::deflate::ZlibBackend;
use polypack::huffman;

fuzz_target!(|data: &[u8]| {
    // Detection and every decoder must never panic, only return errors.
    let engine = Engine::default();
    let _ = engine.decode(data, None);

    // Also fuzz with a previous version.
    if data.len() >= 2 {
        let split = data.len() / 2;
        let (previous, encoded) = data.split_at(split);
        let _ = engine.decode(encoded, Some(previous));
    }

    // Hit the codecs directly, bypassing the probe order.
    let _ = huffman::decode_from_bytes(data);
    let _ = polypack::chunked::decode(data, &ZlibBackend::default());
    let _ = polypack::delta::decode_script(data, &ZlibBackend::default());
});
