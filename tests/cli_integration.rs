use std::process::Command;
use tempfile::tempdir;

fn bin() -> String {
    env!("CARGO_BIN_EXE_polypack").to_string()
}

#[test]
fn cli_encode_decode_roundtrip() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("notes.txt");
    let packed = dir.path().join("notes.pp");
    let output = dir.path().join("notes.out");

    std::fs::write(&input, b"abcde12345abcde12345 some short text").unwrap();

    let st = Command::new(bin())
        .arg("encode")
        .arg(&input)
        .arg(&packed)
        .status()
        .unwrap();
    assert!(st.success());

    let st = Command::new(bin())
        .arg("decode")
        .arg(&packed)
        .arg(&output)
        .status()
        .unwrap();
    assert!(st.success());
    assert_eq!(
        std::fs::read(&output).unwrap(),
        std::fs::read(&input).unwrap()
    );
}

#[test]
fn cli_delta_roundtrip_with_previous() {
    let dir = tempdir().unwrap();
    let v1 = dir.path().join("v1.txt");
    let v2 = dir.path().join("v2.txt");
    let packed = dir.path().join("v2.pp");
    let output = dir.path().join("v2.out");

    let old = b"a line of text\n".repeat(1000);
    let mut new = old.clone();
    new.extend_from_slice(b"a brand new line\n");
    std::fs::write(&v1, &old).unwrap();
    std::fs::write(&v2, &new).unwrap();

    let out = Command::new(bin())
        .args(["--json", "encode", "--previous"])
        .arg(&v1)
        .arg(&v2)
        .arg(&packed)
        .output()
        .unwrap();
    assert!(out.status.success());
    let stats: serde_json::Value = serde_json::from_slice(&out.stderr).unwrap();
    assert_eq!(stats["algorithm"], "delta");
    assert_eq!(stats["category"], "text");
    assert_eq!(stats["input_size"], new.len());

    let out = Command::new(bin())
        .args(["--json", "decode", "--previous"])
        .arg(&v1)
        .arg(&packed)
        .arg(&output)
        .output()
        .unwrap();
    assert!(out.status.success());
    let stats: serde_json::Value = serde_json::from_slice(&out.stderr).unwrap();
    assert_eq!(stats["format"], "delta");
    assert_eq!(std::fs::read(&output).unwrap(), new);
}

#[test]
fn cli_delta_with_leading_edit() {
    let dir = tempdir().unwrap();
    let v1 = dir.path().join("v1.txt");
    let v2 = dir.path().join("v2.txt");
    let packed = dir.path().join("v2.pp");
    let output = dir.path().join("v2.out");

    let old = b"another line of text\n".repeat(2000);
    let mut new = old.clone();
    new[0] = b'A';
    std::fs::write(&v1, &old).unwrap();
    std::fs::write(&v2, &new).unwrap();

    let out = Command::new(bin())
        .args(["--json", "encode", "--previous"])
        .arg(&v1)
        .arg(&v2)
        .arg(&packed)
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let stats: serde_json::Value = serde_json::from_slice(&out.stderr).unwrap();
    assert_eq!(stats["algorithm"], "delta");

    let st = Command::new(bin())
        .args(["decode", "--previous"])
        .arg(&v1)
        .arg(&packed)
        .arg(&output)
        .status()
        .unwrap();
    assert!(st.success());
    assert_eq!(std::fs::read(&output).unwrap(), new);
}

#[test]
fn cli_refuses_to_overwrite_without_force() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("data.bin");
    let packed = dir.path().join("data.pp");
    std::fs::write(&input, [1u8, 2, 3, 4, 5]).unwrap();
    std::fs::write(&packed, b"existing").unwrap();

    let st = Command::new(bin())
        .arg("encode")
        .arg(&input)
        .arg(&packed)
        .status()
        .unwrap();
    assert!(!st.success());
    assert_eq!(std::fs::read(&packed).unwrap(), b"existing");

    let st = Command::new(bin())
        .arg("--force")
        .arg("encode")
        .arg(&input)
        .arg(&packed)
        .status()
        .unwrap();
    assert!(st.success());
    assert_ne!(std::fs::read(&packed).unwrap(), b"existing");
}

#[test]
fn cli_writes_huffman_tree() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("word.txt");
    let packed = dir.path().join("word.pp");
    let tree = dir.path().join("tree.json");
    std::fs::write(&input, b"aaaabbbccd").unwrap();

    let st = Command::new(bin())
        .arg("encode")
        .arg("--tree")
        .arg(&tree)
        .arg(&input)
        .arg(&packed)
        .status()
        .unwrap();
    assert!(st.success());

    let json: serde_json::Value = serde_json::from_slice(&std::fs::read(&tree).unwrap()).unwrap();
    assert_eq!(json["kind"], "internal");
    assert_eq!(json["freq"], 10);
    assert_eq!(json["left"]["kind"], "leaf");
    assert_eq!(json["left"]["symbol"], b'a');
}

#[test]
fn cli_category_override() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("data.txt");
    let packed = dir.path().join("data.pp");
    std::fs::write(&input, b"plain words").unwrap();

    let out = Command::new(bin())
        .args(["--json", "encode", "--category", "other"])
        .arg(&input)
        .arg(&packed)
        .output()
        .unwrap();
    assert!(out.status.success());
    let stats: serde_json::Value = serde_json::from_slice(&out.stderr).unwrap();
    assert_eq!(stats["algorithm"], "chunked");
}

#[test]
fn cli_decode_garbage_fails() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("junk.pp");
    let output = dir.path().join("junk.out");
    std::fs::write(&input, [0xFFu8, 0xEE, 0xDD, 0xCC, 0xBB, 0xAA]).unwrap();

    let out = Command::new(bin())
        .arg("decode")
        .arg(&input)
        .arg(&output)
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("unrecognized format"));
}

#[test]
fn cli_select_prints_decision() {
    let out = Command::new(bin())
        .args(["select", "--size", "20K", "--category", "text", "--has-previous"])
        .output()
        .unwrap();
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).starts_with("delta\t"));

    let out = Command::new(bin())
        .args(["select", "--size", "200K", "--category", "image"])
        .output()
        .unwrap();
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).starts_with("lossy-image\t"));
}

#[test]
fn cli_inspect_reports_format() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("blob.bin");
    let packed = dir.path().join("blob.pp");
    std::fs::write(&input, vec![7u8; 100_000]).unwrap();

    let st = Command::new(bin())
        .args(["encode", "--chunk-size", "32K"])
        .arg(&input)
        .arg(&packed)
        .status()
        .unwrap();
    assert!(st.success());

    let out = Command::new(bin())
        .arg("inspect")
        .arg(&packed)
        .output()
        .unwrap();
    assert!(out.status.success());
    let text = String::from_utf8_lossy(&out.stdout);
    assert!(text.contains("format: chunked"), "{text}");
    assert!(text.contains("chunks: 4"), "{text}");
    assert!(text.contains("decoded size: 100000"), "{text}");
}

#[test]
fn cli_config_works() {
    let out = Command::new(bin()).arg("config").output().unwrap();
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("DEFAULT_CHUNK_SIZE=524288"));
}
