// ABOUTME: Reference BSON encoder used as a test fixture.
// ABOUTME: Writes Value trees in the canonical wire layout so decode can be checked against it.

#![allow(dead_code)]

use bsonkit::{element_type, Document, Value};

/// Convert a hex string (with optional spaces) to bytes.
pub fn hex_to_bytes(s: &str) -> Vec<u8> {
    let hex: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).unwrap())
        .collect()
}

/// Encode a document: i32 total, elements, 0x00.
pub fn encode_document(doc: &Document) -> Vec<u8> {
    let mut buf = Vec::new();
    write_document(&mut buf, doc.iter().map(|(k, v)| (k.clone(), v)));
    buf
}

/// Encode a `Value::Document` at top level.
pub fn encode(value: &Value) -> Vec<u8> {
    match value {
        Value::Document(doc) => encode_document(doc),
        other => panic!("top level must be a document, got {other:?}"),
    }
}

fn write_document<'v>(buf: &mut Vec<u8>, entries: impl Iterator<Item = (String, &'v Value)>) {
    let start = buf.len();
    buf.extend_from_slice(&[0; 4]);
    for (key, value) in entries {
        buf.push(value.element_type());
        write_cstring(buf, key.as_bytes());
        write_payload(buf, value);
    }
    buf.push(element_type::END);
    patch_length(buf, start);
}

fn patch_length(buf: &mut [u8], start: usize) {
    let len = (buf.len() - start) as i32;
    buf[start..start + 4].copy_from_slice(&len.to_le_bytes());
}

fn write_cstring(buf: &mut Vec<u8>, bytes: &[u8]) {
    assert!(!bytes.contains(&0), "C-strings cannot hold NUL");
    buf.extend_from_slice(bytes);
    buf.push(0);
}

fn write_string(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(&((bytes.len() + 1) as i32).to_le_bytes());
    buf.extend_from_slice(bytes);
    buf.push(0);
}

fn write_payload(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Document(doc) => write_document(buf, doc.iter().map(|(k, v)| (k.clone(), v))),
        Value::Array(arr) => {
            write_document(buf, arr.iter().enumerate().map(|(i, v)| (i.to_string(), v)));
        }
        Value::Double(f) => buf.extend_from_slice(&f.to_le_bytes()),
        Value::String(s) => write_string(buf, s.as_bytes()),
        Value::RawString(bytes) => write_string(buf, bytes),
        Value::Binary { subtype, bytes } => {
            buf.extend_from_slice(&(bytes.len() as i32).to_le_bytes());
            buf.push(*subtype);
            buf.extend_from_slice(bytes);
        }
        Value::Undefined | Value::Null | Value::MinKey | Value::MaxKey => {}
        Value::ObjectId(oid) => buf.extend_from_slice(&oid.bytes()),
        Value::Boolean(b) => buf.push(u8::from(*b)),
        Value::DateTime(ms) => buf.extend_from_slice(&ms.to_le_bytes()),
        Value::Regex { pattern, options } => {
            write_cstring(buf, pattern.as_bytes());
            write_cstring(buf, options.as_bytes());
        }
        Value::DbPointer { namespace, id } => {
            write_string(buf, namespace.as_bytes());
            buf.extend_from_slice(&id.bytes());
        }
        Value::JsCode(code) | Value::Symbol(code) => write_string(buf, code.as_bytes()),
        Value::JsCodeWithScope { code, scope } => {
            let start = buf.len();
            buf.extend_from_slice(&[0; 4]);
            write_string(buf, code.as_bytes());
            write_document(buf, scope.iter().map(|(k, v)| (k.clone(), v)));
            patch_length(buf, start);
        }
        Value::Int32(n) => buf.extend_from_slice(&n.to_le_bytes()),
        Value::Timestamp(ts) => buf.extend_from_slice(&ts.0.to_le_bytes()),
        Value::Int64(n) => buf.extend_from_slice(&n.to_le_bytes()),
        Value::Decimal128(bytes) => buf.extend_from_slice(bytes),
    }
}

/// An empty document nested `depth` levels below the root, each under key "x".
pub fn nested_document(depth: usize) -> Vec<u8> {
    let mut value = Value::Document(Document::new());
    for _ in 0..depth {
        let mut doc = Document::new();
        doc.insert("x".into(), value);
        value = Value::Document(doc);
    }
    encode(&value)
}

/// A document exercising every element type.
pub fn kitchen_sink() -> Value {
    use bsonkit::{bson, ObjectId, Timestamp};

    let Value::Document(scope) = bson!({ "x": 1, "y": "two" }) else {
        unreachable!()
    };
    let mut doc = Document::new();
    doc.insert("double".into(), Value::Double(-0.25));
    doc.insert("string".into(), Value::String("héllo wörld".into()));
    doc.insert("doc".into(), bson!({ "nested": { "deeper": [true, null] } }));
    doc.insert("array".into(), bson!([1, "two", 3.0, [4], {}]));
    doc.insert(
        "binary".into(),
        Value::Binary {
            subtype: 0x04,
            bytes: vec![0x11; 16],
        },
    );
    doc.insert("undefined".into(), Value::Undefined);
    doc.insert("oid".into(), Value::ObjectId(ObjectId([0xab; 12])));
    doc.insert("bool".into(), Value::Boolean(true));
    doc.insert("date".into(), Value::DateTime(1_700_000_000_123));
    doc.insert("null".into(), Value::Null);
    doc.insert(
        "regex".into(),
        Value::Regex {
            pattern: "^[a-z]+$".into(),
            options: "im".into(),
        },
    );
    doc.insert(
        "pointer".into(),
        Value::DbPointer {
            namespace: "db.coll".into(),
            id: ObjectId([0x01; 12]),
        },
    );
    doc.insert("code".into(), Value::JsCode("function() {}".into()));
    doc.insert("symbol".into(), Value::Symbol("sym".into()));
    doc.insert(
        "code_w_scope".into(),
        Value::JsCodeWithScope {
            code: "x + y".into(),
            scope,
        },
    );
    doc.insert("int32".into(), Value::Int32(i32::MIN));
    doc.insert("timestamp".into(), Value::Timestamp(Timestamp::new(1_700_000_000, 42)));
    doc.insert("int64".into(), Value::Int64(i64::MAX));
    doc.insert("decimal".into(), Value::Decimal128([0x22; 16]));
    doc.insert("min".into(), Value::MinKey);
    doc.insert("max".into(), Value::MaxKey);
    Value::Document(doc)
}
