use std::collections::{BTreeMap, HashMap};

use boot_fabric::codec::bencode::{
    decode, decode_prefix, encode, from_bytes, to_bytes, Error, Value, MAX_DEPTH,
};
use boot_fabric::codec::{BencodeCodec, Codec};
use proptest::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Eval {
    op: String,
    code: String,
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
struct Reply {
    out: String,
    status: Vec<String>,
    #[serde(rename = "root-ex")]
    root_ex: String,
}

#[test]
fn encodes_each_value_kind() {
    assert_eq!(encode(&Value::from("spam")), b"4:spam");
    assert_eq!(encode(&Value::from("")), b"0:");
    assert_eq!(encode(&Value::Int(42)), b"i42e");
    assert_eq!(encode(&Value::Int(-3)), b"i-3e");
    assert_eq!(encode(&Value::Int(0)), b"i0e");
    assert_eq!(
        encode(&Value::List(vec![Value::from("a"), Value::Int(1)])),
        b"l1:ai1ee"
    );
}

#[test]
fn dictionary_keys_are_written_in_byte_order() {
    let mut dict = Value::dict();
    dict.insert("zeta", 1i64);
    dict.insert("alpha", 2i64);
    dict.insert("Beta", 3i64);

    assert_eq!(encode(&dict), b"d4:Betai3e5:alphai2e4:zetai1ee");
}

#[test]
fn struct_fields_are_sorted_regardless_of_declaration() {
    let request = Eval {
        op: "eval".to_string(),
        code: "(boot help)".to_string(),
    };

    let bytes = to_bytes(&request).unwrap();
    assert_eq!(bytes, b"d4:code11:(boot help)2:op4:evale");
    assert_eq!(from_bytes::<Eval>(&bytes).unwrap(), request);
}

#[test]
fn hash_map_insertion_order_does_not_leak() {
    let mut map = HashMap::new();
    for key in ["out", "ex", "session", "status", "root-ex", "id"] {
        map.insert(key.to_string(), key.len() as i64);
    }

    let bytes = to_bytes(&map).unwrap();
    assert_eq!(
        bytes,
        b"d2:exi2e2:idi2e3:outi3e7:root-exi7e7:sessioni7e6:statusi6ee"
    );
}

#[test]
fn rejects_unsorted_keys() {
    let err = decode(b"d2:op4:eval4:code3:abce").unwrap_err();
    assert_eq!(err, Error::UnsortedKey { offset: 11 });
}

#[test]
fn rejects_duplicate_keys() {
    let err = decode(b"d2:oki1e2:oki2ee").unwrap_err();
    assert!(matches!(err, Error::UnsortedKey { .. }));
}

#[test]
fn rejects_length_beyond_remaining_input() {
    let err = decode(b"10:abc").unwrap_err();
    assert!(matches!(err, Error::Eof { .. }));
}

#[test]
fn rejects_malformed_length_prefixes() {
    for input in [&b"-1:a"[..], b"3x:abc", b"01:a", b"d3x:abci1ee"] {
        let err = decode(input).unwrap_err();
        assert!(
            matches!(err, Error::Syntax { .. }),
            "{:?} gave {:?}",
            String::from_utf8_lossy(input),
            err
        );
    }
}

#[test]
fn rejects_missing_terminators() {
    assert!(matches!(decode(b"li1e").unwrap_err(), Error::Eof { .. }));
    assert!(matches!(decode(b"d1:ai1e").unwrap_err(), Error::Eof { .. }));
    assert!(matches!(decode(b"i12").unwrap_err(), Error::Eof { .. }));
    assert!(matches!(decode(b"i1xe").unwrap_err(), Error::Syntax { .. }));
}

#[test]
fn rejects_non_canonical_integers() {
    for input in [&b"ie"[..], b"i-0e", b"i03e", b"i-e", b"i1-2e", b"i99999999999999999999e"] {
        assert!(
            matches!(decode(input).unwrap_err(), Error::Syntax { .. }),
            "{:?} should be rejected",
            String::from_utf8_lossy(input)
        );
    }
}

#[test]
fn rejects_non_string_dictionary_keys() {
    assert!(matches!(
        decode(b"di1ei2ee").unwrap_err(),
        Error::Syntax { .. }
    ));
}

#[test]
fn decode_prefix_stops_after_one_value() {
    let (value, consumed) = decode_prefix(b"i1ei2e").unwrap();
    assert_eq!(value, Value::Int(1));
    assert_eq!(consumed, 3);

    assert_eq!(
        decode(b"i1ei2e").unwrap_err(),
        Error::TrailingData { offset: 3 }
    );
}

#[test]
fn rejects_excessive_nesting() {
    let depth = MAX_DEPTH + 2;
    let mut input = vec![b'l'; depth];
    input.extend(std::iter::repeat(b'e').take(depth));

    assert_eq!(decode(&input).unwrap_err(), Error::TooDeep(MAX_DEPTH));
}

#[test]
fn struct_binding_ignores_unknown_and_defaults_missing() {
    let reply: Reply = from_bytes(b"d2:idi7e3:out5:hello7:session3:abce").unwrap();
    assert_eq!(
        reply,
        Reply {
            out: "hello".to_string(),
            ..Reply::default()
        }
    );

    let empty: Reply = from_bytes(b"de").unwrap();
    assert_eq!(empty, Reply::default());
}

#[test]
fn rename_maps_hyphenated_keys() {
    let reply: Reply = from_bytes(b"d7:root-ex4:oops6:statusl4:done5:erroree").unwrap();
    assert_eq!(reply.root_ex, "oops");
    assert_eq!(reply.status, vec!["done", "error"]);
}

#[test]
fn floats_and_none_are_not_encodable() {
    assert!(to_bytes(&1.5f64).is_err());
    assert!(to_bytes(&Option::<i64>::None).is_err());
    assert_eq!(to_bytes(&Some(5i64)).unwrap(), b"i5e");
}

#[test]
fn enums_use_name_or_single_entry_dictionary() {
    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    enum Op {
        Describe,
        Eval { code: String },
        Interrupt(i64),
    }

    for op in [
        Op::Describe,
        Op::Eval {
            code: "(+ 1 2)".to_string(),
        },
        Op::Interrupt(3),
    ] {
        let bytes = to_bytes(&op).unwrap();
        assert_eq!(from_bytes::<Op>(&bytes).unwrap(), op);
    }

    assert_eq!(to_bytes(&Op::Describe).unwrap(), b"8:Describe");
    assert_eq!(to_bytes(&Op::Interrupt(3)).unwrap(), b"d9:Interrupti3ee");
}

#[test]
fn codec_classifies_failures() {
    let codec = BencodeCodec;
    assert!(matches!(
        codec.encode(&0.5f32).unwrap_err(),
        boot_fabric::Error::Encode(_)
    ));
    assert!(matches!(
        codec.decode::<Reply>(b"d3:out").unwrap_err(),
        boot_fabric::Error::Decode(_)
    ));
}

fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        any::<i64>().prop_map(Value::Int),
        prop::collection::vec(any::<u8>(), 0..16).prop_map(Value::Bytes),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::List),
            prop::collection::btree_map(prop::collection::vec(any::<u8>(), 0..8), inner, 0..6)
                .prop_map(Value::Dict),
        ]
    })
}

proptest! {
    #[test]
    fn decode_inverts_encode(value in arb_value()) {
        prop_assert_eq!(decode(&encode(&value)).unwrap(), value);
    }

    #[test]
    fn serde_path_matches_direct_encoding(value in arb_value()) {
        let bytes = to_bytes(&value).unwrap();
        prop_assert_eq!(&bytes, &encode(&value));
        prop_assert_eq!(from_bytes::<Value>(&bytes).unwrap(), value);
    }

    #[test]
    fn encoded_maps_are_canonical(entries in prop::collection::vec(("[a-z-]{0,8}", any::<i64>()), 0..12)) {
        let map: HashMap<String, i64> = entries.into_iter().collect();
        let bytes = to_bytes(&map).unwrap();

        // A strict decode succeeds only if keys were emitted in order
        let decoded = decode(&bytes).unwrap();
        let expected: BTreeMap<Vec<u8>, Value> = map
            .into_iter()
            .map(|(k, v)| (k.into_bytes(), Value::Int(v)))
            .collect();
        prop_assert_eq!(decoded, Value::Dict(expected));
    }
}
