use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_envpath::{
    envmap, from_env, from_namespace, from_namespace_with_options, update_from_namespace,
    EnvOptions, Error,
};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Deserialize, Debug, PartialEq, Default)]
struct Native {
    a: i64,
    a1: i8,
    a2: i16,
    a3: i32,
    b: u64,
    b1: u64,
    b2: u16,
    b3: u32,
    c: bool,
    d: f64,
    title: String,
}

fn native_expected() -> Native {
    Native {
        a: 78945613,
        a1: -1,
        a2: -123,
        a3: 456789,
        b: 78945613,
        b1: 1,
        b2: 123,
        b3: 456789,
        c: true,
        d: 1.5,
        title: "my title".to_string(),
    }
}

#[test]
fn test_native_types() {
    let env = envmap! {
        "A" => "78945613",
        "A1" => "-1",
        "A2" => "-123",
        "A3" => "456789",
        "B" => "78945613",
        "B1" => "1",
        "B2" => "123",
        "B3" => "456789",
        "C" => "true",
        "D" => "1.5",
        "TITLE" => "my title",
    };
    let native: Native = from_namespace(&env, &[]).unwrap();
    assert_eq!(native, native_expected());
}

#[test]
fn test_native_types_with_prefix() {
    let env = envmap! {
        "PREFIX_A" => "78945613",
        "PREFIX_A1" => "-1",
        "PREFIX_A2" => "-123",
        "PREFIX_A3" => "456789",
        "PREFIX_B" => "78945613",
        "PREFIX_B1" => "1",
        "PREFIX_B2" => "123",
        "PREFIX_B3" => "456789",
        "PREFIX_C" => "true",
        "PREFIX_D" => " 1.5 ",
        "PREFIX_TITLE" => "my title",
        "A" => "1",
    };
    let native: Native = from_namespace(&env, &["prefix"]).unwrap();
    assert_eq!(native, native_expected());
}

#[test]
fn test_absent_variables_are_zero() {
    let native: Native = from_namespace(&envmap! {}, &["prefix"]).unwrap();
    assert_eq!(native, Native::default());
}

#[derive(Deserialize, Debug, PartialEq)]
struct Tagged {
    #[serde(rename = "yaml:\"a\"")]
    a: i64,
    #[serde(rename = "json:\"a_1\"")]
    a1: i8,
    #[serde(rename = "mapstructure:\"a_2\"")]
    a2: i16,
    #[serde(rename = "yaml:\"a_3\"")]
    a3: i32,
    b1: u64,
}

#[test]
fn test_multiple_tag_support() {
    let env = envmap! {
        "PREFIX_A" => "78945613",
        "PREFIX_A_1" => "-1",
        "PREFIX_A_2" => "-123",
        "PREFIX_A_3" => "456789",
        "PREFIX_B1" => "1",
    };
    let tagged: Tagged = from_namespace(&env, &["prefix"]).unwrap();
    assert_eq!(
        tagged,
        Tagged {
            a: 78945613,
            a1: -1,
            a2: -123,
            a3: 456789,
            b1: 1,
        }
    );
}

#[derive(Deserialize, Debug, PartialEq)]
struct Priority {
    #[serde(rename = "json:\"from_json\" yaml:\"from_yaml\"")]
    value: String,
}

#[test]
fn test_tag_priority() {
    let env = envmap! { "FROM_JSON" => "json", "FROM_YAML" => "yaml" };

    let default: Priority = from_namespace(&env, &[]).unwrap();
    assert_eq!(default.value, "yaml");

    let options = EnvOptions::new().with_tags(["json", "yaml"]);
    let json_first: Priority = from_namespace_with_options(&env, &[], &options).unwrap();
    assert_eq!(json_first.value, "json");

    let mut options = EnvOptions::new();
    options.override_tag_support(["toml"]);
    let err = from_namespace_with_options::<Priority, _>(&env, &[], &options).unwrap_err();
    assert!(matches!(err, Error::UnresolvedFieldName { .. }));
    assert!(err.is_configuration());
}

#[derive(Deserialize, Debug, PartialEq)]
struct EnvTagged {
    #[serde(rename = "env:\"listen_port\"")]
    port: u16,
}

#[test]
fn test_added_tag_support() {
    let env = envmap! { "LISTEN_PORT" => "9000" };
    let mut options = EnvOptions::new();
    options.add_tag_support("env");
    let tagged: EnvTagged = from_namespace_with_options(&env, &[], &options).unwrap();
    assert_eq!(tagged.port, 9000);
}

#[derive(Deserialize, Debug, PartialEq, Default)]
struct InnerNode {
    #[serde(rename = "mapstructure:\"inner_node\"")]
    inner_node: i32,
}

#[derive(Deserialize, Debug, PartialEq, Default)]
struct Deepest {
    #[serde(rename = "mapstructure:\"super_inner_node\"")]
    super_inner_node: i32,
}

#[derive(Deserialize, Debug, PartialEq, Default)]
struct Deeper {
    a: Deepest,
}

#[derive(Deserialize, Debug, PartialEq, Default)]
struct Deep {
    a: Deeper,
}

#[derive(Deserialize, Debug, PartialEq)]
struct Nested {
    #[serde(rename = "mapstructure:\"a_ptr\"")]
    a_ptr: Option<Box<InnerNode>>,
    a: Deep,
}

#[test]
fn test_inner_struct() {
    let env = envmap! {
        "PREFIX_A_PTR_INNER_NODE" => "1",
        "PREFIX_A_A_A_SUPER_INNER_NODE" => "2",
    };
    let nested: Nested = from_namespace(&env, &["prefix"]).unwrap();
    assert_eq!(nested.a_ptr, Some(Box::new(InnerNode { inner_node: 1 })));
    assert_eq!(nested.a.a.a.super_inner_node, 2);
}

#[derive(Deserialize, Debug, PartialEq, Default)]
struct Plain {
    inner_node: i32,
}

#[derive(Deserialize, Debug, PartialEq)]
struct Pointers {
    #[serde(rename = "mapstructure:\"ptr1,omitempty\"")]
    ptr1: Option<Plain>,
    #[serde(rename = "mapstructure:\"ptr2\"")]
    ptr2: Option<Plain>,
    #[serde(rename = "mapstructure:\"ptr_3,  omitempty\"")]
    ptr3: Option<InnerNode>,
}

#[test]
fn test_omitempty_options() {
    let pointers: Pointers = from_namespace(&envmap! {}, &[]).unwrap();
    assert_eq!(pointers.ptr1, None);
    assert_eq!(pointers.ptr2, Some(Plain::default()));
    assert_eq!(pointers.ptr3, None);

    let env = envmap! { "PTR1_INNER_NODE" => "4", "PTR_3_INNER_NODE" => "3" };
    let pointers: Pointers = from_namespace(&env, &[]).unwrap();
    assert_eq!(pointers.ptr1, Some(Plain { inner_node: 4 }));
    assert_eq!(pointers.ptr3, Some(InnerNode { inner_node: 3 }));
}

#[derive(Deserialize, Debug, PartialEq)]
struct Required {
    #[serde(rename = "count,omitempty")]
    count: u32,
}

#[test]
fn test_omitempty_without_default_is_missing_field() {
    let err = from_namespace::<Required, _>(&envmap! {}, &[]).unwrap_err();
    assert!(matches!(err, Error::Custom(_)));
    assert!(err.to_string().contains("count,omitempty"));
}

#[derive(Deserialize, Debug, PartialEq)]
struct Secretive {
    #[serde(rename = "-", default)]
    secret: String,
    visible: String,
}

#[test]
fn test_dash_skips_field() {
    let env = envmap! { "-" => "leak", "SECRET" => "leak", "VISIBLE" => "ok" };
    let secretive: Secretive = from_namespace(&env, &[]).unwrap();
    assert_eq!(secretive.secret, "");
    assert_eq!(secretive.visible, "ok");
}

#[derive(Deserialize, Debug, PartialEq)]
struct Slices {
    slice: Vec<i32>,
    structs: Vec<InnerNode>,
    pointers: Vec<Option<Box<InnerNode>>>,
}

#[test]
fn test_slices() {
    let env = envmap! {
        "SLICE_0" => "3",
        "SLICE_1" => "2",
        "STRUCTS_0_INNER_NODE" => "5",
        "STRUCTS_1_INNER_NODE" => "1",
        "POINTERS_0_INNER_NODE" => "5",
        "POINTERS_1_INNER_NODE" => "1",
    };
    let slices: Slices = from_namespace(&env, &[]).unwrap();
    assert_eq!(slices.slice, vec![3, 2]);
    assert_eq!(
        slices.structs,
        vec![InnerNode { inner_node: 5 }, InnerNode { inner_node: 1 }]
    );
    assert_eq!(
        slices.pointers,
        vec![
            Some(Box::new(InnerNode { inner_node: 5 })),
            Some(Box::new(InnerNode { inner_node: 1 }))
        ]
    );
}

#[test]
fn test_comma_list_is_checked_first() {
    let env = envmap! { "SLICE" => "1,2,3", "SLICE_0" => "9" };
    let slice: Vec<i32> = from_namespace(&env, &["slice"]).unwrap();
    assert_eq!(slice, vec![1, 2, 3]);
}

#[test]
fn test_sequence_stops_at_first_gap() {
    let env = envmap! { "SLICE_0" => "1", "SLICE_1" => "2", "SLICE_3" => "4" };
    let slice: Vec<i32> = from_namespace(&env, &["slice"]).unwrap();
    assert_eq!(slice, vec![1, 2]);
}

#[derive(Deserialize, Debug, PartialEq)]
struct NativeMaps {
    map: HashMap<String, i32>,
    map2: HashMap<String, f64>,
}

#[test]
fn test_map_of_native_type() {
    let env = envmap! { "MAP_LOL" => "5", "MAP2_SUPER_FUN" => "1" };
    let maps: NativeMaps = from_namespace(&env, &[]).unwrap();
    assert_eq!(maps.map, HashMap::from([("lol".to_string(), 5)]));
    assert_eq!(maps.map2, HashMap::from([("super_fun".to_string(), 1.0)]));
}

#[derive(Deserialize, Debug, PartialEq)]
struct ComplexMaps {
    map: HashMap<String, InnerNode>,
    map2: HashMap<String, Vec<i32>>,
}

#[test]
fn test_map_of_complex_type() {
    let env = envmap! {
        "MAP_LOL_INNER_NODE" => "5",
        "MAP_PGM_INNER_NODE" => "6",
        "MAP2_SUPER_FUN_0" => "1",
        "MAP2_SUPER_FUN_1" => "2",
        "MAP2_FUN_0" => "4",
        "MAP2_FUN_1" => "5",
    };
    let maps: ComplexMaps = from_namespace(&env, &[]).unwrap();
    assert_eq!(maps.map["lol"], InnerNode { inner_node: 5 });
    assert_eq!(maps.map["pgm"], InnerNode { inner_node: 6 });
    assert_eq!(maps.map2["super_fun"], vec![1, 2]);
    assert_eq!(maps.map2["fun"], vec![4, 5]);
}

#[derive(Deserialize, Debug, PartialEq, Default)]
struct WithMap {
    map: HashMap<String, String>,
}

#[derive(Deserialize, Debug, PartialEq, Default)]
struct My {
    key: String,
    #[serde(rename = "mapstructure:\"inner_node\"")]
    inner_node: Vec<WithMap>,
}

#[derive(Deserialize, Debug, PartialEq, Default)]
struct MapValue {
    my: My,
}

#[derive(Deserialize, Debug, PartialEq)]
struct ComplexMaps2 {
    map: HashMap<String, MapValue>,
}

#[test]
fn test_map_of_complex_type_2() {
    let env = envmap! {
        "MAP_MY_KEY_MY_KEY" => "lol",
        "MAP_MY_MY_MY_KEY" => "gg",
        "MAP_MY_MY_MY_INNER_NODE_0_MAP_INNER_NODE" => "5",
        "MAP_MY_MY_MY_MY_KEY" => "gg",
    };
    let maps: ComplexMaps2 = from_namespace(&env, &[]).unwrap();
    assert_eq!(maps.map.len(), 3);
    assert_eq!(maps.map["my_key"].my.key, "lol");
    assert!(maps.map["my_key"].my.inner_node.is_empty());
    assert_eq!(maps.map["my_my"].my.key, "gg");
    assert_eq!(
        maps.map["my_my"].my.inner_node,
        vec![WithMap {
            map: HashMap::from([("inner_node".to_string(), "5".to_string())]),
        }]
    );
    assert_eq!(maps.map["my_my_my"].my.key, "gg");
}

#[derive(Deserialize, Debug, PartialEq, Default)]
struct Embedded {
    a: i64,
    b: u64,
}

#[derive(Deserialize, Debug, PartialEq, Default)]
struct Embedded2 {
    #[serde(rename = "mapstructure:\"c,omitempty\"", default)]
    c: f64,
    d: String,
}

#[derive(Deserialize, Debug, PartialEq)]
struct Squashed {
    #[serde(rename = "mapstructure:\",inline\"")]
    s: Embedded,
    #[serde(rename = "mapstructure:\",squash\"")]
    s2: Embedded2,
}

#[test]
fn test_squash() {
    let env = envmap! { "A" => "0", "B" => "0", "D" => "awesome string" };
    let squashed: Squashed = from_namespace(&env, &[]).unwrap();
    assert_eq!(
        squashed,
        Squashed {
            s: Embedded { a: 0, b: 0 },
            s2: Embedded2 {
                c: 0.0,
                d: "awesome string".to_string(),
            },
        }
    );
}

#[derive(Deserialize, Debug, PartialEq)]
struct Durations {
    #[serde(with = "serde_envpath::duration")]
    a: Duration,
    #[serde(with = "serde_envpath::duration::option")]
    b: Option<Duration>,
    #[serde(with = "serde_envpath::duration")]
    c: Duration,
    #[serde(with = "serde_envpath::duration::option")]
    d: Option<Duration>,
    #[serde(rename = "e,omitempty", with = "serde_envpath::duration", default)]
    e: Duration,
    #[serde(rename = "f,omitempty", with = "serde_envpath::duration::option", default)]
    f: Option<Duration>,
}

#[test]
fn test_durations() {
    let env = envmap! { "A" => "60s", "B" => "3h" };
    let durations: Durations = from_namespace(&env, &[]).unwrap();
    assert_eq!(
        durations,
        Durations {
            a: Duration::from_secs(60),
            b: Some(Duration::from_secs(3 * 3600)),
            c: Duration::ZERO,
            d: Some(Duration::ZERO),
            e: Duration::ZERO,
            f: None,
        }
    );
}

#[test]
fn test_invalid_duration_is_conversion_error() {
    let env = envmap! { "A" => "ten seconds" };
    let err = from_namespace::<Durations, _>(&env, &[]).unwrap_err();
    match err {
        Error::Conversion { name, raw, .. } => {
            assert_eq!(name, "A");
            assert_eq!(raw, "ten seconds");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[derive(Deserialize, Debug, PartialEq)]
struct Stamped {
    at: DateTime<Utc>,
    port: u16,
}

#[test]
fn test_type_with_own_text_form() {
    let env = envmap! { "AT" => "2024-01-15T10:30:00Z", "PORT" => "80" };
    let stamped: Stamped = from_namespace(&env, &[]).unwrap();
    assert_eq!(stamped.at.to_rfc3339(), "2024-01-15T10:30:00+00:00");
    assert_eq!(stamped.port, 80);
}

#[test]
fn test_absent_text_form_that_rejects_empty() {
    let err = from_namespace::<Stamped, _>(&envmap! { "PORT" => "80" }, &[]).unwrap_err();
    assert!(err.is_conversion());
}

#[derive(Deserialize, Debug)]
#[allow(dead_code)]
struct Port {
    port: u16,
}

#[test]
fn test_conversion_error_names_variable() {
    let env = envmap! { "APP_PORT" => "eighty" };
    let err = from_namespace::<Port, _>(&env, &["app"]).unwrap_err();
    assert!(err.is_conversion());
    assert!(err.to_string().contains("APP_PORT"));
    assert!(err.to_string().contains("eighty"));

    let env = envmap! { "APP_PORT" => "70000" };
    assert!(from_namespace::<Port, _>(&env, &["app"]).is_err());
}

#[test]
fn test_invalid_boolean() {
    let env = envmap! { "FLAG" => "yes" };
    let err = from_namespace::<bool, _>(&env, &["flag"]).unwrap_err();
    assert!(err.is_conversion());
}

#[derive(Deserialize, Debug)]
#[allow(dead_code)]
struct MapOfMaps {
    map: HashMap<String, HashMap<String, String>>,
}

#[test]
fn test_map_of_maps_is_rejected_before_scanning() {
    for env in [envmap! {}, envmap! { "MAP_A_B" => "1" }] {
        let err = from_namespace::<MapOfMaps, _>(&env, &[]).unwrap_err();
        assert!(matches!(err, Error::UndecidableMapValue { ref name } if name == "MAP"));
        assert!(err.is_configuration());
    }
}

#[derive(Deserialize, Debug)]
#[allow(dead_code)]
struct OptionalMapOfMaps {
    #[serde(rename = "map,omitempty")]
    map: Option<HashMap<String, HashMap<String, i32>>>,
}

#[derive(Deserialize, Debug)]
#[allow(dead_code)]
struct ListOfMapOfMaps {
    lists: Vec<HashMap<String, HashMap<String, i32>>>,
}

#[test]
fn test_map_of_maps_is_rejected_even_when_unreached() {
    let err = from_namespace::<OptionalMapOfMaps, _>(&envmap! {}, &["x"]).unwrap_err();
    assert!(matches!(err, Error::UndecidableMapValue { ref name } if name == "X_MAP"));

    let err = from_namespace::<ListOfMapOfMaps, _>(&envmap! {}, &[]).unwrap_err();
    assert!(matches!(err, Error::UndecidableMapValue { ref name } if name == "LISTS_<N>"));
}

#[derive(Deserialize, Debug)]
#[allow(dead_code)]
struct NestedIntKeys {
    #[serde(rename = "inner,omitempty")]
    inner: Option<IntKeys>,
}

#[test]
fn test_non_string_map_key_is_rejected_even_when_unreached() {
    let err = from_namespace::<NestedIntKeys, _>(&envmap! {}, &[]).unwrap_err();
    assert!(matches!(err, Error::NonStringMapKey { ref name } if name == "INNER_MAP"));
}

#[derive(Deserialize, Debug)]
#[allow(dead_code)]
struct IntKeys {
    map: HashMap<u32, String>,
}

#[test]
fn test_non_string_map_key_is_rejected() {
    let err = from_namespace::<IntKeys, _>(&envmap! { "MAP_1" => "x" }, &[]).unwrap_err();
    assert!(matches!(err, Error::NonStringMapKey { .. }));
}

#[derive(Deserialize, Debug)]
#[allow(dead_code)]
struct Node {
    value: u8,
    children: Vec<Node>,
}

#[test]
fn test_cyclic_type_is_rejected() {
    let err = from_namespace::<Node, _>(&envmap! {}, &[]).unwrap_err();
    assert!(matches!(err, Error::CyclicType(_)));
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Default, Clone)]
struct InlineStruct {
    #[serde(rename = "json:\"a\"")]
    a: String,
    #[serde(rename = "json:\"b\"")]
    b: String,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Default, Clone)]
struct ComplexStruct {
    #[serde(rename = "json:\",inline\"")]
    inline: InlineStruct,
    #[serde(rename = "json:\"c\"")]
    c: String,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Default, Clone)]
struct FinalStruct {
    #[serde(rename = "json:\"slice\"")]
    slice: Vec<ComplexStruct>,
    #[serde(rename = "json:\"d\"")]
    d: String,
    #[serde(rename = "json:\"f\"")]
    f: String,
}

#[test]
fn test_update_overrides_existing_values() {
    let mut value = FinalStruct {
        slice: vec![ComplexStruct {
            inline: InlineStruct {
                a: "not empty".to_string(),
                b: String::new(),
            },
            c: String::new(),
        }],
        d: "not empty".to_string(),
        f: String::new(),
    };
    let env = envmap! { "SLICE_0_B" => "from env", "SLICE_1_A" => "from env" };
    update_from_namespace(&mut value, &env, &[]).unwrap();

    assert_eq!(
        value,
        FinalStruct {
            slice: vec![
                ComplexStruct {
                    inline: InlineStruct {
                        a: "not empty".to_string(),
                        b: "from env".to_string(),
                    },
                    c: String::new(),
                },
                ComplexStruct {
                    inline: InlineStruct {
                        a: "from env".to_string(),
                        b: String::new(),
                    },
                    c: String::new(),
                },
            ],
            d: "not empty".to_string(),
            f: String::new(),
        }
    );
}

#[derive(Deserialize, Debug, PartialEq)]
struct ProcessConfig {
    name: String,
    workers: u8,
}

#[test]
fn test_from_process_environment() {
    std::env::set_var("SERDE_ENVPATH_DECODE_TEST_NAME", "worker");
    std::env::set_var("SERDE_ENVPATH_DECODE_TEST_WORKERS", "4");
    let config: ProcessConfig = from_env(&["serde_envpath_decode_test"]).unwrap();
    assert_eq!(
        config,
        ProcessConfig {
            name: "worker".to_string(),
            workers: 4,
        }
    );
}
