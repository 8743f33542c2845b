//! End-to-end collection tests against canned server responses.

use mongodb::bson::spec::BinarySubtype;
use mongodb::bson::{Binary, Bson, Document, doc};
use mongoinfo_core::{
    AggregatorConfig, CompatibilityPolicy, DRIVER_VERSION, EntityKeyMode, FilterWarning,
    InstanceInfoAggregator, MockCommandClient, MongoInfoError, Subset, SubsetFilter,
    gather_instance_info,
};

const USER_ID: [u8; 16] = [
    0x6f, 0x1e, 0x3a, 0x52, 0x0b, 0x94, 0x4c, 0x1d, 0x8e, 0x2f, 0x7a, 0x30, 0x91, 0xc4, 0xd5, 0xe6,
];

/// A small replica set member with two application databases.
fn production_like_server() -> MockCommandClient {
    MockCommandClient::new()
        .with_response(
            "admin",
            "buildInfo",
            doc! {
                "version": "7.0.5",
                "gitVersion": "7809d71e84e314b497f282ea8aa06d7ded3eb205",
                "modules": [],
                "allocator": "tcmalloc",
                "versionArray": [7, 0, 5, 0],
                "bits": 64,
                "maxBsonObjectSize": 16_777_216,
                "ok": 1.0,
            },
        )
        .with_response(
            "admin",
            "listDatabases",
            doc! {
                "databases": [
                    { "name": "admin", "sizeOnDisk": 245_760.0, "empty": false },
                    { "name": "config", "sizeOnDisk": 110_592_i64, "empty": false },
                    { "name": "local", "sizeOnDisk": 73_728, "empty": false },
                    { "name": "sales", "sizeOnDisk": 5_368_709_120_i64, "empty": false },
                ],
                "totalSize": 5_369_139_200.0,
                "totalSizeMb": 5120_i64,
                "ok": 1.0,
            },
        )
        .with_response(
            "admin",
            "getParameter",
            doc! {
                "authenticationMechanisms": ["SCRAM-SHA-1", "SCRAM-SHA-256"],
                "featureCompatibilityVersion": { "version": "7.0" },
                "ok": 1.0,
            },
        )
        .with_response(
            "admin",
            "usersInfo",
            doc! {
                "users": [{
                    "_id": "admin.root",
                    "userId": Bson::Binary(Binary { subtype: BinarySubtype::Uuid, bytes: USER_ID.to_vec() }),
                    "user": "root",
                    "db": "admin",
                    "roles": [{ "role": "root", "db": "admin" }],
                    "mechanisms": ["SCRAM-SHA-1", "SCRAM-SHA-256"],
                }],
                "ok": 1.0,
            },
        )
        .with_response(
            "admin",
            "rolesInfo",
            doc! {
                "roles": [
                    { "role": "root", "db": "admin", "isBuiltin": true, "roles": [], "inheritedRoles": [] },
                ],
                "ok": 1.0,
            },
        )
        .with_response("config", "usersInfo", doc! { "users": [], "ok": 1.0 })
        .with_response("config", "rolesInfo", doc! { "roles": [], "ok": 1.0 })
        .with_response("local", "usersInfo", doc! { "users": [], "ok": 1.0 })
        .with_response("local", "rolesInfo", doc! { "roles": [], "ok": 1.0 })
        .with_response(
            "sales",
            "usersInfo",
            doc! {
                "users": [{
                    "_id": "sales.root",
                    "user": "root",
                    "db": "sales",
                    "roles": [{ "role": "readWrite", "db": "sales" }],
                }],
                "ok": 1.0,
            },
        )
        .with_response(
            "sales",
            "rolesInfo",
            doc! {
                "roles": [
                    { "role": "reporter", "db": "sales", "isBuiltin": false, "roles": [{ "role": "read", "db": "sales" }] },
                ],
                "ok": 1.0,
            },
        )
}

#[tokio::test]
async fn test_full_collection_without_filters() {
    let client = production_like_server();

    let filtered = gather_instance_info(
        &client,
        DRIVER_VERSION,
        &CompatibilityPolicy::default(),
        &AggregatorConfig::default(),
        &[] as &[&str],
    )
    .await
    .unwrap();

    assert!(filtered.warnings.is_empty());
    assert_eq!(filtered.selected(), Subset::ALL.to_vec());

    let keys: Vec<&String> = filtered.subsets.keys().collect();
    assert_eq!(
        keys,
        ["general", "databases", "total_size", "parameters", "users", "roles"]
    );

    assert_eq!(filtered.subsets.get_i64("total_size").unwrap(), 5_369_139_200);

    let databases = filtered.subsets.get_document("databases").unwrap();
    let names: Vec<&String> = databases.keys().collect();
    assert_eq!(names, ["admin", "config", "local", "sales"]);
    assert_eq!(
        databases.get_document("admin").unwrap().get_i64("sizeOnDisk").unwrap(),
        245_760
    );

    let users = filtered.subsets.get_document("users").unwrap();
    let root = users.get_document("admin.root").unwrap();
    assert_eq!(root.get_str("userId").unwrap(), "6f1e3a520b944c1d8e2f7a3091c4d5e6");
    assert!(root.get("user").is_none());
    assert!(users.contains_key("sales.root"));

    let roles = filtered.subsets.get_document("roles").unwrap();
    let role_keys: Vec<&String> = roles.keys().collect();
    assert_eq!(role_keys, ["admin.root", "sales.reporter"]);
}

#[tokio::test]
async fn test_user_id_round_trips_to_bytes() {
    let client = production_like_server();
    let info = InstanceInfoAggregator::default().collect(&client).await.unwrap();

    let hex = info
        .users
        .get_document("admin.root")
        .unwrap()
        .get_str("userId")
        .unwrap();
    let uuid = uuid::Uuid::parse_str(hex).unwrap();
    assert_eq!(uuid.as_bytes(), &USER_ID);
}

#[tokio::test]
async fn test_filter_examples() {
    let client = production_like_server();
    let info = InstanceInfoAggregator::default().collect(&client).await.unwrap();

    let only_users = SubsetFilter::apply(&info, &["users", "!roles"]);
    assert_eq!(only_users.selected(), vec![Subset::Users]);

    let without_users = SubsetFilter::apply(&info, &["!users"]);
    assert_eq!(
        without_users.selected(),
        vec![
            Subset::General,
            Subset::Databases,
            Subset::TotalSize,
            Subset::Parameters,
            Subset::Roles,
        ]
    );

    let bogus = SubsetFilter::apply(&info, &["bogus"]);
    assert_eq!(bogus.subsets, info.to_document());
    assert_eq!(
        bogus.warnings,
        vec![FilterWarning::UnrecognizedFilterToken("bogus".to_string())]
    );
}

#[tokio::test]
async fn test_flat_keys_collapse_same_named_users() {
    let client = production_like_server();
    let config = AggregatorConfig::new().with_entity_keys(EntityKeyMode::Name);

    let info = InstanceInfoAggregator::new(config)
        .unwrap()
        .collect(&client)
        .await
        .unwrap();

    assert_eq!(info.users.len(), 1);
    let root: &Document = info.users.get_document("root").unwrap();
    assert_eq!(root.get_str("db").unwrap(), "sales");
}

#[tokio::test]
async fn test_failed_database_aborts_whole_collection() {
    let client = production_like_server().with_failure(
        "sales",
        "usersInfo",
        "not authorized on sales to execute command { usersInfo: 1 }",
    );

    let err = gather_instance_info(
        &client,
        DRIVER_VERSION,
        &CompatibilityPolicy::default(),
        &AggregatorConfig::default(),
        &["general"],
    )
    .await
    .unwrap_err();

    assert_eq!(err.failed_subset(), Some(Subset::Users));
    let message = err.to_string();
    assert!(message.contains("users"));
    assert!(message.contains("sales"));
}

#[tokio::test]
async fn test_custom_policy_rejects_server() {
    let client = production_like_server();
    let policy = CompatibilityPolicy::from_json_str(
        r#"{ "rules": [ { "driver": { "min": "3.0", "max": "4.0" }, "server": { "min": "4.0", "max": "7.0" } } ] }"#,
    )
    .unwrap();

    let err = gather_instance_info(
        &client,
        DRIVER_VERSION,
        &policy,
        &AggregatorConfig::default(),
        &[] as &[&str],
    )
    .await
    .unwrap_err();

    match err {
        MongoInfoError::IncompatibleVersions {
            server_version,
            driver_version,
        } => {
            assert_eq!(server_version, "7.0.5");
            assert_eq!(driver_version, DRIVER_VERSION);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(client.issued().len(), 1);
}
