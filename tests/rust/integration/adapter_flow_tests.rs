use cypher_adapter::adapter::{Adapter, AdapterError, Connection, ConnectionRegistry};
use cypher_adapter::config::{ConnectionConfig, GeomConfig};
use cypher_adapter::query_builder::{
    CountCriteria, CreateValues, DestroyCriteria, FindCriteria, GraphCriteria, LinkCriteria,
    NearbyCriteria, PropertyMapping, ProximityAnchor, RelationSpec, UnlinkCriteria,
    UpdateCriteria,
};
use serde_json::json;
use std::sync::Arc;

use super::fake_server::{node, path, relationship, rows, FakeServer, CYPHER, LAYER, ROOT};

fn places_config() -> ConnectionConfig {
    ConnectionConfig {
        identity: "places".to_string(),
        geom: Some(GeomConfig {
            lat: "lat".to_string(),
            lon: "lon".to_string(),
        }),
        ..Default::default()
    }
}

async fn connect(server: FakeServer) -> (Adapter<FakeServer>, Arc<Connection>) {
    let adapter = Adapter::new(server);
    let registry = ConnectionRegistry::new();
    let connection = adapter.register(&registry, places_config()).await.unwrap();
    (adapter, connection)
}

#[tokio::test]
async fn test_find_with_raw_where_and_limit() {
    let (adapter, conn) = connect(FakeServer::new()).await;
    adapter.transport().reply(rows(
        &["n"],
        vec![json!([node(1, json!({"id": 1, "name": "Alice", "age": 34}))])],
    ));

    let criteria = FindCriteria::new(PropertyMapping::new().with("name", "Alice"))
        .with_raw_where("n.age > 30")
        .with_limit(5);
    let records = adapter.find(&conn, "Person", &criteria).await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("age"), Some(&json!(34)));

    let requests = adapter.transport().requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].uri, CYPHER);
    let query = requests[0].query();
    assert!(query.contains("(n:Person{name:{name}})"));
    assert!(query.contains("WHERE n.age > 30"));
    assert!(query.ends_with("LIMIT 5"));
    assert!(!query.contains("SKIP"));
    assert_eq!(requests[0].body["params"], json!({"name": "Alice"}));
}

#[tokio::test]
async fn test_nearby_statement_and_distances() {
    let (adapter, conn) = connect(FakeServer::new()).await;
    adapter.transport().reply(rows(
        &["n"],
        vec![
            json!([node(4, json!({"id": 4, "lat": 40.0, "lon": -75.0, "bbox": [0, 0, 0, 0]}))]),
            json!([node(5, json!({"id": 5, "lat": 40.05, "lon": -75.0}))]),
        ],
    ));

    let criteria = NearbyCriteria {
        anchor: ProximityAnchor {
            lat: 40.0,
            lon: -75.0,
            dist: 10.0,
        },
        filter: PropertyMapping::new(),
    };
    let records = adapter.nearby(&conn, "Place", &criteria).await.unwrap();

    let query = adapter.transport().requests()[0].query().to_string();
    assert!(query.starts_with(
        "START n=node:geom(\"withinDistance:[40.0000000000000,-75.0000000000000,10.00]\")"
    ));
    assert!(query.contains("MATCH (n:Place)"));

    assert!(records[0].get("bbox").is_none());
    assert_eq!(records[0].distance.unwrap().kilometers, 0.0);
    let second = records[1].distance.unwrap();
    assert!((second.kilometers - 5.56).abs() < 0.01);
    assert!((second.miles - second.kilometers / 1.60934).abs() < 1e-9);
}

#[tokio::test]
async fn test_create_then_spatial_registration() {
    let (adapter, conn) = connect(FakeServer::new()).await;
    adapter
        .transport()
        .reply(rows(
            &["n"],
            vec![json!([node(31, json!({"id": 31, "name": "Cafe", "lat": 39.95, "lon": -75.16}))])],
        ))
        .reply(json!([]));

    let values = CreateValues(
        PropertyMapping::new()
            .with("name", "Cafe")
            .with("lat", 39.95)
            .with("lon", -75.16),
    );
    let record = adapter.create(&conn, "Place", &values).await.unwrap();
    assert_eq!(record.id(), Some(31));

    let requests = adapter.transport().requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[0].query(),
        "CREATE (n:Place{props}) SET n.id = id(n) RETURN n"
    );
    assert_eq!(requests[1].uri, LAYER);
    assert_eq!(
        requests[1].body,
        json!({"layer": "geom", "node": format!("{}/node/31", ROOT)})
    );
}

#[tokio::test]
async fn test_create_without_spatial_plugin_is_single_request() {
    let (adapter, conn) = connect(FakeServer::without_spatial_plugin()).await;
    adapter.transport().reply(rows(
        &["n"],
        vec![json!([node(8, json!({"id": 8, "lat": 1.0, "lon": 2.0}))])],
    ));

    let values = CreateValues(PropertyMapping::new().with("lat", 1.0).with("lon", 2.0));
    adapter.create(&conn, "Place", &values).await.unwrap();
    assert_eq!(adapter.transport().requests().len(), 1);
}

#[tokio::test]
async fn test_spatial_failure_keeps_written_node_id() {
    let (adapter, conn) = connect(FakeServer::new()).await;
    adapter
        .transport()
        .reply(rows(
            &["n"],
            vec![json!([node(9, json!({"id": 9, "lat": 1.0, "lon": 2.0}))])],
        ))
        .reply(json!({"cause": {"exception": "NotFoundException", "message": "layer geom"}}));

    let criteria = UpdateCriteria {
        filter: PropertyMapping::new().with("id", "9"),
        values: PropertyMapping::new().with("lat", 1.0),
    };
    let err = adapter.update(&conn, "Place", &criteria).await.unwrap_err();

    match err {
        AdapterError::SpatialRegistration { node_id, source } => {
            assert_eq!(node_id, "9");
            assert!(source.to_string().contains("NotFoundException"));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let requests = adapter.transport().requests();
    assert_eq!(requests[0].body["params"]["where_id"], json!(9));
    assert_eq!(
        requests[0].query(),
        "MATCH (n:Place{id:{where_id}}) SET n.lat={vals_lat} RETURN n"
    );
}

#[tokio::test]
async fn test_link_unlink_destroy_acknowledge() {
    let (adapter, conn) = connect(FakeServer::new()).await;

    let link = LinkCriteria {
        start: PropertyMapping::new().with("id", 1),
        end: PropertyMapping::new().with("id", 2),
        relation: Some("FRIEND".to_string()),
        ..Default::default()
    };
    adapter.link(&conn, "Person", &link).await.unwrap();

    let unlink = UnlinkCriteria {
        start: PropertyMapping::new().with("id", 1),
        end: PropertyMapping::new().with("id", 2),
        relation: Some("FRIEND".to_string()),
        bidirectional: true,
        ..Default::default()
    };
    adapter.unlink(&conn, "Person", &unlink).await.unwrap();

    let destroy = DestroyCriteria {
        filter: PropertyMapping::new().with("id", 1),
    };
    adapter.destroy(&conn, "Person", &destroy).await.unwrap();

    let requests = adapter.transport().requests();
    assert!(requests[0].query().contains("CREATE (n)-[r:FRIEND{"));
    assert!(requests[0].body["params"]["link_createdAt"].is_string());
    assert!(requests[1].query().ends_with("(n)-[r:FRIEND]-(m) DELETE r"));
    assert!(requests[2].query().ends_with("OPTIONAL MATCH (n)-[r]-() DELETE n,r"));
}

#[tokio::test]
async fn test_count() {
    let (adapter, conn) = connect(FakeServer::new()).await;
    adapter
        .transport()
        .reply(rows(&["count(n)"], vec![json!([17])]));

    let count = adapter
        .count(&conn, "Person", &CountCriteria::default())
        .await
        .unwrap();
    assert_eq!(count, 17);
}

#[tokio::test]
async fn test_graph_with_proximity_and_hops() {
    let (adapter, conn) = connect(FakeServer::new()).await;
    adapter.transport().reply(rows(
        &["them", "me", "r1", "h1", "r2", "h2"],
        vec![json!([
            node(2, json!({"id": 2, "name": "Bob", "lat": 39.95, "lon": -75.16})),
            node(5, json!({"id": 5, "name": "Alice"})),
            [relationship("FRIEND", 2, 5, json!({"since": 2020}))],
            path(&[5, 2]),
            null,
            null
        ])],
    ));

    let criteria = GraphCriteria {
        them: PropertyMapping::new(),
        me: Some(PropertyMapping::new().with("id", 5)),
        nearby: Some(ProximityAnchor {
            lat: 39.95,
            lon: -75.16,
            dist: 2.0,
        }),
        relations: vec![
            RelationSpec::required("FRIEND"),
            RelationSpec::optional("BLOCKED"),
        ],
    };
    let records = adapter.graph(&conn, "Person", &criteria).await.unwrap();
    assert_eq!(records.len(), 1);

    let bob = &records[0];
    assert_eq!(bob.get("name"), Some(&json!("Bob")));
    let graph = bob.graph.as_ref().unwrap();
    assert_eq!(graph.kilometers, Some(0.0));
    assert_eq!(graph.miles, Some(0.0));

    let friend = graph.get("FRIEND").unwrap();
    assert!(!friend.is_mine);
    assert_eq!(friend.data["since"], json!(2020));
    assert_eq!(friend.hops, vec!["2"]);
    assert!(graph.get("BLOCKED").is_none());

    let query = adapter.transport().requests()[0].query().to_string();
    assert!(query.starts_with("START them=node:geom("));
    assert!(query.contains("WHERE them.id <> me.id"));
    assert!(query.ends_with("RETURN DISTINCT them,me,r1,h1,r2,h2"));

    let serialized = serde_json::to_value(bob).unwrap();
    assert_eq!(serialized["graph"]["FRIEND"]["isMine"], json!(false));
}

#[tokio::test]
async fn test_graph_without_proximity_has_no_distance() {
    let (adapter, conn) = connect(FakeServer::new()).await;
    adapter.transport().reply(rows(
        &["them", "me", "r1", "h1"],
        vec![json!([
            node(2, json!({"id": 2})),
            node(5, json!({"id": 5})),
            [relationship("FRIEND", 5, 2, json!({}))],
            path(&[5, 9, 2])
        ])],
    ));

    let criteria = GraphCriteria {
        me: Some(PropertyMapping::new().with("id", 5)),
        relations: vec![RelationSpec::optional("FRIEND")],
        ..Default::default()
    };
    let records = adapter.graph(&conn, "Person", &criteria).await.unwrap();
    let graph = records[0].graph.as_ref().unwrap();

    assert_eq!(graph.kilometers, None);
    assert_eq!(graph.get("FRIEND").unwrap().hops, vec!["9", "2"]);
    assert!(graph.get("FRIEND").unwrap().is_mine);
}

#[tokio::test]
async fn test_graph_hops_without_me_fail_before_any_request() {
    let (adapter, conn) = connect(FakeServer::new()).await;
    let criteria = GraphCriteria {
        relations: vec![RelationSpec::optional("FRIEND")],
        ..Default::default()
    };

    let err = adapter.graph(&conn, "Person", &criteria).await.unwrap_err();
    assert!(matches!(err, AdapterError::Build(_)));
    assert!(adapter.transport().requests().is_empty());
}

#[tokio::test]
async fn test_server_exception_surfaces_cause() {
    let (adapter, conn) = connect(FakeServer::new()).await;
    adapter.transport().reply(json!({
        "message": "Invalid input",
        "exception": "BadInputException",
        "cause": {"exception": "SyntaxException", "message": "Invalid input 'X'"}
    }));

    let err = adapter
        .find(&conn, "Person", &FindCriteria::default().with_raw_where("X"))
        .await
        .unwrap_err();
    match err {
        AdapterError::Server(exception) => assert_eq!(exception.exception, "SyntaxException"),
        other => panic!("unexpected error: {other:?}"),
    }
}
