//! Graph statements and the decoder agree on the row layout.

#[cfg(test)]
mod graph_schema_tests {
    use cypher_adapter::query_builder::statements::compile_graph;
    use cypher_adapter::query_builder::{GraphCriteria, PropertyMapping, RelationSpec};
    use cypher_adapter::result_decoder::{build_relation_graph, decode_row, SlotKind};
    use serde_json::{json, Value};

    fn criteria(relations: Vec<RelationSpec>) -> GraphCriteria {
        GraphCriteria {
            them: PropertyMapping::new(),
            me: Some(PropertyMapping::new().with("id", 5)),
            nearby: None,
            relations,
        }
    }

    #[test]
    fn test_return_list_matches_schema() {
        for hops in 0..4 {
            let relations = (0..hops)
                .map(|i| RelationSpec::optional(format!("T{}", i)))
                .collect();
            let compiled = compile_graph("Person", &criteria(relations)).unwrap();
            let items = compiled.schema.return_items().join(",");

            assert!(compiled
                .statement
                .statement
                .ends_with(&format!("RETURN DISTINCT {}", items)));
            assert_eq!(compiled.schema.width(), 2 + 2 * hops);
        }
    }

    #[test]
    fn test_schema_decodes_rows_of_its_statement() {
        let compiled = compile_graph(
            "Person",
            &criteria(vec![
                RelationSpec::required("FRIEND"),
                RelationSpec::optional("LIKES"),
            ]),
        )
        .unwrap();
        assert_eq!(compiled.schema.slots()[4], SlotKind::Relationships { hop: 2 });

        let node = |id: u32| json!({"self": format!("http://h/db/data/node/{}", id), "data": {"id": id}});
        let row = vec![
            node(2),
            node(5),
            json!([{
                "type": "FRIEND",
                "start": "http://h/db/data/node/5",
                "end": "http://h/db/data/node/2",
                "data": {"since": 2019}
            }]),
            json!({"nodes": ["http://h/db/data/node/5", "http://h/db/data/node/2"], "relationships": []}),
            Value::Null,
            Value::Null,
        ];

        let decoded = decode_row(&row, &compiled.schema).unwrap();
        let graph = build_relation_graph(&decoded, None);

        let friend = graph.get("FRIEND").unwrap();
        assert!(friend.is_mine);
        assert_eq!(friend.hops, vec!["2"]);
        assert_eq!(friend.data["since"], json!(2019));
        assert!(graph.get("LIKES").is_none());
    }

    #[test]
    fn test_rows_of_another_statement_are_rejected() {
        let compiled = compile_graph("Person", &criteria(vec![RelationSpec::optional("A")])).unwrap();
        let row = vec![json!({"self": "x/1", "data": {}}), json!({"self": "x/2", "data": {}})];
        assert!(decode_row(&row, &compiled.schema).is_err());
    }
}
