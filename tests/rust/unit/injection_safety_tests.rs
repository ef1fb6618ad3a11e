//! Values must only ever travel through bindings, never through statement text.

#[cfg(test)]
mod injection_safety_tests {
    use cypher_adapter::query_builder::statements::{
        compile_count, compile_destroy, compile_find, compile_link, compile_unlink,
        compile_update,
    };
    use cypher_adapter::query_builder::{
        parameterize, CountCriteria, DestroyCriteria, FindCriteria, LinkCriteria,
        ParameterizeOptions, PropertyMapping, UnlinkCriteria, UpdateCriteria,
    };
    use serde_json::json;
    use test_case::test_case;

    const HOSTILE: &str = "x'}) DETACH DELETE n //";

    fn hostile() -> PropertyMapping {
        PropertyMapping::new().with("name", HOSTILE)
    }

    #[test_case("find"; "find")]
    #[test_case("update"; "update")]
    #[test_case("destroy"; "destroy")]
    #[test_case("link"; "link")]
    #[test_case("unlink"; "unlink")]
    #[test_case("count"; "count")]
    fn test_hostile_value_stays_in_bindings(operation: &str) {
        let compiled = match operation {
            "find" => compile_find("Person", &FindCriteria::new(hostile())),
            "update" => compile_update(
                "Person",
                &UpdateCriteria {
                    filter: hostile(),
                    values: hostile(),
                },
            ),
            "destroy" => compile_destroy("Person", &DestroyCriteria { filter: hostile() }),
            "link" => compile_link(
                "Person",
                &LinkCriteria {
                    start: hostile(),
                    end: hostile(),
                    values: hostile(),
                    ..Default::default()
                },
                chrono::Utc::now(),
            ),
            "unlink" => compile_unlink(
                "Person",
                &UnlinkCriteria {
                    start: hostile(),
                    end: hostile(),
                    ..Default::default()
                },
            ),
            "count" => compile_count("Person", &CountCriteria { filter: hostile() }),
            other => unreachable!("unknown operation {other}"),
        };

        assert!(!compiled.statement.contains(HOSTILE));
        assert!(!compiled.statement.contains("DETACH"));
        assert!(compiled
            .bindings
            .values()
            .any(|value| value == &json!(HOSTILE)));
    }

    #[test]
    fn test_fragments_correspond_one_to_one() {
        let mapping = PropertyMapping::new()
            .with("id", "42")
            .with("name", "Alice")
            .with("age", 31)
            .with("nickname", Option::<&str>::None);
        let fragment = parameterize(Some(&mapping), ParameterizeOptions::prefixed("p_"));

        assert_eq!(fragment.pattern, "{id:{p_id},name:{p_name},age:{p_age}}");
        assert_eq!(fragment.set_clause, "n.id={p_id},n.name={p_name},n.age={p_age}");
        assert_eq!(
            json!(fragment.bindings),
            json!({"p_id": 42, "p_name": "Alice", "p_age": 31})
        );
    }

    #[test]
    fn test_update_prefixes_never_collide() {
        let shared = PropertyMapping::new().with("name", "a").with("age", 1);
        let compiled = compile_update(
            "Person",
            &UpdateCriteria {
                filter: shared.clone(),
                values: shared,
            },
        );
        assert_eq!(compiled.bindings.len(), 4);
    }
}
