#[cfg(test)]
pub mod test {
    use std::sync::Arc;

    use toml::Value;

    use crate::caster::{IntCaster, ScalarType};
    use crate::field::{field, reference_field, sibling};
    use crate::provider::{MemoryProvider, Provider};
    use crate::schema::Schema;

    pub fn provider(pairs: &[(&str, &str)]) -> Arc<dyn Provider> {
        Arc::new(MemoryProvider::new(pairs.iter().copied()))
    }

    /// `var1` read from `var_1`, defaulting to 1.
    pub fn var1_schema() -> Schema {
        Schema::builder("Vars")
            .field("var1", field().key("var_1").default(1))
            .build()
            .unwrap()
    }

    // -- Fixture for reference fields -------------------------------------------

    /// `money` and `name` with defaults, `greeting` derived from both and
    /// `shout` derived from `name` only.
    pub fn greeting_schema() -> Schema {
        Schema::builder("Person")
            .typed_field("money", ScalarType::Int, field().default(10).caster(IntCaster))
            .literal("name", ScalarType::Str, "Johnny")
            .field(
                "greeting",
                reference_field([sibling("money"), sibling("name")], |v| {
                    let name = v[1].as_str().unwrap_or_default();
                    Ok(Value::String(format!(
                        "Hello, my name is {name} and I'm rich for {}",
                        v[0]
                    )))
                }),
            )
            .field(
                "shout",
                reference_field([sibling("name")], |v| {
                    Ok(Value::String(v[0].as_str().unwrap_or_default().to_uppercase()))
                }),
            )
            .build()
            .unwrap()
    }

    // -- Fixture for nested key synthesis --------------------------------------

    /// `Prod` (prefix `PROD`) > `Integration` > `SMTP` > `login`, looked up as
    /// `PROD_INTEGRATION_SMTP_LOGIN`.
    pub fn prod_schema() -> Schema {
        let smtp = Schema::builder("SMTP").field("login", field());
        let integration = Schema::builder("Integration").sub_config("SMTP", smtp);
        Schema::builder("Prod")
            .prefix("PROD")
            .sub_config("Integration", integration)
            .build()
            .unwrap()
    }

    // -- Fixture for provider propagation --------------------------------------

    /// Root on provider P1; `inherits` declares none, `own` declares P2, and
    /// the root's `pinned` field carries P2 itself. Every field reads `value`.
    pub fn providers_schema() -> Schema {
        let p1 = provider(&[("value", "p1")]);
        let p2 = provider(&[("value", "p2")]);
        Schema::builder("Root")
            .provider(p1)
            .field("value", field().key("value"))
            .field("pinned", field().key("value").provider(p2.clone()))
            .sub_config(
                "inherits",
                Schema::builder("Inherits").field("value", field().key("value")),
            )
            .sub_config(
                "own",
                Schema::builder("Own")
                    .provider(p2)
                    .field("value", field().key("value")),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn fixtures_build() {
        assert_eq!(var1_schema().key_of("var1"), Some("var_1"));
        assert_eq!(greeting_schema().fields().len(), 4);
        assert_eq!(providers_schema().sub_configs().len(), 2);
        let smtp = prod_schema();
        let smtp = smtp
            .sub_config("Integration")
            .and_then(|s| s.sub_config("SMTP"))
            .unwrap();
        assert_eq!(smtp.key_of("login"), Some("PROD_INTEGRATION_SMTP_LOGIN"));
    }
}
