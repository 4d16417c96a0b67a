//! Desired-state document: the parts of a Db2uInstance the checker reads.
//!
//! ```yaml
//! spec:
//!   environment:
//!     databases:
//!       - name: BLUDB
//!         dbConfig: { APPLHEAPSZ: "8192 AUTOMATIC" }
//!     instance:
//!       dbmConfig: { AGENT_STACK_SZ: "1024" }
//!       registry: { DB2AUTH: "OSAUTHDB" }
//! ```
//!
//! Every other field of the resource is ignored.

use crate::error::{FetchError, ValidationError};
use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared `(name, value)` pairs, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters(Vec<(String, String)>);

impl Parameters {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl Serialize for Parameters {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Parameters {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ParametersVisitor)
    }
}

struct ParametersVisitor;

impl<'de> Visitor<'de> for ParametersVisitor {
    type Value = Parameters;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a mapping of parameter names to scalar values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((name, value)) = map.next_entry::<String, ScalarText>()? {
            entries.push((name, value.0));
        }
        Ok(Parameters(entries))
    }

    // An empty list is how some resources spell "no settings".
    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        if seq.next_element::<de::IgnoredAny>()?.is_some() {
            return Err(de::Error::invalid_type(de::Unexpected::Seq, &self));
        }
        Ok(Parameters::new())
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(Parameters::new())
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(Parameters::new())
    }
}

/// A scalar rendered as the text an operator would have typed.
struct ScalarText(String);

impl<'de> Deserialize<'de> for ScalarText {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ScalarVisitor;

        impl Visitor<'_> for ScalarVisitor {
            type Value = ScalarText;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string, number or boolean")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(ScalarText(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(ScalarText(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(ScalarText(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(ScalarText(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                Ok(ScalarText(v.to_string()))
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
                Ok(ScalarText(v.to_string()))
            }
        }

        deserializer.deserialize_any(ScalarVisitor)
    }
}

/// `databases` as a list; null and an empty mapping both mean "none declared".
fn database_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<DatabaseDecl>>, D::Error> {
    struct DatabaseListVisitor;

    impl<'de> Visitor<'de> for DatabaseListVisitor {
        type Value = Option<Vec<DatabaseDecl>>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a list of databases")
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut databases = Vec::with_capacity(seq.size_hint().unwrap_or(0));
            while let Some(database) = seq.next_element::<DatabaseDecl>()? {
                databases.push(database);
            }
            Ok(Some(databases))
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            if map.next_key::<de::IgnoredAny>()?.is_some() {
                return Err(de::Error::invalid_type(de::Unexpected::Map, &self));
            }
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }
    }

    deserializer.deserialize_any(DatabaseListVisitor)
}

/// One entry of `spec.environment.databases`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseDecl {
    pub name: String,
    #[serde(default)]
    pub db_config: Parameters,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceDecl {
    #[serde(default)]
    pub dbm_config: Parameters,
    #[serde(default)]
    pub registry: Parameters,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    #[serde(default, deserialize_with = "database_list")]
    pub databases: Option<Vec<DatabaseDecl>>,
    #[serde(default)]
    pub instance: Option<InstanceDecl>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spec {
    #[serde(default)]
    pub environment: Option<Environment>,
}

/// The desired state of one instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredState {
    #[serde(default)]
    pub spec: Option<Spec>,
}

static NO_PARAMETERS: Parameters = Parameters(Vec::new());

impl DesiredState {
    pub fn from_yaml_str(text: &str, origin: &str) -> Result<Self, FetchError> {
        serde_yaml::from_str(text).map_err(|e| FetchError::Parse {
            origin: origin.to_string(),
            message: e.to_string(),
        })
    }

    pub fn from_json_str(text: &str, origin: &str) -> Result<Self, FetchError> {
        serde_json::from_str(text).map_err(|e| FetchError::Parse {
            origin: origin.to_string(),
            message: e.to_string(),
        })
    }

    fn environment(&self) -> Option<&Environment> {
        self.spec.as_ref()?.environment.as_ref()
    }

    /// Declared databases; missing or empty is a fatal precondition failure.
    pub fn databases(&self) -> Result<&[DatabaseDecl], ValidationError> {
        match self.environment().and_then(|env| env.databases.as_deref()) {
            Some(databases) if !databases.is_empty() => Ok(databases),
            _ => Err(ValidationError::MissingDatabases),
        }
    }

    pub fn dbm_config(&self) -> &Parameters {
        self.instance()
            .map_or(&NO_PARAMETERS, |instance| &instance.dbm_config)
    }

    pub fn registry(&self) -> &Parameters {
        self.instance()
            .map_or(&NO_PARAMETERS, |instance| &instance.registry)
    }

    fn instance(&self) -> Option<&InstanceDecl> {
        self.environment()?.instance.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> DesiredState {
        DesiredState::from_yaml_str(yaml, "test").expect("yaml should parse")
    }

    #[test]
    fn missing_sections_fail_the_databases_precondition() {
        for yaml in [
            "{}",
            "spec: {}",
            "spec:\n  environment: {}",
            "spec:\n  environment:\n    databases: []",
            "spec:\n  environment:\n    databases: null",
            "spec:\n  environment:\n    databases: {}",
        ] {
            let state = parse(yaml);
            assert!(
                matches!(state.databases(), Err(ValidationError::MissingDatabases)),
                "yaml {yaml:?}"
            );
        }
    }

    #[test]
    fn missing_instance_sections_are_empty() {
        let state = parse("spec:\n  environment:\n    instance: {}");
        assert!(state.dbm_config().is_empty());
        assert!(state.registry().is_empty());
        assert!(parse("{}").dbm_config().is_empty());
    }

    #[test]
    fn parameters_keep_document_order() {
        let state = parse(
            "
spec:
  environment:
    databases:
      - name: BLUDB
        dbConfig:
          ZEBRA: 'z'
          APPLHEAPSZ: '8192 AUTOMATIC'
          MIDDLE: 'm'
",
        );
        let databases = state.databases().expect("databases");
        let names: Vec<&str> = databases[0].db_config.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["ZEBRA", "APPLHEAPSZ", "MIDDLE"]);
    }

    #[test]
    fn scalar_values_are_rendered_as_text() {
        let state = parse(
            "
spec:
  environment:
    databases: [{ name: A }]
    instance:
      dbmConfig:
        AGENT_STACK_SZ: 1024
        RATIO: 0.5
        FLAG: true
        LOCKTIMEOUT: -1
",
        );
        let values: Vec<(&str, &str)> = state.dbm_config().iter().collect();
        assert_eq!(
            values,
            vec![
                ("AGENT_STACK_SZ", "1024"),
                ("RATIO", "0.5"),
                ("FLAG", "true"),
                ("LOCKTIMEOUT", "-1"),
            ]
        );
    }

    #[test]
    fn null_and_empty_list_db_config_are_empty() {
        let state = parse(
            "
spec:
  environment:
    databases:
      - name: A
      - name: B
        dbConfig: null
      - name: C
        dbConfig: []
",
        );
        let databases = state.databases().expect("databases");
        assert_eq!(databases.len(), 3);
        assert!(databases.iter().all(|db| db.db_config.is_empty()));
    }

    #[test]
    fn nested_parameter_values_are_rejected() {
        let err = DesiredState::from_yaml_str(
            "spec:\n  environment:\n    instance:\n      registry:\n        X: { nested: 1 }",
            "inline",
        )
        .expect_err("nested value should be rejected");
        assert!(err.to_string().starts_with("invalid desired state document at inline"));
    }

    #[test]
    fn non_empty_database_mapping_is_rejected() {
        let err = DesiredState::from_yaml_str(
            "spec:\n  environment:\n    databases:\n      BLUDB: { dbConfig: {} }",
            "inline",
        )
        .expect_err("databases must be a list");
        assert!(err.to_string().contains("a list of databases"), "{err}");
    }

    #[test]
    fn empty_database_mapping_in_json_is_missing() {
        let state = DesiredState::from_json_str(r#"{"spec":{"environment":{"databases":{}}}}"#, "json")
            .expect("json should parse");
        assert!(matches!(state.databases(), Err(ValidationError::MissingDatabases)));
    }

    // A null value has no text to compare, so the document is refused
    // instead of reporting drift against an invented value.
    #[test]
    fn null_parameter_values_are_rejected() {
        let err = DesiredState::from_yaml_str(
            "spec:\n  environment:\n    databases:\n      - name: BLUDB\n        dbConfig:\n          LOGPRIMARY: ~",
            "inline",
        )
        .expect_err("null value should be rejected");
        assert!(matches!(err, FetchError::Parse { .. }));
        assert!(err.to_string().contains("a string, number or boolean"), "{err}");
    }

    #[test]
    fn json_documents_are_accepted() {
        let state = DesiredState::from_json_str(
            r#"{"apiVersion":"db2u.databases.ibm.com/v1","kind":"Db2uInstance",
                "spec":{"environment":{"databases":[{"name":"BLUDB","dbConfig":{"LOGPRIMARY":"100"}}]}}}"#,
            "json",
        )
        .expect("json should parse");
        let databases = state.databases().expect("databases");
        assert_eq!(databases[0].name, "BLUDB");
        assert_eq!(databases[0].db_config.len(), 1);
    }
}
