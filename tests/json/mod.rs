//! Runs the connection string option fixtures in `tests/json/data`.
use bson::{Bson, Document};
use mongodb_concern::{Client, ClientOptions, ThreadedClient};
use mongodb_concern::Error::ConfigurationError;
use mongodb_concern::transport::MemoryTransport;
use serde_derive::Deserialize;
use serde_json::{Map, Value};

use std::fs;
use std::sync::Arc;

#[derive(Deserialize)]
struct Suite {
    tests: Vec<Case>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Case {
    description: String,
    uri: String,
    valid: bool,
    write_concern: Option<Map<String, Value>>,
    safe: Option<bool>,
    acknowledges: Option<bool>,
    slave_ok: Option<bool>,
}

fn to_bson(value: &Value) -> Bson {
    match *value {
        Value::Bool(b) => Bson::Boolean(b),
        Value::String(ref s) => Bson::String(s.to_owned()),
        Value::Number(ref n) => match n.as_i64() {
            Some(i) => Bson::I32(i as i32),
            None => Bson::FloatingPoint(n.as_f64().unwrap_or_default()),
        },
        ref other => panic!("Unsupported fixture value: {}", other),
    }
}

fn to_document(map: &Map<String, Value>) -> Document {
    let mut doc = Document::new();
    for (key, value) in map {
        doc.insert(key.to_owned(), to_bson(value));
    }
    doc
}

pub fn run_suite(file: &str) {
    let contents = fs::read_to_string(file).unwrap();
    let suite: Suite = serde_json::from_str(&contents).unwrap();

    for case in suite.tests {
        let transport = Arc::new(MemoryTransport::standalone());
        let result = Client::with_uri(transport, &case.uri, ClientOptions::legacy());

        if !case.valid {
            match result {
                Err(ConfigurationError(_)) => continue,
                Err(err) => panic!("{}: expected ConfigurationError, got {}", case.description, err),
                Ok(_) => panic!("{}: expected ConfigurationError", case.description),
            }
        }

        let client = match result {
            Ok(client) => client,
            Err(err) => panic!("{}: {}", case.description, err),
        };
        let settings = client.settings();

        if let Some(ref expected) = case.write_concern {
            let actual = settings.write_concern().snapshot().unwrap();
            assert_eq!(actual, to_document(expected), "{}", case.description);
        }

        if let Some(safe) = case.safe {
            assert_eq!(safe, settings.is_safe().unwrap(), "{}", case.description);
        }

        if let Some(acknowledges) = case.acknowledges {
            assert_eq!(acknowledges, settings.acknowledges().unwrap(), "{}", case.description);
        }

        if let Some(slave_ok) = case.slave_ok {
            assert_eq!(slave_ok, settings.slave_okay().unwrap(), "{}", case.description);
        }
    }
}

#[test]
fn uri_options() {
    run_suite(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/json/data/uri_options.json"));
}
