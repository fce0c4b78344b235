use bson::Bson;
use mongodb_concern::{Client, ClientOptions, ThreadedClient};
use mongodb_concern::Error::ConfigurationError;
use mongodb_concern::db::ThreadedDatabase;

use super::standalone;

#[test]
fn live_reference() {
    let client = Client::connect(standalone(), "localhost", 27017, ClientOptions::legacy())
        .unwrap();
    let write_concern = client.settings().write_concern();
    assert_eq!(doc! {}, write_concern.to_document().unwrap());

    client.settings().set_write_concern(doc! { "w": 2, "wtimeout": 1000 }).unwrap();
    assert_eq!(doc! { "w": 2, "wtimeout": 1000 }, write_concern.to_document().unwrap());
    assert!(client.settings().is_safe().unwrap());

    write_concern.set("w", 3).unwrap();
    assert_eq!(doc! { "w": 3, "wtimeout": 1000 },
               client.settings().lasterror_options().unwrap());

    assert_eq!(Some(Bson::I32(1000)), write_concern.remove("wtimeoutMS").unwrap());
    assert_eq!(doc! { "w": 3 }, client.settings().lasterror_options().unwrap());
    assert_eq!(None, write_concern.remove("j").unwrap());
}

#[test]
fn replacement_does_not_propagate() {
    let options = ClientOptions::legacy().option("w", 3).option("wtimeout", 1000);
    let client = Client::connect(standalone(), "localhost", 27017, options).unwrap();
    assert_eq!(doc! { "w": 3, "wtimeout": 1000 },
               client.settings().write_concern().to_document().unwrap());

    let wc = doc! { "w": 2, "wtimeout": 1000 };
    client.settings().set_write_concern(wc.clone()).unwrap();
    assert_eq!(wc, client.settings().write_concern().to_document().unwrap());

    let db = client.db("test");
    assert_eq!(wc, db.settings().write_concern().to_document().unwrap());
    let coll = db.collection("test");
    assert_eq!(wc, coll.settings().write_concern().to_document().unwrap());

    coll.settings().set_write_concern(doc! { "j": true }).unwrap();
    assert_eq!(doc! { "j": true }, coll.settings().write_concern().to_document().unwrap());
    assert_eq!(wc, db.settings().write_concern().to_document().unwrap());

    coll.settings().set_write_concern(doc! { "w": 2 }).unwrap();
    assert_eq!(doc! { "w": 2 }, coll.settings().write_concern().to_document().unwrap());
}

#[test]
fn empty_replacement_keeps_safe_flag() {
    let client = Client::connect(standalone(), "localhost", 27017, ClientOptions::legacy())
        .unwrap();
    client.settings().set_write_concern(doc! {}).unwrap();
    assert!(!client.settings().explicit_safe().unwrap());

    client.settings().set_write_concern(doc! { "j": true }).unwrap();
    client.settings().write_concern().clear().unwrap();
    assert!(client.settings().explicit_safe().unwrap());
    assert!(client.settings().is_safe().unwrap());
}

#[test]
fn invalid_write_concerns() {
    let client = Client::connect(standalone(), "localhost", 27017, ClientOptions::legacy())
        .unwrap();
    client.settings().set_write_concern(doc! { "w": 2 }).unwrap();

    match client.settings().set_write_concern(doc! { "foo": "bar" }) {
        Err(ConfigurationError(_)) => (),
        other => panic!("Expected ConfigurationError, got {:?}", other.err()),
    }

    match client.settings().write_concern().set("foo", "bar") {
        Err(ConfigurationError(_)) => (),
        other => panic!("Expected ConfigurationError, got {:?}", other.err()),
    }

    let pairs = Bson::Array(vec![Bson::Array(vec![Bson::String("w".to_owned()), Bson::I32(1)])]);
    match client.settings().set_write_concern(pairs) {
        Err(ConfigurationError(_)) => (),
        other => panic!("Expected ConfigurationError, got {:?}", other.err()),
    }

    match client.settings().write_concern().set("w", -1) {
        Err(ConfigurationError(_)) => (),
        other => panic!("Expected ConfigurationError, got {:?}", other.err()),
    }

    match client.settings().write_concern().set("fsync", "yes") {
        Err(ConfigurationError(_)) => (),
        other => panic!("Expected ConfigurationError, got {:?}", other.err()),
    }

    match client.settings().write_concern().remove("foo") {
        Err(ConfigurationError(_)) => (),
        other => panic!("Expected ConfigurationError, got {:?}", other.err()),
    }

    assert_eq!(doc! { "w": 2 }, client.settings().lasterror_options().unwrap());
}
