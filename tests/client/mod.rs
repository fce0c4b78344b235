mod settings;
mod write_concern;

use mongodb_concern::{Client, ClientOptions, ThreadedClient};
use mongodb_concern::Error::ConfigurationError;
use mongodb_concern::db::ThreadedDatabase;
use mongodb_concern::resolver::WriteOptions;
use mongodb_concern::transport::{MemoryTransport, Transport};

use std::sync::Arc;
use std::thread;

pub fn standalone() -> Arc<dyn Transport> {
    Arc::new(MemoryTransport::standalone())
}

#[test]
fn modern_client_defaults() {
    let client = Client::connect(standalone(), "localhost", 27017, ClientOptions::new()).unwrap();
    assert!(client.settings().is_safe().unwrap());
    assert!(client.settings().acknowledges().unwrap());
    assert!(!client.settings().slave_okay().unwrap());
    assert!(client.settings().write_concern().is_empty().unwrap());
}

#[test]
fn legacy_connection_defaults() {
    let client = Client::connect(standalone(), "localhost", 27017, ClientOptions::legacy())
        .unwrap();
    assert!(!client.settings().is_safe().unwrap());
    assert!(!client.settings().acknowledges().unwrap());
    assert_eq!(bson::Document::new(), client.settings().lasterror_options().unwrap());

    let client = Client::with_uri(standalone(), "mongodb://localhost/?safe=true",
                                  ClientOptions::legacy())
        .unwrap();
    assert!(client.settings().is_safe().unwrap());
}

#[test]
fn keyword_options() {
    let options = ClientOptions::legacy()
        .option("slaveok", true)
        .option("w", "majority")
        .option("wtimeout", 300)
        .option("fsync", true)
        .option("j", true);

    let client = Client::connect(standalone(), "localhost", 27017, options).unwrap();
    let expected = doc! { "w": "majority", "wtimeout": 300, "fsync": true, "j": true };

    assert!(client.settings().slave_okay().unwrap());
    assert!(client.settings().is_safe().unwrap());
    assert_eq!(expected, client.settings().lasterror_options().unwrap());
}

#[test]
fn write_concern_option_overrides_safe_false() {
    let options = ClientOptions::legacy().option("wtimeout", 1000).option("safe", false);
    let client = Client::connect(standalone(), "localhost", 27017, options).unwrap();
    assert!(client.settings().is_safe().unwrap());
    assert!(client.settings().explicit_safe().unwrap());
}

#[test]
fn keyword_options_override_uri() {
    let options = ClientOptions::new().option("w", 1).option("slaveOk", false);
    let client = Client::with_uri(standalone(), "mongodb://localhost/?w=2;slaveOk=true;j=true",
                                  options)
        .unwrap();

    assert_eq!(doc! { "w": 1, "j": true }, client.settings().lasterror_options().unwrap());
    assert!(!client.settings().slave_okay().unwrap());
}

#[test]
fn invalid_keyword_options() {
    match Client::connect(standalone(), "localhost", 27017, ClientOptions::new().option("foo", 20)) {
        Err(ConfigurationError(_)) => (),
        Err(err) => panic!("Expected ConfigurationError, got {}", err),
        Ok(_) => panic!("Expected ConfigurationError for an unknown option."),
    }

    match Client::with_uri(standalone(), "mongodb://localhost/?safe=yes", ClientOptions::new()) {
        Err(ConfigurationError(_)) => (),
        Err(err) => panic!("Expected ConfigurationError, got {}", err),
        Ok(_) => panic!("Expected ConfigurationError for a bad boolean literal."),
    }
}

#[test]
fn unacknowledged_uri_client() {
    let client = Client::with_uri(standalone(), "mongodb://localhost/?w=0",
                                  ClientOptions::new())
        .unwrap();

    // Declaring w=0 counts as declaring a write concern, so the client reports safe even
    // though it never acknowledges.
    assert!(client.settings().is_safe().unwrap());
    assert!(!client.settings().acknowledges().unwrap());

    let coll = client.db("pymongo_test").collection("write_concern_test");
    let doc = doc! { "_id": 1 };
    coll.insert_one(doc.clone(), WriteOptions::new()).unwrap();
    let result = coll.insert_one(doc, WriteOptions::new()).unwrap();
    assert!(!result.acknowledged());
}

#[test]
fn replica_set_name() {
    let transport: Arc<dyn Transport> = Arc::new(MemoryTransport::replica_set("rs0", 3));

    let client = Client::with_uri(transport.clone(), "mongodb://a,b,c/?replicaSet=rs0",
                                  ClientOptions::new())
        .unwrap();
    assert_eq!(Some(String::from("rs0")), client.replica_set);

    let options = ClientOptions { require_replica_set: true, ..ClientOptions::new() }
        .option("replicaSet", "rs0");
    assert!(Client::connect(transport.clone(), "a", 27017, options).is_ok());

    match Client::with_uri(transport.clone(), "mongodb://a/?replicaSet=other",
                           ClientOptions::new()) {
        Err(ConfigurationError(_)) => (),
        _ => panic!("Expected ConfigurationError for a mismatched set name."),
    }

    let options = ClientOptions { require_replica_set: true, ..ClientOptions::new() };
    match Client::connect(transport, "a", 27017, options) {
        Err(ConfigurationError(_)) => (),
        _ => panic!("Expected ConfigurationError for a missing set name."),
    }

    match Client::with_uri(standalone(), "mongodb://a/?replicaSet=rs0", ClientOptions::new()) {
        Err(ConfigurationError(_)) => (),
        _ => panic!("Expected ConfigurationError for a standalone server."),
    }
}

#[test]
fn is_sync() {
    let transport = Arc::new(MemoryTransport::standalone());
    let client = Client::connect(transport.clone(), "localhost", 27017, ClientOptions::new())
        .unwrap();
    let client1 = client.clone();
    let client2 = client.clone();

    let child1 = thread::spawn(move || {
        let coll = client1.db("test-client-mod-is_sync").collection("test1");
        for i in 0..10 {
            coll.insert_one(doc! { "_id": i }, WriteOptions::new()).unwrap();
        }
    });

    let child2 = thread::spawn(move || {
        let coll = client2.db("test-client-mod-is_sync").collection("test2");
        for i in 0..10 {
            coll.insert_one(doc! { "_id": i }, WriteOptions::new().safe(false)).unwrap();
        }
    });

    child1.join().unwrap();
    child2.join().unwrap();

    assert_eq!(10, transport.count("test-client-mod-is_sync.test1").unwrap());
    assert_eq!(10, transport.count("test-client-mod-is_sync.test2").unwrap());
    assert_eq!(20, transport.decisions().unwrap().len());
}
