use bson::Bson;
use log::{self, Level, LevelFilter, Log, Metadata, Record};
use mongodb_concern::{Client, ClientOptions, ThreadedClient};
use mongodb_concern::Error::{ConfigurationError, TypeError};
use mongodb_concern::coll::options::FindOptions;
use mongodb_concern::db::ThreadedDatabase;

use super::standalone;

use std::sync::Mutex;

struct CaptureLogger {
    warnings: Mutex<Vec<String>>,
}

impl Log for CaptureLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Warn
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            if let Ok(mut warnings) = self.warnings.lock() {
                warnings.push(format!("{}", record.args()));
            }
        }
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger { warnings: Mutex::new(Vec::new()) };

#[test]
fn inherited_defaults() {
    let client = Client::connect(standalone(), "localhost", 27017, ClientOptions::legacy())
        .unwrap();
    assert!(!client.settings().slave_okay().unwrap());
    assert!(!client.settings().is_safe().unwrap());
    assert_eq!(doc! {}, client.settings().lasterror_options().unwrap());

    let db = client.db("test");
    assert!(!db.settings().slave_okay().unwrap());
    assert!(!db.settings().is_safe().unwrap());
    assert_eq!(doc! {}, db.settings().lasterror_options().unwrap());

    let coll = db.collection("test");
    assert!(!coll.settings().slave_okay().unwrap());
    assert!(!coll.settings().is_safe().unwrap());
    assert_eq!(doc! {}, coll.settings().lasterror_options().unwrap());

    assert!(!coll.find(None, None).unwrap().slave_okay());
    assert!(coll.find(None, Some(FindOptions::with_slave_okay(true))).unwrap().slave_okay());
}

#[test]
fn inherited_uri_options() {
    let client = Client::with_uri(standalone(),
                                  "mongodb://localhost/?slaveok=true;w=1;wtimeout=300;\
                                   fsync=true;j=true",
                                  ClientOptions::legacy())
        .unwrap();
    let expected = doc! { "w": 1, "wtimeout": 300, "fsync": true, "j": true };

    assert!(client.settings().slave_okay().unwrap());
    assert!(client.settings().is_safe().unwrap());
    assert_eq!(expected, client.settings().lasterror_options().unwrap());
    assert_eq!(expected, client.settings().write_concern().to_document().unwrap());

    let db = client.db("test");
    assert!(db.settings().slave_okay().unwrap());
    assert!(db.settings().is_safe().unwrap());
    assert_eq!(expected, db.settings().lasterror_options().unwrap());

    let coll = db.collection("test");
    assert!(coll.settings().slave_okay().unwrap());
    assert!(coll.settings().is_safe().unwrap());
    assert_eq!(expected, coll.settings().lasterror_options().unwrap());

    assert!(coll.find(None, None).unwrap().slave_okay());
    assert!(!coll.find(None, Some(FindOptions::with_slave_okay(false))).unwrap().slave_okay());
}

#[test]
fn unset_then_override_per_level() {
    let client = Client::with_uri(standalone(),
                                  "mongodb://localhost/?slaveok=true;w=1;wtimeout=300;\
                                   fsync=true;j=true",
                                  ClientOptions::legacy())
        .unwrap();

    client.settings().unset_lasterror_options().unwrap();
    assert!(client.settings().slave_okay().unwrap());
    assert!(client.settings().is_safe().unwrap());

    client.settings().set_safe(false).unwrap();
    assert!(!client.settings().is_safe().unwrap());
    client.settings().set_slave_okay(false).unwrap();
    assert!(!client.settings().slave_okay().unwrap());
    assert_eq!(doc! {}, client.settings().lasterror_options().unwrap());

    let db = client.db("test");
    assert!(!db.settings().slave_okay().unwrap());
    assert!(!db.settings().is_safe().unwrap());

    let coll = db.collection("test");
    assert!(!coll.settings().is_safe().unwrap());

    coll.settings().set_lasterror_options(&doc! { "j": true }).unwrap();
    assert_eq!(doc! { "j": true }, coll.settings().lasterror_options().unwrap());
    assert!(coll.settings().is_safe().unwrap());
    assert_eq!(doc! {}, db.settings().lasterror_options().unwrap());
    assert!(!db.settings().is_safe().unwrap());
    assert_eq!(doc! {}, client.settings().lasterror_options().unwrap());
    assert!(!client.settings().is_safe().unwrap());

    db.settings().set_lasterror_options(&doc! { "w": "majority" }).unwrap();
    assert_eq!(doc! { "j": true }, coll.settings().lasterror_options().unwrap());
    assert_eq!(doc! { "w": "majority" }, db.settings().lasterror_options().unwrap());
    assert_eq!(doc! {}, client.settings().lasterror_options().unwrap());
    assert!(!client.settings().is_safe().unwrap());

    db.settings().set_slave_okay(true).unwrap();
    assert!(db.settings().slave_okay().unwrap());
    assert!(!client.settings().slave_okay().unwrap());
    assert!(!coll.settings().slave_okay().unwrap());

    // Existing collections keep their snapshot; new ones see the change.
    assert!(!coll.find(None, None).unwrap().slave_okay());
    let coll2 = db.collection("coll2");
    assert!(coll2.find(None, None).unwrap().slave_okay());
    assert!(!coll2.find(None, Some(FindOptions::with_slave_okay(false))).unwrap().slave_okay());
}

#[test]
fn invalid_settings() {
    let client = Client::connect(standalone(), "localhost", 27017, ClientOptions::legacy())
        .unwrap();
    let coll = client.db("test").collection("test");

    match coll.settings().set_lasterror_options(&doc! { "j": true, "foo": 20 }) {
        Err(ConfigurationError(_)) => (),
        other => panic!("Expected ConfigurationError, got {:?}", other.err()),
    }
    assert_eq!(doc! {}, coll.settings().lasterror_options().unwrap());
    assert!(!coll.settings().is_safe().unwrap());

    match coll.settings().set_option("slave_okay", Bson::I32(20)) {
        Err(TypeError(_)) => (),
        other => panic!("Expected TypeError, got {:?}", other.err()),
    }

    match coll.settings().set_option("safe", Bson::I32(20)) {
        Err(TypeError(_)) => (),
        other => panic!("Expected TypeError, got {:?}", other.err()),
    }

    coll.settings().set_option("safe", Bson::Boolean(true)).unwrap();
    assert!(coll.settings().is_safe().unwrap());
}

#[test]
fn database_and_collection_keyword_options() {
    let client = Client::connect(standalone(), "localhost", 27017, ClientOptions::legacy())
        .unwrap();

    let db = client.db_with_options("test", &doc! { "w": 2, "slave_okay": true }).unwrap();
    assert!(db.settings().is_safe().unwrap());
    assert!(db.settings().slave_okay().unwrap());
    assert!(!client.settings().is_safe().unwrap());

    let coll = db.collection_with_options("test", &doc! { "journal": true }).unwrap();
    assert_eq!(doc! { "w": 2, "j": true }, coll.settings().lasterror_options().unwrap());
    assert_eq!(doc! { "w": 2 }, db.settings().lasterror_options().unwrap());

    match db.collection_with_options("test", &doc! { "replicaSet": "rs0" }) {
        Err(ConfigurationError(_)) => (),
        _ => panic!("Expected ConfigurationError for replicaSet on a collection."),
    }
}

#[test]
fn ignored_wtimeout_is_logged() {
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(LevelFilter::Warn);

    let ignored_timeouts = || {
        LOGGER.warnings.lock().unwrap().iter().filter(|warning| warning.contains("wtimeout")).count()
    };

    let options = ClientOptions::new().option("w", 1).option("wtimeout", 1000);
    Client::connect(standalone(), "localhost", 27017, options).unwrap();
    let options = ClientOptions::new().option("wtimeout", 1000);
    Client::connect(standalone(), "localhost", 27017, options).unwrap();
    assert_eq!(0, ignored_timeouts());

    let options = ClientOptions::new().option("wtimeout", 1000).option("w", 0);
    let client = Client::connect(standalone(), "localhost", 27017, options).unwrap();
    assert!(!client.settings().acknowledges().unwrap());

    assert_eq!(1, ignored_timeouts());
}
