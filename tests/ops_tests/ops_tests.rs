//! Operation Tests
//!
//! These tests verify:
//! - Each operation renders the expected flag set
//! - Invalid flag combinations fail before any command is built
//! - Reply statuses map to typed results and errors

use bytes::{Bytes, BytesMut};
use mcmeta::ops::{
    Arithmetic, ArithmeticOptions, Delete, DeleteOptions, FlushAll, Get, GetOptions, Gets, Noop,
    Operation, Store, StoreMode, StoreOptions, Touch,
};
use mcmeta::protocol::{decode_response, encode_command, Response};
use mcmeta::{CasToken, ClientConfig, MetaError, Ttl};

// =============================================================================
// Helper Functions
// =============================================================================

fn wire<O: Operation>(op: &O) -> String {
    wire_with(op, &ClientConfig::default())
}

fn wire_with<O: Operation>(op: &O, config: &ClientConfig) -> String {
    let command = op.command(config).unwrap();
    String::from_utf8(encode_command(&command)).unwrap()
}

fn reply(bytes: &[u8]) -> Response {
    let mut buf = BytesMut::from(bytes);
    decode_response(&mut buf, 1024 * 1024).unwrap().unwrap()
}

fn assert_config_error<O: Operation>(op: &O) {
    match op.command(&ClientConfig::default()) {
        Err(MetaError::Configuration(_)) => {}
        Err(e) => panic!("Expected configuration error, got {:?}", e),
        Ok(cmd) => panic!("Expected configuration error, got {:?}", cmd),
    }
}

// =============================================================================
// Get Tests
// =============================================================================

#[test]
fn test_get_always_requests_value_and_client_flags() {
    assert_eq!(wire(&Get::new("k", GetOptions::new())), "mg k f v\r\n");
}

#[test]
fn test_get_with_metadata_flags() {
    let opts = GetOptions::new().cas().ttl().hit_before().last_access().size().key();
    assert_eq!(wire(&Get::new("k", opts)), "mg k c f h k l s t v\r\n");
}

#[test]
fn test_get_and_touch_flags() {
    let opts = GetOptions::new().touch(300).no_lru_bump();
    assert_eq!(wire(&Get::new("k", opts)), "mg k T300 f u v\r\n");
}

#[test]
fn test_get_recache_flags() {
    let opts = GetOptions::new().vivify_on_miss(30).recache_threshold(10);
    assert_eq!(wire(&Get::new("k", opts)), "mg k N30 R10 f v\r\n");
}

#[test]
fn test_get_miss_is_none() {
    let op = Get::new("k", GetOptions::new());
    assert!(op.map(reply(b"EN\r\n")).unwrap().is_none());
}

#[test]
fn test_get_populates_only_requested_fields() {
    let op = Get::new("k", GetOptions::new().cas());
    let hit = op
        .map(reply(b"VA 2 f7 c99 t30 h1\r\nhi\r\n"))
        .unwrap()
        .unwrap();

    assert_eq!(hit.value, Bytes::from_static(b"hi"));
    assert_eq!(hit.client_flags, 7);
    assert_eq!(hit.cas, Some(CasToken::new(99)));
    assert_eq!(hit.ttl, None);
    assert_eq!(hit.hit_before, None);
}

#[test]
fn test_get_ttl_zero_differs_from_not_requested() {
    let op = Get::new("k", GetOptions::new().ttl());
    let hit = op.map(reply(b"VA 1 t0\r\nx\r\n")).unwrap().unwrap();
    assert_eq!(hit.ttl, Some(Ttl::Remaining(0)));

    let hit = op.map(reply(b"VA 1 t-1\r\nx\r\n")).unwrap().unwrap();
    assert_eq!(hit.ttl, Some(Ttl::Never));
}

#[test]
fn test_get_surfaces_recache_markers() {
    let op = Get::new("k", GetOptions::new().recache_threshold(10));
    let hit = op.map(reply(b"VA 1 W X\r\nx\r\n")).unwrap().unwrap();
    assert!(hit.won);
    assert!(hit.stale);
    assert!(!hit.already_won);
}

#[test]
fn test_get_marks_base64_key() {
    let op = Get::new("k", GetOptions::new().key());
    let hit = op.map(reply(b"VA 1 b kaGk=\r\nx\r\n")).unwrap().unwrap();
    assert_eq!(hit.key, Some(Bytes::from_static(b"aGk=")));
    assert!(hit.key_is_base64);

    let hit = op.map(reply(b"VA 1 kplain\r\nx\r\n")).unwrap().unwrap();
    assert_eq!(hit.key, Some(Bytes::from_static(b"plain")));
    assert!(!hit.key_is_base64);
}

#[test]
fn test_get_server_error() {
    let op = Get::new("k", GetOptions::new());
    match op.map(reply(b"SERVER_ERROR busy\r\n")) {
        Err(MetaError::Server(msg)) => assert!(msg.contains("busy")),
        other => panic!("Expected server error, got {:?}", other),
    }
}

#[test]
fn test_get_unexpected_status_is_protocol_error() {
    let op = Get::new("k", GetOptions::new());
    match op.map(reply(b"NS\r\n")) {
        Err(MetaError::Protocol(_)) => {}
        other => panic!("Expected protocol error, got {:?}", other),
    }
}

#[test]
fn test_get_rejects_bad_key() {
    assert_config_error(&Get::new("bad key", GetOptions::new()));
    assert_config_error(&Get::new("", GetOptions::new()));
}

#[test]
fn test_gets_requires_cas_token() {
    let op = Gets::new("k");
    assert_eq!(wire(&op), "mg k c f v\r\n");

    let (value, token) = op.map(reply(b"VA 1 f0 c5\r\nv\r\n")).unwrap().unwrap();
    assert_eq!(value, Bytes::from_static(b"v"));
    assert_eq!(token.value(), 5);

    match op.map(reply(b"VA 1 f0\r\nv\r\n")) {
        Err(MetaError::Protocol(_)) => {}
        other => panic!("Expected protocol error, got {:?}", other),
    }
}

#[test]
fn test_touch() {
    let op = Touch::new("k", 60);
    assert_eq!(wire(&op), "mg k T60\r\n");
    assert!(op.map(reply(b"HD\r\n")).unwrap());
    assert!(!op.map(reply(b"EN\r\n")).unwrap());
}

// =============================================================================
// Store Tests
// =============================================================================

#[test]
fn test_set_flags() {
    let op = Store::new("k", "v", StoreOptions::new(StoreMode::Set).ttl(Some(60)));
    assert_eq!(wire(&op), "ms k 1 F0 T60\r\nv\r\n");
}

#[test]
fn test_set_uses_default_ttl() {
    let config = ClientConfig::builder().default_ttl(120).build();
    let op = Store::new("k", "v", StoreOptions::default());
    assert_eq!(wire_with(&op, &config), "ms k 1 F0 T120\r\nv\r\n");

    // No default: no T flag at all
    assert_eq!(wire(&op), "ms k 1 F0\r\nv\r\n");
}

#[test]
fn test_store_modes() {
    let add = Store::new("k", "v", StoreOptions::new(StoreMode::Add));
    let replace = Store::new("k", "v", StoreOptions::new(StoreMode::Replace));
    let append = Store::new("k", "v", StoreOptions::new(StoreMode::Append).vivify_ttl(Some(30)));
    let prepend = Store::new("k", "v", StoreOptions::new(StoreMode::Prepend));

    assert_eq!(wire(&add), "ms k 1 F0 ME\r\nv\r\n");
    assert_eq!(wire(&replace), "ms k 1 F0 MR\r\nv\r\n");
    assert_eq!(wire(&append), "ms k 1 F0 MA N30\r\nv\r\n");
    assert_eq!(wire(&prepend), "ms k 1 F0 MP\r\nv\r\n");
}

#[test]
fn test_append_ignores_default_ttl() {
    let config = ClientConfig::builder().default_ttl(120).build();
    let op = Store::new("k", "v", StoreOptions::new(StoreMode::Append));
    assert_eq!(wire_with(&op, &config), "ms k 1 F0 MA\r\nv\r\n");
}

#[test]
fn test_cas_store_flags() {
    let op = Store::new(
        "k",
        "v2",
        StoreOptions::new(StoreMode::Set).cas(CasToken::new(77)).client_flags(16),
    );
    assert_eq!(wire(&op), "ms k 2 C77 F16\r\nv2\r\n");
}

#[test]
fn test_store_reply_mapping() {
    let op = Store::new("k", "v", StoreOptions::default());
    assert_eq!(op.map(reply(b"HD\r\n")).unwrap(), None);

    match op.map(reply(b"NS\r\n")) {
        Err(MetaError::PreconditionFailed) => {}
        other => panic!("Expected precondition failure, got {:?}", other),
    }
    match op.map(reply(b"EX\r\n")) {
        Err(MetaError::CasConflict) => {}
        other => panic!("Expected CAS conflict, got {:?}", other),
    }
    match op.map(reply(b"NF\r\n")) {
        Err(MetaError::NotFound) => {}
        other => panic!("Expected not found, got {:?}", other),
    }
}

#[test]
fn test_store_returns_new_cas_when_asked() {
    let op = Store::new("k", "v", StoreOptions::default().return_cas());
    assert_eq!(wire(&op), "ms k 1 F0 c\r\nv\r\n");
    assert_eq!(op.map(reply(b"HD c900\r\n")).unwrap(), Some(CasToken::new(900)));
}

#[test]
fn test_store_validation() {
    assert_config_error(&Store::new(
        "k",
        "v",
        StoreOptions::new(StoreMode::Add).cas(CasToken::new(1)),
    ));
    assert_config_error(&Store::new(
        "k",
        "v",
        StoreOptions::new(StoreMode::Set).vivify_ttl(Some(10)),
    ));
    assert_config_error(&Store::new(
        "k",
        "v",
        StoreOptions::new(StoreMode::Append).ttl(Some(10)),
    ));
    assert_config_error(&Store::new("k y", "v", StoreOptions::default()));
}

#[test]
fn test_store_rejects_oversized_value() {
    let config = ClientConfig::builder().max_value_size(4).build();
    let op = Store::new("k", "12345", StoreOptions::default());
    match op.command(&config) {
        Err(MetaError::Configuration(_)) => {}
        other => panic!("Expected configuration error, got {:?}", other),
    }
}

// =============================================================================
// Delete Tests
// =============================================================================

#[test]
fn test_delete_flags() {
    assert_eq!(wire(&Delete::new("k", DeleteOptions::new())), "md k\r\n");

    let guarded = Delete::new("k", DeleteOptions::new().cas(CasToken::new(3)));
    assert_eq!(wire(&guarded), "md k C3\r\n");

    let invalidate = Delete::new("k", DeleteOptions::new().invalidate(Some(30)));
    assert_eq!(wire(&invalidate), "md k I T30\r\n");
}

#[test]
fn test_delete_reply_mapping() {
    let op = Delete::new("k", DeleteOptions::new());
    op.map(reply(b"HD\r\n")).unwrap();

    match op.map(reply(b"NF\r\n")) {
        Err(MetaError::NotFound) => {}
        other => panic!("Expected not found, got {:?}", other),
    }
    match op.map(reply(b"EX\r\n")) {
        Err(MetaError::CasConflict) => {}
        other => panic!("Expected CAS conflict, got {:?}", other),
    }
}

#[test]
fn test_stale_ttl_requires_invalidate() {
    let opts = DeleteOptions {
        stale_ttl: Some(30),
        ..DeleteOptions::default()
    };
    assert_config_error(&Delete::new("k", opts));
}

// =============================================================================
// Arithmetic Tests
// =============================================================================

#[test]
fn test_incr_decr_flags() {
    assert_eq!(wire(&Arithmetic::new("c", ArithmeticOptions::incr(5))), "ma c D5 MI v\r\n");
    assert_eq!(wire(&Arithmetic::new("c", ArithmeticOptions::decr(2))), "ma c D2 MD v\r\n");
}

#[test]
fn test_incr_vivify_and_update_ttl() {
    let opts = ArithmeticOptions::incr(1).vivify(10, 60).update_ttl(90);
    assert_eq!(wire(&Arithmetic::new("c", opts)), "ma c D1 J10 MI N60 T90 v\r\n");
}

#[test]
fn test_vivify_needs_initial_and_ttl_together() {
    let only_initial = ArithmeticOptions {
        initial: Some(0),
        ..ArithmeticOptions::incr(1)
    };
    let only_ttl = ArithmeticOptions {
        initial_ttl: Some(60),
        ..ArithmeticOptions::incr(1)
    };
    assert_config_error(&Arithmetic::new("c", only_initial));
    assert_config_error(&Arithmetic::new("c", only_ttl));
}

#[test]
fn test_arithmetic_reply_mapping() {
    let op = Arithmetic::new("c", ArithmeticOptions::decr(10));
    assert_eq!(op.map(reply(b"VA 1\r\n0\r\n")).unwrap(), 0);
    assert_eq!(
        op.map(reply(b"VA 20\r\n18446744073709551615\r\n")).unwrap(),
        u64::MAX
    );

    match op.map(reply(b"NF\r\n")) {
        Err(MetaError::NotFound) => {}
        other => panic!("Expected not found, got {:?}", other),
    }
    match op.map(reply(b"VA 3\r\nabc\r\n")) {
        Err(MetaError::Protocol(_)) => {}
        other => panic!("Expected protocol error, got {:?}", other),
    }
}

// =============================================================================
// Admin Tests
// =============================================================================

#[test]
fn test_flush_all() {
    assert_eq!(wire(&FlushAll { delay: None }), "flush_all\r\n");
    assert_eq!(wire(&FlushAll { delay: Some(0) }), "flush_all\r\n");
    assert_eq!(wire(&FlushAll { delay: Some(60) }), "flush_all 60\r\n");

    FlushAll::default().map(reply(b"OK\r\n")).unwrap();
}

#[test]
fn test_noop() {
    assert_eq!(wire(&Noop), "mn\r\n");
    Noop.map(reply(b"MN\r\n")).unwrap();

    match Noop.map(reply(b"HD\r\n")) {
        Err(MetaError::Protocol(_)) => {}
        other => panic!("Expected protocol error, got {:?}", other),
    }
}
