use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{eip191_hash_message, hex, Bytes, Signature};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use k256::ecdsa::SigningKey;
use serde_json::{json, Value};
use tower::ServiceExt;

use inverse_api::{router, ApiContext, AppState};
use inverse_chain::{
    ChainRegistry, CoreTokens, FedConfig, GovernanceContracts, MultisigConfig, NetworkConfig,
    NetworkSet, ProposalCreatedLog, ProposalState, StabilizerContracts, TransparencyContracts,
};
use inverse_governance::{AllowList, DRAFT_SIGN_MSG};
use inverse_nullables::{NullChain, NullClock, NullKvStore};
use inverse_store::keys;
use inverse_transparency::DaoSnapshot;
use inverse_types::{Address, NetworkId, Token, U256};

const NOW_SECS: u64 = 1_700_000_000;
const SECRET: &str = "cron-secret";

fn addr(byte: u8) -> Address {
    Address::repeat_byte(byte)
}

const DOLA: u8 = 0xd0;
const INV: u8 = 0x1e;
const FTM_DOLA: u8 = 0xf0;
const FTM_INV: u8 = 0xf1;
const TREASURY: u8 = 0x77;
const MULTISIG: u8 = 0x55;
const FED: u8 = 0xfe;
const STABILIZER: u8 = 0x5b;
const GOVERNOR: u8 = 0xa1;
const GOVERNOR_ALPHA: u8 = 0xa0;

fn units(n: u64) -> U256 {
    U256::from(n) * U256::from(10u64).pow(U256::from(18u64))
}

fn token(byte: u8, symbol: &str) -> Token {
    Token {
        address: addr(byte),
        name: symbol.to_string(),
        symbol: symbol.to_string(),
        image: String::new(),
        decimals: 18,
        coingecko_id: Some(symbol.to_lowercase()),
    }
}

fn networks() -> Arc<NetworkSet> {
    let mut mainnet = NetworkConfig::new(NetworkId::Mainnet, "http://unused");
    mainnet.tokens = vec![token(DOLA, "DOLA"), token(INV, "INV")];
    mainnet.core_tokens = Some(CoreTokens {
        dola: addr(DOLA),
        inv: addr(INV),
    });
    mainnet.governance = Some(GovernanceContracts {
        governor: addr(GOVERNOR),
        governor_alpha: addr(GOVERNOR_ALPHA),
        vote_token: addr(INV),
        from_block: 0,
    });
    mainnet.transparency = Some(TransparencyContracts {
        treasury: addr(TREASURY),
        treasury_tokens: vec![addr(DOLA)],
        anchor_markets: Vec::new(),
        multisigs: vec![MultisigConfig {
            address: addr(MULTISIG),
            name: "Treasury Council".into(),
        }],
        multisig_tokens: vec![addr(INV)],
        feds: vec![FedConfig {
            address: addr(FED),
            name: "Anchor Fed".into(),
            chain_id: NetworkId::Mainnet,
            project_image: String::new(),
            is_xchain: false,
        }],
        mirrors: vec![NetworkId::Fantom],
    });
    mainnet.stabilizer = Some(StabilizerContracts {
        address: addr(STABILIZER),
        token: addr(DOLA),
    });

    let mut fantom = NetworkConfig::new(NetworkId::Fantom, "http://unused");
    fantom.tokens = vec![token(FTM_DOLA, "DOLA"), token(FTM_INV, "INV")];
    fantom.core_tokens = Some(CoreTokens {
        dola: addr(FTM_DOLA),
        inv: addr(FTM_INV),
    });
    Arc::new(NetworkSet::new(vec![mainnet, fantom]))
}

fn proposal(chain: &NullChain, governor: Address, state: ProposalState) {
    let created = ProposalCreatedLog {
        id: state.id,
        proposer: state.proposer,
        targets: vec![addr(0x42)],
        signatures: vec!["_setPendingAdmin(address)".into()],
        calldatas: vec![Bytes::from(vec![0u8; 32])],
        start_block: state.start_block,
        end_block: state.end_block,
        description: format!("# Proposal {}\nBody", state.id),
    };
    chain.add_proposal(governor, state, created);
}

fn proposal_state(id: u64) -> ProposalState {
    ProposalState {
        id,
        proposer: addr(0x99),
        eta: 0,
        start_block: 900,
        end_block: 1_200,
        for_votes: units(50_000),
        against_votes: units(10),
        canceled: false,
        executed: false,
    }
}

fn mainnet_chain() -> Arc<NullChain> {
    let chain = Arc::new(NullChain::new(NetworkId::Mainnet));
    chain.set_block_number(1_000);
    chain.set_block_schedule(NOW_SECS - 1_000 * 13, 13);
    chain.set_total_supply(addr(DOLA), units(1_000));
    chain.set_total_supply(addr(INV), units(100));
    chain.set_balance(addr(DOLA), addr(TREASURY), units(40));
    chain.set_multisig(addr(MULTISIG), vec![addr(1), addr(2)], 2);
    chain.set_balance(addr(INV), addr(MULTISIG), units(5));
    chain.set_fed_supply(addr(FED), units(600));
    chain.set_stabilizer_supply(addr(STABILIZER), units(77));

    chain.set_quorum(addr(GOVERNOR), units(4_000));
    chain.set_quorum(addr(GOVERNOR_ALPHA), units(4_000));
    proposal(
        &chain,
        addr(GOVERNOR_ALPHA),
        ProposalState {
            executed: true,
            start_block: 100,
            end_block: 200,
            ..proposal_state(1)
        },
    );
    // Inside its voting window with a winning tally, but canceled.
    proposal(
        &chain,
        addr(GOVERNOR),
        ProposalState {
            canceled: true,
            ..proposal_state(1)
        },
    );
    chain
}

struct Harness {
    app: Router,
    mainnet: Arc<NullChain>,
    fantom: Arc<NullChain>,
    store: Arc<NullKvStore>,
    clock: Arc<NullClock>,
    editor: SigningKey,
}

fn harness() -> Harness {
    let mainnet = mainnet_chain();
    let fantom = Arc::new(NullChain::new(NetworkId::Fantom));
    fantom.set_total_supply(addr(FTM_DOLA), units(90));
    fantom.set_total_supply(addr(FTM_INV), units(8));

    let store = Arc::new(NullKvStore::new());
    let clock = Arc::new(NullClock::from_secs(NOW_SECS));
    let editor = SigningKey::from_slice(&[7u8; 32]).unwrap();

    let state = AppState::new(ApiContext {
        chains: ChainRegistry::new()
            .with_reader(mainnet.clone())
            .with_reader(fantom.clone()),
        networks: networks(),
        home: NetworkId::Mainnet,
        store: store.clone(),
        clock: clock.clone(),
        allow_list: AllowList::new([Address::from_private_key(&editor)]),
        sync_secret: Some(SECRET.to_string()),
    });
    Harness {
        app: router(state),
        mainnet,
        fantom,
        store,
        clock,
        editor,
    }
}

fn sign(key: &SigningKey) -> String {
    let hash = eip191_hash_message(DRAFT_SIGN_MSG);
    let (sig, recid) = key.sign_prehash_recoverable(hash.as_slice()).unwrap();
    hex::encode_prefixed(Signature::from_signature_and_parity(sig, recid.is_y_odd()).as_bytes())
}

fn draft_body(sig: &str, title: &str) -> Value {
    json!({
        "sig": sig,
        "title": title,
        "description": "Mint DOLA into a new market.",
        "functions": [{
            "target": "0x865377367054516e17014CcdED1e7d814EDC9ce4",
            "signature": "addMinter(address)",
            "callData": "0x01",
        }],
    })
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn with_json(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn cron(bearer: Option<&str>, chain_id: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(format!("/api/cron-proposals?chainId={chain_id}"));
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(
            String::from_utf8_lossy(&bytes).into_owned(),
        ))
    };
    (status, body)
}

#[tokio::test]
async fn health_answers_ok() {
    let h = harness();
    let (status, body) = send(&h.app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".into()));
}

#[tokio::test]
async fn dao_snapshot_is_served_and_cached() {
    let h = harness();
    let (status, body) = send(&h.app, get("/api/transparency/dao")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dolaTotalSupply"], 1_000.0);
    assert_eq!(body["treasury"][0]["balance"], 40.0);
    assert_eq!(body["multisigs"][0]["funds"][1]["allowance"], Value::Null);
    assert_eq!(body["mirrors"][0]["chainId"], "250");
    assert_eq!(body["fedSupplies"][0]["supply"], 600.0);

    let raw = h.store.raw(keys::DAO_SNAPSHOT).unwrap();
    let entry: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(entry["timestamp"], NOW_SECS * 1000);
    assert_eq!(entry["data"], body);
}

#[tokio::test]
async fn concurrent_misses_leave_a_valid_entry_and_later_reads_hit_cache() {
    let h = harness();
    let (first, second) = tokio::join!(
        send(&h.app, get("/api/transparency/dao")),
        send(&h.app, get("/api/transparency/dao")),
    );
    assert_eq!(first.0, StatusCode::OK);
    assert_eq!(second.0, StatusCode::OK);
    assert_eq!(first.1, second.1);

    let raw = h.store.raw(keys::DAO_SNAPSHOT).unwrap();
    let entry: Value = serde_json::from_str(&raw).unwrap();
    let stored: DaoSnapshot = serde_json::from_value(entry["data"].clone()).unwrap();
    assert_eq!(stored.dola_total_supply, 1_000.0);

    h.mainnet.reset_calls();
    h.fantom.reset_calls();
    let (status, third) = send(&h.app, get("/api/transparency/dao")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(third, first.1);
    assert_eq!(h.mainnet.total_calls(), 0);
    assert_eq!(h.fantom.total_calls(), 0);
}

#[tokio::test]
async fn upstream_failure_serves_last_snapshot() {
    let h = harness();
    let (_, cached) = send(&h.app, get("/api/transparency/dao")).await;

    h.clock.advance(Duration::from_secs(3_600));
    h.mainnet.set_total_supply(addr(DOLA), units(2_000));
    h.mainnet.fail_address(addr(TREASURY));
    h.mainnet.fail_address(addr(DOLA));

    let (status, body) = send(&h.app, get("/api/transparency/dao")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, cached);
}

#[tokio::test]
async fn upstream_failure_without_cache_is_an_empty_503() {
    let h = harness();
    h.mainnet.fail_all(true);
    let (status, body) = send(&h.app, get("/api/transparency/dao")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, json!({}));
}

#[tokio::test]
async fn failing_mirror_chain_reads_as_zero() {
    let h = harness();
    h.fantom.fail_all(true);
    let (status, body) = send(&h.app, get("/api/transparency/dao")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mirrors"][0]["dolaTotalSupply"], 0.0);
    assert_eq!(body["mirrors"][0]["invTotalSupply"], 0.0);
    assert_eq!(body["dolaTotalSupply"], 1_000.0);
    assert_eq!(body["fedSupplies"][0]["supply"], 600.0);
}

#[tokio::test]
async fn stabilizer_balances_are_keyed_by_price_id() {
    let h = harness();
    let (status, body) = send(&h.app, get("/api/stabilizer/balances")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balances"][0]["token"], "dola");
    assert_eq!(body["balances"][0]["balance"], 77.0);
}

#[tokio::test]
async fn cron_rejects_wrong_method_and_bad_token() {
    let h = harness();
    let (status, body) = send(&h.app, get("/api/cron-proposals")).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, json!({ "success": false }));

    let (status, body) = send(&h.app, cron(None, "1")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "success": false }));

    let (status, _) = send(&h.app, cron(Some("guess"), "1")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(h.store.raw(&keys::proposals(NetworkId::Mainnet)).is_none());
}

#[tokio::test]
async fn cron_on_network_without_governance_is_forbidden() {
    let h = harness();
    let (status, body) = send(&h.app, cron(Some(SECRET), "250")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("250"));
}

#[tokio::test]
async fn canceled_proposal_stays_canceled_despite_votes_and_window() {
    let h = harness();
    let (status, body) = send(&h.app, cron(Some(SECRET), "1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));

    let (status, body) = send(&h.app, get("/api/proposals?chainId=1")).await;
    assert_eq!(status, StatusCode::OK);
    let proposals = body["proposals"].as_array().unwrap();
    assert_eq!(proposals.len(), 2);
    assert_eq!(proposals[0]["era"], "mills");
    assert_eq!(proposals[0]["status"], "Canceled");
    assert_eq!(proposals[1]["era"], "alpha");
    assert_eq!(proposals[1]["status"], "Executed");
}

#[tokio::test]
async fn partial_sync_is_reported() {
    let h = harness();
    h.mainnet.fail_address(addr(GOVERNOR));
    let (status, body) = send(&h.app, cron(Some(SECRET), "1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "success": true, "partial": true, "failedEras": ["mills"] })
    );
}

#[tokio::test]
async fn never_synced_network_lists_no_proposals() {
    let h = harness();
    let (status, body) = send(&h.app, get("/api/proposals?chainId=250")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "proposals": [] }));
}

#[tokio::test]
async fn draft_lifecycle() {
    let h = harness();
    let sig = sign(&h.editor);

    let (status, body) = send(&h.app, with_json("POST", "/api/drafts", &draft_body(&sig, "First"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["draft"]["publicDraftId"], 1);

    let (status, body) = send(&h.app, with_json("PUT", "/api/drafts/1", &draft_body(&sig, "Renamed"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["draft"]["title"], "Renamed");

    let (status, body) = send(&h.app, get("/api/drafts/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["draft"]["title"], "Renamed");

    let (status, _) = send(&h.app, with_json("DELETE", "/api/drafts/1", &json!({ "sig": sig }))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&h.app, get("/api/drafts/1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Draft not found");
}

#[tokio::test]
async fn non_numeric_draft_id_is_not_found() {
    let h = harness();
    let (status, body) = send(&h.app, get("/api/drafts/abc")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "status": "warning", "message": "Draft not found" }));
}

#[tokio::test]
async fn unauthorized_update_leaves_drafts_untouched() {
    let h = harness();
    let sig = sign(&h.editor);
    send(&h.app, with_json("POST", "/api/drafts", &draft_body(&sig, "Original"))).await;
    let (_, before) = send(&h.app, get("/api/drafts")).await;
    let writes = h.store.writes();

    let outsider = SigningKey::from_slice(&[9u8; 32]).unwrap();
    let (status, body) = send(
        &h.app,
        with_json("PUT", "/api/drafts/1", &draft_body(&sign(&outsider), "Hijacked")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "status": "warning", "message": "Unauthorized" }));

    let (status, after) = send(&h.app, get("/api/drafts")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(after, before);
    assert_eq!(h.store.writes(), writes);
}

#[tokio::test]
async fn invalid_draft_is_rejected() {
    let h = harness();
    let sig = sign(&h.editor);
    let (status, body) = send(&h.app, with_json("POST", "/api/drafts", &draft_body(&sig, ""))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert!(h.store.raw(keys::DRAFTS).is_none());
}

#[tokio::test]
async fn draft_store_outage_fails_closed() {
    let h = harness();
    h.store.go_down();
    let (status, body) = send(&h.app, get("/api/drafts")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn unsupported_draft_method_lists_allowed_ones() {
    let h = harness();
    let request = Request::builder()
        .method("PATCH")
        .uri("/api/drafts/1")
        .body(Body::empty())
        .unwrap();
    let response = h.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let allow = response.headers()[header::ALLOW].to_str().unwrap();
    assert!(allow.contains("GET"));
    assert!(allow.contains("PUT"));
}

#[tokio::test]
async fn metrics_count_cache_outcomes() {
    let h = harness();
    send(&h.app, get("/api/transparency/dao")).await;
    send(&h.app, get("/api/transparency/dao")).await;
    let response = h.app.clone().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("inverse_cache_hits_total 1"));
    assert!(text.contains("inverse_cache_misses_total 1"));
}
