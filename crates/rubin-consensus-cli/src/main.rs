//! Line-oriented JSON dev tool over the consensus core: reads one request
//! object from stdin, writes one response object to stdout. Not a node —
//! no sockets, no persistent state between invocations.

use std::collections::HashMap;

use num_bigint::BigUint;
use rubin_consensus::{
    block_hash, block_subsidy, compact_short_id, featurebit_state_at_height_from_window_counts,
    merkle_root_txids, parse_tx_bytes, pow_check, retarget_v1, retarget_v1_clamped,
    sighash_v1_digest, siphash24, utxo_set_hash, validate_block_basic_at_height, work,
    witness_merkle_root_wtxids, ErrorCode, FeatureBitDeployment, FeatureBitState, Outpoint,
    UtxoEntry,
};
use rubin_crypto::DevStdCryptoProvider;
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Default)]
struct Request {
    op: String,

    #[serde(default)]
    tx_hex: String,
    #[serde(default)]
    block_hex: String,
    #[serde(default)]
    header_hex: String,
    #[serde(default)]
    msg_hex: String,

    #[serde(default)]
    txids: Vec<String>,
    #[serde(default)]
    wtxids: Vec<String>,
    #[serde(default)]
    wtxid: String,

    #[serde(default)]
    chain_id: String,
    #[serde(default)]
    input_index: u32,
    #[serde(default)]
    input_value: u64,

    #[serde(default)]
    target_hex: String,
    #[serde(default)]
    target_old: String,
    #[serde(default)]
    timestamp_first: u64,
    #[serde(default)]
    timestamp_last: u64,
    #[serde(default)]
    window_timestamps: Vec<u64>,
    #[serde(default)]
    targets: Vec<String>,

    #[serde(default)]
    expected_prev_hash: String,
    #[serde(default)]
    expected_target: String,
    #[serde(default)]
    height: u64,
    #[serde(default)]
    already_generated: u64,

    #[serde(default)]
    name: String,
    #[serde(default)]
    bit: u8,
    #[serde(default)]
    start_height: u64,
    #[serde(default)]
    timeout_height: u64,
    #[serde(default)]
    window_signal_counts: Vec<u32>,

    #[serde(default)]
    k0: u64,
    #[serde(default)]
    k1: u64,

    #[serde(default)]
    utxos: Vec<UtxoJson>,
}

#[derive(Deserialize)]
struct UtxoJson {
    txid: String,
    vout: u32,
    value: u64,
    covenant_type: u16,
    covenant_data: String,
    creation_height: u64,
    created_by_coinbase: bool,
}

#[derive(Serialize, Default)]
struct Response {
    ok: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    err: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    txid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    wtxid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    merkle_root: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    witness_merkle_root: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    digest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    block_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_new: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subsidy: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    boundary_height: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    signal_threshold: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    estimated_activation_height: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    short_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    siphash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    work: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    utxo_set_hash: Option<String>,
}

fn ok(f: impl FnOnce(&mut Response)) -> Response {
    let mut r = Response {
        ok: true,
        ..Default::default()
    };
    f(&mut r);
    r
}

fn fail(msg: impl Into<String>) -> Response {
    Response {
        ok: false,
        err: Some(msg.into()),
        ..Default::default()
    }
}

fn err_code(code: ErrorCode) -> String {
    code.as_str().to_string()
}

fn hex32(s: &str) -> Result<[u8; 32], String> {
    let b = hex::decode(s).map_err(|_| "bad hex".to_string())?;
    b.try_into().map_err(|_| "expected 32 bytes".to_string())
}

fn emit(resp: &Response) {
    let _ = serde_json::to_writer(std::io::stdout(), resp);
}

fn run(req: &Request) -> Response {
    match req.op.as_str() {
        "parse_tx" => {
            let tx_bytes = match hex::decode(&req.tx_hex) {
                Ok(v) => v,
                Err(_) => return fail("bad hex"),
            };
            match parse_tx_bytes(&tx_bytes) {
                Ok((_tx, txid, wtxid)) => ok(|r| {
                    r.txid = Some(hex::encode(txid));
                    r.wtxid = Some(hex::encode(wtxid));
                }),
                Err(e) => fail(err_code(e.code)),
            }
        }
        "merkle_root" => {
            let txids = match decode_hash_list(&req.txids) {
                Ok(v) => v,
                Err(e) => return fail(e),
            };
            match merkle_root_txids(&txids) {
                Ok(root) => ok(|r| r.merkle_root = Some(hex::encode(root))),
                Err(e) => fail(err_code(e.code)),
            }
        }
        "witness_merkle_root" => {
            let wtxids = match decode_hash_list(&req.wtxids) {
                Ok(v) => v,
                Err(e) => return fail(e),
            };
            match witness_merkle_root_wtxids(&wtxids) {
                Ok(root) => ok(|r| r.witness_merkle_root = Some(hex::encode(root))),
                Err(e) => fail(err_code(e.code)),
            }
        }
        "sighash_v1" => {
            let provider = DevStdCryptoProvider;
            let tx_bytes = match hex::decode(&req.tx_hex) {
                Ok(v) => v,
                Err(_) => return fail("bad hex"),
            };
            let (tx, _txid, _wtxid) = match parse_tx_bytes(&tx_bytes) {
                Ok(v) => v,
                Err(e) => return fail(err_code(e.code)),
            };
            let chain_id = match hex32(&req.chain_id) {
                Ok(v) => v,
                Err(e) => return fail(e),
            };
            match sighash_v1_digest(&provider, &chain_id, &tx, req.input_index, req.input_value) {
                Ok(d) => ok(|r| r.digest = Some(hex::encode(d))),
                Err(e) => fail(err_code(e.code)),
            }
        }
        "block_hash" => {
            let header_bytes = match hex::decode(&req.header_hex) {
                Ok(v) => v,
                Err(_) => return fail("bad hex"),
            };
            match block_hash(&header_bytes) {
                Ok(h) => ok(|r| r.block_hash = Some(hex::encode(h))),
                Err(e) => fail(err_code(e.code)),
            }
        }
        "pow_check" => {
            let header_bytes = match hex::decode(&req.header_hex) {
                Ok(v) => v,
                Err(_) => return fail("bad hex"),
            };
            let target = match hex32(&req.target_hex) {
                Ok(v) => v,
                Err(e) => return fail(e),
            };
            match pow_check(&header_bytes, target) {
                Ok(()) => ok(|_| {}),
                Err(e) => fail(err_code(e.code)),
            }
        }
        "retarget_v1" => {
            let old = match hex32(&req.target_old) {
                Ok(v) => v,
                Err(e) => return fail(e),
            };
            let res = if !req.window_timestamps.is_empty() {
                retarget_v1_clamped(old, &req.window_timestamps)
            } else {
                retarget_v1(old, req.timestamp_first, req.timestamp_last)
            };
            match res {
                Ok(new_t) => ok(|r| r.target_new = Some(hex::encode(new_t))),
                Err(e) => fail(err_code(e.code)),
            }
        }
        "work" => {
            let targets = match decode_hash_list(&req.targets) {
                Ok(v) => v,
                Err(e) => return fail(e),
            };
            let mut total = BigUint::default();
            for t in &targets {
                match work(t) {
                    Ok(w) => total += w,
                    Err(e) => return fail(err_code(e.code)),
                }
            }
            ok(|r| r.work = Some(format!("0x{}", total.to_str_radix(16))))
        }
        "block_basic_check" => {
            let block_bytes = match hex::decode(&req.block_hex) {
                Ok(v) => v,
                Err(_) => return fail("bad hex"),
            };
            let expected_prev = match opt_hex32(&req.expected_prev_hash) {
                Ok(v) => v,
                Err(e) => return fail(e),
            };
            let expected_target = match opt_hex32(&req.expected_target) {
                Ok(v) => v,
                Err(e) => return fail(e),
            };
            match validate_block_basic_at_height(
                &block_bytes,
                expected_prev,
                expected_target,
                req.height,
            ) {
                Ok(summary) => ok(|r| r.block_hash = Some(hex::encode(summary.block_hash))),
                Err(e) => fail(err_code(e.code)),
            }
        }
        "block_subsidy" => ok(|r| {
            r.subsidy = Some(block_subsidy(req.height, req.already_generated));
        }),
        "featurebits_state" => {
            let d = FeatureBitDeployment {
                name: req.name.clone(),
                bit: req.bit,
                start_height: req.start_height,
                timeout_height: req.timeout_height,
            };
            match featurebit_state_at_height_from_window_counts(
                &d,
                req.height,
                &req.window_signal_counts,
            ) {
                Ok(ev) => ok(|r| {
                    r.state = Some(ev.state.as_str().to_string());
                    r.boundary_height = Some(ev.boundary_height);
                    r.signal_threshold = Some(ev.signal_threshold);
                    if ev.state == FeatureBitState::LockedIn {
                        r.estimated_activation_height = Some(ev.boundary_height + ev.signal_window);
                    }
                }),
                Err(e) => fail(e.to_string()),
            }
        }
        "siphash24" => {
            let msg = match hex::decode(&req.msg_hex) {
                Ok(v) => v,
                Err(_) => return fail("bad hex"),
            };
            let h = siphash24(&msg, req.k0, req.k1);
            ok(|r| r.siphash = Some(format!("{h:016x}")))
        }
        "compact_short_id" => {
            let wtxid = match hex32(&req.wtxid) {
                Ok(v) => v,
                Err(e) => return fail(e),
            };
            let id = compact_short_id(&wtxid, req.k0, req.k1);
            ok(|r| r.short_id = Some(hex::encode(id)))
        }
        "utxo_set_hash" => {
            let provider = DevStdCryptoProvider;
            let mut set: HashMap<Outpoint, UtxoEntry> = HashMap::with_capacity(req.utxos.len());
            for u in &req.utxos {
                let txid = match hex32(&u.txid) {
                    Ok(v) => v,
                    Err(e) => return fail(e),
                };
                let covenant_data = match hex::decode(&u.covenant_data) {
                    Ok(v) => v,
                    Err(_) => return fail("bad covenant_data"),
                };
                set.insert(
                    Outpoint {
                        txid,
                        vout: u.vout,
                    },
                    UtxoEntry {
                        value: u.value,
                        covenant_type: u.covenant_type,
                        covenant_data,
                        creation_height: u.creation_height,
                        created_by_coinbase: u.created_by_coinbase,
                    },
                );
            }
            let h = utxo_set_hash(&provider, &set);
            ok(|r| r.utxo_set_hash = Some(hex::encode(h)))
        }
        other => fail(format!("unknown op: {other}")),
    }
}

fn decode_hash_list(hexes: &[String]) -> Result<Vec<[u8; 32]>, String> {
    hexes.iter().map(|h| hex32(h)).collect()
}

fn opt_hex32(s: &str) -> Result<Option<[u8; 32]>, String> {
    if s.is_empty() {
        Ok(None)
    } else {
        hex32(s).map(Some)
    }
}

fn main() {
    let req: Request = match serde_json::from_reader(std::io::stdin()) {
        Ok(v) => v,
        Err(e) => {
            emit(&fail(format!("bad request: {e}")));
            return;
        }
    };
    emit(&run(&req));
}
